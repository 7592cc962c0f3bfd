use log::{error, info};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::api;
use crate::client::Transport;
use crate::error::HarnessError;

/// One entry per invoked operation, in call order, immutable once pushed.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
    pub error: Option<String>,
}

/// Identifiers of resources the run created, for end-of-run reporting only.
/// Nothing is cleaned up.
#[derive(Debug, Default)]
pub struct ResourceTracker {
    pub users: Vec<u64>,
    pub groups: Vec<u64>,
    pub friendships: Vec<(u64, u64)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
}

pub struct AdminApiTester<T> {
    transport: T,
    pub tracker: ResourceTracker,
    pub results: Vec<TestResult>,
}

/// Tolerant decode against a declared response schema: anything that does
/// not fit falls back to the schema's defaults.
fn decode<T: DeserializeOwned + Default>(value: &Value) -> T {
    serde_json::from_value(value.clone()).unwrap_or_default()
}

impl<T: Transport> AdminApiTester<T> {
    pub fn new(transport: T) -> Self {
        AdminApiTester {
            transport,
            tracker: ResourceTracker::default(),
            results: Vec::new(),
        }
    }

    fn record_pass(&mut self, name: String, message: String, data: Value) {
        self.results.push(TestResult {
            name,
            success: true,
            message,
            data: Some(data),
            error: None,
        });
    }

    fn record_fail(&mut self, name: String, err: &HarnessError) {
        error!("{name} failed: {err}");
        self.results.push(TestResult {
            name,
            success: false,
            message: err.to_string(),
            data: None,
            error: Some(err.to_string()),
        });
    }

    /// Records a 2xx response whose body reported `success: false`.
    fn record_rejected(&mut self, name: String, message: Option<String>, data: Value) {
        let message = message.unwrap_or_else(|| "unknown error".to_string());
        error!("{name} rejected: {message}");
        self.results.push(TestResult {
            name,
            success: false,
            message,
            data: Some(data),
            error: None,
        });
    }

    pub async fn create_user(
        &mut self,
        username: &str,
        display_name: &str,
        email: &str,
        phone: &str,
    ) -> Option<u64> {
        info!("creating user: username={username}");
        let name = format!("create user: {username}");
        let payload = json!({
            "username": username,
            "display_name": display_name,
            "email": email,
            "phone": phone,
        });

        match self
            .transport
            .request("POST", "/api/admin/users", Some(payload))
            .await
        {
            Ok(body) => {
                let decoded: api::CreateUserResponse = decode(&body);
                if decoded.success {
                    let user_id = decoded.user_id.unwrap_or(0);
                    self.tracker.users.push(user_id);
                    info!("user created: user_id={user_id}, username={username}");
                    self.record_pass(name, format!("user id: {user_id}"), body);
                    Some(user_id)
                } else {
                    self.record_rejected(name, decoded.message, body);
                    None
                }
            }
            Err(err) => {
                self.record_fail(name, &err);
                None
            }
        }
    }

    pub async fn list_users(&mut self, page: u32, page_size: u32) -> bool {
        info!("listing users: page={page}, page_size={page_size}");
        let name = "list users".to_string();
        let params = json!({"page": page, "page_size": page_size});

        match self
            .transport
            .request("GET", "/api/admin/users", Some(params))
            .await
        {
            Ok(body) => {
                let decoded: api::UserPage = decode(&body);
                info!(
                    "user list fetched: total={}, page entries={}",
                    decoded.total,
                    decoded.users.len()
                );
                self.record_pass(name, format!("total: {}", decoded.total), body);
                true
            }
            Err(err) => {
                self.record_fail(name, &err);
                false
            }
        }
    }

    pub async fn get_user(&mut self, user_id: u64) -> bool {
        info!("fetching user detail: user_id={user_id}");
        let name = format!("get user: {user_id}");

        match self
            .transport
            .request("GET", &format!("/api/admin/users/{user_id}"), None)
            .await
        {
            Ok(body) => {
                let decoded: api::UserDetail = decode(&body);
                let username = decoded.username.unwrap_or_else(|| api::UNKNOWN.to_string());
                info!("user detail fetched: username={username}");
                self.record_pass(name, format!("username: {username}"), body);
                true
            }
            Err(err) => {
                self.record_fail(name, &err);
                false
            }
        }
    }

    pub async fn create_friendship(&mut self, user1_id: u64, user2_id: u64) -> bool {
        info!("creating friendship: {user1_id} <-> {user2_id}");
        let name = format!("create friendship: {user1_id} <-> {user2_id}");
        let payload = json!({"user1_id": user1_id, "user2_id": user2_id});

        match self
            .transport
            .request("POST", "/api/admin/friendships", Some(payload))
            .await
        {
            Ok(body) => {
                let decoded: api::CreateFriendshipResponse = decode(&body);
                if decoded.success {
                    let channel_id = decoded.channel_id.unwrap_or(0);
                    self.tracker.friendships.push((user1_id, user2_id));
                    info!("friendship created: channel_id={channel_id}");
                    self.record_pass(name, format!("channel id: {channel_id}"), body);
                    true
                } else {
                    self.record_rejected(name, decoded.message, body);
                    false
                }
            }
            Err(err) => {
                self.record_fail(name, &err);
                false
            }
        }
    }

    pub async fn list_friendships(&mut self, page: u32, page_size: u32) -> bool {
        info!("listing friendships: page={page}, page_size={page_size}");
        let name = "list friendships".to_string();
        let params = json!({"page": page, "page_size": page_size});

        match self
            .transport
            .request("GET", "/api/admin/friendships", Some(params))
            .await
        {
            Ok(body) => {
                let decoded: api::FriendshipPage = decode(&body);
                info!(
                    "friendship list fetched: total={}, page entries={}",
                    decoded.total,
                    decoded.friendships.len()
                );
                self.record_pass(name, format!("total: {}", decoded.total), body);
                true
            }
            Err(err) => {
                self.record_fail(name, &err);
                false
            }
        }
    }

    pub async fn user_friends(&mut self, user_id: u64) -> bool {
        info!("fetching friends of user {user_id}");
        let name = format!("user friends: {user_id}");

        match self
            .transport
            .request("GET", &format!("/api/admin/friendships/{user_id}"), None)
            .await
        {
            Ok(body) => {
                let decoded: api::FriendList = decode(&body);
                info!("friend list fetched: friends={}", decoded.total);
                self.record_pass(name, format!("friends: {}", decoded.total), body);
                true
            }
            Err(err) => {
                self.record_fail(name, &err);
                false
            }
        }
    }

    /// Returns the first listed group id, if the server reported any.
    pub async fn list_groups(&mut self, page: u32, page_size: u32) -> Option<u64> {
        info!("listing groups: page={page}, page_size={page_size}");
        let name = "list groups".to_string();
        let params = json!({"page": page, "page_size": page_size});

        match self
            .transport
            .request("GET", "/api/admin/groups", Some(params))
            .await
        {
            Ok(body) => {
                let decoded: api::GroupPage = decode(&body);
                info!(
                    "group list fetched: total={}, page entries={}",
                    decoded.total,
                    decoded.groups.len()
                );
                let first = decoded.groups.first().and_then(|g| g.group_id);
                self.record_pass(name, format!("total: {}", decoded.total), body);
                first
            }
            Err(err) => {
                self.record_fail(name, &err);
                None
            }
        }
    }

    pub async fn get_group(&mut self, group_id: u64) -> bool {
        info!("fetching group detail: group_id={group_id}");
        let name = format!("get group: {group_id}");

        match self
            .transport
            .request("GET", &format!("/api/admin/groups/{group_id}"), None)
            .await
        {
            Ok(body) => {
                let decoded: api::GroupDetail = decode(&body);
                let group_name = decoded.name.unwrap_or_else(|| api::UNKNOWN.to_string());
                info!(
                    "group detail fetched: name={group_name}, member_count={}",
                    decoded.member_count
                );
                self.record_pass(
                    name,
                    format!("group: {group_name}, members: {}", decoded.member_count),
                    body,
                );
                true
            }
            Err(err) => {
                self.record_fail(name, &err);
                false
            }
        }
    }

    pub async fn get_stats(&mut self) -> bool {
        info!("fetching system stats");
        let name = "get stats".to_string();

        match self.transport.request("GET", "/api/admin/stats", None).await {
            Ok(body) => {
                let decoded: api::Stats = decode(&body);
                let message = format!(
                    "users: {}, groups: {}, messages: {}, devices: {}",
                    decoded.users.total,
                    decoded.groups.total,
                    decoded.messages.total,
                    decoded.devices.total
                );
                info!("stats fetched: {message}");
                self.record_pass(name, message, body);
                true
            }
            Err(err) => {
                self.record_fail(name, &err);
                false
            }
        }
    }

    /// The fixed smoke scenario: strictly sequential, fail-forward, gated
    /// only on the four prerequisite user creations.
    pub async fn run_scenario(&mut self) {
        info!("--- step 1: create users ---");
        let user1 = self
            .create_user("test_user_1", "Test User 1", "user1@test.com", "13800138001")
            .await;
        let user2 = self
            .create_user("test_user_2", "Test User 2", "user2@test.com", "13800138002")
            .await;
        let user3 = self
            .create_user("test_user_3", "Test User 3", "user3@test.com", "13800138003")
            .await;
        let user4 = self
            .create_user("test_user_4", "Test User 4", "user4@test.com", "13800138004")
            .await;

        let (user1, user2, user3, user4) = match (user1, user2, user3, user4) {
            (Some(u1), Some(u2), Some(u3), Some(u4)) => (u1, u2, u3, u4),
            _ => {
                error!("user creation failed, aborting scenario");
                return;
            }
        };

        info!("--- step 2: list users ---");
        self.list_users(1, 10).await;

        info!("--- step 3: user detail ---");
        self.get_user(user1).await;

        info!("--- step 4: create friendships ---");
        self.create_friendship(user1, user2).await;
        self.create_friendship(user1, user3).await;
        self.create_friendship(user2, user3).await;
        self.create_friendship(user3, user4).await;

        info!("--- step 5: list friendships ---");
        self.list_friendships(1, 10).await;

        info!("--- step 6: user friend lists ---");
        self.user_friends(user1).await;
        self.user_friends(user2).await;

        info!("--- step 7: groups ---");
        if let Some(group_id) = self.list_groups(1, 10).await {
            self.get_group(group_id).await;
        }

        info!("--- step 8: system stats ---");
        self.get_stats().await;
    }

    pub fn summary(&self) -> Summary {
        let total = self.results.len();
        let passed = self.results.iter().filter(|r| r.success).count();
        Summary {
            total,
            passed,
            failed: total - passed,
        }
    }

    /// Prints the aggregated run report to stdout. Pure read of the
    /// accumulated state.
    pub fn print_summary(&self) {
        let summary = self.summary();

        println!();
        println!("{}", "=".repeat(60));
        println!("test summary");
        println!("{}", "=".repeat(60));
        println!();
        println!("total tests: {}", summary.total);
        println!("passed: {}", summary.passed);
        println!("failed: {}", summary.failed);

        if summary.failed > 0 {
            println!();
            println!("failed tests:");
            for result in self.results.iter().filter(|r| !r.success) {
                println!("  - {}: {}", result.name, result.message);
                if let Some(error) = &result.error {
                    println!("    error: {error}");
                }
            }
        }

        println!();
        println!("created resources:");
        println!("  - users: {}", self.tracker.users.len());
        println!("  - friendships: {}", self.tracker.friendships.len());
        println!("  - groups: {}", self.tracker.groups.len());
        println!();
        println!("{}", "=".repeat(60));
    }
}
