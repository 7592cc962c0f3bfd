//! Response schemas for the admin endpoints.
//!
//! Every field the harness reads is declared here with a tolerant default,
//! so a server that omits a field yields the documented placeholder (0 or
//! "unknown") instead of a decode failure.

use serde::Deserialize;
use serde_json::Value;

pub const UNKNOWN: &str = "unknown";

/// POST /api/admin/users
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateUserResponse {
    pub success: bool,
    pub user_id: Option<u64>,
    pub message: Option<String>,
}

/// GET /api/admin/users
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserPage {
    pub users: Vec<Value>,
    pub total: u64,
}

/// GET /api/admin/users/{id}
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserDetail {
    pub username: Option<String>,
}

/// POST /api/admin/friendships
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateFriendshipResponse {
    pub success: bool,
    pub channel_id: Option<u64>,
    pub message: Option<String>,
}

/// GET /api/admin/friendships
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FriendshipPage {
    pub friendships: Vec<Value>,
    pub total: u64,
}

/// GET /api/admin/friendships/{user_id}
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FriendList {
    pub friends: Vec<Value>,
    pub total: u64,
}

/// GET /api/admin/groups
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GroupPage {
    pub groups: Vec<GroupSummary>,
    pub total: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GroupSummary {
    pub group_id: Option<u64>,
}

/// GET /api/admin/groups/{id}
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct GroupDetail {
    pub name: Option<String>,
    pub member_count: u64,
}

/// GET /api/admin/stats
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Stats {
    pub users: StatTotal,
    pub groups: StatTotal,
    pub messages: StatTotal,
    pub devices: StatTotal,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StatTotal {
    pub total: u64,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn create_user_response_tolerates_missing_fields() {
        let decoded: CreateUserResponse = serde_json::from_value(json!({})).unwrap();
        assert!(!decoded.success);
        assert_eq!(decoded.user_id, None);

        let decoded: CreateUserResponse =
            serde_json::from_value(json!({"success": true, "user_id": 42})).unwrap();
        assert!(decoded.success);
        assert_eq!(decoded.user_id, Some(42));
    }

    #[test]
    fn stats_decode_nested_totals() {
        let decoded: Stats = serde_json::from_value(json!({
            "users": {"total": 4},
            "groups": {"total": 0},
            "messages": {"total": 17},
            "devices": {"total": 2},
        }))
        .unwrap();
        assert_eq!(decoded.users.total, 4);
        assert_eq!(decoded.messages.total, 17);
    }

    #[test]
    fn stats_default_absent_sections_to_zero() {
        let decoded: Stats = serde_json::from_value(json!({"users": {"total": 1}})).unwrap();
        assert_eq!(decoded.users.total, 1);
        assert_eq!(decoded.devices.total, 0);
    }

    #[test]
    fn group_page_reads_entry_ids() {
        let decoded: GroupPage = serde_json::from_value(json!({
            "groups": [{"group_id": 7, "name": "dev"}, {"name": "no-id"}],
            "total": 2,
        }))
        .unwrap();
        assert_eq!(decoded.groups[0].group_id, Some(7));
        assert_eq!(decoded.groups[1].group_id, None);
    }
}
