use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Method, Request};
use hyper_util::rt::TokioIo;
use log::debug;
use serde_json::Value;
use tokio::net::TcpStream;
use url::Url;

use crate::config::HarnessConfig;
use crate::error::{HarnessError, Result};

/// Seam between the test operations and the network, so the harness can be
/// driven by a scripted transport in tests.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Sends one request. GET/DELETE payloads become query parameters,
    /// POST/PUT payloads are sent as a JSON body.
    async fn request(&self, method: &str, endpoint: &str, payload: Option<Value>)
        -> Result<Value>;
}

#[derive(Debug)]
pub struct HttpClient {
    base_url: Url,
    service_key: String,
}

impl HttpClient {
    pub fn new(config: &HarnessConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|err| HarnessError::network(format!("invalid base url: {err}")))?;
        if base_url.scheme() != "http" {
            return Err(HarnessError::network(format!(
                "only http urls are supported, got {}",
                base_url.scheme()
            )));
        }
        Ok(HttpClient {
            base_url,
            service_key: config.service_key.clone(),
        })
    }

    fn build_url(&self, endpoint: &str, query: Option<&Value>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}{}", self.base_url.as_str().trim_end_matches('/'), endpoint))
            .map_err(|err| HarnessError::network(format!("invalid endpoint {endpoint}: {err}")))?;

        if let Some(Value::Object(params)) = query {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in params {
                match value {
                    Value::Null => {}
                    Value::String(s) => {
                        pairs.append_pair(key, s);
                    }
                    other => {
                        pairs.append_pair(key, &other.to_string());
                    }
                }
            }
        }
        Ok(url)
    }

    async fn dispatch(&self, method: Method, url: &Url, body: Option<&Value>) -> Result<Value> {
        let host = url
            .host_str()
            .ok_or_else(|| HarnessError::network("url has no host"))?;
        let port = url.port_or_known_default().unwrap_or(80);
        let addr = format!("{host}:{port}");

        let stream = TcpStream::connect(&addr)
            .await
            .map_err(|err| HarnessError::network(format!("connect {addr}: {err}")))?;

        let (mut sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|err| HarnessError::network(format!("handshake: {err}")))?;
        tokio::task::spawn(async move {
            if let Err(err) = conn.await {
                debug!("connection closed: {err:?}");
            }
        });

        let path_and_query = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        let mut builder = Request::builder()
            .method(method)
            .uri(path_and_query)
            .header(hyper::header::HOST, addr.as_str())
            .header("X-Service-Key", &self.service_key);

        let body = match body {
            Some(value) => {
                builder = builder.header(hyper::header::CONTENT_TYPE, "application/json");
                let encoded = serde_json::to_vec(value)
                    .map_err(|err| HarnessError::network(format!("encode body: {err}")))?;
                Full::new(Bytes::from(encoded))
            }
            None => Full::new(Bytes::new()),
        };
        let request = builder
            .body(body)
            .map_err(|err| HarnessError::network(format!("build request: {err}")))?;

        let response = sender
            .send_request(request)
            .await
            .map_err(|err| HarnessError::network(format!("send request: {err}")))?;
        let status = response.status();
        let bytes = response
            .collect()
            .await
            .map_err(|err| HarnessError::network(format!("read response: {err}")))?
            .to_bytes();

        // Non-2xx is treated the same as a connection failure, with the
        // response text carried along when the server sent any.
        if !status.is_success() {
            let text = String::from_utf8_lossy(&bytes);
            return Err(HarnessError::Network(format!(
                "HTTP {status} - {}",
                text.trim()
            )));
        }

        serde_json::from_slice(&bytes)
            .map_err(|err| HarnessError::network(format!("invalid json response: {err}")))
    }
}

impl Transport for HttpClient {
    async fn request(
        &self,
        method: &str,
        endpoint: &str,
        payload: Option<Value>,
    ) -> Result<Value> {
        // Method validation comes first: an unsupported method must fail
        // before any socket is opened.
        let parsed = parse_method(method)?;
        match parsed {
            Method::GET | Method::DELETE => {
                let url = self.build_url(endpoint, payload.as_ref())?;
                self.dispatch(parsed, &url, None).await
            }
            _ => {
                let url = self.build_url(endpoint, None)?;
                self.dispatch(parsed, &url, payload.as_ref()).await
            }
        }
    }
}

fn parse_method(method: &str) -> Result<Method> {
    match method.to_ascii_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "DELETE" => Ok(Method::DELETE),
        _ => Err(HarnessError::UnsupportedMethod(method.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn client(base_url: &str) -> HttpClient {
        HttpClient::new(&HarnessConfig {
            base_url: base_url.to_string(),
            service_key: "test-key".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn accepts_the_four_supported_methods() {
        for method in ["GET", "post", "Put", "DELETE"] {
            assert!(parse_method(method).is_ok());
        }
    }

    #[test]
    fn rejects_other_methods_with_exact_message() {
        let err = parse_method("PATCH").unwrap_err();
        assert_eq!(err.to_string(), "unsupported method: PATCH");
    }

    #[test]
    fn rejects_https_base_urls() {
        let err = HttpClient::new(&HarnessConfig {
            base_url: "https://localhost:8083".to_string(),
            service_key: "k".to_string(),
        })
        .unwrap_err();
        assert!(err.to_string().contains("only http urls"));
    }

    #[test]
    fn joins_endpoint_onto_base_url() {
        let url = client("http://localhost:8083")
            .build_url("/api/admin/users/3", None)
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8083/api/admin/users/3");
    }

    #[test]
    fn encodes_object_payloads_as_query_pairs() {
        let url = client("http://localhost:8083")
            .build_url(
                "/api/admin/users",
                Some(&json!({"page": 1, "page_size": 10, "search": "a b"})),
            )
            .unwrap();
        let query = url.query().unwrap();
        assert!(query.contains("page=1"));
        assert!(query.contains("page_size=10"));
        assert!(query.contains("search=a+b"));
    }

    #[test]
    fn skips_null_query_values() {
        let url = client("http://localhost:8083")
            .build_url("/api/admin/users", Some(&json!({"search": null, "page": 2})))
            .unwrap();
        assert_eq!(url.query(), Some("page=2"));
    }

    #[tokio::test]
    async fn unsupported_method_fails_without_network_activity() {
        // Port 9 on a reserved address would hang or refuse; the method
        // check must reject PATCH before any connection attempt.
        let client = client("http://192.0.2.1:9");
        let err = client
            .request("PATCH", "/api/admin/users", None)
            .await
            .unwrap_err();
        assert!(matches!(err, HarnessError::UnsupportedMethod(_)));
        assert_eq!(err.to_string(), "unsupported method: PATCH");
    }
}
