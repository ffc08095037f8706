//! HTTP access to the bridge.

use std::future::Future;
use std::time::Duration;

use log::debug;
use reqwest::StatusCode;
use serde_json::Value;

use crate::config::BridgeConfig;
use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// Status and decoded body of a bridge reply.
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeResponse {
    pub status: u16,
    pub body: Value,
}

impl BridgeResponse {
    pub fn new(status: u16, body: Value) -> Self {
        BridgeResponse { status, body }
    }

    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK.as_u16()
    }
}

/// The verbs the reconciliation engine needs from a bridge.
///
/// Implementations do not retry; a failed call is reported upward and the
/// engine's next loop trigger is the retry.
pub trait Bridge: Send + Sync + 'static {
    /// GET `base + path`.
    fn get(&self, path: &str) -> impl Future<Output = Result<BridgeResponse>> + Send;

    /// PUT a JSON body to `base + path`.
    fn put(&self, path: &str, body: &Value) -> impl Future<Output = Result<BridgeResponse>> + Send;
}

/// A [`Bridge`] speaking to a real bridge over HTTP.
#[derive(Debug, Clone)]
pub struct HttpBridge {
    http: reqwest::Client,
    base_uri: String,
}

impl HttpBridge {
    /// Build a client from the bridge configuration.
    pub fn new(config: &BridgeConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;
        Ok(Self::with_client(http, &config.base_uri()))
    }

    /// Use a pre-built `reqwest::Client` against `base_uri`.
    pub fn with_client(http: reqwest::Client, base_uri: &str) -> Self {
        HttpBridge {
            http,
            base_uri: base_uri.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    fn uri(&self, path: &str) -> String {
        format!("{}{}", self.base_uri, path)
    }

    async fn read(resp: reqwest::Response) -> Result<BridgeResponse> {
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        // Error pages from proxies are not JSON; keep them readable.
        let body = serde_json::from_str(&text).unwrap_or(Value::String(text));
        Ok(BridgeResponse { status, body })
    }
}

impl Bridge for HttpBridge {
    async fn get(&self, path: &str) -> Result<BridgeResponse> {
        debug!("GET {}", path);
        let resp = self.http.get(self.uri(path)).send().await?;
        Self::read(resp).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<BridgeResponse> {
        debug!("PUT {} {}", path, body);
        // `json` sets Content-Type: application/json
        let resp = self.http.put(self.uri(path)).json(body).send().await?;
        Self::read(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup() -> (MockServer, HttpBridge) {
        let server = MockServer::start().await;
        let bridge = HttpBridge::with_client(reqwest::Client::new(), &format!("{}/api/key/", server.uri()));
        (server, bridge)
    }

    #[tokio::test]
    async fn test_get_lights() {
        let (server, bridge) = setup().await;
        let body = json!({"5": {"name": "Lamp", "uniqueid": "AA:BB"}});

        Mock::given(method("GET"))
            .and(path("/api/key/lights"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let resp = bridge.get("/lights").await.unwrap();
        assert!(resp.is_ok());
        assert_eq!(resp.body, body);
    }

    #[tokio::test]
    async fn test_put_sends_json() {
        let (server, bridge) = setup().await;
        let reply = json!([{"success": {"/groups/1/lights": ["5"]}}]);

        Mock::given(method("PUT"))
            .and(path("/api/key/groups/1"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({"lights": ["5"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(&reply))
            .expect(1)
            .mount(&server)
            .await;

        let resp = bridge.put("/groups/1", &json!({"lights": ["5"]})).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, reply);
    }

    #[tokio::test]
    async fn test_non_json_error_body() {
        let (server, bridge) = setup().await;

        Mock::given(method("GET"))
            .and(path("/api/key/groups"))
            .respond_with(ResponseTemplate::new(503).set_body_string("busy"))
            .mount(&server)
            .await;

        let resp = bridge.get("/groups").await.unwrap();
        assert!(!resp.is_ok());
        assert_eq!(resp.status, 503);
        assert_eq!(resp.body, Value::String("busy".to_string()));
    }

    #[tokio::test]
    async fn test_connection_failure_is_transient() {
        let bridge = HttpBridge::with_client(reqwest::Client::new(), "http://127.0.0.1:9/api/key");
        let err = bridge.get("/lights").await.unwrap_err();
        assert!(err.is_transient());
    }
}
