use super::{ApiRequest, Method, Result, RundeckApi, RundeckError};
use crate::config::ServerProfile;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, error, warn};

/// Per-attempt request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Total attempts for connection failures and timeouts.
pub const MAX_ATTEMPTS: u32 = 3;

const AUTH_HEADER: &str = "x-rundeck-auth-token";
const PREVIEW_BYTES: usize = 200;

/// HTTP transport for a single Rundeck server.
pub struct RundeckClient {
    client: Client,
    base_url: String,
    api_version: String,
}

impl RundeckClient {
    pub fn new(profile: &ServerProfile) -> Result<Self> {
        Self::with_timeout(profile, REQUEST_TIMEOUT)
    }

    /// Like [`RundeckClient::new`] with a custom per-attempt timeout.
    pub fn with_timeout(profile: &ServerProfile, timeout: Duration) -> Result<Self> {
        let mut headers = HeaderMap::new();
        let token = HeaderValue::from_str(&profile.token)
            .map_err(|e| RundeckError::Request(format!("invalid API token header: {}", e)))?;
        headers.insert(AUTH_HEADER, token);
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| RundeckError::Request(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: profile.url.trim_end_matches('/').to_string(),
            api_version: profile.api_version.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// `{base}/api/{version}/{endpoint}`
    pub fn url_for(&self, endpoint: &str) -> String {
        format!(
            "{}/api/{}/{}",
            self.base_url,
            self.api_version,
            endpoint.trim_start_matches('/')
        )
    }

    async fn attempt(&self, url: &str, request: &ApiRequest) -> AttemptResult {
        let mut builder = match request.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = match builder.send().await {
            Ok(r) => r,
            Err(e) => return AttemptResult::Transport(e),
        };

        let status = response.status();
        if !status.is_success() {
            let reason = status.canonical_reason().unwrap_or("HTTP error");
            error!(%url, status = status.as_u16(), "HTTP error");
            return AttemptResult::Done(Err(RundeckError::http(status.as_u16(), url, reason)));
        }

        let bytes = match response.bytes().await {
            Ok(b) => b,
            Err(e) => return AttemptResult::Transport(e),
        };

        AttemptResult::Done(decode_body(&bytes))
    }
}

enum AttemptResult {
    Done(Result<Value>),
    Transport(reqwest::Error),
}

/// Empty bodies are a success with an empty object.
pub(crate) fn decode_body(bytes: &[u8]) -> Result<Value> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Map::new()));
    }

    serde_json::from_slice(bytes).map_err(|e| {
        error!("Failed to decode JSON response: {}", e);
        let end = bytes.len().min(PREVIEW_BYTES);
        RundeckError::Decode {
            preview: String::from_utf8_lossy(&bytes[..end]).into_owned(),
        }
    })
}

#[async_trait::async_trait]
impl RundeckApi for RundeckClient {
    async fn execute(&self, request: ApiRequest) -> Result<Value> {
        let url = self.url_for(&request.endpoint);
        debug!(method = %request.method, %url, "Rundeck request");

        let mut attempt = 1;
        loop {
            let err = match self.attempt(&url, &request).await {
                AttemptResult::Done(result) => return result,
                AttemptResult::Transport(e) => e,
            };

            let retryable = err.is_timeout() || err.is_connect();
            if !retryable {
                error!(%url, "Request failed: {}", err);
                return Err(RundeckError::Request(err.to_string()));
            }

            warn!(
                %url,
                attempt,
                max_attempts = MAX_ATTEMPTS,
                timeout = err.is_timeout(),
                "Request attempt failed: {}",
                err
            );
            if attempt >= MAX_ATTEMPTS {
                return Err(if err.is_timeout() {
                    RundeckError::Timeout {
                        attempts: MAX_ATTEMPTS,
                    }
                } else {
                    RundeckError::Connection {
                        attempts: MAX_ATTEMPTS,
                        base_url: self.base_url.clone(),
                    }
                });
            }
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(url: &str) -> ServerProfile {
        ServerProfile {
            name: "default".into(),
            url: url.into(),
            token: "secret".into(),
            api_version: "47".into(),
        }
    }

    #[test]
    fn test_url_building() {
        let client = RundeckClient::new(&profile("https://rundeck.example.com/")).unwrap();
        assert_eq!(
            client.url_for("project/ops/jobs"),
            "https://rundeck.example.com/api/47/project/ops/jobs"
        );
        assert_eq!(
            client.url_for("/system/info"),
            "https://rundeck.example.com/api/47/system/info"
        );
    }

    #[test]
    fn test_decode_empty_body() {
        assert_eq!(decode_body(b"").unwrap(), Value::Object(Map::new()));
        assert_eq!(decode_body(b"  \n").unwrap(), Value::Object(Map::new()));
    }

    #[test]
    fn test_decode_bad_json_preview_is_truncated() {
        let body = format!("<html>{}</html>", "x".repeat(500));
        match decode_body(body.as_bytes()) {
            Err(RundeckError::Decode { preview }) => {
                assert!(preview.starts_with("<html>"));
                assert_eq!(preview.len(), PREVIEW_BYTES);
            }
            other => panic!("expected decode error, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_token_rejected() {
        let mut p = profile("http://localhost");
        p.token = "bad\ntoken".into();
        assert!(RundeckClient::new(&p).is_err());
    }
}
