//! Rundeck API access: the request primitive, typed records, and the
//! higher-level operations every tool is built on.

pub mod http;
pub mod model;

#[cfg(test)]
pub(crate) mod mock;

pub use self::http::RundeckClient;
pub use self::model::{
    ExecutionPage, ExecutionRecord, ExecutionStatus, JobRef, JobSummary, Listing,
};

use crate::executions::ExecutionQuery;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{info, warn};

/// Maximum page size the executions endpoint accepts.
pub const MAX_PAGE_SIZE: u64 = 1000;

#[derive(Debug, Error)]
pub enum RundeckError {
    #[error("failed to connect to Rundeck server after {attempts} attempts; check that the server is running and accessible at {base_url}")]
    Connection { attempts: u32, base_url: String },

    #[error("request timed out after {attempts} attempts; the Rundeck server may be overloaded or unreachable")]
    Timeout { attempts: u32 },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("invalid JSON response from Rundeck server. Response: {preview}")]
    Decode { preview: String },

    #[error("request failed: {0}")]
    Request(String),

    #[error("no Rundeck clients initialized")]
    NotConfigured,

    #[error("Rundeck server '{name}' not found. Available servers: {}", .available.join(", "))]
    UnknownServer { name: String, available: Vec<String> },

    #[error("no Rundeck servers configured; set RUNDECK_URL and RUNDECK_API_TOKEN for a single server, or RUNDECK_URL_1, RUNDECK_API_TOKEN_1, etc. for multiple servers")]
    NoServersConfigured,
}

impl RundeckError {
    /// Only connectivity problems are worth another attempt.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RundeckError::Connection { .. } | RundeckError::Timeout { .. })
    }

    /// Build an HTTP failure, adding guidance for the statuses an operator can act on.
    pub fn http(status: u16, url: &str, reason: &str) -> Self {
        let message = match status {
            401 => "Authentication failed. Please check your RUNDECK_API_TOKEN.".to_string(),
            403 => "Access forbidden. Please check your API token permissions.".to_string(),
            404 => format!(
                "Resource not found: {}. Please check the endpoint and API version.",
                url
            ),
            _ => format!("{} for url: {}", reason, url),
        };
        RundeckError::Http { status, message }
    }
}

pub type Result<T> = std::result::Result<T, RundeckError>;

/// HTTP verbs used against the Rundeck API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Method::Get => write!(f, "GET"),
            Method::Post => write!(f, "POST"),
        }
    }
}

/// One call against the API, relative to `{base}/api/{version}/`.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    pub endpoint: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: None,
        }
    }

    pub fn post(endpoint: impl Into<String>, body: Value) -> Self {
        Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            query: Vec::new(),
            body: Some(body),
        }
    }

    pub fn param(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }
}

/// Trait for anything that can answer Rundeck API requests.
///
/// Implementors only provide [`RundeckApi::execute`]; every higher-level
/// operation is derived from it and normalizes the list-or-object response
/// shapes the server produces.
#[async_trait::async_trait]
pub trait RundeckApi: Send + Sync {
    /// Perform one request and return the decoded JSON body.
    /// An empty body decodes to an empty object.
    async fn execute(&self, request: ApiRequest) -> Result<Value>;

    async fn list_projects(&self) -> Result<Vec<Value>> {
        let response = self.execute(ApiRequest::get("projects")).await?;
        Ok(Listing::decode(response).into_items("projects"))
    }

    async fn list_jobs(&self, project: &str, name_filter: Option<&str>) -> Result<Vec<JobSummary>> {
        info!(%project, filter = ?name_filter, "Requesting jobs");
        let mut request = ApiRequest::get(format!("project/{}/jobs", project));
        if let Some(filter) = name_filter {
            request = request.param("jobFilter", filter);
        }

        let response = self.execute(request).await?;
        let jobs: Vec<JobSummary> = decode_each(Listing::decode(response).into_items("jobs"));
        info!(%project, count = jobs.len(), "Retrieved jobs");
        Ok(jobs)
    }

    /// Full job definition. The server answers with a one-element array.
    async fn job_definition(&self, job_id: &str) -> Result<Value> {
        let response = self.execute(ApiRequest::get(format!("job/{}", job_id))).await?;
        Ok(match response {
            Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
            obj @ Value::Object(_) => obj,
            _ => Value::Object(Map::new()),
        })
    }

    async fn run_job(
        &self,
        job_id: &str,
        options: &Map<String, Value>,
        node_filter: Option<&str>,
    ) -> Result<Value> {
        let mut body = Map::new();
        if !options.is_empty() {
            body.insert("options".to_string(), Value::Object(options.clone()));
        }
        if let Some(filter) = node_filter {
            body.insert("filter".to_string(), json!(filter));
        }

        info!(%job_id, node_filter = ?node_filter, "Starting job");
        self.execute(ApiRequest::post(format!("job/{}/run", job_id), Value::Object(body)))
            .await
    }

    async fn execution_status(&self, execution_id: &str) -> Result<Value> {
        self.execute(ApiRequest::get(format!("execution/{}", execution_id)))
            .await
    }

    async fn execution_output(&self, execution_id: &str) -> Result<Value> {
        self.execute(ApiRequest::get(format!("execution/{}/output", execution_id)))
            .await
    }

    /// Fetch one page of executions. `max` is clamped to [`MAX_PAGE_SIZE`].
    async fn list_executions(
        &self,
        project: &str,
        query: &ExecutionQuery,
        offset: u64,
        max: u64,
    ) -> Result<ExecutionPage> {
        let page_size = max.min(MAX_PAGE_SIZE);
        let mut request = ApiRequest::get(format!("project/{}/executions", project))
            .param("max", page_size)
            .param("offset", offset);
        for (key, value) in query.params() {
            request = request.param(key, value);
        }

        let response = self.execute(request).await?;
        Ok(ExecutionPage::decode(response, offset, page_size))
    }

    /// System information. Failures are reported inline rather than raised.
    async fn system_info(&self) -> Value {
        match self.execute(ApiRequest::get("system/info")).await {
            Ok(info) => info,
            Err(e) => {
                warn!("Could not fetch system info: {}", e);
                json!({ "error": e.to_string() })
            }
        }
    }
}

/// Decode each element independently, skipping the ones that do not fit.
pub(crate) fn decode_each<T: serde::de::DeserializeOwned>(items: Vec<Value>) -> Vec<T> {
    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(v) => Some(v),
            Err(e) => {
                warn!("Skipping malformed record: {}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_guidance() {
        let e = RundeckError::http(401, "http://rd/api/47/projects", "Unauthorized");
        assert!(e.to_string().contains("RUNDECK_API_TOKEN"));

        let e = RundeckError::http(403, "http://rd/api/47/projects", "Forbidden");
        assert!(e.to_string().contains("permissions"));

        let e = RundeckError::http(404, "http://rd/api/47/job/x", "Not Found");
        assert!(e.to_string().contains("http://rd/api/47/job/x"));
        assert!(e.to_string().contains("API version"));

        let e = RundeckError::http(500, "http://rd/api/47/projects", "Internal Server Error");
        assert!(matches!(e, RundeckError::Http { status: 500, .. }));
        assert!(e.to_string().contains("Internal Server Error"));
    }

    #[test]
    fn test_only_connectivity_is_retryable() {
        assert!(RundeckError::Timeout { attempts: 3 }.is_retryable());
        assert!(RundeckError::Connection {
            attempts: 3,
            base_url: "http://rd".into()
        }
        .is_retryable());
        assert!(!RundeckError::http(500, "u", "boom").is_retryable());
        assert!(!RundeckError::Decode { preview: "<html>".into() }.is_retryable());
    }

    #[test]
    fn test_unknown_server_lists_names() {
        let e = RundeckError::UnknownServer {
            name: "missing".into(),
            available: vec!["default".into(), "prod".into()],
        };
        let msg = e.to_string();
        assert!(msg.contains("'missing'"));
        assert!(msg.contains("default, prod"));
    }

    #[test]
    fn test_request_builder_params() {
        let req = ApiRequest::get("project/ops/executions")
            .param("max", 10)
            .param("offset", 0);
        assert_eq!(req.method, Method::Get);
        assert_eq!(
            req.query,
            vec![
                ("max".to_string(), "10".to_string()),
                ("offset".to_string(), "0".to_string())
            ]
        );
        assert!(req.body.is_none());
    }
}
