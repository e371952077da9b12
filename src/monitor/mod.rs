//! Run a job and optionally wait for it to reach a terminal state.

use std::time::Duration;

use serde::Serialize;
use serde_json::{Map, Value};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::client::{ExecutionStatus, Result, RundeckApi};
use crate::config::MonitorSettings;

/// A job run request.
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub job_id: String,
    pub options: Map<String, Value>,
    pub node_filter: Option<String>,
    pub wait: bool,
    pub timeout_minutes: u64,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
        }
    }
}

impl From<&MonitorSettings> for MonitorConfig {
    fn from(settings: &MonitorSettings) -> Self {
        Self {
            poll_interval: Duration::from_secs(settings.poll_interval_secs.max(1)),
        }
    }
}

/// The run response, plus monitoring fields when the caller waited.
#[derive(Debug, Clone, Serialize)]
pub struct MonitoredRun {
    #[serde(flatten)]
    pub run: Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub final_status: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monitoring_completed: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_wait_time_seconds: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_reached: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u64>,
}

impl MonitoredRun {
    fn started(run: Map<String, Value>) -> Self {
        Self {
            run,
            final_status: None,
            monitoring_completed: None,
            total_wait_time_seconds: None,
            timeout_reached: None,
            timeout_minutes: None,
        }
    }

    fn completed(run: Map<String, Value>, status: Value, waited: Duration) -> Self {
        Self {
            final_status: Some(status),
            monitoring_completed: Some(true),
            total_wait_time_seconds: Some(waited.as_secs_f64()),
            ..Self::started(run)
        }
    }

    fn timed_out(run: Map<String, Value>, timeout_minutes: u64) -> Self {
        Self {
            monitoring_completed: Some(false),
            timeout_reached: Some(true),
            timeout_minutes: Some(timeout_minutes),
            ..Self::started(run)
        }
    }

    pub fn is_completed(&self) -> bool {
        self.monitoring_completed == Some(true)
    }

    pub fn is_timed_out(&self) -> bool {
        self.timeout_reached == Some(true)
    }
}

/// Start the job; when `wait` is set, poll until a terminal status or timeout.
///
/// A polling error stops monitoring early and is reported as a timeout; the
/// run itself has already been started at that point.
pub async fn run_and_monitor<A>(
    api: &A,
    request: &RunRequest,
    config: &MonitorConfig,
) -> Result<MonitoredRun>
where
    A: RundeckApi + ?Sized,
{
    let run = api
        .run_job(&request.job_id, &request.options, request.node_filter.as_deref())
        .await?;
    let run = match run {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("response".to_string(), other);
            map
        }
    };

    let execution_id = match run.get("id") {
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    };

    let execution_id = match (request.wait, execution_id) {
        (true, Some(id)) => id,
        _ => return Ok(MonitoredRun::started(run)),
    };

    info!(job = %request.job_id, execution = %execution_id, timeout_minutes = request.timeout_minutes, "Monitoring execution");
    let started = Instant::now();
    let timeout = Duration::from_secs(request.timeout_minutes.saturating_mul(60));

    while started.elapsed() < timeout {
        match api.execution_status(&execution_id).await {
            Ok(status) => {
                let current = status
                    .get("status")
                    .and_then(Value::as_str)
                    .map(ExecutionStatus::from_raw)
                    .unwrap_or(ExecutionStatus::Unknown);
                debug!(execution = %execution_id, status = %current, "Polled execution");

                if current.is_terminal() {
                    let waited = started.elapsed();
                    info!(execution = %execution_id, status = %current, waited_secs = waited.as_secs_f64(), "Execution finished");
                    return Ok(MonitoredRun::completed(run, status, waited));
                }
            }
            Err(e) => {
                warn!(execution = %execution_id, "Error monitoring execution: {}", e);
                break;
            }
        }

        tokio::time::sleep(config.poll_interval).await;
    }

    info!(execution = %execution_id, "Stopped monitoring before completion");
    Ok(MonitoredRun::timed_out(run, request.timeout_minutes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::ScriptedApi;
    use crate::client::{Method, RundeckError};
    use serde_json::json;

    fn fast() -> MonitorConfig {
        MonitorConfig {
            poll_interval: Duration::from_millis(20),
        }
    }

    fn request(wait: bool, timeout_minutes: u64) -> RunRequest {
        RunRequest {
            job_id: "job-1".into(),
            wait,
            timeout_minutes,
            ..RunRequest::default()
        }
    }

    /// Run answers with execution 77, whose status is always `status`.
    fn scripted(status: &'static str) -> ScriptedApi {
        ScriptedApi::new(move |req, _| {
            if req.method == Method::Post {
                return Ok(json!({"id": 77, "permalink": "http://rd/execution/77"}));
            }
            Ok(json!({"id": 77, "status": status}))
        })
    }

    #[tokio::test]
    async fn test_no_wait_returns_run_result() {
        let api = scripted("running");
        let result = run_and_monitor(&api, &request(false, 30), &fast()).await.unwrap();

        assert_eq!(result.run["id"], 77);
        assert!(result.monitoring_completed.is_none());
        assert_eq!(api.count("execution/77"), 0);
    }

    #[tokio::test]
    async fn test_completes_after_running_polls() {
        let polls = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = polls.clone();
        let api = ScriptedApi::new(move |req, _| {
            if req.method == Method::Post {
                return Ok(json!({"id": 77}));
            }
            let n = counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            let status = if n < 2 { "running" } else { "succeeded" };
            Ok(json!({"id": 77, "status": status}))
        });

        let config = fast();
        let begin = std::time::Instant::now();
        let result = run_and_monitor(&api, &request(true, 30), &config).await.unwrap();

        assert!(result.is_completed());
        assert!(!result.is_timed_out());
        assert_eq!(result.final_status.as_ref().unwrap()["status"], "succeeded");
        assert_eq!(api.count("execution/77"), 3);
        // Two sleeps between three polls, with generous slack
        assert!(begin.elapsed() < config.poll_interval * 2 + Duration::from_secs(2));

        let v = serde_json::to_value(&result).unwrap();
        assert_eq!(v["id"], 77);
        assert_eq!(v["monitoring_completed"], true);
        assert!(v["total_wait_time_seconds"].as_f64().unwrap() >= 0.0);
        assert!(v.get("timeout_reached").is_none());
    }

    #[tokio::test]
    async fn test_zero_timeout_returns_immediately() {
        let api = scripted("running");
        let result = run_and_monitor(&api, &request(true, 0), &fast()).await.unwrap();

        assert!(result.is_timed_out());
        assert_eq!(result.monitoring_completed, Some(false));
        assert_eq!(result.timeout_minutes, Some(0));
        assert_eq!(api.count("execution/77"), 0);
    }

    #[tokio::test]
    async fn test_poll_error_ends_monitoring() {
        let api = ScriptedApi::new(|req, _| {
            if req.method == Method::Post {
                return Ok(json!({"id": "88"}));
            }
            Err(RundeckError::Timeout { attempts: 3 })
        });

        let result = run_and_monitor(&api, &request(true, 30), &fast()).await.unwrap();
        assert!(result.is_timed_out());
        assert_eq!(result.timeout_minutes, Some(30));
        assert_eq!(api.count("execution/88"), 1);
    }

    #[tokio::test]
    async fn test_missing_execution_id_skips_monitoring() {
        let api = ScriptedApi::new(|_, _| Ok(json!({})));
        let result = run_and_monitor(&api, &request(true, 30), &fast()).await.unwrap();
        assert!(result.monitoring_completed.is_none());
        assert_eq!(api.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_run_failure_propagates() {
        let api = ScriptedApi::new(|_, _| {
            Err(RundeckError::http(403, "http://rd/api/47/job/job-1/run", "Forbidden"))
        });
        let result = run_and_monitor(&api, &request(true, 30), &fast()).await;
        assert!(matches!(result, Err(RundeckError::Http { status: 403, .. })));
    }

    #[tokio::test]
    async fn test_run_sends_options_and_filter() {
        let api = scripted("succeeded");
        let mut options = Map::new();
        options.insert("env".into(), json!("prod"));
        let req = RunRequest {
            options,
            node_filter: Some("tags: web".into()),
            ..request(true, 30)
        };

        let result = run_and_monitor(&api, &req, &fast()).await.unwrap();
        assert!(result.is_completed());

        let sent = &api.requests()[0];
        assert_eq!(sent.endpoint, "job/job-1/run");
        let body = sent.body.as_ref().unwrap();
        assert_eq!(body["options"]["env"], "prod");
        assert_eq!(body["filter"], "tags: web");
    }
}
