//! Argument maps accepted by each tool.

use serde::Deserialize;
use serde_json::{Map, Value};

fn default_true() -> bool {
    true
}

fn default_max_results() -> u64 {
    100
}

fn default_max_total() -> u64 {
    crate::executions::DEFAULT_MAX_TOTAL
}

fn default_days() -> u32 {
    30
}

fn default_cost_per_hour() -> f64 {
    50.0
}

fn default_timeout_minutes() -> u64 {
    30
}

#[derive(Debug, Default, Deserialize)]
pub struct ServerArgs {
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobsArgs {
    pub project: String,
    #[serde(default)]
    pub job_filter: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct JobArgs {
    pub job_id: String,
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RunJobArgs {
    pub job_id: String,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub node_filter: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ExecutionArgs {
    pub execution_id: String,
    #[serde(default)]
    pub server: Option<String>,
}

/// Filters shared by both execution listing tools.
#[derive(Debug, Default, Deserialize)]
pub struct ExecutionFilters {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub recent_filter: Option<String>,
}

impl ExecutionFilters {
    pub fn to_query(&self) -> crate::executions::ExecutionQuery {
        crate::executions::ExecutionQuery {
            status: self.status.clone(),
            user: self.user.clone(),
            job_id: self.job_id.clone(),
            recent: self.recent_filter.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ExecutionsArgs {
    pub project: String,
    #[serde(default = "default_max_results")]
    pub max_results: u64,
    #[serde(default)]
    pub offset: u64,
    #[serde(flatten)]
    pub filters: ExecutionFilters,
    #[serde(default = "default_true")]
    pub summary_only: bool,
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AllExecutionsArgs {
    pub project: String,
    #[serde(default = "default_max_total")]
    pub max_total: u64,
    #[serde(flatten)]
    pub filters: ExecutionFilters,
    #[serde(default = "default_true")]
    pub summary_only: bool,
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MetricsArgs {
    pub project: String,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectArgs {
    pub project: String,
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RoiArgs {
    pub project: String,
    pub job_id: String,
    #[serde(default = "default_cost_per_hour")]
    pub cost_per_hour: f64,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BulkStatusArgs {
    pub execution_ids: Vec<String>,
    #[serde(default)]
    pub server: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MonitorArgs {
    pub job_id: String,
    #[serde(default)]
    pub options: Map<String, Value>,
    #[serde(default)]
    pub node_filter: Option<String>,
    #[serde(default)]
    pub wait_for_completion: bool,
    #[serde(default = "default_timeout_minutes")]
    pub timeout_minutes: u64,
    #[serde(default)]
    pub server: Option<String>,
}
