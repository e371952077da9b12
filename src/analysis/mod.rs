//! Derived analytics over execution history: success rates, durations,
//! job frequency, ROI estimates, and per-project rollups.

pub mod metrics;
pub mod roi;
pub mod stats;

pub use self::metrics::{compute_metrics, summarize, MetricsReport};
pub use self::roi::{compute_roi, RoiOutcome, RoiParams, RoiReport};

use crate::client::{Result, RundeckApi};
use serde::Serialize;
use serde_json::Value;

/// Window used for the metrics section of [`project_stats`].
pub const PROJECT_STATS_DAYS: u32 = 30;

/// Job inventory plus recent execution metrics for one project.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectStats {
    pub project_name: String,
    pub project_description: String,
    pub total_jobs: u64,
    pub enabled_jobs: u64,
    pub disabled_jobs: u64,
    pub scheduled_jobs: u64,
    pub execution_metrics_30_days: MetricsReport,
}

pub async fn project_stats<A>(api: &A, project: &str) -> Result<ProjectStats>
where
    A: RundeckApi + ?Sized,
{
    // 1. Project description from the project list
    let projects = api.list_projects().await?;
    let description = projects
        .iter()
        .find(|p| p.get("name").and_then(Value::as_str) == Some(project))
        .and_then(|p| p.get("description").and_then(Value::as_str))
        .unwrap_or_default()
        .to_string();

    // 2. Job inventory
    let jobs = api.list_jobs(project, None).await?;
    let total = jobs.len() as u64;
    let enabled = jobs.iter().filter(|j| j.enabled).count() as u64;
    let scheduled = jobs.iter().filter(|j| j.scheduled).count() as u64;

    // 3. Execution metrics
    let metrics = compute_metrics(api, project, PROJECT_STATS_DAYS).await?;

    Ok(ProjectStats {
        project_name: project.to_string(),
        project_description: description,
        total_jobs: total,
        enabled_jobs: enabled,
        disabled_jobs: total - enabled,
        scheduled_jobs: scheduled,
        execution_metrics_30_days: metrics,
    })
}
