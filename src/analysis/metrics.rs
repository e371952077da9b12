use super::stats::{mean, median, percent, round2};
use crate::client::{ExecutionRecord, ExecutionStatus, Result, RundeckApi};
use crate::executions::{list_all, ExecutionQuery, DEFAULT_MAX_TOTAL};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use tracing::info;

/// Rows kept in the job-frequency ranking.
const TOP_JOBS: usize = 10;

/// Aggregate view over a project's recent executions.
#[derive(Debug, Clone, Default, Serialize)]
pub struct MetricsReport {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub running_executions: u64,
    pub aborted_executions: u64,
    pub timedout_executions: u64,
    /// Every status seen, unrecognized ones under `unknown`.
    pub status_counts: BTreeMap<String, u64>,
    pub success_rate_percent: f64,
    pub average_duration_seconds: f64,
    pub median_duration_seconds: f64,
    pub metrics_period_days: u32,
    pub most_frequent_jobs: Vec<JobFrequency>,
    pub job_success_rates: BTreeMap<String, JobSuccessRate>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobFrequency {
    pub job_name: String,
    pub executions: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobSuccessRate {
    pub total_executions: u64,
    pub successful_executions: u64,
    pub success_rate_percent: f64,
}

/// Fetch the last `days` of executions (up to 5000) and reduce them.
pub async fn compute_metrics<A>(api: &A, project: &str, days: u32) -> Result<MetricsReport>
where
    A: RundeckApi + ?Sized,
{
    let query = ExecutionQuery::recent_days(days);
    let records = list_all(api, project, &query, DEFAULT_MAX_TOTAL).await?;
    let report = summarize(&records, days);
    info!(
        %project,
        days,
        total = report.total_executions,
        success_rate = report.success_rate_percent,
        "Computed execution metrics"
    );
    Ok(report)
}

/// Reduce a record set. Records without two parseable timestamps still count
/// toward status totals but are left out of the duration statistics.
pub fn summarize(records: &[ExecutionRecord], days: u32) -> MetricsReport {
    let mut report = MetricsReport {
        metrics_period_days: days,
        ..MetricsReport::default()
    };
    if records.is_empty() {
        return report;
    }

    let mut durations = Vec::new();
    let mut per_job: HashMap<&str, (u64, u64)> = HashMap::new();

    for record in records {
        let status = record.status();
        match status {
            ExecutionStatus::Succeeded => report.successful_executions += 1,
            ExecutionStatus::Failed => report.failed_executions += 1,
            ExecutionStatus::Running => report.running_executions += 1,
            ExecutionStatus::Aborted => report.aborted_executions += 1,
            ExecutionStatus::TimedOut => report.timedout_executions += 1,
            ExecutionStatus::Unknown => {}
        }
        *report
            .status_counts
            .entry(status.as_str().to_string())
            .or_default() += 1;

        if let Some(secs) = record.duration_secs() {
            durations.push(secs);
        }

        let entry = per_job.entry(record.job_name()).or_default();
        entry.0 += 1;
        if status == ExecutionStatus::Succeeded {
            entry.1 += 1;
        }
    }

    report.total_executions = records.len() as u64;
    report.success_rate_percent = round2(percent(
        report.successful_executions,
        report.total_executions,
    ));
    report.average_duration_seconds = round2(mean(&durations));
    report.median_duration_seconds = round2(median(&durations));

    // Most frequent first; ties broken by name so the ranking is stable.
    let mut frequency: Vec<JobFrequency> = per_job
        .iter()
        .map(|(name, (total, _))| JobFrequency {
            job_name: name.to_string(),
            executions: *total,
        })
        .collect();
    frequency.sort_by(|a, b| {
        b.executions
            .cmp(&a.executions)
            .then_with(|| a.job_name.cmp(&b.job_name))
    });
    frequency.truncate(TOP_JOBS);
    report.most_frequent_jobs = frequency;

    report.job_success_rates = per_job
        .into_iter()
        .map(|(name, (total, successful))| {
            (
                name.to_string(),
                JobSuccessRate {
                    total_executions: total,
                    successful_executions: successful,
                    success_rate_percent: round2(percent(successful, total)),
                },
            )
        })
        .collect();

    report
}
