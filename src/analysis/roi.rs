use super::stats::{percent, round2};
use crate::client::{ExecutionRecord, ExecutionStatus, Result, RundeckApi};
use crate::executions::{list_all, ExecutionQuery};
use serde::Serialize;
use serde_json::Value;
use tracing::info;

/// Cap on executions fetched for one job's ROI.
pub const ROI_MAX_EXECUTIONS: u64 = 2000;

/// Inputs to the ROI estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct RoiParams {
    pub cost_per_hour: f64,
    pub days: u32,
    /// Manual work one successful run is assumed to replace.
    pub manual_hours_per_success: f64,
}

impl Default for RoiParams {
    fn default() -> Self {
        Self {
            cost_per_hour: 50.0,
            days: 30,
            manual_hours_per_success: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoiReport {
    pub job_id: String,
    pub job_name: String,
    pub analysis_period_days: u32,
    pub total_executions: u64,
    pub successful_executions: u64,
    pub failed_executions: u64,
    pub success_rate_percent: f64,
    pub total_execution_hours: f64,
    pub total_execution_cost: f64,
    pub estimated_manual_hours_saved: f64,
    pub estimated_value_saved: f64,
    pub roi_percentage: f64,
    pub cost_per_hour_used: f64,
}

/// ROI result; a job with no runs in the window is reported, not raised.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RoiOutcome {
    Report(RoiReport),
    NoExecutions {
        job_id: String,
        job_name: String,
        error: String,
    },
}

/// Estimate ROI for one job over the last `params.days` days.
pub async fn compute_roi<A>(
    api: &A,
    project: &str,
    job_id: &str,
    params: &RoiParams,
) -> Result<RoiOutcome>
where
    A: RundeckApi + ?Sized,
{
    let definition = api.job_definition(job_id).await?;
    let job_name = definition
        .get("name")
        .and_then(Value::as_str)
        .unwrap_or("Unknown")
        .to_string();

    let query = ExecutionQuery::recent_days(params.days).with_job(job_id);
    let records = list_all(api, project, &query, ROI_MAX_EXECUTIONS).await?;

    if records.is_empty() {
        info!(%project, %job_id, "No executions in window for ROI");
        return Ok(RoiOutcome::NoExecutions {
            job_id: job_id.to_string(),
            job_name,
            error: "No executions found for ROI calculation".to_string(),
        });
    }

    Ok(RoiOutcome::Report(roi_from_records(
        job_id, &job_name, &records, params,
    )))
}

/// Reduce a job's executions into an ROI estimate.
pub fn roi_from_records(
    job_id: &str,
    job_name: &str,
    records: &[ExecutionRecord],
    params: &RoiParams,
) -> RoiReport {
    let mut hours = 0.0;
    let mut successful = 0u64;
    let mut failed = 0u64;

    for record in records {
        match record.status() {
            ExecutionStatus::Succeeded => successful += 1,
            ExecutionStatus::Failed => failed += 1,
            _ => {}
        }
        if let Some(secs) = record.duration_secs() {
            hours += secs / 3600.0;
        }
    }

    let total = records.len() as u64;
    let cost = hours * params.cost_per_hour;
    let hours_saved = successful as f64 * params.manual_hours_per_success;
    let value_saved = hours_saved * params.cost_per_hour;
    let roi = if cost > 0.0 {
        (value_saved - cost) / cost * 100.0
    } else {
        0.0
    };

    RoiReport {
        job_id: job_id.to_string(),
        job_name: job_name.to_string(),
        analysis_period_days: params.days,
        total_executions: total,
        successful_executions: successful,
        failed_executions: failed,
        success_rate_percent: round2(percent(successful, total)),
        total_execution_hours: round2(hours),
        total_execution_cost: round2(cost),
        estimated_manual_hours_saved: round2(hours_saved),
        estimated_value_saved: round2(value_saved),
        roi_percentage: round2(roi),
        cost_per_hour_used: params.cost_per_hour,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::mock::ScriptedApi;
    use serde_json::json;

    fn run(status: &str, minutes: Option<u32>) -> ExecutionRecord {
        let mut v = json!({ "status": status, "date-started": {"date": "2024-05-01T00:00:00Z"} });
        if let Some(m) = minutes {
            v["date-ended"] = json!({ "date": format!("2024-05-01T{:02}:{:02}:00Z", m / 60, m % 60) });
        }
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn test_roi_figures() {
        // 4 runs of 30 minutes = 2 hours = $100 at $50/h.
        // 3 successes save 3 hours = $150 -> ROI 50%.
        let records = vec![
            run("succeeded", Some(30)),
            run("succeeded", Some(30)),
            run("succeeded", Some(30)),
            run("failed", Some(30)),
        ];
        let report = roi_from_records("j1", "deploy", &records, &RoiParams::default());

        assert_eq!(report.total_execution_hours, 2.0);
        assert_eq!(report.total_execution_cost, 100.0);
        assert_eq!(report.estimated_manual_hours_saved, 3.0);
        assert_eq!(report.estimated_value_saved, 150.0);
        assert_eq!(report.roi_percentage, 50.0);
        assert_eq!(report.success_rate_percent, 75.0);
        assert_eq!(report.failed_executions, 1);
    }

    #[test]
    fn test_roi_zero_cost_is_zero_percent() {
        let records = vec![run("succeeded", None), run("succeeded", None)];
        let report = roi_from_records("j1", "deploy", &records, &RoiParams::default());
        assert_eq!(report.total_execution_cost, 0.0);
        assert_eq!(report.roi_percentage, 0.0);
        // Successes still count even without a measurable duration
        assert_eq!(report.successful_executions, 2);
        assert_eq!(report.estimated_value_saved, 100.0);
    }

    #[test]
    fn test_misshapen_end_still_counts_toward_totals() {
        let broken: ExecutionRecord = serde_json::from_value(json!({
            "status": "failed",
            "date-started": {"date": "2024-05-01T00:00:00Z"},
            "date-ended": "soon"
        }))
        .unwrap();
        let records = vec![run("succeeded", Some(60)), broken];
        let report = roi_from_records("j1", "deploy", &records, &RoiParams::default());
        assert_eq!(report.total_executions, 2);
        assert_eq!(report.failed_executions, 1);
        assert_eq!(report.total_execution_hours, 1.0);
    }

    #[test]
    fn test_manual_hours_is_configurable() {
        let records = vec![run("succeeded", Some(60))];
        let params = RoiParams {
            manual_hours_per_success: 4.0,
            ..RoiParams::default()
        };
        let report = roi_from_records("j1", "deploy", &records, &params);
        assert_eq!(report.estimated_manual_hours_saved, 4.0);
        assert_eq!(report.roi_percentage, 300.0);
    }

    #[tokio::test]
    async fn test_no_executions_marker() {
        let api = ScriptedApi::new(|req, _| {
            if req.endpoint == "job/j1" {
                Ok(json!([{ "id": "j1", "name": "deploy" }]))
            } else {
                Ok(json!({ "executions": [] }))
            }
        });

        let outcome = compute_roi(&api, "ops", "j1", &RoiParams::default()).await.unwrap();
        match &outcome {
            RoiOutcome::NoExecutions { job_name, error, .. } => {
                assert_eq!(job_name, "deploy");
                assert!(error.contains("No executions found"));
            }
            other => panic!("expected no-executions marker, got {:?}", other),
        }

        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(v["job_id"], "j1");
    }

    #[tokio::test]
    async fn test_compute_roi_scopes_to_job() {
        let api = ScriptedApi::new(|req, _| {
            if req.endpoint == "job/j1" {
                Ok(json!({ "id": "j1", "name": "deploy" }))
            } else {
                Ok(json!([{ "id": 9, "status": "succeeded" }]))
            }
        });

        let params = RoiParams {
            days: 7,
            ..RoiParams::default()
        };
        let outcome = compute_roi(&api, "ops", "j1", &params).await.unwrap();
        assert!(matches!(outcome, RoiOutcome::Report(ref r) if r.total_executions == 1));
        assert_eq!(api.param(1, "jobIdListFilter").as_deref(), Some("j1"));
        assert_eq!(api.param(1, "recentFilter").as_deref(), Some("7d"));
    }
}
