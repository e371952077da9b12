//! Execution listings: filters, the pager that merges pages, and bulk status lookups.

pub mod pager;

pub use self::pager::{bulk_status, list_all, DEFAULT_MAX_TOTAL};

/// Server-side filters for an executions listing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExecutionQuery {
    pub status: Option<String>,
    pub user: Option<String>,
    pub job_id: Option<String>,
    /// Relative window such as `"7d"` or `"12h"`.
    pub recent: Option<String>,
}

impl ExecutionQuery {
    pub fn recent_days(days: u32) -> Self {
        Self {
            recent: Some(format!("{}d", days)),
            ..Self::default()
        }
    }

    pub fn with_job(mut self, job_id: impl Into<String>) -> Self {
        self.job_id = Some(job_id.into());
        self
    }

    /// Query parameters in the names the executions endpoint expects.
    pub fn params(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = &self.status {
            params.push(("statusFilter", status.clone()));
        }
        if let Some(user) = &self.user {
            params.push(("userFilter", user.clone()));
        }
        if let Some(job_id) = &self.job_id {
            params.push(("jobIdListFilter", job_id.clone()));
        }
        if let Some(recent) = &self.recent {
            params.push(("recentFilter", recent.clone()));
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_only_include_set_filters() {
        assert!(ExecutionQuery::default().params().is_empty());

        let q = ExecutionQuery::recent_days(30).with_job("abc-123");
        assert_eq!(
            q.params(),
            vec![
                ("jobIdListFilter", "abc-123".to_string()),
                ("recentFilter", "30d".to_string())
            ]
        );
    }
}
