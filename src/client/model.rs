//! Typed views over Rundeck's JSON payloads.

use chrono::{DateTime, TimeZone, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Execution lifecycle states. Anything the server reports outside the
/// known set is aggregated as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExecutionStatus {
    Running,
    Succeeded,
    Failed,
    Aborted,
    TimedOut,
    Unknown,
}

impl ExecutionStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "running" => ExecutionStatus::Running,
            "succeeded" => ExecutionStatus::Succeeded,
            "failed" => ExecutionStatus::Failed,
            "aborted" => ExecutionStatus::Aborted,
            "timedout" => ExecutionStatus::TimedOut,
            _ => ExecutionStatus::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Running => "running",
            ExecutionStatus::Succeeded => "succeeded",
            ExecutionStatus::Failed => "failed",
            ExecutionStatus::Aborted => "aborted",
            ExecutionStatus::TimedOut => "timedout",
            ExecutionStatus::Unknown => "unknown",
        }
    }

    /// True once the execution can no longer change state.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionStatus::Succeeded
                | ExecutionStatus::Failed
                | ExecutionStatus::Aborted
                | ExecutionStatus::TimedOut
        )
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The job an execution belongs to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobRef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl JobRef {
    /// `group/name`, or just the name for root-level jobs.
    pub fn display_name(&self) -> String {
        let name = self.name.as_deref().unwrap_or("Unknown Job");
        match self.group.as_deref() {
            Some(group) if !group.is_empty() => format!("{}/{}", group, name),
            _ => name.to_string(),
        }
    }
}

/// `{"unixtime": 1431536339809, "date": "2015-05-13T16:58:59Z"}`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionDate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unixtime: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
}

impl ExecutionDate {
    /// Parse the ISO-8601 `date`, falling back to `unixtime` (ms) only when
    /// no date string is present. Malformed values yield `None`.
    pub fn parse(&self) -> Option<DateTime<Utc>> {
        match &self.date {
            Some(date) => DateTime::parse_from_rfc3339(date)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            None => self
                .unixtime
                .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        }
    }
}

/// One execution as returned by the executions and execution endpoints.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecutionRecord {
    #[serde(default, deserialize_with = "lenient_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "status", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub raw_status: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub job: Option<JobRef>,
    #[serde(rename = "date-started", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub date_started: Option<ExecutionDate>,
    #[serde(rename = "date-ended", default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub date_ended: Option<ExecutionDate>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Everything else the server sent, kept for full-detail output.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ExecutionRecord {
    pub fn status(&self) -> ExecutionStatus {
        self.raw_status
            .as_deref()
            .map(ExecutionStatus::from_raw)
            .unwrap_or(ExecutionStatus::Unknown)
    }

    pub fn job_name(&self) -> &str {
        self.job
            .as_ref()
            .and_then(|j| j.name.as_deref())
            .unwrap_or("Unknown")
    }

    /// Wall-clock duration in seconds, only when both timestamps parse.
    pub fn duration_secs(&self) -> Option<f64> {
        let start = self.date_started.as_ref()?.parse()?;
        let end = self.date_ended.as_ref()?.parse()?;
        Some((end - start).num_milliseconds() as f64 / 1000.0)
    }

    pub fn started_at(&self) -> Option<&str> {
        self.date_started.as_ref().and_then(|d| d.date.as_deref())
    }
}

// Rundeck sends numeric ids, but some proxies stringify them.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

// A field of the wrong shape reads as absent instead of failing the record.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

/// One page of an executions listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecutionPage {
    #[serde(rename = "executions")]
    pub records: Vec<ExecutionRecord>,
    pub offset: u64,
    #[serde(rename = "max")]
    pub page_size: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
    #[serde(rename = "hasMore")]
    pub has_more: bool,
    /// Raw items the server returned, including any that failed to decode.
    #[serde(skip)]
    pub received: u64,
}

impl ExecutionPage {
    /// Normalize either a bare array or an `{"executions": [...]}` object.
    pub fn decode(response: Value, offset: u64, page_size: u64) -> Self {
        let listing = Listing::decode(response);
        let total = listing.reported_total();
        let items = listing.into_items("executions");
        let received = items.len() as u64;
        let records: Vec<ExecutionRecord> = super::decode_each(items);
        let has_more = page_size > 0 && received == page_size;

        Self {
            records,
            offset,
            page_size,
            total,
            has_more,
            received,
        }
    }
}

/// A job as it appears in a project's job list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub scheduled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_true() -> bool {
    true
}

impl JobSummary {
    /// Tags arrive either as an array or as a comma-separated string.
    pub fn tag_list(&self) -> Vec<String> {
        match &self.tags {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|t| t.as_str().map(str::to_string))
                .collect(),
            Some(Value::String(s)) => s
                .split(',')
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
            _ => Vec::new(),
        }
    }
}

/// The two shapes a Rundeck list endpoint may answer with.
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    /// `[...]`
    Items(Vec<Value>),
    /// `{"<key>": [...], ...}`
    Keyed(Map<String, Value>),
    /// Anything else, including an empty body.
    Empty,
}

impl Listing {
    pub fn decode(response: Value) -> Self {
        match response {
            Value::Array(items) => Listing::Items(items),
            Value::Object(map) => Listing::Keyed(map),
            _ => Listing::Empty,
        }
    }

    /// Extract the records, looking under `key` for the object shape.
    pub fn into_items(self, key: &str) -> Vec<Value> {
        match self {
            Listing::Items(items) => items,
            Listing::Keyed(mut map) => match map.remove(key) {
                Some(Value::Array(items)) => items,
                _ => Vec::new(),
            },
            Listing::Empty => Vec::new(),
        }
    }

    /// `total` or `paging.total`, when the server reports one.
    fn reported_total(&self) -> Option<u64> {
        match self {
            Listing::Keyed(map) => map
                .get("total")
                .and_then(Value::as_u64)
                .or_else(|| map.get("paging")?.get("total")?.as_u64()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> ExecutionRecord {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(ExecutionStatus::from_raw("succeeded"), ExecutionStatus::Succeeded);
        assert_eq!(ExecutionStatus::from_raw("timedout"), ExecutionStatus::TimedOut);
        assert_eq!(ExecutionStatus::from_raw("scheduled"), ExecutionStatus::Unknown);
        assert!(ExecutionStatus::Aborted.is_terminal());
        assert!(!ExecutionStatus::Running.is_terminal());
        assert!(!ExecutionStatus::Unknown.is_terminal());
    }

    #[test]
    fn test_record_duration() {
        let r = record(json!({
            "id": 42,
            "status": "succeeded",
            "date-started": {"unixtime": 0, "date": "2024-03-01T10:00:00Z"},
            "date-ended": {"unixtime": 0, "date": "2024-03-01T10:01:30Z"}
        }));
        assert_eq!(r.id, Some(42));
        assert_eq!(r.status(), ExecutionStatus::Succeeded);
        assert_eq!(r.duration_secs(), Some(90.0));
    }

    #[test]
    fn test_record_malformed_end_has_no_duration() {
        let r = record(json!({
            "id": "7",
            "status": "failed",
            "date-started": {"date": "2024-03-01T10:00:00Z"},
            "date-ended": {"date": "yesterday-ish"}
        }));
        assert_eq!(r.id, Some(7));
        assert_eq!(r.duration_secs(), None);

        let running = record(json!({
            "status": "running",
            "date-started": {"date": "2024-03-01T10:00:00Z"}
        }));
        assert_eq!(running.duration_secs(), None);
    }

    #[test]
    fn test_record_keeps_unknown_fields() {
        let r = record(json!({
            "id": 1,
            "status": "queued",
            "project": "ops",
            "argstring": "-env prod"
        }));
        assert_eq!(r.status(), ExecutionStatus::Unknown);
        let back = serde_json::to_value(&r).unwrap();
        assert_eq!(back["status"], "queued");
        assert_eq!(back["project"], "ops");
        assert_eq!(back["argstring"], "-env prod");
    }

    #[test]
    fn test_misshapen_fields_read_as_absent() {
        let r = record(json!({
            "id": 3,
            "status": "failed",
            "job": "not-an-object",
            "user": {"login": "alice"},
            "date-started": {"date": "2024-03-01T10:00:00Z"},
            "date-ended": "garbage"
        }));
        assert_eq!(r.status(), ExecutionStatus::Failed);
        assert!(r.job.is_none());
        assert!(r.user.is_none());
        assert!(r.date_ended.is_none());
        assert_eq!(r.duration_secs(), None);

        let numeric_date = record(json!({"status": "succeeded", "date-ended": {"date": 12345}}));
        assert!(numeric_date.date_ended.is_none());
    }

    #[test]
    fn test_job_display_name() {
        let job = JobRef {
            name: Some("deploy".into()),
            group: Some("web/prod".into()),
            ..Default::default()
        };
        assert_eq!(job.display_name(), "web/prod/deploy");

        let root = JobRef {
            name: Some("cleanup".into()),
            group: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(root.display_name(), "cleanup");
    }

    #[test]
    fn test_page_from_bare_array() {
        let page = ExecutionPage::decode(json!([{"id": 1}, {"id": 2}]), 0, 2);
        assert_eq!(page.records.len(), 2);
        assert!(page.has_more);
        assert_eq!(page.total, None);
    }

    #[test]
    fn test_page_from_object_with_paging() {
        let page = ExecutionPage::decode(
            json!({
                "paging": {"count": 1, "total": 31, "offset": 30, "max": 10},
                "executions": [{"id": 31, "status": "failed"}]
            }),
            30,
            10,
        );
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.total, Some(31));
        assert_eq!(page.offset, 30);
        assert!(!page.has_more);
    }

    #[test]
    fn test_page_from_empty_body() {
        let page = ExecutionPage::decode(json!({}), 0, 100);
        assert!(page.records.is_empty());
        assert!(!page.has_more);
    }

    #[test]
    fn test_listing_shapes() {
        let keyed = Listing::decode(json!({"jobs": [{"id": "a"}]}));
        assert_eq!(keyed.into_items("jobs").len(), 1);

        let bare = Listing::decode(json!([{"id": "a"}, {"id": "b"}]));
        assert_eq!(bare.into_items("jobs").len(), 2);

        assert!(Listing::decode(json!("nope")).into_items("jobs").is_empty());
    }

    #[test]
    fn test_job_tags_and_defaults() {
        let job: JobSummary = serde_json::from_value(json!({
            "id": "abc",
            "name": "backup",
            "tags": "nightly, db"
        }))
        .unwrap();
        assert!(job.enabled);
        assert!(!job.scheduled);
        assert_eq!(job.tag_list(), vec!["nightly", "db"]);
    }
}
