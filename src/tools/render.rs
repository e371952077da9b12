//! Human-readable text for tool results.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use serde_json::{json, Value};

use crate::client::{ExecutionPage, ExecutionRecord, JobSummary};
use crate::registry::ServerRegistry;

const JOB_DESCRIPTION_CHARS: usize = 80;
const EXECUTION_DESCRIPTION_CHARS: usize = 60;
/// Records listed individually in the all-executions summary.
const HISTORY_DETAIL_ROWS: usize = 20;

pub fn status_icon(status: &str) -> &'static str {
    match status {
        "succeeded" => "✅",
        "failed" => "❌",
        "running" => "🔄",
        "aborted" => "⏹️",
        "timedout" => "⏰",
        _ => "❓",
    }
}

/// Cut to `max` characters, marking the cut with `...`.
pub fn truncate(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

pub fn servers(registry: &ServerRegistry) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "🖥️  Configured Rundeck Servers:");
    let _ = writeln!(out, "{}", "=".repeat(40));
    for (i, entry) in registry.entries().iter().enumerate() {
        let _ = writeln!(out, "{}. {}", i + 1, entry.name);
        let _ = writeln!(out, "   URL: {}", entry.url);
        let _ = writeln!(out, "   API Version: {}", entry.api_version);
        let _ = writeln!(out);
    }
    out.trim_end().to_string()
}

/// Jobs grouped by group, root-level jobs first.
pub fn job_list(project: &str, filter: Option<&str>, jobs: &[JobSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📋 Jobs in Project: {}", project);
    if let Some(filter) = filter {
        let _ = writeln!(out, "🔍 Filter: {}", filter);
    }
    let _ = writeln!(out, "📊 Total Jobs Found: {}", jobs.len());
    let _ = writeln!(out);

    if jobs.is_empty() {
        out.push_str("No jobs found in this project.\n\n");
        out.push_str("💡 Possible reasons:\n");
        out.push_str("  • Project has no jobs defined\n");
        out.push_str("  • Job filter is too restrictive\n");
        out.push_str("  • API token lacks 'read' permission for jobs\n");
        out.push_str("  • Project name is incorrect");
        return out;
    }

    let mut groups: BTreeMap<&str, Vec<&JobSummary>> = BTreeMap::new();
    for job in jobs {
        groups
            .entry(job.group.as_deref().unwrap_or(""))
            .or_default()
            .push(job);
    }

    for (group, members) in groups {
        if group.is_empty() {
            let _ = writeln!(out, "📁 Root Level Jobs");
        } else {
            let _ = writeln!(out, "📁 Group: {}", group);
        }
        let _ = writeln!(out, "{}", "-".repeat(60));

        for job in members {
            let enabled = if job.enabled { "✅" } else { "❌" };
            let scheduled = if job.scheduled { "⏰" } else { "🔧" };
            let _ = writeln!(
                out,
                "  {} {} {}",
                enabled,
                scheduled,
                job.name.as_deref().unwrap_or("Unknown")
            );
            let _ = writeln!(out, "    ID: {}", job.id.as_deref().unwrap_or("Unknown"));
            if let Some(desc) = job.description.as_deref().filter(|d| !d.is_empty()) {
                let _ = writeln!(
                    out,
                    "    Description: {}",
                    truncate(desc, JOB_DESCRIPTION_CHARS)
                );
            }
            let tags = job.tag_list();
            if !tags.is_empty() {
                let _ = writeln!(out, "    Tags: {}", tags.join(", "));
            }
            let _ = writeln!(out);
        }
        let _ = writeln!(out);
    }

    out.trim_end().to_string()
}

pub fn jobs_error(project: &str, error: &dyn std::fmt::Display) -> String {
    format!(
        "❌ Error retrieving jobs for project '{}': {}\n\n\
         💡 Troubleshooting steps:\n\
         \u{20} • Verify project name is correct\n\
         \u{20} • Check API token has 'read' permission for jobs\n\
         \u{20} • Ensure Rundeck server is accessible\n\
         \u{20} • Try get_projects tool to verify connection",
        project, error
    )
}

fn execution_line(out: &mut String, index: usize, record: &ExecutionRecord, with_description: bool) {
    let status = record.raw_status.as_deref().unwrap_or("");
    let job = record
        .job
        .as_ref()
        .map(|j| j.display_name())
        .unwrap_or_else(|| "Unknown Job".to_string());
    let id = record
        .id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "Unknown".to_string());

    let _ = writeln!(out, "{:3}. {} {}", index, status_icon(status), job);
    let _ = writeln!(
        out,
        "     ID: {} | User: {} | Started: {}",
        id,
        record.user.as_deref().unwrap_or("Unknown"),
        record.started_at().unwrap_or("Unknown")
    );
    if with_description {
        if let Some(desc) = record.description.as_deref().filter(|d| !d.is_empty()) {
            let _ = writeln!(
                out,
                "     Description: {}",
                truncate(desc, EXECUTION_DESCRIPTION_CHARS)
            );
        }
    }
    let _ = writeln!(out);
}

pub fn execution_page(project: &str, page: &ExecutionPage) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📊 Execution Results for Project: {}", project);
    let _ = writeln!(
        out,
        "📄 Page Info: {} executions returned (offset: {}, max per page: {})",
        page.records.len(),
        page.offset,
        page.page_size
    );
    if page.has_more {
        let _ = writeln!(
            out,
            "➡️  More results available - use offset parameter to get next page"
        );
    }
    let _ = writeln!(out);

    if page.records.is_empty() {
        out.push_str("No executions found matching the criteria.");
        return out;
    }

    let _ = writeln!(out, "🔍 Execution Summary:");
    let _ = writeln!(out, "{}", "-".repeat(80));
    for (i, record) in page.records.iter().enumerate() {
        execution_line(&mut out, i + 1, record, true);
    }
    out.trim_end().to_string()
}

/// Status summary followed by the first twenty records.
pub fn execution_history(project: &str, records: &[ExecutionRecord], max_total: u64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📊 All Executions for Project: {}", project);
    let _ = writeln!(
        out,
        "📈 Total Retrieved: {} executions (max requested: {})",
        records.len(),
        max_total
    );
    let _ = writeln!(out);

    if records.is_empty() {
        out.push_str("No executions found matching the criteria.");
        return out;
    }

    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for record in records {
        *counts
            .entry(record.raw_status.as_deref().unwrap_or("unknown"))
            .or_default() += 1;
    }
    let _ = writeln!(out, "📊 Status Summary:");
    for (status, count) in &counts {
        let _ = writeln!(out, "  {} {}: {}", status_icon(status), status, count);
    }
    let _ = writeln!(out);

    let shown = records.len().min(HISTORY_DETAIL_ROWS);
    let _ = writeln!(out, "🔍 Recent {} Executions:", shown);
    let _ = writeln!(out, "{}", "-".repeat(80));
    for (i, record) in records.iter().take(shown).enumerate() {
        execution_line(&mut out, i + 1, record, false);
    }
    if records.len() > shown {
        let _ = writeln!(out, "... and {} more executions", records.len() - shown);
    }
    out.trim_end().to_string()
}

fn field(source: &Value, key: &str) -> Value {
    source.get(key).cloned().unwrap_or(Value::Null)
}

fn field_or(source: &Value, key: &str, fallback: Value) -> Value {
    source.get(key).cloned().unwrap_or(fallback)
}

/// The parts of a job definition worth showing.
pub fn job_definition(definition: &Value) -> Value {
    json!({
        "id": field(definition, "id"),
        "name": field(definition, "name"),
        "group": field(definition, "group"),
        "description": field(definition, "description"),
        "project": field(definition, "project"),
        "enabled": field(definition, "enabled"),
        "tags": field_or(definition, "tags", json!([])),
        "options": field_or(definition, "options", json!([])),
        "sequence": field_or(definition, "sequence", json!({})),
        "nodeFilterEditable": field(definition, "nodeFilterEditable"),
        "scheduleEnabled": field(definition, "scheduleEnabled"),
        "schedule": field(definition, "schedule"),
        "notification": field(definition, "notification"),
    })
}

/// The parts of an execution status worth showing.
pub fn execution_status(status: &Value) -> Value {
    let job = status.get("job").cloned().unwrap_or_else(|| json!({}));
    json!({
        "id": field(status, "id"),
        "status": field(status, "status"),
        "project": field(status, "project"),
        "user": field(status, "user"),
        "date-started": field(status, "date-started"),
        "date-ended": field(status, "date-ended"),
        "job": {
            "id": field(&job, "id"),
            "name": field(&job, "name"),
            "group": field(&job, "group"),
        },
        "description": field(status, "description"),
        "argstring": field(status, "argstring"),
        "successfulNodes": field_or(status, "successfulNodes", json!([])),
        "failedNodes": field_or(status, "failedNodes", json!([])),
    })
}
