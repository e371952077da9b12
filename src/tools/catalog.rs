//! The tool catalog: names, descriptions and JSON Schemas for arguments.

use serde_json::{json, Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tool {
    ListServers,
    GetProjects,
    GetJobs,
    GetJobDefinition,
    RunJob,
    GetExecutionStatus,
    GetExecutionOutput,
    GetExecutions,
    GetAllExecutions,
    GetExecutionMetrics,
    GetSystemInfo,
    GetProjectStats,
    CalculateJobRoi,
    GetBulkExecutionStatus,
    RunJobWithMonitoring,
}

/// One advertised tool.
#[derive(Debug, Clone)]
pub struct ToolSchema {
    pub name: &'static str,
    pub description: String,
    pub input_schema: Map<String, Value>,
}

impl Tool {
    pub const ALL: [Tool; 15] = [
        Tool::ListServers,
        Tool::GetProjects,
        Tool::GetJobs,
        Tool::GetJobDefinition,
        Tool::RunJob,
        Tool::GetExecutionStatus,
        Tool::GetExecutionOutput,
        Tool::GetExecutions,
        Tool::GetAllExecutions,
        Tool::GetExecutionMetrics,
        Tool::GetSystemInfo,
        Tool::GetProjectStats,
        Tool::CalculateJobRoi,
        Tool::GetBulkExecutionStatus,
        Tool::RunJobWithMonitoring,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Tool::ListServers => "list_servers",
            Tool::GetProjects => "get_projects",
            Tool::GetJobs => "get_jobs",
            Tool::GetJobDefinition => "get_job_definition",
            Tool::RunJob => "run_job",
            Tool::GetExecutionStatus => "get_execution_status",
            Tool::GetExecutionOutput => "get_execution_output",
            Tool::GetExecutions => "get_executions",
            Tool::GetAllExecutions => "get_all_executions",
            Tool::GetExecutionMetrics => "get_execution_metrics",
            Tool::GetSystemInfo => "get_system_info",
            Tool::GetProjectStats => "get_project_stats",
            Tool::CalculateJobRoi => "calculate_job_roi",
            Tool::GetBulkExecutionStatus => "get_bulk_execution_status",
            Tool::RunJobWithMonitoring => "run_job_with_monitoring",
        }
    }

    pub fn from_name(name: &str) -> Option<Tool> {
        Tool::ALL.iter().copied().find(|t| t.name() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Tool::ListServers => "List all configured Rundeck servers",
            Tool::GetProjects => "Get all Rundeck projects",
            Tool::GetJobs => "Get jobs for a project, grouped by job group",
            Tool::GetJobDefinition => "Get a job definition, including its options and workflow",
            Tool::RunJob => "Execute a Rundeck job with optional options and node filter",
            Tool::GetExecutionStatus => "Get the status of an execution",
            Tool::GetExecutionOutput => "Get the log output of an execution",
            Tool::GetExecutions => "Get one page of a project's executions, with optional filters",
            Tool::GetAllExecutions => "Get all executions for a project across pages, up to a limit",
            Tool::GetExecutionMetrics => "Success rates, durations and job frequency over recent executions",
            Tool::GetSystemInfo => "Get Rundeck server system information",
            Tool::GetProjectStats => "Job inventory and 30-day execution metrics for a project",
            Tool::CalculateJobRoi => "Estimate the return on investment of automating a job",
            Tool::GetBulkExecutionStatus => "Get the status of several executions at once",
            Tool::RunJobWithMonitoring => "Run a job and optionally wait for it to finish",
        }
    }

    fn properties(&self) -> (Map<String, Value>, &'static [&'static str]) {
        let mut props = Map::new();
        let required: &'static [&'static str] = match self {
            Tool::ListServers | Tool::GetProjects | Tool::GetSystemInfo => &[],
            Tool::GetJobs => {
                props.insert("project".into(), string("Project name"));
                props.insert("job_filter".into(), string("Filter jobs by name"));
                &["project"]
            }
            Tool::GetJobDefinition => {
                props.insert("job_id".into(), string("Job ID"));
                &["job_id"]
            }
            Tool::RunJob => {
                run_properties(&mut props);
                &["job_id"]
            }
            Tool::GetExecutionStatus | Tool::GetExecutionOutput => {
                props.insert("execution_id".into(), string("Execution ID"));
                &["execution_id"]
            }
            Tool::GetExecutions => {
                props.insert("project".into(), string("Project name"));
                props.insert(
                    "max_results".into(),
                    integer("Maximum executions to return (1-1000)", 100),
                );
                props.insert("offset".into(), integer("Offset for paging", 0));
                filter_properties(&mut props);
                &["project"]
            }
            Tool::GetAllExecutions => {
                props.insert("project".into(), string("Project name"));
                props.insert(
                    "max_total".into(),
                    integer("Maximum executions to retrieve across pages", 5000),
                );
                filter_properties(&mut props);
                &["project"]
            }
            Tool::GetExecutionMetrics => {
                props.insert("project".into(), string("Project name"));
                props.insert("days".into(), integer("Days of history to analyze", 30));
                &["project"]
            }
            Tool::GetProjectStats => {
                props.insert("project".into(), string("Project name"));
                &["project"]
            }
            Tool::CalculateJobRoi => {
                props.insert("project".into(), string("Project name"));
                props.insert("job_id".into(), string("Job ID"));
                props.insert(
                    "cost_per_hour".into(),
                    json!({"type": "number", "description": "Hourly cost of manual work", "default": 50.0}),
                );
                props.insert("days".into(), integer("Days of history to analyze", 30));
                &["project", "job_id"]
            }
            Tool::GetBulkExecutionStatus => {
                props.insert(
                    "execution_ids".into(),
                    json!({"type": "array", "items": {"type": "string"}, "description": "Execution IDs"}),
                );
                &["execution_ids"]
            }
            Tool::RunJobWithMonitoring => {
                run_properties(&mut props);
                props.insert(
                    "wait_for_completion".into(),
                    json!({"type": "boolean", "description": "Wait for the execution to finish", "default": false}),
                );
                props.insert(
                    "timeout_minutes".into(),
                    integer("Maximum minutes to wait", 30),
                );
                &["job_id"]
            }
        };

        if *self != Tool::ListServers {
            props.insert(
                "server".into(),
                string("Server name (optional, uses the default server when omitted)"),
            );
        }
        (props, required)
    }

    pub fn schema(&self) -> ToolSchema {
        let (properties, required) = self.properties();
        let mut input_schema = Map::new();
        input_schema.insert("type".to_string(), json!("object"));
        input_schema.insert("properties".to_string(), Value::Object(properties));
        input_schema.insert("required".to_string(), json!(required));
        ToolSchema {
            name: self.name(),
            description: self.description().to_string(),
            input_schema,
        }
    }
}

/// Schemas for every tool, in catalog order.
pub fn schemas() -> Vec<ToolSchema> {
    Tool::ALL.iter().map(Tool::schema).collect()
}

fn string(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

fn integer(description: &str, default: u64) -> Value {
    json!({"type": "integer", "description": description, "default": default})
}

fn run_properties(props: &mut Map<String, Value>) {
    props.insert("job_id".into(), string("Job ID"));
    props.insert(
        "options".into(),
        json!({"type": "object", "description": "Job options as key/value pairs"}),
    );
    props.insert(
        "node_filter".into(),
        string("Node filter restricting which nodes the job runs on"),
    );
}

fn filter_properties(props: &mut Map<String, Value>) {
    props.insert(
        "status".into(),
        json!({
            "type": "string",
            "description": "Filter by execution status",
            "enum": ["succeeded", "failed", "aborted", "running", "timedout"]
        }),
    );
    props.insert("user".into(), string("Filter by the user who started the execution"));
    props.insert("job_id".into(), string("Filter by job ID"));
    props.insert(
        "recent_filter".into(),
        string("Relative time window, e.g. 1h, 1d, 1w"),
    );
    props.insert(
        "summary_only".into(),
        json!({"type": "boolean", "description": "Render a readable summary instead of full JSON", "default": true}),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_names_round_trip() {
        for tool in Tool::ALL {
            assert_eq!(Tool::from_name(tool.name()), Some(tool));
        }
        assert_eq!(Tool::from_name("drop_tables"), None);
    }

    #[test]
    fn test_server_param_everywhere_but_list_servers() {
        for schema in schemas() {
            let has_server = schema.input_schema["properties"].get("server").is_some();
            assert_eq!(has_server, schema.name != "list_servers", "{}", schema.name);
        }
    }

    #[test]
    fn test_required_fields() {
        let roi = Tool::CalculateJobRoi.schema();
        assert_eq!(roi.input_schema["required"], json!(["project", "job_id"]));

        let projects = Tool::GetProjects.schema();
        assert_eq!(projects.input_schema["required"], json!([]));
        assert_eq!(projects.input_schema["type"], "object");
    }

    #[test]
    fn test_defaults_advertised() {
        let all = Tool::GetAllExecutions.schema();
        assert_eq!(all.input_schema["properties"]["max_total"]["default"], 5000);
        assert_eq!(all.input_schema["properties"]["summary_only"]["default"], true);

        let monitor = Tool::RunJobWithMonitoring.schema();
        assert_eq!(monitor.input_schema["properties"]["timeout_minutes"]["default"], 30);
    }
}
