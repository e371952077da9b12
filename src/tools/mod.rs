//! Tool dispatch: decode a flat argument map, run the matching operation
//! against the chosen server, and render the result as text.
//!
//! Every failure is turned into an error result here; nothing a caller
//! sends can take the process down.

pub mod args;
pub mod catalog;
pub mod prompts;
pub mod render;

pub use self::catalog::{schemas, Tool, ToolSchema};
pub use self::prompts::ToolPrompts;

use std::sync::Arc;
use std::time::Instant;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use self::args::*;
use crate::analysis::{compute_metrics, compute_roi, project_stats, RoiParams};
use crate::client::{RundeckApi, RundeckError};
use crate::config::{MonitorSettings, RoiSettings};
use crate::executions::{bulk_status, list_all};
use crate::monitor::{run_and_monitor, MonitorConfig, RunRequest};
use crate::registry::ServerRegistry;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("invalid arguments: {0}")]
    Arguments(#[source] serde_json::Error),

    #[error(transparent)]
    Rundeck(#[from] RundeckError),

    #[error("failed to encode result: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Text handed back to the caller of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub is_error: bool,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Executes tools against a shared, read-only server registry.
#[derive(Clone)]
pub struct Toolbox {
    registry: Arc<ServerRegistry>,
    monitor: MonitorConfig,
    roi: RoiSettings,
    prompts: ToolPrompts,
}

impl Toolbox {
    pub fn new(registry: Arc<ServerRegistry>) -> Self {
        Self {
            registry,
            monitor: MonitorConfig::default(),
            roi: RoiSettings::default(),
            prompts: ToolPrompts::default(),
        }
    }

    pub fn with_monitor(mut self, settings: &MonitorSettings) -> Self {
        self.monitor = MonitorConfig::from(settings);
        self
    }

    pub fn with_monitor_config(mut self, config: MonitorConfig) -> Self {
        self.monitor = config;
        self
    }

    pub fn with_roi(mut self, settings: RoiSettings) -> Self {
        self.roi = settings;
        self
    }

    pub fn with_prompts(mut self, prompts: ToolPrompts) -> Self {
        self.prompts = prompts;
        self
    }

    pub fn registry(&self) -> &ServerRegistry {
        &self.registry
    }

    /// Advertised schemas, with any description overrides applied.
    pub fn schemas(&self) -> Vec<ToolSchema> {
        Tool::ALL
            .iter()
            .map(|tool| ToolSchema {
                description: self.prompts.describe(*tool),
                ..tool.schema()
            })
            .collect()
    }

    /// Run one tool call. `arguments` may be `null` for tools without parameters.
    pub async fn call(&self, name: &str, arguments: Value) -> ToolOutput {
        let call_id = Uuid::new_v4();
        let Some(tool) = Tool::from_name(name) else {
            warn!(%call_id, tool = %name, "Unknown tool requested");
            return ToolOutput::error(format!("Unknown tool: {}", name));
        };

        info!(%call_id, tool = %name, "Tool call");
        let started = Instant::now();
        let result = self.dispatch(tool, arguments).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match result {
            Ok(output) => {
                info!(%call_id, tool = %name, elapsed_ms, is_error = output.is_error, "Tool call finished");
                output
            }
            Err(e) => {
                error!(%call_id, tool = %name, elapsed_ms, "Error executing tool: {}", e);
                ToolOutput::error(format!("Error: {}", e))
            }
        }
    }

    fn client(&self, server: Option<&str>) -> Result<Arc<dyn RundeckApi>, ToolError> {
        Ok(self.registry.client(server)?)
    }

    async fn dispatch(&self, tool: Tool, arguments: Value) -> Result<ToolOutput, ToolError> {
        match tool {
            Tool::ListServers => {
                if self.registry.is_empty() {
                    return Err(RundeckError::NotConfigured.into());
                }
                Ok(ToolOutput::text(render::servers(&self.registry)))
            }
            Tool::GetProjects => {
                let args: ServerArgs = decode(arguments)?;
                let projects = self.client(args.server.as_deref())?.list_projects().await?;
                json_output(&projects)
            }
            Tool::GetJobs => {
                let args: JobsArgs = decode(arguments)?;
                let client = self.client(args.server.as_deref())?;
                match client.list_jobs(&args.project, args.job_filter.as_deref()).await {
                    Ok(jobs) => Ok(ToolOutput::text(render::job_list(
                        &args.project,
                        args.job_filter.as_deref(),
                        &jobs,
                    ))),
                    Err(e) => {
                        error!(project = %args.project, "Error retrieving jobs: {}", e);
                        Ok(ToolOutput::error(render::jobs_error(&args.project, &e)))
                    }
                }
            }
            Tool::GetJobDefinition => {
                let args: JobArgs = decode(arguments)?;
                let definition = self
                    .client(args.server.as_deref())?
                    .job_definition(&args.job_id)
                    .await?;
                json_output(&render::job_definition(&definition))
            }
            Tool::RunJob => {
                let args: RunJobArgs = decode(arguments)?;
                let run = self
                    .client(args.server.as_deref())?
                    .run_job(&args.job_id, &args.options, args.node_filter.as_deref())
                    .await?;
                json_output(&run)
            }
            Tool::GetExecutionStatus => {
                let args: ExecutionArgs = decode(arguments)?;
                let status = self
                    .client(args.server.as_deref())?
                    .execution_status(&args.execution_id)
                    .await?;
                json_output(&render::execution_status(&status))
            }
            Tool::GetExecutionOutput => {
                let args: ExecutionArgs = decode(arguments)?;
                let output = self
                    .client(args.server.as_deref())?
                    .execution_output(&args.execution_id)
                    .await?;
                json_output(&output)
            }
            Tool::GetExecutions => {
                let args: ExecutionsArgs = decode(arguments)?;
                let mut page = self
                    .client(args.server.as_deref())?
                    .list_executions(
                        &args.project,
                        &args.filters.to_query(),
                        args.offset,
                        args.max_results,
                    )
                    .await?;
                if page.total.is_none() {
                    page.total = Some(page.records.len() as u64);
                }

                if args.summary_only {
                    Ok(ToolOutput::text(render::execution_page(&args.project, &page)))
                } else {
                    json_output(&page)
                }
            }
            Tool::GetAllExecutions => {
                let args: AllExecutionsArgs = decode(arguments)?;
                let client = self.client(args.server.as_deref())?;
                let records = list_all(
                    client.as_ref(),
                    &args.project,
                    &args.filters.to_query(),
                    args.max_total,
                )
                .await?;

                if args.summary_only {
                    Ok(ToolOutput::text(render::execution_history(
                        &args.project,
                        &records,
                        args.max_total,
                    )))
                } else {
                    json_output(&records)
                }
            }
            Tool::GetExecutionMetrics => {
                let args: MetricsArgs = decode(arguments)?;
                let client = self.client(args.server.as_deref())?;
                let report = compute_metrics(client.as_ref(), &args.project, args.days).await?;
                json_output(&report)
            }
            Tool::GetSystemInfo => {
                let args: ServerArgs = decode(arguments)?;
                let info = self.client(args.server.as_deref())?.system_info().await;
                json_output(&info)
            }
            Tool::GetProjectStats => {
                let args: ProjectArgs = decode(arguments)?;
                let client = self.client(args.server.as_deref())?;
                let stats = project_stats(client.as_ref(), &args.project).await?;
                json_output(&stats)
            }
            Tool::CalculateJobRoi => {
                let args: RoiArgs = decode(arguments)?;
                let client = self.client(args.server.as_deref())?;
                let params = RoiParams {
                    cost_per_hour: args.cost_per_hour,
                    days: args.days,
                    manual_hours_per_success: self.roi.manual_hours_per_success,
                };
                let outcome = compute_roi(client.as_ref(), &args.project, &args.job_id, &params).await?;
                json_output(&outcome)
            }
            Tool::GetBulkExecutionStatus => {
                let args: BulkStatusArgs = decode(arguments)?;
                let client = self.client(args.server.as_deref())?;
                let statuses = bulk_status(client.as_ref(), &args.execution_ids).await;
                json_output(&statuses)
            }
            Tool::RunJobWithMonitoring => {
                let args: MonitorArgs = decode(arguments)?;
                let client = self.client(args.server.as_deref())?;
                let request = RunRequest {
                    job_id: args.job_id,
                    options: args.options,
                    node_filter: args.node_filter,
                    wait: args.wait_for_completion,
                    timeout_minutes: args.timeout_minutes,
                };
                let run = run_and_monitor(client.as_ref(), &request, &self.monitor).await?;
                json_output(&run)
            }
        }
    }
}

/// Decode a tool's argument map; a missing map counts as empty.
fn decode<T: DeserializeOwned>(arguments: Value) -> Result<T, ToolError> {
    let arguments = match arguments {
        Value::Null => Value::Object(Map::new()),
        other => other,
    };
    serde_json::from_value(arguments).map_err(ToolError::Arguments)
}

fn json_output<T: Serialize + ?Sized>(value: &T) -> Result<ToolOutput, ToolError> {
    serde_json::to_string_pretty(value)
        .map(ToolOutput::text)
        .map_err(ToolError::Encode)
}
