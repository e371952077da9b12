//! Tool catalog and output types mapped onto rmcp's model.

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, JsonObject, Tool as McpTool};
use serde_json::Value;

use crate::tools::{ToolOutput, ToolSchema};

pub fn schema_to_mcp_tool(schema: ToolSchema) -> McpTool {
    McpTool::new(schema.name, schema.description, Arc::new(schema.input_schema))
}

pub fn arguments_to_value(arguments: Option<JsonObject>) -> Value {
    Value::Object(arguments.unwrap_or_default())
}

/// Tool failures are reported in-band so the model can read the message.
pub fn output_to_call_result(output: ToolOutput) -> CallToolResult {
    let content = vec![Content::text(output.text)];
    if output.is_error {
        CallToolResult::error(content)
    } else {
        CallToolResult::success(content)
    }
}
