// =============================================================================
// Tool Result — the envelope every successful tool call returns
// =============================================================================
//
// Each call yields a human-readable summary next to the structured result, an
// id for correlating logs, and the time it was produced.
// =============================================================================

use serde::Serialize;
use tracing::warn;

/// Output of one tool invocation.
#[derive(Debug, Clone, Serialize)]
pub struct ToolResult {
    /// Unique identifier for this call (UUID v4).
    pub id: String,

    /// Name of the tool that produced the result.
    pub tool: String,

    /// Text rendering of `data` for direct display.
    pub summary: String,

    /// Structured result record.
    pub data: serde_json::Value,

    /// RFC 3339 timestamp of when this result was created.
    pub created_at: String,
}

impl ToolResult {
    /// Wrap a serialisable result record.
    ///
    /// A record that fails to serialise is logged and carried as `null`;
    /// the summary is still returned.
    pub fn new<T: Serialize>(tool: impl Into<String>, summary: impl Into<String>, data: &T) -> Self {
        let tool = tool.into();
        let id = uuid::Uuid::new_v4().to_string();
        let data = serde_json::to_value(data).unwrap_or_else(|e| {
            warn!(tool = %tool, id = %id, error = %e, "Result record failed to serialise");
            serde_json::Value::Null
        });

        Self {
            id,
            tool,
            summary: summary.into(),
            data,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
