//! Pre-protocol flat trace format

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::Attributes;

/// Event type of a legacy trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyEventType {
    /// Chain began
    ChainStart,
    /// Chain finished
    ChainEnd,
    /// Prompt sent to a model
    Prompt,
    /// Model response
    Response,
    /// Function invocation
    FunctionCall,
    /// Tool invocation
    ToolUse,
    /// Agent reasoning step
    AgentStep,
    /// Error event
    Error,
    /// Warning event
    Warning,
}

impl LegacyEventType {
    /// Every legacy event type
    pub const ALL: &'static [Self] = &[
        Self::ChainStart,
        Self::ChainEnd,
        Self::Prompt,
        Self::Response,
        Self::FunctionCall,
        Self::ToolUse,
        Self::AgentStep,
        Self::Error,
        Self::Warning,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ChainStart => "chain_start",
            Self::ChainEnd => "chain_end",
            Self::Prompt => "prompt",
            Self::Response => "response",
            Self::FunctionCall => "function_call",
            Self::ToolUse => "tool_use",
            Self::AgentStep => "agent_step",
            Self::Error => "error",
            Self::Warning => "warning",
        }
    }
}

impl_wire_name!(LegacyEventType, "type");

/// Status of a legacy trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LegacyStatus {
    /// Still running
    #[default]
    Pending,
    /// Finished successfully
    Completed,
    /// Finished with an error
    Failed,
    /// Cancelled
    Cancelled,
}

impl LegacyStatus {
    /// Every legacy status
    pub const ALL: &'static [Self] = &[Self::Pending, Self::Completed, Self::Failed, Self::Cancelled];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl_wire_name!(LegacyStatus, "status");

/// A trace in the legacy flat schema used by early SDKs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTrace {
    /// Unique identifier
    pub id: String,

    /// Epoch milliseconds
    pub timestamp: i64,

    /// Owning session
    pub session_id: String,

    /// Owning chain
    pub chain_id: String,

    /// Event type
    #[serde(rename = "type")]
    pub event_type: LegacyEventType,

    /// Event payload
    #[serde(default)]
    pub data: Value,

    /// Additional metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Attributes>,

    /// Parent trace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    /// Duration in milliseconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,

    /// Status
    pub status: LegacyStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_shape_is_camel_case() {
        let trace = LegacyTrace {
            id: "t1".to_string(),
            timestamp: 1_700_000_000_000,
            session_id: "s1".to_string(),
            chain_id: "s1".to_string(),
            event_type: LegacyEventType::FunctionCall,
            data: json!({"q": "hi"}),
            metadata: None,
            parent_id: Some("t0".to_string()),
            duration: None,
            status: LegacyStatus::Completed,
        };

        let value = serde_json::to_value(&trace).unwrap();
        assert_eq!(value["sessionId"], "s1");
        assert_eq!(value["chainId"], "s1");
        assert_eq!(value["parentId"], "t0");
        assert_eq!(value["type"], "function_call");
        assert_eq!(value["status"], "completed");
        assert!(value.get("duration").is_none());
    }
}
