//! Session data model

use serde::{Deserialize, Serialize};

use super::{Attributes, Framework, Language, TraceContext, UniversalTraceData};

/// Lifecycle state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    /// Session is still receiving traces
    #[default]
    Active,
    /// Session finished normally
    Completed,
    /// Session finished with a failure
    Failed,
    /// Session was cancelled
    Cancelled,
}

impl SessionStatus {
    /// Every session status, in registry order
    pub const ALL: &'static [Self] = &[Self::Active, Self::Completed, Self::Failed, Self::Cancelled];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl_wire_name!(SessionStatus, "status");

/// A group of traces sharing one lifecycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalSession {
    /// Unique identifier
    pub id: String,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// ISO-8601 start timestamp
    pub start_time: String,

    /// ISO-8601 end timestamp
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    /// Lifecycle state
    pub status: SessionStatus,

    /// Producing language
    pub language: Language,

    /// Producing framework
    pub framework: Framework,

    /// Traces in recording order
    #[serde(default)]
    pub traces: Vec<UniversalTraceData>,

    /// Correlation metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<TraceContext>,

    /// Session-level metadata, copied into each trace's `session_metadata`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Attributes>,

    /// Number of traces (derived, not checked)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_count: Option<usize>,

    /// Sum of trace durations (derived, not checked)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<i64>,
}

impl UniversalSession {
    /// Returns a copy with `trace_count` and `total_duration_ms` derived from `traces`
    #[must_use]
    pub fn with_aggregates(&self) -> Self {
        let total_duration_ms = self.traces.iter().filter_map(|t| t.duration_ms).sum();

        Self {
            trace_count: Some(self.traces.len()),
            total_duration_ms: Some(total_duration_ms),
            ..self.clone()
        }
    }
}
