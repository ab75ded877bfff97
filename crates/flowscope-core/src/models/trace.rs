//! Universal trace data model

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{timestamp, Attributes, ProtocolVersion};

/// Language of the producing SDK
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// JavaScript or TypeScript
    #[default]
    JavaScript,
    /// Python
    Python,
    /// Go
    Go,
    /// Java
    Java,
    /// C#
    CSharp,
    /// Rust
    Rust,
}

impl Language {
    /// Every supported language, in registry order
    pub const ALL: &'static [Self] = &[
        Self::JavaScript,
        Self::Python,
        Self::Go,
        Self::Java,
        Self::CSharp,
        Self::Rust,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::JavaScript => "javascript",
            Self::Python => "python",
            Self::Go => "go",
            Self::Java => "java",
            Self::CSharp => "csharp",
            Self::Rust => "rust",
        }
    }
}

impl_wire_name!(Language, "language");

/// Orchestration framework that produced the trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Framework {
    /// LangChain (Python or JS)
    LangChain,
    /// LlamaIndex
    LlamaIndex,
    /// Hand-instrumented code
    #[default]
    Custom,
    /// Microsoft AutoGen
    AutoGen,
    /// CrewAI
    CrewAI,
    /// Flowise
    Flowise,
}

impl Framework {
    /// Every supported framework, in registry order
    pub const ALL: &'static [Self] = &[
        Self::LangChain,
        Self::LlamaIndex,
        Self::Custom,
        Self::AutoGen,
        Self::CrewAI,
        Self::Flowise,
    ];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LangChain => "langchain",
            Self::LlamaIndex => "llamaindex",
            Self::Custom => "custom",
            Self::AutoGen => "autogen",
            Self::CrewAI => "crewai",
            Self::Flowise => "flowise",
        }
    }
}

impl_wire_name!(Framework, "framework");

/// Outcome of a traced operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TraceStatus {
    /// Operation completed successfully
    Success,
    /// Operation failed
    Error,
    /// Operation still in progress
    #[default]
    Pending,
    /// Operation was cancelled
    Cancelled,
}

impl TraceStatus {
    /// Every trace status, in registry order
    pub const ALL: &'static [Self] = &[Self::Success, Self::Error, Self::Pending, Self::Cancelled];

    /// Wire representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Pending => "pending",
            Self::Cancelled => "cancelled",
        }
    }
}

impl_wire_name!(TraceStatus, "status");

/// Runtime details reported by language SDKs
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LanguageMetadata {
    // JavaScript / TypeScript
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub npm_version: Option<String>,

    // Python
    #[serde(skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pip_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub virtual_env: Option<String>,

    // Go
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub go_mod: Option<String>,

    // Java
    #[serde(skip_serializing_if = "Option::is_none")]
    pub java_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maven_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gradle_version: Option<String>,

    // Common
    #[serde(skip_serializing_if = "Option::is_none")]
    pub runtime_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_manager: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependencies: Option<BTreeMap<String, String>>,

    /// Keys not covered above
    #[serde(flatten)]
    pub extra: Attributes,
}

/// Resource and usage counters
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory_usage_mb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_usage_percent: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_calls: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_hits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache_misses: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_calls: Option<u64>,
}

/// Correlation, tenancy and tagging metadata
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TraceContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<String>,
    /// Deployment environment (development, staging, production, test)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_attributes: Option<Attributes>,
}

/// One traced operation in the universal format
///
/// Values are immutable once built: producers and the legacy adapter
/// construct them, and any update yields a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversalTraceData {
    // Identity
    /// Unique identifier
    pub id: String,

    /// Owning session
    pub session_id: String,

    /// Same-session ancestor, for nesting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,

    // Classification
    /// Free-text operation name
    pub operation: String,

    /// Producing framework
    pub framework: Framework,

    /// Producing language
    pub language: Language,

    // Timing
    /// ISO-8601 start timestamp
    pub start_time: String,

    /// ISO-8601 end timestamp (if completed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,

    /// Duration in milliseconds, independent of the timestamps
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,

    // Payload
    /// Operation input
    #[serde(default)]
    pub input: Value,

    /// Operation output
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,

    /// Additional metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Attributes>,

    /// Metadata inherited from the owning session
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_metadata: Option<Attributes>,

    // Outcome
    /// Overall status
    pub status: TraceStatus,

    /// Error message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Error class or kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,

    /// Raw stack trace text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,

    /// Schema revision
    pub protocol_version: ProtocolVersion,

    // Extensions
    /// Runtime details
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language_metadata: Option<LanguageMetadata>,

    /// Resource counters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub performance: Option<PerformanceMetrics>,

    /// Correlation metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<TraceContext>,
}

impl UniversalTraceData {
    /// Create a pending trace stamped with the current time and protocol version
    pub fn new(
        id: impl Into<String>,
        session_id: impl Into<String>,
        operation: impl Into<String>,
        framework: Framework,
        language: Language,
        input: Value,
    ) -> Self {
        Self {
            id: id.into(),
            session_id: session_id.into(),
            parent_id: None,
            operation: operation.into(),
            framework,
            language,
            start_time: timestamp::now(),
            end_time: None,
            duration_ms: None,
            input,
            output: None,
            metadata: None,
            session_metadata: None,
            status: TraceStatus::Pending,
            error: None,
            error_type: None,
            stack_trace: None,
            protocol_version: ProtocolVersion::CURRENT,
            language_metadata: None,
            performance: None,
            context: None,
        }
    }

    /// Milliseconds between `start_time` and `end_time`, when both parse
    pub fn elapsed_ms(&self) -> Option<i64> {
        let start = timestamp::parse(&self.start_time)?;
        let end = timestamp::parse(self.end_time.as_deref()?)?;
        Some((end - start).num_milliseconds())
    }
}
