//! Batch transport envelope

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{timestamp, Attributes, Framework, Language, UniversalTraceData};

/// Bulk ingestion envelope.
///
/// `language` and `framework` are declared tags; traces inside the batch
/// are not required to match them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceBatch {
    /// Unique batch identifier
    pub batch_id: String,

    /// Traces carried by this batch
    pub traces: Vec<UniversalTraceData>,

    /// Declared producing language
    pub language: Language,

    /// Declared producing framework
    pub framework: Framework,

    /// ISO-8601 creation timestamp
    pub timestamp: String,

    /// Additional metadata
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Attributes>,
}

impl TraceBatch {
    /// Wrap traces in a new batch with a fresh id and the current timestamp
    pub fn new(traces: Vec<UniversalTraceData>, language: Language, framework: Framework) -> Self {
        Self {
            batch_id: Uuid::new_v4().to_string(),
            traces,
            language,
            framework,
            timestamp: timestamp::now(),
            metadata: None,
        }
    }

    /// Number of traces in the batch
    pub fn len(&self) -> usize {
        self.traces.len()
    }

    /// Check if the batch carries no traces
    pub fn is_empty(&self) -> bool {
        self.traces.is_empty()
    }
}
