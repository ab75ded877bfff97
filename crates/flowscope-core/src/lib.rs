//! # FlowScope
//!
//! Universal trace protocol for LLM-application observability.
//!
//! Traces arrive from SDKs and bridges written in many languages. This crate
//! defines the canonical trace, session and batch model, and the stateless
//! stages that sit in front of storage:
//!
//! - **Detection**: infer the producing language of a raw payload
//! - **Adaptation**: convert the legacy flat trace format both ways
//! - **Validation**: accept or reject canonical objects with explicit findings
//! - **Ingestion**: validate, enrich and hand traces to a sink
//!
//! ## Quick Start
//!
//! ```no_run
//! use flowscope::prelude::*;
//! use serde_json::json;
//!
//! let validator = TraceValidator::default();
//! let result = validator.validate(&json!({"id": "t1"}));
//! assert!(!result.valid);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod protocol;

pub use config::Config;
pub use error::{Error, Result};

/// Re-exports for convenience
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::error::{Error, Result};
    pub use crate::ingest::{MemorySink, Processor, TraceSink};
    pub use crate::models::*;
    pub use crate::protocol::{
        detect_language, LanguageDetection, LanguageDetector, LegacyTraceAdapter,
        TraceDataAdapter, TraceValidator, ValidationResult,
    };
}
