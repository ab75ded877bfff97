//! Universal trace protocol
//!
//! Raw payloads from SDKs, browser extensions and editor bridges flow
//! through three stateless stages:
//!
//! - [`LanguageDetector`] infers the producing language with a confidence score
//! - [`LegacyTraceAdapter`] normalizes the pre-protocol flat format
//! - [`TraceValidator`] decides whether canonical objects are accepted
//!
//! None of them hold mutable state; construct them where needed or share
//! them across threads.

mod adapter;
mod detector;
pub mod raw;
mod validator;

pub use adapter::{
    infer_event_type, map_status, to_legacy_status, LegacyTraceAdapter, TraceDataAdapter,
    LEGACY_FAILURE_MESSAGE, LEGACY_FORMAT_VERSION, UNKNOWN_OPERATION,
};
pub use detector::{
    detect_language, ConfidenceUpdate, LanguageDetection, LanguageDetector, Signal,
    EXPLICIT_CONFIDENCE,
};
pub use validator::{TraceValidator, ValidationResult};
