//! Acceptance pipeline for incoming traces
//!
//! The processor validates payloads, decodes them into the typed model,
//! enriches them with computed fields and hands them to a [`TraceSink`].

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::Result;
use crate::models::{Attributes, UniversalSession, UniversalTraceData};
use crate::protocol::raw::RawRecord;
use crate::protocol::{
    LanguageDetection, LanguageDetector, LegacyTraceAdapter, TraceDataAdapter, TraceValidator,
    ValidationResult,
};

use super::enrich::enrich_trace;
use super::sink::TraceSink;

/// Message attached to every trace of a batch that failed batch validation
pub const BATCH_REJECTED_MESSAGE: &str = "Batch validation failed";

/// Outcome of processing one trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceOutcome {
    /// Whether the trace was accepted and handed to the sink
    pub success: bool,
    /// Validation findings
    pub validation: ValidationResult,
    /// The enriched trace, when accepted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace: Option<UniversalTraceData>,
    /// Why the trace was not accepted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TraceOutcome {
    fn rejected(validation: ValidationResult, error: String) -> Self {
        Self {
            success: false,
            validation,
            trace: None,
            error: Some(error),
        }
    }
}

/// Per-trace line of a batch outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceResult {
    /// Trace id, or `unknown`
    pub trace_id: String,
    /// Whether the trace was accepted
    pub success: bool,
    /// Why the trace was not accepted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of processing a batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// True when at least one trace was accepted
    pub success: bool,
    /// Batch-level validation findings
    pub validation: ValidationResult,
    /// Accepted traces
    pub processed_count: usize,
    /// Rejected traces
    pub failed_count: usize,
    /// One line per trace, in batch order
    pub results: Vec<TraceResult>,
}

/// Outcome of one trace processed as part of a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionTraceOutcome {
    /// Trace id
    pub trace_id: String,
    /// Processing outcome
    #[serde(flatten)]
    pub outcome: TraceOutcome,
}

/// Outcome of processing a session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionOutcome {
    /// Session-level validation findings (advisory)
    pub validation: ValidationResult,
    /// One entry per trace, in session order
    pub results: Vec<SessionTraceOutcome>,
}

/// Trace ingestion processor
pub struct Processor<S> {
    config: Config,
    detector: LanguageDetector,
    adapter: LegacyTraceAdapter,
    validator: TraceValidator,
    sink: S,
}

impl<S: TraceSink> Processor<S> {
    /// Create a processor delivering accepted traces to `sink`
    pub fn new(config: Config, sink: S) -> Self {
        let detector = LanguageDetector::new(&config.detection);

        Self {
            adapter: LegacyTraceAdapter::new(detector.clone()),
            validator: TraceValidator::new(config.validation.clone()),
            detector,
            config,
            sink,
        }
    }

    /// The sink receiving accepted traces
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// The validator used as acceptance gate
    pub fn validator(&self) -> &TraceValidator {
        &self.validator
    }

    /// Validate, enrich and deliver a single trace
    pub fn process_trace<T: Serialize + ?Sized>(&self, trace: &T) -> TraceOutcome {
        match serde_json::to_value(trace) {
            Ok(value) => self.process_value(&value),
            Err(e) => {
                let validation = ValidationResult::new(vec![e.to_string()], Vec::new());
                TraceOutcome::rejected(validation, e.to_string())
            }
        }
    }

    fn process_value(&self, raw: &Value) -> TraceOutcome {
        let validation = self.validator.validate_value(raw);
        let id = RawRecord::new(raw).id_label();

        if !validation.valid {
            warn!(id = %id, errors = ?validation.errors, "Trace rejected");
            let error = format!("Validation failed: {}", validation.errors.join(", "));
            return TraceOutcome::rejected(validation, error);
        }

        if self.config.ingest.reject_on_warnings && validation.has_warnings() {
            warn!(id = %id, warnings = ?validation.warnings, "Trace rejected on warnings");
            let error = format!("Validation warnings: {}", validation.warnings.join(", "));
            return TraceOutcome::rejected(validation, error);
        }

        let trace: UniversalTraceData = match serde_json::from_value(raw.clone()) {
            Ok(trace) => trace,
            Err(e) => {
                warn!(id = %id, "Trace passed validation but failed to decode: {}", e);
                return TraceOutcome::rejected(validation, format!("Malformed trace: {e}"));
            }
        };

        let detection = self
            .config
            .detection
            .record_detection_metadata
            .then(|| self.detector.detect(raw));
        let enriched = enrich_trace(&trace, detection.as_ref(), &self.config.ingest.server_version);

        if let Err(e) = self.sink.accept(enriched.clone()) {
            warn!(id = %id, "Sink refused trace: {}", e);
            return TraceOutcome::rejected(validation, e.to_string());
        }

        debug!(id = %id, session_id = %enriched.session_id, "Trace accepted");

        TraceOutcome {
            success: true,
            validation,
            trace: Some(enriched),
            error: None,
        }
    }

    /// Validate a batch, then process each of its traces.
    ///
    /// A batch that fails validation is rejected as a whole.
    pub fn process_batch<T: Serialize + ?Sized>(&self, batch: &T) -> BatchOutcome {
        let batch = match serde_json::to_value(batch) {
            Ok(value) => value,
            Err(e) => {
                return BatchOutcome {
                    success: false,
                    validation: ValidationResult::new(vec![e.to_string()], Vec::new()),
                    processed_count: 0,
                    failed_count: 0,
                    results: Vec::new(),
                }
            }
        };

        let validation = self.validator.validate_batch_value(&batch);
        let traces = batch
            .get("traces")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();

        if !validation.valid {
            warn!(
                batch_id = %RawRecord::new(&batch).id_label(),
                errors = validation.errors.len(),
                "Batch rejected"
            );
            let results: Vec<TraceResult> = traces
                .iter()
                .map(|trace| TraceResult {
                    trace_id: RawRecord::new(trace).id_label(),
                    success: false,
                    error: Some(BATCH_REJECTED_MESSAGE.to_string()),
                })
                .collect();

            return BatchOutcome {
                success: false,
                validation,
                processed_count: 0,
                failed_count: results.len(),
                results,
            };
        }

        let results: Vec<TraceResult> = traces
            .iter()
            .map(|trace| {
                let outcome = self.process_value(trace);
                TraceResult {
                    trace_id: RawRecord::new(trace).id_label(),
                    success: outcome.success,
                    error: outcome.error,
                }
            })
            .collect();

        let processed_count = results.iter().filter(|r| r.success).count();
        let failed_count = results.len() - processed_count;

        info!(
            traces = results.len(),
            processed = processed_count,
            failed = failed_count,
            "Batch processed"
        );

        BatchOutcome {
            success: processed_count > 0,
            validation,
            processed_count,
            failed_count,
            results,
        }
    }

    /// Process every trace of a session.
    ///
    /// Session validation is advisory: it is reported and logged but does not
    /// stop the traces from being processed. Each trace is re-homed to the
    /// session and inherits the session metadata.
    pub fn process_session(&self, session: &UniversalSession) -> SessionOutcome {
        let validation = self.validator.validate_session(session);
        if !validation.valid {
            warn!(session_id = %session.id, errors = ?validation.errors, "Session failed validation");
        }

        let results: Vec<SessionTraceOutcome> = session
            .traces
            .iter()
            .map(|trace| {
                let homed = UniversalTraceData {
                    session_id: session.id.clone(),
                    session_metadata: merge_metadata(
                        trace.session_metadata.as_ref(),
                        session.metadata.as_ref(),
                    ),
                    ..trace.clone()
                };
                SessionTraceOutcome {
                    trace_id: trace.id.clone(),
                    outcome: self.process_trace(&homed),
                }
            })
            .collect();

        info!(
            session_id = %session.id,
            traces = results.len(),
            accepted = results.iter().filter(|r| r.outcome.success).count(),
            "Session processed"
        );

        SessionOutcome { validation, results }
    }

    /// Convert a legacy payload into the universal format
    pub fn convert_legacy(&self, legacy: &Value) -> Result<UniversalTraceData> {
        self.adapter.from_legacy(legacy)
    }

    /// Infer the producing language of a raw payload
    pub fn detect_language(&self, trace: &Value) -> LanguageDetection {
        self.detector.detect(trace)
    }
}

/// Trace keys merged with session keys; session keys win
fn merge_metadata(trace: Option<&Attributes>, session: Option<&Attributes>) -> Option<Attributes> {
    match (trace, session) {
        (None, None) => None,
        (trace, session) => {
            let mut merged = trace.cloned().unwrap_or_default();
            if let Some(session) = session {
                merged.extend(session.iter().map(|(k, v)| (k.clone(), v.clone())));
            }
            Some(merged)
        }
    }
}
