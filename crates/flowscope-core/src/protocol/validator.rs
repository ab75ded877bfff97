//! Acceptance gate for traces, batches and sessions
//!
//! Validation never fails: every problem becomes an entry in the returned
//! [`ValidationResult`]. Errors reject the object, warnings are advisory.

use std::collections::HashSet;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::config::ValidationConfig;
use crate::error::{Error, Result};
use crate::models::{timestamp, Framework, Language, ProtocolVersion, SessionStatus, TraceStatus};

use super::raw::{display, RawRecord};

const REQUIRED_TRACE_FIELDS: &[&str] = &[
    "id",
    "session_id",
    "operation",
    "framework",
    "language",
    "start_time",
    "status",
    "protocol_version",
];

const REQUIRED_SESSION_FIELDS: &[&str] = &["id", "start_time", "status"];

/// Outcome of a validation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    /// True iff `errors` is empty
    pub valid: bool,
    /// Problems that reject the object
    pub errors: Vec<String>,
    /// Advisory findings
    pub warnings: Vec<String>,
}

impl ValidationResult {
    /// Build a result, deriving `valid` from `errors`
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }

    /// Check if there are any warnings
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Convert into an error naming `id` when invalid
    pub fn into_result(self, id: impl Into<String>) -> Result<Self> {
        if self.valid {
            Ok(self)
        } else {
            Err(Error::Rejected {
                id: id.into(),
                errors: self.errors,
            })
        }
    }
}

/// Accumulates findings for one object
#[derive(Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Findings {
    fn error(&mut self, msg: impl Into<String>) {
        self.errors.push(msg.into());
    }

    fn warn(&mut self, msg: impl Into<String>) {
        self.warnings.push(msg.into());
    }

    fn finish(self) -> ValidationResult {
        ValidationResult::new(self.errors, self.warnings)
    }

    fn require(&mut self, raw: &RawRecord<'_>, fields: &[&str]) {
        for field in fields {
            if !raw.has(field) {
                self.error(format!("Missing required field: {field}"));
            }
        }
    }

    /// Both timestamps, when present, must be canonical ISO-8601
    fn check_timestamp_format(&mut self, raw: &RawRecord<'_>) {
        for field in ["start_time", "end_time"] {
            if raw.get(field).is_some_and(|v| !is_canonical_timestamp(v)) {
                self.error(format!("Invalid {field} format: must be ISO 8601"));
            }
        }
    }

    /// `end_time` must not precede `start_time` when both parse
    fn check_ordering(&mut self, raw: &RawRecord<'_>) {
        let parsed = |field| raw.str(field).and_then(timestamp::parse);
        if let (Some(start), Some(end)) = (parsed("start_time"), parsed("end_time")) {
            if end < start {
                self.error("end_time cannot be before start_time");
            }
        }
    }

    /// Closed-set membership of a present field
    fn check_member<T: FromStr<Err = String>>(&mut self, raw: &RawRecord<'_>, field: &str) {
        let Some(value) = raw.get(field) else {
            return;
        };
        if let Err(msg) = display(value).parse::<T>() {
            self.error(msg);
        }
    }
}

fn is_canonical_timestamp(value: &Value) -> bool {
    value.as_str().is_some_and(timestamp::is_canonical)
}

/// Validates canonical objects against the universal schema.
///
/// Accepts anything serializable: typed models or raw `serde_json::Value`
/// payloads of unknown shape.
#[derive(Debug, Clone, Default)]
pub struct TraceValidator {
    config: ValidationConfig,
}

impl TraceValidator {
    /// Create a validator with the given thresholds
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single trace
    pub fn validate<T: Serialize + ?Sized>(&self, trace: &T) -> ValidationResult {
        match serde_json::to_value(trace) {
            Ok(value) => self.validate_value(&value),
            Err(e) => unserializable(&e),
        }
    }

    /// Validate a batch envelope and every trace inside it
    pub fn validate_batch<T: Serialize + ?Sized>(&self, batch: &T) -> ValidationResult {
        match serde_json::to_value(batch) {
            Ok(value) => self.validate_batch_value(&value),
            Err(e) => unserializable(&e),
        }
    }

    /// Validate a session
    pub fn validate_session<T: Serialize + ?Sized>(&self, session: &T) -> ValidationResult {
        match serde_json::to_value(session) {
            Ok(value) => self.validate_session_value(&value),
            Err(e) => unserializable(&e),
        }
    }

    /// Validate a raw trace payload
    pub fn validate_value(&self, trace: &Value) -> ValidationResult {
        let raw = RawRecord::new(trace);
        let mut findings = Findings::default();

        findings.require(&raw, REQUIRED_TRACE_FIELDS);

        findings.check_timestamp_format(&raw);
        findings.check_member::<Framework>(&raw, "framework");
        findings.check_member::<Language>(&raw, "language");
        findings.check_member::<TraceStatus>(&raw, "status");
        findings.check_member::<ProtocolVersion>(&raw, "protocol_version");
        findings.check_ordering(&raw);

        if trace
            .get("duration_ms")
            .and_then(Value::as_f64)
            .is_some_and(|d| d < 0.0)
        {
            findings.error("duration_ms cannot be negative");
        }

        let status = raw.str("status");
        let has_end = raw.has("end_time");
        let has_error = raw.has("error");
        if status == Some(TraceStatus::Pending.as_str()) && has_end {
            findings.warn("Trace marked as pending but has end_time");
        }
        if status == Some(TraceStatus::Success.as_str()) && has_error {
            findings.warn("Trace marked as success but has error message");
        }
        if status == Some(TraceStatus::Error.as_str()) && !has_error {
            findings.warn("Trace marked as error but missing error message");
        }

        let result = findings.finish();
        debug!(
            id = %raw.id_label(),
            valid = result.valid,
            errors = result.errors.len(),
            warnings = result.warnings.len(),
            "Validated trace"
        );
        result
    }

    /// Validate a raw batch payload
    pub fn validate_batch_value(&self, batch: &Value) -> ValidationResult {
        let raw = RawRecord::new(batch);
        let mut findings = Findings::default();

        findings.require(&raw, &["batch_id"]);

        let Some(traces) = batch.get("traces").and_then(Value::as_array) else {
            findings.error("Missing or invalid traces array");
            return findings.finish();
        };

        if traces.is_empty() {
            findings.warn("Empty trace batch");
        }
        if traces.len() > self.config.max_batch_size {
            findings.warn(format!(
                "Large batch size (>{} traces) may impact performance",
                self.config.max_batch_size
            ));
        }

        let mut session_ids = HashSet::new();
        for (index, trace) in traces.iter().enumerate() {
            let result = self.validate_value(trace);
            let trace_raw = RawRecord::new(trace);
            let label = trace_raw.id_label();

            if !result.valid {
                findings.error(format!("Trace {index} ({label}): {}", result.errors.join(", ")));
            }
            if result.has_warnings() {
                findings.warn(format!("Trace {index} ({label}): {}", result.warnings.join(", ")));
            }
            if let Some(session_id) = trace_raw.text("session_id") {
                session_ids.insert(session_id);
            }
        }

        if session_ids.len() > self.config.max_sessions_per_batch {
            findings.warn(format!(
                "Batch contains traces from {} different sessions, consider splitting",
                session_ids.len()
            ));
        }

        let result = findings.finish();
        debug!(
            batch_id = %raw.text("batch_id").unwrap_or_default(),
            traces = traces.len(),
            sessions = session_ids.len(),
            valid = result.valid,
            "Validated batch"
        );
        result
    }

    /// Validate a raw session payload
    pub fn validate_session_value(&self, session: &Value) -> ValidationResult {
        let raw = RawRecord::new(session);
        let mut findings = Findings::default();

        findings.require(&raw, REQUIRED_SESSION_FIELDS);
        findings.check_timestamp_format(&raw);
        findings.check_member::<SessionStatus>(&raw, "status");
        findings.check_ordering(&raw);

        let status = raw.str("status");
        let has_end = raw.has("end_time");
        if status == Some(SessionStatus::Active.as_str()) && has_end {
            findings.warn("Session marked as active but has end_time");
        }
        // a missing status counts as not active
        if status != Some(SessionStatus::Active.as_str()) && !has_end {
            findings.warn("Completed session missing end_time");
        }

        let result = findings.finish();
        debug!(
            id = %raw.id_label(),
            valid = result.valid,
            "Validated session"
        );
        result
    }
}

fn unserializable(err: &serde_json::Error) -> ValidationResult {
    ValidationResult::new(vec![format!("Unserializable payload: {err}")], Vec::new())
}
