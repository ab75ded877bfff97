//! Translation between the legacy flat trace format and the universal format

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{
    timestamp, Framework, LegacyEventType, LegacyStatus, LegacyTrace, ProtocolVersion,
    TraceContext, TraceStatus, UniversalTraceData,
};

use super::detector::LanguageDetector;
use super::raw::{display, is_truthy, RawRecord};

/// Format tag of the legacy schema
pub const LEGACY_FORMAT_VERSION: &str = "0.1.0";

/// Error message recorded for failed legacy traces, which carry no detail
pub const LEGACY_FAILURE_MESSAGE: &str = "Operation failed";

/// Operation name used when a legacy trace names none
pub const UNKNOWN_OPERATION: &str = "unknown_operation";

/// Converts between an older trace format and the universal one.
///
/// `to_legacy` is a best-effort projection, not an inverse: callers must
/// not assume `from_legacy(to_legacy(x)) == x`. Only the status mapping is
/// a bijection.
pub trait TraceDataAdapter {
    /// Build a universal trace from a raw payload in the older format
    fn from_legacy(&self, legacy: &Value) -> Result<UniversalTraceData>;

    /// Project a universal trace onto the older format
    fn to_legacy(&self, trace: &UniversalTraceData) -> Result<LegacyTrace>;

    /// Format tag of the older format
    fn version(&self) -> &'static str;
}

/// Adapter for the pre-protocol flat schema
#[derive(Debug, Clone, Default)]
pub struct LegacyTraceAdapter {
    detector: LanguageDetector,
}

impl LegacyTraceAdapter {
    /// Create an adapter that infers languages with `detector`
    pub fn new(detector: LanguageDetector) -> Self {
        Self { detector }
    }
}

impl TraceDataAdapter for LegacyTraceAdapter {
    fn from_legacy(&self, legacy: &Value) -> Result<UniversalTraceData> {
        let raw = RawRecord::new(legacy);

        let started_ms = epoch_millis(&raw)?;
        let start_time = to_timestamp(started_ms, "timestamp")?;

        let duration = raw.integer("duration");
        // a zero duration is kept as `duration_ms` but does not close the trace
        let end_time = match duration.filter(|_| raw.has("duration")) {
            Some(d) => {
                let ended_ms = started_ms
                    .checked_add(d)
                    .ok_or_else(|| Error::invalid_timestamp("duration", d))?;
                Some(to_timestamp(ended_ms, "duration")?)
            }
            None => None,
        };

        let detection = self.detector.detect(legacy);
        let legacy_status = raw.str("status");
        let metadata = raw.nested("metadata");

        let trace = UniversalTraceData {
            id: raw.text("id").unwrap_or_default(),
            session_id: raw.text("sessionId").unwrap_or_default(),
            parent_id: raw.text("parentId"),
            operation: map_operation(&raw),
            framework: map_framework(metadata.as_ref()),
            language: detection.language,
            start_time,
            end_time,
            duration_ms: duration,
            input: legacy.get("data").cloned().unwrap_or(Value::Null),
            output: None,
            metadata: raw.object("metadata").cloned(),
            session_metadata: None,
            status: map_status(legacy_status),
            error: (legacy_status == Some(LegacyStatus::Failed.as_str()))
                .then(|| LEGACY_FAILURE_MESSAGE.to_string()),
            error_type: None,
            stack_trace: None,
            protocol_version: ProtocolVersion::CURRENT,
            language_metadata: metadata.as_ref().and_then(extract_language_metadata),
            performance: None,
            context: metadata.as_ref().map(extract_context),
        };

        debug!(
            id = %trace.id,
            operation = %trace.operation,
            language = %trace.language,
            confidence = detection.confidence,
            "Converted legacy trace"
        );

        Ok(trace)
    }

    fn to_legacy(&self, trace: &UniversalTraceData) -> Result<LegacyTrace> {
        let started = timestamp::parse(&trace.start_time)
            .ok_or_else(|| Error::invalid_timestamp("start_time", &trace.start_time))?;

        let data = if is_truthy(&trace.input) {
            trace.input.clone()
        } else {
            trace.output.clone().unwrap_or(Value::Null)
        };

        Ok(LegacyTrace {
            id: trace.id.clone(),
            timestamp: started.timestamp_millis(),
            session_id: trace.session_id.clone(),
            // the legacy schema has no chain concept separate from the session
            chain_id: trace.session_id.clone(),
            event_type: infer_event_type(&trace.operation, trace.status),
            data,
            metadata: trace.metadata.clone(),
            parent_id: trace.parent_id.clone(),
            duration: trace.duration_ms,
            status: to_legacy_status(trace.status),
        })
    }

    fn version(&self) -> &'static str {
        LEGACY_FORMAT_VERSION
    }
}

fn epoch_millis(raw: &RawRecord<'_>) -> Result<i64> {
    let invalid = || {
        let shown = raw
            .value()
            .get("timestamp")
            .map_or_else(|| "missing".to_string(), display);
        Error::invalid_timestamp("timestamp", shown)
    };

    raw.integer("timestamp")
        .filter(|millis| timestamp::from_epoch_millis(*millis).is_some())
        .ok_or_else(invalid)
}

fn to_timestamp(millis: i64, field: &str) -> Result<String> {
    timestamp::from_epoch_millis(millis)
        .map(timestamp::format)
        .ok_or_else(|| Error::invalid_timestamp(field, millis))
}

fn map_operation(raw: &RawRecord<'_>) -> String {
    raw.str("type")
        .or_else(|| raw.nested("metadata").and_then(|m| m.str("operation")))
        .unwrap_or(UNKNOWN_OPERATION)
        .to_string()
}

fn map_framework(metadata: Option<&RawRecord<'_>>) -> Framework {
    metadata
        .and_then(|m| m.str("framework"))
        .and_then(|f| f.parse().ok())
        .unwrap_or(Framework::Custom)
}

/// Legacy status string to universal status; unknown values become pending
pub fn map_status(status: Option<&str>) -> TraceStatus {
    match status.and_then(|s| s.parse::<LegacyStatus>().ok()) {
        Some(LegacyStatus::Completed) => TraceStatus::Success,
        Some(LegacyStatus::Failed) => TraceStatus::Error,
        Some(LegacyStatus::Cancelled) => TraceStatus::Cancelled,
        Some(LegacyStatus::Pending) | None => TraceStatus::Pending,
    }
}

/// Universal status to legacy status
pub fn to_legacy_status(status: TraceStatus) -> LegacyStatus {
    match status {
        TraceStatus::Success => LegacyStatus::Completed,
        TraceStatus::Error => LegacyStatus::Failed,
        TraceStatus::Cancelled => LegacyStatus::Cancelled,
        TraceStatus::Pending => LegacyStatus::Pending,
    }
}

/// Guess a legacy event type from an operation name.
///
/// Substring heuristic; it does not invert the forward `type` → `operation`
/// mapping (`tool_use` comes back as `function_call`, `chain_end` as
/// `chain_start`).
pub fn infer_event_type(operation: &str, status: TraceStatus) -> LegacyEventType {
    let operation = operation.to_lowercase();

    if operation.contains("chain") {
        LegacyEventType::ChainStart
    } else if operation.contains("prompt") {
        LegacyEventType::Prompt
    } else if operation.contains("response") {
        LegacyEventType::Response
    } else if operation.contains("function") || operation.contains("tool") {
        LegacyEventType::FunctionCall
    } else if operation.contains("agent") {
        LegacyEventType::AgentStep
    } else if status == TraceStatus::Error {
        LegacyEventType::Error
    } else {
        LegacyEventType::ChainStart
    }
}

fn extract_language_metadata(metadata: &RawRecord<'_>) -> Option<crate::models::LanguageMetadata> {
    let value = metadata.get("language_metadata")?;
    match serde_json::from_value(value.clone()) {
        Ok(parsed) => Some(parsed),
        Err(e) => {
            warn!("Dropping malformed language_metadata: {}", e);
            None
        }
    }
}

fn extract_context(metadata: &RawRecord<'_>) -> TraceContext {
    TraceContext {
        user_id: metadata.text("user_id"),
        request_id: metadata.text("request_id"),
        correlation_id: metadata.text("correlation_id"),
        tenant_id: None,
        environment: metadata.text("environment"),
        region: None,
        tags: metadata.array("tags").map(|tags| {
            tags.iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        }),
        custom_attributes: metadata.object("custom_attributes").cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Language;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    fn adapter() -> LegacyTraceAdapter {
        LegacyTraceAdapter::default()
    }

    #[test]
    fn test_from_legacy_prompt() {
        let legacy = json!({
            "id": "t1",
            "timestamp": 1_700_000_000_000_i64,
            "sessionId": "s1",
            "type": "prompt",
            "data": {"q": "hi"},
            "status": "completed"
        });

        let trace = adapter().from_legacy(&legacy).unwrap();

        assert_eq!(trace.id, "t1");
        assert_eq!(trace.session_id, "s1");
        assert_eq!(trace.operation, "prompt");
        assert_eq!(trace.framework, Framework::Custom);
        assert_eq!(trace.language, Language::JavaScript);
        assert_eq!(trace.start_time, "2023-11-14T22:13:20.000Z");
        assert_eq!(trace.end_time, None);
        assert_eq!(trace.status, TraceStatus::Success);
        assert_eq!(trace.protocol_version, ProtocolVersion::V1_0);
        assert_eq!(trace.input, json!({"q": "hi"}));
        assert_eq!(trace.output, None);
        assert_eq!(trace.error, None);
        assert_eq!(trace.context, None);
    }

    #[test]
    fn test_from_legacy_with_metadata() {
        let legacy = json!({
            "id": "t2",
            "timestamp": 1_700_000_000_000_i64,
            "sessionId": "s1",
            "parentId": "t1",
            "duration": 250,
            "data": null,
            "status": "failed",
            "metadata": {
                "operation": "retrieve_docs",
                "framework": "llamaindex",
                "user_id": "u1",
                "environment": "production",
                "tags": ["rag", 3],
                "language_metadata": {"python_version": "3.12"}
            }
        });

        let trace = adapter().from_legacy(&legacy).unwrap();

        assert_eq!(trace.operation, "retrieve_docs");
        assert_eq!(trace.framework, Framework::LlamaIndex);
        assert_eq!(trace.parent_id.as_deref(), Some("t1"));
        assert_eq!(trace.end_time.as_deref(), Some("2023-11-14T22:13:20.250Z"));
        assert_eq!(trace.duration_ms, Some(250));
        assert_eq!(trace.status, TraceStatus::Error);
        assert_eq!(trace.error.as_deref(), Some(LEGACY_FAILURE_MESSAGE));
        assert_eq!(
            trace.language_metadata.unwrap().python_version.as_deref(),
            Some("3.12")
        );

        let context = trace.context.unwrap();
        assert_eq!(context.user_id.as_deref(), Some("u1"));
        assert_eq!(context.environment.as_deref(), Some("production"));
        assert_eq!(context.tags, Some(vec!["rag".to_string()]));
        assert_eq!(context.request_id, None);
    }

    #[test]
    fn test_unknown_framework_and_operation() {
        let legacy = json!({
            "id": "t3",
            "timestamp": 0,
            "metadata": {"framework": "haystack"}
        });

        let trace = adapter().from_legacy(&legacy).unwrap();

        assert_eq!(trace.operation, UNKNOWN_OPERATION);
        assert_eq!(trace.framework, Framework::Custom);
        assert_eq!(trace.start_time, "1970-01-01T00:00:00.000Z");
        assert_eq!(trace.status, TraceStatus::Pending);
        assert_eq!(trace.session_id, "");
    }

    #[rstest]
    #[case(json!({"id": "t"}))]
    #[case(json!({"id": "t", "timestamp": "yesterday"}))]
    #[case(json!({"id": "t", "timestamp": 9.0e15}))]
    #[case(json!({"id": "t", "timestamp": 253_402_300_800_000_i64}))]
    #[case(json!({"id": "t", "timestamp": -62_167_219_200_001_i64}))]
    fn test_unresolvable_timestamp_is_error(#[case] legacy: Value) {
        let err = adapter().from_legacy(&legacy).unwrap_err();

        assert!(matches!(err, Error::InvalidTimestamp { ref field, .. } if field == "timestamp"));
    }

    #[rstest]
    #[case(json!(0))]
    #[case(json!(""))]
    #[case(json!(false))]
    #[case(json!([]))]
    fn test_falsy_data_passed_through(#[case] data: Value) {
        let legacy = json!({"id": "t", "timestamp": 1_000, "data": data});

        let trace = adapter().from_legacy(&legacy).unwrap();

        assert_eq!(trace.input, data);
    }

    #[test]
    fn test_zero_duration_has_no_end_time() {
        let legacy = json!({"id": "t", "timestamp": 1_000, "duration": 0});

        let trace = adapter().from_legacy(&legacy).unwrap();

        assert_eq!(trace.duration_ms, Some(0));
        assert_eq!(trace.end_time, None);
    }

    #[test]
    fn test_last_four_digit_year_instant() {
        let validator = crate::protocol::TraceValidator::default();
        let legacy = json!({
            "id": "t",
            "timestamp": 253_402_300_799_999_i64,
            "sessionId": "s",
            "data": {"q": 1}
        });

        let trace = adapter().from_legacy(&legacy).unwrap();

        assert_eq!(trace.start_time, "9999-12-31T23:59:59.999Z");
        assert!(validator.validate(&trace).valid);
    }

    #[test]
    fn test_end_time_past_year_9999_is_error() {
        let legacy = json!({"id": "t", "timestamp": 253_402_300_799_999_i64, "duration": 1});

        let err = adapter().from_legacy(&legacy).unwrap_err();

        assert!(matches!(err, Error::InvalidTimestamp { ref field, .. } if field == "duration"));
    }

    #[rstest]
    #[case("run_chain", TraceStatus::Success, LegacyEventType::ChainStart)]
    #[case("build_prompt", TraceStatus::Success, LegacyEventType::Prompt)]
    #[case("LLM Response", TraceStatus::Success, LegacyEventType::Response)]
    #[case("tool_use", TraceStatus::Success, LegacyEventType::FunctionCall)]
    #[case("agent_step", TraceStatus::Success, LegacyEventType::AgentStep)]
    #[case("retrieve", TraceStatus::Error, LegacyEventType::Error)]
    #[case("retrieve", TraceStatus::Success, LegacyEventType::ChainStart)]
    fn test_infer_event_type(
        #[case] operation: &str,
        #[case] status: TraceStatus,
        #[case] expected: LegacyEventType,
    ) {
        assert_eq!(infer_event_type(operation, status), expected);
    }

    #[test]
    fn test_to_legacy() {
        let legacy_in = json!({
            "id": "t1",
            "timestamp": 1_700_000_000_000_i64,
            "sessionId": "s1",
            "type": "tool_use",
            "data": {"tool": "search"},
            "duration": 5,
            "status": "cancelled"
        });
        let trace = adapter().from_legacy(&legacy_in).unwrap();

        let legacy = adapter().to_legacy(&trace).unwrap();

        assert_eq!(legacy.timestamp, 1_700_000_000_000);
        assert_eq!(legacy.chain_id, "s1");
        assert_eq!(legacy.event_type, LegacyEventType::FunctionCall);
        assert_eq!(legacy.data, json!({"tool": "search"}));
        assert_eq!(legacy.duration, Some(5));
        assert_eq!(legacy.status, LegacyStatus::Cancelled);
    }

    #[test]
    fn test_to_legacy_falls_back_to_output() {
        let mut trace = UniversalTraceData::new("t", "s", "x", Framework::Custom, Language::Rust, Value::Null);
        trace.output = Some(json!("answer"));

        let legacy = adapter().to_legacy(&trace).unwrap();
        assert_eq!(legacy.data, json!("answer"));
    }

    #[test]
    fn test_to_legacy_rejects_bad_start_time() {
        let mut trace = UniversalTraceData::new("t", "s", "x", Framework::Custom, Language::Rust, Value::Null);
        trace.start_time = "soon".to_string();

        assert!(adapter().to_legacy(&trace).is_err());
    }

    #[test]
    fn test_version() {
        assert_eq!(adapter().version(), "0.1.0");
    }

    proptest! {
        #[test]
        fn prop_status_round_trips(
            status in prop::sample::select(LegacyStatus::ALL.to_vec()),
            millis in 0_i64..4_102_444_800_000,
        ) {
            let legacy = json!({
                "id": "t",
                "timestamp": millis,
                "sessionId": "s",
                "status": status.as_str()
            });

            let adapter = adapter();
            let trace = adapter.from_legacy(&legacy).unwrap();
            let back = adapter.to_legacy(&trace).unwrap();

            prop_assert_eq!(back.status, status);
            prop_assert_eq!(back.timestamp, millis);
        }
    }
}
