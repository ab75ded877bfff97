//! Server-side enrichment of accepted traces

use serde_json::json;

use crate::models::{timestamp, UniversalTraceData};
use crate::protocol::LanguageDetection;

/// Metadata key holding the detector's opinion on the trace
pub const DETECTION_METADATA_KEY: &str = "_language_detection";

/// Metadata key holding processing details
pub const SERVER_METADATA_KEY: &str = "_server";

/// Return an enriched copy of `trace`.
///
/// - fills `duration_ms` from the timestamps when it is absent or zero
/// - records `detection`, if given, under [`DETECTION_METADATA_KEY`]
/// - records processing time and `server_version` under [`SERVER_METADATA_KEY`]
pub fn enrich_trace(
    trace: &UniversalTraceData,
    detection: Option<&LanguageDetection>,
    server_version: &str,
) -> UniversalTraceData {
    let mut enriched = trace.clone();

    if enriched.end_time.is_some() && enriched.duration_ms.unwrap_or(0) == 0 {
        if let Some(elapsed) = enriched.elapsed_ms() {
            enriched.duration_ms = Some(elapsed);
        }
    }

    let metadata = enriched.metadata.get_or_insert_with(Default::default);
    if let Some(detection) = detection {
        metadata.insert(
            DETECTION_METADATA_KEY.to_string(),
            json!({
                "language": detection.language,
                "confidence": detection.confidence,
                "evidence": detection.evidence,
            }),
        );
    }
    metadata.insert(
        SERVER_METADATA_KEY.to_string(),
        json!({
            "processed_at": timestamp::now(),
            "server_version": server_version,
        }),
    );

    enriched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Framework, Language};
    use serde_json::Value;

    fn trace() -> UniversalTraceData {
        let mut trace = UniversalTraceData::new("t1", "s1", "op", Framework::Custom, Language::Go, Value::Null);
        trace.start_time = "2024-01-01T00:00:00.000Z".to_string();
        trace.end_time = Some("2024-01-01T00:00:00.750Z".to_string());
        trace
    }

    #[test]
    fn test_duration_filled_from_timestamps() {
        let enriched = enrich_trace(&trace(), None, "1.2.3");

        assert_eq!(enriched.duration_ms, Some(750));
        let server = &enriched.metadata.as_ref().unwrap()[SERVER_METADATA_KEY];
        assert_eq!(server["server_version"], "1.2.3");
        assert!(enriched.metadata.as_ref().unwrap().get(DETECTION_METADATA_KEY).is_none());
    }

    #[test]
    fn test_declared_duration_kept() {
        let mut original = trace();
        original.duration_ms = Some(5000);

        let enriched = enrich_trace(&original, None, "1.2.3");

        assert_eq!(enriched.duration_ms, Some(5000));
        // input is left untouched
        assert!(original.metadata.is_none());
    }

    #[test]
    fn test_detection_recorded() {
        let detection = LanguageDetection {
            language: Language::Python,
            confidence: 0.9,
            evidence: vec!["Python metadata detected".to_string()],
        };

        let enriched = enrich_trace(&trace(), Some(&detection), "1.2.3");

        let metadata = enriched.metadata.unwrap();
        let recorded = &metadata[DETECTION_METADATA_KEY];
        assert_eq!(recorded["language"], "python");
        assert_eq!(recorded["evidence"][0], "Python metadata detected");
    }
}
