//! Language inference for raw and legacy traces
//!
//! Detection is a fixed sequence of independent rules. Each rule inspects
//! the raw trace and emits zero or more [`Signal`]s; signals are folded in
//! evaluation order with a last-wins choice of language. A later rule can
//! therefore replace the language picked by an earlier, more confident
//! rule. Confidence itself never drops except through [`ConfidenceUpdate::Set`].

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::DetectionConfig;
use crate::models::Language;

use super::raw::RawRecord;

/// Confidence reported for an explicit `language` field
pub const EXPLICIT_CONFIDENCE: f64 = 1.0;

static CAMEL_HUMP: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z][A-Z]").expect("valid regex"));
static CAMEL_KEY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-z][a-zA-Z0-9]*$").expect("valid regex"));

/// Best-effort guess at the producing language
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageDetection {
    /// Chosen language
    pub language: Language,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Every rule that fired, in evaluation order
    pub evidence: Vec<String>,
}

impl Default for LanguageDetection {
    fn default() -> Self {
        Self {
            language: Language::JavaScript,
            confidence: 0.0,
            evidence: Vec::new(),
        }
    }
}

impl LanguageDetection {
    /// Fold one signal into the running result
    pub fn apply(&mut self, signal: Signal) {
        self.language = signal.language;
        self.confidence = match signal.update {
            ConfidenceUpdate::Set(c) => c,
            ConfidenceUpdate::AtLeast(c) => self.confidence.max(c),
        };
        self.evidence.push(signal.evidence);
    }
}

/// How a signal changes the running confidence
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ConfidenceUpdate {
    /// Overwrite the confidence
    Set(f64),
    /// Raise the confidence to at least this value
    AtLeast(f64),
}

/// One candidate produced by a detection rule
#[derive(Debug, Clone, PartialEq)]
pub struct Signal {
    /// Suggested language
    pub language: Language,
    /// Effect on confidence
    pub update: ConfidenceUpdate,
    /// Human-readable reason
    pub evidence: String,
}

impl Signal {
    fn new(language: Language, update: ConfidenceUpdate, evidence: impl Into<String>) -> Self {
        Self {
            language,
            update,
            evidence: evidence.into(),
        }
    }
}

type RuleFn = fn(&RawRecord<'_>) -> Vec<Signal>;

/// A named detection rule
struct Rule {
    name: &'static str,
    /// Only evaluated while confidence is below the low-confidence threshold
    fallback: bool,
    eval: RuleFn,
}

/// Rules in evaluation order, after the explicit field check
const RULES: &[Rule] = &[
    Rule { name: "metadata", fallback: false, eval: metadata_signals },
    Rule { name: "stack_trace", fallback: false, eval: stack_trace_signals },
    Rule { name: "naming", fallback: false, eval: naming_signals },
    Rule { name: "framework", fallback: true, eval: framework_signals },
    Rule { name: "structure", fallback: true, eval: structure_signals },
];

/// Metadata keys that identify a runtime
struct MetadataHint {
    language: Language,
    keys: &'static [&'static str],
    evidence: &'static str,
}

const METADATA_HINTS: &[MetadataHint] = &[
    MetadataHint {
        language: Language::Python,
        keys: &["python_version", "pip_version", "virtual_env"],
        evidence: "Python metadata detected",
    },
    MetadataHint {
        language: Language::JavaScript,
        keys: &["node_version", "npm_version"],
        evidence: "Node.js metadata detected",
    },
    MetadataHint {
        language: Language::Go,
        keys: &["go_version", "go_mod"],
        evidence: "Go metadata detected",
    },
    MetadataHint {
        language: Language::Java,
        keys: &["java_version", "maven_version", "gradle_version"],
        evidence: "Java metadata detected",
    },
];

/// Stack trace fingerprint of a runtime
struct StackPattern {
    language: Language,
    matches: fn(&str) -> bool,
    evidence: &'static str,
}

const STACK_PATTERNS: &[StackPattern] = &[
    StackPattern {
        language: Language::Python,
        matches: |s| {
            s.contains("Traceback (most recent call last)") || s.contains("File \"") || s.contains(".py\", line")
        },
        evidence: "Python stack trace pattern",
    },
    StackPattern {
        language: Language::JavaScript,
        matches: |s| s.contains("at ") && (s.contains(".js:") || s.contains(".ts:")),
        evidence: "JavaScript stack trace pattern",
    },
    StackPattern {
        language: Language::Java,
        matches: |s| s.contains("Exception in thread") || s.contains("at java.") || s.contains(".java:"),
        evidence: "Java stack trace pattern",
    },
];

fn metadata_signals(raw: &RawRecord<'_>) -> Vec<Signal> {
    let Some(metadata) = raw
        .first_of(&["metadata", "language_metadata"])
        .map(RawRecord::new)
    else {
        return Vec::new();
    };

    METADATA_HINTS
        .iter()
        .filter(|hint| hint.keys.iter().any(|k| metadata.has(k)))
        .map(|hint| Signal::new(hint.language, ConfidenceUpdate::Set(0.9), hint.evidence))
        .collect()
}

fn stack_trace_signals(raw: &RawRecord<'_>) -> Vec<Signal> {
    let Some(text) = raw.first_of(&["stack_trace", "error"]).and_then(Value::as_str) else {
        return Vec::new();
    };

    STACK_PATTERNS
        .iter()
        .filter(|pattern| (pattern.matches)(text))
        .map(|pattern| Signal::new(pattern.language, ConfidenceUpdate::AtLeast(0.8), pattern.evidence))
        .collect()
}

fn naming_signals(raw: &RawRecord<'_>) -> Vec<Signal> {
    let Some(operation) = raw.str("operation") else {
        return Vec::new();
    };

    let mut signals = Vec::new();
    if operation.contains('_') && !operation.contains('-') {
        signals.push(Signal::new(
            Language::Python,
            ConfidenceUpdate::AtLeast(0.3),
            "Python naming convention (snake_case)",
        ));
    }
    if CAMEL_HUMP.is_match(operation) {
        signals.push(Signal::new(
            Language::JavaScript,
            ConfidenceUpdate::AtLeast(0.3),
            "JavaScript naming convention (camelCase)",
        ));
    }
    signals
}

fn framework_signals(raw: &RawRecord<'_>) -> Vec<Signal> {
    let Some(framework) = raw.str("framework") else {
        return Vec::new();
    };

    match framework.to_ascii_lowercase().as_str() {
        "langchain" => vec![Signal::new(
            Language::Python,
            ConfidenceUpdate::AtLeast(0.4),
            "LangChain framework (language ambiguous)",
        )],
        "llamaindex" => vec![Signal::new(
            Language::Python,
            ConfidenceUpdate::AtLeast(0.7),
            "LlamaIndex framework (typically Python)",
        )],
        _ => Vec::new(),
    }
}

fn is_snake_case_key(key: &str) -> bool {
    key.contains('_') && !key.contains('-') && key == key.to_lowercase()
}

fn is_camel_case_key(key: &str) -> bool {
    CAMEL_KEY.is_match(key) && key.chars().any(|c| c.is_ascii_uppercase())
}

/// More than 30% of `keys` satisfy `predicate`
#[allow(clippy::cast_precision_loss)]
fn key_share_exceeds(keys: &[&str], predicate: fn(&str) -> bool) -> bool {
    let matching = keys.iter().filter(|k| predicate(k)).count();
    matching as f64 > keys.len() as f64 * 0.3
}

fn structure_signals(raw: &RawRecord<'_>) -> Vec<Signal> {
    let keys: Vec<&str> = raw.keys().collect();

    let mut signals = Vec::new();
    if key_share_exceeds(&keys, is_snake_case_key) {
        signals.push(Signal::new(
            Language::Python,
            ConfidenceUpdate::AtLeast(0.2),
            "snake_case keys suggest Python",
        ));
    }
    if key_share_exceeds(&keys, is_camel_case_key) {
        signals.push(Signal::new(
            Language::JavaScript,
            ConfidenceUpdate::AtLeast(0.2),
            "camelCase keys suggest JavaScript",
        ));
    }
    signals
}

/// Infers the producing language of a raw trace.
///
/// Stateless apart from its threshold; construct one per caller or share
/// freely across threads.
#[derive(Debug, Clone)]
pub struct LanguageDetector {
    low_confidence_threshold: f64,
}

impl Default for LanguageDetector {
    fn default() -> Self {
        Self::new(&DetectionConfig::default())
    }
}

impl LanguageDetector {
    /// Create a detector from configuration
    pub fn new(config: &DetectionConfig) -> Self {
        Self {
            low_confidence_threshold: config.low_confidence_threshold,
        }
    }

    /// Detect the language of a raw trace. Never fails.
    ///
    /// An explicit, recognised `language` field wins outright at full
    /// confidence. Otherwise every rule runs in order and the folded result
    /// is returned, defaulting to JavaScript at zero confidence.
    pub fn detect(&self, trace: &Value) -> LanguageDetection {
        let raw = RawRecord::new(trace);
        let mut detection = LanguageDetection::default();

        if let Some(explicit) = raw.get("language") {
            let label = super::raw::display(explicit);
            match label.to_ascii_lowercase().parse::<Language>() {
                Ok(language) => {
                    return LanguageDetection {
                        language,
                        confidence: EXPLICIT_CONFIDENCE,
                        evidence: vec![format!("explicit language field: {language}")],
                    };
                }
                Err(_) => detection
                    .evidence
                    .push(format!("unrecognized explicit language field: {label}")),
            }
        }

        for rule in RULES {
            if rule.fallback && detection.confidence >= self.low_confidence_threshold {
                trace!(rule = rule.name, confidence = detection.confidence, "Skipping fallback rule");
                continue;
            }
            for signal in (rule.eval)(&raw) {
                trace!(rule = rule.name, language = %signal.language, "Rule fired");
                detection.apply(signal);
            }
        }

        debug!(
            language = %detection.language,
            confidence = detection.confidence,
            evidence = detection.evidence.len(),
            "Language detected"
        );

        detection
    }
}

/// Detect with default settings
pub fn detect_language(trace: &Value) -> LanguageDetection {
    LanguageDetector::default().detect(trace)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn assert_confidence(detection: &LanguageDetection, expected: f64) {
        assert!(
            (detection.confidence - expected).abs() < 1e-9,
            "expected confidence {expected}, got {}",
            detection.confidence
        );
    }

    #[test]
    fn test_explicit_language_wins() {
        let detection = detect_language(&json!({
            "language": "go",
            "metadata": {"python_version": "3.11"},
            "stack_trace": "Traceback (most recent call last)",
            "framework": "llamaindex"
        }));

        assert_eq!(detection.language, Language::Go);
        assert_confidence(&detection, 1.0);
        assert_eq!(detection.evidence, vec!["explicit language field: go".to_string()]);
    }

    #[test]
    fn test_unrecognized_explicit_language_falls_through() {
        let detection = detect_language(&json!({
            "language": "ruby",
            "metadata": {"python_version": "3.11"}
        }));

        assert_eq!(detection.language, Language::Python);
        assert_confidence(&detection, 0.9);
        assert_eq!(detection.evidence[0], "unrecognized explicit language field: ruby");
    }

    #[test]
    fn test_python_metadata() {
        let detection = detect_language(&json!({"metadata": {"python_version": "3.11"}}));

        assert_eq!(detection.language, Language::Python);
        assert_confidence(&detection, 0.9);
    }

    #[test]
    fn test_language_metadata_used_when_metadata_absent() {
        let detection = detect_language(&json!({"language_metadata": {"go_mod": "example.com/app"}}));

        assert_eq!(detection.language, Language::Go);
        assert_confidence(&detection, 0.9);
    }

    #[test]
    fn test_last_metadata_hint_wins() {
        let detection = detect_language(&json!({
            "metadata": {"python_version": "3.11", "node_version": "20.1.0"}
        }));

        // Node.js hints are evaluated after Python hints
        assert_eq!(detection.language, Language::JavaScript);
        assert_confidence(&detection, 0.9);
        assert_eq!(
            detection.evidence,
            vec!["Python metadata detected".to_string(), "Node.js metadata detected".to_string()]
        );
    }

    #[rstest]
    #[case("Traceback (most recent call last):\n  File \"app.py\", line 3", Language::Python)]
    #[case("TypeError: x\n    at run (/srv/app.js:10:5)", Language::JavaScript)]
    #[case("Exception in thread \"main\" java.lang.NullPointerException", Language::Java)]
    fn test_stack_trace_patterns(#[case] stack: &str, #[case] expected: Language) {
        let detection = detect_language(&json!({"stack_trace": stack}));

        assert_eq!(detection.language, expected);
        assert_confidence(&detection, 0.8);
    }

    #[test]
    fn test_stack_trace_does_not_lower_metadata_confidence() {
        let detection = detect_language(&json!({
            "metadata": {"java_version": "21"},
            "error": "Traceback (most recent call last)"
        }));

        assert_eq!(detection.language, Language::Python);
        assert_confidence(&detection, 0.9);
    }

    #[test]
    fn test_naming_conventions() {
        let snake = detect_language(&json!({"operation": "run_chain"}));
        assert_eq!(snake.language, Language::Python);
        assert_confidence(&snake, 0.3);

        let camel = detect_language(&json!({"operation": "runChain"}));
        assert_eq!(camel.language, Language::JavaScript);
        assert_confidence(&camel, 0.3);
    }

    #[test]
    fn test_framework_fallback() {
        let langchain = detect_language(&json!({"framework": "langchain"}));
        assert_eq!(langchain.language, Language::Python);
        assert_confidence(&langchain, 0.4);

        let llamaindex = detect_language(&json!({"framework": "LlamaIndex"}));
        assert_eq!(llamaindex.language, Language::Python);
        assert_confidence(&llamaindex, 0.7);
    }

    #[test]
    fn test_framework_fallback_skipped_when_confident() {
        let detection = detect_language(&json!({
            "framework": "llamaindex",
            "metadata": {"node_version": "20"}
        }));

        assert_eq!(detection.language, Language::JavaScript);
        assert_confidence(&detection, 0.9);
    }

    #[test]
    fn test_structural_fallback() {
        let snake = detect_language(&json!({"user_id": 1, "request_id": 2, "data": 3}));
        assert_eq!(snake.language, Language::Python);
        assert_confidence(&snake, 0.2);

        let camel = detect_language(&json!({"userId": 1, "requestId": 2, "data": 3}));
        assert_eq!(camel.language, Language::JavaScript);
        assert_confidence(&camel, 0.2);
    }

    #[test]
    fn test_no_signal_defaults_to_javascript() {
        let detection = detect_language(&json!({"id": "t1", "data": {}}));

        assert_eq!(detection, LanguageDetection::default());

        let not_an_object = detect_language(&json!(42));
        assert_eq!(not_an_object.language, Language::JavaScript);
        assert_confidence(&not_an_object, 0.0);
    }

    #[test]
    fn test_custom_threshold_disables_fallbacks() {
        let detector = LanguageDetector::new(&DetectionConfig {
            low_confidence_threshold: 0.0,
            ..DetectionConfig::default()
        });

        let detection = detector.detect(&json!({"framework": "langchain"}));
        assert_confidence(&detection, 0.0);
        assert!(detection.evidence.is_empty());
    }
}
