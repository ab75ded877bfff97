//! Cross-language statistics and correlation over trace sets

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::{Framework, Language, UniversalTraceData};

/// Number of traces per producing language
pub fn language_stats(traces: &[UniversalTraceData]) -> BTreeMap<Language, usize> {
    let mut stats = BTreeMap::new();
    for trace in traces {
        *stats.entry(trace.language).or_insert(0) += 1;
    }
    stats
}

/// Number of traces per framework
pub fn framework_stats(traces: &[UniversalTraceData]) -> BTreeMap<Framework, usize> {
    let mut stats = BTreeMap::new();
    for trace in traces {
        *stats.entry(trace.framework).or_insert(0) += 1;
    }
    stats
}

/// Parent/child structure of a set of traces
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correlation {
    /// Parent id to child ids, children in input order
    pub graph: BTreeMap<String, Vec<String>>,
    /// Distinct languages, first-seen order
    pub languages: Vec<Language>,
    /// Distinct frameworks, first-seen order
    pub frameworks: Vec<Framework>,
}

/// Correlate traces through their `parent_id` links.
///
/// Parents need not be part of `traces`; a link is recorded as soon as a
/// child names it.
pub fn correlate(traces: &[UniversalTraceData]) -> Correlation {
    let mut correlation = Correlation::default();

    for trace in traces {
        if let Some(parent_id) = &trace.parent_id {
            correlation
                .graph
                .entry(parent_id.clone())
                .or_default()
                .push(trace.id.clone());
        }
        if !correlation.languages.contains(&trace.language) {
            correlation.languages.push(trace.language);
        }
        if !correlation.frameworks.contains(&trace.framework) {
            correlation.frameworks.push(trace.framework);
        }
    }

    correlation
}
