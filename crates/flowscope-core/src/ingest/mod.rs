//! Trace ingestion
//!
//! The [`Processor`] is the acceptance gate in front of storage: it validates
//! incoming traces, batches and sessions, enriches what it accepts and hands
//! the result to a [`TraceSink`]. Storage itself lives outside this crate.
//!
//! [`stats`] holds read-only aggregations over already-accepted traces.

mod enrich;
mod processor;
mod sink;
pub mod stats;

pub use enrich::{enrich_trace, DETECTION_METADATA_KEY, SERVER_METADATA_KEY};
pub use processor::{
    BatchOutcome, Processor, SessionOutcome, SessionTraceOutcome, TraceOutcome, TraceResult,
    BATCH_REJECTED_MESSAGE,
};
pub use sink::{DiscardSink, MemorySink, TraceSink};
pub use stats::{correlate, framework_stats, language_stats, Correlation};
