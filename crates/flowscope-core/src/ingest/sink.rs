//! Destinations for accepted traces

use parking_lot::Mutex;

use crate::error::Result;
use crate::models::UniversalTraceData;

/// Receives traces that passed the acceptance gate.
///
/// Storage lives outside this crate; implementors hand traces to whatever
/// persistence or streaming layer the host process uses.
pub trait TraceSink: Send + Sync {
    /// Take ownership of one accepted trace
    fn accept(&self, trace: UniversalTraceData) -> Result<()>;
}

impl<F> TraceSink for F
where
    F: Fn(UniversalTraceData) -> Result<()> + Send + Sync,
{
    fn accept(&self, trace: UniversalTraceData) -> Result<()> {
        self(trace)
    }
}

/// Sink that drops every trace, for validation-only callers
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardSink;

impl TraceSink for DiscardSink {
    fn accept(&self, _trace: UniversalTraceData) -> Result<()> {
        Ok(())
    }
}

/// Sink that keeps traces in memory, in arrival order
#[derive(Debug, Default)]
pub struct MemorySink {
    traces: Mutex<Vec<UniversalTraceData>>,
}

impl MemorySink {
    /// Create an empty sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the traces received so far
    pub fn traces(&self) -> Vec<UniversalTraceData> {
        self.traces.lock().clone()
    }

    /// Number of traces received
    pub fn len(&self) -> usize {
        self.traces.lock().len()
    }

    /// Check if nothing was received
    pub fn is_empty(&self) -> bool {
        self.traces.lock().is_empty()
    }

    /// Remove and return everything received so far
    pub fn drain(&self) -> Vec<UniversalTraceData> {
        std::mem::take(&mut *self.traces.lock())
    }
}

impl TraceSink for MemorySink {
    fn accept(&self, trace: UniversalTraceData) -> Result<()> {
        self.traces.lock().push(trace);
        Ok(())
    }
}
