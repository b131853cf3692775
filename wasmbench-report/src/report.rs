//! Report Data Structures

use std::time::Duration;

use wasmbench_core::{InvocationResult, Value};

/// What produced a report entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    /// A loaded module export
    Module,
    /// A host-language reference implementation
    Reference,
}

/// One measured candidate
#[derive(Debug, Clone, PartialEq)]
pub struct ReportEntry {
    /// Display label (e.g. "Optimized")
    pub label: String,
    /// Module or reference
    pub kind: CandidateKind,
    /// Name of the computation (the export name)
    pub computation: String,
    /// Arguments passed to the call
    pub args: Vec<Value>,
    /// Returned values and elapsed time
    pub result: InvocationResult,
}

impl ReportEntry {
    /// Elapsed time of the call
    pub fn elapsed(&self) -> Duration {
        self.result.elapsed
    }
}

/// Ordered results of one comparison run, in measurement order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BenchmarkReport {
    entries: Vec<ReportEntry>,
}

impl BenchmarkReport {
    /// Empty report
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry; insertion order is display order
    pub fn push(&mut self, entry: ReportEntry) {
        self.entries.push(entry);
    }

    /// Entries in measurement order
    pub fn entries(&self) -> &[ReportEntry] {
        &self.entries
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no candidate has been measured
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry to compare the others against: the first reference, else the first entry
    pub fn baseline(&self) -> Option<&ReportEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == CandidateKind::Reference)
            .or_else(|| self.entries.first())
    }

    /// Whether every entry returned the same values
    pub fn values_agree(&self) -> bool {
        self.entries
            .windows(2)
            .all(|w| w[0].result.values == w[1].result.values)
    }
}

impl IntoIterator for BenchmarkReport {
    type Item = ReportEntry;
    type IntoIter = std::vec::IntoIter<ReportEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
