//! Comparison Reporter
//!
//! Measures candidates one after another and writes each line as soon as
//! its measurement completes.
//!
//! ## Data Flow
//!
//! ```text
//! Candidate (module)                     Candidate (reference)
//!        │                                      │
//!        ▼                                      │
//! ┌──────────────┐                              │
//! │ ModuleLoader │  read → compile → instantiate│
//! └──────┬───────┘                              │
//!        ▼                                      ▼
//! ┌──────────────┐                      ┌──────────────┐
//! │    invoke    │  timed call only     │ invoke_host  │
//! └──────┬───────┘                      └──────┬───────┘
//!        └──────────────┬──────────────────────┘
//!                       ▼
//!            ReportEntry → line written + flushed
//! ```
//!
//! Candidates never run concurrently: parallel measurements would share
//! cores and distort wall-clock times.

use anyhow::Context;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::time::Duration;
use tracing::{info, warn};
use wasmbench_core::{BinarySource, ExecutableHandle, ModuleLoader, Value, invoke, invoke_host};
use wasmbench_report::{BenchmarkReport, CandidateKind, ReportEntry, format_line};

use crate::plan::{Candidate, CandidateSource};

/// Runs a comparison and emits one line per candidate
pub struct ComparisonReporter<W: Write> {
    loader: ModuleLoader,
    out: W,
    show_cycles: bool,
    progress: bool,
    pin_cpu: Option<usize>,
}

impl<W: Write> ComparisonReporter<W> {
    /// Reporter writing lines to `out`
    pub fn new(loader: ModuleLoader, out: W) -> Self {
        Self {
            loader,
            out,
            show_cycles: false,
            progress: false,
            pin_cpu: None,
        }
    }

    /// Append cycle counts to each line
    pub fn show_cycles(mut self, show: bool) -> Self {
        self.show_cycles = show;
        self
    }

    /// Show a spinner on stderr while modules compile
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    /// Pin the measuring thread to `cpu` before the first measurement
    pub fn pin_cpu(mut self, cpu: Option<usize>) -> Self {
        self.pin_cpu = cpu;
        self
    }

    /// Consume the reporter and return the output sink
    pub fn into_inner(self) -> W {
        self.out
    }

    /// Measure every candidate in order.
    ///
    /// The first failure aborts the run; lines for candidates measured
    /// before it have already been written.
    pub async fn compare(
        &mut self,
        candidates: &[Candidate],
        export: &str,
        args: &[Value],
    ) -> anyhow::Result<BenchmarkReport> {
        if let Some(cpu) = self.pin_cpu {
            if let Err(e) = wasmbench_core::pin_to_cpu(cpu) {
                warn!(cpu, error = %e, "failed to pin measuring thread");
            }
        }

        let mut report = BenchmarkReport::new();
        for candidate in candidates {
            let entry = self
                .measure(candidate, export, args)
                .await
                .with_context(|| format!("candidate '{}'", candidate.label))?;
            self.emit(&entry)?;
            report.push(entry);
        }
        Ok(report)
    }

    /// Load a single module and invoke `export` once
    pub async fn run_single(
        &mut self,
        label: &str,
        source: &BinarySource,
        export: &str,
        args: &[Value],
    ) -> anyhow::Result<ReportEntry> {
        let candidate = Candidate::module(label, source.clone());
        let entry = self
            .measure(&candidate, export, args)
            .await
            .with_context(|| format!("module {}", source.path().display()))?;
        self.emit(&entry)?;
        Ok(entry)
    }

    async fn measure(
        &self,
        candidate: &Candidate,
        export: &str,
        args: &[Value],
    ) -> anyhow::Result<ReportEntry> {
        info!(label = %candidate.label, source = %candidate.describe(), "measuring candidate");

        let (kind, result) = match &candidate.source {
            CandidateSource::Module(source) => {
                let mut handle = self.load(source).await?;
                (CandidateKind::Module, invoke(&mut handle, export, args)?)
            }
            CandidateSource::Reference(host) => {
                (CandidateKind::Reference, invoke_host(host, args)?)
            }
        };

        Ok(ReportEntry {
            label: candidate.label.clone(),
            kind,
            computation: export.to_string(),
            args: args.to_vec(),
            result,
        })
    }

    async fn load(&self, source: &BinarySource) -> wasmbench_core::Result<ExecutableHandle> {
        let spinner = self.progress.then(|| {
            let pb = ProgressBar::new_spinner();
            pb.set_style(
                ProgressStyle::default_spinner()
                    .template("{spinner:.green} {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_spinner()),
            );
            pb.set_message(format!("compiling {}", source.path().display()));
            pb.enable_steady_tick(Duration::from_millis(80));
            pb
        });

        let handle = self.loader.load(source).await;

        if let Some(pb) = spinner {
            pb.finish_and_clear();
        }
        handle
    }

    fn emit(&mut self, entry: &ReportEntry) -> anyhow::Result<()> {
        writeln!(self.out, "{}", format_line(entry, self.show_cycles))?;
        self.out.flush()?;
        Ok(())
    }
}
