//! Comparison Planner
//!
//! Turns configured candidates into resolved [`Candidate`]s.
//!
//! Filtering: an optional regex on the candidate label.
//!
//! Ordering: configuration order is kept as-is; it is the measurement and
//! display order.

use anyhow::{Context, bail};
use regex::Regex;
use std::path::Path;
use wasmbench_core::{BinarySource, HostFunction};

use crate::config::CandidateConfig;
use crate::references;

/// How a candidate produces its value
#[derive(Debug, Clone)]
pub enum CandidateSource {
    /// Load this module and call the scenario export
    Module(BinarySource),
    /// Call this host function directly
    Reference(HostFunction),
}

/// A labelled candidate ready to be measured
#[derive(Debug, Clone)]
pub struct Candidate {
    /// Display label
    pub label: String,
    /// Module or reference
    pub source: CandidateSource,
}

impl Candidate {
    /// Module candidate
    pub fn module(label: impl Into<String>, source: BinarySource) -> Self {
        Self {
            label: label.into(),
            source: CandidateSource::Module(source),
        }
    }

    /// Reference candidate
    pub fn reference(label: impl Into<String>, host: HostFunction) -> Self {
        Self {
            label: label.into(),
            source: CandidateSource::Reference(host),
        }
    }

    /// Short description of where the candidate comes from
    pub fn describe(&self) -> String {
        match &self.source {
            CandidateSource::Module(src) => src.path().display().to_string(),
            CandidateSource::Reference(host) => format!("reference `{}`", host.name),
        }
    }
}

/// Resolve one configured candidate against `base_dir`
pub fn resolve_candidate(config: &CandidateConfig, base_dir: &Path) -> anyhow::Result<Candidate> {
    match (&config.path, &config.reference) {
        (Some(path), None) => Ok(Candidate::module(
            &config.label,
            BinarySource::resolve(base_dir, path),
        )),
        (None, Some(name)) => {
            let host = references::lookup(name).with_context(|| {
                let known: Vec<_> = references::available().iter().map(|r| r.name).collect();
                format!(
                    "candidate '{}': unknown reference '{}' (available: {})",
                    config.label,
                    name,
                    known.join(", ")
                )
            })?;
            Ok(Candidate::reference(&config.label, host))
        }
        (Some(_), Some(_)) => bail!(
            "candidate '{}': set either `path` or `reference`, not both",
            config.label
        ),
        (None, None) => bail!(
            "candidate '{}': one of `path` or `reference` is required",
            config.label
        ),
    }
}

/// Build the ordered candidate list, keeping only labels matching `filter`
pub fn build_plan(
    configs: &[CandidateConfig],
    base_dir: &Path,
    filter: Option<&Regex>,
) -> anyhow::Result<Vec<Candidate>> {
    configs
        .iter()
        .filter(|c| filter.is_none_or(|re| re.is_match(&c.label)))
        .map(|c| resolve_candidate(c, base_dir))
        .collect()
}
