#![warn(missing_docs)]
//! wasmbench Report - Results and Rendering
//!
//! Holds the ordered results of a comparison run and renders them as the
//! plain-text lines the harness prints:
//!
//! ```text
//! Unoptimized fib(30) = 832040 | Time: 11.52 ms
//! ```

mod formatting;
mod report;

pub use formatting::{format_args_list, format_line, format_summary};
pub use report::{BenchmarkReport, CandidateKind, ReportEntry};
