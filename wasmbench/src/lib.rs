#![warn(missing_docs)]
//! # wasmbench
//!
//! Loads compiled WebAssembly modules, invokes a named export with typed
//! arguments, and times each call against a host-side Rust reference.
//!
//! - **Loading**: read → compile → instantiate, with unknown function imports
//!   linked to trapping stubs
//! - **Typed invocation**: exports are checked against their declared
//!   signature before any call happens
//! - **Tight timing**: only the call itself sits inside the timer
//! - **Ordered reporting**: candidates run one at a time and each line is
//!   written as soon as its measurement completes
//!
//! ## Quick Start
//!
//! ```ignore
//! use wasmbench::prelude::*;
//!
//! # async fn demo() -> wasmbench::Result<()> {
//! let loader = ModuleLoader::default();
//! let mut handle = loader.load(&BinarySource::new("demos/wasm/fib.wasm")).await?;
//! let result = invoke(&mut handle, "fib", &[Value::I32(30)])?;
//! println!("fib(30) = {}", result.values[0]);
//! # Ok(())
//! # }
//! ```
//!
//! The `wasmbench` binary runs the full comparison from a `wasmbench.toml`.

// Re-export core types
pub use wasmbench_core::{
    BinarySource, EngineSettings, ExecutableHandle, ExecutableModule, ExportedFunction,
    HarnessError, HostFunction, InvocationResult, ModuleLoader, OptLevel, Result, Signature,
    Timer, Value, ValueType, invoke, invoke_host,
};

// Re-export report types
pub use wasmbench_report::{
    BenchmarkReport, CandidateKind, ReportEntry, format_args_list, format_line, format_summary,
};

// Re-export comparison driver
pub use wasmbench_cli::{
    Candidate, CandidateSource, ComparisonReporter, WasmbenchConfig, build_plan, lookup_reference,
};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::{
        BinarySource, Candidate, ComparisonReporter, HarnessError, ModuleLoader, Value, invoke,
        invoke_host, lookup_reference,
    };
}

/// Run the wasmbench CLI harness.
///
/// Call this from a binary's `main()`:
/// ```ignore
/// fn main() -> anyhow::Result<()> {
///     wasmbench::run()
/// }
/// ```
pub use wasmbench_cli::run;
