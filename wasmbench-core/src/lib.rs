#![warn(missing_docs)]
//! wasmbench Core - Load, Resolve, Invoke
//!
//! This crate provides the measurement path of the harness:
//! - `ModuleLoader` compiles module bytes and instantiates them (two phases)
//! - `ExecutableHandle` exposes a typed export mapping
//! - `invoke` / `invoke_host` time exactly one call
//! - High-precision timing (RDTSC with Instant pairing)

mod error;
mod invoke;
mod loader;
mod measure;
mod value;

pub use error::{HarnessError, Result};
pub use invoke::{HostFunction, InvocationResult, invoke, invoke_host};
pub use loader::{
    BinarySource, EngineSettings, ExecutableHandle, ExecutableModule, ExportedFunction,
    ModuleLoader, OptLevel,
};
/// Whether this platform provides hardware cycle counters (x86_64 RDTSCP or AArch64 CNTVCT_EL0).
/// When `false`, cycle counts are reported as 0.
pub use measure::HAS_CYCLE_COUNTER;
pub use measure::{Timer, pin_to_cpu};
pub use value::{Signature, Value, ValueType};
