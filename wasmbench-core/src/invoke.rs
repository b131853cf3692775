//! Timed Invoker
//!
//! Resolves an export, validates the arguments, then times the call and
//! nothing else. Lookup, argument checks and result buffer allocation all
//! happen before [`Timer::start`].
//!
//! Exports shaped `(i32) -> i32` are called through a pre-typed
//! [`wasmtime::TypedFunc`], so the timed window holds no per-call type
//! checks. Other shapes go through [`wasmtime::Func::call`], which still
//! validates and lowers its `Val` arguments inside the window.

use std::time::Duration;

use tracing::debug;
use wasmtime::Val;

use crate::error::{HarnessError, Result};
use crate::loader::ExecutableHandle;
use crate::measure::{self, Timer};
use crate::value::{Signature, Value, ValueType};

/// Returned values and elapsed time of one timed call
#[derive(Debug, Clone, PartialEq)]
pub struct InvocationResult {
    /// Values returned by the call, in order
    pub values: Vec<Value>,
    /// Wall-clock time of the call
    pub elapsed: Duration,
    /// Cycle counter delta (0 without a hardware counter)
    pub cycles: u64,
}

impl InvocationResult {
    /// First returned value, if any
    pub fn value(&self) -> Option<Value> {
        self.values.first().copied()
    }

    /// Elapsed time in fractional milliseconds
    pub fn elapsed_ms(&self) -> f64 {
        self.elapsed.as_secs_f64() * 1000.0
    }
}

/// Invoke `export` on `handle` once, timing only the call.
///
/// Fails with [`HarnessError::ExportNotFound`] or
/// [`HarnessError::SignatureMismatch`] before any timing starts, and with
/// [`HarnessError::Invocation`] if the export traps.
pub fn invoke(
    handle: &mut ExecutableHandle,
    export: &str,
    args: &[Value],
) -> Result<InvocationResult> {
    let function = handle.export(export)?.clone();
    function.signature().check_args(export, args)?;

    let func = function.func();
    let store = handle.store_mut();
    let trap = |e: wasmtime::Error| HarnessError::Invocation {
        export: export.to_string(),
        message: format!("{e:#}"),
    };

    if let ([Value::I32(arg)], [ValueType::I32]) = (args, function.signature().results.as_slice())
    {
        let typed = func.typed::<i32, i32>(&*store).map_err(trap)?;
        let arg = *arg;

        let timer = Timer::start();
        let outcome = typed.call(&mut *store, arg);
        let (elapsed, cycles) = timer.stop();

        let value = outcome.map_err(trap)?;
        debug!(export, elapsed_ns = elapsed.as_nanos() as u64, cycles, "invoked export");
        return Ok(InvocationResult {
            values: vec![Value::I32(value)],
            elapsed,
            cycles,
        });
    }

    let params: Vec<Val> = args.iter().map(|a| a.to_runtime()).collect();
    let mut results: Vec<Val> = function
        .signature()
        .results
        .iter()
        .map(|t| t.zero().to_runtime())
        .collect();

    let timer = Timer::start();
    let outcome = func.call(&mut *store, &params, &mut results);
    let (elapsed, cycles) = timer.stop();

    outcome.map_err(trap)?;

    let values = results
        .iter()
        .map(|v| {
            Value::from_runtime(v).ok_or_else(|| HarnessError::UnsupportedType {
                export: export.to_string(),
                ty: format!("{v:?}"),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(export, elapsed_ns = elapsed.as_nanos() as u64, cycles, "invoked export");

    Ok(InvocationResult {
        values,
        elapsed,
        cycles,
    })
}

/// A computation implemented directly in Rust
#[derive(Debug, Clone, Copy)]
pub struct HostFunction {
    /// Registry name
    pub name: &'static str,
    /// Parameter types
    pub params: &'static [ValueType],
    /// Result type
    pub result: ValueType,
    /// Implementation; receives arguments already checked against `params`.
    /// An `Err` is reported like a module trap.
    pub func: fn(&[Value]) -> std::result::Result<Value, String>,
}

impl HostFunction {
    /// Signature in the same form as module exports
    pub fn signature(&self) -> Signature {
        Signature {
            params: self.params.to_vec(),
            results: vec![self.result],
        }
    }
}

/// Invoke a host function under the same timing boundary as [`invoke`]
pub fn invoke_host(host: &HostFunction, args: &[Value]) -> Result<InvocationResult> {
    host.signature().check_args(host.name, args)?;
    let func = host.func;

    let (outcome, elapsed, cycles) = measure::time(|| func(std::hint::black_box(args)));
    let value = outcome.map_err(|message| HarnessError::Invocation {
        export: host.name.to_string(),
        message,
    })?;

    debug!(
        host = host.name,
        elapsed_ns = elapsed.as_nanos() as u64,
        cycles,
        "invoked host function"
    );

    Ok(InvocationResult {
        values: vec![value],
        elapsed,
        cycles,
    })
}
