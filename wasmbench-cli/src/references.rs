//! Built-in reference implementations
//!
//! Host-language baselines that module candidates are compared against.
//! They are written as plainly as the module sources, with no memoization.

use wasmbench_core::{HostFunction, Value, ValueType};

/// Naive doubly-recursive Fibonacci: `fib(0) = 0`, `fib(1) = 1`.
pub fn fib(n: i32) -> i32 {
    if n < 2 {
        return n;
    }
    fib(n - 1).wrapping_add(fib(n - 2))
}

/// Deepest `fib` recursion the host stack is trusted with. Modules hit
/// Wasmtime's own stack limit and trap; the reference refuses up front.
pub const MAX_FIB_DEPTH: i32 = 4096;

fn fib_entry(args: &[Value]) -> Result<Value, String> {
    let n = args[0].as_i64() as i32;
    if n > MAX_FIB_DEPTH {
        return Err(format!(
            "fib({n}) exceeds the host recursion limit of {MAX_FIB_DEPTH}"
        ));
    }
    Ok(Value::I32(fib(n)))
}

const REFERENCES: &[HostFunction] = &[HostFunction {
    name: "fib",
    params: &[ValueType::I32],
    result: ValueType::I32,
    func: fib_entry,
}];

/// All registered references
pub fn available() -> &'static [HostFunction] {
    REFERENCES
}

/// Look up a reference by name
pub fn lookup(name: &str) -> Option<HostFunction> {
    REFERENCES.iter().find(|r| r.name == name).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasmbench_core::{HarnessError, invoke_host};

    #[test]
    fn test_fib_values() {
        let expected = [0, 1, 1, 2, 3, 5, 8, 13, 21, 34, 55];
        for (n, want) in expected.iter().enumerate() {
            assert_eq!(fib(n as i32), *want);
        }
        assert_eq!(fib(30), 832040);
    }

    #[test]
    fn test_negative_input_is_base_case() {
        assert_eq!(fib(-3), -3);
    }

    #[test]
    fn test_lookup() {
        let reference = lookup("fib").unwrap();
        let result = invoke_host(&reference, &[Value::I32(20)]).unwrap();
        assert_eq!(result.value(), Some(Value::I32(6765)));
        assert!(lookup("fact").is_none());
        assert_eq!(available().len(), 1);
    }

    #[test]
    fn test_deep_recursion_is_refused() {
        let reference = lookup("fib").unwrap();
        let err = invoke_host(&reference, &[Value::I32(1_000_000)]).unwrap_err();
        match err {
            HarnessError::Invocation { export, message } => {
                assert_eq!(export, "fib");
                assert!(message.contains("recursion limit"), "{message}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
