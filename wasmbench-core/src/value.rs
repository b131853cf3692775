//! Values and signatures exchanged with module exports
//!
//! Only the four numeric WebAssembly types cross the harness boundary.

use std::fmt;
use std::str::FromStr;

use wasmtime::{FuncType, Val, ValType};

use crate::error::{HarnessError, Result};

/// Numeric value type accepted or returned by an export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// 32-bit integer
    I32,
    /// 64-bit integer
    I64,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl ValueType {
    /// Map a runtime type onto a harness type, if supported
    pub fn from_runtime(ty: &ValType) -> Option<Self> {
        match ty {
            ValType::I32 => Some(ValueType::I32),
            ValType::I64 => Some(ValueType::I64),
            ValType::F32 => Some(ValueType::F32),
            ValType::F64 => Some(ValueType::F64),
            _ => None,
        }
    }

    /// Zero value of this type, used to size result buffers
    pub fn zero(self) -> Value {
        match self {
            ValueType::I32 => Value::I32(0),
            ValueType::I64 => Value::I64(0),
            ValueType::F32 => Value::F32(0.0),
            ValueType::F64 => Value::F64(0.0),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
        };
        f.write_str(name)
    }
}

/// A numeric argument or return value
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    /// 32-bit integer
    I32(i32),
    /// 64-bit integer
    I64(i64),
    /// 32-bit float
    F32(f32),
    /// 64-bit float
    F64(f64),
}

impl Value {
    /// Type of this value
    pub fn ty(&self) -> ValueType {
        match self {
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
        }
    }

    /// Convert into the runtime representation
    pub fn to_runtime(self) -> Val {
        match self {
            Value::I32(v) => Val::I32(v),
            Value::I64(v) => Val::I64(v),
            Value::F32(v) => Val::F32(v.to_bits()),
            Value::F64(v) => Val::F64(v.to_bits()),
        }
    }

    /// Convert from the runtime representation, if numeric
    pub fn from_runtime(val: &Val) -> Option<Self> {
        match val {
            Val::I32(v) => Some(Value::I32(*v)),
            Val::I64(v) => Some(Value::I64(*v)),
            Val::F32(bits) => Some(Value::F32(f32::from_bits(*bits))),
            Val::F64(bits) => Some(Value::F64(f64::from_bits(*bits))),
            _ => None,
        }
    }

    /// Integer view of the value (floats are truncated)
    pub fn as_i64(&self) -> i64 {
        match *self {
            Value::I32(v) => v as i64,
            Value::I64(v) => v,
            Value::F32(v) => v as i64,
            Value::F64(v) => v as i64,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::I32(v) => write!(f, "{v}"),
            Value::I64(v) => write!(f, "{v}"),
            Value::F32(v) => write!(f, "{v}"),
            Value::F64(v) => write!(f, "{v}"),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::I32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::I64(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F32(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
    }
}

/// Parse a literal such as `30`, `5000000000`, `30i64`, `1.5` or `1.5f32`.
///
/// Unsuffixed integers become `i32` when they fit and `i64` otherwise;
/// unsuffixed decimals become `f64`.
impl FromStr for Value {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || format!("invalid value literal: {s:?}");

        for (suffix, ty) in [
            ("i32", ValueType::I32),
            ("i64", ValueType::I64),
            ("f32", ValueType::F32),
            ("f64", ValueType::F64),
        ] {
            if let Some(num) = s.strip_suffix(suffix) {
                return match ty {
                    ValueType::I32 => num.parse().map(Value::I32).map_err(|_| invalid()),
                    ValueType::I64 => num.parse().map(Value::I64).map_err(|_| invalid()),
                    ValueType::F32 => num.parse().map(Value::F32).map_err(|_| invalid()),
                    ValueType::F64 => num.parse().map(Value::F64).map_err(|_| invalid()),
                };
            }
        }

        if let Ok(v) = s.parse::<i64>() {
            return Ok(i32::try_from(v).map(Value::I32).unwrap_or(Value::I64(v)));
        }
        s.parse::<f64>().map(Value::F64).map_err(|_| invalid())
    }
}

/// Statically described parameter and result types of an export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    /// Parameter types in order
    pub params: Vec<ValueType>,
    /// Result types in order
    pub results: Vec<ValueType>,
}

impl Signature {
    /// Build a signature from a runtime function type.
    ///
    /// Fails with [`HarnessError::UnsupportedType`] when any parameter or
    /// result is not one of the numeric types.
    pub fn from_func_type(export: &str, ty: &FuncType) -> Result<Self> {
        let convert = |t: ValType| {
            ValueType::from_runtime(&t).ok_or_else(|| HarnessError::UnsupportedType {
                export: export.to_string(),
                ty: t.to_string(),
            })
        };
        Ok(Self {
            params: ty.params().map(convert).collect::<Result<_>>()?,
            results: ty.results().map(convert).collect::<Result<_>>()?,
        })
    }

    /// Check that `args` matches the parameter list exactly
    pub fn check_args(&self, export: &str, args: &[Value]) -> Result<()> {
        let found: Vec<ValueType> = args.iter().map(Value::ty).collect();
        if found != self.params {
            return Err(HarnessError::SignatureMismatch {
                export: export.to_string(),
                expected: self.params.clone(),
                found,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |types: &[ValueType]| {
            types
                .iter()
                .map(|t| t.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "({})", join(&self.params))?;
        match self.results.len() {
            0 => Ok(()),
            1 => write!(f, " -> {}", self.results[0]),
            _ => write!(f, " -> ({})", join(&self.results)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_unsuffixed_literals() {
        assert_eq!("30".parse::<Value>().unwrap(), Value::I32(30));
        assert_eq!("-7".parse::<Value>().unwrap(), Value::I32(-7));
        assert_eq!(
            "5000000000".parse::<Value>().unwrap(),
            Value::I64(5_000_000_000)
        );
        assert_eq!("1.5".parse::<Value>().unwrap(), Value::F64(1.5));
    }

    #[test]
    fn test_parse_suffixed_literals() {
        assert_eq!("30i64".parse::<Value>().unwrap(), Value::I64(30));
        assert_eq!("2.5f32".parse::<Value>().unwrap(), Value::F32(2.5));
        assert_eq!("3f64".parse::<Value>().unwrap(), Value::F64(3.0));
        assert!("abc".parse::<Value>().is_err());
        assert!("1.5i32".parse::<Value>().is_err());
    }

    #[test]
    fn test_runtime_round_trip_preserves_float_bits() {
        let v = Value::F64(-0.0);
        let back = Value::from_runtime(&v.to_runtime()).unwrap();
        match back {
            Value::F64(f) => assert!(f.is_sign_negative()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_check_args() {
        let sig = Signature {
            params: vec![ValueType::I32],
            results: vec![ValueType::I32],
        };
        assert!(sig.check_args("fib", &[Value::I32(30)]).is_ok());
        assert!(matches!(
            sig.check_args("fib", &[Value::I64(30)]),
            Err(HarnessError::SignatureMismatch { .. })
        ));
        assert!(matches!(
            sig.check_args("fib", &[]),
            Err(HarnessError::SignatureMismatch { .. })
        ));
    }

    #[test]
    fn test_signature_display() {
        let sig = Signature {
            params: vec![ValueType::I32, ValueType::F64],
            results: vec![ValueType::I64],
        };
        assert_eq!(sig.to_string(), "(i32, f64) -> i64");

        let unit = Signature {
            params: vec![],
            results: vec![],
        };
        assert_eq!(unit.to_string(), "()");
    }
}
