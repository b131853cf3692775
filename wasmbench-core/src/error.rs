//! Harness errors
//!
//! Every failure aborts the remaining comparison; none of these are retried.

use std::path::PathBuf;
use thiserror::Error;

use crate::value::ValueType;

/// Errors raised while loading, resolving or invoking a module export
#[derive(Debug, Error)]
pub enum HarnessError {
    /// Module bytes could not be read from the source
    #[error("failed to read module {}: {source}", path.display())]
    Load {
        /// Source that was being read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// Bytes were read but are not a valid module for the runtime
    #[error("failed to compile module {}: {message}", path.display())]
    Compile {
        /// Source the bytes came from
        path: PathBuf,
        /// Runtime diagnostic
        message: String,
    },

    /// Module compiled but could not be bound to a fresh instance
    #[error("failed to instantiate module {}: {message}", path.display())]
    Instantiate {
        /// Source the module came from
        path: PathBuf,
        /// Runtime diagnostic
        message: String,
    },

    /// Requested export is missing or is not a function
    #[error("export not found: {export}")]
    ExportNotFound {
        /// Requested export name
        export: String,
    },

    /// Arguments do not match the export's parameter list
    #[error("signature mismatch for {export}: expected ({}), got ({})", join_types(expected), join_types(found))]
    SignatureMismatch {
        /// Export name
        export: String,
        /// Parameter types declared by the export
        expected: Vec<ValueType>,
        /// Types of the supplied arguments
        found: Vec<ValueType>,
    },

    /// Export uses a value type the harness cannot pass or return
    #[error("export {export} uses unsupported value type {ty}")]
    UnsupportedType {
        /// Export name
        export: String,
        /// Runtime type name
        ty: String,
    },

    /// Export trapped during execution
    #[error("invocation of {export} failed: {message}")]
    Invocation {
        /// Export name
        export: String,
        /// Trap description
        message: String,
    },

    /// Runtime engine could not be configured
    #[error("engine configuration error: {0}")]
    Engine(String),

    /// Background compile task panicked or was cancelled
    #[error("loader task failed: {0}")]
    LoaderTask(#[from] tokio::task::JoinError),
}

fn join_types(types: &[ValueType]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Result alias for harness operations
pub type Result<T> = std::result::Result<T, HarnessError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_mismatch_message() {
        let err = HarnessError::SignatureMismatch {
            export: "fib".to_string(),
            expected: vec![ValueType::I32],
            found: vec![ValueType::I64, ValueType::F64],
        };
        assert_eq!(
            err.to_string(),
            "signature mismatch for fib: expected (i32), got (i64, f64)"
        );
    }

    #[test]
    fn test_load_error_names_path() {
        let err = HarnessError::Load {
            path: PathBuf::from("demos/wasm/missing.wasm"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "not found"),
        };
        assert!(err.to_string().contains("demos/wasm/missing.wasm"));
    }
}
