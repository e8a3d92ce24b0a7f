use thiserror::Error;

/// Error for hash strings that cannot be parsed, or that parse but are
/// internally inconsistent.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormatError {
    #[error("don't know how to parse {0:?}, maybe clobbered?")]
    Unrecognized(String),

    #[error("not in structured hash format: {0:?}")]
    NotStructured(String),

    #[error("parameters include conflicting values for {key:?}: {first:?} versus {second:?}")]
    ConflictingParam {
        key: String,
        first: String,
        second: String,
    },

    #[error("malformed base64 field of {0} characters")]
    MalformedLength(usize),

    #[error("invalid base64 field {0:?}")]
    InvalidBase64(String),

    #[error("invalid hex field {0:?}")]
    InvalidHex(String),

    #[error("{scheme} hash is missing parameter {key:?}")]
    MissingParam { scheme: &'static str, key: String },

    #[error("{scheme} hash has unexpected parameter {key:?}")]
    UnexpectedParam { scheme: &'static str, key: String },

    #[error("{scheme} parameters out of order: expected {expected}")]
    ParamOrder {
        scheme: &'static str,
        expected: String,
    },

    #[error("{scheme} parameter {key:?} is not an integer")]
    NotAnInteger { scheme: &'static str, key: String },

    #[error("{scheme} hash has an empty checksum")]
    EmptyChecksum { scheme: &'static str },

    #[error("{scheme} hash has unexpected identifier {id:?}")]
    UnexpectedId { scheme: &'static str, id: String },
}

/// Top-level error for all hashing and verification operations
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HashError {
    #[error("format error: {0}")]
    Format(#[from] FormatError),

    #[error("don't know how to generate {0} hash")]
    UnsupportedAlgorithm(String),

    #[error("{param} = {value} out of range (expected {expected})")]
    OutOfRange {
        param: String,
        value: String,
        expected: String,
    },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("crypto primitive failed: {0}")]
    Crypto(String),

    #[error("random salt generation failed: {0}")]
    Rng(String),
}

impl HashError {
    pub(crate) fn out_of_range(
        param: impl Into<String>,
        value: impl ToString,
        expected: impl Into<String>,
    ) -> Self {
        HashError::OutOfRange {
            param: param.into(),
            value: value.to_string(),
            expected: expected.into(),
        }
    }

    /// True for syntactic or semantic rejection of a hash string.
    pub fn is_format(&self) -> bool {
        matches!(self, HashError::Format(_))
    }

    /// True when a numeric parameter is outside its legal domain.
    pub fn is_out_of_range(&self) -> bool {
        matches!(self, HashError::OutOfRange { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_converts() {
        let error: HashError = FormatError::MalformedLength(5).into();
        assert!(error.is_format());
        assert!(!error.is_out_of_range());
        assert_eq!(
            error.to_string(),
            "format error: malformed base64 field of 5 characters"
        );
    }

    #[test]
    fn test_out_of_range_message() {
        let error = HashError::out_of_range("cost", 3, "4..=31");
        assert!(error.is_out_of_range());
        assert_eq!(error.to_string(), "cost = 3 out of range (expected 4..=31)");
    }
}
