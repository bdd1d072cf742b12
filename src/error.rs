//! 错误码
//!
//! Numeric classification of [`KmeansError`], used as the CLI exit code.

use crate::api::KmeansError;

/// 错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(pub u32);

impl ErrorCode {
    pub const SUCCESS: ErrorCode = ErrorCode(0);
    pub const INVALID_ARG: ErrorCode = ErrorCode(2);
    pub const IO_ERROR: ErrorCode = ErrorCode(4);
    pub const DEVICE_ERROR: ErrorCode = ErrorCode(6);
    pub const VALIDATION_FAILED: ErrorCode = ErrorCode(7);

    /// Configuration errors are detected before Setup
    pub fn is_configuration(&self) -> bool {
        *self == ErrorCode::INVALID_ARG
    }
}

impl KmeansError {
    pub fn code(&self) -> ErrorCode {
        match self {
            KmeansError::InvalidArg(_)
            | KmeansError::InvalidClusterCount { .. }
            | KmeansError::DimensionMismatch { .. }
            | KmeansError::NonFinite { .. }
            | KmeansError::Config(_) => ErrorCode::INVALID_ARG,
            KmeansError::Io(_) => ErrorCode::IO_ERROR,
            KmeansError::Device(_) | KmeansError::StageFailed { .. } | KmeansError::Aborted => {
                ErrorCode::DEVICE_ERROR
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code() {
        let e = KmeansError::InvalidClusterCount { k: 0, n: 10 };
        assert_eq!(e.code(), ErrorCode::INVALID_ARG);
        assert!(e.code().is_configuration());

        let e = KmeansError::Aborted;
        assert_eq!(e.code(), ErrorCode::DEVICE_ERROR);
        assert!(!e.code().is_configuration());
    }
}
