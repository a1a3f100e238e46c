use thiserror::Error;

/// PBaaS transaction codec and signature-hash errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PbaasError {
    #[error("expected input hash to have length 32, got length {0}")]
    InvalidInputHash(usize),

    #[error("unsupported Zcash transaction version {0}")]
    UnsupportedVersion(u32),

    #[error("unsupported shielded feature: {0}")]
    UnsupportedShieldedFeature(&'static str),

    #[error("transaction has unexpected data: consumed {consumed} of {total} bytes")]
    TrailingData { consumed: usize, total: usize },

    #[error("input index {index} is out of range ({count} inputs)")]
    InputIndexOutOfRange { index: usize, count: usize },

    #[error("signature digest unsupported for transaction version {0}")]
    UnsupportedDigestVersion(u32),

    #[error("unexpected end of data: needed {needed} bytes at offset {offset}")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("invalid script: {0}")]
    InvalidScript(String),

    #[error("invalid network config: {0}")]
    InvalidConfig(String),
}

impl From<hex::FromHexError> for PbaasError {
    fn from(e: hex::FromHexError) -> Self {
        PbaasError::InvalidHex(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_invalid_input_hash() {
        let err = PbaasError::InvalidInputHash(30);
        assert_eq!(
            err.to_string(),
            "expected input hash to have length 32, got length 30"
        );
    }

    #[test]
    fn display_unsupported_version() {
        let err = PbaasError::UnsupportedVersion(2147483647);
        assert_eq!(
            err.to_string(),
            "unsupported Zcash transaction version 2147483647"
        );
    }

    #[test]
    fn display_trailing_data() {
        let err = PbaasError::TrailingData {
            consumed: 10,
            total: 11,
        };
        assert!(err.to_string().starts_with("transaction has unexpected data"));
        assert!(err.to_string().contains("11"));
    }

    #[test]
    fn display_input_index_out_of_range() {
        let err = PbaasError::InputIndexOutOfRange { index: 5, count: 2 };
        assert_eq!(err.to_string(), "input index 5 is out of range (2 inputs)");
    }

    #[test]
    fn hex_error_converts() {
        let err: PbaasError = hex::decode("zz").unwrap_err().into();
        assert!(matches!(err, PbaasError::InvalidHex(_)));
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn std::error::Error> =
            Box::new(PbaasError::UnsupportedShieldedFeature("joinSplits"));
        assert!(err.to_string().contains("joinSplits"));
    }
}
