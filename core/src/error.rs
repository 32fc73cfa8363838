//! Error types for Sudomail Core

/// Result type alias for Sudomail operations
pub type SudomailResult<T> = Result<T, SudomailError>;

/// Main error type for Sudomail Core
#[derive(Debug, thiserror::Error)]
pub enum SudomailError {
    /// The MIME builder rejected the message contents during serialization
    #[error("Invalid email contents: {0}")]
    InvalidEmailContents(String),

    /// An RFC2047 encoded word declared an encoding scheme other than Base64
    #[error("Unsupported header encoding: {0}")]
    UnsupportedHeaderEncoding(String),

    /// MIME parsing errors
    #[error("MIME parsing error: {0}")]
    Mime(#[from] mailparse::MailParseError),

    /// Base64 decoding errors
    #[error("Base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SudomailError {
    /// Create a new invalid-email-contents error
    pub fn invalid_email_contents(msg: impl Into<String>) -> Self {
        Self::InvalidEmailContents(msg.into())
    }

    /// Create a new unsupported-header-encoding error
    pub fn unsupported_header_encoding(msg: impl Into<String>) -> Self {
        Self::UnsupportedHeaderEncoding(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this error came out of the wire codec itself rather than a
    /// wrapped library error
    pub fn is_codec_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidEmailContents(_) | Self::UnsupportedHeaderEncoding(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_email_contents_message() {
        let err = SudomailError::invalid_email_contents("missing sender");
        assert_eq!(err.to_string(), "Invalid email contents: missing sender");
        assert!(err.is_codec_error());
    }

    #[test]
    fn test_unsupported_header_encoding_message() {
        let err = SudomailError::unsupported_header_encoding("Q");
        assert_eq!(err.to_string(), "Unsupported header encoding: Q");
        assert!(err.is_codec_error());
    }
}
