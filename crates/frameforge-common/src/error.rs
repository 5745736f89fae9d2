//! Error types used throughout frameforge.
//!
//! Every failure a conversion can hit funnels into [`Error`]. Pipeline
//! failures reach the caller wrapped in [`Error::ConversionFailed`], which
//! keeps the original cause reachable through [`std::error::Error::source`].

/// Unified error type for frameforge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The host lacks one of the required encode/decode primitives.
    #[error("media conversion is not supported in this environment")]
    UnsupportedEnvironment,

    /// The media kind of the input could not be resolved.
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),

    /// The encoder rejected the resolved configuration.
    #[error("unsupported codec {codec}: {message}")]
    UnsupportedCodec {
        /// Codec identifier that was rejected.
        codec: String,
        /// Why it was rejected.
        message: String,
    },

    /// Source media could not be decoded.
    #[error("decode failed: {0}")]
    DecodeFailure(String),

    /// The encoder reported an error on its error channel.
    #[error("encode failed: {0}")]
    EncodeFailure(String),

    /// Emitted output could not be assembled into an artifact.
    #[error("assembly failed: {0}")]
    AssemblyFailure(String),

    /// A conversion aborted; `cause` is the original failure.
    #[error("conversion failed: {cause}")]
    ConversionFailed {
        /// The failure that aborted the conversion.
        #[source]
        cause: Box<Error>,
    },

    /// The conversion was cancelled by the caller.
    #[error("conversion cancelled")]
    Cancelled,

    /// Invalid input was provided.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// An external tool failed.
    #[error("tool error [{tool}]: {message}")]
    Tool {
        /// Name of the tool that failed.
        tool: String,
        /// Human-readable error description.
        message: String,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an unsupported file type error.
    pub fn unsupported_file_type<S: Into<String>>(msg: S) -> Self {
        Self::UnsupportedFileType(msg.into())
    }

    /// Create an unsupported codec error.
    pub fn unsupported_codec(codec: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UnsupportedCodec {
            codec: codec.into(),
            message: message.into(),
        }
    }

    /// Create a decode failure.
    pub fn decode<S: Into<String>>(msg: S) -> Self {
        Self::DecodeFailure(msg.into())
    }

    /// Create an encode failure.
    pub fn encode<S: Into<String>>(msg: S) -> Self {
        Self::EncodeFailure(msg.into())
    }

    /// Create an assembly failure.
    pub fn assembly<S: Into<String>>(msg: S) -> Self {
        Self::AssemblyFailure(msg.into())
    }

    /// Create an invalid input error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create a tool error.
    pub fn tool(tool: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Tool {
            tool: tool.into(),
            message: message.into(),
        }
    }

    /// Wrap a failure as [`Error::ConversionFailed`].
    ///
    /// Already-wrapped errors are returned unchanged so a conversion
    /// produces exactly one wrapper.
    pub fn conversion_failed(cause: Error) -> Self {
        match cause {
            wrapped @ Error::ConversionFailed { .. } => wrapped,
            cause => Self::ConversionFailed {
                cause: Box::new(cause),
            },
        }
    }

    /// The original failure, looking through [`Error::ConversionFailed`].
    pub fn root_cause(&self) -> &Error {
        match self {
            Error::ConversionFailed { cause } => cause.root_cause(),
            other => other,
        }
    }

    /// Whether this error (or its wrapped cause) is a cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self.root_cause(), Error::Cancelled)
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn test_error_display() {
        let err = Error::UnsupportedEnvironment;
        assert_eq!(
            err.to_string(),
            "media conversion is not supported in this environment"
        );

        let err = Error::unsupported_codec("avc1.42001f", "rejected by encoder");
        assert_eq!(
            err.to_string(),
            "unsupported codec avc1.42001f: rejected by encoder"
        );

        let err = Error::decode("truncated header");
        assert_eq!(err.to_string(), "decode failed: truncated header");

        let err = Error::tool("ffmpeg", "exited with status 1");
        assert_eq!(err.to_string(), "tool error [ffmpeg]: exited with status 1");
    }

    #[test]
    fn test_conversion_failed_exposes_cause() {
        let err = Error::conversion_failed(Error::encode("bad frame"));
        assert_eq!(err.to_string(), "conversion failed: encode failed: bad frame");
        assert!(matches!(err.root_cause(), Error::EncodeFailure(_)));

        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("encode failed: bad frame"));
    }

    #[test]
    fn test_conversion_failed_wraps_once() {
        let err = Error::conversion_failed(Error::conversion_failed(Error::Cancelled));
        match &err {
            Error::ConversionFailed { cause } => assert!(matches!(**cause, Error::Cancelled)),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_cancelled());
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = Error::from(io_err);
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_cancelled());
    }
}
