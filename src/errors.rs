use std::time::Duration;

/// All error types that can occur when interacting with Hue bridges.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input was not a 6-hex-digit color string.
    #[error("invalid color string: {0:?}")]
    InvalidColorFormat(String),

    /// The chromaticity cannot be mapped back to RGB (y is zero, so the
    /// luminance scale is undefined).
    #[error("invalid chromaticity ({x}, {y})")]
    InvalidChromaticity { x: f64, y: f64 },

    /// A device description was fetched but not declared as XML.
    #[error("non-XML content was returned: {0:?}")]
    UnexpectedContentType(Option<String>),

    /// The fetched device description does not describe a Hue bridge.
    #[error("{0} doesn't appear to be a Hue bridge")]
    NotAHueBridge(String),

    /// The bridge rejected the pairing request with a non-retryable error.
    #[error("pairing failed: {0}")]
    PairingFailed(String),

    /// The link button was not pressed before the pairing deadline passed.
    #[error("pairing timed out after {0:?} without the link button being pressed")]
    PairingTimedOut(Duration),

    /// The bridge returned a body that could not be parsed as JSON, even
    /// after the trailing-brace repair.
    #[error("malformed bridge response: {0:?}")]
    MalformedResponse(serde_json::Error),

    /// Attempted an authenticated call against a bridge that has never
    /// been issued a username.
    #[error("bridge {0} has not been paired")]
    NotPaired(String),

    /// An HTTP request to a bridge failed at the transport level.
    #[error("http {action} error: {err}")]
    Http {
        action: String,
        err: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// Create a new HTTP transport error
    pub fn http(action: &str, err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Error::Http {
            action: action.to_string(),
            err: Box::new(err),
        }
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
