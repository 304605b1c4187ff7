//! Agrogate error types

/// Agrogate error types
#[derive(Debug, thiserror::Error)]
pub enum AgrogateError {
    // Request errors
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    #[error("Invalid value for field: {field}")]
    Validation { field: String },

    #[error("Missing field: {field}")]
    MissingField { field: String },

    #[error("Unknown {domain}: {label}")]
    UnknownCategory { domain: String, label: String },

    // Authentication errors
    #[error("Missing or invalid JWT")]
    MissingToken,

    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),

    #[error("JWT token expired")]
    ExpiredToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User already exists")]
    UserExists,

    // Model errors
    #[error("inference failed: {0}")]
    Inference(String),

    /// The fertilizer model produced a class code outside the encoder's
    /// range. Should not occur with a well-formed artifact.
    #[error("model produced out-of-range class code: {code}")]
    Decode { code: i64 },

    // Collaborator errors
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("empty response from model")]
    EmptyResponse,

    // Configuration errors
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl AgrogateError {
    /// Whether this error is the caller's fault.
    ///
    /// Client errors become 400 responses at the server boundary. Inference
    /// failures are deliberately included: prediction errors are reported as
    /// client errors, and server-error semantics stay reserved for
    /// infrastructure faults.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            AgrogateError::MalformedRequest(_)
                | AgrogateError::Validation { .. }
                | AgrogateError::MissingField { .. }
                | AgrogateError::UnknownCategory { .. }
                | AgrogateError::Inference(_)
        )
    }

    /// Whether this error is an authentication failure (401 at the boundary).
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            AgrogateError::MissingToken
                | AgrogateError::InvalidToken(_)
                | AgrogateError::ExpiredToken
        )
    }
}

impl From<jsonwebtoken::errors::Error> for AgrogateError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;
        match err.kind() {
            ErrorKind::ExpiredSignature => AgrogateError::ExpiredToken,
            _ => AgrogateError::InvalidToken(err.to_string()),
        }
    }
}

/// Result type alias for Agrogate operations
pub type Result<T> = std::result::Result<T, AgrogateError>;
