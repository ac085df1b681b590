//! Security error types.

use thiserror::Error;

/// Result type for security operations.
pub type SecurityResult<T> = Result<T, SecurityError>;

/// Errors raised by credential and criteria handling.
#[derive(Debug, Error)]
pub enum SecurityError {
    /// X.509 certificate could not be parsed or is structurally invalid.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Key material could not be parsed or is structurally invalid.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// Algorithm identifier is not supported by this runtime.
    #[error("unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// A component was configured inconsistently.
    #[error("configuration error: {0}")]
    Configuration(String),
}
