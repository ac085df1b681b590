//! SAML error types.

use thiserror::Error;

/// Result type for SAML operations.
pub type SamlResult<T> = Result<T, SamlError>;

/// SAML processing errors.
#[derive(Debug, Error)]
pub enum SamlError {
    /// Message-level processing problem, e.g. the receiver endpoint of the
    /// inbound binding could not be determined.
    #[error("message processing error: {0}")]
    Message(String),

    /// Invalid assertion.
    #[error("invalid assertion: {0}")]
    InvalidAssertion(String),

    /// Assertion conditions not met.
    #[error("assertion conditions not met: {0}")]
    ConditionsNotMet(String),

    /// Assertion expired.
    #[error("assertion expired")]
    AssertionExpired,

    /// Assertion not yet valid.
    #[error("assertion not yet valid")]
    AssertionNotYetValid,

    /// Invalid audience.
    #[error("invalid audience: expected {expected}")]
    InvalidAudience {
        /// The audience URI the relying party expected.
        expected: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        let err = SamlError::Message("no host".to_string());
        assert_eq!(err.to_string(), "message processing error: no host");
        assert_eq!(SamlError::AssertionExpired.to_string(), "assertion expired");
    }
}
