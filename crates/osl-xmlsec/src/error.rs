//! XML security error types.

use thiserror::Error;

/// Result type for XML security operations.
pub type XmlSecResult<T> = Result<T, XmlSecError>;

/// Errors raised while reading XML security structures.
#[derive(Debug, Error)]
pub enum XmlSecError {
    /// XML could not be parsed.
    #[error("XML parsing error: {0}")]
    XmlParse(String),

    /// Base64 content could not be decoded.
    #[error("base64 decode error: {0}")]
    Base64(String),

    /// Key material could not be parsed or is structurally invalid.
    #[error("invalid key material: {0}")]
    InvalidKey(String),
}

impl From<quick_xml::Error> for XmlSecError {
    fn from(err: quick_xml::Error) -> Self {
        Self::XmlParse(err.to_string())
    }
}

impl From<base64::DecodeError> for XmlSecError {
    fn from(err: base64::DecodeError) -> Self {
        Self::Base64(err.to_string())
    }
}
