//! Credential model.
//!
//! A [`Credential`] is an opaque bundle of key material together with the
//! identity it belongs to and the usage it is intended for. Credentials are
//! immutable once constructed; components that resolve or derive credentials
//! own the instances they hand out.

use x509_parser::prelude::{FromDer, X509Certificate};

use crate::error::{SecurityError, SecurityResult};

/// Intended usage of a credential's key material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum UsageType {
    /// Key is used for signing / signature verification.
    Signing,
    /// Key is used for encryption / decryption.
    Encryption,
    /// No usage constraint.
    #[default]
    Unspecified,
}

/// A bundle of key material, entity identifier and usage tag.
///
/// Key material is carried in DER form: public keys as `SubjectPublicKeyInfo`,
/// private keys as PKCS#8, certificates as X.509 DER. Symmetric (secret) keys
/// are raw bytes. Any combination of the four may be present.
#[derive(Debug, Clone, Default)]
pub struct Credential {
    entity_id: Option<String>,
    usage: UsageType,
    public_key: Option<Vec<u8>>,
    private_key: Option<Vec<u8>>,
    secret_key: Option<Vec<u8>>,
    certificate: Option<Vec<u8>>,
}

impl Credential {
    /// Creates an empty credential.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the entity identifier this credential belongs to.
    #[must_use]
    pub fn with_entity_id(mut self, entity_id: impl Into<String>) -> Self {
        self.entity_id = Some(entity_id.into());
        self
    }

    /// Sets the usage tag.
    #[must_use]
    pub fn with_usage(mut self, usage: UsageType) -> Self {
        self.usage = usage;
        self
    }

    /// Sets the public key (`SubjectPublicKeyInfo` DER).
    #[must_use]
    pub fn with_public_key(mut self, spki_der: Vec<u8>) -> Self {
        self.public_key = Some(spki_der);
        self
    }

    /// Sets the private key (PKCS#8 DER).
    #[must_use]
    pub fn with_private_key(mut self, pkcs8_der: Vec<u8>) -> Self {
        self.private_key = Some(pkcs8_der);
        self
    }

    /// Sets a raw symmetric key.
    #[must_use]
    pub fn with_secret_key(mut self, key: Vec<u8>) -> Self {
        self.secret_key = Some(key);
        self
    }

    /// Sets the entity certificate (X.509 DER).
    #[must_use]
    pub fn with_certificate(mut self, cert_der: Vec<u8>) -> Self {
        self.certificate = Some(cert_der);
        self
    }

    /// Returns the entity identifier, if known.
    #[must_use]
    pub fn entity_id(&self) -> Option<&str> {
        self.entity_id.as_deref()
    }

    /// Returns the usage tag.
    #[must_use]
    pub const fn usage(&self) -> UsageType {
        self.usage
    }

    /// Returns the public key as `SubjectPublicKeyInfo` DER, if present.
    #[must_use]
    pub fn public_key(&self) -> Option<&[u8]> {
        self.public_key.as_deref()
    }

    /// Returns the private key as PKCS#8 DER, if present.
    #[must_use]
    pub fn private_key(&self) -> Option<&[u8]> {
        self.private_key.as_deref()
    }

    /// Returns the raw symmetric key, if present.
    #[must_use]
    pub fn secret_key(&self) -> Option<&[u8]> {
        self.secret_key.as_deref()
    }

    /// Returns the entity certificate as X.509 DER, if present.
    #[must_use]
    pub fn certificate(&self) -> Option<&[u8]> {
        self.certificate.as_deref()
    }

    /// Parses the entity certificate.
    ///
    /// # Errors
    ///
    /// Returns an error if no certificate is present or the DER is malformed.
    pub fn parse_certificate(&self) -> SecurityResult<X509Certificate<'_>> {
        let der = self
            .certificate
            .as_deref()
            .ok_or_else(|| SecurityError::InvalidCertificate("no certificate present".to_string()))?;
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| SecurityError::InvalidCertificate(format!("failed to parse certificate: {e}")))?;
        Ok(cert)
    }

    /// Extracts the key usable for signature verification.
    ///
    /// Prefers an explicitly attached public key; falls back to the
    /// `SubjectPublicKeyInfo` of the entity certificate. Returns `None`
    /// when neither yields a key.
    #[must_use]
    pub fn verification_key(&self) -> Option<Vec<u8>> {
        if let Some(spki) = &self.public_key {
            return Some(spki.clone());
        }
        let cert = self.parse_certificate().ok()?;
        Some(cert.public_key().raw.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let cred = Credential::new()
            .with_entity_id("https://idp.example.org")
            .with_usage(UsageType::Signing)
            .with_public_key(vec![1, 2, 3]);
        assert_eq!(cred.entity_id(), Some("https://idp.example.org"));
        assert_eq!(cred.usage(), UsageType::Signing);
        assert_eq!(cred.public_key(), Some(&[1u8, 2, 3][..]));
        assert!(cred.certificate().is_none());
    }

    #[test]
    fn verification_key_prefers_public_key() {
        let cred = Credential::new()
            .with_public_key(vec![9, 9])
            .with_certificate(vec![0, 0]);
        assert_eq!(cred.verification_key(), Some(vec![9, 9]));
    }

    #[test]
    fn parse_certificate_without_certificate_fails() {
        let cred = Credential::new();
        assert!(cred.parse_certificate().is_err());
    }

    #[test]
    fn default_usage_is_unspecified() {
        assert_eq!(Credential::new().usage(), UsageType::Unspecified);
    }
}
