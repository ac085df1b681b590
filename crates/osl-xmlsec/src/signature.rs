//! XML signature representation and validation.
//!
//! The [`Signature`] carries the already-canonicalized signed octets together
//! with the signature value and algorithm; [`SignatureValidator`] checks it
//! against a single credential fixed at construction time.

use aws_lc_rs::signature::{
    UnparsedPublicKey, VerificationAlgorithm, ECDSA_P256_SHA256_ASN1, ECDSA_P384_SHA384_ASN1,
    ECDSA_P521_SHA512_ASN1, RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384,
    RSA_PKCS1_2048_8192_SHA512,
};
use thiserror::Error;

use osl_security::credential::Credential;

use crate::keyinfo::KeyInfo;
use crate::spki::{self, EcCurve, VerificationKey};

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256 (recommended).
    #[default]
    RsaSha256,
    /// RSA with SHA-384.
    RsaSha384,
    /// RSA with SHA-512.
    RsaSha512,
    /// ECDSA with SHA-256 over P-256.
    EcdsaSha256,
    /// ECDSA with SHA-384 over P-384.
    EcdsaSha384,
    /// ECDSA with SHA-512 over P-521.
    EcdsaSha512,
    /// Legacy RSA with SHA-1 (not recommended, verification refused).
    RsaSha1,
}

impl SignatureAlgorithm {
    /// Returns the XML-DSig URI for this algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256",
            Self::RsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384",
            Self::RsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512",
            Self::EcdsaSha256 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256",
            Self::EcdsaSha384 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384",
            Self::EcdsaSha512 => "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha512",
            Self::RsaSha1 => "http://www.w3.org/2000/09/xmldsig#rsa-sha1",
        }
    }

    /// Parses an algorithm from its XML-DSig URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            "http://www.w3.org/2001/04/xmldsig-more#rsa-sha256" => Some(Self::RsaSha256),
            "http://www.w3.org/2001/04/xmldsig-more#rsa-sha384" => Some(Self::RsaSha384),
            "http://www.w3.org/2001/04/xmldsig-more#rsa-sha512" => Some(Self::RsaSha512),
            "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha256" => Some(Self::EcdsaSha256),
            "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha384" => Some(Self::EcdsaSha384),
            "http://www.w3.org/2001/04/xmldsig-more#ecdsa-sha512" => Some(Self::EcdsaSha512),
            "http://www.w3.org/2000/09/xmldsig#rsa-sha1" => Some(Self::RsaSha1),
            _ => None,
        }
    }

    /// Returns true if this algorithm uses a deprecated hash (SHA-1).
    #[must_use]
    pub const fn is_deprecated(&self) -> bool {
        matches!(self, Self::RsaSha1)
    }
}

/// A signature over already-canonicalized content.
#[derive(Debug, Clone)]
pub struct Signature {
    /// The signature algorithm.
    pub algorithm: SignatureAlgorithm,
    /// The canonicalized octets the signature was computed over.
    pub signed_content: Vec<u8>,
    /// The raw signature value.
    pub value: Vec<u8>,
    /// Key information accompanying the signature, if any.
    pub key_info: Option<KeyInfo>,
}

impl Signature {
    /// Creates a signature object.
    #[must_use]
    pub fn new(algorithm: SignatureAlgorithm, signed_content: Vec<u8>, value: Vec<u8>) -> Self {
        Self {
            algorithm,
            signed_content,
            value,
            key_info: None,
        }
    }

    /// Attaches key information.
    #[must_use]
    pub fn with_key_info(mut self, key_info: KeyInfo) -> Self {
        self.key_info = Some(key_info);
        self
    }
}

/// Signature validation failure.
///
/// Primitive-level processing problems and cryptographic mismatch are both
/// reported as [`SignatureValidationError::Invalid`]; the detail text tells
/// them apart for diagnostics.
#[derive(Debug, Error)]
pub enum SignatureValidationError {
    /// The credential carried no key usable for verification.
    #[error("no key available to validate signature")]
    NoVerificationKey,

    /// The signature did not validate.
    #[error("signature validation failed: {detail}")]
    Invalid {
        /// What went wrong: processing problem or cryptographic mismatch.
        detail: String,
    },
}

impl SignatureValidationError {
    fn invalid(detail: impl Into<String>) -> Self {
        Self::Invalid {
            detail: detail.into(),
        }
    }
}

/// Validates XML signatures against a single verification credential.
#[derive(Debug, Clone)]
pub struct SignatureValidator {
    credential: Credential,
}

impl SignatureValidator {
    /// Creates a validator bound to the given credential.
    #[must_use]
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    /// The credential signatures are validated against.
    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Validates the signature with the credential's key.
    ///
    /// A pure check: no state is modified, only logging happens. All failure
    /// modes of the underlying primitive are surfaced as
    /// [`SignatureValidationError::Invalid`] with distinct detail.
    ///
    /// # Errors
    ///
    /// Returns [`SignatureValidationError::NoVerificationKey`] when the
    /// credential holds no usable key, [`SignatureValidationError::Invalid`]
    /// otherwise.
    pub fn validate(&self, signature: &Signature) -> Result<(), SignatureValidationError> {
        tracing::debug!("attempting to validate signature using key from supplied credential");

        let spki_der = self
            .credential
            .verification_key()
            .ok_or(SignatureValidationError::NoVerificationKey)?;

        if signature.algorithm.is_deprecated() {
            return Err(SignatureValidationError::invalid(
                "unable to evaluate key against signature: SHA-1 signatures are not supported",
            ));
        }

        let key = spki::parse_subject_public_key_info(&spki_der).map_err(|e| {
            SignatureValidationError::invalid(format!(
                "unable to evaluate key against signature: {e}"
            ))
        })?;

        let (verification_alg, key_bytes): (&'static dyn VerificationAlgorithm, Vec<u8>) =
            match (signature.algorithm, key) {
                (SignatureAlgorithm::RsaSha256, VerificationKey::Rsa(der)) => {
                    (&RSA_PKCS1_2048_8192_SHA256, der)
                }
                (SignatureAlgorithm::RsaSha384, VerificationKey::Rsa(der)) => {
                    (&RSA_PKCS1_2048_8192_SHA384, der)
                }
                (SignatureAlgorithm::RsaSha512, VerificationKey::Rsa(der)) => {
                    (&RSA_PKCS1_2048_8192_SHA512, der)
                }
                (
                    SignatureAlgorithm::EcdsaSha256,
                    VerificationKey::Ec {
                        curve: EcCurve::P256,
                        point,
                    },
                ) => (&ECDSA_P256_SHA256_ASN1, point),
                (
                    SignatureAlgorithm::EcdsaSha384,
                    VerificationKey::Ec {
                        curve: EcCurve::P384,
                        point,
                    },
                ) => (&ECDSA_P384_SHA384_ASN1, point),
                (
                    SignatureAlgorithm::EcdsaSha512,
                    VerificationKey::Ec {
                        curve: EcCurve::P521,
                        point,
                    },
                ) => (&ECDSA_P521_SHA512_ASN1, point),
                (algorithm, _) => {
                    return Err(SignatureValidationError::invalid(format!(
                        "unable to evaluate key against signature: credential key does not \
                         match signature algorithm {}",
                        algorithm.uri()
                    )));
                }
            };

        tracing::debug!(
            algorithm = signature.algorithm.uri(),
            "validating signature"
        );

        let public_key = UnparsedPublicKey::new(verification_alg, key_bytes);
        match public_key.verify(&signature.signed_content, &signature.value) {
            Ok(()) => {
                tracing::debug!("signature validated with key from supplied credential");
                Ok(())
            }
            Err(_) => {
                tracing::debug!("signature did not validate against the credential's key");
                Err(SignatureValidationError::invalid(
                    "signature did not validate against the credential's key",
                ))
            }
        }
    }
}
