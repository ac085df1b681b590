//! Built-in credential criterion evaluators.
//!
//! Each evaluator binds one criterion's data and tests it against a
//! credential, returning the three-valued [`CriterionMatch`]. The distinction
//! between "does not match" and "cannot be evaluated" is load-bearing: an
//! unsupported digest algorithm or an unparseable certificate yields
//! [`CriterionMatch::Indeterminate`], never [`CriterionMatch::NoMatch`].

use aws_lc_rs::digest;
use x509_parser::extensions::ParsedExtension;

use crate::credential::{Credential, UsageType};
use crate::criteria::{
    CriterionMatch, EntityIdCriterion, UsageCriterion, X509DigestCriterion,
    X509IssuerSerialCriterion, X509SubjectKeyIdentifierCriterion, X509SubjectNameCriterion,
};
use crate::registry::{EvaluableCredentialCriterion, EvaluableCredentialCriteriaRegistry};

/// Registers the built-in evaluator factories for this crate's criterion
/// kinds.
pub fn register_defaults(registry: &mut EvaluableCredentialCriteriaRegistry) {
    registry.register::<EntityIdCriterion>(|c| {
        let c = c.as_any().downcast_ref::<EntityIdCriterion>()?;
        Some(Box::new(EvaluableEntityIdCredentialCriterion::new(
            c.entity_id(),
        )))
    });
    registry.register::<UsageCriterion>(|c| {
        let c = c.as_any().downcast_ref::<UsageCriterion>()?;
        Some(Box::new(EvaluableUsageCredentialCriterion::new(c.usage())))
    });
    registry.register::<X509SubjectNameCriterion>(|c| {
        let c = c.as_any().downcast_ref::<X509SubjectNameCriterion>()?;
        Some(Box::new(EvaluableX509SubjectNameCredentialCriterion::new(
            c.subject_name(),
        )))
    });
    registry.register::<X509IssuerSerialCriterion>(|c| {
        let c = c.as_any().downcast_ref::<X509IssuerSerialCriterion>()?;
        Some(Box::new(EvaluableX509IssuerSerialCredentialCriterion::new(
            c.issuer_name(),
            c.serial_number().to_vec(),
        )))
    });
    registry.register::<X509DigestCriterion>(|c| {
        let c = c.as_any().downcast_ref::<X509DigestCriterion>()?;
        Some(Box::new(EvaluableX509DigestCredentialCriterion::new(
            c.algorithm(),
            c.digest().to_vec(),
        )))
    });
    registry.register::<X509SubjectKeyIdentifierCriterion>(|c| {
        let c = c
            .as_any()
            .downcast_ref::<X509SubjectKeyIdentifierCriterion>()?;
        Some(Box::new(
            EvaluableX509SubjectKeyIdentifierCredentialCriterion::new(
                c.subject_key_identifier().to_vec(),
            ),
        ))
    });
}

/// Maps a JCA-style digest algorithm name onto the runtime's digest support.
fn digest_algorithm(name: &str) -> Option<&'static digest::Algorithm> {
    match name {
        "SHA-1" | "SHA1" => Some(&digest::SHA1_FOR_LEGACY_USE_ONLY),
        "SHA-256" | "SHA256" => Some(&digest::SHA256),
        "SHA-384" | "SHA384" => Some(&digest::SHA384),
        "SHA-512" | "SHA512" => Some(&digest::SHA512),
        _ => None,
    }
}

/// Strips leading zero octets, so serial numbers compare independent of the
/// DER sign padding.
fn strip_leading_zeros(bytes: &[u8]) -> &[u8] {
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len());
    &bytes[start..]
}

/// Evaluates an [`EntityIdCriterion`].
#[derive(Debug, Clone)]
pub struct EvaluableEntityIdCredentialCriterion {
    entity_id: String,
}

impl EvaluableEntityIdCredentialCriterion {
    /// Creates an evaluator for the given entity identifier.
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
        }
    }
}

impl EvaluableCredentialCriterion for EvaluableEntityIdCredentialCriterion {
    fn evaluate(&self, credential: &Credential) -> CriterionMatch {
        CriterionMatch::from_bool(credential.entity_id() == Some(self.entity_id.as_str()))
    }
}

/// Evaluates a [`UsageCriterion`].
///
/// An unspecified usage on either side matches any usage on the other.
#[derive(Debug, Clone, Copy)]
pub struct EvaluableUsageCredentialCriterion {
    usage: UsageType,
}

impl EvaluableUsageCredentialCriterion {
    /// Creates an evaluator for the given usage.
    #[must_use]
    pub const fn new(usage: UsageType) -> Self {
        Self { usage }
    }
}

impl EvaluableCredentialCriterion for EvaluableUsageCredentialCriterion {
    fn evaluate(&self, credential: &Credential) -> CriterionMatch {
        let matched = self.usage == UsageType::Unspecified
            || credential.usage() == UsageType::Unspecified
            || credential.usage() == self.usage;
        CriterionMatch::from_bool(matched)
    }
}

/// Evaluates an [`X509SubjectNameCriterion`].
#[derive(Debug, Clone)]
pub struct EvaluableX509SubjectNameCredentialCriterion {
    subject_name: String,
}

impl EvaluableX509SubjectNameCredentialCriterion {
    /// Creates an evaluator for the given subject distinguished name.
    #[must_use]
    pub fn new(subject_name: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
        }
    }
}

impl EvaluableCredentialCriterion for EvaluableX509SubjectNameCredentialCriterion {
    fn evaluate(&self, credential: &Credential) -> CriterionMatch {
        if credential.certificate().is_none() {
            return CriterionMatch::NoMatch;
        }
        let Ok(cert) = credential.parse_certificate() else {
            tracing::debug!("could not parse credential certificate, criterion is undecidable");
            return CriterionMatch::Indeterminate;
        };
        CriterionMatch::from_bool(cert.subject().to_string() == self.subject_name)
    }
}

/// Evaluates an [`X509IssuerSerialCriterion`].
#[derive(Debug, Clone)]
pub struct EvaluableX509IssuerSerialCredentialCriterion {
    issuer_name: String,
    serial_number: Vec<u8>,
}

impl EvaluableX509IssuerSerialCredentialCriterion {
    /// Creates an evaluator for the given issuer distinguished name and raw
    /// serial number bytes.
    #[must_use]
    pub fn new(issuer_name: impl Into<String>, serial_number: Vec<u8>) -> Self {
        Self {
            issuer_name: issuer_name.into(),
            serial_number,
        }
    }
}

impl EvaluableCredentialCriterion for EvaluableX509IssuerSerialCredentialCriterion {
    fn evaluate(&self, credential: &Credential) -> CriterionMatch {
        if credential.certificate().is_none() {
            return CriterionMatch::NoMatch;
        }
        let Ok(cert) = credential.parse_certificate() else {
            tracing::debug!("could not parse credential certificate, criterion is undecidable");
            return CriterionMatch::Indeterminate;
        };
        let issuer_matches = cert.issuer().to_string() == self.issuer_name;
        let serial_matches =
            strip_leading_zeros(cert.raw_serial()) == strip_leading_zeros(&self.serial_number);
        CriterionMatch::from_bool(issuer_matches && serial_matches)
    }
}

/// Evaluates an [`X509DigestCriterion`].
///
/// A credential without a certificate does not match. An unsupported digest
/// algorithm makes the criterion undecidable.
#[derive(Debug, Clone)]
pub struct EvaluableX509DigestCredentialCriterion {
    algorithm: String,
    digest: Vec<u8>,
}

impl EvaluableX509DigestCredentialCriterion {
    /// Creates an evaluator for the given digest algorithm and expected value.
    #[must_use]
    pub fn new(algorithm: impl Into<String>, digest: Vec<u8>) -> Self {
        Self {
            algorithm: algorithm.into(),
            digest,
        }
    }
}

impl EvaluableCredentialCriterion for EvaluableX509DigestCredentialCriterion {
    fn evaluate(&self, credential: &Credential) -> CriterionMatch {
        let Some(cert_der) = credential.certificate() else {
            return CriterionMatch::NoMatch;
        };
        let Some(algorithm) = digest_algorithm(&self.algorithm) else {
            tracing::debug!(
                algorithm = %self.algorithm,
                "digest algorithm not supported, criterion is undecidable"
            );
            return CriterionMatch::Indeterminate;
        };
        let computed = digest::digest(algorithm, cert_der);
        CriterionMatch::from_bool(computed.as_ref() == self.digest.as_slice())
    }
}

/// Evaluates an [`X509SubjectKeyIdentifierCriterion`].
///
/// A certificate without a subject key identifier extension leaves the
/// criterion undecidable.
#[derive(Debug, Clone)]
pub struct EvaluableX509SubjectKeyIdentifierCredentialCriterion {
    ski: Vec<u8>,
}

impl EvaluableX509SubjectKeyIdentifierCredentialCriterion {
    /// Creates an evaluator for the given subject key identifier bytes.
    #[must_use]
    pub fn new(ski: Vec<u8>) -> Self {
        Self { ski }
    }
}

impl EvaluableCredentialCriterion for EvaluableX509SubjectKeyIdentifierCredentialCriterion {
    fn evaluate(&self, credential: &Credential) -> CriterionMatch {
        if credential.certificate().is_none() {
            return CriterionMatch::NoMatch;
        }
        let Ok(cert) = credential.parse_certificate() else {
            tracing::debug!("could not parse credential certificate, criterion is undecidable");
            return CriterionMatch::Indeterminate;
        };
        for extension in cert.extensions() {
            if let ParsedExtension::SubjectKeyIdentifier(ki) = extension.parsed_extension() {
                return CriterionMatch::from_bool(ki.0 == self.ski.as_slice());
            }
        }
        tracing::debug!("certificate carries no subject key identifier, criterion is undecidable");
        CriterionMatch::Indeterminate
    }
}
