//! Built-in credential criteria.

use std::any::Any;

use crate::credential::UsageType;
use crate::criteria::Criterion;

/// Criterion selecting credentials owned by a specific entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityIdCriterion {
    entity_id: String,
}

impl EntityIdCriterion {
    /// Creates a criterion for the given entity identifier.
    #[must_use]
    pub fn new(entity_id: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
        }
    }

    /// The entity identifier to match.
    #[must_use]
    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }
}

impl Criterion for EntityIdCriterion {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Criterion selecting credentials by usage tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsageCriterion {
    usage: UsageType,
}

impl UsageCriterion {
    /// Creates a criterion for the given usage.
    #[must_use]
    pub const fn new(usage: UsageType) -> Self {
        Self { usage }
    }

    /// The usage to match.
    #[must_use]
    pub const fn usage(&self) -> UsageType {
        self.usage
    }
}

impl Criterion for UsageCriterion {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Criterion selecting credentials whose certificate has a specific subject DN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509SubjectNameCriterion {
    subject_name: String,
}

impl X509SubjectNameCriterion {
    /// Creates a criterion for the given subject distinguished name.
    #[must_use]
    pub fn new(subject_name: impl Into<String>) -> Self {
        Self {
            subject_name: subject_name.into(),
        }
    }

    /// The subject distinguished name to match.
    #[must_use]
    pub fn subject_name(&self) -> &str {
        &self.subject_name
    }
}

impl Criterion for X509SubjectNameCriterion {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Criterion selecting credentials whose certificate has a specific issuer DN
/// and serial number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509IssuerSerialCriterion {
    issuer_name: String,
    serial_number: Vec<u8>,
}

impl X509IssuerSerialCriterion {
    /// Creates a criterion for the given issuer distinguished name and raw
    /// (big-endian) serial number bytes.
    #[must_use]
    pub fn new(issuer_name: impl Into<String>, serial_number: Vec<u8>) -> Self {
        Self {
            issuer_name: issuer_name.into(),
            serial_number,
        }
    }

    /// The issuer distinguished name to match.
    #[must_use]
    pub fn issuer_name(&self) -> &str {
        &self.issuer_name
    }

    /// The raw serial number bytes to match.
    #[must_use]
    pub fn serial_number(&self) -> &[u8] {
        &self.serial_number
    }
}

impl Criterion for X509IssuerSerialCriterion {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Criterion selecting credentials whose certificate digests to a known value.
///
/// The algorithm is named in JCA style (`SHA-256`, `SHA-384`, ...). An
/// algorithm the runtime does not support makes the criterion undecidable,
/// not unsatisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509DigestCriterion {
    algorithm: String,
    digest: Vec<u8>,
}

impl X509DigestCriterion {
    /// Creates a criterion for the given digest algorithm and expected value.
    #[must_use]
    pub fn new(algorithm: impl Into<String>, digest: Vec<u8>) -> Self {
        Self {
            algorithm: algorithm.into(),
            digest,
        }
    }

    /// The digest algorithm name.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The expected digest bytes.
    #[must_use]
    pub fn digest(&self) -> &[u8] {
        &self.digest
    }
}

impl Criterion for X509DigestCriterion {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Criterion selecting credentials by the certificate's subject key identifier
/// extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct X509SubjectKeyIdentifierCriterion {
    ski: Vec<u8>,
}

impl X509SubjectKeyIdentifierCriterion {
    /// Creates a criterion for the given subject key identifier bytes.
    #[must_use]
    pub fn new(ski: Vec<u8>) -> Self {
        Self { ski }
    }

    /// The subject key identifier to match.
    #[must_use]
    pub fn subject_key_identifier(&self) -> &[u8] {
        &self.ski
    }
}

impl Criterion for X509SubjectKeyIdentifierCriterion {
    fn as_any(&self) -> &dyn Any {
        self
    }
}
