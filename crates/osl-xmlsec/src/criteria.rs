//! Credential criteria based on KeyInfo contents.

use std::any::Any;

use osl_security::credential::Credential;
use osl_security::criteria::{Criterion, CriterionMatch};
use osl_security::registry::{EvaluableCredentialCriteriaRegistry, EvaluableCredentialCriterion};

use crate::keyinfo::KeyInfo;

/// Criterion carrying the contents of a `KeyInfo` element as the source of
/// credential selection data.
///
/// The key info may be absent, for the case where accompanying criteria or
/// application context are expected to drive resolution instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInfoCriterion {
    key_info: Option<KeyInfo>,
}

impl KeyInfoCriterion {
    /// Creates a criterion from the given key info.
    #[must_use]
    pub fn new(key_info: Option<KeyInfo>) -> Self {
        Self { key_info }
    }

    /// The key info serving as criteria source, if any.
    #[must_use]
    pub fn key_info(&self) -> Option<&KeyInfo> {
        self.key_info.as_ref()
    }
}

impl Criterion for KeyInfoCriterion {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registers this crate's criterion evaluators.
pub fn register_evaluators(registry: &mut EvaluableCredentialCriteriaRegistry) {
    registry.register::<KeyInfoCriterion>(|c| {
        let c = c.as_any().downcast_ref::<KeyInfoCriterion>()?;
        Some(Box::new(EvaluableKeyInfoCredentialCriterion::new(
            c.key_info().cloned(),
        )))
    });
}

/// Evaluates a [`KeyInfoCriterion`] by comparing the key material it carries
/// against the credential's certificate and public key.
///
/// A criterion without key material is undecidable, as is a credential that
/// carries neither certificate nor public key.
#[derive(Debug, Clone)]
pub struct EvaluableKeyInfoCredentialCriterion {
    key_info: Option<KeyInfo>,
}

impl EvaluableKeyInfoCredentialCriterion {
    /// Creates an evaluator for the given key info.
    #[must_use]
    pub fn new(key_info: Option<KeyInfo>) -> Self {
        Self { key_info }
    }
}

impl EvaluableCredentialCriterion for EvaluableKeyInfoCredentialCriterion {
    fn evaluate(&self, credential: &Credential) -> CriterionMatch {
        let Some(key_info) = &self.key_info else {
            tracing::debug!("KeyInfo criterion carries no key info, criterion is undecidable");
            return CriterionMatch::Indeterminate;
        };
        if key_info.x509_certificates.is_empty() && key_info.key_values.is_empty() {
            tracing::debug!(
                "KeyInfo criterion carries no comparable key material, criterion is undecidable"
            );
            return CriterionMatch::Indeterminate;
        }

        let mut comparable = false;

        if let Some(certificate) = credential.certificate() {
            comparable = true;
            if key_info
                .x509_certificates
                .iter()
                .any(|candidate| candidate.as_slice() == certificate)
            {
                return CriterionMatch::Match;
            }
        }

        if let Some(public_key) = credential.verification_key() {
            comparable = true;
            if key_info
                .key_values
                .iter()
                .any(|candidate| candidate.as_slice() == public_key.as_slice())
            {
                return CriterionMatch::Match;
            }
        }

        if comparable {
            CriterionMatch::NoMatch
        } else {
            tracing::debug!(
                "credential carries neither certificate nor public key, criterion is undecidable"
            );
            CriterionMatch::Indeterminate
        }
    }
}
