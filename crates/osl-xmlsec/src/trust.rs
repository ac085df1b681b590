//! Signature trust engines.
//!
//! A trust engine answers "does this signature validate with a credential we
//! trust for these criteria". The explicit-key engine works from a fixed set
//! of trusted credentials, filtered through the evaluable-criterion registry.

use std::sync::Arc;

use osl_security::credential::Credential;
use osl_security::criteria::{CriteriaSet, CriterionMatch};
use osl_security::registry::EvaluableCredentialCriteriaRegistry;

use crate::signature::{Signature, SignatureValidator};

/// Evaluates the trustworthiness of a signature against resolved credentials.
pub trait SignatureTrustEngine: Send + Sync {
    /// Returns true when the signature validates with a credential trusted
    /// under the given criteria.
    fn validate(&self, signature: &Signature, criteria: &CriteriaSet) -> bool;
}

/// Trust engine over an explicit, statically configured credential set.
///
/// Candidate credentials are filtered by evaluating each criterion through
/// the registry. A [`CriterionMatch::NoMatch`] excludes the candidate; an
/// indeterminate evaluation or an unregistered criterion type does not, so
/// partial evidence cannot rule a credential out before the cryptographic
/// check.
pub struct ExplicitKeySignatureTrustEngine {
    credentials: Vec<Credential>,
    registry: Arc<EvaluableCredentialCriteriaRegistry>,
}

impl ExplicitKeySignatureTrustEngine {
    /// Creates a trust engine over the given credentials.
    #[must_use]
    pub fn new(
        credentials: Vec<Credential>,
        registry: Arc<EvaluableCredentialCriteriaRegistry>,
    ) -> Self {
        Self {
            credentials,
            registry,
        }
    }

    /// The configured trusted credentials.
    #[must_use]
    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    /// Returns the credentials satisfying (or at least not failing) the
    /// criteria.
    fn trusted_credentials<'a>(&'a self, criteria: &CriteriaSet) -> Vec<&'a Credential> {
        self.credentials
            .iter()
            .filter(|credential| {
                criteria.iter().all(|criterion| {
                    match self.registry.evaluate(criterion, credential) {
                        Some(CriterionMatch::NoMatch) => false,
                        Some(CriterionMatch::Match) | Some(CriterionMatch::Indeterminate) => true,
                        // No evaluator registered: cannot evaluate, keep the
                        // candidate.
                        None => true,
                    }
                })
            })
            .collect()
    }
}

impl SignatureTrustEngine for ExplicitKeySignatureTrustEngine {
    fn validate(&self, signature: &Signature, criteria: &CriteriaSet) -> bool {
        let candidates = self.trusted_credentials(criteria);
        tracing::debug!(
            candidates = candidates.len(),
            "evaluating signature against trusted credentials"
        );

        for credential in candidates {
            let validator = SignatureValidator::new(credential.clone());
            match validator.validate(signature) {
                Ok(()) => {
                    tracing::debug!("signature validated with a trusted credential");
                    return true;
                }
                Err(e) => {
                    tracing::debug!(error = %e, "credential did not validate signature, trying next");
                }
            }
        }

        tracing::debug!("no trusted credential validated the signature");
        false
    }
}
