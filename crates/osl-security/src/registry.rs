//! Evaluable-criterion registry.
//!
//! Maps a concrete criterion type to a factory producing an evaluator bound to
//! that criterion's data. The registry is an explicit value, not process-wide
//! state: construct it (usually via
//! [`EvaluableCredentialCriteriaRegistry::with_defaults`]) during startup and
//! hand it by reference to the components that evaluate criteria.
//!
//! Registration after the registry is shared across threads is unsupported;
//! callers needing dynamic re-registration must synchronize externally.

use std::any::TypeId;
use std::collections::HashMap;

use crate::credential::Credential;
use crate::criteria::{Criterion, CriterionMatch};
use crate::evaluators;

/// A predicate over a credential, produced by binding a criterion's data.
pub trait EvaluableCredentialCriterion: Send + Sync {
    /// Evaluates the bound criterion against the credential.
    fn evaluate(&self, credential: &Credential) -> CriterionMatch;
}

/// Factory turning a criterion into an evaluator bound to its data.
///
/// Returns `None` when the criterion is not of the type the factory was
/// registered for.
pub type EvaluatorFactory = fn(&dyn Criterion) -> Option<Box<dyn EvaluableCredentialCriterion>>;

/// Lookup table from criterion type to evaluator factory.
#[derive(Debug, Default)]
pub struct EvaluableCredentialCriteriaRegistry {
    factories: HashMap<TypeId, EvaluatorFactory>,
}

impl EvaluableCredentialCriteriaRegistry {
    /// Creates an empty registry with no mappings.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the built-in mappings for the
    /// standard criterion kinds defined in this crate: entity-id, usage, and
    /// the X.509 subject / issuer-serial / digest / subject-key-identifier
    /// criteria.
    ///
    /// Criterion kinds defined in higher layers register themselves through
    /// their own `register_evaluators` functions.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        evaluators::register_defaults(&mut registry);
        registry
    }

    /// Registers a factory for criterion type `C`, replacing any existing
    /// mapping for that type.
    pub fn register<C: Criterion>(&mut self, factory: EvaluatorFactory) {
        self.factories.insert(TypeId::of::<C>(), factory);
    }

    /// Looks up an evaluator for the given criterion.
    ///
    /// Returns `None` when no factory is registered for the criterion's
    /// concrete type. Callers must treat that as "cannot evaluate", never as
    /// a negative match.
    #[must_use]
    pub fn evaluator_for(
        &self,
        criterion: &dyn Criterion,
    ) -> Option<Box<dyn EvaluableCredentialCriterion>> {
        let type_id = criterion.as_any().type_id();
        let factory = self.factories.get(&type_id)?;
        factory(criterion)
    }

    /// Convenience: resolves an evaluator and applies it.
    ///
    /// Returns `None` when the criterion type has no registered evaluator.
    #[must_use]
    pub fn evaluate(
        &self,
        criterion: &dyn Criterion,
        credential: &Credential,
    ) -> Option<CriterionMatch> {
        self.evaluator_for(criterion)
            .map(|evaluator| evaluator.evaluate(credential))
    }

    /// Number of registered criterion types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if no criterion types are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{Credential, UsageType};
    use crate::criteria::{EntityIdCriterion, UsageCriterion};

    #[test]
    fn default_registry_resolves_entity_id() {
        let registry = EvaluableCredentialCriteriaRegistry::with_defaults();
        let criterion = EntityIdCriterion::new("https://idp.example.org");
        let evaluator = registry.evaluator_for(&criterion);
        assert!(evaluator.is_some());

        let credential = Credential::new().with_entity_id("https://idp.example.org");
        assert_eq!(
            evaluator.unwrap().evaluate(&credential),
            CriterionMatch::Match
        );
    }

    #[test]
    fn empty_registry_yields_no_evaluator() {
        let registry = EvaluableCredentialCriteriaRegistry::empty();
        let criterion = UsageCriterion::new(UsageType::Signing);
        assert!(registry.evaluator_for(&criterion).is_none());
        assert!(registry.evaluate(&criterion, &Credential::new()).is_none());
    }
}
