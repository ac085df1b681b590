//! SAML-level credential criteria.
//!
//! Role, protocol and role-descriptor criteria describe the metadata context
//! a credential is expected in. Of the three, only the role-descriptor
//! criterion is decidable from credential content (by comparing the
//! descriptor's published key material); the role and protocol criteria exist
//! for resolvers that filter on exchange context, so their credential
//! evaluators report indeterminate.

use std::any::Any;

use osl_security::credential::{Credential, UsageType};
use osl_security::criteria::{Criterion, CriterionMatch};
use osl_security::registry::{EvaluableCredentialCriteriaRegistry, EvaluableCredentialCriterion};
use osl_xmlsec::criteria::EvaluableKeyInfoCredentialCriterion;

use crate::context::{QName, RoleDescriptor};

/// Criterion selecting by the entity role in the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRoleCriterion {
    role: QName,
}

impl EntityRoleCriterion {
    /// Creates a criterion for the given role name.
    #[must_use]
    pub const fn new(role: QName) -> Self {
        Self { role }
    }

    /// The role name.
    #[must_use]
    pub const fn role(&self) -> &QName {
        &self.role
    }
}

impl Criterion for EntityRoleCriterion {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Criterion selecting by the protocol of the exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolCriterion {
    protocol: String,
}

impl ProtocolCriterion {
    /// Creates a criterion for the given protocol URI.
    #[must_use]
    pub fn new(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
        }
    }

    /// The protocol URI.
    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }
}

impl Criterion for ProtocolCriterion {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Criterion carrying the peer's resolved role descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleDescriptorCriterion {
    role_descriptor: RoleDescriptor,
}

impl RoleDescriptorCriterion {
    /// Creates a criterion for the given role descriptor.
    #[must_use]
    pub fn new(role_descriptor: RoleDescriptor) -> Self {
        Self { role_descriptor }
    }

    /// The role descriptor.
    #[must_use]
    pub const fn role_descriptor(&self) -> &RoleDescriptor {
        &self.role_descriptor
    }
}

impl Criterion for RoleDescriptorCriterion {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Registers this crate's criterion evaluators.
pub fn register_evaluators(registry: &mut EvaluableCredentialCriteriaRegistry) {
    registry.register::<EntityRoleCriterion>(|c| {
        c.as_any().downcast_ref::<EntityRoleCriterion>()?;
        Some(Box::new(ContextOnlyEvaluator("entity role")))
    });
    registry.register::<ProtocolCriterion>(|c| {
        c.as_any().downcast_ref::<ProtocolCriterion>()?;
        Some(Box::new(ContextOnlyEvaluator("protocol")))
    });
    registry.register::<RoleDescriptorCriterion>(|c| {
        let c = c.as_any().downcast_ref::<RoleDescriptorCriterion>()?;
        Some(Box::new(EvaluableRoleDescriptorCredentialCriterion::new(
            c.role_descriptor().clone(),
        )))
    });
}

/// Creates a registry pre-populated with every built-in criterion kind: the
/// security-layer credential criteria, the KeyInfo criterion, and the SAML
/// criteria above.
#[must_use]
pub fn default_registry() -> EvaluableCredentialCriteriaRegistry {
    let mut registry = EvaluableCredentialCriteriaRegistry::with_defaults();
    osl_xmlsec::criteria::register_evaluators(&mut registry);
    register_evaluators(&mut registry);
    registry
}

/// Evaluator for criteria that describe exchange context rather than
/// credential content; always indeterminate.
#[derive(Debug, Clone, Copy)]
struct ContextOnlyEvaluator(&'static str);

impl EvaluableCredentialCriterion for ContextOnlyEvaluator {
    fn evaluate(&self, _credential: &Credential) -> CriterionMatch {
        tracing::debug!(
            criterion = self.0,
            "criterion describes exchange context, not credential content; undecidable"
        );
        CriterionMatch::Indeterminate
    }
}

/// Evaluates a [`RoleDescriptorCriterion`] against the key material the
/// descriptor publishes.
#[derive(Debug, Clone)]
pub struct EvaluableRoleDescriptorCredentialCriterion {
    role_descriptor: RoleDescriptor,
}

impl EvaluableRoleDescriptorCredentialCriterion {
    /// Creates an evaluator for the given role descriptor.
    #[must_use]
    pub fn new(role_descriptor: RoleDescriptor) -> Self {
        Self { role_descriptor }
    }
}

impl EvaluableCredentialCriterion for EvaluableRoleDescriptorCredentialCriterion {
    fn evaluate(&self, credential: &Credential) -> CriterionMatch {
        if self.role_descriptor.key_descriptors.is_empty() {
            tracing::debug!("role descriptor publishes no key material, criterion is undecidable");
            return CriterionMatch::Indeterminate;
        }

        let mut decidable = false;
        for key_descriptor in &self.role_descriptor.key_descriptors {
            let usage_compatible = key_descriptor.usage == UsageType::Unspecified
                || credential.usage() == UsageType::Unspecified
                || key_descriptor.usage == credential.usage();
            if !usage_compatible {
                continue;
            }

            let evaluator =
                EvaluableKeyInfoCredentialCriterion::new(Some(key_descriptor.key_info.clone()));
            match evaluator.evaluate(credential) {
                CriterionMatch::Match => return CriterionMatch::Match,
                CriterionMatch::NoMatch => decidable = true,
                CriterionMatch::Indeterminate => {}
            }
        }

        if decidable {
            CriterionMatch::NoMatch
        } else {
            CriterionMatch::Indeterminate
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::KeyDescriptor;
    use osl_xmlsec::keyinfo::KeyInfo;

    #[test]
    fn role_and_protocol_criteria_are_indeterminate() {
        let registry = default_registry();
        let credential = Credential::new().with_entity_id("https://idp.example.org");

        let role = EntityRoleCriterion::new(QName::idp_sso_descriptor());
        assert_eq!(
            registry.evaluate(&role, &credential),
            Some(CriterionMatch::Indeterminate)
        );

        let protocol = ProtocolCriterion::new("urn:oasis:names:tc:SAML:2.0:protocol");
        assert_eq!(
            registry.evaluate(&protocol, &credential),
            Some(CriterionMatch::Indeterminate)
        );
    }

    #[test]
    fn role_descriptor_matches_published_certificate() {
        let mut key_info = KeyInfo::new();
        key_info.x509_certificates.push(vec![1, 2, 3]);
        let descriptor = RoleDescriptor {
            role: Some(QName::idp_sso_descriptor()),
            key_descriptors: vec![KeyDescriptor {
                usage: UsageType::Signing,
                key_info,
            }],
            ..RoleDescriptor::default()
        };

        let registry = default_registry();
        let criterion = RoleDescriptorCriterion::new(descriptor);

        let matching = Credential::new()
            .with_usage(UsageType::Signing)
            .with_certificate(vec![1, 2, 3]);
        assert_eq!(
            registry.evaluate(&criterion, &matching),
            Some(CriterionMatch::Match)
        );

        let wrong_cert = Credential::new()
            .with_usage(UsageType::Signing)
            .with_certificate(vec![9, 9, 9]);
        assert_eq!(
            registry.evaluate(&criterion, &wrong_cert),
            Some(CriterionMatch::NoMatch)
        );

        // An encryption credential cannot be compared against signing-only
        // published keys, so the criterion stays undecidable for it.
        let encryption_only = Credential::new()
            .with_usage(UsageType::Encryption)
            .with_certificate(vec![1, 2, 3]);
        assert_eq!(
            registry.evaluate(&criterion, &encryption_only),
            Some(CriterionMatch::Indeterminate)
        );
    }

    #[test]
    fn descriptor_without_keys_is_indeterminate() {
        let registry = default_registry();
        let criterion = RoleDescriptorCriterion::new(RoleDescriptor::default());
        let credential = Credential::new().with_certificate(vec![1, 2, 3]);
        assert_eq!(
            registry.evaluate(&criterion, &credential),
            Some(CriterionMatch::Indeterminate)
        );
    }
}
