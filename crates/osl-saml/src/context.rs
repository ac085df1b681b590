//! Message-exchange context types.
//!
//! These are the read-only collaborator surfaces the validation-context
//! builder pulls from: who the peer is and in what role, which protocol the
//! inbound message arrived under, who we are, and which security parameters
//! were negotiated for the exchange.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use osl_security::credential::UsageType;
use osl_xmlsec::keyinfo::KeyInfo;
use osl_xmlsec::trust::SignatureTrustEngine;

/// SAML 2.0 metadata namespace URI.
pub const MD_NS: &str = "urn:oasis:names:tc:SAML:2.0:metadata";

/// SAML 2.0 protocol namespace URI.
pub const SAMLP_NS: &str = "urn:oasis:names:tc:SAML:2.0:protocol";

/// A qualified XML name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QName {
    namespace: String,
    local_part: String,
}

impl QName {
    /// Creates a qualified name.
    #[must_use]
    pub fn new(namespace: impl Into<String>, local_part: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            local_part: local_part.into(),
        }
    }

    /// The namespace URI.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The local part.
    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    /// The `md:IDPSSODescriptor` role name.
    #[must_use]
    pub fn idp_sso_descriptor() -> Self {
        Self::new(MD_NS, "IDPSSODescriptor")
    }

    /// The `md:SPSSODescriptor` role name.
    #[must_use]
    pub fn sp_sso_descriptor() -> Self {
        Self::new(MD_NS, "SPSSODescriptor")
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace, self.local_part)
    }
}

/// Key material published for a role, with its intended usage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyDescriptor {
    /// Usage constraint on the key.
    pub usage: UsageType,
    /// The published key information.
    pub key_info: KeyInfo,
}

/// The slice of a metadata entity descriptor relevant to one role.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoleDescriptor {
    /// The role element name.
    pub role: Option<QName>,
    /// The owning entity's ID.
    pub entity_id: Option<String>,
    /// Protocols the role supports.
    pub protocols: Vec<String>,
    /// Published key material.
    pub key_descriptors: Vec<KeyDescriptor>,
}

/// Context describing the peer entity of the exchange.
#[derive(Debug, Clone, Default)]
pub struct SamlPeerEntityContext {
    /// The peer's entity ID.
    pub entity_id: Option<String>,
    /// The role the peer is acting in.
    pub role: Option<QName>,
    /// Metadata resolved for the peer.
    pub metadata: Option<SamlMetadataContext>,
}

/// Context carrying resolved metadata for an entity.
#[derive(Debug, Clone, Default)]
pub struct SamlMetadataContext {
    /// The role descriptor in effect for the exchange.
    pub role_descriptor: Option<RoleDescriptor>,
}

/// Context describing the protocol of the exchange.
#[derive(Debug, Clone, Default)]
pub struct SamlProtocolContext {
    /// Protocol URI in use.
    pub protocol: Option<String>,
}

/// Context describing the local deployment.
#[derive(Debug, Clone, Default)]
pub struct SamlSelfEntityContext {
    /// The deployment's own entity ID.
    pub entity_id: Option<String>,
}

/// Signature validation parameters negotiated for the exchange.
#[derive(Clone, Default)]
pub struct SignatureValidationParameters {
    /// The trust engine that signature validation should run through.
    pub trust_engine: Option<Arc<dyn SignatureTrustEngine>>,
}

impl fmt::Debug for SignatureValidationParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureValidationParameters")
            .field("trust_engine", &self.trust_engine.is_some())
            .finish()
    }
}

/// Context carrying negotiated security parameters.
#[derive(Debug, Clone, Default)]
pub struct SecurityParametersContext {
    /// Parameters for signature validation, if negotiated.
    pub signature_validation: Option<SignatureValidationParameters>,
}

/// Per-message context of one direction of the exchange.
#[derive(Debug, Clone, Default)]
pub struct MessageContext {
    /// Peer entity subcontext.
    pub peer_entity: Option<SamlPeerEntityContext>,
    /// Self entity subcontext.
    pub self_entity: Option<SamlSelfEntityContext>,
    /// Protocol subcontext.
    pub protocol: Option<SamlProtocolContext>,
    /// Security parameters subcontext.
    pub security_parameters: Option<SecurityParametersContext>,
    /// Receiver endpoint URI recorded by the binding layer, when it differs
    /// from what the raw request implies.
    pub received_endpoint: Option<String>,
}

impl MessageContext {
    /// Creates an empty message context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the peer entity subcontext.
    #[must_use]
    pub fn with_peer_entity(mut self, peer: SamlPeerEntityContext) -> Self {
        self.peer_entity = Some(peer);
        self
    }

    /// Sets the self entity subcontext.
    #[must_use]
    pub fn with_self_entity(mut self, entity_id: impl Into<String>) -> Self {
        self.self_entity = Some(SamlSelfEntityContext {
            entity_id: Some(entity_id.into()),
        });
        self
    }

    /// Sets the protocol subcontext.
    #[must_use]
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(SamlProtocolContext {
            protocol: Some(protocol.into()),
        });
        self
    }

    /// Sets the security parameters subcontext.
    #[must_use]
    pub fn with_security_parameters(mut self, parameters: SecurityParametersContext) -> Self {
        self.security_parameters = Some(parameters);
        self
    }
}

/// The in-process state of one profile request: currently the inbound
/// message context.
#[derive(Debug, Clone, Default)]
pub struct ProfileRequestContext {
    inbound_message_context: Option<MessageContext>,
}

impl ProfileRequestContext {
    /// Creates an empty profile request context.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the inbound message context.
    #[must_use]
    pub fn with_inbound_message_context(mut self, context: MessageContext) -> Self {
        self.inbound_message_context = Some(context);
        self
    }

    /// The inbound message context, if present.
    #[must_use]
    pub fn inbound_message_context(&self) -> Option<&MessageContext> {
        self.inbound_message_context.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qname_display() {
        let qname = QName::sp_sso_descriptor();
        assert_eq!(
            qname.to_string(),
            "{urn:oasis:names:tc:SAML:2.0:metadata}SPSSODescriptor"
        );
    }

    #[test]
    fn context_builders_nest() {
        let context = ProfileRequestContext::new().with_inbound_message_context(
            MessageContext::new()
                .with_self_entity("https://sp.example.org")
                .with_protocol(SAMLP_NS),
        );

        let inbound = context.inbound_message_context().expect("inbound set");
        assert_eq!(
            inbound
                .self_entity
                .as_ref()
                .and_then(|s| s.entity_id.as_deref()),
            Some("https://sp.example.org")
        );
        assert_eq!(
            inbound.protocol.as_ref().and_then(|p| p.protocol.as_deref()),
            Some(SAMLP_NS)
        );
    }
}
