//! Default assertion validation-context construction.
//!
//! Turns {message-exchange context, assertion, HTTP request} into the static
//! parameter map a SAML 2.0 assertion validator consumes. Every policy hook
//! is independently overridable; the defaults implement the standard profile
//! behavior.

use std::collections::{HashMap, HashSet};
use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::sync::Arc;

use chrono::Duration;

use osl_security::credential::UsageType;
use osl_security::criteria::{CriteriaSet, EntityIdCriterion, UsageCriterion};

use crate::assertion::Assertion;
use crate::binding;
use crate::context::{MessageContext, ProfileRequestContext, SecurityParametersContext};
use crate::criteria::{EntityRoleCriterion, ProtocolCriterion, RoleDescriptorCriterion};
use crate::http::HttpRequestInfo;
use crate::validate::params::{self, StaticParam, ValidationContext};

/// Read-only bundle of everything one assertion validation attempt starts
/// from. Constructed per attempt, discarded after.
#[derive(Debug, Clone, Copy)]
pub struct AssertionValidationInput<'a> {
    profile_request_context: &'a ProfileRequestContext,
    assertion: &'a Assertion,
    http_request: &'a HttpRequestInfo,
}

impl<'a> AssertionValidationInput<'a> {
    /// Creates the input bundle.
    #[must_use]
    pub const fn new(
        profile_request_context: &'a ProfileRequestContext,
        assertion: &'a Assertion,
        http_request: &'a HttpRequestInfo,
    ) -> Self {
        Self {
            profile_request_context,
            assertion,
            http_request,
        }
    }

    /// The in-process message-exchange context.
    #[must_use]
    pub const fn profile_request_context(&self) -> &'a ProfileRequestContext {
        self.profile_request_context
    }

    /// The assertion being validated.
    #[must_use]
    pub const fn assertion(&self) -> &'a Assertion {
        self.assertion
    }

    /// The originating HTTP request.
    #[must_use]
    pub const fn http_request(&self) -> &'a HttpRequestInfo {
        self.http_request
    }
}

type ContextPredicate = Box<dyn Fn(&ProfileRequestContext) -> bool + Send + Sync>;
type AudiencesFn = Box<dyn Fn(&ProfileRequestContext) -> HashSet<String> + Send + Sync>;
type MaxTimeFn = Box<dyn Fn(&ProfileRequestContext) -> Option<Duration> + Send + Sync>;
type CriteriaFn = Box<dyn Fn(&ProfileRequestContext, &Assertion) -> Option<CriteriaSet> + Send + Sync>;
type AttesterKeyFn = Box<dyn Fn(&AssertionValidationInput<'_>) -> Option<Vec<u8>> + Send + Sync>;
type SecurityParametersLookup = Box<
    dyn for<'a> Fn(&'a ProfileRequestContext) -> Option<&'a SecurityParametersContext>
        + Send
        + Sync,
>;

/// Builds a [`ValidationContext`] from an [`AssertionValidationInput`] with
/// default behavior for each parameter group.
///
/// Defaults: a signature is always required, addresses are always checked,
/// the self entity ID is not added as a valid recipient, and no additional
/// audiences, authentication age limit or caller-supplied signature criteria
/// are configured.
pub struct DefaultAssertionValidationContextBuilder {
    signature_required: ContextPredicate,
    check_address: ContextPredicate,
    include_self_entity_id_as_recipient: ContextPredicate,
    additional_audiences: Option<AudiencesFn>,
    maximum_time_since_authn: Option<MaxTimeFn>,
    signature_criteria_set: Option<CriteriaFn>,
    attester_public_key: Option<AttesterKeyFn>,
    security_parameters_lookup: SecurityParametersLookup,
}

impl Default for DefaultAssertionValidationContextBuilder {
    fn default() -> Self {
        Self {
            signature_required: Box::new(|_| true),
            check_address: Box::new(|_| true),
            include_self_entity_id_as_recipient: Box::new(|_| false),
            additional_audiences: None,
            maximum_time_since_authn: None,
            signature_criteria_set: None,
            attester_public_key: None,
            security_parameters_lookup: Box::new(|prc: &ProfileRequestContext| {
                prc.inbound_message_context()
                    .and_then(|mc| mc.security_parameters.as_ref())
            }),
        }
    }
}

impl DefaultAssertionValidationContextBuilder {
    /// Creates a builder with all hooks at their defaults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the predicate deciding whether an assertion signature is
    /// required. Default: always true.
    #[must_use]
    pub fn with_signature_required(
        mut self,
        predicate: impl Fn(&ProfileRequestContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.signature_required = Box::new(predicate);
        self
    }

    /// Sets the predicate deciding whether the assertion's network addresses
    /// should be checked. Default: always true.
    #[must_use]
    pub fn with_check_address(
        mut self,
        predicate: impl Fn(&ProfileRequestContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.check_address = Box::new(predicate);
        self
    }

    /// Sets the predicate deciding whether the self entity ID counts as a
    /// valid recipient. Default: always false.
    #[must_use]
    pub fn with_include_self_entity_id_as_recipient(
        mut self,
        predicate: impl Fn(&ProfileRequestContext) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.include_self_entity_id_as_recipient = Box::new(predicate);
        self
    }

    /// Sets the function supplying additional valid audiences. Default: none.
    #[must_use]
    pub fn with_additional_audiences(
        mut self,
        function: impl Fn(&ProfileRequestContext) -> HashSet<String> + Send + Sync + 'static,
    ) -> Self {
        self.additional_audiences = Some(Box::new(function));
        self
    }

    /// Sets the function supplying the maximum allowed time since
    /// authentication. Default: none.
    #[must_use]
    pub fn with_maximum_time_since_authn(
        mut self,
        function: impl Fn(&ProfileRequestContext) -> Option<Duration> + Send + Sync + 'static,
    ) -> Self {
        self.maximum_time_since_authn = Some(Box::new(function));
        self
    }

    /// Sets the function supplying a caller-side signature criteria set,
    /// which takes precedence over internally derived criteria.
    /// Default: none.
    #[must_use]
    pub fn with_signature_criteria_set(
        mut self,
        function: impl Fn(&ProfileRequestContext, &Assertion) -> Option<CriteriaSet>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.signature_criteria_set = Some(Box::new(function));
        self
    }

    /// Sets the function supplying the attester's proof-of-possession public
    /// key, for non-X.509 holder-of-key schemes. Default: none.
    #[must_use]
    pub fn with_attester_public_key(
        mut self,
        function: impl Fn(&AssertionValidationInput<'_>) -> Option<Vec<u8>> + Send + Sync + 'static,
    ) -> Self {
        self.attester_public_key = Some(Box::new(function));
        self
    }

    /// Sets the strategy resolving the [`SecurityParametersContext`].
    /// Default: the inbound message context's security-parameters
    /// subcontext.
    #[must_use]
    pub fn with_security_parameters_lookup(
        mut self,
        lookup: impl for<'a> Fn(&'a ProfileRequestContext) -> Option<&'a SecurityParametersContext>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        self.security_parameters_lookup = Box::new(lookup);
        self
    }

    /// Builds the static parameter map for the given input.
    #[must_use]
    pub fn build(&self, input: &AssertionValidationInput<'_>) -> ValidationContext {
        let prc = input.profile_request_context();
        let mut static_params: HashMap<&'static str, StaticParam> = HashMap::new();

        // For signature validation.
        static_params.insert(
            params::SIGNATURE_REQUIRED,
            StaticParam::Bool((self.signature_required)(prc)),
        );
        static_params.insert(
            params::SIGNATURE_VALIDATION_CRITERIA_SET,
            StaticParam::Criteria(Arc::new(self.signature_criteria(input))),
        );
        if let Some(security_parameters) = (self.security_parameters_lookup)(prc) {
            if let Some(engine) = security_parameters
                .signature_validation
                .as_ref()
                .and_then(|sv| sv.trust_engine.clone())
            {
                static_params.insert(
                    params::SIGNATURE_VALIDATION_TRUST_ENGINE,
                    StaticParam::TrustEngine(engine),
                );
            }
        }

        // For HoK subject confirmation.
        if let Some(certificate) = self.attester_certificate(input) {
            static_params.insert(
                params::SC_HOK_PRESENTER_CERT,
                StaticParam::Certificate(certificate),
            );
        }
        if let Some(key) = self
            .attester_public_key
            .as_ref()
            .and_then(|f| f(input))
        {
            static_params.insert(params::SC_HOK_PRESENTER_KEY, StaticParam::PublicKey(key));
        }

        let valid_addresses = self.valid_addresses(input);
        let check_address_enabled = (self.check_address)(prc);

        // For SubjectConfirmationData.
        static_params.insert(
            params::SC_VALID_RECIPIENTS,
            StaticParam::StringSet(self.valid_recipients(input)),
        );
        static_params.insert(
            params::SC_VALID_ADDRESSES,
            StaticParam::AddressSet(valid_addresses.clone()),
        );
        static_params.insert(
            params::SC_CHECK_ADDRESS,
            StaticParam::Bool(check_address_enabled),
        );

        // For the Audience condition.
        static_params.insert(
            params::COND_VALID_AUDIENCES,
            StaticParam::StringSet(self.valid_audiences(input)),
        );

        // For AuthnStatement.
        static_params.insert(
            params::STMT_AUTHN_VALID_ADDRESSES,
            StaticParam::AddressSet(valid_addresses),
        );
        static_params.insert(
            params::STMT_AUTHN_CHECK_ADDRESS,
            StaticParam::Bool(check_address_enabled),
        );
        if let Some(max_time) = self.maximum_time_since_authn.as_ref().and_then(|f| f(prc)) {
            static_params.insert(params::STMT_AUTHN_MAX_TIME, StaticParam::Duration(max_time));
        }

        tracing::trace!(?static_params, "built static parameters map");

        ValidationContext::new(static_params)
    }

    /// Resolves the signature validation criteria set.
    ///
    /// The caller-supplied criteria function is evaluated first, when
    /// configured. An entity-id criterion from the assertion's issuer, a
    /// signing usage criterion, and the role-descriptor / entity-role /
    /// protocol criteria from the inbound context are then each added only
    /// when no criterion of that kind is already present.
    fn signature_criteria(&self, input: &AssertionValidationInput<'_>) -> CriteriaSet {
        let mut criteria = CriteriaSet::new();

        if let Some(function) = &self.signature_criteria_set {
            if let Some(dynamic) = function(input.profile_request_context(), input.assertion()) {
                criteria.merge(dynamic);
            }
        }

        if !criteria.contains::<EntityIdCriterion>() {
            let issuer = input.assertion().issuer().trim();
            if !issuer.is_empty() {
                tracing::debug!(issuer, "adding internally-generated entity id criterion");
                criteria.insert(EntityIdCriterion::new(issuer));
            }
        }

        if !criteria.contains::<UsageCriterion>() {
            tracing::debug!("adding internally-generated signing usage criterion");
            criteria.insert(UsageCriterion::new(UsageType::Signing));
        }

        if let Some(inbound) = input.profile_request_context().inbound_message_context() {
            populate_signature_criteria_from_inbound(&mut criteria, inbound);
        }

        tracing::debug!(criteria = criteria.len(), "resolved signature validation criteria set");
        criteria
    }

    /// The attester's certificate: the peer TLS certificate of the request,
    /// when one was presented. Absence is normal (no mutual TLS) and only
    /// rules out holder-of-key proof via client certificate.
    fn attester_certificate(&self, input: &AssertionValidationInput<'_>) -> Option<Vec<u8>> {
        match input.http_request().peer_certificate() {
            Some(certificate) => Some(certificate.to_vec()),
            None => {
                tracing::debug!(
                    "peer TLS certificate was not present; holder-of-key proof-of-possession \
                     via client TLS certificate will not be possible"
                );
                None
            }
        }
    }

    /// The valid recipient endpoints: the resolved actual receiver endpoint
    /// of the inbound binding, plus the self entity ID when enabled.
    fn valid_recipients(&self, input: &AssertionValidationInput<'_>) -> HashSet<String> {
        let mut valid_recipients = HashSet::new();

        match binding::actual_receiver_endpoint_uri(
            input.profile_request_context().inbound_message_context(),
            input.http_request(),
        ) {
            Ok(endpoint) => {
                valid_recipients.insert(endpoint);
            }
            Err(e) => {
                tracing::warn!(error = %e, "attempt to resolve recipient endpoint failed");
            }
        }

        if (self.include_self_entity_id_as_recipient)(input.profile_request_context()) {
            if let Some(entity_id) = self.self_entity_id(input) {
                valid_recipients.insert(entity_id);
            }
        }

        tracing::debug!(?valid_recipients, "resolved valid subject confirmation recipients");
        valid_recipients
    }

    /// The valid presenter addresses: every address the attester's transport
    /// address resolves to. Resolution failure yields an empty set with a
    /// warning, never an error.
    fn valid_addresses(&self, input: &AssertionValidationInput<'_>) -> HashSet<IpAddr> {
        let attester_address = self.attester_ip_address(input);
        tracing::debug!(address = %attester_address, "saw attester address");

        if attester_address.is_empty() {
            tracing::warn!(
                "could not determine attester IP address; validation of the assertion may or \
                 may not succeed"
            );
            return HashSet::new();
        }

        match resolve_addresses(&attester_address) {
            Ok(addresses) => {
                tracing::debug!(?addresses, "resolved valid subject confirmation addresses");
                addresses
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "processing of attester address failed; validation of the assertion may or \
                     may not succeed"
                );
                HashSet::new()
            }
        }
    }

    /// The attester's transport address, from the HTTP request.
    fn attester_ip_address(&self, input: &AssertionValidationInput<'_>) -> String {
        input.http_request().remote_addr().to_string()
    }

    /// The valid audiences: the self entity ID plus any configured
    /// additional audiences.
    fn valid_audiences(&self, input: &AssertionValidationInput<'_>) -> HashSet<String> {
        let mut valid_audiences = HashSet::new();

        if let Some(entity_id) = self.self_entity_id(input) {
            valid_audiences.insert(entity_id);
        }

        if let Some(function) = &self.additional_audiences {
            valid_audiences.extend(function(input.profile_request_context()));
        }

        tracing::debug!(?valid_audiences, "resolved valid audiences");
        valid_audiences
    }

    /// The deployment's own entity ID from the inbound self-entity context.
    fn self_entity_id(&self, input: &AssertionValidationInput<'_>) -> Option<String> {
        input
            .profile_request_context()
            .inbound_message_context()
            .and_then(|mc| mc.self_entity.as_ref())
            .and_then(|se| se.entity_id.clone())
    }
}

/// Adds the role-descriptor, entity-role and protocol criteria derivable
/// from the inbound message context, each only when absent and when the
/// underlying context data is available.
fn populate_signature_criteria_from_inbound(criteria: &mut CriteriaSet, inbound: &MessageContext) {
    if let Some(peer) = &inbound.peer_entity {
        if !criteria.contains::<RoleDescriptorCriterion>() {
            if let Some(role_descriptor) = peer
                .metadata
                .as_ref()
                .and_then(|md| md.role_descriptor.clone())
            {
                criteria.insert(RoleDescriptorCriterion::new(role_descriptor));
            }
        }
        if !criteria.contains::<EntityRoleCriterion>() {
            if let Some(role) = peer.role.clone() {
                criteria.insert(EntityRoleCriterion::new(role));
            }
        }
    }

    if !criteria.contains::<ProtocolCriterion>() {
        if let Some(protocol) = inbound
            .protocol
            .as_ref()
            .and_then(|p| p.protocol.as_deref())
        {
            criteria.insert(ProtocolCriterion::new(protocol));
        }
    }
}

/// Resolves a transport address to the set of IP addresses it names: a
/// literal parses directly, anything else goes through hostname resolution.
fn resolve_addresses(address: &str) -> std::io::Result<HashSet<IpAddr>> {
    if let Ok(ip) = address.parse::<IpAddr>() {
        return Ok(HashSet::from([ip]));
    }
    if let Ok(socket) = address.parse::<SocketAddr>() {
        return Ok(HashSet::from([socket.ip()]));
    }
    let addresses = (address, 0u16)
        .to_socket_addrs()?
        .map(|sa| sa.ip())
        .collect();
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn literal_addresses_resolve_without_lookup() {
        let addresses = resolve_addresses("192.0.2.7").expect("literal resolves");
        assert_eq!(addresses.len(), 1);
        assert!(addresses.contains(&"192.0.2.7".parse::<IpAddr>().unwrap()));

        let addresses = resolve_addresses("2001:db8::1").expect("literal resolves");
        assert!(addresses.contains(&"2001:db8::1".parse::<IpAddr>().unwrap()));
    }

    #[test]
    fn socket_address_strips_port() {
        let addresses = resolve_addresses("192.0.2.7:49152").expect("socket literal resolves");
        assert!(addresses.contains(&"192.0.2.7".parse::<IpAddr>().unwrap()));
    }

    #[test]
    fn localhost_resolves_to_loopback() {
        let addresses = resolve_addresses("localhost").expect("localhost resolves");
        assert!(addresses
            .iter()
            .all(|ip| ip.is_loopback()));
        assert!(!addresses.is_empty());
    }
}
