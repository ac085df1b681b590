//! Validation parameters.
//!
//! The validation context is a map from named static-parameter keys to
//! opaque values, consumed read-only by a downstream assertion validator.
//! The key constants live at the top of this module.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;

use chrono::Duration;

use osl_security::criteria::CriteriaSet;
use osl_xmlsec::trust::SignatureTrustEngine;

/// Whether the assertion must be signed. Value: [`StaticParam::Bool`].
pub const SIGNATURE_REQUIRED: &str = "saml2.signature.required";

/// Criteria for resolving the signature verification credential.
/// Value: [`StaticParam::Criteria`].
pub const SIGNATURE_VALIDATION_CRITERIA_SET: &str = "saml2.signature.criteria";

/// Trust engine to run signature validation through.
/// Value: [`StaticParam::TrustEngine`].
pub const SIGNATURE_VALIDATION_TRUST_ENGINE: &str = "saml2.signature.trust_engine";

/// Holder-of-key presenter certificate (X.509 DER).
/// Value: [`StaticParam::Certificate`].
pub const SC_HOK_PRESENTER_CERT: &str = "saml2.sc.hok.presenter_cert";

/// Holder-of-key presenter public key (`SubjectPublicKeyInfo` DER).
/// Value: [`StaticParam::PublicKey`].
pub const SC_HOK_PRESENTER_KEY: &str = "saml2.sc.hok.presenter_key";

/// Valid subject-confirmation recipient endpoint URIs.
/// Value: [`StaticParam::StringSet`].
pub const SC_VALID_RECIPIENTS: &str = "saml2.sc.valid_recipients";

/// Valid subject-confirmation presenter addresses.
/// Value: [`StaticParam::AddressSet`].
pub const SC_VALID_ADDRESSES: &str = "saml2.sc.valid_addresses";

/// Whether subject-confirmation addresses should be checked.
/// Value: [`StaticParam::Bool`].
pub const SC_CHECK_ADDRESS: &str = "saml2.sc.check_address";

/// Valid audience URIs for audience-restriction conditions.
/// Value: [`StaticParam::StringSet`].
pub const COND_VALID_AUDIENCES: &str = "saml2.cond.valid_audiences";

/// Valid presenter addresses for authentication statements.
/// Value: [`StaticParam::AddressSet`].
pub const STMT_AUTHN_VALID_ADDRESSES: &str = "saml2.authn.valid_addresses";

/// Whether authentication-statement addresses should be checked.
/// Value: [`StaticParam::Bool`].
pub const STMT_AUTHN_CHECK_ADDRESS: &str = "saml2.authn.check_address";

/// Maximum allowed time since authentication.
/// Value: [`StaticParam::Duration`].
pub const STMT_AUTHN_MAX_TIME: &str = "saml2.authn.max_time";

/// A static validation parameter value.
#[derive(Clone)]
pub enum StaticParam {
    /// A boolean flag.
    Bool(bool),
    /// A credential criteria set.
    Criteria(Arc<CriteriaSet>),
    /// A signature trust engine reference.
    TrustEngine(Arc<dyn SignatureTrustEngine>),
    /// A set of strings (endpoint or audience URIs).
    StringSet(HashSet<String>),
    /// A set of network addresses.
    AddressSet(HashSet<IpAddr>),
    /// A time span.
    Duration(Duration),
    /// An X.509 certificate (DER).
    Certificate(Vec<u8>),
    /// A public key (`SubjectPublicKeyInfo` DER).
    PublicKey(Vec<u8>),
}

impl fmt::Debug for StaticParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => f.debug_tuple("Bool").field(v).finish(),
            Self::Criteria(c) => f.debug_tuple("Criteria").field(&c.len()).finish(),
            Self::TrustEngine(_) => f.write_str("TrustEngine(..)"),
            Self::StringSet(s) => f.debug_tuple("StringSet").field(s).finish(),
            Self::AddressSet(s) => f.debug_tuple("AddressSet").field(s).finish(),
            Self::Duration(d) => f.debug_tuple("Duration").field(d).finish(),
            Self::Certificate(c) => f.debug_tuple("Certificate").field(&c.len()).finish(),
            Self::PublicKey(k) => f.debug_tuple("PublicKey").field(&k.len()).finish(),
        }
    }
}

/// The static parameters an assertion validator consumes.
///
/// Built once per validation attempt, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ValidationContext {
    static_parameters: HashMap<&'static str, StaticParam>,
}

impl ValidationContext {
    /// Creates a context over the given parameter map.
    #[must_use]
    pub fn new(static_parameters: HashMap<&'static str, StaticParam>) -> Self {
        Self { static_parameters }
    }

    /// Looks up a parameter by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&StaticParam> {
        self.static_parameters.get(key)
    }

    /// Number of parameters present.
    #[must_use]
    pub fn len(&self) -> usize {
        self.static_parameters.len()
    }

    /// Returns true when no parameters are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.static_parameters.is_empty()
    }

    /// Whether the assertion must be signed.
    #[must_use]
    pub fn signature_required(&self) -> Option<bool> {
        match self.get(SIGNATURE_REQUIRED) {
            Some(StaticParam::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// The signature validation criteria set.
    #[must_use]
    pub fn signature_criteria(&self) -> Option<&CriteriaSet> {
        match self.get(SIGNATURE_VALIDATION_CRITERIA_SET) {
            Some(StaticParam::Criteria(c)) => Some(c),
            _ => None,
        }
    }

    /// The signature validation trust engine.
    #[must_use]
    pub fn trust_engine(&self) -> Option<&Arc<dyn SignatureTrustEngine>> {
        match self.get(SIGNATURE_VALIDATION_TRUST_ENGINE) {
            Some(StaticParam::TrustEngine(e)) => Some(e),
            _ => None,
        }
    }

    /// The valid subject-confirmation recipients.
    #[must_use]
    pub fn valid_recipients(&self) -> Option<&HashSet<String>> {
        match self.get(SC_VALID_RECIPIENTS) {
            Some(StaticParam::StringSet(s)) => Some(s),
            _ => None,
        }
    }

    /// The valid subject-confirmation addresses.
    #[must_use]
    pub fn valid_addresses(&self) -> Option<&HashSet<IpAddr>> {
        match self.get(SC_VALID_ADDRESSES) {
            Some(StaticParam::AddressSet(s)) => Some(s),
            _ => None,
        }
    }

    /// Whether subject-confirmation addresses should be checked.
    #[must_use]
    pub fn check_address(&self) -> Option<bool> {
        match self.get(SC_CHECK_ADDRESS) {
            Some(StaticParam::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    /// The valid audiences.
    #[must_use]
    pub fn valid_audiences(&self) -> Option<&HashSet<String>> {
        match self.get(COND_VALID_AUDIENCES) {
            Some(StaticParam::StringSet(s)) => Some(s),
            _ => None,
        }
    }

    /// The maximum allowed time since authentication.
    #[must_use]
    pub fn max_time_since_authn(&self) -> Option<Duration> {
        match self.get(STMT_AUTHN_MAX_TIME) {
            Some(StaticParam::Duration(d)) => Some(*d),
            _ => None,
        }
    }

    /// The holder-of-key presenter certificate.
    #[must_use]
    pub fn hok_presenter_certificate(&self) -> Option<&[u8]> {
        match self.get(SC_HOK_PRESENTER_CERT) {
            Some(StaticParam::Certificate(c)) => Some(c),
            _ => None,
        }
    }

    /// The holder-of-key presenter public key.
    #[must_use]
    pub fn hok_presenter_key(&self) -> Option<&[u8]> {
        match self.get(SC_HOK_PRESENTER_KEY) {
            Some(StaticParam::PublicKey(k)) => Some(k),
            _ => None,
        }
    }
}
