//! SAML Assertion types.
//!
//! Assertions contain statements about a subject made by an issuer. This
//! model carries what assertion validation consumes: issuer, subject
//! confirmations, conditions with audience restrictions, and the
//! authentication statement.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{SamlError, SamlResult};

/// Bearer subject confirmation method URI.
pub const SC_METHOD_BEARER: &str = "urn:oasis:names:tc:SAML:2.0:cm:bearer";

/// Holder-of-key subject confirmation method URI.
pub const SC_METHOD_HOLDER_OF_KEY: &str = "urn:oasis:names:tc:SAML:2.0:cm:holder-of-key";

/// Sender-vouches subject confirmation method URI.
pub const SC_METHOD_SENDER_VOUCHES: &str = "urn:oasis:names:tc:SAML:2.0:cm:sender-vouches";

/// SAML Assertion.
///
/// A package of information that supplies one or more statements made by a
/// SAML authority (the issuer).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Assertion {
    /// Unique identifier for this assertion.
    pub id: String,

    /// Version of the SAML protocol (always "2.0").
    #[serde(default = "default_version")]
    pub version: String,

    /// Timestamp when this assertion was issued.
    pub issue_instant: DateTime<Utc>,

    /// The entity ID of the identity provider that issued this assertion.
    pub issuer: String,

    /// The subject of this assertion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<Subject>,

    /// Conditions that must be evaluated for the assertion to be valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Conditions>,

    /// Authentication statement describing how the subject authenticated.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authn_statement: Option<AuthnStatement>,

    /// Attribute statement containing attributes about the subject.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attribute_statement: Option<AttributeStatement>,

    /// Whether this assertion carried a signature.
    #[serde(skip)]
    pub signed: bool,
}

fn default_version() -> String {
    "2.0".to_string()
}

impl Assertion {
    /// Creates a new assertion.
    #[must_use]
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            id: format!("_id{}", uuid::Uuid::new_v4()),
            version: "2.0".to_string(),
            issue_instant: Utc::now(),
            issuer: issuer.into(),
            subject: None,
            conditions: None,
            authn_statement: None,
            attribute_statement: None,
            signed: false,
        }
    }

    /// Creates a new assertion with a custom ID.
    #[must_use]
    pub fn with_id(id: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::new(issuer)
        }
    }

    /// Sets the subject.
    #[must_use]
    pub fn with_subject(mut self, subject: Subject) -> Self {
        self.subject = Some(subject);
        self
    }

    /// Sets the conditions.
    #[must_use]
    pub fn with_conditions(mut self, conditions: Conditions) -> Self {
        self.conditions = Some(conditions);
        self
    }

    /// Sets the authentication statement.
    #[must_use]
    pub fn with_authn_statement(mut self, statement: AuthnStatement) -> Self {
        self.authn_statement = Some(statement);
        self
    }

    /// Sets the attribute statement.
    #[must_use]
    pub fn with_attribute_statement(mut self, statement: AttributeStatement) -> Self {
        self.attribute_statement = Some(statement);
        self
    }

    /// The issuer entity ID.
    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// All audience values across the audience restrictions, in document
    /// order.
    #[must_use]
    pub fn audience_values(&self) -> Vec<&str> {
        self.conditions
            .iter()
            .flat_map(|c| c.audience_restrictions.iter())
            .flat_map(|r| r.audiences.iter())
            .map(String::as_str)
            .collect()
    }

    /// The subject confirmations, empty when no subject is present.
    #[must_use]
    pub fn subject_confirmations(&self) -> &[SubjectConfirmation] {
        self.subject
            .as_ref()
            .map_or(&[], |s| s.subject_confirmations.as_slice())
    }

    /// The authentication instant, when an authentication statement is
    /// present.
    #[must_use]
    pub fn authn_instant(&self) -> Option<DateTime<Utc>> {
        self.authn_statement.as_ref().map(|s| s.authn_instant)
    }

    /// Validates the assertion's time window and audience restrictions.
    ///
    /// # Errors
    ///
    /// Returns an error when the version is unsupported, the validity window
    /// excludes `now`, or an audience restriction does not name `audience`.
    pub fn validate(&self, audience: &str, now: DateTime<Utc>) -> SamlResult<()> {
        if self.version != "2.0" {
            return Err(SamlError::InvalidAssertion(format!(
                "unsupported SAML version: {}",
                self.version
            )));
        }

        if let Some(conditions) = &self.conditions {
            if let Some(not_before) = conditions.not_before {
                if now < not_before {
                    return Err(SamlError::AssertionNotYetValid);
                }
            }
            if let Some(not_on_or_after) = conditions.not_on_or_after {
                if now >= not_on_or_after {
                    return Err(SamlError::AssertionExpired);
                }
            }
            for restriction in &conditions.audience_restrictions {
                if !restriction.audiences.iter().any(|a| a == audience) {
                    return Err(SamlError::InvalidAudience {
                        expected: audience.to_string(),
                    });
                }
            }
        }

        Ok(())
    }
}

/// Name identifier for a subject.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameId {
    /// The identifier value.
    pub value: String,

    /// Name ID format URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl NameId {
    /// Creates a name ID with no stated format.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            format: None,
        }
    }
}

/// The subject of an assertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Subject {
    /// The subject's name identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name_id: Option<NameId>,

    /// How the subject may be confirmed.
    #[serde(default)]
    pub subject_confirmations: Vec<SubjectConfirmation>,
}

impl Subject {
    /// Creates a subject for the given name ID.
    #[must_use]
    pub fn new(name_id: NameId) -> Self {
        Self {
            name_id: Some(name_id),
            subject_confirmations: Vec::new(),
        }
    }

    /// Adds a subject confirmation.
    #[must_use]
    pub fn with_confirmation(mut self, confirmation: SubjectConfirmation) -> Self {
        self.subject_confirmations.push(confirmation);
        self
    }
}

/// A means by which the subject can be confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectConfirmation {
    /// Confirmation method URI.
    pub method: String,

    /// Constraints on the confirmation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject_confirmation_data: Option<SubjectConfirmationData>,
}

impl SubjectConfirmation {
    /// Creates a bearer confirmation.
    #[must_use]
    pub fn bearer() -> Self {
        Self {
            method: SC_METHOD_BEARER.to_string(),
            subject_confirmation_data: None,
        }
    }

    /// Creates a holder-of-key confirmation.
    #[must_use]
    pub fn holder_of_key() -> Self {
        Self {
            method: SC_METHOD_HOLDER_OF_KEY.to_string(),
            subject_confirmation_data: None,
        }
    }

    /// Sets the confirmation data.
    #[must_use]
    pub fn with_data(mut self, data: SubjectConfirmationData) -> Self {
        self.subject_confirmation_data = Some(data);
        self
    }
}

/// Constraints on a subject confirmation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubjectConfirmationData {
    /// Earliest instant the confirmation is valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,

    /// Instant from which the confirmation is no longer valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,

    /// URI of the endpoint the assertion was meant to be delivered to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<String>,

    /// ID of the request this assertion responds to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_response_to: Option<String>,

    /// Network address the presenter must come from.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

/// Conditions on the validity of an assertion.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conditions {
    /// Earliest validity instant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,

    /// Instant from which the assertion is no longer valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub not_on_or_after: Option<DateTime<Utc>>,

    /// Audience restrictions; each must be satisfied independently.
    #[serde(default)]
    pub audience_restrictions: Vec<AudienceRestriction>,
}

impl Conditions {
    /// Creates conditions valid for the given window.
    #[must_use]
    pub fn valid_between(not_before: DateTime<Utc>, not_on_or_after: DateTime<Utc>) -> Self {
        Self {
            not_before: Some(not_before),
            not_on_or_after: Some(not_on_or_after),
            audience_restrictions: Vec::new(),
        }
    }

    /// Adds an audience restriction naming a single audience.
    #[must_use]
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience_restrictions.push(AudienceRestriction {
            audiences: vec![audience.into()],
        });
        self
    }
}

/// A set of audiences the assertion is addressed to.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AudienceRestriction {
    /// Audience URIs; satisfying any one satisfies the restriction.
    pub audiences: Vec<String>,
}

/// Statement about an act of authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthnStatement {
    /// When the authentication took place.
    pub authn_instant: DateTime<Utc>,

    /// Session index assigned by the identity provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_index: Option<String>,

    /// Authentication context class URI.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub authn_context_class: Option<String>,
}

impl AuthnStatement {
    /// Creates a statement for an authentication at the given instant.
    #[must_use]
    pub fn new(authn_instant: DateTime<Utc>) -> Self {
        Self {
            authn_instant,
            session_index: None,
            authn_context_class: None,
        }
    }
}

/// Statement carrying subject attributes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AttributeStatement {
    /// Attribute name to values.
    pub attributes: HashMap<String, Vec<String>>,
}
