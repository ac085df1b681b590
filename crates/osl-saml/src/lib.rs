//! SAML 2.0 assertion model and validation-context construction.
//!
//! This crate sits on top of the credential and XML security layers and
//! provides:
//!
//! - [`assertion`] - the assertion object model with the accessor surface
//!   validation consumes
//! - [`context`] - message-exchange context types (peer, self, protocol,
//!   security parameters)
//! - [`http`] - the transport-level request accessor
//! - [`binding`] - receiver-endpoint resolution for the inbound binding
//! - [`criteria`] - SAML-level credential criteria and the composed default
//!   evaluator registry
//! - [`validate`] - the validation parameter map and its default builder
//!
//! All components are stateless or immutable after configuration and safe
//! for concurrent use across independent validation requests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod assertion;
pub mod binding;
pub mod context;
pub mod criteria;
pub mod error;
pub mod http;
pub mod validate;

pub use assertion::{Assertion, Conditions, Subject};
pub use context::{MessageContext, ProfileRequestContext, QName, RoleDescriptor};
pub use criteria::{default_registry, EntityRoleCriterion, ProtocolCriterion, RoleDescriptorCriterion};
pub use error::{SamlError, SamlResult};
pub use http::HttpRequestInfo;
pub use validate::{
    AssertionValidationInput, DefaultAssertionValidationContextBuilder, StaticParam,
    ValidationContext,
};
