//! Credential and criteria layer for SAML trust decisions.
//!
//! This crate provides the security primitives consumed by the XML signature
//! and assertion validation layers:
//!
//! - [`credential`] - the immutable [`Credential`](credential::Credential)
//!   bundle of key material, entity identifier and usage tag
//! - [`criteria`] - typed criterion value objects and the type-indexed
//!   [`CriteriaSet`](criteria::CriteriaSet)
//! - [`registry`] - the evaluable-criterion registry mapping criterion types
//!   to evaluators
//! - [`evaluators`] - the built-in evaluators, all returning the three-valued
//!   [`CriterionMatch`](criteria::CriterionMatch)
//!
//! # Concurrency
//!
//! Everything here is immutable after construction and safe to share across
//! validation requests. The registry is the one piece of mutable
//! configuration: populate it during startup and treat it as read-only
//! afterwards.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod credential;
pub mod criteria;
pub mod error;
pub mod evaluators;
pub mod registry;

pub use credential::{Credential, UsageType};
pub use criteria::{CriteriaSet, Criterion, CriterionMatch};
pub use error::{SecurityError, SecurityResult};
pub use registry::{EvaluableCredentialCriteriaRegistry, EvaluableCredentialCriterion};
