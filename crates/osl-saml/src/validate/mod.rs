//! Assertion validation support.
//!
//! [`DefaultAssertionValidationContextBuilder`] assembles the static
//! [`ValidationContext`] parameter map a profile-specific assertion validator
//! consumes. The parameter key constants live in [`params`].

mod builder;
pub mod params;

pub use builder::{AssertionValidationInput, DefaultAssertionValidationContextBuilder};
pub use params::{StaticParam, ValidationContext};
