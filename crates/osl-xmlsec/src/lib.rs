//! XML Signature and XML Encryption support for SAML processing.
//!
//! This crate provides the XML security machinery sitting between the
//! credential layer and the SAML profile layer:
//!
//! - [`keyinfo`] - the KeyInfo element family as typed structures plus the
//!   same-document id index
//! - [`xml`] - a bounded quick-xml reader for those structures
//! - [`encrypted_key`] - the depth-limited `KeyInfoReference` encrypted-key
//!   resolver
//! - [`agreement`] - key agreement processors (ECDH-ES with the concat KDF)
//! - [`signature`] - signature representation and the single-credential
//!   [`SignatureValidator`](signature::SignatureValidator)
//! - [`trust`] - trust engines combining criteria filtering with signature
//!   validation
//! - [`criteria`] - the KeyInfo-based credential criterion
//!
//! All components are immutable after configuration and safe for concurrent
//! use across independent validation requests.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod agreement;
pub mod criteria;
pub mod encrypted_key;
pub mod error;
pub mod keyinfo;
pub mod signature;
pub mod spki;
pub mod trust;
pub mod xml;

pub use criteria::{register_evaluators, KeyInfoCriterion};
pub use encrypted_key::SimpleKeyInfoReferenceEncryptedKeyResolver;
pub use error::{XmlSecError, XmlSecResult};
pub use keyinfo::{DocumentIdIndex, EncryptedData, EncryptedKey, KeyInfo, KeyInfoReference};
pub use signature::{Signature, SignatureAlgorithm, SignatureValidationError, SignatureValidator};
pub use trust::{ExplicitKeySignatureTrustEngine, SignatureTrustEngine};
