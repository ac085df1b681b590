//! Key agreement.
//!
//! A [`KeyAgreementProcessor`] performs a keyed agreement operation between
//! two parties' credentials and derives a shared symmetric key. The public
//! credential belongs to whichever party is *not* performing the local private
//! operation: the recipient's public key when encrypting, the originator's
//! when decrypting.

use std::collections::HashMap;
use std::sync::Arc;

use aws_lc_rs::{agreement, digest};
use thiserror::Error;

use osl_security::credential::Credential;

use crate::spki::{self, EcCurve, VerificationKey};

/// Algorithm URI for Elliptic Curve Diffie-Hellman (ephemeral-static).
pub const ECDH_ES: &str = "http://www.w3.org/2009/xmlenc11#ECDH-ES";

/// Key agreement failure.
#[derive(Debug, Error)]
pub enum KeyAgreementError {
    /// The algorithm identifier is not supported.
    #[error("unsupported key agreement algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Key material was missing or structurally invalid.
    #[error("invalid key material: {0}")]
    InvalidKeyMaterial(String),

    /// A required agreement parameter was not supplied.
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),

    /// A supplied parameter value is unusable.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// The underlying cryptographic primitive rejected the operation.
    #[error("key agreement operation failed: {0}")]
    OperationFailed(String),
}

/// Parameters for the concat key derivation function (NIST SP 800-56A).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConcatKdfParams {
    /// Digest algorithm name (`SHA-256`, `SHA-384`, ...).
    pub digest: String,
    /// `AlgorithmID` component of the OtherInfo field.
    pub algorithm_id: Vec<u8>,
    /// `PartyUInfo` component of the OtherInfo field.
    pub party_u_info: Vec<u8>,
    /// `PartyVInfo` component of the OtherInfo field.
    pub party_v_info: Vec<u8>,
}

/// A single parameter to an agreement operation.
#[derive(Debug, Clone)]
pub enum KeyAgreementParameter {
    /// The local party's private credential (decryption side). When absent,
    /// a fresh ephemeral key is generated (encryption side).
    PrivateCredential(Credential),
    /// Key derivation parameters.
    ConcatKdf(ConcatKdfParams),
    /// An opaque nonce carried through to the derived credential.
    Nonce(Vec<u8>),
}

/// Ordered collection of agreement parameters.
///
/// Processors copy the collection internally before use; mutating the
/// caller's instance after `execute` returns never affects the result.
#[derive(Debug, Clone, Default)]
pub struct KeyAgreementParameters {
    parameters: Vec<KeyAgreementParameter>,
}

impl KeyAgreementParameters {
    /// Creates an empty parameter collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a parameter.
    #[must_use]
    pub fn with(mut self, parameter: KeyAgreementParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Appends a parameter in place.
    pub fn push(&mut self, parameter: KeyAgreementParameter) {
        self.parameters.push(parameter);
    }

    /// The first private credential parameter, if any.
    #[must_use]
    pub fn private_credential(&self) -> Option<&Credential> {
        self.parameters.iter().find_map(|p| match p {
            KeyAgreementParameter::PrivateCredential(credential) => Some(credential),
            _ => None,
        })
    }

    /// The first concat KDF parameter, if any.
    #[must_use]
    pub fn concat_kdf(&self) -> Option<&ConcatKdfParams> {
        self.parameters.iter().find_map(|p| match p {
            KeyAgreementParameter::ConcatKdf(params) => Some(params),
            _ => None,
        })
    }

    /// Iterates over the parameters in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &KeyAgreementParameter> {
        self.parameters.iter()
    }

    /// Number of parameters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    /// Returns true when no parameters are present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }
}

/// The result of a key agreement operation: a credential wrapping the derived
/// key plus the inputs needed to communicate or audit the operation.
#[derive(Debug, Clone)]
pub struct KeyAgreementCredential {
    credential: Credential,
    algorithm: String,
    key_algorithm: String,
    key_length: usize,
    originator_public_key: Option<Vec<u8>>,
    parameters: KeyAgreementParameters,
}

impl KeyAgreementCredential {
    /// The credential holding the derived secret key.
    #[must_use]
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// The derived secret key bytes.
    #[must_use]
    pub fn secret_key(&self) -> &[u8] {
        self.credential.secret_key().unwrap_or_default()
    }

    /// The agreement algorithm URI this credential was derived under.
    #[must_use]
    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    /// The algorithm the derived key is intended for (e.g. `AES`).
    #[must_use]
    pub fn key_algorithm(&self) -> &str {
        &self.key_algorithm
    }

    /// The derived key length in bits.
    #[must_use]
    pub const fn key_length(&self) -> usize {
        self.key_length
    }

    /// The ephemeral public key (`SubjectPublicKeyInfo` DER) generated for
    /// the operation, when the local party had no static private credential.
    #[must_use]
    pub fn originator_public_key(&self) -> Option<&[u8]> {
        self.originator_public_key.as_deref()
    }

    /// The internal copy of the parameters the operation ran with.
    #[must_use]
    pub fn parameters(&self) -> &KeyAgreementParameters {
        &self.parameters
    }
}

/// Component performing a key agreement operation.
pub trait KeyAgreementProcessor: Send + Sync {
    /// The key agreement algorithm URI, fixed per processor instance.
    fn algorithm(&self) -> &'static str;

    /// Performs the agreement and derives a new credential.
    ///
    /// # Errors
    ///
    /// Fails when the algorithm or key material is unsupported or invalid,
    /// when required parameters are missing, or when the underlying primitive
    /// rejects the inputs.
    fn execute(
        &self,
        public_credential: &Credential,
        key_algorithm: &str,
        key_length: usize,
        parameters: &KeyAgreementParameters,
    ) -> Result<KeyAgreementCredential, KeyAgreementError>;
}

/// ECDH-ES over the NIST prime curves with the concat KDF.
#[derive(Debug, Clone, Copy, Default)]
pub struct EcdhEsKeyAgreementProcessor;

impl EcdhEsKeyAgreementProcessor {
    /// Creates the processor.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl KeyAgreementProcessor for EcdhEsKeyAgreementProcessor {
    fn algorithm(&self) -> &'static str {
        ECDH_ES
    }

    fn execute(
        &self,
        public_credential: &Credential,
        key_algorithm: &str,
        key_length: usize,
        parameters: &KeyAgreementParameters,
    ) -> Result<KeyAgreementCredential, KeyAgreementError> {
        // Work on an internal copy so later caller-side mutation cannot
        // affect this operation or the recorded result.
        let parameters = parameters.clone();

        if key_length == 0 || key_length % 8 != 0 {
            return Err(KeyAgreementError::InvalidParameter(format!(
                "derived key length must be a positive multiple of 8 bits, got {key_length}"
            )));
        }

        let spki_der = public_credential.verification_key().ok_or_else(|| {
            KeyAgreementError::InvalidKeyMaterial(
                "public credential holds no public key".to_string(),
            )
        })?;
        let peer_key = spki::parse_subject_public_key_info(&spki_der)
            .map_err(|e| KeyAgreementError::InvalidKeyMaterial(e.to_string()))?;
        let VerificationKey::Ec { curve, point } = peer_key else {
            return Err(KeyAgreementError::InvalidKeyMaterial(
                "ECDH requires an EC public key".to_string(),
            ));
        };
        let agreement_alg = match curve {
            EcCurve::P256 => &agreement::ECDH_P256,
            EcCurve::P384 => &agreement::ECDH_P384,
            EcCurve::P521 => &agreement::ECDH_P521,
        };

        let (private_key, originator_public_key) = match parameters.private_credential() {
            Some(credential) => {
                let der = credential.private_key().ok_or_else(|| {
                    KeyAgreementError::InvalidKeyMaterial(
                        "private credential holds no private key".to_string(),
                    )
                })?;
                let private_key = agreement::PrivateKey::from_private_key_der(agreement_alg, der)
                    .map_err(|e| {
                        KeyAgreementError::InvalidKeyMaterial(format!(
                            "failed to load private key: {e}"
                        ))
                    })?;
                (private_key, None)
            }
            None => {
                let private_key = agreement::PrivateKey::generate(agreement_alg).map_err(|_| {
                    KeyAgreementError::OperationFailed(
                        "ephemeral key generation failed".to_string(),
                    )
                })?;
                let public_key = private_key.compute_public_key().map_err(|_| {
                    KeyAgreementError::OperationFailed(
                        "ephemeral public key derivation failed".to_string(),
                    )
                })?;
                let spki = spki::ec_subject_public_key_info(curve, public_key.as_ref());
                (private_key, Some(spki))
            }
        };

        let kdf = parameters
            .concat_kdf()
            .ok_or(KeyAgreementError::MissingParameter("ConcatKDF"))?
            .clone();
        let kdf_digest = digest_algorithm(&kdf.digest)
            .ok_or_else(|| KeyAgreementError::UnsupportedAlgorithm(kdf.digest.clone()))?;

        let peer_public = agreement::UnparsedPublicKey::new(agreement_alg, point);
        let derived = agreement::agree(
            &private_key,
            &peer_public,
            KeyAgreementError::OperationFailed(
                "the key agreement primitive rejected the inputs".to_string(),
            ),
            |shared_secret| Ok(concat_kdf(kdf_digest, shared_secret, &kdf, key_length / 8)),
        )?;

        let credential = Credential::new().with_secret_key(derived);
        Ok(KeyAgreementCredential {
            credential,
            algorithm: ECDH_ES.to_string(),
            key_algorithm: key_algorithm.to_string(),
            key_length,
            originator_public_key,
            parameters,
        })
    }
}

/// By-URI dispatch table for agreement processors.
#[derive(Clone, Default)]
pub struct KeyAgreementProcessorRegistry {
    processors: HashMap<&'static str, Arc<dyn KeyAgreementProcessor>>,
}

impl KeyAgreementProcessorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in processors.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(EcdhEsKeyAgreementProcessor::new()));
        registry
    }

    /// Registers a processor under its algorithm URI.
    pub fn register(&mut self, processor: Arc<dyn KeyAgreementProcessor>) {
        self.processors.insert(processor.algorithm(), processor);
    }

    /// Looks up the processor for an algorithm URI.
    #[must_use]
    pub fn processor(&self, algorithm: &str) -> Option<Arc<dyn KeyAgreementProcessor>> {
        self.processors.get(algorithm).cloned()
    }
}

/// Maps a digest algorithm name onto the runtime's digest support.
fn digest_algorithm(name: &str) -> Option<&'static digest::Algorithm> {
    match name {
        "SHA-256" | "SHA256" => Some(&digest::SHA256),
        "SHA-384" | "SHA384" => Some(&digest::SHA384),
        "SHA-512" | "SHA512" => Some(&digest::SHA512),
        _ => None,
    }
}

/// Concat KDF per NIST SP 800-56A: `H(counter || Z || OtherInfo)` blocks,
/// truncated to the requested length.
fn concat_kdf(
    algorithm: &'static digest::Algorithm,
    shared_secret: &[u8],
    params: &ConcatKdfParams,
    out_len: usize,
) -> Vec<u8> {
    let mut out = Vec::new();
    let mut counter: u32 = 1;
    while out.len() < out_len {
        let mut ctx = digest::Context::new(algorithm);
        ctx.update(&counter.to_be_bytes());
        ctx.update(shared_secret);
        ctx.update(&params.algorithm_id);
        ctx.update(&params.party_u_info);
        ctx.update(&params.party_v_info);
        out.extend_from_slice(ctx.finish().as_ref());
        counter += 1;
    }
    out.truncate(out_len);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kdf_params() -> KeyAgreementParameter {
        KeyAgreementParameter::ConcatKdf(ConcatKdfParams {
            digest: "SHA-256".to_string(),
            algorithm_id: b"AES".to_vec(),
            party_u_info: b"originator".to_vec(),
            party_v_info: b"recipient".to_vec(),
        })
    }

    #[test]
    fn algorithm_uri_is_fixed() {
        let processor = EcdhEsKeyAgreementProcessor::new();
        assert_eq!(processor.algorithm(), ECDH_ES);
    }

    #[test]
    fn registry_dispatches_by_uri() {
        let registry = KeyAgreementProcessorRegistry::with_defaults();
        assert!(registry.processor(ECDH_ES).is_some());
        assert!(registry.processor("urn:example:unknown").is_none());
    }

    #[test]
    fn missing_public_key_is_invalid_key_material() {
        let processor = EcdhEsKeyAgreementProcessor::new();
        let result = processor.execute(
            &Credential::new(),
            "AES",
            128,
            &KeyAgreementParameters::new().with(kdf_params()),
        );
        assert!(matches!(
            result,
            Err(KeyAgreementError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn garbage_public_key_is_invalid_key_material() {
        let processor = EcdhEsKeyAgreementProcessor::new();
        let credential = Credential::new().with_public_key(vec![0xba, 0xad]);
        let result = processor.execute(
            &credential,
            "AES",
            128,
            &KeyAgreementParameters::new().with(kdf_params()),
        );
        assert!(matches!(
            result,
            Err(KeyAgreementError::InvalidKeyMaterial(_))
        ));
    }

    #[test]
    fn odd_key_length_is_rejected() {
        let processor = EcdhEsKeyAgreementProcessor::new();
        let result = processor.execute(
            &Credential::new(),
            "AES",
            100,
            &KeyAgreementParameters::new().with(kdf_params()),
        );
        assert!(matches!(result, Err(KeyAgreementError::InvalidParameter(_))));
    }

    #[test]
    fn concat_kdf_produces_requested_length() {
        let params = ConcatKdfParams {
            digest: "SHA-256".to_string(),
            ..ConcatKdfParams::default()
        };
        let key = concat_kdf(&digest::SHA256, b"shared-secret", &params, 16);
        assert_eq!(key.len(), 16);

        // Longer than one digest block forces iteration.
        let key = concat_kdf(&digest::SHA256, b"shared-secret", &params, 48);
        assert_eq!(key.len(), 48);

        // Deterministic for identical inputs.
        assert_eq!(
            concat_kdf(&digest::SHA256, b"shared-secret", &params, 48),
            key
        );
    }

    #[test]
    fn parameter_accessors() {
        let mut parameters = KeyAgreementParameters::new().with(kdf_params());
        assert!(parameters.private_credential().is_none());
        assert!(parameters.concat_kdf().is_some());

        parameters.push(KeyAgreementParameter::PrivateCredential(Credential::new()));
        assert!(parameters.private_credential().is_some());
        assert_eq!(parameters.len(), 2);
    }
}
