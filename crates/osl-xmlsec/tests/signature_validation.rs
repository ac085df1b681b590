//! Signature validation against freshly generated keys.

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};

use osl_security::credential::{Credential, UsageType};
use osl_xmlsec::signature::{
    Signature, SignatureAlgorithm, SignatureValidationError, SignatureValidator,
};
use osl_xmlsec::spki::{ec_subject_public_key_info, EcCurve};

const SIGNED_INFO: &[u8] =
    b"<ds:SignedInfo xmlns:ds=\"http://www.w3.org/2000/09/xmldsig#\">exercise</ds:SignedInfo>";

fn p256_credential_and_signature() -> (Credential, Signature) {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
        .expect("key generation succeeds");
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref())
        .expect("generated key parses");

    let spki = ec_subject_public_key_info(EcCurve::P256, key_pair.public_key().as_ref());
    let credential = Credential::new()
        .with_usage(UsageType::Signing)
        .with_public_key(spki);

    let value = key_pair
        .sign(&rng, SIGNED_INFO)
        .expect("signing succeeds")
        .as_ref()
        .to_vec();
    let signature = Signature::new(SignatureAlgorithm::EcdsaSha256, SIGNED_INFO.to_vec(), value);
    (credential, signature)
}

#[test]
fn correct_credential_validates() {
    let (credential, signature) = p256_credential_and_signature();
    let validator = SignatureValidator::new(credential);
    assert!(validator.validate(&signature).is_ok());
}

#[test]
fn unrelated_key_fails_with_validation_failure() {
    let (_, signature) = p256_credential_and_signature();
    let (unrelated_credential, _) = p256_credential_and_signature();

    let validator = SignatureValidator::new(unrelated_credential);
    match validator.validate(&signature) {
        Err(SignatureValidationError::Invalid { detail }) => {
            assert!(detail.contains("did not validate"));
        }
        other => panic!("expected Invalid, got {other:?}"),
    }
}

#[test]
fn tampered_content_fails() {
    let (credential, mut signature) = p256_credential_and_signature();
    signature.signed_content.push(b'!');

    let validator = SignatureValidator::new(credential);
    assert!(matches!(
        validator.validate(&signature),
        Err(SignatureValidationError::Invalid { .. })
    ));
}

#[test]
fn algorithm_key_mismatch_is_processing_failure() {
    let (credential, mut signature) = p256_credential_and_signature();
    // An RSA algorithm with an EC key cannot be evaluated.
    signature.algorithm = SignatureAlgorithm::RsaSha256;

    let validator = SignatureValidator::new(credential);
    match validator.validate(&signature) {
        Err(SignatureValidationError::Invalid { detail }) => {
            assert!(detail.contains("unable to evaluate key"));
        }
        other => panic!("expected Invalid, got {other:?}"),
    }
}
