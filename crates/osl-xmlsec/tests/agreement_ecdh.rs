//! ECDH-ES key agreement between two parties.

use aws_lc_rs::rand::SystemRandom;
use aws_lc_rs::signature::{EcdsaKeyPair, KeyPair, ECDSA_P256_SHA256_ASN1_SIGNING};

use osl_security::credential::Credential;
use osl_xmlsec::agreement::{
    ConcatKdfParams, EcdhEsKeyAgreementProcessor, KeyAgreementParameter, KeyAgreementParameters,
    KeyAgreementProcessor, ECDH_ES,
};
use osl_xmlsec::spki::{ec_subject_public_key_info, EcCurve};

fn kdf() -> KeyAgreementParameter {
    KeyAgreementParameter::ConcatKdf(ConcatKdfParams {
        digest: "SHA-256".to_string(),
        algorithm_id: b"http://www.w3.org/2009/xmlenc11#aes128-gcm".to_vec(),
        party_u_info: b"https://idp.example.org".to_vec(),
        party_v_info: b"https://sp.example.org".to_vec(),
    })
}

/// Generates a static P-256 key pair, returning (PKCS#8 private, SPKI public).
fn static_p256_keys() -> (Vec<u8>, Vec<u8>) {
    let rng = SystemRandom::new();
    let pkcs8 = EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, &rng)
        .expect("key generation succeeds");
    let key_pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_ASN1_SIGNING, pkcs8.as_ref())
        .expect("generated key parses");
    let spki = ec_subject_public_key_info(EcCurve::P256, key_pair.public_key().as_ref());
    (pkcs8.as_ref().to_vec(), spki)
}

#[test]
fn both_parties_derive_the_same_key() {
    let processor = EcdhEsKeyAgreementProcessor::new();
    assert_eq!(processor.algorithm(), ECDH_ES);

    let (recipient_private, recipient_public) = static_p256_keys();

    // Originator side: recipient's public key, fresh ephemeral private key.
    let originator_result = processor
        .execute(
            &Credential::new().with_public_key(recipient_public),
            "AES",
            128,
            &KeyAgreementParameters::new().with(kdf()),
        )
        .expect("originator agreement succeeds");
    assert_eq!(originator_result.secret_key().len(), 16);
    assert_eq!(originator_result.key_length(), 128);
    let ephemeral_public = originator_result
        .originator_public_key()
        .expect("ephemeral public key is exposed")
        .to_vec();

    // Recipient side: originator's ephemeral public key, static private key.
    let recipient_parameters = KeyAgreementParameters::new()
        .with(kdf())
        .with(KeyAgreementParameter::PrivateCredential(
            Credential::new().with_private_key(recipient_private),
        ));
    let recipient_result = processor
        .execute(
            &Credential::new().with_public_key(ephemeral_public),
            "AES",
            128,
            &recipient_parameters,
        )
        .expect("recipient agreement succeeds");

    assert_eq!(originator_result.secret_key(), recipient_result.secret_key());
    // The recipient performed a static operation, so no ephemeral key.
    assert!(recipient_result.originator_public_key().is_none());
}

#[test]
fn caller_parameter_mutation_does_not_affect_result() {
    let processor = EcdhEsKeyAgreementProcessor::new();
    let (_, recipient_public) = static_p256_keys();

    let mut parameters = KeyAgreementParameters::new().with(kdf());
    let result = processor
        .execute(
            &Credential::new().with_public_key(recipient_public),
            "AES",
            256,
            &parameters,
        )
        .expect("agreement succeeds");

    parameters.push(KeyAgreementParameter::Nonce(vec![0xff; 8]));
    assert_eq!(result.parameters().len(), 1);
    assert_eq!(result.secret_key().len(), 32);
}

#[test]
fn derived_credential_records_inputs() {
    let processor = EcdhEsKeyAgreementProcessor::new();
    let (_, recipient_public) = static_p256_keys();

    let result = processor
        .execute(
            &Credential::new().with_public_key(recipient_public),
            "AES",
            192,
            &KeyAgreementParameters::new().with(kdf()),
        )
        .expect("agreement succeeds");

    assert_eq!(result.algorithm(), ECDH_ES);
    assert_eq!(result.key_algorithm(), "AES");
    assert_eq!(result.secret_key().len(), 24);
    assert!(result.credential().secret_key().is_some());
}
