//! SubjectPublicKeyInfo handling.
//!
//! The verification primitives want raw key material (PKCS#1 `RSAPublicKey`
//! DER for RSA, the uncompressed curve point for ECDSA) while credentials and
//! certificates carry `SubjectPublicKeyInfo`. This module converts between the
//! two forms.

use x509_parser::prelude::FromDer;
use x509_parser::x509::SubjectPublicKeyInfo;

use crate::error::{XmlSecError, XmlSecResult};

const OID_EC_PUBLIC_KEY: &str = "1.2.840.10045.2.1";
const OID_RSA_ENCRYPTION: &str = "1.2.840.113549.1.1.1";
const OID_CURVE_P256: &str = "1.2.840.10045.3.1.7";
const OID_CURVE_P384: &str = "1.3.132.0.34";
const OID_CURVE_P521: &str = "1.3.132.0.35";

/// NIST prime curves supported for ECDSA and ECDH.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EcCurve {
    /// secp256r1 / prime256v1.
    P256,
    /// secp384r1.
    P384,
    /// secp521r1.
    P521,
}

impl EcCurve {
    /// Size of one coordinate in bytes.
    #[must_use]
    pub const fn coordinate_len(self) -> usize {
        match self {
            Self::P256 => 32,
            Self::P384 => 48,
            Self::P521 => 66,
        }
    }
}

/// Key material extracted from a `SubjectPublicKeyInfo`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationKey {
    /// PKCS#1 `RSAPublicKey` DER.
    Rsa(Vec<u8>),
    /// Uncompressed EC point on the named curve.
    Ec {
        /// The curve the point lives on.
        curve: EcCurve,
        /// `0x04 || x || y` uncompressed point encoding.
        point: Vec<u8>,
    },
}

/// Parses a `SubjectPublicKeyInfo` into raw verification key material.
///
/// # Errors
///
/// Returns an error when the DER is malformed, the key algorithm is not RSA
/// or EC, or an EC key names an unsupported curve.
pub fn parse_subject_public_key_info(der: &[u8]) -> XmlSecResult<VerificationKey> {
    let (_, spki) = SubjectPublicKeyInfo::from_der(der)
        .map_err(|e| XmlSecError::InvalidKey(format!("failed to parse SubjectPublicKeyInfo: {e}")))?;

    let key_bits = spki.subject_public_key.data.to_vec();
    let algorithm_oid = spki.algorithm.algorithm.to_id_string();

    match algorithm_oid.as_str() {
        OID_RSA_ENCRYPTION => Ok(VerificationKey::Rsa(key_bits)),
        OID_EC_PUBLIC_KEY => {
            let curve_oid = spki
                .algorithm
                .parameters
                .as_ref()
                .and_then(|p| p.as_oid().ok())
                .map(|oid| oid.to_id_string())
                .ok_or_else(|| {
                    XmlSecError::InvalidKey("EC key is missing its curve parameter".to_string())
                })?;
            let curve = match curve_oid.as_str() {
                OID_CURVE_P256 => EcCurve::P256,
                OID_CURVE_P384 => EcCurve::P384,
                OID_CURVE_P521 => EcCurve::P521,
                other => {
                    return Err(XmlSecError::InvalidKey(format!(
                        "unsupported EC curve: {other}"
                    )));
                }
            };
            Ok(VerificationKey::Ec {
                curve,
                point: key_bits,
            })
        }
        other => Err(XmlSecError::InvalidKey(format!(
            "unsupported public key algorithm: {other}"
        ))),
    }
}

/// Wraps an uncompressed EC point into a `SubjectPublicKeyInfo`.
///
/// The point must be the `0x04 || x || y` encoding for the named curve.
#[must_use]
pub fn ec_subject_public_key_info(curve: EcCurve, point: &[u8]) -> Vec<u8> {
    // AlgorithmIdentifier { id-ecPublicKey, <named curve> }
    let algorithm: &[u8] = match curve {
        EcCurve::P256 => &[
            0x30, 0x13, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x08, 0x2a,
            0x86, 0x48, 0xce, 0x3d, 0x03, 0x01, 0x07,
        ],
        EcCurve::P384 => &[
            0x30, 0x10, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x05, 0x2b,
            0x81, 0x04, 0x00, 0x22,
        ],
        EcCurve::P521 => &[
            0x30, 0x10, 0x06, 0x07, 0x2a, 0x86, 0x48, 0xce, 0x3d, 0x02, 0x01, 0x06, 0x05, 0x2b,
            0x81, 0x04, 0x00, 0x23,
        ],
    };

    // BIT STRING with zero unused bits.
    let bit_string_len = point.len() + 1;
    let mut body = Vec::with_capacity(algorithm.len() + bit_string_len + 8);
    body.extend_from_slice(algorithm);
    body.push(0x03);
    encode_der_length(&mut body, bit_string_len);
    body.push(0x00);
    body.extend_from_slice(point);

    let mut out = Vec::with_capacity(body.len() + 4);
    out.push(0x30);
    encode_der_length(&mut out, body.len());
    out.extend_from_slice(&body);
    out
}

/// Appends a DER length field.
fn encode_der_length(out: &mut Vec<u8>, len: usize) {
    if len < 0x80 {
        out.push(len as u8);
    } else if len <= 0xff {
        out.push(0x81);
        out.push(len as u8);
    } else {
        out.push(0x82);
        out.push((len >> 8) as u8);
        out.push((len & 0xff) as u8);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ec_spki_roundtrip() {
        // A syntactically valid (if not on-curve) uncompressed P-256 point.
        let mut point = vec![0x04];
        point.extend_from_slice(&[0xab; 64]);

        let spki = ec_subject_public_key_info(EcCurve::P256, &point);
        let parsed = parse_subject_public_key_info(&spki).expect("SPKI parses");
        assert_eq!(
            parsed,
            VerificationKey::Ec {
                curve: EcCurve::P256,
                point,
            }
        );
    }

    #[test]
    fn ec_spki_roundtrip_p521() {
        let mut point = vec![0x04];
        point.extend_from_slice(&[0x11; 132]);

        let spki = ec_subject_public_key_info(EcCurve::P521, &point);
        let parsed = parse_subject_public_key_info(&spki).expect("SPKI parses");
        match parsed {
            VerificationKey::Ec { curve, point: p } => {
                assert_eq!(curve, EcCurve::P521);
                assert_eq!(p.len(), 133);
            }
            VerificationKey::Rsa(_) => panic!("expected EC key"),
        }
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_subject_public_key_info(&[0xde, 0xad, 0xbe, 0xef]).is_err());
    }

    #[test]
    fn der_length_encodings() {
        let mut short = Vec::new();
        encode_der_length(&mut short, 0x45);
        assert_eq!(short, vec![0x45]);

        let mut medium = Vec::new();
        encode_der_length(&mut medium, 0x92);
        assert_eq!(medium, vec![0x81, 0x92]);

        let mut long = Vec::new();
        encode_der_length(&mut long, 0x1234);
        assert_eq!(long, vec![0x82, 0x12, 0x34]);
    }
}
