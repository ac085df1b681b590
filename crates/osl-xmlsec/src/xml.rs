//! Reading KeyInfo structures from XML.
//!
//! A bounded unmarshalling layer for the key information element family, not
//! a general XML binding: it recognizes `EncryptedData`, `EncryptedKey`,
//! `KeyInfo`, `KeyInfoReference`, `KeyName`, `DEREncodedKeyValue` and
//! `X509Data/X509Certificate`, wherever they appear in a document, and builds
//! the same-document id index used for reference dereferencing. Anything else
//! inside a `KeyInfo` is preserved as an unknown extension.

use base64::Engine;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::{XmlSecError, XmlSecResult};
use crate::keyinfo::{
    DocumentIdIndex, EncryptedData, EncryptedKey, IdentifiedObject, KeyInfo, KeyInfoReference,
    UnknownElement,
};

/// The key security structures found in one document.
#[derive(Debug, Clone, Default)]
pub struct ParsedDocument {
    /// `EncryptedData` elements, in document order.
    pub encrypted_data: Vec<EncryptedData>,
    /// `KeyInfo` elements found outside any `EncryptedData`, in document order.
    pub key_infos: Vec<KeyInfo>,
    /// Index of id-carrying objects for same-document dereferencing.
    pub index: DocumentIdIndex,
}

/// Parses the key security structures out of an XML document.
///
/// Elements the scanner does not recognize are treated as transparent
/// containers, so the structures are found at any nesting depth.
///
/// # Errors
///
/// Returns an error when the XML is not well-formed or base64 content does
/// not decode.
pub fn parse_document(xml: &str) -> XmlSecResult<ParsedDocument> {
    let mut reader = Reader::from_str(xml);
    let mut document = ParsedDocument::default();

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"EncryptedData" => {
                    let encrypted_data = parse_encrypted_data(&mut reader, &e)?;
                    index_encrypted_data(&mut document.index, &encrypted_data);
                    document.encrypted_data.push(encrypted_data);
                }
                b"KeyInfo" => {
                    let key_info = parse_key_info(&mut reader, &e)?;
                    document.index.index_key_info(&key_info);
                    document.key_infos.push(key_info);
                }
                b"EncryptedKey" => {
                    let encrypted_key = parse_encrypted_key(&mut reader, &e)?;
                    if let Some(id) = &encrypted_key.id {
                        document
                            .index
                            .insert(id.clone(), IdentifiedObject::EncryptedKey(encrypted_key));
                    }
                }
                _ => {}
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"KeyInfo" {
                    let key_info = KeyInfo {
                        id: attribute(&e, b"Id"),
                        ..KeyInfo::default()
                    };
                    document.index.index_key_info(&key_info);
                    document.key_infos.push(key_info);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(document)
}

fn index_encrypted_data(index: &mut DocumentIdIndex, encrypted_data: &EncryptedData) {
    if let Some(id) = &encrypted_data.id {
        index.insert(
            id.clone(),
            IdentifiedObject::EncryptedData(encrypted_data.clone()),
        );
    }
    if let Some(key_info) = &encrypted_data.key_info {
        index.index_key_info(key_info);
    }
}

/// Parses a `KeyInfo` element; the reader is positioned just past its start
/// tag.
fn parse_key_info(reader: &mut Reader<&[u8]>, start: &BytesStart<'_>) -> XmlSecResult<KeyInfo> {
    let mut key_info = KeyInfo {
        id: attribute(start, b"Id"),
        ..KeyInfo::default()
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"KeyName" => {
                    let name = element_text(reader)?;
                    key_info.key_names.push(name.trim().to_string());
                }
                b"DEREncodedKeyValue" => {
                    let text = element_text(reader)?;
                    key_info.key_values.push(decode_base64(&text)?);
                }
                b"X509Data" => parse_x509_data(reader, &mut key_info)?,
                b"EncryptedKey" => {
                    let encrypted_key = parse_encrypted_key(reader, &e)?;
                    key_info.encrypted_keys.push(encrypted_key);
                }
                b"KeyInfoReference" => {
                    let reference = KeyInfoReference {
                        id: attribute(&e, b"Id"),
                        uri: attribute(&e, b"URI"),
                    };
                    element_text(reader)?;
                    key_info.key_info_references.push(reference);
                }
                other => {
                    let name = String::from_utf8_lossy(other).into_owned();
                    let text = element_text(reader)?;
                    let text = text.trim();
                    key_info.extensions.push(UnknownElement {
                        name,
                        text: (!text.is_empty()).then(|| text.to_string()),
                    });
                }
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"KeyInfoReference" => {
                    key_info.key_info_references.push(KeyInfoReference {
                        id: attribute(&e, b"Id"),
                        uri: attribute(&e, b"URI"),
                    });
                }
                other => {
                    key_info.extensions.push(UnknownElement {
                        name: String::from_utf8_lossy(other).into_owned(),
                        text: None,
                    });
                }
            },
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlSecError::XmlParse(
                    "unexpected end of document inside KeyInfo".to_string(),
                ));
            }
            _ => {}
        }
    }

    Ok(key_info)
}

/// Parses an `X509Data` element into certificate entries.
fn parse_x509_data(reader: &mut Reader<&[u8]>, key_info: &mut KeyInfo) -> XmlSecResult<()> {
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"X509Certificate" {
                    let text = element_text(reader)?;
                    key_info.x509_certificates.push(decode_base64(&text)?);
                } else {
                    element_text(reader)?;
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlSecError::XmlParse(
                    "unexpected end of document inside X509Data".to_string(),
                ));
            }
            _ => {}
        }
    }
    Ok(())
}

/// Parses an `EncryptedKey` element; the reader is positioned just past its
/// start tag.
fn parse_encrypted_key(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> XmlSecResult<EncryptedKey> {
    let mut encrypted_key = EncryptedKey {
        id: attribute(start, b"Id"),
        recipient: attribute(start, b"Recipient"),
        ..EncryptedKey::default()
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"EncryptionMethod" => {
                    encrypted_key.algorithm = attribute(&e, b"Algorithm");
                    element_text(reader)?;
                }
                b"CipherData" => {
                    encrypted_key.cipher_value = parse_cipher_data(reader)?;
                }
                _ => {
                    element_text(reader)?;
                }
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"EncryptionMethod" {
                    encrypted_key.algorithm = attribute(&e, b"Algorithm");
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlSecError::XmlParse(
                    "unexpected end of document inside EncryptedKey".to_string(),
                ));
            }
            _ => {}
        }
    }

    Ok(encrypted_key)
}

/// Parses an `EncryptedData` element; the reader is positioned just past its
/// start tag.
fn parse_encrypted_data(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> XmlSecResult<EncryptedData> {
    let mut encrypted_data = EncryptedData {
        id: attribute(start, b"Id"),
        ..EncryptedData::default()
    };

    loop {
        match reader.read_event()? {
            Event::Start(e) => match e.local_name().as_ref() {
                b"EncryptionMethod" => {
                    encrypted_data.algorithm = attribute(&e, b"Algorithm");
                    element_text(reader)?;
                }
                b"KeyInfo" => {
                    encrypted_data.key_info = Some(parse_key_info(reader, &e)?);
                }
                b"CipherData" => {
                    encrypted_data.cipher_value = parse_cipher_data(reader)?;
                }
                _ => {
                    element_text(reader)?;
                }
            },
            Event::Empty(e) => {
                if e.local_name().as_ref() == b"EncryptionMethod" {
                    encrypted_data.algorithm = attribute(&e, b"Algorithm");
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlSecError::XmlParse(
                    "unexpected end of document inside EncryptedData".to_string(),
                ));
            }
            _ => {}
        }
    }

    Ok(encrypted_data)
}

/// Parses a `CipherData` element into the decoded `CipherValue` octets.
fn parse_cipher_data(reader: &mut Reader<&[u8]>) -> XmlSecResult<Vec<u8>> {
    let mut cipher_value = Vec::new();
    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if e.local_name().as_ref() == b"CipherValue" {
                    let text = element_text(reader)?;
                    cipher_value = decode_base64(&text)?;
                } else {
                    element_text(reader)?;
                }
            }
            Event::End(_) => break,
            Event::Eof => {
                return Err(XmlSecError::XmlParse(
                    "unexpected end of document inside CipherData".to_string(),
                ));
            }
            _ => {}
        }
    }
    Ok(cipher_value)
}

/// Consumes the current element's subtree, returning its concatenated text.
fn element_text(reader: &mut Reader<&[u8]>) -> XmlSecResult<String> {
    let mut depth = 0usize;
    let mut text = String::new();
    loop {
        match reader.read_event()? {
            Event::Start(_) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    break;
                }
                depth -= 1;
            }
            Event::Text(t) => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| XmlSecError::XmlParse(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Event::CData(t) => text.push_str(&String::from_utf8_lossy(&t.into_inner())),
            Event::Eof => {
                return Err(XmlSecError::XmlParse(
                    "unexpected end of document".to_string(),
                ));
            }
            _ => {}
        }
    }
    Ok(text)
}

/// Reads an attribute by local name, ignoring any namespace prefix.
fn attribute(e: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().as_ref() == name {
            return attr.unescape_value().ok().map(|v| v.into_owned());
        }
    }
    None
}

/// Decodes base64 text, tolerating embedded whitespace.
fn decode_base64(text: &str) -> XmlSecResult<Vec<u8>> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
}
