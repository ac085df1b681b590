//! KeyInfo object family.
//!
//! Models the XML Signature / XML Encryption key information elements as a
//! small closed set of typed structures plus an untyped extension bag, rather
//! than a generic XML binding. Same-document references are resolved through a
//! [`DocumentIdIndex`] built alongside the parsed objects.

use std::collections::HashMap;

/// Container identifying or carrying key material.
///
/// Mirrors `ds:KeyInfo`: key names, DER-encoded key values, X.509
/// certificates, inline encrypted keys and same-document references to other
/// `KeyInfo` elements. Children this model does not understand are preserved
/// in [`KeyInfo::extensions`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyInfo {
    /// Optional `Id` attribute, the anchor for same-document references.
    pub id: Option<String>,
    /// `KeyName` values.
    pub key_names: Vec<String>,
    /// `DEREncodedKeyValue` contents (`SubjectPublicKeyInfo` DER).
    pub key_values: Vec<Vec<u8>>,
    /// `X509Data/X509Certificate` contents (X.509 DER).
    pub x509_certificates: Vec<Vec<u8>>,
    /// Inline `EncryptedKey` children.
    pub encrypted_keys: Vec<EncryptedKey>,
    /// `KeyInfoReference` children.
    pub key_info_references: Vec<KeyInfoReference>,
    /// Children outside the modeled set.
    pub extensions: Vec<UnknownElement>,
}

impl KeyInfo {
    /// Creates an empty `KeyInfo`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the element carries no usable key material and no
    /// references.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.key_names.is_empty()
            && self.key_values.is_empty()
            && self.x509_certificates.is_empty()
            && self.encrypted_keys.is_empty()
            && self.key_info_references.is_empty()
    }
}

/// A key encrypted for a specific recipient (`xenc:EncryptedKey`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedKey {
    /// Optional `Id` attribute.
    pub id: Option<String>,
    /// The `Recipient` attribute, naming who the key is encrypted for.
    pub recipient: Option<String>,
    /// Encryption method algorithm URI.
    pub algorithm: Option<String>,
    /// The encrypted key octets.
    pub cipher_value: Vec<u8>,
}

impl EncryptedKey {
    /// Creates an encrypted key for the given recipient.
    #[must_use]
    pub fn for_recipient(recipient: impl Into<String>) -> Self {
        Self {
            recipient: Some(recipient.into()),
            ..Self::default()
        }
    }
}

/// A same-document reference to another `KeyInfo` (`dsig11:KeyInfoReference`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyInfoReference {
    /// Optional `Id` attribute.
    pub id: Option<String>,
    /// The `URI` attribute; only `#`-prefixed fragments are processable.
    pub uri: Option<String>,
}

impl KeyInfoReference {
    /// Creates a reference to the given same-document fragment.
    #[must_use]
    pub fn to_fragment(id: impl AsRef<str>) -> Self {
        Self {
            id: None,
            uri: Some(format!("#{}", id.as_ref())),
        }
    }
}

/// Encrypted content together with its key information (`xenc:EncryptedData`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncryptedData {
    /// Optional `Id` attribute.
    pub id: Option<String>,
    /// Encryption method algorithm URI.
    pub algorithm: Option<String>,
    /// The encrypted octets.
    pub cipher_value: Vec<u8>,
    /// Key information for the data encryption key.
    pub key_info: Option<KeyInfo>,
}

/// A child element outside the modeled set, kept for diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnknownElement {
    /// Local element name.
    pub name: String,
    /// Text content, when the element had any.
    pub text: Option<String>,
}

/// An object reachable through a same-document `Id` attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentifiedObject {
    /// The target is a `KeyInfo` element.
    KeyInfo(KeyInfo),
    /// The target is an `EncryptedData` element.
    EncryptedData(EncryptedData),
    /// The target is an `EncryptedKey` element.
    EncryptedKey(EncryptedKey),
    /// The target is some other element.
    Other {
        /// Local element name of the target.
        element: String,
    },
}

/// Index of `Id`-carrying objects within one document.
///
/// Stands in for walking a live DOM tree when dereferencing same-document
/// fragment URIs.
#[derive(Debug, Clone, Default)]
pub struct DocumentIdIndex {
    objects: HashMap<String, IdentifiedObject>,
}

impl DocumentIdIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an object under the given id, replacing any previous entry.
    pub fn insert(&mut self, id: impl Into<String>, object: IdentifiedObject) {
        self.objects.insert(id.into(), object);
    }

    /// Registers a `KeyInfo` under its own id, and any of its inline
    /// encrypted keys under theirs. A `KeyInfo` without an id contributes
    /// only its children.
    pub fn index_key_info(&mut self, key_info: &KeyInfo) {
        if let Some(id) = &key_info.id {
            self.objects
                .insert(id.clone(), IdentifiedObject::KeyInfo(key_info.clone()));
        }
        for encrypted_key in &key_info.encrypted_keys {
            if let Some(id) = &encrypted_key.id {
                self.objects.insert(
                    id.clone(),
                    IdentifiedObject::EncryptedKey(encrypted_key.clone()),
                );
            }
        }
    }

    /// Looks up the object registered under `id`.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&IdentifiedObject> {
        self.objects.get(id)
    }

    /// Looks up `id` and returns the target only when it is a `KeyInfo`.
    #[must_use]
    pub fn key_info(&self, id: &str) -> Option<&KeyInfo> {
        match self.objects.get(id) {
            Some(IdentifiedObject::KeyInfo(key_info)) => Some(key_info),
            _ => None,
        }
    }

    /// Number of indexed objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Returns true when nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
