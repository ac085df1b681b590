//! EncryptedKey resolution via KeyInfoReference dereferencing.
//!
//! Finds `EncryptedKey` elements by following `KeyInfoReference` children of
//! the `KeyInfo` attached to an `EncryptedData`. Reference URIs must be
//! same-document fragments; external resources are never fetched. The walk is
//! bounded by a depth limit so cyclic reference graphs terminate.

use std::collections::HashSet;

use crate::keyinfo::{DocumentIdIndex, EncryptedData, EncryptedKey, KeyInfo, KeyInfoReference};

/// Default number of references to follow before giving up.
const DEFAULT_DEPTH_LIMIT: usize = 5;

/// Resolver following `KeyInfoReference` chains to `EncryptedKey` elements.
///
/// The entry `KeyInfo` belongs to the `EncryptedData` itself and is assumed to
/// have been searched directly by a cooperating inline resolver, so this
/// resolver never collects inline keys on the entry call; it only picks them
/// up after following at least one reference.
#[derive(Debug, Clone)]
pub struct SimpleKeyInfoReferenceEncryptedKeyResolver {
    recipients: HashSet<String>,
    depth_limit: usize,
}

impl Default for SimpleKeyInfoReferenceEncryptedKeyResolver {
    fn default() -> Self {
        Self {
            recipients: HashSet::new(),
            depth_limit: DEFAULT_DEPTH_LIMIT,
        }
    }
}

impl SimpleKeyInfoReferenceEncryptedKeyResolver {
    /// Creates a resolver with no recipient filter.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a resolver filtering for a single recipient.
    #[must_use]
    pub fn for_recipient(recipient: impl Into<String>) -> Self {
        Self::for_recipients(HashSet::from([recipient.into()]))
    }

    /// Creates a resolver filtering for the given recipient set. An empty set
    /// matches every recipient.
    #[must_use]
    pub fn for_recipients(recipients: HashSet<String>) -> Self {
        Self {
            recipients,
            ..Self::default()
        }
    }

    /// Sets the reference depth limit, clamped to a minimum of 1.
    #[must_use]
    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = limit.max(1);
        self
    }

    /// The reference depth limit.
    #[must_use]
    pub const fn depth_limit(&self) -> usize {
        self.depth_limit
    }

    /// The configured recipient filter.
    #[must_use]
    pub fn recipients(&self) -> &HashSet<String> {
        &self.recipients
    }

    /// Resolves the `EncryptedKey` elements reachable from the key info of
    /// `encrypted_data`, filtered to the configured recipients.
    ///
    /// Unresolvable references, non-`KeyInfo` targets and an exhausted depth
    /// limit drop the affected branch and are logged; they never fail the
    /// resolution as a whole.
    #[must_use]
    pub fn resolve(
        &self,
        index: &DocumentIdIndex,
        encrypted_data: &EncryptedData,
    ) -> Vec<EncryptedKey> {
        let mut resolved = Vec::new();
        self.resolve_key_info(
            index,
            encrypted_data.key_info.as_ref(),
            self.depth_limit,
            &mut resolved,
        );
        resolved
    }

    fn resolve_key_info(
        &self,
        index: &DocumentIdIndex,
        key_info: Option<&KeyInfo>,
        remaining: usize,
        resolved: &mut Vec<EncryptedKey>,
    ) {
        let Some(key_info) = key_info else {
            return;
        };

        // The first time in, we don't directly resolve any keys, only
        // references. After that, we always start by looking inline.
        if remaining < self.depth_limit {
            for encrypted_key in &key_info.encrypted_keys {
                if self.match_recipient(encrypted_key.recipient.as_deref()) {
                    resolved.push(encrypted_key.clone());
                }
            }
        }

        if remaining == 0 {
            tracing::info!("reached depth limit for KeyInfoReferences");
            return;
        }

        for reference in &key_info.key_info_references {
            let target = self.dereference_uri(index, reference);
            self.resolve_key_info(index, target, remaining - 1, resolved);
        }
    }

    /// Dereferences the URI attribute of a `KeyInfoReference` into a
    /// `KeyInfo`, or nothing when the reference cannot be processed.
    fn dereference_uri<'a>(
        &self,
        index: &'a DocumentIdIndex,
        reference: &KeyInfoReference,
    ) -> Option<&'a KeyInfo> {
        let uri = reference.uri.as_deref().unwrap_or_default();
        let Some(fragment) = uri.strip_prefix('#') else {
            tracing::warn!(
                "EncryptedKey KeyInfoReference did not contain a same-document URI reference, \
                 cannot process"
            );
            return None;
        };
        if fragment.is_empty() {
            tracing::warn!("EncryptedKey KeyInfoReference URI fragment was empty, cannot process");
            return None;
        }
        if index.get(fragment).is_none() {
            tracing::warn!("EncryptedKey KeyInfoReference URI could not be dereferenced");
            return None;
        }
        let key_info = index.key_info(fragment);
        if key_info.is_none() {
            tracing::warn!(
                "the product of dereferencing the EncryptedKey KeyInfoReference was not a KeyInfo"
            );
        }
        key_info
    }

    /// Tests a recipient attribute value against the configured filter. An
    /// empty filter matches everything; an absent recipient never matches a
    /// non-empty filter.
    fn match_recipient(&self, recipient: Option<&str>) -> bool {
        if self.recipients.is_empty() {
            return true;
        }
        recipient.is_some_and(|r| self.recipients.contains(r))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyinfo::IdentifiedObject;

    fn key_for(recipient: &str) -> EncryptedKey {
        EncryptedKey::for_recipient(recipient)
    }

    /// Builds an EncryptedData whose KeyInfo references `first`, plus a chain
    /// of `hops - 1` further references ending in a KeyInfo holding one
    /// EncryptedKey for `recipient`.
    fn chained_document(hops: usize, recipient: &str) -> (DocumentIdIndex, EncryptedData) {
        assert!(hops >= 1);
        let mut index = DocumentIdIndex::new();

        let terminal_id = format!("ki{hops}");
        let mut terminal = KeyInfo::new();
        terminal.id = Some(terminal_id);
        terminal.encrypted_keys.push(key_for(recipient));
        index.index_key_info(&terminal);

        // Intermediate hops ki1 .. ki{hops-1}, each referencing the next.
        for hop in (1..hops).rev() {
            let mut intermediate = KeyInfo::new();
            intermediate.id = Some(format!("ki{hop}"));
            intermediate
                .key_info_references
                .push(KeyInfoReference::to_fragment(format!("ki{}", hop + 1)));
            index.index_key_info(&intermediate);
        }

        let mut entry = KeyInfo::new();
        entry
            .key_info_references
            .push(KeyInfoReference::to_fragment("ki1"));

        let encrypted_data = EncryptedData {
            key_info: Some(entry),
            ..EncryptedData::default()
        };
        (index, encrypted_data)
    }

    #[test]
    fn inline_keys_at_entry_are_skipped() {
        let mut entry = KeyInfo::new();
        entry.encrypted_keys.push(key_for("sp"));
        let encrypted_data = EncryptedData {
            key_info: Some(entry),
            ..EncryptedData::default()
        };

        let resolver = SimpleKeyInfoReferenceEncryptedKeyResolver::for_recipient("sp");
        let resolved = resolver.resolve(&DocumentIdIndex::new(), &encrypted_data);
        assert!(resolved.is_empty());
    }

    #[test]
    fn one_hop_reference_resolves_matching_recipient() {
        let (index, encrypted_data) = chained_document(1, "sp");

        let resolver = SimpleKeyInfoReferenceEncryptedKeyResolver::for_recipient("sp");
        let resolved = resolver.resolve(&index, &encrypted_data);
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].recipient.as_deref(), Some("sp"));

        let resolver = SimpleKeyInfoReferenceEncryptedKeyResolver::for_recipient("other");
        assert!(resolver.resolve(&index, &encrypted_data).is_empty());
    }

    #[test]
    fn empty_recipient_filter_matches_all() {
        let (index, encrypted_data) = chained_document(1, "anyone");
        let resolver = SimpleKeyInfoReferenceEncryptedKeyResolver::new();
        assert_eq!(resolver.resolve(&index, &encrypted_data).len(), 1);
    }

    #[test]
    fn chain_at_depth_limit_resolves() {
        let (index, encrypted_data) = chained_document(5, "sp");
        let resolver = SimpleKeyInfoReferenceEncryptedKeyResolver::for_recipient("sp");
        assert_eq!(resolver.depth_limit(), 5);
        assert_eq!(resolver.resolve(&index, &encrypted_data).len(), 1);
    }

    #[test]
    fn chain_beyond_depth_limit_yields_empty() {
        let (index, encrypted_data) = chained_document(6, "sp");
        let resolver = SimpleKeyInfoReferenceEncryptedKeyResolver::for_recipient("sp");
        assert!(resolver.resolve(&index, &encrypted_data).is_empty());
    }

    #[test]
    fn non_fragment_uri_is_rejected() {
        let mut entry = KeyInfo::new();
        entry.key_info_references.push(KeyInfoReference {
            id: None,
            uri: Some("https://other.example.org/keys.xml#ki1".to_string()),
        });
        let encrypted_data = EncryptedData {
            key_info: Some(entry),
            ..EncryptedData::default()
        };

        let mut referenced = KeyInfo::new();
        referenced.id = Some("ki1".to_string());
        referenced.encrypted_keys.push(key_for("sp"));
        let mut index = DocumentIdIndex::new();
        index.index_key_info(&referenced);

        let resolver = SimpleKeyInfoReferenceEncryptedKeyResolver::for_recipient("sp");
        assert!(resolver.resolve(&index, &encrypted_data).is_empty());
    }

    #[test]
    fn non_key_info_target_is_rejected() {
        let mut entry = KeyInfo::new();
        entry
            .key_info_references
            .push(KeyInfoReference::to_fragment("ek1"));
        let encrypted_data = EncryptedData {
            key_info: Some(entry),
            ..EncryptedData::default()
        };

        let mut index = DocumentIdIndex::new();
        index.insert("ek1", IdentifiedObject::EncryptedKey(key_for("sp")));

        let resolver = SimpleKeyInfoReferenceEncryptedKeyResolver::for_recipient("sp");
        assert!(resolver.resolve(&index, &encrypted_data).is_empty());
    }

    #[test]
    fn cyclic_reference_graph_terminates() {
        // ki1 -> ki2 -> ki1 ... with an inline key at ki1 so each revisit
        // collects it; the depth counter alone must stop the walk.
        let mut ki1 = KeyInfo::new();
        ki1.id = Some("ki1".to_string());
        ki1.encrypted_keys.push(key_for("sp"));
        ki1.key_info_references
            .push(KeyInfoReference::to_fragment("ki2"));

        let mut ki2 = KeyInfo::new();
        ki2.id = Some("ki2".to_string());
        ki2.key_info_references
            .push(KeyInfoReference::to_fragment("ki1"));

        let mut index = DocumentIdIndex::new();
        index.index_key_info(&ki1);
        index.index_key_info(&ki2);

        let mut entry = KeyInfo::new();
        entry
            .key_info_references
            .push(KeyInfoReference::to_fragment("ki1"));
        let encrypted_data = EncryptedData {
            key_info: Some(entry),
            ..EncryptedData::default()
        };

        let resolver = SimpleKeyInfoReferenceEncryptedKeyResolver::for_recipient("sp");
        let resolved = resolver.resolve(&index, &encrypted_data);
        // ki1 is visited at remaining 4, 2 and 0, then the walk stops.
        assert_eq!(resolved.len(), 3);
    }

    #[test]
    fn depth_limit_clamps_to_one() {
        let resolver = SimpleKeyInfoReferenceEncryptedKeyResolver::new().with_depth_limit(0);
        assert_eq!(resolver.depth_limit(), 1);
    }
}
