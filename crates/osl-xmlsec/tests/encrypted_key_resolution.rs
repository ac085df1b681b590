//! Encrypted-key resolution over parsed documents.

use osl_xmlsec::encrypted_key::SimpleKeyInfoReferenceEncryptedKeyResolver;
use osl_xmlsec::xml::parse_document;

const DOCUMENT: &str = r##"
<Envelope xmlns:xenc="http://www.w3.org/2001/04/xmlenc#"
          xmlns:ds="http://www.w3.org/2000/09/xmldsig#"
          xmlns:dsig11="http://www.w3.org/2009/xmldsig11#">
  <xenc:EncryptedData Id="ed1">
    <xenc:EncryptionMethod Algorithm="http://www.w3.org/2009/xmlenc11#aes128-gcm"/>
    <ds:KeyInfo>
      <dsig11:KeyInfoReference URI="#hop"/>
    </ds:KeyInfo>
    <xenc:CipherData><xenc:CipherValue>/v8=</xenc:CipherValue></xenc:CipherData>
  </xenc:EncryptedData>
  <ds:KeyInfo Id="hop">
    <dsig11:KeyInfoReference URI="#shared"/>
  </ds:KeyInfo>
  <ds:KeyInfo Id="shared">
    <xenc:EncryptedKey Recipient="https://sp.example.org">
      <xenc:EncryptionMethod Algorithm="http://www.w3.org/2001/04/xmlenc#rsa-oaep-mgf1p"/>
      <xenc:CipherData><xenc:CipherValue>AAECAw==</xenc:CipherValue></xenc:CipherData>
    </xenc:EncryptedKey>
  </ds:KeyInfo>
</Envelope>"##;

#[test]
fn resolves_through_reference_chain() {
    let document = parse_document(DOCUMENT).expect("document parses");
    assert_eq!(document.encrypted_data.len(), 1);

    let resolver =
        SimpleKeyInfoReferenceEncryptedKeyResolver::for_recipient("https://sp.example.org");
    let resolved = resolver.resolve(&document.index, &document.encrypted_data[0]);
    assert_eq!(resolved.len(), 1);
    assert_eq!(resolved[0].cipher_value, vec![0, 1, 2, 3]);
}

#[test]
fn recipient_filter_excludes_other_parties() {
    let document = parse_document(DOCUMENT).expect("document parses");
    let resolver =
        SimpleKeyInfoReferenceEncryptedKeyResolver::for_recipient("https://other.example.org");
    assert!(resolver
        .resolve(&document.index, &document.encrypted_data[0])
        .is_empty());
}

#[test]
fn unfiltered_resolver_returns_every_key() {
    let document = parse_document(DOCUMENT).expect("document parses");
    let resolver = SimpleKeyInfoReferenceEncryptedKeyResolver::new();
    assert_eq!(
        resolver
            .resolve(&document.index, &document.encrypted_data[0])
            .len(),
        1
    );
}

#[test]
fn tight_depth_limit_stops_before_terminal_key() {
    let document = parse_document(DOCUMENT).expect("document parses");
    // Two hops are needed; a limit of 1 follows only the first reference.
    let resolver =
        SimpleKeyInfoReferenceEncryptedKeyResolver::for_recipient("https://sp.example.org")
            .with_depth_limit(1);
    assert!(resolver
        .resolve(&document.index, &document.encrypted_data[0])
        .is_empty());

    let resolver =
        SimpleKeyInfoReferenceEncryptedKeyResolver::for_recipient("https://sp.example.org")
            .with_depth_limit(2);
    assert_eq!(
        resolver
            .resolve(&document.index, &document.encrypted_data[0])
            .len(),
        1
    );
}
