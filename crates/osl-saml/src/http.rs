//! HTTP request accessor.
//!
//! The small, transport-level slice of an inbound HTTP request that assertion
//! validation needs: where the request came from, the peer's TLS certificate
//! when mutual TLS was used, and the pieces of the request URL needed to
//! compute the actual receiver endpoint.

/// Read-only view of the inbound HTTP request.
#[derive(Debug, Clone, Default)]
pub struct HttpRequestInfo {
    remote_addr: String,
    peer_certificate: Option<Vec<u8>>,
    scheme: String,
    host: String,
    port: Option<u16>,
    path: String,
}

impl HttpRequestInfo {
    /// Creates an empty request view.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transport-level remote address (IP literal or hostname).
    #[must_use]
    pub fn with_remote_addr(mut self, remote_addr: impl Into<String>) -> Self {
        self.remote_addr = remote_addr.into();
        self
    }

    /// Sets the peer TLS certificate (X.509 DER).
    #[must_use]
    pub fn with_peer_certificate(mut self, cert_der: Vec<u8>) -> Self {
        self.peer_certificate = Some(cert_der);
        self
    }

    /// Sets the request URL components.
    #[must_use]
    pub fn with_url(
        mut self,
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: Option<u16>,
        path: impl Into<String>,
    ) -> Self {
        self.scheme = scheme.into();
        self.host = host.into();
        self.port = port;
        self.path = path.into();
        self
    }

    /// The transport-level remote address.
    #[must_use]
    pub fn remote_addr(&self) -> &str {
        &self.remote_addr
    }

    /// The peer TLS certificate, when one was presented.
    #[must_use]
    pub fn peer_certificate(&self) -> Option<&[u8]> {
        self.peer_certificate.as_deref()
    }

    /// The request scheme.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The request host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The request port, when one was stated explicitly.
    #[must_use]
    pub const fn port(&self) -> Option<u16> {
        self.port
    }

    /// The request path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_sets_fields() {
        let request = HttpRequestInfo::new()
            .with_remote_addr("192.0.2.7")
            .with_url("https", "sp.example.org", Some(8443), "/saml/acs");
        assert_eq!(request.remote_addr(), "192.0.2.7");
        assert_eq!(request.scheme(), "https");
        assert_eq!(request.host(), "sp.example.org");
        assert_eq!(request.port(), Some(8443));
        assert_eq!(request.path(), "/saml/acs");
        assert!(request.peer_certificate().is_none());
    }
}
