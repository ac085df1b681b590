//! Binding support helpers.

use crate::context::MessageContext;
use crate::error::{SamlError, SamlResult};
use crate::http::HttpRequestInfo;

/// Computes the URI of the endpoint that actually received the inbound
/// message.
///
/// When the binding layer recorded an endpoint on the message context, that
/// value wins; otherwise the URI is assembled from the request URL, with
/// default ports elided.
///
/// # Errors
///
/// Returns an error when neither the context nor the request yields enough
/// information to name the endpoint.
pub fn actual_receiver_endpoint_uri(
    message_context: Option<&MessageContext>,
    request: &HttpRequestInfo,
) -> SamlResult<String> {
    if let Some(endpoint) = message_context.and_then(|mc| mc.received_endpoint.as_deref()) {
        return Ok(endpoint.to_string());
    }

    let scheme = request.scheme();
    let host = request.host();
    if scheme.is_empty() || host.is_empty() {
        return Err(SamlError::Message(
            "cannot compute receiver endpoint: request scheme or host is unknown".to_string(),
        ));
    }

    let mut uri = format!("{scheme}://{host}");
    if let Some(port) = request.port() {
        if port != default_port(scheme) {
            uri.push_str(&format!(":{port}"));
        }
    }
    let path = request.path();
    if !path.is_empty() && !path.starts_with('/') {
        uri.push('/');
    }
    uri.push_str(path);
    Ok(uri)
}

fn default_port(scheme: &str) -> u16 {
    match scheme {
        "http" => 80,
        "https" => 443,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_port_is_elided() {
        let request = HttpRequestInfo::new().with_url("https", "sp.example.org", Some(443), "/acs");
        let uri = actual_receiver_endpoint_uri(None, &request).expect("endpoint resolves");
        assert_eq!(uri, "https://sp.example.org/acs");
    }

    #[test]
    fn explicit_port_is_kept() {
        let request = HttpRequestInfo::new().with_url("https", "sp.example.org", Some(8443), "/acs");
        let uri = actual_receiver_endpoint_uri(None, &request).expect("endpoint resolves");
        assert_eq!(uri, "https://sp.example.org:8443/acs");
    }

    #[test]
    fn context_endpoint_wins() {
        let request = HttpRequestInfo::new().with_url("https", "sp.example.org", None, "/acs");
        let context = MessageContext {
            received_endpoint: Some("https://proxy.example.org/acs".to_string()),
            ..MessageContext::default()
        };
        let uri = actual_receiver_endpoint_uri(Some(&context), &request).expect("endpoint resolves");
        assert_eq!(uri, "https://proxy.example.org/acs");
    }

    #[test]
    fn missing_host_is_an_error() {
        let request = HttpRequestInfo::new().with_remote_addr("192.0.2.7");
        assert!(actual_receiver_endpoint_uri(None, &request).is_err());
    }
}
