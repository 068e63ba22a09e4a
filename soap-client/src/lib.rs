//! Private SOAP client for UPnP device communication
//!
//! This crate provides a minimal SOAP client for the UPnP services of
//! Raumfeld renderers and media servers. Requests are addressed by full
//! control URL, since Raumfeld devices publish their control paths in the
//! device description rather than on a fixed port.
//!
//! Two transports share the envelope and fault handling:
//! - [`SoapClient`] blocks the calling thread (ureq)
//! - [`AsyncSoapClient`] runs on a tokio runtime (reqwest)

mod error;

pub use error::SoapError;

use std::sync::OnceLock;
use std::time::Duration;
use xmltree::Element;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(10);

static SHARED: OnceLock<SoapClient> = OnceLock::new();

/// A minimal blocking SOAP client for UPnP device communication
#[derive(Debug, Clone)]
pub struct SoapClient {
    agent: ureq::Agent,
}

impl SoapClient {
    /// Create a new SOAP client with default timeouts
    pub fn new() -> Self {
        Self::with_timeouts(CONNECT_TIMEOUT, READ_TIMEOUT)
    }

    /// Create a SOAP client with explicit connect and read timeouts
    pub fn with_timeouts(connect: Duration, read: Duration) -> Self {
        Self {
            agent: ureq::AgentBuilder::new()
                .timeout_connect(connect)
                .timeout_read(read)
                .build(),
        }
    }

    /// Process-wide shared client, so every caller reuses one connection pool
    pub fn get() -> &'static SoapClient {
        SHARED.get_or_init(SoapClient::new)
    }

    /// Send a SOAP request and return the parsed action response element
    pub fn call(
        &self,
        control_url: &str,
        service_uri: &str,
        action: &str,
        payload: &str,
    ) -> Result<Element, SoapError> {
        let body = envelope(service_uri, action, payload);
        tracing::debug!(control_url, action, "SOAP request");

        let result = self
            .agent
            .post(control_url)
            .set("Content-Type", "text/xml; charset=\"utf-8\"")
            .set("SOAPACTION", &soap_action(service_uri, action))
            .send_string(&body);

        match result {
            Ok(response) => {
                let xml_text = response
                    .into_string()
                    .map_err(|e| SoapError::Network(e.to_string()))?;
                parse_response(&xml_text, action)
            }
            // Devices report SOAP faults with HTTP 500 and a fault envelope
            Err(ureq::Error::Status(code, response)) => {
                let xml_text = response.into_string().unwrap_or_default();
                Err(fault_from_status(code, &xml_text, action))
            }
            Err(e) => Err(SoapError::Network(e.to_string())),
        }
    }

    /// Fetch a plain document, such as a UPnP device description
    pub fn fetch_text(&self, url: &str) -> Result<String, SoapError> {
        self.agent
            .get(url)
            .call()
            .map_err(|e| SoapError::Network(e.to_string()))?
            .into_string()
            .map_err(|e| SoapError::Network(e.to_string()))
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-blocking SOAP client sharing a reqwest session
#[derive(Debug, Clone)]
pub struct AsyncSoapClient {
    http: reqwest::Client,
}

impl AsyncSoapClient {
    /// Create a client with its own session and default timeouts
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(READ_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { http }
    }

    /// Reuse an existing session supplied by the host application
    pub fn with_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    /// Send a SOAP request and return the parsed action response element
    pub async fn call(
        &self,
        control_url: &str,
        service_uri: &str,
        action: &str,
        payload: &str,
    ) -> Result<Element, SoapError> {
        let body = envelope(service_uri, action, payload);
        tracing::debug!(control_url, action, "SOAP request (async)");

        let response = self
            .http
            .post(control_url)
            .header("Content-Type", "text/xml; charset=\"utf-8\"")
            .header("SOAPACTION", soap_action(service_uri, action))
            .body(body)
            .send()
            .await
            .map_err(|e| SoapError::Network(e.to_string()))?;

        let status = response.status();
        let xml_text = response
            .text()
            .await
            .map_err(|e| SoapError::Network(e.to_string()))?;

        if status.is_success() {
            parse_response(&xml_text, action)
        } else {
            Err(fault_from_status(status.as_u16(), &xml_text, action))
        }
    }

    /// Fetch a plain document, such as a UPnP device description
    pub async fn fetch_text(&self, url: &str) -> Result<String, SoapError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| SoapError::Network(e.to_string()))?;
        response
            .text()
            .await
            .map_err(|e| SoapError::Network(e.to_string()))
    }
}

impl Default for AsyncSoapClient {
    fn default() -> Self {
        Self::new()
    }
}

fn envelope(service_uri: &str, action: &str, payload: &str) -> String {
    format!(
        r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">
                <s:Body>
                    <u:{action} xmlns:u="{service_uri}">
                        {payload}
                    </u:{action}>
                </s:Body>
            </s:Envelope>"#,
        action = action,
        service_uri = service_uri,
        payload = payload
    )
}

fn soap_action(service_uri: &str, action: &str) -> String {
    format!("\"{}#{}\"", service_uri, action)
}

fn parse_response(xml_text: &str, action: &str) -> Result<Element, SoapError> {
    let xml = Element::parse(xml_text.as_bytes()).map_err(|e| SoapError::Parse(e.to_string()))?;
    extract_response(&xml, action)
}

fn fault_from_status(status: u16, xml_text: &str, action: &str) -> SoapError {
    match parse_response(xml_text, action) {
        Err(fault @ SoapError::Fault(_)) => fault,
        _ => SoapError::Status {
            action: action.to_string(),
            status,
        },
    }
}

fn extract_response(xml: &Element, action: &str) -> Result<Element, SoapError> {
    let body = xml
        .get_child("Body")
        .ok_or_else(|| SoapError::Parse("Missing SOAP Body".to_string()))?;

    // Check for SOAP fault first
    if let Some(fault) = body.get_child("Fault") {
        let error_code = fault
            .get_child("detail")
            .and_then(|d| d.get_child("UPnPError").or_else(|| d.get_child("UpnPError")))
            .and_then(|e| e.get_child("errorCode"))
            .and_then(|c| c.get_text())
            .and_then(|t| t.trim().parse::<u16>().ok())
            .unwrap_or(500);
        return Err(SoapError::Fault(error_code));
    }

    let response_name = format!("{}Response", action);
    body.get_child(response_name.as_str())
        .cloned()
        .ok_or_else(|| SoapError::Parse(format!("Missing {} element", response_name)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAULT_ENVELOPE: &str = r#"
        <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
            <s:Body>
                <s:Fault>
                    <faultcode>s:Client</faultcode>
                    <faultstring>UPnPError</faultstring>
                    <detail>
                        <UPnPError xmlns="urn:schemas-upnp-org:control-1-0">
                            <errorCode>701</errorCode>
                            <errorDescription>Transition not available</errorDescription>
                        </UPnPError>
                    </detail>
                </s:Fault>
            </s:Body>
        </s:Envelope>
    "#;

    #[test]
    fn test_envelope_contains_action_and_payload() {
        let body = envelope(
            "urn:schemas-upnp-org:service:AVTransport:1",
            "Play",
            "<InstanceID>0</InstanceID><Speed>1</Speed>",
        );
        assert!(body.contains(r#"<u:Play xmlns:u="urn:schemas-upnp-org:service:AVTransport:1">"#));
        assert!(body.contains("<Speed>1</Speed>"));
        assert!(body.contains("</u:Play>"));
    }

    #[test]
    fn test_soap_action_header_is_quoted() {
        assert_eq!(
            soap_action("urn:schemas-upnp-org:service:RenderingControl:1", "GetVolume"),
            "\"urn:schemas-upnp-org:service:RenderingControl:1#GetVolume\""
        );
    }

    #[test]
    fn test_extract_response_with_valid_response() {
        let xml_str = r#"
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body>
                    <u:GetVolumeResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1">
                        <CurrentVolume>42</CurrentVolume>
                    </u:GetVolumeResponse>
                </s:Body>
            </s:Envelope>
        "#;

        let response = parse_response(xml_str, "GetVolume").unwrap();
        assert_eq!(response.name, "GetVolumeResponse");
        assert_eq!(
            response.get_child("CurrentVolume").and_then(|e| e.get_text()).as_deref(),
            Some("42")
        );
    }

    #[test]
    fn test_extract_response_with_soap_fault() {
        match parse_response(FAULT_ENVELOPE, "Play") {
            Err(SoapError::Fault(code)) => assert_eq!(code, 701),
            other => panic!("Expected SoapError::Fault, got {:?}", other),
        }
    }

    #[test]
    fn test_soap_fault_with_default_error_code() {
        let xml_str = r#"
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body>
                    <s:Fault>
                        <faultcode>s:Server</faultcode>
                        <faultstring>Internal Error</faultstring>
                    </s:Fault>
                </s:Body>
            </s:Envelope>
        "#;

        match parse_response(xml_str, "Play") {
            Err(SoapError::Fault(code)) => assert_eq!(code, 500),
            other => panic!("Expected SoapError::Fault, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_response_missing_body() {
        let xml_str = r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/"></s:Envelope>"#;

        match parse_response(xml_str, "Play") {
            Err(SoapError::Parse(msg)) => assert!(msg.contains("Missing SOAP Body")),
            other => panic!("Expected SoapError::Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_extract_response_missing_action_response() {
        let xml_str = r#"
            <s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                <s:Body></s:Body>
            </s:Envelope>
        "#;

        match parse_response(xml_str, "Play") {
            Err(SoapError::Parse(msg)) => assert!(msg.contains("Missing PlayResponse element")),
            other => panic!("Expected SoapError::Parse, got {:?}", other),
        }
    }

    #[test]
    fn test_status_without_fault_is_network_error() {
        let err = fault_from_status(503, "Service Unavailable", "Play");
        assert!(matches!(err, SoapError::Status { status: 503, .. }));
        assert!(err.is_transient());
        assert!(err.is_transient());
    }

    #[test]
    fn test_blocking_call_maps_http_500_fault() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/AVTransport/ctrl")
            .match_header(
                "SOAPACTION",
                "\"urn:schemas-upnp-org:service:AVTransport:1#Play\"",
            )
            .with_status(500)
            .with_body(FAULT_ENVELOPE)
            .create();

        let client = SoapClient::new();
        let url = format!("{}/AVTransport/ctrl", server.url());
        let result = client.call(
            &url,
            "urn:schemas-upnp-org:service:AVTransport:1",
            "Play",
            "<InstanceID>0</InstanceID>",
        );

        mock.assert();
        assert!(matches!(result, Err(SoapError::Fault(701))));
    }

    #[tokio::test]
    async fn test_async_call_returns_action_response() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/RenderingControl/ctrl")
            .with_status(200)
            .with_body(
                r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/">
                    <s:Body>
                        <u:GetMuteResponse xmlns:u="urn:schemas-upnp-org:service:RenderingControl:1">
                            <CurrentMute>1</CurrentMute>
                        </u:GetMuteResponse>
                    </s:Body>
                </s:Envelope>"#,
            )
            .create_async()
            .await;

        let client = AsyncSoapClient::new();
        let url = format!("{}/RenderingControl/ctrl", server.url());
        let response = client
            .call(
                &url,
                "urn:schemas-upnp-org:service:RenderingControl:1",
                "GetMute",
                "<InstanceID>0</InstanceID><Channel>Master</Channel>",
            )
            .await
            .unwrap();

        assert_eq!(
            response.get_child("CurrentMute").and_then(|e| e.get_text()).as_deref(),
            Some("1")
        );
    }
}
