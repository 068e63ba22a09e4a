use std::sync::Arc;

use soap_client::{AsyncSoapClient, SoapClient};

use crate::description::{ControlUrlCache, DeviceDescription};
use crate::error::{ApiError, Result};
use crate::operation::UpnpOperation;
use crate::service::Service;

/// A client for executing Raumfeld operations against actual devices
///
/// Devices are addressed by the `location` of their description document,
/// as listed by the host web service. The control URL for each service is
/// read from that description once and cached.
///
/// # Example
/// ```rust,no_run
/// use raumfeld_api::RaumfeldClient;
/// use raumfeld_api::operations::{GetVolumeOperation, ChannelRequest};
///
/// let client = RaumfeldClient::new();
/// let volume = client.execute::<GetVolumeOperation>(
///     "http://192.168.1.20:47366/zone/description.xml",
///     &ChannelRequest::default(),
/// )?;
/// # Ok::<(), raumfeld_api::ApiError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RaumfeldClient {
    soap_client: SoapClient,
    control_urls: Arc<ControlUrlCache>,
}

impl RaumfeldClient {
    /// Create a client using the shared SOAP client
    pub fn new() -> Self {
        Self::with_soap_client(SoapClient::get().clone())
    }

    /// Create a client with a custom SOAP client (for advanced use cases)
    pub fn with_soap_client(soap_client: SoapClient) -> Self {
        Self {
            soap_client,
            control_urls: Arc::new(ControlUrlCache::new()),
        }
    }

    /// Execute an operation against the device described at `location`
    pub fn execute<Op: UpnpOperation>(&self, location: &str, request: &Op::Request) -> Result<Op::Response> {
        let payload = Op::build_payload(request)?;
        let control_url = self.control_url(location, Op::SERVICE)?;

        let result = self.soap_client.call(
            &control_url,
            Op::SERVICE.info().service_uri,
            Op::ACTION,
            &payload,
        );

        match result {
            Ok(xml) => Op::parse_response(&xml),
            Err(e) => {
                let error = ApiError::from(e);
                if error.is_transient() {
                    // The device may have restarted with new control paths
                    self.control_urls.invalidate(location);
                }
                Err(error)
            }
        }
    }

    /// Fetch and parse the description document at `location`
    pub fn describe(&self, location: &str) -> Result<DeviceDescription> {
        let xml = self.soap_client.fetch_text(location)?;
        DeviceDescription::from_xml(&xml)
    }

    /// Resolve the control URL of `service`, fetching the description on a miss
    pub fn control_url(&self, location: &str, service: Service) -> Result<String> {
        if let Some(url) = self.control_urls.get(location, service) {
            return Ok(url);
        }

        tracing::debug!(location, service = service.name(), "resolving control URL");
        let description = self.describe(location)?;
        self.control_urls.insert_description(location, &description);
        description.control_url(location, service)
    }
}

impl Default for RaumfeldClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Async twin of [`RaumfeldClient`] running on a shared reqwest session
#[derive(Debug, Clone)]
pub struct AsyncRaumfeldClient {
    soap_client: AsyncSoapClient,
    control_urls: Arc<ControlUrlCache>,
}

impl AsyncRaumfeldClient {
    pub fn new() -> Self {
        Self::with_soap_client(AsyncSoapClient::new())
    }

    /// Reuse a session supplied by the host application
    pub fn with_http_client(http: reqwest::Client) -> Self {
        Self::with_soap_client(AsyncSoapClient::with_client(http))
    }

    pub fn with_soap_client(soap_client: AsyncSoapClient) -> Self {
        Self {
            soap_client,
            control_urls: Arc::new(ControlUrlCache::new()),
        }
    }

    pub async fn execute<Op: UpnpOperation>(
        &self,
        location: &str,
        request: &Op::Request,
    ) -> Result<Op::Response> {
        let payload = Op::build_payload(request)?;
        let control_url = self.control_url(location, Op::SERVICE).await?;

        let result = self
            .soap_client
            .call(&control_url, Op::SERVICE.info().service_uri, Op::ACTION, &payload)
            .await;

        match result {
            Ok(xml) => Op::parse_response(&xml),
            Err(e) => {
                let error = ApiError::from(e);
                if error.is_transient() {
                    self.control_urls.invalidate(location);
                }
                Err(error)
            }
        }
    }

    pub async fn describe(&self, location: &str) -> Result<DeviceDescription> {
        let xml = self.soap_client.fetch_text(location).await?;
        DeviceDescription::from_xml(&xml)
    }

    pub async fn control_url(&self, location: &str, service: Service) -> Result<String> {
        if let Some(url) = self.control_urls.get(location, service) {
            return Ok(url);
        }

        tracing::debug!(location, service = service.name(), "resolving control URL (async)");
        let description = self.describe(location).await?;
        self.control_urls.insert_description(location, &description);
        description.control_url(location, service)
    }
}

impl Default for AsyncRaumfeldClient {
    fn default() -> Self {
        Self::new()
    }
}
