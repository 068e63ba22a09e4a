/// UPnP services used on Raumfeld devices
///
/// Zone renderers (virtual media players) expose AVTransport and
/// RenderingControl; the media server exposes ContentDirectory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// AVTransport service - Controls playback (play, pause, stop, seek, etc.)
    AVTransport,

    /// RenderingControl service - Controls audio rendering (volume, mute, etc.)
    RenderingControl,

    /// ContentDirectory service - Browses and searches the media library
    ContentDirectory,
}

/// Identifies a service in SOAP requests and device descriptions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInfo {
    /// The UPnP service type used as SOAP namespace and `SOAPACTION` prefix
    pub service_uri: &'static str,

    /// Service id as listed in device descriptions
    pub service_id: &'static str,
}

impl Service {
    /// Get the name of this service as a string
    pub fn name(&self) -> &'static str {
        match self {
            Service::AVTransport => "AVTransport",
            Service::RenderingControl => "RenderingControl",
            Service::ContentDirectory => "ContentDirectory",
        }
    }

    /// Get the service type and id for this service
    pub fn info(&self) -> ServiceInfo {
        match self {
            Service::AVTransport => ServiceInfo {
                service_uri: "urn:schemas-upnp-org:service:AVTransport:1",
                service_id: "urn:upnp-org:serviceId:AVTransport",
            },
            Service::RenderingControl => ServiceInfo {
                service_uri: "urn:schemas-upnp-org:service:RenderingControl:1",
                service_id: "urn:upnp-org:serviceId:RenderingControl",
            },
            Service::ContentDirectory => ServiceInfo {
                service_uri: "urn:schemas-upnp-org:service:ContentDirectory:1",
                service_id: "urn:upnp-org:serviceId:ContentDirectory",
            },
        }
    }

    /// Whether a description's `serviceType` refers to this service
    ///
    /// Matches any version of the service type, since Raumfeld firmware
    /// revisions differ in what they announce.
    pub fn matches_type(&self, service_type: &str) -> bool {
        let prefix = format!("urn:schemas-upnp-org:service:{}:", self.name());
        service_type.starts_with(&prefix)
    }
}
