//! UPnP device descriptions and control URL resolution
//!
//! Raumfeld devices do not use fixed control paths. The web service lists
//! each device's description `location`; the description maps services to
//! control URLs relative to the description (or its `URLBase`).

use std::collections::HashMap;

use parking_lot::RwLock;
use serde::Deserialize;
use url::Url;

use crate::error::{ApiError, Result};
use crate::service::Service;

/// Parsed `<root>` of a device description document
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeviceDescription {
    #[serde(rename = "URLBase", default)]
    pub url_base: Option<String>,
    pub device: DescribedDevice,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DescribedDevice {
    #[serde(rename = "deviceType", default)]
    pub device_type: String,
    #[serde(rename = "friendlyName", default)]
    pub friendly_name: String,
    #[serde(default)]
    pub manufacturer: String,
    #[serde(rename = "modelName", default)]
    pub model_name: String,
    #[serde(rename = "UDN", default)]
    pub udn: String,
    #[serde(rename = "serviceList", default)]
    pub service_list: ServiceList,
    #[serde(rename = "deviceList", default)]
    pub device_list: EmbeddedDevices,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ServiceList {
    #[serde(rename = "service", default)]
    pub services: Vec<DescribedService>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct EmbeddedDevices {
    #[serde(rename = "device", default)]
    pub devices: Vec<DescribedDevice>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DescribedService {
    #[serde(rename = "serviceType")]
    pub service_type: String,
    #[serde(rename = "serviceId", default)]
    pub service_id: String,
    #[serde(rename = "controlURL")]
    pub control_url: String,
}

impl DeviceDescription {
    pub fn from_xml(xml: &str) -> Result<Self> {
        quick_xml::de::from_str(xml)
            .map_err(|e| ApiError::ParseError(format!("Invalid device description: {}", e)))
    }

    /// Find a service on the root device or any embedded device
    pub fn find_service(&self, service: Service) -> Option<&DescribedService> {
        fn search(device: &DescribedDevice, service: Service) -> Option<&DescribedService> {
            device
                .service_list
                .services
                .iter()
                .find(|s| service.matches_type(&s.service_type))
                .or_else(|| device.device_list.devices.iter().find_map(|d| search(d, service)))
        }
        search(&self.device, service)
    }

    /// Absolute control URL of `service`, given where the description was fetched
    pub fn control_url(&self, location: &str, service: Service) -> Result<String> {
        let described = self.find_service(service).ok_or_else(|| ApiError::ServiceNotFound {
            location: location.to_string(),
            service: service.name(),
        })?;

        let base = self
            .url_base
            .as_deref()
            .map(str::trim)
            .filter(|b| !b.is_empty())
            .unwrap_or(location);
        let base = Url::parse(base)
            .map_err(|e| ApiError::ParseError(format!("Invalid base URL {}: {}", base, e)))?;
        base.join(described.control_url.trim())
            .map(String::from)
            .map_err(|e| ApiError::ParseError(format!("Invalid control URL: {}", e)))
    }
}

/// Control URLs already resolved, keyed by description location and service
#[derive(Debug, Default)]
pub struct ControlUrlCache {
    urls: RwLock<HashMap<(String, Service), String>>,
}

impl ControlUrlCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, location: &str, service: Service) -> Option<String> {
        self.urls.read().get(&(location.to_string(), service)).cloned()
    }

    /// Remember every service a description offers
    pub fn insert_description(&self, location: &str, description: &DeviceDescription) {
        let mut urls = self.urls.write();
        for service in [Service::AVTransport, Service::RenderingControl, Service::ContentDirectory] {
            if let Ok(url) = description.control_url(location, service) {
                urls.insert((location.to_string(), service), url);
            }
        }
    }

    /// Forget a device, e.g. after it stopped answering at its old address
    pub fn invalidate(&self, location: &str) {
        self.urls.write().retain(|(loc, _), _| loc != location);
    }

    pub fn len(&self) -> usize {
        self.urls.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RENDERER_DESCRIPTION: &str = r#"<?xml version="1.0"?>
        <root xmlns="urn:schemas-upnp-org:device-1-0">
            <specVersion><major>1</major><minor>0</minor></specVersion>
            <device>
                <deviceType>urn:schemas-upnp-org:device:MediaRenderer:1</deviceType>
                <friendlyName>Kitchen</friendlyName>
                <manufacturer>Raumfeld GmbH</manufacturer>
                <modelName>Raumfeld Virtual Media Player</modelName>
                <UDN>uuid:zone-1</UDN>
                <serviceList>
                    <service>
                        <serviceType>urn:schemas-upnp-org:service:RenderingControl:1</serviceType>
                        <serviceId>urn:upnp-org:serviceId:RenderingControl</serviceId>
                        <controlURL>/RenderingControl/ctrl</controlURL>
                        <eventSubURL>/RenderingControl/evt</eventSubURL>
                    </service>
                    <service>
                        <serviceType>urn:schemas-upnp-org:service:AVTransport:1</serviceType>
                        <serviceId>urn:upnp-org:serviceId:AVTransport</serviceId>
                        <controlURL>AVTransport/ctrl</controlURL>
                    </service>
                </serviceList>
            </device>
        </root>"#;

    #[test]
    fn test_parse_renderer_description() {
        let description = DeviceDescription::from_xml(RENDERER_DESCRIPTION).unwrap();
        assert_eq!(description.device.friendly_name, "Kitchen");
        assert_eq!(description.device.manufacturer, "Raumfeld GmbH");
        assert_eq!(description.device.udn, "uuid:zone-1");
        assert_eq!(description.device.service_list.services.len(), 2);
    }

    #[test]
    fn test_control_url_relative_to_location() {
        let description = DeviceDescription::from_xml(RENDERER_DESCRIPTION).unwrap();
        let location = "http://10.0.0.5:47366/zone-1/description.xml";

        assert_eq!(
            description.control_url(location, Service::RenderingControl).unwrap(),
            "http://10.0.0.5:47366/RenderingControl/ctrl"
        );
        assert_eq!(
            description.control_url(location, Service::AVTransport).unwrap(),
            "http://10.0.0.5:47366/zone-1/AVTransport/ctrl"
        );
    }

    #[test]
    fn test_missing_service() {
        let description = DeviceDescription::from_xml(RENDERER_DESCRIPTION).unwrap();
        let err = description
            .control_url("http://10.0.0.5:47366/d.xml", Service::ContentDirectory)
            .unwrap_err();
        assert!(matches!(err, ApiError::ServiceNotFound { service: "ContentDirectory", .. }));
    }

    #[test]
    fn test_embedded_device_and_url_base() {
        let xml = r#"<root>
            <URLBase>http://10.0.0.2:52613/</URLBase>
            <device>
                <deviceType>urn:schemas-upnp-org:device:Basic:1</deviceType>
                <deviceList>
                    <device>
                        <deviceType>urn:schemas-upnp-org:device:MediaServer:1</deviceType>
                        <serviceList>
                            <service>
                                <serviceType>urn:schemas-upnp-org:service:ContentDirectory:1</serviceType>
                                <controlURL>/cd/control</controlURL>
                            </service>
                        </serviceList>
                    </device>
                </deviceList>
            </device>
        </root>"#;
        let description = DeviceDescription::from_xml(xml).unwrap();
        assert_eq!(
            description
                .control_url("http://elsewhere/desc.xml", Service::ContentDirectory)
                .unwrap(),
            "http://10.0.0.2:52613/cd/control"
        );
    }

    #[test]
    fn test_cache_insert_and_invalidate() {
        let description = DeviceDescription::from_xml(RENDERER_DESCRIPTION).unwrap();
        let cache = ControlUrlCache::new();
        let location = "http://10.0.0.5:47366/zone-1/description.xml";

        cache.insert_description(location, &description);
        assert_eq!(cache.len(), 2);
        assert!(cache.get(location, Service::AVTransport).is_some());
        assert!(cache.get(location, Service::ContentDirectory).is_none());

        cache.invalidate(location);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_malformed_description() {
        assert!(matches!(
            DeviceDescription::from_xml("<root><device>"),
            Err(ApiError::ParseError(_))
        ));
    }
}
