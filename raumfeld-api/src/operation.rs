//! Operation framework for UPnP actions
//!
//! Each UPnP action is a zero-sized type implementing [`UpnpOperation`]. The
//! request and response types are plain structs, so the same operation runs
//! through the blocking and the async client.

use std::fmt::Display;
use std::str::FromStr;

use xmltree::Element;

use crate::error::{ApiError, Result};
use crate::service::Service;

/// Base trait for all Raumfeld UPnP operations
pub trait UpnpOperation {
    /// The request type for this operation
    type Request;

    /// The response type for this operation
    type Response;

    /// The UPnP service this operation belongs to
    const SERVICE: Service;

    /// The SOAP action name for this operation
    const ACTION: &'static str;

    /// Build the SOAP payload (without envelope) from the request data
    ///
    /// Fails with [`ApiError::InvalidParameter`] when a value is out of range.
    fn build_payload(request: &Self::Request) -> Result<String>;

    /// Parse the action response element into the typed response
    fn parse_response(xml: &Element) -> Result<Self::Response>;
}

/// Render one SOAP argument element, escaping its value
pub fn arg(name: &str, value: impl Display) -> String {
    let value = value.to_string();
    format!(
        "<{name}>{value}</{name}>",
        name = name,
        value = quick_xml::escape::escape(value.as_str())
    )
}

/// Text of a required child element
pub fn required_text(xml: &Element, name: &str) -> Result<String> {
    xml.get_child(name)
        .map(|e| e.get_text().map(|t| t.into_owned()).unwrap_or_default())
        .ok_or_else(|| ApiError::ParseError(format!("Missing {} element", name)))
}

/// Text of an optional child element, empty when absent
pub fn optional_text(xml: &Element, name: &str) -> String {
    xml.get_child(name)
        .and_then(|e| e.get_text())
        .map(|t| t.into_owned())
        .unwrap_or_default()
}

/// Parse a required child element into a number or other `FromStr` value
pub fn required_value<T: FromStr>(xml: &Element, name: &str) -> Result<T> {
    let text = required_text(xml, name)?;
    text.trim()
        .parse()
        .map_err(|_| ApiError::ParseError(format!("Invalid {} value: {}", name, text)))
}

/// Define an operation whose response carries no data
///
/// Every generated request has an `instance_id` followed by the listed
/// fields, serialized in order under the given argument names.
macro_rules! unit_operation {
    (
        $(#[$meta:meta])*
        $op:ident, $request:ident, $service:ident, $action:literal,
        { $($field:ident: $ty:ty => $arg_name:literal),* $(,)? }
    ) => {
        $(#[$meta])*
        pub struct $op;

        #[derive(Debug, Clone, PartialEq)]
        pub struct $request {
            pub instance_id: u32,
            $(pub $field: $ty,)*
        }

        impl $crate::operation::UpnpOperation for $op {
            type Request = $request;
            type Response = ();

            const SERVICE: $crate::service::Service = $crate::service::Service::$service;
            const ACTION: &'static str = $action;

            fn build_payload(request: &Self::Request) -> $crate::error::Result<String> {
                #[allow(unused_mut)]
                let mut payload = $crate::operation::arg("InstanceID", request.instance_id);
                $(payload.push_str(&$crate::operation::arg($arg_name, &request.$field));)*
                Ok(payload)
            }

            fn parse_response(_xml: &xmltree::Element) -> $crate::error::Result<()> {
                Ok(())
            }
        }
    };
}

pub(crate) use unit_operation;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arg_escapes_value() {
        assert_eq!(arg("InstanceID", 0), "<InstanceID>0</InstanceID>");
        assert_eq!(
            arg("CurrentURIMetaData", "<DIDL-Lite>&</DIDL-Lite>"),
            "<CurrentURIMetaData>&lt;DIDL-Lite&gt;&amp;&lt;/DIDL-Lite&gt;</CurrentURIMetaData>"
        );
    }

    #[test]
    fn test_required_text_missing() {
        let xml = Element::parse("<R><A>1</A></R>".as_bytes()).unwrap();
        assert_eq!(required_text(&xml, "A").unwrap(), "1");
        assert!(matches!(required_text(&xml, "B"), Err(ApiError::ParseError(_))));
        assert_eq!(optional_text(&xml, "B"), "");
    }

    #[test]
    fn test_required_value_parses_numbers() {
        let xml = Element::parse("<R><V> 42 </V><W>x</W></R>".as_bytes()).unwrap();
        assert_eq!(required_value::<u8>(&xml, "V").unwrap(), 42);
        assert!(required_value::<u8>(&xml, "W").is_err());
    }
}
