//! ContentDirectory service operations on the media server

use xmltree::Element;

use crate::error::Result;
use crate::operation::{arg, optional_text, required_text, UpnpOperation};
use crate::service::Service;

/// Browse mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseFlag {
    /// Metadata of the object itself
    Metadata,
    /// The object's children
    DirectChildren,
}

impl BrowseFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            BrowseFlag::Metadata => "BrowseMetadata",
            BrowseFlag::DirectChildren => "BrowseDirectChildren",
        }
    }
}

/// Browse operation
pub struct BrowseOperation;

#[derive(Debug, Clone, PartialEq)]
pub struct BrowseRequest {
    pub object_id: String,
    pub browse_flag: BrowseFlag,
    pub filter: String,
    pub starting_index: u32,
    /// Zero means no limit
    pub requested_count: u32,
    pub sort_criteria: String,
}

impl BrowseRequest {
    pub fn new(object_id: impl Into<String>, browse_flag: BrowseFlag) -> Self {
        Self {
            object_id: object_id.into(),
            browse_flag,
            filter: "*".to_string(),
            starting_index: 0,
            requested_count: 0,
            sort_criteria: String::new(),
        }
    }
}

/// Result of a Browse or Search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DirectoryResult {
    /// Raw DIDL-Lite document with the matching objects
    pub result: String,
    pub number_returned: u32,
    pub total_matches: u32,
    pub update_id: u32,
}

fn parse_directory_result(xml: &Element) -> Result<DirectoryResult> {
    let count = |name: &str| optional_text(xml, name).trim().parse().unwrap_or(0);
    Ok(DirectoryResult {
        result: required_text(xml, "Result")?,
        number_returned: count("NumberReturned"),
        total_matches: count("TotalMatches"),
        update_id: count("UpdateID"),
    })
}

impl UpnpOperation for BrowseOperation {
    type Request = BrowseRequest;
    type Response = DirectoryResult;

    const SERVICE: Service = Service::ContentDirectory;
    const ACTION: &'static str = "Browse";

    fn build_payload(request: &Self::Request) -> Result<String> {
        Ok([
            arg("ObjectID", &request.object_id),
            arg("BrowseFlag", request.browse_flag.as_str()),
            arg("Filter", &request.filter),
            arg("StartingIndex", request.starting_index),
            arg("RequestedCount", request.requested_count),
            arg("SortCriteria", &request.sort_criteria),
        ]
        .concat())
    }

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        parse_directory_result(xml)
    }
}

/// Search operation
pub struct SearchOperation;

#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub container_id: String,
    /// e.g. `dc:title contains "Yesterday"`
    pub search_criteria: String,
    pub filter: String,
    pub starting_index: u32,
    pub requested_count: u32,
    /// e.g. `+upnp:artist,-dc:date,+dc:title`
    pub sort_criteria: String,
}

impl SearchRequest {
    pub fn new(container_id: impl Into<String>, search_criteria: impl Into<String>) -> Self {
        Self {
            container_id: container_id.into(),
            search_criteria: search_criteria.into(),
            filter: "*".to_string(),
            starting_index: 0,
            requested_count: 0,
            sort_criteria: String::new(),
        }
    }
}

impl UpnpOperation for SearchOperation {
    type Request = SearchRequest;
    type Response = DirectoryResult;

    const SERVICE: Service = Service::ContentDirectory;
    const ACTION: &'static str = "Search";

    fn build_payload(request: &Self::Request) -> Result<String> {
        Ok([
            arg("ContainerID", &request.container_id),
            arg("SearchCriteria", &request.search_criteria),
            arg("Filter", &request.filter),
            arg("StartingIndex", request.starting_index),
            arg("RequestedCount", request.requested_count),
            arg("SortCriteria", &request.sort_criteria),
        ]
        .concat())
    }

    fn parse_response(xml: &Element) -> Result<Self::Response> {
        parse_directory_result(xml)
    }
}
