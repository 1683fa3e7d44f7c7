//! CSW 3.0 protocol constants.

use std::fmt;

pub const SERVICE_TYPE: &str = "CSW";
pub const VERSION: &str = "3.0.0";

/// Media types
pub mod media {
    pub const APP_XML: &str = "application/xml";
    pub const TEXT_XML: &str = "text/xml";
    pub const APP_ATOM_XML: &str = "application/atom+xml";
    pub const APP_RSS_XML: &str = "application/rss+xml";
    pub const APP_VND_OPENSEARCH_XML: &str = "application/vnd.a9.opensearchdescription+xml";
    pub const APP_OPENSEARCH_XML: &str = "application/opensearchdescription+xml";
}

/// Operation names
pub mod ops {
    pub const GET_CAPABILITIES: &str = "GetCapabilities";
    pub const GET_RECORDS: &str = "GetRecords";
    pub const GET_RECORD_BY_ID: &str = "GetRecordById";
}

/// KVP request parameter names
pub mod params {
    pub const SERVICE: &str = "service";
    pub const REQUEST: &str = "request";
    pub const VERSION: &str = "version";
    pub const ACCEPT_VERSIONS: &str = "acceptVersions";
    pub const TYPE_NAMES: &str = "typeNames";
    pub const ELEMENT_SET_NAME: &str = "elementSetName";
    pub const RESULT_TYPE: &str = "resultType";
    pub const MAX_RECORDS: &str = "maxRecords";
    pub const OUTPUT_SCHEMA: &str = "outputSchema";
}

/// OWS exception codes
pub mod exceptions {
    pub const VERSION_NEGOTIATION_FAILED: &str = "VersionNegotiationFailed";
    pub const INVALID_PARAMETER_VALUE: &str = "InvalidParameterValue";
}

/// HTTP method bound to an operation endpoint (ows:DCP/ows:HTTP child).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    /// Local name of the matching OWS element.
    pub fn element_name(self) -> &'static str {
        match self {
            HttpMethod::Get => "Get",
            HttpMethod::Post => "Post",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Get => f.write_str("GET"),
            HttpMethod::Post => f.write_str("POST"),
        }
    }
}
