//! XML namespace names used in catalogue messages.

/// CSW 3.0
pub const CSW: &str = "http://www.opengis.net/cat/csw/3.0";
/// OWS Common 2.0
pub const OWS: &str = "http://www.opengis.net/ows/2.0";
/// OpenSearch 1.1
pub const OSD11: &str = "http://a9.com/-/spec/opensearch/1.1/";
/// Atom (RFC 4287)
pub const ATOM: &str = "http://www.w3.org/2005/Atom";
pub const GEORSS: &str = "http://www.georss.org/georss";
pub const GML32: &str = "http://www.opengis.net/gml/3.2";
/// Dublin Core element set
pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const DCT: &str = "http://purl.org/dc/terms/";
pub const XLINK: &str = "http://www.w3.org/1999/xlink";
/// OpenSearch Geo extension 1.0
pub const OS_GEO: &str = "http://a9.com/-/opensearch/extensions/geo/1.0/";
/// OpenSearch Time extension 1.0
pub const OS_TIME: &str = "http://a9.com/-/opensearch/extensions/time/1.0/";
