//! Service metadata (capabilities) utilities.

use roxmltree::Document;
use url::Url;

use crate::namespaces;
use crate::protocol::HttpMethod;
use crate::xml;

/// Endpoint of an operation for the given HTTP method.
///
/// Reads the first matching `ows:Operation/ows:DCP/ows:HTTP/ows:Get|ows:Post/@xlink:href`.
/// For GET endpoints the query component is removed so that KVP parameters can be
/// appended by the caller.
pub fn operation_endpoint(
    capabilities: &Document<'_>,
    operation: &str,
    method: HttpMethod,
) -> Option<Url> {
    let root = capabilities.root_element();
    let ops_metadata = xml::child(root, namespaces::OWS, "OperationsMetadata")?;
    let op = xml::children(ops_metadata, namespaces::OWS, "Operation")
        .find(|op| op.attribute("name") == Some(operation))?;

    let href = xml::descendants(op, namespaces::OWS, method.element_name())
        .filter_map(|n| n.attribute((namespaces::XLINK, "href")))
        .map(str::trim)
        .find(|href| !href.is_empty())?;

    let mut url = match Url::parse(href) {
        Ok(url) => url,
        Err(e) => {
            tracing::warn!("Invalid {} endpoint for {}: {} ({})", method, operation, href, e);
            return None;
        }
    };
    if method == HttpMethod::Get {
        url.set_query(None);
    }
    Some(url)
}

/// Service version declared by the capabilities document element.
pub fn service_version(capabilities: &Document<'_>) -> Option<String> {
    capabilities
        .root_element()
        .attribute("version")
        .map(str::to_string)
}
