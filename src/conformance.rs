use roxmltree::Document;

use crate::namespaces;
use crate::xml;

/// CSW 3.0 conformance classes, named as they appear in `ows:Constraint/@name`
pub mod classes {
    pub const OPENSEARCH: &str = "OpenSearch";
    pub const GET_CAPABILITIES_XML: &str = "GetCapabilities-XML";
    pub const GET_RECORD_BY_ID_XML: &str = "GetRecordById-XML";
    pub const GET_RECORDS_BASIC_XML: &str = "GetRecords-Basic-XML";
    pub const GET_RECORDS_DISTRIBUTED_XML: &str = "GetRecords-Distributed-XML";
    pub const GET_RECORDS_DISTRIBUTED_KVP: &str = "GetRecords-Distributed-KVP";
    pub const GET_RECORDS_ASYNC_XML: &str = "GetRecords-Async-XML";
    pub const GET_RECORDS_ASYNC_KVP: &str = "GetRecords-Async-KVP";
    pub const GET_DOMAIN_XML: &str = "GetDomain-XML";
    pub const GET_DOMAIN_KVP: &str = "GetDomain-KVP";
    pub const TRANSACTION: &str = "Transaction";
    pub const HARVEST_ASYNC_XML: &str = "Harvest-Async-XML";
    pub const HARVEST_ASYNC_KVP: &str = "Harvest-Async-KVP";
    pub const HARVEST_PERIODIC_XML: &str = "Harvest-Periodic-XML";
    pub const HARVEST_PERIODIC_KVP: &str = "Harvest-Periodic-KVP";
    pub const FILTER_CQL: &str = "Filter-CQL";
    pub const FILTER_FES_XML: &str = "Filter-FES-XML";
    pub const FILTER_FES_KVP: &str = "Filter-FES-KVP";
    pub const FILTER_FES_KVP_ADVANCED: &str = "Filter-FES-KVP-Advanced";

    /// Classes every CSW 3.0 implementation must support.
    pub const MANDATORY: &[&str] = &[OPENSEARCH, GET_CAPABILITIES_XML];

    pub const ALL: &[&str] = &[
        OPENSEARCH,
        GET_CAPABILITIES_XML,
        GET_RECORD_BY_ID_XML,
        GET_RECORDS_BASIC_XML,
        GET_RECORDS_DISTRIBUTED_XML,
        GET_RECORDS_DISTRIBUTED_KVP,
        GET_RECORDS_ASYNC_XML,
        GET_RECORDS_ASYNC_KVP,
        GET_DOMAIN_XML,
        GET_DOMAIN_KVP,
        TRANSACTION,
        HARVEST_ASYNC_XML,
        HARVEST_ASYNC_KVP,
        HARVEST_PERIODIC_XML,
        HARVEST_PERIODIC_KVP,
        FILTER_CQL,
        FILTER_FES_XML,
        FILTER_FES_KVP,
        FILTER_FES_KVP_ADVANCED,
    ];
}

/// Value of the service-level constraint with the given name, if declared.
fn constraint_value(capabilities: &Document<'_>, name: &str) -> Option<bool> {
    let root = capabilities.root_element();
    let ops_metadata = xml::child(root, namespaces::OWS, "OperationsMetadata")?;
    xml::children(ops_metadata, namespaces::OWS, "Constraint")
        .find(|c| c.attribute("name") == Some(name))
        .and_then(|c| xml::child_text(c, namespaces::OWS, "DefaultValue"))
        .map(|v| v.eq_ignore_ascii_case("true"))
}

/// Whether the capabilities document claims support for a conformance class.
///
/// Mandatory classes count as implemented unless explicitly declared FALSE.
pub fn is_implemented(capabilities: &Document<'_>, class: &str) -> bool {
    match constraint_value(capabilities, class) {
        Some(value) => value,
        None => classes::MANDATORY.contains(&class),
    }
}

/// Conformance classes declared as TRUE in the capabilities document.
pub fn declared_classes(capabilities: &Document<'_>) -> Vec<String> {
    classes::ALL
        .iter()
        .filter(|class| constraint_value(capabilities, class) == Some(true))
        .map(|class| class.to_string())
        .collect()
}
