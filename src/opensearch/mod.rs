//! OpenSearch 1.1 tests and the geo/time extensions.

pub mod description;
pub mod geo;
pub mod search;
pub mod template;

use roxmltree::{Document, Node};

use crate::namespaces;
use crate::suite::SuiteContext;
use crate::xml;
use template::UrlTemplate;

pub(crate) const OSD_NOT_FOUND: &str = "OpenSearch description not found";

/// URL templates from the OpenSearch description suite attribute.
pub(crate) fn load_templates(ctx: &SuiteContext) -> Result<Vec<UrlTemplate>, String> {
    let osd = ctx
        .opensearch_description
        .as_deref()
        .ok_or_else(|| OSD_NOT_FOUND.to_string())?;
    let doc = xml::parse(osd).map_err(|e| format!("Invalid OpenSearch description: {}", e))?;
    template::find_templates(&doc, None)
        .map_err(|e| format!("Invalid OpenSearch description: {}", e))
}

/// Result items of a response: Atom entries or RSS channel items.
pub fn result_items<'a, 'i>(doc: &'a Document<'i>) -> Vec<Node<'a, 'i>> {
    let root = doc.root_element();
    if xml::is_element(root, namespaces::ATOM, "feed") {
        return xml::children(root, namespaces::ATOM, "entry").collect();
    }
    if root.is_element() && root.tag_name().name() == "rss" && root.tag_name().namespace().is_none() {
        return root
            .children()
            .filter(|n| n.is_element() && n.tag_name().name() == "channel")
            .flat_map(|channel| channel.children())
            .filter(|n| n.is_element() && n.tag_name().name() == "item" && n.tag_name().namespace().is_none())
            .collect();
    }
    Vec::new()
}

/// Identifiers carried by a result item (`dc:identifier`, `atom:id` or RSS `guid`).
pub fn item_identifiers(item: Node<'_, '_>) -> Vec<String> {
    item.descendants()
        .filter(|n| {
            xml::is_element(*n, namespaces::DC, "identifier")
                || xml::is_element(*n, namespaces::ATOM, "id")
                || (n.is_element() && n.tag_name().name() == "guid" && n.tag_name().namespace().is_none())
        })
        .filter_map(xml::text)
        .collect()
}
