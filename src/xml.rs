//! Namespace-aware DOM helpers over `roxmltree`.

use roxmltree::{Document, Node};
use std::fmt;

use crate::error::EtsResult;

/// Parse an XML entity.
pub fn parse(text: &str) -> EtsResult<Document<'_>> {
    let options = roxmltree::ParsingOptions {
        allow_dtd: true,
        ..Default::default()
    };
    Ok(Document::parse_with_options(text, options)?)
}

/// An expanded element name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QName {
    pub namespace: Option<String>,
    pub local: String,
}

impl QName {
    pub fn new(namespace: &str, local: &str) -> Self {
        Self {
            namespace: Some(namespace.to_string()),
            local: local.to_string(),
        }
    }

    pub fn matches(&self, node: Node<'_, '_>) -> bool {
        node.is_element()
            && node.tag_name().name() == self.local
            && node.tag_name().namespace() == self.namespace.as_deref()
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.namespace {
            Some(ns) => write!(f, "{{{}}}{}", ns, self.local),
            None => f.write_str(&self.local),
        }
    }
}

/// Qualified name of an element node.
pub fn qualified_name(node: Node<'_, '_>) -> QName {
    QName {
        namespace: node.tag_name().namespace().map(str::to_string),
        local: node.tag_name().name().to_string(),
    }
}

pub fn is_element(node: Node<'_, '_>, namespace: &str, local: &str) -> bool {
    node.is_element() && node.has_tag_name((namespace, local))
}

/// First child element with the given name.
pub fn child<'a, 'i>(node: Node<'a, 'i>, namespace: &str, local: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| is_element(*n, namespace, local))
}

pub fn children<'a, 'i>(
    node: Node<'a, 'i>,
    namespace: &'a str,
    local: &'a str,
) -> impl Iterator<Item = Node<'a, 'i>> + 'a {
    node.children().filter(move |n| is_element(*n, namespace, local))
}

/// Descendant elements (excluding `node` itself) with the given name.
pub fn descendants<'a, 'i>(
    node: Node<'a, 'i>,
    namespace: &'a str,
    local: &'a str,
) -> impl Iterator<Item = Node<'a, 'i>> + 'a {
    node.descendants()
        .skip(1)
        .filter(move |n| is_element(*n, namespace, local))
}

/// Trimmed text content of an element, `None` when empty.
pub fn text(node: Node<'_, '_>) -> Option<String> {
    let content: String = node
        .descendants()
        .filter(|n| n.is_text())
        .filter_map(|n| n.text())
        .collect();
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Trimmed text of the first child element with the given name.
pub fn child_text(node: Node<'_, '_>, namespace: &str, local: &str) -> Option<String> {
    child(node, namespace, local).and_then(text)
}
