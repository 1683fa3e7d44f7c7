//! OpenSearch URL templates (`os:Url` elements).

use roxmltree::{Document, Node};
use std::collections::HashMap;
use url::Url;
use url::form_urlencoded::byte_serialize;

use crate::error::{EtsError, EtsResult};
use crate::namespaces;
use crate::xml::{self, QName};

/// A template parameter such as `{geo:box?}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateParam {
    pub name: QName,
    pub optional: bool,
}

/// Values assigned to template parameters, keyed by expanded name.
#[derive(Debug, Clone, Default)]
pub struct TemplateValues {
    values: HashMap<QName, String>,
}

impl TemplateValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, namespace: &str, local: &str, value: impl Into<String>) -> &mut Self {
        self.values.insert(QName::new(namespace, local), value.into());
        self
    }

    fn get(&self, name: &QName) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UrlTemplate {
    pub media_type: String,
    pub rel: String,
    pub template: String,
    pub index_offset: i64,
    pub page_offset: i64,
    /// Raw placeholder text (without braces) and the parameter it denotes
    params: Vec<(String, TemplateParam)>,
}

impl UrlTemplate {
    /// Read an `os:Url` element. Parameter prefixes are resolved against the namespace
    /// declarations in scope; unprefixed parameters belong to OpenSearch.
    pub fn from_element(node: Node<'_, '_>) -> EtsResult<Self> {
        let template = node
            .attribute("template")
            .ok_or_else(|| EtsError::UnexpectedContent("Url element without template".to_string()))?
            .to_string();
        let media_type = node.attribute("type").unwrap_or_default().to_string();

        let mut params = Vec::new();
        for token in placeholders(&template) {
            let optional = token.ends_with('?');
            let name = token.trim_end_matches('?');
            let qname = match name.split_once(':') {
                Some((prefix, local)) => QName {
                    namespace: node.lookup_namespace_uri(Some(prefix)).map(str::to_string),
                    local: local.to_string(),
                },
                None => QName::new(namespaces::OSD11, name),
            };
            params.push((token.to_string(), TemplateParam { name: qname, optional }));
        }

        Ok(Self {
            media_type,
            rel: node.attribute("rel").unwrap_or("results").to_string(),
            template,
            index_offset: parse_offset(node.attribute("indexOffset"))?,
            page_offset: parse_offset(node.attribute("pageOffset"))?,
            params,
        })
    }

    pub fn params(&self) -> impl Iterator<Item = &TemplateParam> {
        self.params.iter().map(|(_, p)| p)
    }

    pub fn has_param(&self, namespace: &str, local: &str) -> bool {
        self.params()
            .any(|p| p.name.local == local && p.name.namespace.as_deref() == Some(namespace))
    }

    /// Whether the template's media type essence matches `media_type`.
    pub fn is_type(&self, media_type: &str) -> bool {
        self.media_type
            .split(';')
            .next()
            .is_some_and(|t| t.trim().eq_ignore_ascii_case(media_type))
    }

    fn param(&self, token: &str) -> Option<&TemplateParam> {
        self.params
            .iter()
            .find(|(raw, _)| raw == token)
            .map(|(_, p)| p)
    }

    /// Substitute parameter values into the template.
    ///
    /// Optional parameters without a value are removed together with their query
    /// key (or left empty in the path); required parameters without a value expand
    /// to an empty string.
    pub fn expand(&self, values: &TemplateValues) -> EtsResult<Url> {
        let (base, query) = match query_separator(&self.template) {
            Some(pos) => (&self.template[..pos], Some(&self.template[pos + 1..])),
            None => (self.template.as_str(), None),
        };

        let (mut expanded, _) = self.substitute(base, values);
        if let Some(query) = query {
            let pairs: Vec<String> = query
                .split('&')
                .filter(|pair| !pair.is_empty())
                .filter_map(|pair| match self.substitute(pair, values) {
                    (_, true) => None,
                    (pair, false) => Some(pair),
                })
                .collect();
            if !pairs.is_empty() {
                expanded.push('?');
                expanded.push_str(&pairs.join("&"));
            }
        }
        Ok(Url::parse(&expanded)?)
    }

    /// Replace placeholders in `text`. The flag is set when an optional parameter
    /// was unassigned; its placeholder expands to nothing.
    fn substitute(&self, text: &str, values: &TemplateValues) -> (String, bool) {
        let mut out = String::with_capacity(text.len());
        let mut unassigned = false;
        let mut rest = text;
        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            out.push_str(&rest[..start]);
            let token = &rest[start + 1..start + len];
            match self.param(token) {
                Some(param) => match values.get(&param.name) {
                    Some(value) => out.extend(byte_serialize(value.as_bytes())),
                    None => unassigned |= param.optional,
                },
                None => out.push_str(&rest[start..=start + len]),
            }
            rest = &rest[start + len + 1..];
        }
        out.push_str(rest);
        (out, unassigned)
    }
}

/// Byte position of the `?` starting the query component, ignoring those inside
/// placeholders such as `{geo:uid?}`.
fn query_separator(template: &str) -> Option<usize> {
    let mut in_placeholder = false;
    for (pos, c) in template.char_indices() {
        match c {
            '{' => in_placeholder = true,
            '}' => in_placeholder = false,
            '?' if !in_placeholder => return Some(pos),
            _ => {}
        }
    }
    None
}

fn placeholders(template: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let Some(len) = rest[start..].find('}') else {
            break;
        };
        tokens.push(&rest[start + 1..start + len]);
        rest = &rest[start + len + 1..];
    }
    tokens
}

fn parse_offset(value: Option<&str>) -> EtsResult<i64> {
    match value {
        None => Ok(1),
        Some(v) => v.trim().parse().map_err(|_| {
            EtsError::UnexpectedContent(format!("Invalid index/page offset: {}", v))
        }),
    }
}

/// All URL templates in an OpenSearch description, optionally restricted to a media type.
pub fn find_templates(osd: &Document<'_>, media_type: Option<&str>) -> EtsResult<Vec<UrlTemplate>> {
    let mut templates = Vec::new();
    for node in xml::children(osd.root_element(), namespaces::OSD11, "Url") {
        let template = UrlTemplate::from_element(node)?;
        if media_type.is_none_or(|t| template.is_type(t)) {
            templates.push(template);
        }
    }
    Ok(templates)
}
