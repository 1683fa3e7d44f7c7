//! Assertions used by the test classes.

use reqwest::StatusCode;
use roxmltree::{Document, Node};

use crate::envelope::Envelope;
use crate::http::Exchange;
use crate::namespaces;
use crate::runner::{Verdict, fail};
use crate::validation::ValidationReport;
use crate::xml::{self, QName};

/// Fails with `message` unless `condition` holds.
pub fn ensure(condition: bool, message: impl Into<String>) -> Verdict {
    if condition { Ok(()) } else { Err(fail(message)) }
}

pub fn assert_qualified_name(node: Node<'_, '_>, expected: &QName) -> Verdict {
    ensure(
        expected.matches(node),
        format!(
            "Unexpected element name: expected {} but was {}",
            expected,
            xml::qualified_name(node)
        ),
    )
}

pub fn assert_status(exchange: &Exchange, expected: StatusCode) -> Verdict {
    ensure(
        exchange.status == expected,
        format!(
            "Unexpected status code: expected {} but was {}",
            expected.as_u16(),
            exchange.status.as_u16()
        ),
    )
}

/// The response content type must be compatible with one of `expected`.
pub fn assert_media_type(exchange: &Exchange, expected: &[&str]) -> Verdict {
    let actual = exchange.media_type();
    let compatible = actual
        .as_deref()
        .is_some_and(|a| expected.iter().any(|e| e.eq_ignore_ascii_case(a)));
    ensure(
        compatible,
        format!(
            "Expected media type compatible with {} but was {}",
            expected.join(" or "),
            actual.as_deref().unwrap_or("<none>")
        ),
    )
}

pub fn assert_schema_valid(report: &ValidationReport) -> Verdict {
    ensure(
        report.is_valid(),
        format!(
            "Schema validation failed: {} error(s) detected:\n{}",
            report.error_count(),
            report
        ),
    )
}

pub fn assert_envelopes_intersect(actual: &Envelope, query: &Envelope) -> Verdict {
    ensure(
        actual.intersects(query),
        format!(
            "The envelopes do not intersect: item extent {} is outside the query box {}",
            actual, query
        ),
    )
}

/// The document must be an OWS exception report containing `code`.
pub fn assert_exception_code(doc: &Document<'_>, code: &str) -> Verdict {
    let root = doc.root_element();
    assert_qualified_name(root, &QName::new(namespaces::OWS, "ExceptionReport"))?;

    let codes: Vec<&str> = xml::children(root, namespaces::OWS, "Exception")
        .filter_map(|e| e.attribute("exceptionCode"))
        .collect();
    ensure(
        codes.contains(&code),
        format!(
            "Expected exception code {} but found [{}]",
            code,
            codes.join(", ")
        ),
    )
}

/// Parse a response entity; malformed content is a failure of the implementation.
pub fn parse_entity(text: &str) -> Result<Document<'_>, crate::runner::Failure> {
    xml::parse(text).map_err(|e| fail(format!("Response entity is not well-formed XML: {}", e)))
}
