//! OpenSearch description tests

use ets_cat30::runner::Outcome;

use crate::common::*;

#[tokio::test]
async fn test_description_pass() {
    let iut = MockCatalogue::start().await;
    iut.mount_service("OpenSearchDescription-valid.xml").await;
    let ctx = iut
        .context(Some("OpenSearchDescription-valid.xml"))
        .with_schemas(schemas_with_osd(StubValidator::valid()));

    let report = run_class(&ctx, "opensearch-description").await;
    assert_eq!(result(&report, "prefer_opensearch_description").outcome, Outcome::Pass);
    assert_eq!(result(&report, "get_opensearch_description").outcome, Outcome::Pass);
    assert_eq!(result(&report, "atom_template_available").outcome, Outcome::Pass);
    assert_eq!(
        result(&report, "prefer_opensearch_description").requirement.as_deref(),
        Some("Test-008")
    );
}

#[tokio::test]
async fn test_description_not_schema_valid() {
    let iut = MockCatalogue::start().await;
    iut.mount_service("OpenSearchDescription-valid.xml").await;
    let ctx = iut
        .context(Some("OpenSearchDescription-valid.xml"))
        .with_schemas(schemas_with_osd(StubValidator::failing(2)));

    let report = run_class(&ctx, "opensearch-description").await;
    let r = result(&report, "get_opensearch_description");
    assert_eq!(r.outcome, Outcome::Fail);
    assert_eq!(r.requirement.as_deref(), Some("Test-021"));
    let message = r.message.as_deref().unwrap();
    assert!(message.starts_with("Schema validation failed: 2 error(s) detected:"));
    assert!(message.contains("[2] Stub error 2"));
    assert!(
        r.request
            .as_deref()
            .unwrap()
            .contains("application/vnd.a9.opensearchdescription+xml")
    );
}

#[tokio::test]
async fn test_description_schema_unavailable() {
    let iut = MockCatalogue::start().await;
    iut.mount_service("OpenSearchDescription-valid.xml").await;
    let ctx = iut.context(Some("OpenSearchDescription-valid.xml"));

    let report = run_class(&ctx, "opensearch-description").await;
    let r = result(&report, "get_opensearch_description");
    assert_eq!(r.outcome, Outcome::Skip);
    assert!(r.request.is_none());
}

#[tokio::test]
async fn test_description_not_preferred() {
    let iut = MockCatalogue::start().await;
    // Capabilities returned whatever the Accept header says
    iut.mount_default("/csw", APP_XML, "capabilities-basic.xml").await;
    let ctx = iut.context(Some("OpenSearchDescription-rss.xml"));

    let report = run_class(&ctx, "opensearch-description").await;
    let r = result(&report, "prefer_opensearch_description");
    assert_eq!(r.outcome, Outcome::Fail);
    assert_eq!(
        r.message.as_deref(),
        Some(
            "Unexpected element name: expected {http://a9.com/-/spec/opensearch/1.1/}OpenSearchDescription \
             but was {http://www.opengis.net/cat/csw/3.0}Capabilities"
        )
    );

    let atom = result(&report, "atom_template_available");
    assert_eq!(atom.outcome, Outcome::Fail);
    assert_eq!(
        atom.message.as_deref(),
        Some("No URL template for results of type application/atom+xml")
    );
}

#[tokio::test]
async fn test_atom_template_without_description() {
    let iut = MockCatalogue::start().await;
    let ctx = iut.context(None);

    let report = run_class(&ctx, "opensearch-description").await;
    let r = result(&report, "atom_template_available");
    assert_eq!(r.outcome, Outcome::Skip);
    assert_eq!(r.message.as_deref(), Some("OpenSearch description not found"));
}
