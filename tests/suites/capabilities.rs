//! GetCapabilities tests and suite preconditions

use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path, query_param};
use wiremock::Mock;

use ets_cat30::EtsError;
use ets_cat30::http::HttpClient;
use ets_cat30::runner::Outcome;
use ets_cat30::suite::SuiteContext;

use crate::common::*;

#[tokio::test]
async fn test_suite_preconditions() {
    let iut = MockCatalogue::start().await;
    iut.mount_service("OpenSearchDescription-valid.xml").await;

    let ctx = SuiteContext::initialize(Arc::new(iut.config())).await.unwrap();
    assert!(ctx.capabilities.contains("csw:Capabilities"));
    assert!(
        ctx.opensearch_description
            .as_deref()
            .is_some_and(|osd| osd.contains("OpenSearchDescription"))
    );
    let dataset = ctx.dataset.as_ref().unwrap();
    assert_eq!(dataset.identifiers, vec!["urn:uuid:1", "urn:uuid:2", "urn:uuid:3"]);
    assert!(dataset.extent.is_some());
}

#[tokio::test]
async fn test_preconditions_without_optional_attributes() {
    let iut = MockCatalogue::start().await;
    Mock::given(method("GET"))
        .and(path("/csw"))
        .and(query_param("request", "GetCapabilities"))
        .respond_with(iut.respond(200, APP_XML, &iut.fixture("capabilities-basic.xml")))
        .mount(&iut.server)
        .await;

    let ctx = SuiteContext::initialize(Arc::new(iut.config())).await.unwrap();
    assert!(ctx.opensearch_description.is_none());
    assert!(ctx.dataset.is_none());
}

#[tokio::test]
async fn test_precondition_not_a_catalogue() {
    let iut = MockCatalogue::start().await;
    Mock::given(method("GET"))
        .and(path("/csw"))
        .respond_with(iut.respond(200, "text/html", "<html><body>Welcome</body></html>"))
        .mount(&iut.server)
        .await;

    let err = SuiteContext::initialize(Arc::new(iut.config())).await.unwrap_err();
    assert!(matches!(err, EtsError::Precondition(_)), "unexpected error: {:?}", err);
}

#[tokio::test]
async fn test_capabilities_pass() {
    let iut = MockCatalogue::start().await;
    iut.mount_service("OpenSearchDescription-valid.xml").await;
    iut.mount_query(
        "/csw",
        "acceptVersions",
        "9.9.9",
        400,
        APP_XML,
        "ExceptionReport-version.xml",
    )
    .await;

    let ctx = SuiteContext::initialize(Arc::new(iut.config())).await.unwrap();
    let report = run_class(&ctx, "capabilities").await;

    assert_eq!(result(&report, "get_capabilities").outcome, Outcome::Pass);
    assert_eq!(result(&report, "unsupported_version").outcome, Outcome::Pass);
    // No CSW schema configured
    let schema = result(&report, "capabilities_is_schema_valid");
    assert_eq!(schema.outcome, Outcome::Skip);
    assert_eq!(schema.message.as_deref(), Some("CSW schema not available"));

    assert!(!report.has_failures());
    assert_eq!(
        report.conformance_classes,
        vec!["OpenSearch", "GetCapabilities-XML", "GetRecords-Basic-XML"]
    );
}

#[tokio::test]
async fn test_capabilities_schema_validation() {
    let iut = MockCatalogue::start().await;
    iut.mount_service("OpenSearchDescription-valid.xml").await;

    let ctx = iut.context(None).with_schemas(schemas_with_csw(StubValidator::valid()));
    let report = run_class(&ctx, "capabilities").await;
    assert_eq!(result(&report, "capabilities_is_schema_valid").outcome, Outcome::Pass);

    let ctx = iut.context(None).with_schemas(schemas_with_csw(StubValidator::failing(3)));
    let report = run_class(&ctx, "capabilities").await;
    let r = result(&report, "capabilities_is_schema_valid");
    assert_eq!(r.outcome, Outcome::Fail);
    let message = r.message.as_deref().unwrap();
    assert!(message.starts_with("Schema validation failed: 3 error(s) detected:"));
    assert!(message.contains("[3] Stub error 3"));
    assert!(r.response.as_deref().unwrap().starts_with("STATUS:\n200\n"));
}

#[tokio::test]
async fn test_capabilities_wrong_version() {
    let iut = MockCatalogue::start().await;
    let capabilities = iut
        .fixture("capabilities-basic.xml")
        .replace(r#"version="3.0.0""#, r#"version="2.0.2""#);
    Mock::given(method("GET"))
        .and(path("/csw"))
        .respond_with(iut.respond(200, APP_XML, &capabilities))
        .mount(&iut.server)
        .await;

    let ctx = iut.context(None);
    let report = run_class(&ctx, "capabilities").await;

    let get = result(&report, "get_capabilities");
    assert_eq!(get.outcome, Outcome::Fail);
    assert_eq!(
        get.message.as_deref(),
        Some("Unexpected service version: expected 3.0.0 but was 2.0.2")
    );
    let request = get.request.as_deref().unwrap();
    assert!(request.starts_with("TARGET:\nGET "));
    assert!(request.contains("request=GetCapabilities"));
    assert!(get.response.as_deref().unwrap().starts_with("STATUS:\n200\n"));

    let version = result(&report, "unsupported_version");
    assert_eq!(version.outcome, Outcome::Fail);
    assert_eq!(
        version.message.as_deref(),
        Some("Unexpected status code: expected 400 but was 200")
    );
    assert!(report.has_failures());
}

#[tokio::test]
async fn test_class_skipped_when_not_implemented() {
    let iut = MockCatalogue::start().await;
    let capabilities = r#"<csw:Capabilities xmlns:csw="http://www.opengis.net/cat/csw/3.0"
        xmlns:ows="http://www.opengis.net/ows/2.0" version="3.0.0">
      <ows:OperationsMetadata>
        <ows:Constraint name="GetCapabilities-XML"><ows:NoValues/><ows:DefaultValue>FALSE</ows:DefaultValue></ows:Constraint>
      </ows:OperationsMetadata>
    </csw:Capabilities>"#;
    let ctx = SuiteContext::new(
        Arc::new(iut.config()),
        HttpClient::new(Duration::from_secs(5)).unwrap(),
        iut.capabilities_url(),
        capabilities.to_string(),
    );

    let report = run_class(&ctx, "capabilities").await;
    assert_eq!(report.summary.skipped, 3);
    assert!(
        report
            .results
            .iter()
            .all(|r| r.message.as_deref() == Some("Conformance class GetCapabilities-XML is not implemented"))
    );
}

#[tokio::test]
async fn test_unknown_class_rejected() {
    let iut = MockCatalogue::start().await;
    let ctx = iut.context(None);
    assert!(ets_cat30::Executor::new(&ctx, &["no-such-class".to_string()]).is_err());
}
