//! Common test utilities and fixtures
//!
//! Provides an in-process mock catalogue (wiremock) serving the XML documents in
//! `tests/fixtures/`, plus stub schema validators so that validation outcomes can be
//! exercised without libxml2.

#![allow(dead_code)]

use std::sync::{Arc, Once};
use std::time::Duration;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use ets_cat30::config::Config;
use ets_cat30::dataset::DatasetInfo;
use ets_cat30::http::HttpClient;
use ets_cat30::report::{RunReport, TestRecord};
use ets_cat30::runner::Executor;
use ets_cat30::suite::SuiteContext;
use ets_cat30::validation::{
    SchemaLanguage, SchemaSet, SchemaValidator, ValidationError, ValidationReport,
};
use ets_cat30::xml;

static INIT: Once = Once::new();

/// Initialize test logging
pub fn init_logging() {
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("ets_cat30=debug")
            .with_test_writer()
            .try_init()
            .ok();
    });
}

pub const APP_XML: &str = "application/xml";
pub const APP_ATOM_XML: &str = "application/atom+xml";
pub const APP_RSS_XML: &str = "application/rss+xml";
pub const APP_OSD_XML: &str = "application/opensearchdescription+xml";

/// Matches requests whose `Accept` header mentions the given media type.
pub struct AcceptContains(pub &'static str);

impl Match for AcceptContains {
    fn matches(&self, request: &Request) -> bool {
        request
            .headers
            .get("accept")
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains(self.0))
    }
}

/// Validator returning a fixed number of errors for any document.
pub struct StubValidator {
    errors: usize,
}

impl StubValidator {
    pub fn valid() -> Arc<dyn SchemaValidator> {
        Arc::new(Self { errors: 0 })
    }

    pub fn failing(errors: usize) -> Arc<dyn SchemaValidator> {
        Arc::new(Self { errors })
    }
}

impl SchemaValidator for StubValidator {
    fn language(&self) -> SchemaLanguage {
        SchemaLanguage::RelaxNg
    }

    fn validate(&self, _xml: &[u8]) -> ValidationReport {
        let errors = (0..self.errors)
            .map(|i| ValidationError {
                message: format!("Stub error {}", i + 1),
                line: Some(i as u32 + 1),
                column: None,
            })
            .collect();
        ValidationReport::with_errors(errors)
    }
}

pub struct MockCatalogue {
    pub server: MockServer,
}

impl MockCatalogue {
    pub async fn start() -> Self {
        init_logging();
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    /// Fixture content with `{{base}}` replaced by the mock server URI.
    pub fn fixture(&self, name: &str) -> String {
        let file = format!("{}/tests/fixtures/{}", env!("CARGO_MANIFEST_DIR"), name);
        std::fs::read_to_string(&file)
            .unwrap_or_else(|e| panic!("cannot read fixture {}: {}", file, e))
            .replace("{{base}}", &self.uri())
    }

    pub fn capabilities_url(&self) -> Url {
        Url::parse(&format!(
            "{}/csw?service=CSW&request=GetCapabilities",
            self.uri()
        ))
        .unwrap()
    }

    pub fn respond(&self, status: u16, media_type: &str, body: &str) -> ResponseTemplate {
        ResponseTemplate::new(status).set_body_raw(body.as_bytes().to_vec(), media_type)
    }

    /// Capabilities, OpenSearch description (by `Accept`) and the record sample.
    pub async fn mount_service(&self, osd_fixture: &str) {
        Mock::given(method("GET"))
            .and(path("/csw"))
            .and(query_param("request", "GetCapabilities"))
            .respond_with(self.respond(200, APP_XML, &self.fixture("capabilities-basic.xml")))
            .with_priority(5)
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/csw"))
            .and(query_param("request", "GetRecords"))
            .respond_with(self.respond(200, APP_XML, &self.fixture("GetRecordsResponse-full.xml")))
            .with_priority(5)
            .mount(&self.server)
            .await;

        Mock::given(method("GET"))
            .and(path("/csw"))
            .and(AcceptContains("opensearchdescription+xml"))
            .respond_with(self.respond(200, APP_OSD_XML, &self.fixture(osd_fixture)))
            .with_priority(6)
            .mount(&self.server)
            .await;
    }

    /// Serve `fixture` on `route` when the query parameter `key` equals `value`.
    pub async fn mount_query(
        &self,
        route: &str,
        key: &str,
        value: &str,
        status: u16,
        media_type: &str,
        fixture: &str,
    ) {
        self.mount_matching(route, &[(key, value)], 1, status, media_type, fixture)
            .await;
    }

    /// Serve `fixture` on `route` when all query parameters match; lower priorities win.
    pub async fn mount_matching(
        &self,
        route: &str,
        pairs: &[(&str, &str)],
        priority: u8,
        status: u16,
        media_type: &str,
        fixture: &str,
    ) {
        let mut mock = Mock::given(method("GET")).and(path(route));
        for (key, value) in pairs {
            mock = mock.and(query_param(*key, *value));
        }
        mock.respond_with(self.respond(status, media_type, &self.fixture(fixture)))
            .with_priority(priority)
            .mount(&self.server)
            .await;
    }

    /// Fallback response for any request on `route`.
    pub async fn mount_default(&self, route: &str, media_type: &str, fixture: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(self.respond(200, media_type, &self.fixture(fixture)))
            .with_priority(10)
            .mount(&self.server)
            .await;
    }

    pub fn config(&self) -> Config {
        Config {
            iut: Some(self.capabilities_url().to_string()),
            timeout_secs: 5,
            ..Config::default()
        }
    }

    /// Suite context built from fixtures rather than from suite preconditions.
    pub fn context(&self, osd_fixture: Option<&str>) -> SuiteContext {
        let config = Arc::new(self.config());
        let client = HttpClient::new(Duration::from_secs(5)).unwrap();
        let mut ctx = SuiteContext::new(
            config,
            client,
            self.capabilities_url(),
            self.fixture("capabilities-basic.xml"),
        );
        if let Some(name) = osd_fixture {
            ctx = ctx.with_opensearch_description(self.fixture(name));
        }
        ctx
    }

    pub fn dataset(&self) -> DatasetInfo {
        let text = self.fixture("GetRecordsResponse-full.xml");
        let doc = xml::parse(&text).unwrap();
        DatasetInfo::from_get_records_response(&doc).unwrap()
    }
}

pub fn schemas_with_osd(validator: Arc<dyn SchemaValidator>) -> SchemaSet {
    SchemaSet {
        osd: Some(validator),
        ..SchemaSet::default()
    }
}

pub fn schemas_with_csw(validator: Arc<dyn SchemaValidator>) -> SchemaSet {
    SchemaSet {
        csw: Some(validator),
        ..SchemaSet::default()
    }
}

pub fn schemas_with_atom(validator: Arc<dyn SchemaValidator>) -> SchemaSet {
    SchemaSet {
        atom: Some(validator),
        ..SchemaSet::default()
    }
}

/// Run one test class and return its report.
pub async fn run_class(ctx: &SuiteContext, class: &str) -> RunReport {
    Executor::new(ctx, &[class.to_string()]).unwrap().run().await
}

/// Result of a named test in a report.
pub fn result<'a>(report: &'a RunReport, test: &str) -> &'a TestRecord {
    report
        .results
        .iter()
        .find(|r| r.test == test)
        .unwrap_or_else(|| panic!("no result for {}", test))
}
