//! Suite-level context and the per-test fixture.

use reqwest::StatusCode;
use roxmltree::Document;
use std::sync::Arc;
use url::Url;

use crate::config::Config;
use crate::dataset::DatasetInfo;
use crate::error::{EtsError, EtsResult};
use crate::http::{Exchange, HttpClient, MessageInfo};
use crate::metadata;
use crate::namespaces;
use crate::protocol::{self, HttpMethod, media, ops, params};
use crate::validation::SchemaSet;
use crate::xml;

/// Values computed once before any test class runs and shared by all of them.
#[derive(Debug, Clone)]
pub struct SuiteContext {
    pub config: Arc<Config>,
    pub client: HttpClient,
    /// Location of the capabilities document
    pub iut: Url,
    /// Capabilities document text
    pub capabilities: String,
    pub schemas: SchemaSet,
    /// OpenSearch description text
    pub opensearch_description: Option<String>,
    pub dataset: Option<DatasetInfo>,
}

impl SuiteContext {
    /// Context with only the capabilities document; other attributes can be set with
    /// the `with_*` methods.
    pub fn new(config: Arc<Config>, client: HttpClient, iut: Url, capabilities: String) -> Self {
        Self {
            config,
            client,
            iut,
            capabilities,
            schemas: SchemaSet::default(),
            opensearch_description: None,
            dataset: None,
        }
    }

    pub fn with_schemas(mut self, schemas: SchemaSet) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn with_opensearch_description(mut self, osd: impl Into<String>) -> Self {
        self.opensearch_description = Some(osd.into());
        self
    }

    pub fn with_dataset(mut self, dataset: DatasetInfo) -> Self {
        self.dataset = Some(dataset);
        self
    }

    /// Run the suite preconditions against the configured IUT.
    ///
    /// The capabilities document is required; failing to obtain the OpenSearch
    /// description or the record sample only leaves those attributes empty.
    pub async fn initialize(config: Arc<Config>) -> EtsResult<Self> {
        let iut = config.iut_url()?;
        let client = HttpClient::new(config.timeout())?;

        tracing::info!("Fetching capabilities from {}", iut);
        let exchange = client.get(&iut, &[], &[media::APP_XML]).await?;
        if exchange.status != StatusCode::OK {
            return Err(EtsError::Precondition(format!(
                "Capabilities request returned status {}",
                exchange.status.as_u16()
            )));
        }
        let capabilities = exchange.text();
        check_capabilities(&capabilities)?;

        let schemas = SchemaSet::load(&config.schemas)?;
        tracing::debug!("Loaded schemas: {:?}", schemas);

        let mut ctx = SuiteContext::new(config, client, iut, capabilities).with_schemas(schemas);

        match ctx.fetch_opensearch_description().await {
            Ok(osd) => ctx.opensearch_description = Some(osd),
            Err(e) => tracing::warn!("OpenSearch description not available: {}", e),
        }
        match ctx.fetch_dataset().await {
            Ok(dataset) => ctx.dataset = Some(dataset),
            Err(e) => tracing::warn!("Sample records not available: {}", e),
        }

        Ok(ctx)
    }

    pub fn capabilities_doc(&self) -> EtsResult<Document<'_>> {
        xml::parse(&self.capabilities)
    }

    /// Endpoint of an operation as advertised in the capabilities.
    pub fn endpoint(&self, operation: &str, method: HttpMethod) -> EtsResult<Url> {
        let doc = self.capabilities_doc()?;
        metadata::operation_endpoint(&doc, operation, method)
            .ok_or_else(|| EtsError::MissingEndpoint(format!("{} ({})", operation, method)))
    }

    async fn fetch_opensearch_description(&self) -> EtsResult<String> {
        let endpoint = self.endpoint(ops::GET_CAPABILITIES, HttpMethod::Get)?;
        let exchange = self
            .client
            .get(
                &endpoint,
                &[],
                &[media::APP_VND_OPENSEARCH_XML, media::APP_OPENSEARCH_XML],
            )
            .await?;
        if !exchange.status.is_success() {
            return Err(EtsError::UnexpectedContent(format!(
                "OpenSearch description request returned status {}",
                exchange.status.as_u16()
            )));
        }

        let text = exchange.text();
        let doc = xml::parse(&text)?;
        let root = doc.root_element();
        if !xml::is_element(root, namespaces::OSD11, "OpenSearchDescription") {
            return Err(EtsError::UnexpectedContent(format!(
                "Expected OpenSearchDescription but found {}",
                xml::qualified_name(root)
            )));
        }
        drop(doc);
        Ok(text)
    }

    async fn fetch_dataset(&self) -> EtsResult<DatasetInfo> {
        let endpoint = self.endpoint(ops::GET_RECORDS, HttpMethod::Get)?;
        let max_records = self.config.max_records.to_string();
        let query = [
            (params::SERVICE, protocol::SERVICE_TYPE),
            (params::VERSION, protocol::VERSION),
            (params::REQUEST, ops::GET_RECORDS),
            (params::TYPE_NAMES, "csw:Record"),
            (params::ELEMENT_SET_NAME, "full"),
            (params::RESULT_TYPE, "results"),
            (params::MAX_RECORDS, max_records.as_str()),
        ];
        let exchange = self.client.get(&endpoint, &query, &[media::APP_XML]).await?;
        if exchange.status != StatusCode::OK {
            return Err(EtsError::UnexpectedContent(format!(
                "GetRecords request returned status {}",
                exchange.status.as_u16()
            )));
        }
        let text = exchange.text();
        let doc = xml::parse(&text)?;
        let dataset = DatasetInfo::from_get_records_response(&doc)?;
        tracing::info!("Sampled {} records", dataset.identifiers.len());
        Ok(dataset)
    }
}

fn check_capabilities(text: &str) -> EtsResult<()> {
    let doc = xml::parse(text)
        .map_err(|e| EtsError::Precondition(format!("Capabilities document is not XML: {}", e)))?;
    let root = doc.root_element();
    if !xml::is_element(root, namespaces::CSW, "Capabilities") {
        return Err(EtsError::Precondition(format!(
            "Not a CSW 3.0 capabilities document: {}",
            xml::qualified_name(root)
        )));
    }
    Ok(())
}

/// Per-test state: the last request sent and response received.
#[derive(Debug, Clone, Default)]
pub struct Fixture {
    pub request: MessageInfo,
    pub response: MessageInfo,
}

impl Fixture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, exchange: &Exchange) {
        self.request = exchange.request.clone();
        self.response = exchange.response.clone();
    }

    /// Send a GET request and record the exchange.
    pub async fn get(
        &mut self,
        client: &HttpClient,
        url: &Url,
        query: &[(&str, &str)],
        accept: &[&str],
    ) -> EtsResult<Exchange> {
        let request = client.build_get(url, query, accept)?;
        self.request = crate::http::request_info(&request);
        self.response = MessageInfo::new();
        let exchange = client.execute(request).await?;
        self.record(&exchange);
        Ok(exchange)
    }
}
