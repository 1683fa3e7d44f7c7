//! Tests of the GetCapabilities request (KVP binding, XML response).

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::assertions::{
    assert_exception_code, assert_media_type, assert_qualified_name, assert_schema_valid,
    assert_status, ensure, parse_entity,
};
use crate::conformance::classes;
use crate::metadata;
use crate::namespaces;
use crate::protocol::{self, HttpMethod, exceptions, media, ops, params};
use crate::runner::{ClassDescriptor, TestClass, TestInfo, Verdict, skip};
use crate::suite::{Fixture, SuiteContext};
use crate::xml::QName;

pub const DESCRIPTOR: ClassDescriptor = ClassDescriptor {
    name: "capabilities",
    conformance_class: Some(classes::GET_CAPABILITIES_XML),
    tests: TESTS,
    init,
};

const TESTS: &[TestInfo] = &[
    TestInfo {
        name: "get_capabilities",
        requirement: None,
        description: "A GetCapabilities request returns a CSW 3.0 capabilities document",
    },
    TestInfo {
        name: "capabilities_is_schema_valid",
        requirement: None,
        description: "The capabilities document is valid against the CSW 3.0 schema",
    },
    TestInfo {
        name: "unsupported_version",
        requirement: None,
        description: "Requesting only an unsupported version yields VersionNegotiationFailed",
    },
];

struct CapabilitiesTests {
    endpoint: Url,
}

fn init(ctx: &SuiteContext) -> Result<Box<dyn TestClass>, String> {
    let endpoint = ctx
        .endpoint(ops::GET_CAPABILITIES, HttpMethod::Get)
        .map_err(|e| format!("GetCapabilities endpoint not found: {}", e))?;
    Ok(Box::new(CapabilitiesTests { endpoint }))
}

const GET_CAPABILITIES_KVP: [(&str, &str); 2] = [
    (params::SERVICE, protocol::SERVICE_TYPE),
    (params::REQUEST, ops::GET_CAPABILITIES),
];

#[async_trait]
impl TestClass for CapabilitiesTests {
    async fn run(&self, test: &TestInfo, ctx: &SuiteContext, fixture: &mut Fixture) -> Verdict {
        match test.name {
            "get_capabilities" => self.get_capabilities(ctx, fixture).await,
            "capabilities_is_schema_valid" => self.capabilities_is_schema_valid(ctx, fixture).await,
            "unsupported_version" => self.unsupported_version(ctx, fixture).await,
            other => Err(skip(format!("Unknown test {}", other))),
        }
    }
}

impl CapabilitiesTests {
    async fn get_capabilities(&self, ctx: &SuiteContext, fixture: &mut Fixture) -> Verdict {
        let exchange = fixture
            .get(&ctx.client, &self.endpoint, &GET_CAPABILITIES_KVP, &[media::APP_XML])
            .await?;
        assert_status(&exchange, StatusCode::OK)?;
        assert_media_type(&exchange, &[media::APP_XML, media::TEXT_XML])?;

        let text = exchange.text();
        let doc = parse_entity(&text)?;
        let root = doc.root_element();
        assert_qualified_name(root, &QName::new(namespaces::CSW, "Capabilities"))?;
        let version = metadata::service_version(&doc).unwrap_or_default();
        ensure(
            version == protocol::VERSION,
            format!(
                "Unexpected service version: expected {} but was {}",
                protocol::VERSION,
                version
            ),
        )
    }

    async fn capabilities_is_schema_valid(
        &self,
        ctx: &SuiteContext,
        fixture: &mut Fixture,
    ) -> Verdict {
        let Some(validator) = ctx.schemas.csw.clone() else {
            return Err(skip("CSW schema not available"));
        };
        let exchange = fixture
            .get(&ctx.client, &self.endpoint, &GET_CAPABILITIES_KVP, &[media::APP_XML])
            .await?;
        assert_status(&exchange, StatusCode::OK)?;
        assert_schema_valid(&validator.validate(&exchange.body))
    }

    async fn unsupported_version(&self, ctx: &SuiteContext, fixture: &mut Fixture) -> Verdict {
        let query = [
            GET_CAPABILITIES_KVP[0],
            GET_CAPABILITIES_KVP[1],
            (params::ACCEPT_VERSIONS, "9.9.9"),
        ];
        let exchange = fixture
            .get(&ctx.client, &self.endpoint, &query, &[media::APP_XML])
            .await?;
        assert_status(&exchange, StatusCode::BAD_REQUEST)?;

        let text = exchange.text();
        let doc = parse_entity(&text)?;
        assert_exception_code(&doc, exceptions::VERSION_NEGOTIATION_FAILED)
    }
}
