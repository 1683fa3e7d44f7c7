//! Tests of the OpenSearch description document.

use async_trait::async_trait;
use std::sync::Arc;
use url::Url;

use super::OSD_NOT_FOUND;
use super::template::find_templates;
use crate::assertions::{assert_qualified_name, assert_schema_valid, ensure, parse_entity};
use crate::conformance::classes;
use crate::namespaces;
use crate::protocol::{HttpMethod, media, ops};
use crate::runner::{ClassDescriptor, TestClass, TestInfo, Verdict, skip};
use crate::suite::{Fixture, SuiteContext};
use crate::validation::SchemaValidator;
use crate::xml::{self, QName};

pub const DESCRIPTOR: ClassDescriptor = ClassDescriptor {
    name: "opensearch-description",
    conformance_class: Some(classes::OPENSEARCH),
    tests: TESTS,
    init,
};

const TESTS: &[TestInfo] = &[
    TestInfo {
        name: "prefer_opensearch_description",
        requirement: Some("Test-008"),
        description: "The service base URI returns an OpenSearch description when it is \
                      preferred over generic XML",
    },
    TestInfo {
        name: "get_opensearch_description",
        requirement: Some("Test-021"),
        description: "The OpenSearch description is valid against the OpenSearch 1.1 schema",
    },
    TestInfo {
        name: "atom_template_available",
        requirement: None,
        description: "The OpenSearch description declares a URL template for Atom results",
    },
];

struct DescriptionTests {
    base_uri: Url,
    osd_validator: Option<Arc<dyn SchemaValidator>>,
}

fn init(ctx: &SuiteContext) -> Result<Box<dyn TestClass>, String> {
    let osd_validator = ctx.schemas.osd.clone();
    if osd_validator.is_none() {
        tracing::warn!("No OpenSearch description schema; schema validation will be skipped");
    }
    let base_uri = ctx
        .endpoint(ops::GET_CAPABILITIES, HttpMethod::Get)
        .map_err(|e| format!("Service base URI not found: {}", e))?;
    Ok(Box::new(DescriptionTests {
        base_uri,
        osd_validator,
    }))
}

#[async_trait]
impl TestClass for DescriptionTests {
    async fn run(&self, test: &TestInfo, ctx: &SuiteContext, fixture: &mut Fixture) -> Verdict {
        match test.name {
            "prefer_opensearch_description" => self.prefer_opensearch_description(ctx, fixture).await,
            "get_opensearch_description" => self.get_opensearch_description(ctx, fixture).await,
            "atom_template_available" => atom_template_available(ctx),
            other => Err(skip(format!("Unknown test {}", other))),
        }
    }
}

impl DescriptionTests {
    /// The OpenSearch description is returned when generic XML is less preferred.
    async fn prefer_opensearch_description(
        &self,
        ctx: &SuiteContext,
        fixture: &mut Fixture,
    ) -> Verdict {
        let accept = ["application/xml; q=0.5", media::APP_OPENSEARCH_XML];
        let exchange = fixture.get(&ctx.client, &self.base_uri, &[], &accept).await?;

        let text = exchange.text();
        let doc = parse_entity(&text)?;
        assert_qualified_name(
            doc.root_element(),
            &QName::new(namespaces::OSD11, "OpenSearchDescription"),
        )
    }

    async fn get_opensearch_description(
        &self,
        ctx: &SuiteContext,
        fixture: &mut Fixture,
    ) -> Verdict {
        let Some(validator) = self.osd_validator.clone() else {
            return Err(skip("OpenSearch description schema not available"));
        };
        let accept = [media::APP_VND_OPENSEARCH_XML, media::APP_OPENSEARCH_XML];
        let exchange = fixture.get(&ctx.client, &self.base_uri, &[], &accept).await?;
        assert_schema_valid(&validator.validate(&exchange.body))
    }
}

fn atom_template_available(ctx: &SuiteContext) -> Verdict {
    let osd = ctx
        .opensearch_description
        .as_deref()
        .ok_or_else(|| skip(OSD_NOT_FOUND))?;
    let doc = xml::parse(osd)?;
    let templates = find_templates(&doc, Some(media::APP_ATOM_XML))?;
    ensure(
        !templates.is_empty(),
        "No URL template for results of type application/atom+xml",
    )
}
