//! Tests of the OpenSearch Geo extension (`geo:box`, `geo:uid`).

use async_trait::async_trait;
use reqwest::StatusCode;

use super::template::{TemplateValues, UrlTemplate};
use super::{item_identifiers, load_templates, result_items};
use crate::assertions::{
    assert_envelopes_intersect, assert_exception_code, assert_status, ensure, parse_entity,
};
use crate::conformance::classes;
use crate::dataset::DatasetInfo;
use crate::envelope::Envelope;
use crate::namespaces;
use crate::protocol::{exceptions, media};
use crate::runner::{ClassDescriptor, TestClass, TestInfo, Verdict, fail, skip};
use crate::suite::{Fixture, SuiteContext};

pub const DESCRIPTOR: ClassDescriptor = ClassDescriptor {
    name: "opensearch-geo",
    conformance_class: Some(classes::OPENSEARCH),
    tests: TESTS,
    init,
};

const TESTS: &[TestInfo] = &[
    TestInfo {
        name: "bounding_box_query",
        requirement: None,
        description: "Items returned by a bounding box query intersect the query box",
    },
    TestInfo {
        name: "record_id_query",
        requirement: None,
        description: "A query by record identifier returns the identified record",
    },
    TestInfo {
        name: "invalid_box_parameter",
        requirement: None,
        description: "A malformed geo:box value yields InvalidParameterValue",
    },
];

struct GeoTests {
    /// Templates returning Atom or RSS results
    templates: Vec<UrlTemplate>,
    dataset: DatasetInfo,
}

fn init(ctx: &SuiteContext) -> Result<Box<dyn TestClass>, String> {
    let dataset = ctx
        .dataset
        .clone()
        .ok_or_else(|| "Sample records not found".to_string())?;
    let templates: Vec<UrlTemplate> = load_templates(ctx)?
        .into_iter()
        .filter(|t| t.is_type(media::APP_ATOM_XML) || t.is_type(media::APP_RSS_XML))
        .collect();
    Ok(Box::new(GeoTests { templates, dataset }))
}

#[async_trait]
impl TestClass for GeoTests {
    async fn run(&self, test: &TestInfo, ctx: &SuiteContext, fixture: &mut Fixture) -> Verdict {
        match test.name {
            "bounding_box_query" => self.bounding_box_query(ctx, fixture).await,
            "record_id_query" => self.record_id_query(ctx, fixture).await,
            "invalid_box_parameter" => self.invalid_box_parameter(ctx, fixture).await,
            other => Err(skip(format!("Unknown test {}", other))),
        }
    }
}

impl GeoTests {
    fn offering<'a>(&'a self, local: &'a str) -> impl Iterator<Item = &'a UrlTemplate> + 'a {
        self.templates
            .iter()
            .filter(move |t| t.has_param(namespaces::OS_GEO, local))
    }

    /// Every georeferenced item returned for a `geo:box` query must intersect the box.
    async fn bounding_box_query(&self, ctx: &SuiteContext, fixture: &mut Fixture) -> Verdict {
        let templates: Vec<&UrlTemplate> = self.offering("box").collect();
        if templates.is_empty() {
            return Err(skip("No URL template offers the geo:box parameter"));
        }
        let query_box = self
            .dataset
            .extent
            .ok_or_else(|| skip("Sample records have no spatial extent"))?;

        let count = ctx.config.max_records.to_string();
        for template in templates {
            let mut values = TemplateValues::new();
            values
                .set(namespaces::OS_GEO, "box", query_box.to_box_param())
                .set(namespaces::OSD11, "count", count.as_str());
            let url = template.expand(&values)?;
            let exchange = fixture
                .get(&ctx.client, &url, &[], &[template.media_type.as_str()])
                .await?;
            assert_status(&exchange, StatusCode::OK)?;

            let text = exchange.text();
            let doc = parse_entity(&text)?;
            let mut checked = 0;
            for item in result_items(&doc) {
                match Envelope::find_in(item) {
                    Some(Ok(envelope)) => {
                        assert_envelopes_intersect(&envelope, &query_box)?;
                        checked += 1;
                    }
                    Some(Err(e)) => return Err(fail(format!("Invalid item envelope: {}", e))),
                    None => {}
                }
            }
            tracing::debug!(
                "{} georeferenced items checked for {}",
                checked,
                template.media_type
            );
        }
        Ok(())
    }

    async fn record_id_query(&self, ctx: &SuiteContext, fixture: &mut Fixture) -> Verdict {
        let template = self
            .offering("uid")
            .next()
            .ok_or_else(|| skip("No URL template offers the geo:uid parameter"))?;
        let uid = self
            .dataset
            .identifiers
            .first()
            .ok_or_else(|| skip("No record identifier available"))?;

        let mut values = TemplateValues::new();
        values.set(namespaces::OS_GEO, "uid", uid.as_str());
        let url = template.expand(&values)?;
        let exchange = fixture
            .get(&ctx.client, &url, &[], &[template.media_type.as_str()])
            .await?;
        assert_status(&exchange, StatusCode::OK)?;

        let text = exchange.text();
        let doc = parse_entity(&text)?;
        let found = result_items(&doc)
            .into_iter()
            .any(|item| item_identifiers(item).iter().any(|id| id == uid));
        ensure(found, format!("No item with identifier {} found", uid))
    }

    async fn invalid_box_parameter(&self, ctx: &SuiteContext, fixture: &mut Fixture) -> Verdict {
        let template = self
            .offering("box")
            .find(|t| t.is_type(media::APP_ATOM_XML))
            .or_else(|| self.offering("box").next())
            .ok_or_else(|| skip("No URL template offers the geo:box parameter"))?;

        let mut values = TemplateValues::new();
        values.set(namespaces::OS_GEO, "box", "-10,40,10");
        let url = template.expand(&values)?;
        let exchange = fixture
            .get(&ctx.client, &url, &[], &[template.media_type.as_str()])
            .await?;
        assert_status(&exchange, StatusCode::BAD_REQUEST)?;

        let text = exchange.text();
        let doc = parse_entity(&text)?;
        assert_exception_code(&doc, exceptions::INVALID_PARAMETER_VALUE)
    }
}
