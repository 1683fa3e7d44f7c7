//! Tests of basic OpenSearch queries returning Atom feeds.

use async_trait::async_trait;
use reqwest::StatusCode;
use roxmltree::Document;

use super::load_templates;
use super::result_items;
use super::template::{TemplateValues, UrlTemplate};
use crate::assertions::{
    assert_media_type, assert_qualified_name, assert_schema_valid, assert_status, ensure,
    parse_entity,
};
use crate::conformance::classes;
use crate::http::Exchange;
use crate::namespaces;
use crate::protocol::media;
use crate::runner::{ClassDescriptor, TestClass, TestInfo, Verdict, fail, skip};
use crate::suite::{Fixture, SuiteContext};
use crate::xml::{self, QName};

pub const DESCRIPTOR: ClassDescriptor = ClassDescriptor {
    name: "opensearch-core",
    conformance_class: Some(classes::OPENSEARCH),
    tests: TESTS,
    init,
};

const TESTS: &[TestInfo] = &[
    TestInfo {
        name: "keyword_search",
        requirement: None,
        description: "A keyword search returns a valid Atom feed with matching entries",
    },
    TestInfo {
        name: "limit_items_per_page",
        requirement: None,
        description: "The count parameter limits the number of entries in a page",
    },
    TestInfo {
        name: "start_index_beyond_results",
        requirement: None,
        description: "A start index past the last result yields an empty page",
    },
];

struct SearchTests {
    template: UrlTemplate,
}

fn init(ctx: &SuiteContext) -> Result<Box<dyn TestClass>, String> {
    let template = load_templates(ctx)?
        .into_iter()
        .find(|t| t.is_type(media::APP_ATOM_XML) && t.rel == "results")
        .ok_or_else(|| "No URL template for Atom results".to_string())?;
    tracing::debug!("Using Atom template {}", template.template);
    Ok(Box::new(SearchTests { template }))
}

#[async_trait]
impl TestClass for SearchTests {
    async fn run(&self, test: &TestInfo, ctx: &SuiteContext, fixture: &mut Fixture) -> Verdict {
        match test.name {
            "keyword_search" => self.keyword_search(ctx, fixture).await,
            "limit_items_per_page" => self.limit_items_per_page(ctx, fixture).await,
            "start_index_beyond_results" => self.start_index_beyond_results(ctx, fixture).await,
            other => Err(skip(format!("Unknown test {}", other))),
        }
    }
}

impl SearchTests {
    async fn search(
        &self,
        ctx: &SuiteContext,
        fixture: &mut Fixture,
        values: &TemplateValues,
    ) -> Result<Exchange, crate::runner::Failure> {
        let url = self.template.expand(values)?;
        let exchange = fixture
            .get(&ctx.client, &url, &[], &[media::APP_ATOM_XML])
            .await?;
        assert_status(&exchange, StatusCode::OK)?;
        assert_media_type(&exchange, &[media::APP_ATOM_XML])?;
        Ok(exchange)
    }

    async fn keyword_search(&self, ctx: &SuiteContext, fixture: &mut Fixture) -> Verdict {
        if !self.template.has_param(namespaces::OSD11, "searchTerms") {
            return Err(skip("Atom template does not offer searchTerms"));
        }
        let keyword = ctx
            .dataset
            .as_ref()
            .and_then(|d| d.keyword())
            .ok_or_else(|| skip("No search term available from the sample records"))?;

        let mut values = TemplateValues::new();
        values.set(namespaces::OSD11, "searchTerms", keyword.as_str());
        let exchange = self.search(ctx, fixture, &values).await?;

        if let Some(validator) = &ctx.schemas.atom {
            assert_schema_valid(&validator.validate(&exchange.body))?;
        }

        let text = exchange.text();
        let doc = parse_entity(&text)?;
        assert_qualified_name(doc.root_element(), &QName::new(namespaces::ATOM, "feed"))?;
        ensure(
            !result_items(&doc).is_empty(),
            format!("No entries found for search term '{}'", keyword),
        )
    }

    async fn limit_items_per_page(&self, ctx: &SuiteContext, fixture: &mut Fixture) -> Verdict {
        if !self.template.has_param(namespaces::OSD11, "count") {
            return Err(skip("Atom template does not offer count"));
        }
        let mut values = TemplateValues::new();
        values.set(namespaces::OSD11, "count", "1");
        let exchange = self.search(ctx, fixture, &values).await?;

        let text = exchange.text();
        let doc = parse_entity(&text)?;
        assert_qualified_name(doc.root_element(), &QName::new(namespaces::ATOM, "feed"))?;
        let entries = result_items(&doc).len();
        ensure(
            entries <= 1,
            format!("Expected at most 1 entry but found {}", entries),
        )?;

        match feed_integer(&doc, "itemsPerPage")? {
            Some(per_page) => ensure(
                per_page == 1,
                format!("Expected os:itemsPerPage = 1 but was {}", per_page),
            ),
            None => Ok(()),
        }
    }

    async fn start_index_beyond_results(
        &self,
        ctx: &SuiteContext,
        fixture: &mut Fixture,
    ) -> Verdict {
        if !self.template.has_param(namespaces::OSD11, "startIndex") {
            return Err(skip("Atom template does not offer startIndex"));
        }

        // Both pages query the sample keyword when there is one
        let mut values = TemplateValues::new();
        if let Some(keyword) = ctx.dataset.as_ref().and_then(|d| d.keyword()) {
            values.set(namespaces::OSD11, "searchTerms", keyword);
        }
        let exchange = self.search(ctx, fixture, &values).await?;
        let text = exchange.text();
        let total = {
            let doc = parse_entity(&text)?;
            feed_integer(&doc, "totalResults")?
                .ok_or_else(|| skip("Feed does not report os:totalResults"))?
        };

        let start = total + self.template.index_offset;
        values.set(namespaces::OSD11, "startIndex", start.to_string());
        let exchange = self.search(ctx, fixture, &values).await?;

        let text = exchange.text();
        let doc = parse_entity(&text)?;
        let entries = result_items(&doc).len();
        ensure(
            entries == 0,
            format!(
                "Expected no entries with startIndex={} (totalResults={}) but found {}",
                start, total, entries
            ),
        )
    }
}

/// Integer value of an OpenSearch response element of the feed.
fn feed_integer(doc: &Document<'_>, local: &str) -> Result<Option<i64>, crate::runner::Failure> {
    match xml::child_text(doc.root_element(), namespaces::OSD11, local) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| fail(format!("Invalid os:{} value: {}", local, value))),
        None => Ok(None),
    }
}
