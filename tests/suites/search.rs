//! OpenSearch query tests (Atom results)

use ets_cat30::runner::Outcome;

use crate::common::*;

async fn catalogue() -> MockCatalogue {
    let iut = MockCatalogue::start().await;
    iut.mount_service("OpenSearchDescription-valid.xml").await;
    iut
}

#[tokio::test]
async fn test_search_pass() {
    let iut = catalogue().await;
    iut.mount_matching(
        "/opensearch",
        &[("q", "elevation"), ("startIndex", "4")],
        1,
        200,
        APP_ATOM_XML,
        "feed-empty.xml",
    )
    .await;
    iut.mount_matching("/opensearch", &[("q", "elevation")], 2, 200, APP_ATOM_XML, "feed-2.xml")
        .await;
    iut.mount_query("/opensearch", "count", "1", 200, APP_ATOM_XML, "feed-single.xml")
        .await;
    iut.mount_default("/opensearch", APP_ATOM_XML, "feed-2.xml").await;

    let ctx = iut
        .context(Some("OpenSearchDescription-valid.xml"))
        .with_dataset(iut.dataset());
    let report = run_class(&ctx, "opensearch-core").await;

    for test in ["keyword_search", "limit_items_per_page", "start_index_beyond_results"] {
        let r = result(&report, test);
        assert_eq!(r.outcome, Outcome::Pass, "{}: {:?}", test, r.message);
    }
}

#[tokio::test]
async fn test_start_index_uses_keyword_query() {
    let iut = catalogue().await;
    iut.mount_matching(
        "/opensearch",
        &[("q", "elevation"), ("startIndex", "4")],
        1,
        200,
        APP_ATOM_XML,
        "feed-empty.xml",
    )
    .await;
    iut.mount_matching("/opensearch", &[("q", "elevation")], 2, 200, APP_ATOM_XML, "feed-2.xml")
        .await;
    // Unfiltered queries report 2 results
    iut.mount_default("/opensearch", APP_ATOM_XML, "feed-1.xml").await;

    let ctx = iut
        .context(Some("OpenSearchDescription-valid.xml"))
        .with_dataset(iut.dataset());
    let report = run_class(&ctx, "opensearch-core").await;

    let r = result(&report, "start_index_beyond_results");
    assert_eq!(r.outcome, Outcome::Pass, "{:?}", r.message);
}

#[tokio::test]
async fn test_keyword_search_atom_schema() {
    let iut = catalogue().await;
    iut.mount_default("/opensearch", APP_ATOM_XML, "feed-2.xml").await;

    let ctx = iut
        .context(Some("OpenSearchDescription-valid.xml"))
        .with_dataset(iut.dataset())
        .with_schemas(schemas_with_atom(StubValidator::valid()));
    let report = run_class(&ctx, "opensearch-core").await;
    assert_eq!(result(&report, "keyword_search").outcome, Outcome::Pass);

    let ctx = iut
        .context(Some("OpenSearchDescription-valid.xml"))
        .with_dataset(iut.dataset())
        .with_schemas(schemas_with_atom(StubValidator::failing(1)));
    let report = run_class(&ctx, "opensearch-core").await;
    let r = result(&report, "keyword_search");
    assert_eq!(r.outcome, Outcome::Fail);
    assert_eq!(
        r.message.as_deref(),
        Some("Schema validation failed: 1 error(s) detected:\n[1] Stub error 1\n")
    );
    assert!(r.request.as_deref().unwrap().contains("q=elevation"));
}

#[tokio::test]
async fn test_search_ignores_paging() {
    let iut = catalogue().await;
    iut.mount_default("/opensearch", APP_ATOM_XML, "feed-2.xml").await;

    let ctx = iut
        .context(Some("OpenSearchDescription-valid.xml"))
        .with_dataset(iut.dataset());
    let report = run_class(&ctx, "opensearch-core").await;

    assert_eq!(result(&report, "keyword_search").outcome, Outcome::Pass);

    let limit = result(&report, "limit_items_per_page");
    assert_eq!(limit.outcome, Outcome::Fail);
    assert_eq!(limit.message.as_deref(), Some("Expected at most 1 entry but found 3"));

    let start = result(&report, "start_index_beyond_results");
    assert_eq!(start.outcome, Outcome::Fail);
    assert_eq!(
        start.message.as_deref(),
        Some("Expected no entries with startIndex=4 (totalResults=3) but found 3")
    );
    assert!(start.request.as_deref().unwrap().contains("startIndex=4"));
}

#[tokio::test]
async fn test_search_wrong_media_type() {
    let iut = catalogue().await;
    iut.mount_default("/opensearch", APP_XML, "feed-2.xml").await;

    let ctx = iut
        .context(Some("OpenSearchDescription-valid.xml"))
        .with_dataset(iut.dataset());
    let report = run_class(&ctx, "opensearch-core").await;

    let r = result(&report, "keyword_search");
    assert_eq!(r.outcome, Outcome::Fail);
    assert_eq!(
        r.message.as_deref(),
        Some("Expected media type compatible with application/atom+xml but was application/xml")
    );
}

#[tokio::test]
async fn test_keyword_search_without_records() {
    let iut = catalogue().await;
    let ctx = iut.context(Some("OpenSearchDescription-valid.xml"));
    let report = run_class(&ctx, "opensearch-core").await;

    let r = result(&report, "keyword_search");
    assert_eq!(r.outcome, Outcome::Skip);
    assert_eq!(
        r.message.as_deref(),
        Some("No search term available from the sample records")
    );
}

#[tokio::test]
async fn test_search_without_description() {
    let iut = catalogue().await;
    let ctx = iut.context(None).with_dataset(iut.dataset());
    let report = run_class(&ctx, "opensearch-core").await;

    assert_eq!(report.summary.skipped, 3);
    assert!(
        report
            .results
            .iter()
            .all(|r| r.message.as_deref() == Some("OpenSearch description not found"))
    );
}

#[tokio::test]
async fn test_search_without_atom_template() {
    let iut = catalogue().await;
    let ctx = iut
        .context(Some("OpenSearchDescription-rss.xml"))
        .with_dataset(iut.dataset());
    let report = run_class(&ctx, "opensearch-core").await;

    assert_eq!(report.summary.skipped, 3);
    assert_eq!(
        result(&report, "keyword_search").message.as_deref(),
        Some("No URL template for Atom results")
    );
}
