//! OpenSearch Geo extension tests

use ets_cat30::runner::Outcome;

use crate::common::*;

/// Extent of the sample records: west, south, east, north
const DATASET_BOX: &str = "-122.5,46.7,-121.6,47.8";

async fn catalogue(osd: &str) -> MockCatalogue {
    let iut = MockCatalogue::start().await;
    iut.mount_service(osd).await;
    iut
}

#[tokio::test]
async fn test_bounding_box_disjoint() {
    let iut = catalogue("OpenSearchDescription-valid.xml").await;
    iut.mount_query("/opensearch", "bbox", DATASET_BOX, 200, APP_ATOM_XML, "feed-1.xml")
        .await;

    let ctx = iut
        .context(Some("OpenSearchDescription-valid.xml"))
        .with_dataset(iut.dataset());
    let report = run_class(&ctx, "opensearch-geo").await;

    let r = result(&report, "bounding_box_query");
    assert_eq!(r.outcome, Outcome::Fail);
    assert!(
        r.message
            .as_deref()
            .unwrap()
            .starts_with("The envelopes do not intersect"),
        "{:?}",
        r.message
    );
    let response = r.response.as_deref().unwrap();
    assert!(response.contains("urn:uuid:feed-1"));
}

#[tokio::test]
async fn test_bounding_box_intersecting() {
    let iut = catalogue("OpenSearchDescription-valid.xml").await;
    iut.mount_query("/opensearch", "bbox", DATASET_BOX, 200, APP_ATOM_XML, "feed-2.xml")
        .await;
    iut.mount_query("/opensearch", "uid", "urn:uuid:1", 200, APP_ATOM_XML, "feed-single.xml")
        .await;
    iut.mount_query(
        "/opensearch",
        "bbox",
        "-10,40,10",
        400,
        APP_XML,
        "ExceptionReport-bbox.xml",
    )
    .await;

    let ctx = iut
        .context(Some("OpenSearchDescription-valid.xml"))
        .with_dataset(iut.dataset());
    let report = run_class(&ctx, "opensearch-geo").await;

    for test in ["bounding_box_query", "record_id_query", "invalid_box_parameter"] {
        let r = result(&report, test);
        assert_eq!(r.outcome, Outcome::Pass, "{}: {:?}", test, r.message);
    }
}

#[tokio::test]
async fn test_rss_without_georeferenced_items() {
    let iut = catalogue("OpenSearchDescription-rss.xml").await;
    iut.mount_query("/rss", "bbox", DATASET_BOX, 200, APP_RSS_XML, "rss-1.xml")
        .await;

    let ctx = iut
        .context(Some("OpenSearchDescription-rss.xml"))
        .with_dataset(iut.dataset());
    let report = run_class(&ctx, "opensearch-geo").await;

    assert_eq!(result(&report, "bounding_box_query").outcome, Outcome::Pass);
    let uid = result(&report, "record_id_query");
    assert_eq!(uid.outcome, Outcome::Skip);
    assert_eq!(
        uid.message.as_deref(),
        Some("No URL template offers the geo:uid parameter")
    );
}

#[tokio::test]
async fn test_record_not_found() {
    let iut = catalogue("OpenSearchDescription-valid.xml").await;
    iut.mount_query("/opensearch", "uid", "urn:uuid:1", 200, APP_ATOM_XML, "feed-1.xml")
        .await;

    let ctx = iut
        .context(Some("OpenSearchDescription-valid.xml"))
        .with_dataset(iut.dataset());
    let report = run_class(&ctx, "opensearch-geo").await;

    let r = result(&report, "record_id_query");
    assert_eq!(r.outcome, Outcome::Fail);
    assert_eq!(r.message.as_deref(), Some("No item with identifier urn:uuid:1 found"));
}

#[tokio::test]
async fn test_invalid_box_accepted() {
    let iut = catalogue("OpenSearchDescription-valid.xml").await;
    iut.mount_default("/opensearch", APP_ATOM_XML, "feed-2.xml").await;

    let ctx = iut
        .context(Some("OpenSearchDescription-valid.xml"))
        .with_dataset(iut.dataset());
    let report = run_class(&ctx, "opensearch-geo").await;

    let r = result(&report, "invalid_box_parameter");
    assert_eq!(r.outcome, Outcome::Fail);
    assert_eq!(
        r.message.as_deref(),
        Some("Unexpected status code: expected 400 but was 200")
    );
}

#[tokio::test]
async fn test_geo_without_records() {
    let iut = catalogue("OpenSearchDescription-valid.xml").await;
    let ctx = iut.context(Some("OpenSearchDescription-valid.xml"));
    let report = run_class(&ctx, "opensearch-geo").await;

    assert_eq!(report.summary.skipped, 3);
    assert!(
        report
            .results
            .iter()
            .all(|r| r.message.as_deref() == Some("Sample records not found"))
    );
}
