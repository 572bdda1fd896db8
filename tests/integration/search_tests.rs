//! End-to-end search tests: crawl or index mock pages, then query them

use crate::common::{finish_indexing, html, site_stats, test_engine};
use std::time::Duration;
use sumi_search::{SiteStatus, SumiError};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer};

async fn mount_page(server: &MockServer, page_path: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(html(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_ranked_results_with_snippets() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<html><head><title>Home</title></head><body>
        <p>the quick fox</p>
        <a href="/den">den</a>
        </body></html>"#,
    )
    .await;
    mount_page(
        &server,
        "/den",
        r#"<html><head><title>Den</title></head><body>
        <p>the quick quick fox fox</p>
        </body></html>"#,
    )
    .await;

    let uri = server.uri();
    let engine = test_engine(&[(&uri, "Foxes")]);
    assert!(engine.start_indexing());
    finish_indexing(&engine).await;

    let results = engine.search("Quick foxes!", Some(&uri), 0, 10).unwrap();
    assert_eq!(results.count, 2);

    let first = &results.results[0];
    assert_eq!(first.uri, "/den");
    assert_eq!(first.title, "Den");
    assert_eq!(first.site, uri);
    assert_eq!(first.site_name, "Foxes");
    assert!((first.relevance - 1.0).abs() < 1e-9);
    assert_eq!(
        first.snippet,
        "the <b>quick</b> <b>quick</b> <b>fox</b> <b>fox</b>"
    );

    let second = &results.results[1];
    assert_eq!(second.uri, "/");
    assert_eq!(second.snippet, "the <b>quick</b> <b>fox</b>");

    // Paging over the same ranking
    let page = engine.search("quick fox", None, 1, 1).unwrap();
    assert_eq!(page.count, 2);
    assert_eq!(page.results.len(), 1);
    assert_eq!(page.results[0].uri, "/");
}

#[tokio::test]
async fn test_results_follow_reindexing() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/story"))
        .respond_with(html("<p>a fox in the woods</p>"))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_page(&server, "/story", "<p>a wolf in the woods</p>").await;

    let uri = server.uri();
    let engine = test_engine(&[(&uri, "Stories")]);
    let page_url = format!("{}/story", uri);

    assert!(engine.index_page(&page_url).await);
    assert_eq!(engine.search("fox", None, 0, 10).unwrap().count, 1);
    assert_eq!(engine.search("wolf", None, 0, 10).unwrap().count, 0);

    assert!(engine.index_page(&page_url).await);
    assert_eq!(engine.search("fox", None, 0, 10).unwrap().count, 0);
    assert_eq!(engine.search("wolf", None, 0, 10).unwrap().count, 1);

    let site = site_stats(&engine, &uri);
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.pages, 1);
}

#[tokio::test]
async fn test_index_page_leaves_status_to_crawl_started_meanwhile() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>root page</p>").set_delay(Duration::from_millis(1000)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doc"))
        .respond_with(html("<p>document page</p>").set_delay(Duration::from_millis(300)))
        .mount(&server)
        .await;

    let uri = server.uri();
    let engine = test_engine(&[(&uri, "Mock Site")]);
    let page_url = format!("{}/doc", uri);

    let (indexed, started) = tokio::join!(engine.index_page(&page_url), async {
        tokio::time::sleep(Duration::from_millis(50)).await;
        engine.start_indexing()
    });
    assert!(indexed);
    assert!(started);

    // The crawl is still fetching the root page
    assert!(engine.is_indexing());
    assert_eq!(site_stats(&engine, &uri).status, SiteStatus::Indexing);

    finish_indexing(&engine).await;
    let site = site_stats(&engine, &uri);
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.pages, 2);
}

#[tokio::test]
async fn test_index_page_rejects_foreign_urls() {
    let server = MockServer::start().await;
    let uri = server.uri();
    let engine = test_engine(&[(&uri, "Mock Site")]);

    assert!(!engine.index_page("https://elsewhere.test/page").await);
    assert!(!engine.index_page(&format!("{}/page?x=1", uri)).await);

    let stats = engine.statistics().unwrap();
    assert_eq!(stats.total.sites, 0);
    assert_eq!(stats.total.pages, 0);
}

#[tokio::test]
async fn test_index_page_failure_marks_site_failed() {
    let engine = test_engine(&[("http://127.0.0.1:1", "Nowhere")]);

    assert!(!engine.index_page("http://127.0.0.1:1/page").await);

    let site = site_stats(&engine, "http://127.0.0.1:1");
    assert_eq!(site.status, SiteStatus::Failed);
    assert!(site.error.is_some());
}

#[tokio::test]
async fn test_site_filter() {
    let first = MockServer::start().await;
    let second = MockServer::start().await;
    mount_page(&first, "/", "<p>shared lantern</p>").await;
    mount_page(&second, "/", "<p>another lantern</p>").await;

    let first_uri = first.uri();
    let second_uri = second.uri();
    let engine = test_engine(&[(&first_uri, "First"), (&second_uri, "Second")]);
    assert!(engine.start_indexing());
    finish_indexing(&engine).await;

    assert_eq!(engine.search("lantern", None, 0, 10).unwrap().count, 2);

    let filtered = engine.search("lantern", Some(&second_uri), 0, 10).unwrap();
    assert_eq!(filtered.count, 1);
    assert_eq!(filtered.results[0].site, second_uri);

    assert!(matches!(
        engine.search("lantern", Some("https://unknown.test"), 0, 10),
        Err(SumiError::UnknownSite(_))
    ));
    assert!(matches!(
        engine.search("the of and", None, 0, 10),
        Err(SumiError::EmptyQuery)
    ));
}
