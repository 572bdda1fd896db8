//! Crawl cycle tests against mock sites

use crate::common::{finish_indexing, html, site_stats, test_config, test_engine, wait_for_status};
use std::time::Duration;
use sumi_search::crawler::INTERRUPTED_MESSAGE;
use sumi_search::{SearchEngine, SiteStatus};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_crawl_visits_each_page_once() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><title>Home</title></head><body>
            <p>Welcome home</p>
            <a href="/docs">Docs</a>
            <a href="/docs/intro">Intro</a>
            <a href="/about/">About</a>
            <a href="/about#team">Team</a>
            <a href="/search?q=fox">Search</a>
            <a href="mailto:admin@example.test">Mail</a>
            <a href="https://elsewhere.test/">Elsewhere</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs"))
        .respond_with(html(
            r#"<html><body><p>Documentation</p>
            <a href="/docs/intro">Intro</a>
            <a href="/">Home</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/docs/intro"))
        .respond_with(html(r#"<html><body><p>Introduction</p></body></html>"#))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(html(r#"<html><body><p>About us</p></body></html>"#))
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    let engine = test_engine(&[(&uri, "Mock Site")]);

    assert!(engine.start_indexing());
    finish_indexing(&engine).await;

    assert!(!engine.is_indexing());
    let site = site_stats(&engine, &uri);
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.error, None);
    assert_eq!(site.pages, 4);
    assert!(site.lemmas > 0);
}

#[tokio::test]
async fn test_start_while_running_is_rejected() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>slow</p>").set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let uri = server.uri();
    let engine = test_engine(&[(&uri, "Slow Site")]);

    assert!(engine.start_indexing());
    assert!(engine.is_indexing());
    assert!(!engine.start_indexing());

    finish_indexing(&engine).await;
    assert!(!engine.is_indexing());

    // A finished cycle can be followed by a new one
    assert!(engine.start_indexing());
    finish_indexing(&engine).await;
    assert_eq!(site_stats(&engine, &uri).status, SiteStatus::Indexed);
}

#[tokio::test]
async fn test_stop_interrupts_only_unfinished_sites() {
    let slow = MockServer::start().await;
    let fast = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>never arrives</p>").set_delay(Duration::from_secs(5)))
        .mount(&slow)
        .await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>quick answer</p>"))
        .mount(&fast)
        .await;

    let slow_uri = slow.uri();
    let fast_uri = fast.uri();
    let engine = test_engine(&[(&slow_uri, "Slow"), (&fast_uri, "Fast")]);

    assert!(engine.start_indexing());
    wait_for_status(&engine, &fast_uri, SiteStatus::Indexed).await;

    assert!(engine.stop_indexing());
    assert!(!engine.stop_indexing());

    tokio::time::timeout(Duration::from_secs(2), engine.wait_for_indexing())
        .await
        .expect("stopped tasks exit promptly");
    assert!(!engine.is_indexing());

    let slow_site = site_stats(&engine, &slow_uri);
    assert_eq!(slow_site.status, SiteStatus::Failed);
    assert_eq!(slow_site.error.as_deref(), Some(INTERRUPTED_MESSAGE));
    assert_eq!(slow_site.pages, 0);

    let fast_site = site_stats(&engine, &fast_uri);
    assert_eq!(fast_site.status, SiteStatus::Indexed);
    assert_eq!(fast_site.error, None);
}

#[tokio::test]
async fn test_unreachable_site_fails() {
    let engine = test_engine(&[("http://127.0.0.1:1", "Nowhere")]);

    assert!(engine.start_indexing());
    finish_indexing(&engine).await;

    let site = site_stats(&engine, "http://127.0.0.1:1");
    assert_eq!(site.status, SiteStatus::Failed);
    let error = site.error.expect("failure is recorded");
    assert!(error.contains("127.0.0.1:1"));
}

#[tokio::test]
async fn test_error_pages_stored_but_not_indexed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<p>home</p><a href="/missing">gone</a>"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(
            ResponseTemplate::new(404).set_body_raw("<p>phantom page</p>", "text/html"),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let engine = test_engine(&[(&uri, "Mock Site")]);

    assert!(engine.start_indexing());
    finish_indexing(&engine).await;

    let site = site_stats(&engine, &uri);
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.pages, 2);

    let results = engine.search("phantom", None, 0, 10).unwrap();
    assert_eq!(results.count, 0);
    assert_eq!(engine.search("home", None, 0, 10).unwrap().count, 1);
}

#[tokio::test]
async fn test_non_html_pages_not_indexed() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<p>home</p><a href="/data.json">data</a>"#))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/data.json"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(r#"{"word": "<p>payload</p>"}"#, "application/json"),
        )
        .mount(&server)
        .await;

    let uri = server.uri();
    let engine = test_engine(&[(&uri, "Mock Site")]);

    assert!(engine.start_indexing());
    finish_indexing(&engine).await;

    assert_eq!(site_stats(&engine, &uri).pages, 2);
    assert_eq!(engine.search("payload", None, 0, 10).unwrap().count, 0);
}

#[tokio::test]
async fn test_fresh_start_purges_previous_pages() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("index.db");
    let db_path = db_path.to_str().unwrap();

    let server = MockServer::start().await;
    let uri = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(r#"<p>home</p><a href="/old">old</a>"#))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(html("<p>archived walrus</p>"))
        .mount(&server)
        .await;

    {
        let engine = SearchEngine::new(test_config(&[(&uri, "Mock Site")], db_path, false)).unwrap();
        assert!(engine.start_indexing());
        finish_indexing(&engine).await;
        assert_eq!(site_stats(&engine, &uri).pages, 2);
    }

    server.reset().await;
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>home</p>"))
        .mount(&server)
        .await;

    // Without a fresh start the old page survives
    {
        let engine = SearchEngine::new(test_config(&[(&uri, "Mock Site")], db_path, false)).unwrap();
        assert!(engine.start_indexing());
        finish_indexing(&engine).await;
        assert_eq!(site_stats(&engine, &uri).pages, 2);
        assert_eq!(engine.search("walrus", None, 0, 10).unwrap().count, 1);
    }

    let engine = SearchEngine::new(test_config(&[(&uri, "Mock Site")], db_path, true)).unwrap();
    assert!(engine.start_indexing());
    finish_indexing(&engine).await;

    let site = site_stats(&engine, &uri);
    assert_eq!(site.status, SiteStatus::Indexed);
    assert_eq!(site.pages, 1);
    assert_eq!(engine.search("walrus", None, 0, 10).unwrap().count, 0);
}
