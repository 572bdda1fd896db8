//! Shared helpers for integration tests

use std::time::Duration;
use sumi_search::config::{parse_config, Config};
use sumi_search::morphology::default_morphology;
use sumi_search::output::SiteStatistics;
use sumi_search::storage::SqliteStorage;
use sumi_search::{SearchEngine, SiteStatus};
use wiremock::ResponseTemplate;

/// Builds a validated config for the given (url, name) sites
pub fn test_config(sites: &[(&str, &str)], database_path: &str, fresh: bool) -> Config {
    let mut toml = format!(
        r#"
[crawler]
max-concurrent-pages = 4
politeness-delay = 10
request-timeout = 30
fresh-start = {}

[user-agent]
crawler-name = "TestBot"
crawler-version = "1.0.0"
contact-url = "https://example.com/contact"
contact-email = "test@example.com"

[storage]
database-path = "{}"
"#,
        fresh, database_path
    );

    for (url, name) in sites {
        toml.push_str(&format!("\n[[sites]]\nurl = \"{}\"\nname = \"{}\"\n", url, name));
    }

    parse_config(&toml).expect("test config is valid")
}

/// Creates an engine over an in-memory database
pub fn test_engine(sites: &[(&str, &str)]) -> SearchEngine {
    SearchEngine::with_storage(
        test_config(sites, ":memory:", false),
        SqliteStorage::new_in_memory().expect("in-memory database"),
        default_morphology(),
    )
    .expect("engine builds")
}

/// An HTML response
pub fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.to_string(), "text/html")
}

/// Waits for the current crawl to finish, failing the test after 10 seconds
pub async fn finish_indexing(engine: &SearchEngine) {
    tokio::time::timeout(Duration::from_secs(10), engine.wait_for_indexing())
        .await
        .expect("indexing finished in time");
}

/// Statistics of the site with the given root URL
pub fn site_stats(engine: &SearchEngine, url: &str) -> SiteStatistics {
    engine
        .statistics()
        .expect("statistics load")
        .detailed
        .into_iter()
        .find(|site| site.url == url)
        .expect("site is recorded")
}

/// Polls until a site reaches `status`
pub async fn wait_for_status(engine: &SearchEngine, url: &str, status: SiteStatus) {
    let poll = async {
        loop {
            let reached = engine
                .statistics()
                .map(|stats| {
                    stats
                        .detailed
                        .iter()
                        .any(|site| site.url == url && site.status == status)
                })
                .unwrap_or(false);
            if reached {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    };

    tokio::time::timeout(Duration::from_secs(10), poll)
        .await
        .expect("site reached status in time");
}
