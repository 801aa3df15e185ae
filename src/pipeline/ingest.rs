// src/pipeline/ingest.rs

//! Dedup/ingest coordination.
//!
//! Walks the configured source paths in their fixed order, extracts
//! candidates from each page, filters them against the known-identifier
//! set, and persists the rest with the sent marker unset.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::Client;

use crate::error::{AppError, Result};
use crate::extract;
use crate::models::Config;
use crate::storage::ResourceStore;

/// Summary of an ingest run.
#[derive(Debug, Default)]
pub struct IngestOutcome {
    pub pages_fetched: usize,
    pub new_records: usize,
    pub known_skipped: usize,
}

/// Fetch every source page and persist candidates not yet known.
///
/// A non-success status or a page-level parse failure aborts the whole
/// batch. A failed insert is logged, later candidates on the page still
/// run, and the first such failure is surfaced after the scan so the
/// caller does not proceed to notification on inconsistent dedup state.
pub async fn run_ingest(
    known_ids: &mut HashSet<String>,
    store: &dyn ResourceStore,
    client: &Client,
    config: &Config,
) -> Result<IngestOutcome> {
    let delay = Duration::from_millis(config.crawler.request_delay_ms);
    let mut outcome = IngestOutcome::default();
    let mut persist_failure: Option<AppError> = None;

    for (i, source) in config.sources.iter().enumerate() {
        if i > 0 && delay.as_millis() > 0 {
            tokio::time::sleep(delay).await;
        }

        let url = config.source_url(&source.path);
        log::info!("Fetching source page {url}");

        let response = client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AppError::fetch(&source.path, status.as_u16()));
        }
        let body = response.text().await?;
        outcome.pages_fetched += 1;

        let shape = config.shape(&source.shape).ok_or_else(|| {
            AppError::config(format!("unknown shape {:?} for source {:?}", source.shape, source.path))
        })?;
        let candidates = extract::extract(&body, shape, &config.gallery.base_url)
            .map_err(|e| AppError::parse(&source.path, e))?;

        for candidate in candidates {
            if known_ids.contains(&candidate.identifier) {
                outcome.known_skipped += 1;
                continue;
            }
            known_ids.insert(candidate.identifier.clone());

            match store.insert(&candidate).await {
                Ok(()) => {
                    log::info!("Persisted new resource {}", candidate.identifier);
                    outcome.new_records += 1;
                }
                Err(e) => {
                    log::error!("Failed to persist {}: {e}", candidate.identifier);
                    if persist_failure.is_none() {
                        persist_failure = Some(AppError::persist(&candidate.identifier, e));
                    }
                }
            }
        }
    }

    match persist_failure {
        Some(error) => Err(error),
        None => Ok(outcome),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gallery_block(title: &str, slug: &str) -> String {
        format!(
            r#"<div class="ad-research-box">
                 <p>{title}</p>
                 <a href="/contents/media/{slug}?filterUUID=abc">
                   <img alt="{title} alt" srcset="//cdn.example/{slug}.png 350w">
                 </a>
               </div>"#
        )
    }

    async fn mock_source(server: &MockServer, source_path: &str, body: String) {
        Mock::given(method("GET"))
            .and(path(format!("/resource-gallery/{source_path}")))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .mount(server)
            .await;
    }

    fn test_config(server: &MockServer) -> Config {
        let mut config = Config::default();
        config.gallery.base_url = server.uri();
        config.crawler.request_delay_ms = 0;
        config
    }

    #[tokio::test]
    async fn one_block_becomes_one_unsent_record() {
        let server = MockServer::start().await;
        mock_source(&server, "images", gallery_block("Deep Field", "deep-field")).await;
        for p in ["videos", "articles", "other-resources"] {
            mock_source(&server, p, String::new()).await;
        }

        let config = test_config(&server);
        let store = MemoryStore::new();
        let mut known = HashSet::new();

        let outcome = run_ingest(&mut known, &store, &reqwest::Client::new(), &config)
            .await
            .unwrap();

        assert_eq!(outcome.pages_fetched, 4);
        assert_eq!(outcome.new_records, 1);

        let records = store.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "deep-field");
        assert_eq!(records[0].sent, 0);
        assert_eq!(records[0].link, "/contents/media/deep-field");
    }

    #[tokio::test]
    async fn second_run_inserts_nothing() {
        let server = MockServer::start().await;
        mock_source(&server, "images", gallery_block("Deep Field", "deep-field")).await;
        for p in ["videos", "articles", "other-resources"] {
            mock_source(&server, p, String::new()).await;
        }

        let config = test_config(&server);
        let store = MemoryStore::new();
        let client = reqwest::Client::new();

        let mut known = HashSet::new();
        run_ingest(&mut known, &store, &client, &config).await.unwrap();

        // A fresh run starts from the identifiers already in the store.
        let mut known: HashSet<String> = store
            .list_identifiers()
            .await
            .unwrap()
            .into_iter()
            .collect();
        let outcome = run_ingest(&mut known, &store, &client, &config).await.unwrap();

        assert_eq!(outcome.new_records, 0);
        assert_eq!(outcome.known_skipped, 1);
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn newest_first_page_inserts_oldest_first() {
        let server = MockServer::start().await;
        let page = format!(
            "{}{}",
            gallery_block("Newest", "newest"),
            gallery_block("Oldest", "oldest")
        );
        mock_source(&server, "images", page).await;
        for p in ["videos", "articles", "other-resources"] {
            mock_source(&server, p, String::new()).await;
        }

        let config = test_config(&server);
        let store = MemoryStore::new();
        let mut known = HashSet::new();

        run_ingest(&mut known, &store, &reqwest::Client::new(), &config)
            .await
            .unwrap();

        let ids: Vec<String> = store.records().into_iter().map(|r| r.identifier).collect();
        assert_eq!(ids, ["oldest", "newest"]);
    }

    #[tokio::test]
    async fn duplicate_across_pages_is_inserted_once() {
        let server = MockServer::start().await;
        mock_source(&server, "images", gallery_block("Dup", "dup")).await;
        mock_source(&server, "videos", gallery_block("Dup", "dup")).await;
        for p in ["articles", "other-resources"] {
            mock_source(&server, p, String::new()).await;
        }

        let config = test_config(&server);
        let store = MemoryStore::new();
        let mut known = HashSet::new();

        let outcome = run_ingest(&mut known, &store, &reqwest::Client::new(), &config)
            .await
            .unwrap();

        assert_eq!(outcome.new_records, 1);
        assert_eq!(outcome.known_skipped, 1);
    }

    #[tokio::test]
    async fn non_success_status_is_a_hard_stop() {
        let server = MockServer::start().await;
        mock_source(&server, "images", String::new()).await;
        Mock::given(method("GET"))
            .and(path("/resource-gallery/videos"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        // Later paths must never be touched.
        for p in ["articles", "other-resources"] {
            Mock::given(method("GET"))
                .and(path(format!("/resource-gallery/{p}")))
                .respond_with(ResponseTemplate::new(200))
                .expect(0)
                .mount(&server)
                .await;
        }

        let config = test_config(&server);
        let store = MemoryStore::new();
        let mut known = HashSet::new();

        let error = run_ingest(&mut known, &store, &reqwest::Client::new(), &config)
            .await
            .unwrap_err();

        match error {
            AppError::Fetch { path, status } => {
                assert_eq!(path, "videos");
                assert_eq!(status, 500);
            }
            other => panic!("expected fetch error, got {other}"),
        }
    }
}
