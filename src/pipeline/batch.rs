// src/pipeline/batch.rs

//! One full batch cycle: ingest then notify.

use std::collections::HashSet;

use crate::error::Result;
use crate::models::{Config, TelegramConfig};
use crate::pipeline::ingest::{IngestOutcome, run_ingest};
use crate::pipeline::notify::{alert_admin, deliver_unsent};
use crate::storage::ResourceStore;
use crate::telegram::DeliveryChannel;

/// Summary of a batch run.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub ingest: IngestOutcome,
    pub sent: usize,
}

/// Run one ingest-then-notify cycle.
///
/// Fatal errors are alerted to the operator chat before returning, and the
/// store is closed on every path.
pub async fn run_batch(
    config: &Config,
    telegram: &TelegramConfig,
    store: &dyn ResourceStore,
    channel: &dyn DeliveryChannel,
    client: &reqwest::Client,
) -> Result<BatchOutcome> {
    let result = run_cycle(config, telegram, store, channel, client).await;

    if let Err(error) = &result {
        log::error!("Batch failed: {error}");
        alert_admin(channel, telegram, &error.to_string()).await;
    }
    store.close().await;

    result
}

async fn run_cycle(
    config: &Config,
    telegram: &TelegramConfig,
    store: &dyn ResourceStore,
    channel: &dyn DeliveryChannel,
    client: &reqwest::Client,
) -> Result<BatchOutcome> {
    let mut known_ids: HashSet<String> =
        store.list_identifiers().await?.into_iter().collect();
    log::info!("Loaded {} known identifiers", known_ids.len());

    let ingest = run_ingest(&mut known_ids, store, client, config).await?;
    log::info!(
        "Ingest complete: {} pages, {} new, {} known skipped",
        ingest.pages_fetched,
        ingest.new_records,
        ingest.known_skipped
    );

    let sent = deliver_unsent(store, channel, config, telegram).await?;
    log::info!("Delivered {sent} resources");

    Ok(BatchOutcome { ingest, sent })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::telegram::{ParseMode, SendOutcome};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Always-accepting channel recording API method and chat per call.
    #[derive(Default)]
    struct RecordingChannel {
        calls: Mutex<Vec<(&'static str, String)>>,
    }

    impl RecordingChannel {
        fn calls(&self) -> Vec<(&'static str, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DeliveryChannel for RecordingChannel {
        async fn send_text(
            &self,
            chat_id: &str,
            _text: &str,
            _mode: ParseMode,
        ) -> crate::error::Result<SendOutcome> {
            self.calls
                .lock()
                .unwrap()
                .push(("sendMessage", chat_id.to_string()));
            Ok(serde_json::from_str(r#"{"ok":true,"result":{"message_id":1}}"#).unwrap())
        }

        async fn send_photo(
            &self,
            chat_id: &str,
            _photo_url: &str,
            _caption: &str,
            _mode: ParseMode,
        ) -> crate::error::Result<SendOutcome> {
            self.calls
                .lock()
                .unwrap()
                .push(("sendPhoto", chat_id.to_string()));
            Ok(serde_json::from_str(r#"{"ok":true,"result":{"message_id":31}}"#).unwrap())
        }
    }

    fn telegram_config() -> TelegramConfig {
        TelegramConfig {
            bot_token: "TOKEN".to_string(),
            channel_id: "@stars".to_string(),
            admin_chat_id: "42".to_string(),
            channel_name: "Stars".to_string(),
        }
    }

    async fn mock_source(server: &MockServer, source_path: &str, body: &str) {
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
        config.notify.send_delay_ms = 0;
        config
    }

    #[tokio::test]
    async fn full_cycle_persists_and_delivers() {
        let server = MockServer::start().await;
        let block = r#"<div class="ad-research-box">
                         <p>Deep Field</p>
                         <a href="/contents/media/images/deep-field?x=1">
                           <img alt="First image" src="//cdn.example/deep.png">
                         </a>
                       </div>"#;
        mock_source(&server, "images", block).await;
        for p in ["videos", "articles", "other-resources"] {
            mock_source(&server, p, "").await;
        }

        let config = test_config(&server);
        let store = MemoryStore::new();
        let channel = RecordingChannel::default();

        let outcome = run_batch(
            &config,
            &telegram_config(),
            &store,
            &channel,
            &reqwest::Client::new(),
        )
        .await
        .unwrap();

        assert_eq!(outcome.ingest.new_records, 1);
        assert_eq!(outcome.sent, 1);

        let records = store.records();
        assert_eq!(records[0].identifier, "deep-field");
        assert_eq!(records[0].sent, 31);

        assert_eq!(channel.calls(), [("sendPhoto", "@stars".to_string())]);
    }

    #[tokio::test]
    async fn fetch_failure_skips_notification_and_alerts() {
        let server = MockServer::start().await;
        mock_source(&server, "images", "").await;
        Mock::given(method("GET"))
            .and(path("/resource-gallery/videos"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let config = test_config(&server);
        let store = MemoryStore::new();
        let channel = RecordingChannel::default();

        let result = run_batch(
            &config,
            &telegram_config(),
            &store,
            &channel,
            &reqwest::Client::new(),
        )
        .await;
        assert!(result.is_err());

        // No notification scan ran; the only traffic is the admin alert.
        assert_eq!(channel.calls(), [("sendMessage", "42".to_string())]);
    }
}
