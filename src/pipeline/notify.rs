// src/pipeline/notify.rs

//! Delivery of stored-but-unsent resources.
//!
//! Each record is attempted through a degrading chain of formatting modes;
//! an API-level refusal moves to the next tier, a transport error or an
//! exhausted chain stops the whole scan.

use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{Config, TelegramConfig};
use crate::pipeline::caption::{escape_markdown, render_caption};
use crate::storage::ResourceStore;
use crate::telegram::{DeliveryChannel, ParseMode};

/// Formatting tiers, tried in order.
const TIERS: [ParseMode; 3] = [ParseMode::MarkdownV2, ParseMode::Html, ParseMode::Plain];

/// Deliver every unsent record and mark it sent.
///
/// Returns the number of records delivered in this run. Stops at the first
/// record whose delivery cannot be completed; records already marked sent
/// keep their state and the rest stay eligible for the next run.
pub async fn deliver_unsent(
    store: &dyn ResourceStore,
    channel: &dyn DeliveryChannel,
    config: &Config,
    telegram: &TelegramConfig,
) -> Result<usize> {
    let delay = Duration::from_millis(config.notify.send_delay_ms);
    let records = store.list_unsent().await?;
    let mut sent_count = 0usize;

    for (i, record) in records.iter().enumerate() {
        if i > 0 && delay.as_millis() > 0 {
            tokio::time::sleep(delay).await;
        }

        let mut message_id = None;
        let mut last_refusal = String::new();

        for mode in TIERS {
            let caption = render_caption(
                record,
                &config.gallery.base_url,
                mode,
                config.notify.caption_limit,
            );

            // A transport-level error propagates here without trying
            // further tiers; only an API refusal degrades the format.
            let outcome = channel
                .send_photo(&telegram.channel_id, &record.image_url, &caption, mode)
                .await?;

            if outcome.ok {
                message_id = outcome.message_id();
                if message_id.is_none() {
                    last_refusal = "response carried no message_id".to_string();
                }
                break;
            }

            last_refusal = outcome.error_description().to_string();
            log::warn!(
                "{mode:?} delivery refused for {} ({last_refusal}), degrading format",
                record.identifier
            );
        }

        let message_id = match message_id {
            Some(id) => id,
            None => {
                return Err(AppError::delivery(&record.identifier, record.id, last_refusal));
            }
        };

        mark_sent_with_retry(store, record.id, &record.identifier, message_id).await?;
        sent_count += 1;
    }

    Ok(sent_count)
}

/// Persist the delivery witness.
///
/// The message is already out, so a "no rows modified" result only retries
/// the update, never the send. A second miss is logged for the operator;
/// failing the batch here would re-deliver on the next run.
async fn mark_sent_with_retry(
    store: &dyn ResourceStore,
    store_key: i64,
    identifier: &str,
    message_id: i64,
) -> Result<()> {
    if store.mark_sent(store_key, message_id).await? {
        return Ok(());
    }

    log::warn!("mark_sent modified no rows for {identifier} (key {store_key}), retrying update");
    if !store.mark_sent(store_key, message_id).await? {
        log::warn!(
            "record {identifier} (key {store_key}) left unmarked after message {message_id} was delivered"
        );
    }
    Ok(())
}

/// Report a fatal batch error to the operator chat.
///
/// Falls back to plain text if the markup is refused; a failure to deliver
/// the alert itself is only logged.
pub async fn alert_admin(channel: &dyn DeliveryChannel, telegram: &TelegramConfig, error: &str) {
    let text = format!(
        "*{}*\nAn error occurred:\n{}",
        escape_markdown(&telegram.channel_name),
        escape_markdown(error)
    );

    let refused = match channel
        .send_text(&telegram.admin_chat_id, &text, ParseMode::MarkdownV2)
        .await
    {
        Ok(outcome) => !outcome.ok,
        Err(e) => {
            log::error!("Failed to deliver admin alert: {e}");
            return;
        }
    };

    if refused {
        let plain = format!("{}\nAn error occurred:\n{}", telegram.channel_name, error);
        if let Err(e) = channel
            .send_text(&telegram.admin_chat_id, &plain, ParseMode::Plain)
            .await
        {
            log::error!("Failed to deliver admin alert: {e}");
        }
    }
}
