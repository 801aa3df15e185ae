//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Gallery site settings
    #[serde(default)]
    pub gallery: GalleryConfig,

    /// HTTP and crawling behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// Notification behavior settings
    #[serde(default)]
    pub notify: NotifyConfig,

    /// Source paths under the gallery, in processing order
    #[serde(default = "defaults::default_sources")]
    pub sources: Vec<SourceInfo>,

    /// Page shape patterns with corresponding selectors
    #[serde(default = "defaults::default_shapes")]
    pub shapes: Vec<ShapePattern>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Look up a shape pattern by name.
    pub fn shape(&self, name: &str) -> Option<&ShapePattern> {
        self.shapes.iter().find(|s| s.name == name)
    }

    /// Full URL for a source path.
    pub fn source_url(&self, path: &str) -> String {
        format!(
            "{}{}{}",
            self.gallery.base_url, self.gallery.gallery_path, path
        )
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.gallery.base_url)?;
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::config("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::config("crawler.timeout_secs must be > 0"));
        }
        if self.notify.caption_limit < 16 {
            return Err(AppError::config("notify.caption_limit is too small"));
        }
        if self.sources.is_empty() {
            return Err(AppError::config("No sources defined"));
        }
        if self.shapes.is_empty() {
            return Err(AppError::config("No shapes defined"));
        }
        for source in &self.sources {
            if self.shape(&source.shape).is_none() {
                return Err(AppError::config(format!(
                    "source {:?} references unknown shape {:?}",
                    source.path, source.shape
                )));
            }
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gallery: GalleryConfig::default(),
            crawler: CrawlerConfig::default(),
            notify: NotifyConfig::default(),
            sources: defaults::default_sources(),
            shapes: defaults::default_shapes(),
        }
    }
}

/// Gallery site settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GalleryConfig {
    /// Site base URL, no trailing slash
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Path of the resource gallery under the base URL
    #[serde(default = "defaults::gallery_path")]
    pub gallery_path: String,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            gallery_path: defaults::gallery_path(),
        }
    }
}

/// HTTP client and crawling behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between source page requests in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
        }
    }
}

/// Notification behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Maximum caption length accepted by the transport
    #[serde(default = "defaults::caption_limit")]
    pub caption_limit: usize,

    /// Minimum spacing between consecutive sends in milliseconds
    #[serde(default = "defaults::send_delay")]
    pub send_delay_ms: u64,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            caption_limit: defaults::caption_limit(),
            send_delay_ms: defaults::send_delay(),
        }
    }
}

/// A source path under the gallery and the shape used to parse it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceInfo {
    /// Path segment appended to the gallery URL (e.g., "images")
    pub path: String,

    /// Name of the shape pattern used to parse this page
    pub shape: String,
}

/// Page shape pattern with corresponding selectors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapePattern {
    /// Pattern name for identification
    pub name: String,

    /// CSS selector for content blocks
    pub container_selector: String,

    /// CSS selector for the title element within a block
    pub title_selector: String,

    /// CSS selector for a dedicated description element.
    /// When absent, the description comes from the image alt text.
    #[serde(default)]
    pub description_selector: Option<String>,

    /// CSS selector for the image element
    pub image_selector: String,

    /// CSS selector for the link anchor
    pub link_selector: String,
}

/// Telegram credentials and chat targets, from the environment.
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    /// Bot token used for all API calls
    pub bot_token: String,

    /// Channel that receives new resources
    pub channel_id: String,

    /// Chat that receives operator alerts
    pub admin_chat_id: String,

    /// Channel display name, used in alert messages
    pub channel_name: String,
}

impl TelegramConfig {
    /// Load credentials from the environment.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bot_token: require_env("TELEGRAM_BOT_TOKEN")?,
            channel_id: require_env("TELEGRAM_CHANNEL_ID")?,
            admin_chat_id: require_env("TELEGRAM_ADMIN_ID")?,
            channel_name: require_env("TELEGRAM_CHANNEL_NAME")?,
        })
    }
}

fn require_env(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| AppError::config(format!("environment variable {name} is not set")))
}

mod defaults {
    use super::{ShapePattern, SourceInfo};

    // Gallery defaults
    pub fn base_url() -> String {
        "https://webbtelescope.org".into()
    }
    pub fn gallery_path() -> String {
        "/resource-gallery/".into()
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; starfeed/1.0)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        100
    }

    // Notify defaults
    pub fn caption_limit() -> usize {
        1024
    }
    pub fn send_delay() -> u64 {
        1000
    }

    // Source defaults. Processing order is fixed; "articles" uses a
    // different page structure than the media listings.
    pub fn default_sources() -> Vec<SourceInfo> {
        vec![
            SourceInfo {
                path: "images".to_string(),
                shape: "gallery".to_string(),
            },
            SourceInfo {
                path: "videos".to_string(),
                shape: "gallery".to_string(),
            },
            SourceInfo {
                path: "articles".to_string(),
                shape: "article".to_string(),
            },
            SourceInfo {
                path: "other-resources".to_string(),
                shape: "gallery".to_string(),
            },
        ]
    }

    // Shape defaults
    pub fn default_shapes() -> Vec<ShapePattern> {
        vec![
            ShapePattern {
                name: "gallery".to_string(),
                container_selector: "div.ad-research-box".to_string(),
                title_selector: "p".to_string(),
                description_selector: None,
                image_selector: "img".to_string(),
                link_selector: "a".to_string(),
            },
            ShapePattern {
                name: "article".to_string(),
                container_selector: "div.news-listing".to_string(),
                title_selector: "h3".to_string(),
                description_selector: Some("div.article-description".to_string()),
                image_selector: "img".to_string(),
                link_selector: "a".to_string(),
            },
        ]
    }
}
