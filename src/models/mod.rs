// src/models/mod.rs

//! Domain models for the gallery batch job.

mod config;
mod resource;

// Re-export all public types
pub use config::{
    Config, CrawlerConfig, GalleryConfig, NotifyConfig, ShapePattern, SourceInfo, TelegramConfig,
};
pub use resource::{Candidate, ResourceRecord};
