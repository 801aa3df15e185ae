// src/pipeline/mod.rs

//! The ingest-and-delivery pipeline.

mod batch;
mod caption;
mod ingest;
mod notify;

pub use batch::{BatchOutcome, run_batch};
pub use caption::render_caption;
pub use ingest::{IngestOutcome, run_ingest};
pub use notify::{alert_admin, deliver_unsent};
