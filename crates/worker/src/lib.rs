//! Render Worker - background document rendering
//!
//! This crate provides:
//! - A worker task that resolves templates by identifier and renders them off
//!   the caller's task
//! - An in-memory blob store addressed by `blob:` URLs
//! - Best-effort progress notifications per request
//!
//! # Example
//!
//! ```ignore
//! use render_worker::{RenderWorker, WorkerConfig};
//!
//! let worker = RenderWorker::new(WorkerConfig::default());
//! worker.on_progress(|event| println!("{event}"));
//! let url = worker.render_in_worker("ContractPDF", props).await?;
//! let pdf = worker.blobs().get(&url);
//! worker.shutdown().await;
//! ```

mod blob;
mod error;
mod message;
mod progress;
mod worker;

pub use blob::{Blob, BlobStore, BlobUrl, DEFAULT_ORIGIN};
pub use error::{Result, WorkerError};
pub use message::RenderRequest;
pub use progress::{ProgressEvent, ProgressKind, ProgressSinks};
pub use worker::{DocumentRenderer, RenderWorker, WorkerConfig, PDF_CONTENT_TYPE};
