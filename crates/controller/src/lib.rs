//! Render Controller - orchestrates document generation for a consumer
//!
//! This crate provides:
//! - [`PdfController`]: single-flight generation with `url`/`loading`/`error`
//!   state, an unmount grace window, and download/show actions
//! - [`RenderBackend`]: the seam to the render worker
//! - [`DocumentPresenter`] and the filesystem-backed [`FsPresenter`]
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use render_controller::{ControllerConfig, FsPresenter, PdfController};
//! use render_worker::{RenderWorker, WorkerConfig};
//!
//! let worker = Arc::new(RenderWorker::new(WorkerConfig::default()));
//! let presenter = Arc::new(FsPresenter::new(worker.blobs().clone(), "out"));
//! let controller = PdfController::new(worker, presenter, ControllerConfig::default());
//!
//! controller.generate_pdf("ContractPDF", props).await;
//! controller.download_pdf()?;
//! ```

mod controller;
mod presenter;

pub use controller::{
    download_filename, ControllerConfig, Dispatch, PdfController, RenderBackend, RenderState,
};
pub use presenter::{DocumentPresenter, FsPresenter, PresentError, ViewerCommand};
