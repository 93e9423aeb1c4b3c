//! The render worker: a background task owning template resolution and rendering

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use template::{TemplateId, TemplateRegistry};
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::task::JoinHandle;

use crate::blob::{BlobStore, BlobUrl, DEFAULT_ORIGIN};
use crate::error::{Result, WorkerError};
use crate::message::{RenderRequest, WorkerMessage};
use crate::progress::{ProgressEvent, ProgressKind, ProgressSinks};

pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Resolves template identifiers and turns props into document bytes
///
/// `render` runs on the blocking pool and may take as long as it needs.
pub trait DocumentRenderer: Send + Sync + 'static {
    fn resolve(&self, template_id: &str) -> template::Result<TemplateId>;

    fn render(&self, template: TemplateId, props: &serde_json::Value) -> template::Result<Vec<u8>>;
}

impl DocumentRenderer for TemplateRegistry {
    fn resolve(&self, template_id: &str) -> template::Result<TemplateId> {
        template_id.parse()
    }

    fn render(&self, template: TemplateId, props: &serde_json::Value) -> template::Result<Vec<u8>> {
        TemplateRegistry::render(self, template, props)
    }
}

/// Worker tuning
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Requests that may wait for the worker before senders block
    pub queue_capacity: usize,
    /// Origin embedded in produced blob URLs
    pub origin: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 16,
            origin: DEFAULT_ORIGIN.to_string(),
        }
    }
}

enum Lifecycle {
    Idle,
    Running {
        sender: mpsc::Sender<WorkerMessage>,
        handle: JoinHandle<()>,
    },
    Disposed,
}

/// Handle to the background render worker
///
/// The worker task is spawned on the first render and processes requests in
/// arrival order. Blob URLs it produces stay valid after [`shutdown`]
/// because the [`BlobStore`] is shared with the caller.
///
/// [`shutdown`]: RenderWorker::shutdown
pub struct RenderWorker {
    config: WorkerConfig,
    renderer: Arc<dyn DocumentRenderer>,
    blobs: BlobStore,
    progress: ProgressSinks,
    lifecycle: Mutex<Lifecycle>,
    next_request: AtomicU64,
}

impl RenderWorker {
    /// Worker backed by the built-in template registry
    pub fn new(config: WorkerConfig) -> Self {
        Self::with_renderer(config, TemplateRegistry::new())
    }

    pub fn with_renderer(config: WorkerConfig, renderer: impl DocumentRenderer) -> Self {
        let blobs = BlobStore::with_origin(&config.origin);
        Self {
            config,
            renderer: Arc::new(renderer),
            blobs,
            progress: ProgressSinks::default(),
            lifecycle: Mutex::new(Lifecycle::Idle),
            next_request: AtomicU64::new(1),
        }
    }

    /// Store holding every blob this worker publishes
    pub fn blobs(&self) -> &BlobStore {
        &self.blobs
    }

    /// Register a progress callback
    pub fn on_progress<F>(&self, callback: F)
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        self.progress.register(callback);
    }

    pub async fn is_running(&self) -> bool {
        matches!(*self.lifecycle.lock().await, Lifecycle::Running { .. })
    }

    /// Render `template_id` with `props` in the background and publish the bytes
    pub async fn render_in_worker(
        &self,
        template_id: &str,
        props: serde_json::Value,
    ) -> Result<BlobUrl> {
        let sender = self.sender().await?;
        let request = RenderRequest {
            request_id: self.next_request.fetch_add(1, Ordering::Relaxed),
            template_id: template_id.to_string(),
            props,
        };
        let request_id = request.request_id;

        let (reply, response) = oneshot::channel();
        sender
            .send(WorkerMessage::Render { request, reply })
            .await
            .map_err(|_| WorkerError::Transport("worker queue closed".to_string()))?;

        tracing::debug!(request_id, template_id, "render request queued");

        response
            .await
            .map_err(|_| WorkerError::Transport("worker dropped the reply".to_string()))?
    }

    /// Stop the worker after queued requests finish
    ///
    /// Every later call fails with [`WorkerError::Disposed`].
    pub async fn shutdown(&self) {
        let previous = std::mem::replace(&mut *self.lifecycle.lock().await, Lifecycle::Disposed);

        if let Lifecycle::Running { sender, handle } = previous {
            drop(sender);
            if let Err(err) = handle.await {
                tracing::warn!(error = %err, "render worker task ended abnormally");
            }
            tracing::info!("render worker shut down");
        }
    }

    async fn sender(&self) -> Result<mpsc::Sender<WorkerMessage>> {
        let mut lifecycle = self.lifecycle.lock().await;

        match &*lifecycle {
            Lifecycle::Running { sender, .. } => return Ok(sender.clone()),
            Lifecycle::Disposed => return Err(WorkerError::Disposed),
            Lifecycle::Idle => {}
        }

        let (sender, receiver) = mpsc::channel(self.config.queue_capacity.max(1));
        let handle = tokio::spawn(run(
            receiver,
            Arc::clone(&self.renderer),
            self.blobs.clone(),
            self.progress.clone(),
        ));
        tracing::info!(origin = %self.config.origin, "render worker started");

        *lifecycle = Lifecycle::Running {
            sender: sender.clone(),
            handle,
        };
        Ok(sender)
    }
}

impl Drop for RenderWorker {
    fn drop(&mut self) {
        if let Lifecycle::Running { handle, .. } = self.lifecycle.get_mut() {
            handle.abort();
        }
    }
}

async fn run(
    mut receiver: mpsc::Receiver<WorkerMessage>,
    renderer: Arc<dyn DocumentRenderer>,
    blobs: BlobStore,
    progress: ProgressSinks,
) {
    while let Some(message) = receiver.recv().await {
        match message {
            WorkerMessage::Render { request, reply } => {
                let request_id = request.request_id;
                let result = handle(request, &renderer, &blobs, &progress).await;

                let kind = match &result {
                    Ok(url) => ProgressKind::Published { url: url.clone() },
                    Err(error) => {
                        tracing::warn!(request_id, error = %error, "render failed");
                        ProgressKind::Failed {
                            error: error.clone(),
                        }
                    }
                };
                progress.emit(ProgressEvent { request_id, kind });

                if let Err(Ok(orphan)) = reply.send(result) {
                    // Caller went away; nobody will revoke this blob
                    blobs.revoke(&orphan);
                    tracing::debug!(request_id, "discarded render for a dropped caller");
                }
            }
        }
    }
}

async fn handle(
    request: RenderRequest,
    renderer: &Arc<dyn DocumentRenderer>,
    blobs: &BlobStore,
    progress: &ProgressSinks,
) -> Result<BlobUrl> {
    let RenderRequest {
        request_id,
        template_id,
        props,
    } = request;

    progress.emit(ProgressEvent {
        request_id,
        kind: ProgressKind::Received {
            template_id: template_id.clone(),
        },
    });

    let template = renderer.resolve(&template_id)?;
    progress.emit(ProgressEvent {
        request_id,
        kind: ProgressKind::Resolved { template },
    });

    let task_renderer = Arc::clone(renderer);
    let bytes = tokio::task::spawn_blocking(move || task_renderer.render(template, &props))
        .await
        .map_err(|err| WorkerError::Render(format!("render task aborted: {err}")))??;

    progress.emit(ProgressEvent {
        request_id,
        kind: ProgressKind::Rendered { bytes: bytes.len() },
    });

    let size = bytes.len();
    let url = blobs.insert(bytes, PDF_CONTENT_TYPE);
    tracing::info!(request_id, %template, bytes = size, url = %url, "document published");

    Ok(url)
}
