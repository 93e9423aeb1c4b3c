//! Generation controller: single-flight rendering with observable state

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use render_worker::{BlobUrl, RenderWorker, WorkerError};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::presenter::{DocumentPresenter, PresentError};

/// Something that can turn a template and props into a published document
#[async_trait]
pub trait RenderBackend: Send + Sync {
    async fn render(
        &self,
        template_id: &str,
        props: serde_json::Value,
    ) -> Result<BlobUrl, WorkerError>;

    /// Release a document the controller no longer references
    fn revoke(&self, url: &BlobUrl);
}

#[async_trait]
impl RenderBackend for RenderWorker {
    async fn render(
        &self,
        template_id: &str,
        props: serde_json::Value,
    ) -> Result<BlobUrl, WorkerError> {
        self.render_in_worker(template_id, props).await
    }

    fn revoke(&self, url: &BlobUrl) {
        self.blobs().revoke(url);
    }
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// How long a render in flight keeps the controller mounted after `unmount`
    pub unmount_grace: Duration,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            unmount_grace: Duration::from_secs(2),
        }
    }
}

/// Observable controller state
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub url: Option<BlobUrl>,
    pub loading: bool,
    pub error: Option<WorkerError>,
    pub is_generating: bool,
    pub is_mounted: bool,
    /// Generation counter; a result is applied only for the current epoch
    pub epoch: u64,
}

impl Default for RenderState {
    fn default() -> Self {
        Self {
            url: None,
            loading: false,
            error: None,
            is_generating: false,
            is_mounted: true,
            epoch: 0,
        }
    }
}

/// What became of a `generate_pdf` call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Another generation was in flight; nothing happened
    Rejected,
    /// The result (url or error) was written to the state
    Applied,
    /// The controller was torn down before the result arrived
    Discarded,
}

/// Orchestrates document generation for one consumer
///
/// At most one generation runs at a time. `unmount` during a generation keeps
/// the controller alive for the configured grace window so a late result is
/// still recorded.
pub struct PdfController {
    backend: Arc<dyn RenderBackend>,
    presenter: Arc<dyn DocumentPresenter>,
    config: ControllerConfig,
    state: Arc<watch::Sender<RenderState>>,
    teardown: Mutex<Option<JoinHandle<()>>>,
}

impl PdfController {
    pub fn new(
        backend: Arc<dyn RenderBackend>,
        presenter: Arc<dyn DocumentPresenter>,
        config: ControllerConfig,
    ) -> Self {
        let (state, _) = watch::channel(RenderState::default());
        Self {
            backend,
            presenter,
            config,
            state: Arc::new(state),
            teardown: Mutex::new(None),
        }
    }

    /// Snapshot of the current state
    pub fn state(&self) -> RenderState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change
    pub fn subscribe(&self) -> watch::Receiver<RenderState> {
        self.state.subscribe()
    }

    pub fn url(&self) -> Option<BlobUrl> {
        self.state.borrow().url.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn error(&self) -> Option<WorkerError> {
        self.state.borrow().error.clone()
    }

    /// Render `template_id` with `props` and record the outcome
    pub async fn generate_pdf(&self, template_id: &str, props: serde_json::Value) -> Dispatch {
        let mut epoch = 0;
        let mut replaced = None;

        let accepted = self.state.send_if_modified(|state| {
            if state.loading || state.is_generating {
                return false;
            }
            state.epoch += 1;
            epoch = state.epoch;
            replaced = state.url.take();
            state.error = None;
            state.loading = true;
            state.is_generating = true;
            true
        });

        if !accepted {
            tracing::debug!(template_id, "generation already in flight; request ignored");
            return Dispatch::Rejected;
        }

        if let Some(old) = replaced {
            self.backend.revoke(&old);
        }

        tracing::debug!(template_id, epoch, "generation started");
        let result = self.backend.render(template_id, props).await;

        let mut dispatch = Dispatch::Discarded;
        let mut orphan = None;
        self.state.send_if_modified(|state| {
            if state.epoch != epoch {
                orphan = result.clone().ok();
                return false;
            }

            state.loading = false;
            state.is_generating = false;
            if state.is_mounted {
                match &result {
                    Ok(url) => state.url = Some(url.clone()),
                    Err(err) => state.error = Some(err.clone()),
                }
                dispatch = Dispatch::Applied;
            } else {
                orphan = result.clone().ok();
            }
            true
        });

        if let Some(url) = orphan {
            self.backend.revoke(&url);
        }

        match (&dispatch, &result) {
            (Dispatch::Applied, Ok(url)) => {
                tracing::info!(template_id, epoch, url = %url, "generation finished")
            }
            (Dispatch::Applied, Err(err)) => {
                tracing::warn!(template_id, epoch, error = %err, "generation failed")
            }
            _ => tracing::debug!(template_id, epoch, "result arrived after teardown; discarded"),
        }

        dispatch
    }

    /// Save the current document as `contract-<suffix>.pdf`
    ///
    /// Returns `Ok(false)` when there is no document yet.
    pub fn download_pdf(&self) -> Result<bool, PresentError> {
        let Some(url) = self.url() else {
            return Ok(false);
        };
        self.presenter.download(&url, &download_filename(&url))?;
        Ok(true)
    }

    /// Open the current document; `Ok(false)` when there is none
    pub fn show_pdf(&self) -> Result<bool, PresentError> {
        let Some(url) = self.url() else {
            return Ok(false);
        };
        self.presenter.show(&url)?;
        Ok(true)
    }

    /// The consumer is (again) present; cancels a pending teardown
    pub fn mount(&self) {
        self.cancel_teardown();
        self.state.send_if_modified(|state| {
            let changed = !state.is_mounted;
            state.is_mounted = true;
            changed
        });
    }

    /// The consumer is going away
    ///
    /// Without a generation in flight the controller unmounts immediately.
    /// Otherwise it stays mounted for the grace window; if the generation is
    /// still running when the window closes, its result will be discarded.
    pub fn unmount(&self) {
        self.cancel_teardown();

        let generating = self.state.borrow().is_generating;
        if !generating {
            self.state.send_modify(|state| state.is_mounted = false);
            return;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("no async runtime for the unmount grace timer; unmounting now");
            self.state.send_modify(abandon);
            return;
        };

        let state = Arc::clone(&self.state);
        let grace = self.config.unmount_grace;
        tracing::debug!(grace_ms = grace.as_millis() as u64, "unmount deferred while generating");

        let handle = runtime.spawn(async move {
            tokio::time::sleep(grace).await;
            state.send_modify(abandon);
            tracing::debug!("unmount grace window elapsed");
        });

        if let Ok(mut teardown) = self.teardown.lock() {
            *teardown = Some(handle);
        }
    }

    /// Release the current document and stop listening for results
    pub fn dispose(&self) {
        self.cancel_teardown();

        let mut released = None;
        self.state.send_modify(|state| {
            released = state.url.take();
            abandon(state);
        });

        if let Some(url) = released {
            self.backend.revoke(&url);
        }
    }

    fn cancel_teardown(&self) {
        if let Ok(mut teardown) = self.teardown.lock() {
            if let Some(handle) = teardown.take() {
                handle.abort();
            }
        }
    }
}

impl Drop for PdfController {
    fn drop(&mut self) {
        self.cancel_teardown();
    }
}

/// Unmount, dropping interest in any generation still running
fn abandon(state: &mut RenderState) {
    state.is_mounted = false;
    if state.is_generating {
        state.epoch += 1;
        state.loading = false;
        state.is_generating = false;
    }
}

/// `contract-<suffix>.pdf`, suffix being the URL's trailing segment
pub fn download_filename(url: &BlobUrl) -> String {
    format!("contract-{}.pdf", url.suffix())
}
