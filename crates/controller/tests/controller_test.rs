//! Integration tests for the generation controller

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use pretty_assertions::assert_eq;
use render_controller::{
    ControllerConfig, Dispatch, DocumentPresenter, FsPresenter, PdfController, PresentError,
    RenderBackend,
};
use render_worker::{BlobStore, BlobUrl, RenderWorker, WorkerConfig, WorkerError};
use serde_json::json;
use tokio::sync::Semaphore;

/// Backend whose renders wait for a permit before publishing
struct GatedBackend {
    blobs: BlobStore,
    gate: Semaphore,
    calls: AtomicUsize,
}

impl GatedBackend {
    fn closed() -> Arc<Self> {
        Arc::new(Self {
            blobs: BlobStore::new(),
            gate: Semaphore::new(0),
            calls: AtomicUsize::new(0),
        })
    }

    fn open() -> Arc<Self> {
        let backend = Self::closed();
        backend.gate.add_permits(Semaphore::MAX_PERMITS / 2);
        backend
    }

    fn release(&self) {
        self.gate.add_permits(1);
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RenderBackend for GatedBackend {
    async fn render(
        &self,
        template_id: &str,
        _props: serde_json::Value,
    ) -> Result<BlobUrl, WorkerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.gate
            .acquire()
            .await
            .map_err(|_| WorkerError::Transport("gate closed".to_string()))?
            .forget();

        if template_id != "ContractPDF" {
            return Err(WorkerError::TemplateNotFound(template_id.to_string()));
        }
        Ok(self.blobs.insert(b"%PDF-fake".to_vec(), "application/pdf"))
    }

    fn revoke(&self, url: &BlobUrl) {
        self.blobs.revoke(url);
    }
}

#[derive(Default)]
struct RecordingPresenter {
    downloads: Mutex<Vec<(BlobUrl, String)>>,
    shown: Mutex<Vec<BlobUrl>>,
}

impl DocumentPresenter for RecordingPresenter {
    fn download(&self, url: &BlobUrl, filename: &str) -> Result<(), PresentError> {
        self.downloads
            .lock()
            .unwrap()
            .push((url.clone(), filename.to_string()));
        Ok(())
    }

    fn show(&self, url: &BlobUrl) -> Result<(), PresentError> {
        self.shown.lock().unwrap().push(url.clone());
        Ok(())
    }
}

fn controller(backend: &Arc<GatedBackend>) -> (Arc<PdfController>, Arc<RecordingPresenter>) {
    let presenter = Arc::new(RecordingPresenter::default());
    let controller = PdfController::new(
        backend.clone(),
        presenter.clone(),
        ControllerConfig::default(),
    );
    (Arc::new(controller), presenter)
}

fn contract_props() -> serde_json::Value {
    json!({
        "contract": {
            "id": 7,
            "title": "Service Agreement",
            "clauses": [],
            "ownerName": "Acme",
            "recipientName": "Beta Co"
        }
    })
}

fn spawn_generate(
    controller: &Arc<PdfController>,
    template_id: &'static str,
) -> tokio::task::JoinHandle<Dispatch> {
    let controller = Arc::clone(controller);
    tokio::spawn(async move { controller.generate_pdf(template_id, contract_props()).await })
}

async fn wait_until_loading(controller: &PdfController) {
    controller
        .subscribe()
        .wait_for(|state| state.loading)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_successful_generation() {
    let backend = GatedBackend::closed();
    let (controller, _) = controller(&backend);

    let task = spawn_generate(&controller, "ContractPDF");
    wait_until_loading(&controller).await;

    let state = controller.state();
    assert!(state.loading && state.is_generating);
    assert_eq!(state.url, None);
    assert_eq!(state.error, None);

    backend.release();
    assert_eq!(task.await.unwrap(), Dispatch::Applied);

    let state = controller.state();
    assert!(!state.loading && !state.is_generating);
    assert!(state.url.is_some());
    assert_eq!(state.error, None);
}

#[tokio::test]
async fn test_reentrant_generation_is_rejected() {
    let backend = GatedBackend::closed();
    let (controller, _) = controller(&backend);

    let task = spawn_generate(&controller, "ContractPDF");
    wait_until_loading(&controller).await;
    let before = controller.state();

    let second = controller
        .generate_pdf("ContractPDF", contract_props())
        .await;
    assert_eq!(second, Dispatch::Rejected);
    assert_eq!(controller.state(), before);
    assert_eq!(backend.calls(), 1);

    backend.release();
    assert_eq!(task.await.unwrap(), Dispatch::Applied);
    assert_eq!(backend.calls(), 1);
}

#[tokio::test]
async fn test_actions_without_url_do_nothing() {
    let backend = GatedBackend::open();
    let (controller, presenter) = controller(&backend);

    assert!(!controller.download_pdf().unwrap());
    assert!(!controller.show_pdf().unwrap());
    assert!(presenter.downloads.lock().unwrap().is_empty());
    assert!(presenter.shown.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_unknown_template_sets_error() {
    let backend = GatedBackend::open();
    let (controller, _) = controller(&backend);

    let dispatch = controller.generate_pdf("InvoicePDF", json!({})).await;
    assert_eq!(dispatch, Dispatch::Applied);

    let state = controller.state();
    assert_eq!(
        state.error,
        Some(WorkerError::TemplateNotFound("InvoicePDF".to_string()))
    );
    assert_eq!(state.url, None);
    assert!(!state.loading);
}

#[tokio::test]
async fn test_error_cleared_by_next_generation() {
    let backend = GatedBackend::open();
    let (controller, _) = controller(&backend);

    controller.generate_pdf("InvoicePDF", json!({})).await;
    assert!(controller.error().is_some());

    controller
        .generate_pdf("ContractPDF", contract_props())
        .await;
    assert_eq!(controller.error(), None);
    assert!(controller.url().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_result_within_grace_window_is_kept() {
    let backend = GatedBackend::closed();
    let (controller, _) = controller(&backend);

    let task = spawn_generate(&controller, "ContractPDF");
    wait_until_loading(&controller).await;

    controller.unmount();
    assert!(controller.state().is_mounted);

    tokio::time::sleep(Duration::from_millis(500)).await;
    backend.release();
    assert_eq!(task.await.unwrap(), Dispatch::Applied);
    assert!(controller.url().is_some());
    assert!(!controller.loading());

    tokio::time::sleep(Duration::from_millis(1600)).await;
    let state = controller.state();
    assert!(!state.is_mounted);
    assert!(state.url.is_some());
}

#[tokio::test(start_paused = true)]
async fn test_result_after_grace_window_is_discarded() {
    let backend = GatedBackend::closed();
    let (controller, _) = controller(&backend);

    let task = spawn_generate(&controller, "ContractPDF");
    wait_until_loading(&controller).await;
    controller.unmount();

    tokio::time::sleep(Duration::from_millis(2100)).await;
    let state = controller.state();
    assert!(!state.is_mounted);
    assert!(!state.loading && !state.is_generating);

    backend.release();
    assert_eq!(task.await.unwrap(), Dispatch::Discarded);
    assert_eq!(controller.url(), None);
    assert_eq!(controller.error(), None);
    assert!(backend.blobs.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_remount_cancels_teardown() {
    let backend = GatedBackend::closed();
    let (controller, _) = controller(&backend);

    let task = spawn_generate(&controller, "ContractPDF");
    wait_until_loading(&controller).await;
    controller.unmount();
    controller.mount();

    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(controller.state().is_mounted);

    backend.release();
    assert_eq!(task.await.unwrap(), Dispatch::Applied);
    assert!(controller.url().is_some());
}

#[tokio::test]
async fn test_unmount_while_idle_is_immediate() {
    let backend = GatedBackend::open();
    let (controller, _) = controller(&backend);

    controller.unmount();
    assert!(!controller.state().is_mounted);

    let dispatch = controller
        .generate_pdf("ContractPDF", contract_props())
        .await;
    assert_eq!(dispatch, Dispatch::Discarded);
    assert_eq!(controller.url(), None);
    assert!(!controller.loading());
    assert!(backend.blobs.is_empty());
}

#[tokio::test]
async fn test_sequential_generations_render_twice() {
    let backend = GatedBackend::open();
    let (controller, _) = controller(&backend);

    controller
        .generate_pdf("ContractPDF", contract_props())
        .await;
    let first = controller.url().unwrap();

    controller
        .generate_pdf("ContractPDF", contract_props())
        .await;
    let second = controller.url().unwrap();

    assert_eq!(backend.calls(), 2);
    assert_ne!(first, second);
    // Replaced documents are released
    assert!(backend.blobs.get(&first).is_none());
    assert!(backend.blobs.get(&second).is_some());
}

#[tokio::test]
async fn test_download_and_show_use_current_url() {
    let backend = GatedBackend::open();
    let (controller, presenter) = controller(&backend);

    controller
        .generate_pdf("ContractPDF", contract_props())
        .await;
    let url = controller.url().unwrap();

    assert!(controller.download_pdf().unwrap());
    assert!(controller.show_pdf().unwrap());

    let downloads = presenter.downloads.lock().unwrap();
    assert_eq!(
        *downloads,
        vec![(url.clone(), format!("contract-{}.pdf", url.suffix()))]
    );
    assert_eq!(*presenter.shown.lock().unwrap(), vec![url]);
}

#[tokio::test]
async fn test_dispose_releases_document() {
    let backend = GatedBackend::open();
    let (controller, _) = controller(&backend);

    controller
        .generate_pdf("ContractPDF", contract_props())
        .await;
    assert_eq!(backend.blobs.len(), 1);

    controller.dispose();
    assert_eq!(controller.url(), None);
    assert!(!controller.state().is_mounted);
    assert!(backend.blobs.is_empty());
}

#[tokio::test]
async fn test_subscribers_observe_loading_transitions() {
    let backend = GatedBackend::closed();
    let (controller, _) = controller(&backend);
    let mut rx = controller.subscribe();

    let task = spawn_generate(&controller, "ContractPDF");
    rx.changed().await.unwrap();
    assert!(rx.borrow_and_update().loading);

    backend.release();
    rx.changed().await.unwrap();
    let state = rx.borrow_and_update().clone();
    assert!(!state.loading);
    assert!(state.url.is_some());

    task.await.unwrap();
}

#[tokio::test]
async fn test_end_to_end_contract_download() {
    let dir = tempfile::tempdir().unwrap();
    let worker = Arc::new(RenderWorker::new(WorkerConfig::default()));
    let presenter = Arc::new(FsPresenter::new(worker.blobs().clone(), dir.path()));
    let controller = PdfController::new(worker.clone(), presenter, ControllerConfig::default());

    let dispatch = controller
        .generate_pdf("ContractPDF", contract_props())
        .await;
    assert_eq!(dispatch, Dispatch::Applied);

    let url = controller.url().unwrap();
    assert!(url.as_str().starts_with("blob:"));
    assert!(controller.download_pdf().unwrap());

    let path = dir.path().join(format!("contract-{}.pdf", url.suffix()));
    let bytes = std::fs::read(path).unwrap();
    assert!(bytes.starts_with(b"%PDF-"));

    worker.shutdown().await;
}
