//! The `render` command: one generate → download/show cycle

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use render_controller::{ControllerConfig, Dispatch, FsPresenter, PdfController};
use render_worker::{RenderWorker, WorkerConfig};
use template::{ApiResponse, Contract, TemplateId};

use crate::config::{RenderArgs, Settings};

/// Read props for `template` from a JSON file
pub fn load_props(template: &str, path: &Path) -> anyhow::Result<serde_json::Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read props from {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&text)
        .with_context(|| format!("{} is not valid JSON", path.display()))?;
    normalize_props(template, value)
}

/// Unwrap an API envelope of contracts into contract template props
///
/// Anything that is not an envelope is passed through untouched.
pub fn normalize_props(
    template: &str,
    value: serde_json::Value,
) -> anyhow::Result<serde_json::Value> {
    let is_envelope = value.get("success").is_some_and(|v| v.is_boolean());
    if !is_envelope || template != TemplateId::ContractPdf.as_str() {
        return Ok(value);
    }

    let response: ApiResponse<Contract> =
        serde_json::from_value(value).context("malformed contract response")?;
    let contract = response.into_single()?;
    Ok(serde_json::json!({ "contract": contract }))
}

pub async fn run(settings: &Settings, args: &RenderArgs) -> anyhow::Result<()> {
    let props = load_props(&args.template, &args.props_file)?;

    let worker = Arc::new(RenderWorker::new(WorkerConfig {
        queue_capacity: settings.worker.queue_capacity,
        origin: settings.worker.origin.clone(),
    }));
    worker.on_progress(|event| tracing::debug!(target: "dashdoc::progress", "{event}"));

    let presenter = FsPresenter::new(worker.blobs().clone(), &settings.output.directory)
        .with_viewer(settings.output.viewer.clone());
    let controller = PdfController::new(
        worker.clone(),
        Arc::new(presenter),
        ControllerConfig {
            unmount_grace: settings.controller.unmount_grace,
        },
    );

    let dispatch = controller.generate_pdf(&args.template, props).await;
    let state = controller.state();

    let outcome = match (dispatch, state.url, state.error) {
        (Dispatch::Applied, Some(url), _) => {
            if !args.no_download {
                controller.download_pdf()?;
                let filename = render_controller::download_filename(&url);
                println!("{}", settings.output.directory.join(filename).display());
            }
            if args.show {
                controller.show_pdf()?;
            }
            Ok(())
        }
        (_, _, Some(err)) => Err(anyhow::Error::new(err).context(format!(
            "failed to render {}",
            args.template
        ))),
        (dispatch, _, _) => Err(anyhow::anyhow!("render produced no document ({dispatch:?})")),
    };

    controller.dispose();
    worker.shutdown().await;
    outcome
}

/// Print the known template identifiers
pub fn list_templates() {
    for id in TemplateId::ALL {
        println!("{id}");
    }
}
