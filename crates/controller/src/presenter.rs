//! Where generated documents go when downloaded or shown

use std::path::PathBuf;
use std::process::Command;

use render_worker::{BlobStore, BlobUrl};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PresentError {
    #[error("blob is no longer available: {0}")]
    UnknownBlob(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to launch viewer `{program}`: {reason}")]
    Viewer { program: String, reason: String },
}

/// Delivers a published document to the user
pub trait DocumentPresenter: Send + Sync {
    /// Save the document under `filename`
    fn download(&self, url: &BlobUrl, filename: &str) -> Result<(), PresentError>;

    /// Open the document for viewing
    fn show(&self, url: &BlobUrl) -> Result<(), PresentError>;
}

/// External program used to open documents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ViewerCommand {
    /// Parse a whitespace-separated command line such as `xdg-open` or `open -a Preview`
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

/// Presenter backed by the local filesystem
///
/// Downloads are written into `output_dir`. Showing writes a viewing copy
/// into the system temp directory and hands it to the viewer, if one is set.
#[derive(Debug, Clone)]
pub struct FsPresenter {
    blobs: BlobStore,
    output_dir: PathBuf,
    viewer: Option<ViewerCommand>,
}

impl FsPresenter {
    pub fn new(blobs: BlobStore, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            blobs,
            output_dir: output_dir.into(),
            viewer: None,
        }
    }

    pub fn with_viewer(mut self, viewer: Option<ViewerCommand>) -> Self {
        self.viewer = viewer;
        self
    }

    pub fn output_dir(&self) -> &PathBuf {
        &self.output_dir
    }

    fn bytes(&self, url: &BlobUrl) -> Result<std::sync::Arc<Vec<u8>>, PresentError> {
        self.blobs
            .get(url)
            .map(|blob| blob.bytes)
            .ok_or_else(|| PresentError::UnknownBlob(url.to_string()))
    }

    /// Path a viewing copy of `url` is written to
    pub fn view_path(&self, url: &BlobUrl) -> PathBuf {
        std::env::temp_dir().join(format!("dashdoc-view-{}.pdf", url.suffix()))
    }
}

impl DocumentPresenter for FsPresenter {
    fn download(&self, url: &BlobUrl, filename: &str) -> Result<(), PresentError> {
        let bytes = self.bytes(url)?;
        std::fs::create_dir_all(&self.output_dir)?;

        let path = self.output_dir.join(filename);
        std::fs::write(&path, bytes.as_slice())?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "document downloaded");
        Ok(())
    }

    fn show(&self, url: &BlobUrl) -> Result<(), PresentError> {
        let bytes = self.bytes(url)?;
        let path = self.view_path(url);
        std::fs::write(&path, bytes.as_slice())?;

        let Some(viewer) = &self.viewer else {
            tracing::info!(path = %path.display(), "no viewer configured; document written");
            return Ok(());
        };

        Command::new(&viewer.program)
            .args(&viewer.args)
            .arg(&path)
            .spawn()
            .map_err(|err| PresentError::Viewer {
                program: viewer.program.clone(),
                reason: err.to_string(),
            })?;
        tracing::info!(path = %path.display(), viewer = %viewer.program, "document opened");
        Ok(())
    }
}
