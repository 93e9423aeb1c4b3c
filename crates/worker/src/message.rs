use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use crate::blob::BlobUrl;
use crate::error::Result;

/// Render job sent to the worker
///
/// Props are plain JSON so the request can cross any message boundary.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RenderRequest {
    /// Worker-assigned, increasing per worker
    pub request_id: u64,
    pub template_id: String,
    pub props: serde_json::Value,
}

/// Message from callers to the worker loop
#[derive(Debug)]
pub(crate) enum WorkerMessage {
    Render {
        request: RenderRequest,
        reply: oneshot::Sender<Result<BlobUrl>>,
    },
}
