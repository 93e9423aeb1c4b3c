//! Progress notifications from the worker loop

use std::fmt;
use std::sync::{Arc, RwLock};

use template::TemplateId;

use crate::blob::BlobUrl;
use crate::error::WorkerError;

/// Stage reached by a render request
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressKind {
    Received { template_id: String },
    Resolved { template: TemplateId },
    Rendered { bytes: usize },
    Published { url: BlobUrl },
    Failed { error: WorkerError },
}

/// A progress notification for one request
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressEvent {
    pub request_id: u64,
    pub kind: ProgressKind,
}

impl ProgressEvent {
    /// Whether this is the last event of its request
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.kind,
            ProgressKind::Published { .. } | ProgressKind::Failed { .. }
        )
    }
}

impl fmt::Display for ProgressEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[render {}] ", self.request_id)?;
        match &self.kind {
            ProgressKind::Received { template_id } => write!(f, "received {template_id}"),
            ProgressKind::Resolved { template } => write!(f, "resolved {template}"),
            ProgressKind::Rendered { bytes } => write!(f, "rendered {bytes} bytes"),
            ProgressKind::Published { url } => write!(f, "published {url}"),
            ProgressKind::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

type Callback = Arc<dyn Fn(&ProgressEvent) + Send + Sync>;

/// Registered progress callbacks
///
/// Delivery is best effort and synchronous on the worker task, so callbacks
/// must not block.
#[derive(Clone, Default)]
pub struct ProgressSinks {
    callbacks: Arc<RwLock<Vec<Callback>>>,
}

impl ProgressSinks {
    pub fn register<F>(&self, callback: F)
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        if let Ok(mut callbacks) = self.callbacks.write() {
            callbacks.push(Arc::new(callback));
        }
    }

    pub fn emit(&self, event: ProgressEvent) {
        tracing::trace!(request_id = event.request_id, "{event}");

        // Snapshot so a callback may register another without deadlocking
        let callbacks: Vec<Callback> = match self.callbacks.read() {
            Ok(callbacks) => callbacks.clone(),
            Err(_) => return,
        };
        for callback in callbacks {
            callback(&event);
        }
    }
}

impl fmt::Debug for ProgressSinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.callbacks.read().map(|c| c.len()).unwrap_or(0);
        f.debug_struct("ProgressSinks")
            .field("callbacks", &count)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[test]
    fn test_display() {
        let event = ProgressEvent {
            request_id: 3,
            kind: ProgressKind::Rendered { bytes: 2048 },
        };
        assert_eq!(event.to_string(), "[render 3] rendered 2048 bytes");
        assert!(!event.is_terminal());

        let failed = ProgressEvent {
            request_id: 4,
            kind: ProgressKind::Failed {
                error: WorkerError::TemplateNotFound("X".to_string()),
            },
        };
        assert_eq!(failed.to_string(), "[render 4] failed: template not found: X");
        assert!(failed.is_terminal());
    }

    #[test]
    fn test_every_sink_receives_events() {
        let sinks = ProgressSinks::default();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b"] {
            let seen = Arc::clone(&seen);
            sinks.register(move |event| {
                seen.lock().unwrap().push(format!("{tag}{}", event.request_id));
            });
        }

        sinks.emit(ProgressEvent {
            request_id: 1,
            kind: ProgressKind::Received {
                template_id: "ContractPDF".to_string(),
            },
        });
        assert_eq!(*seen.lock().unwrap(), vec!["a1", "b1"]);
    }
}
