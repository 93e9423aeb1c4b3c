use template::TemplateError;
use thiserror::Error;

/// Errors reported by the render worker
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkerError {
    #[error("template not found: {0}")]
    TemplateNotFound(String),

    #[error("render failed: {0}")]
    Render(String),

    #[error("worker transport failed: {0}")]
    Transport(String),

    #[error("render worker has been shut down")]
    Disposed,
}

impl From<TemplateError> for WorkerError {
    fn from(err: TemplateError) -> Self {
        match err {
            TemplateError::NotFound(name) => WorkerError::TemplateNotFound(name),
            other => WorkerError::Render(other.to_string()),
        }
    }
}

/// Result type for worker operations
pub type Result<T> = std::result::Result<T, WorkerError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_template_errors_map() {
        assert_eq!(
            WorkerError::from(TemplateError::NotFound("InvoicePDF".to_string())),
            WorkerError::TemplateNotFound("InvoicePDF".to_string())
        );

        let err = WorkerError::from(TemplateError::InvalidProps {
            template: "ContractPDF".to_string(),
            reason: "missing field `title`".to_string(),
        });
        assert_eq!(
            err.to_string(),
            "render failed: Invalid props for ContractPDF: missing field `title`"
        );
    }
}
