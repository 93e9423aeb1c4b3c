//! Template Engine - declarative documents and named templates
//!
//! This crate provides:
//! - Document description types and JSON parsing
//! - Layout with pagination, repeated table headers and footers
//! - The contract template
//! - A registry resolving template identifiers to renderers
//! - Data binding via JSONPath-like expressions
//!
//! # Example
//!
//! ```ignore
//! use template::{TemplateId, TemplateRegistry};
//!
//! let props = serde_json::json!({ "contract": contract });
//! let pdf_bytes = TemplateRegistry::new().render(TemplateId::ContractPdf, &props)?;
//! ```

pub mod blocks;
pub mod contract;
pub mod parser;
pub mod records;
mod registry;
mod renderer;
mod schema;

pub use contract::{contract_document, Clause, Contract, ContractProps};
pub use parser::parse_document;
pub use records::{ApiResponse, PageInfo};
pub use registry::{DocumentProps, TemplateId, TemplateRegistry};
pub use renderer::{LayoutRenderer, PageLayout};
pub use schema::*;

use thiserror::Error;

/// Errors that can occur during template processing
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("Failed to parse document: {0}")]
    ParseError(String),

    #[error("Render error: {0}")]
    RenderError(String),

    #[error("Template not found: {0}")]
    NotFound(String),

    #[error("Invalid props for {template}: {reason}")]
    InvalidProps { template: String, reason: String },

    #[error("Font error: {0}")]
    FontError(String),

    #[error("API error: {0}")]
    ApiError(String),

    #[error("PDF error: {0}")]
    PdfError(#[from] pdf_core::PdfError),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Result type for template operations
pub type Result<T> = std::result::Result<T, TemplateError>;
