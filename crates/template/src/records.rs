//! Dashboard API envelopes

use crate::{Result, TemplateError};
use serde::{Deserialize, Serialize};

/// Uniform response envelope returned by the dashboard REST endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Vec::new")]
    pub data: Vec<T>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub errors: Option<Vec<String>>,
    #[serde(default)]
    pub page: Option<PageInfo>,
}

/// Pagination details for list endpoints
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub total_pages: u32,
}

impl<T> ApiResponse<T> {
    /// Fail unless the endpoint reported success
    pub fn into_result(self) -> Result<Vec<T>> {
        if self.success {
            return Ok(self.data);
        }

        let mut reason = self
            .message
            .unwrap_or_else(|| "request failed".to_string());
        if let Some(errors) = self.errors.filter(|e| !e.is_empty()) {
            reason = format!("{reason}: {}", errors.join("; "));
        }
        Err(TemplateError::ApiError(reason))
    }

    /// First record of a successful response
    pub fn into_single(self) -> Result<T> {
        self.into_result()?
            .into_iter()
            .next()
            .ok_or_else(|| TemplateError::ApiError("response contained no records".to_string()))
    }
}
