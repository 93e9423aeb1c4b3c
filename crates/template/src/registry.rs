//! Template lookup by identifier

use crate::contract::{contract_document, ContractProps};
use crate::renderer::LayoutRenderer;
use crate::schema::DocumentSpec;
use crate::{Result, TemplateError};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Known document templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateId {
    /// Contract record rendered with the built-in contract layout
    ContractPdf,
    /// Caller-supplied document description plus binding data
    DocumentPdf,
}

impl TemplateId {
    pub const ALL: [TemplateId; 2] = [TemplateId::ContractPdf, TemplateId::DocumentPdf];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::ContractPdf => "ContractPDF",
            TemplateId::DocumentPdf => "DocumentPDF",
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateId {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self> {
        TemplateId::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| TemplateError::NotFound(s.to_string()))
    }
}

/// Props accepted by the generic document template
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentProps {
    pub document: DocumentSpec,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Resolves template identifiers and renders props to PDF bytes
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateRegistry;

impl TemplateRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Identifiers this registry can render
    pub fn templates(&self) -> &'static [TemplateId] {
        &TemplateId::ALL
    }

    /// Build the document description for a template without rendering it
    pub fn document(
        &self,
        id: TemplateId,
        props: &serde_json::Value,
    ) -> Result<(DocumentSpec, serde_json::Value)> {
        match id {
            TemplateId::ContractPdf => {
                let props: ContractProps = decode(id, props)?;
                Ok((
                    contract_document(&props.contract),
                    serde_json::Value::Null,
                ))
            }
            TemplateId::DocumentPdf => {
                let props: DocumentProps = decode(id, props)?;
                Ok((props.document, props.data))
            }
        }
    }

    /// Render a template to PDF bytes
    pub fn render(&self, id: TemplateId, props: &serde_json::Value) -> Result<Vec<u8>> {
        let (spec, data) = self.document(id, props)?;
        LayoutRenderer::new(&spec).render_to_bytes(&data)
    }

    /// Render a template named by its string identifier
    pub fn render_by_name(&self, name: &str, props: &serde_json::Value) -> Result<Vec<u8>> {
        self.render(name.parse()?, props)
    }
}

fn decode<T: DeserializeOwned>(id: TemplateId, props: &serde_json::Value) -> Result<T> {
    T::deserialize(props).map_err(|e| TemplateError::InvalidProps {
        template: id.to_string(),
        reason: e.to_string(),
    })
}
