use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::errors::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentFormat {
    Manual,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum DocumentType {
    #[serde(rename = "LP_INTRODUCE_GOODS")]
    LpIntroduceGoods,
}

/// Body of a document creation call.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CreateDocumentRequest {
    pub document_format: DocumentFormat,
    pub product_document: String, // Base64 encoded JSON document
    pub signature: String,
    #[serde(rename = "type")]
    pub document_type: DocumentType,
}

impl CreateDocumentRequest {
    /// Serializes `document` to JSON and wraps it as a base64 product document.
    pub fn new<D: Serialize + ?Sized>(document: &D, signature: &str) -> Result<Self, ApiError> {
        let json = serde_json::to_vec(document)?;
        Ok(Self {
            document_format: DocumentFormat::Manual,
            product_document: base64::engine::general_purpose::STANDARD.encode(json),
            signature: signature.to_string(),
            document_type: DocumentType::LpIntroduceGoods,
        })
    }
}
