//! Response envelopes shared by the REST API.
//!
//! These are shapes only. The gateway decodes bodies into whatever type the
//! caller asks for; `ApiResponse<T>` is the envelope most endpoints use.

use serde::{Deserialize, Serialize};

/// Standard response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

/// Envelope with an untyped payload.
pub type AnyApiResponse = ApiResponse<serde_json::Value>;

/// Paging information attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub page_size: u64,
    pub total_items: u64,
    pub total_pages: u64,
}

/// A downloaded file. Produced once per download; the caller owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobWithFileName {
    pub file_name: String,
    pub blob: Vec<u8>,
}
