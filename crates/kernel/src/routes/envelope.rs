//! JSON response envelopes.

use axum::Json;
use serde::Serialize;

use crate::listing::{ItemView, ListPage, PageInfo};

/// Envelope for single-object and plain-list responses.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            data,
        })
    }
}

/// Envelope for paginated item listings.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub success: bool,
    pub message: String,
    pub pagination: PageInfo,
    pub data: Vec<ItemView>,
}

impl ListResponse {
    pub fn from_page(message: impl Into<String>, page: ListPage) -> Json<Self> {
        Json(Self {
            success: true,
            message: message.into(),
            pagination: page.pagination,
            data: page.items,
        })
    }
}
