use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Success,
    Error,
}

/// Pagination block of the response envelope.
#[derive(Debug, Serialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Meta {
    pub page: i64,
    pub total_pages: i64,
    pub total_items: i64,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total_items: i64) -> Self {
        let per_page = per_page.max(1);
        Self {
            page,
            total_pages: (total_items + per_page - 1) / per_page,
            total_items,
        }
    }
}

/// Payload of delete endpoints.
#[derive(Debug, Serialize, ToSchema, Clone, Copy, PartialEq, Eq)]
pub struct Deleted {
    pub id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub status: ResponseStatus,
    pub message: String,
    pub data: Option<T>,
    #[serde(rename = "pagination", skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            status: ResponseStatus::Success,
            message: message.into(),
            data: Some(data),
            meta,
        }
    }

    pub fn error(message: impl Into<String>, data: T) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: message.into(),
            data: Some(data),
            meta: None,
        }
    }
}
