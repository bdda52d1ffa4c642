//! Copyright (c) 2025, Kirky.X
//!
//! MIT License
//!
//! 该模块定义了HTTP层的错误响应。

use crate::error::{ErrorCategory, SyncError};
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

/// HTTP错误响应
///
/// 响应体只包含分类消息，不暴露驱动细节
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiError {
    category: ErrorCategory,
}

impl ApiError {
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn status_code(&self) -> StatusCode {
        match self.category {
            ErrorCategory::NotFound => StatusCode::NOT_FOUND,
            ErrorCategory::BadRequest => StatusCode::BAD_REQUEST,
            ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<SyncError> for ApiError {
    fn from(err: SyncError) -> Self {
        let category = err.category();
        match category {
            ErrorCategory::Internal => error!("Request failed: {}", err),
            _ => warn!("Request rejected: {}", err),
        }
        Self { category }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("Malformed request body: {}", rejection.body_text());
        Self {
            category: ErrorCategory::BadRequest,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.category.message() }));
        (self.status_code(), body).into_response()
    }
}
