// ABOUTME: axum IntoResponse implementation for AppError
// ABOUTME: Maps error codes to HTTP statuses with a flat JSON error body
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use super::{AppError, ErrorCode};

/// HTTP error response body
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// User-facing message
    pub error: String,
    /// Machine-readable code
    pub code: ErrorCode,
}

impl From<&AppError> for ErrorResponse {
    fn from(error: &AppError) -> Self {
        Self {
            error: error.user_message().to_owned(),
            code: error.code,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status.is_server_error() {
            error!(code = ?self.code, error = %self, source = ?self.source, "Request failed");
        } else {
            warn!(code = ?self.code, message = %self.message, "Request rejected");
        }

        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}
