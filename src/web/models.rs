use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};
use log::{error, warn};
use serde::{Deserialize, Serialize};

use crate::core::error::ServiceError;
use crate::models::analytics::Period;
use crate::models::EpisodeStatus;
use crate::services::common::{Page, PageParams};

/// Envelope of every successful JSON response
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data: Some(data),
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data: Some(data),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: usize,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
}

/// Envelope of list responses
#[derive(Debug, Serialize, Deserialize)]
pub struct PaginatedResponse<T> {
    pub success: bool,
    pub data: Vec<T>,
    pub pagination: Pagination,
}

impl<T> From<Page<T>> for PaginatedResponse<T> {
    fn from(page: Page<T>) -> Self {
        Self {
            success: true,
            data: page.items,
            pagination: Pagination {
                page: page.page,
                limit: page.limit,
                total: page.total,
                total_pages: page.total_pages,
            },
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub error_code: String,
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ServiceError::ProcessingError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::ProviderError(_) => StatusCode::BAD_GATEWAY,
            ServiceError::PersistenceError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServiceError::Cancelled(_) => StatusCode::CONFLICT,
            ServiceError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        } else {
            warn!("Request rejected: {}", self);
        }
        HttpResponse::build(status).json(ErrorResponse {
            success: false,
            error: self.to_string(),
            error_code: self.code().to_string(),
        })
    }
}

/// Malformed JSON bodies are validation errors
pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    match err {
        JsonPayloadError::Overflow { .. } | JsonPayloadError::OverflowKnownLength { .. } => {
            ServiceError::PayloadTooLarge(err.to_string()).into()
        }
        _ => ServiceError::ValidationError(err.to_string()).into(),
    }
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ServiceError::ValidationError(err.to_string()).into()
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EpisodeListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<EpisodeStatus>,
    pub search: Option<String>,
}

impl EpisodeListQuery {
    pub fn page(&self) -> PageParams {
        PageParams {
            page: self.page,
            limit: self.limit,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DraftListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub episode_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExportListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub draft_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BrandVoiceListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub workspace_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkspaceQuery {
    pub workspace_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateDraftRequest {
    pub brand_voice_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadQuery {
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummaryQuery {
    #[serde(default)]
    pub date_range: Period,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PeriodQuery {
    #[serde(default)]
    pub period: Period,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetricQuery {
    pub metric: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedactionResponse {
    pub content: String,
    pub replacements: usize,
}

/// Outcome of a cascading delete
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeletedResponse {
    pub id: String,
    pub drafts_removed: usize,
    pub exports_removed: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    pub episode_id: String,
    pub cancelled: bool,
}
