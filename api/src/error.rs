//! The error taxonomy bound to HTTP: one `ApiError` every handler's
//! `Result` resolves to, following the `{"success": false, "message": ...}`
//! response envelope.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use db::errors::{
    BulkInsertGamesError, CreateSeasonError, CreateVenueError, DeleteVenueError,
    FindConflictsAtError, LoadOfficialsError, PublishScheduleError, RescheduleGameError,
    SeasonNameValidationError, StoreError,
};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
    #[error("{0}")]
    Conflict(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("rate limited, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },
    #[error("upstream service unavailable: {0}")]
    Transient(String),
    #[error("internal error: {0}")]
    Fatal(String),
}

impl ApiError {
    fn kind(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION",
            ApiError::NotFound { .. } => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::RateLimited { .. } => "RATE_LIMITED",
            ApiError::Transient(_) => "TRANSIENT",
            ApiError::Fatal(_) => "FATAL",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Transient(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Fatal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut builder = HttpResponse::build(self.status_code());
        if let ApiError::RateLimited { retry_after_secs } = self {
            builder.insert_header(("Retry-After", retry_after_secs.to_string()));
        }
        builder.json(Envelope::<()>::error(self.kind(), self.to_string()))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(msg) => ApiError::Validation(msg),
            StoreError::NotFound { entity, id } => ApiError::NotFound {
                entity,
                id: id.to_string(),
            },
            StoreError::Conflict(msg) => ApiError::Conflict(msg),
            StoreError::Fatal(err) => ApiError::Fatal(err.to_string()),
        }
    }
}

impl From<CreateSeasonError> for ApiError {
    fn from(err: CreateSeasonError) -> Self {
        match err {
            CreateSeasonError::Validation(v) => ApiError::Validation(v.to_string()),
            CreateSeasonError::DatabaseError(msg) => ApiError::Fatal(msg),
        }
    }
}

impl From<SeasonNameValidationError> for ApiError {
    fn from(err: SeasonNameValidationError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

impl From<CreateVenueError> for ApiError {
    fn from(err: CreateVenueError) -> Self {
        match err {
            CreateVenueError::NoDatabase => ApiError::Fatal(err.to_string()),
            CreateVenueError::EmptyName => ApiError::Validation(err.to_string()),
            CreateVenueError::DatabaseError(msg) => ApiError::Fatal(msg),
        }
    }
}

impl From<DeleteVenueError> for ApiError {
    fn from(err: DeleteVenueError) -> Self {
        match err {
            DeleteVenueError::NotFound(id) => ApiError::NotFound {
                entity: "venue",
                id: id.to_string(),
            },
            DeleteVenueError::StillReferenced(_) => ApiError::Conflict(err.to_string()),
            DeleteVenueError::DatabaseError(msg) => ApiError::Fatal(msg),
        }
    }
}

impl From<BulkInsertGamesError> for ApiError {
    fn from(err: BulkInsertGamesError) -> Self {
        match err {
            BulkInsertGamesError::SeasonNotFound(id) => ApiError::NotFound {
                entity: "season",
                id: id.to_string(),
            },
            BulkInsertGamesError::UnknownForeignKey(_) => ApiError::Fatal(err.to_string()),
            BulkInsertGamesError::TransactionFailed { .. } => ApiError::Fatal(err.to_string()),
        }
    }
}

impl From<PublishScheduleError> for ApiError {
    fn from(err: PublishScheduleError) -> Self {
        match err {
            PublishScheduleError::CacheEmpty(id) => {
                ApiError::Conflict(format!("no cached plan for season {id}; generate first"))
            }
            PublishScheduleError::SeasonNotFound(id) => ApiError::NotFound {
                entity: "season",
                id: id.to_string(),
            },
            PublishScheduleError::Insert(inner) => inner.into(),
        }
    }
}

impl From<RescheduleGameError> for ApiError {
    fn from(err: RescheduleGameError) -> Self {
        match err {
            RescheduleGameError::NotFound(id) => ApiError::NotFound {
                entity: "game",
                id: id.to_string(),
            },
            RescheduleGameError::WouldConflict { .. } => ApiError::Conflict(err.to_string()),
            RescheduleGameError::DatabaseError(msg) => ApiError::Fatal(msg),
        }
    }
}

impl From<FindConflictsAtError> for ApiError {
    fn from(err: FindConflictsAtError) -> Self {
        match err {
            FindConflictsAtError::VenueNotFound(id) => ApiError::NotFound {
                entity: "venue",
                id: id.to_string(),
            },
            FindConflictsAtError::DatabaseError(msg) => ApiError::Fatal(msg),
        }
    }
}

impl From<LoadOfficialsError> for ApiError {
    fn from(err: LoadOfficialsError) -> Self {
        match err {
            LoadOfficialsError::DatabaseError(msg) => ApiError::Fatal(msg),
        }
    }
}

/// The `{timestamp, success, ...}` response envelope.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub success: bool,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Envelope {
            success: true,
            timestamp: chrono::Utc::now().to_rfc3339(),
            data: Some(data),
            message: None,
        }
    }

    pub fn error(kind: &str, message: String) -> Self {
        Envelope {
            success: false,
            timestamp: chrono::Utc::now().to_rfc3339(),
            data: None,
            message: Some(format!("[{kind}] {message}")),
        }
    }
}

pub fn api_not_found(entity: &'static str, id: uuid::Uuid) -> ApiError {
    ApiError::NotFound {
        entity,
        id: id.to_string(),
    }
}

pub fn ok_json<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope::ok(data))
}

pub fn created_json<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Created().json(Envelope::ok(data))
}

pub type ApiResult<T> = Result<T, ApiError>;

pub fn not_implemented(what: &str) -> HttpResponse {
    HttpResponse::NotImplemented().json(json!({
        "success": false,
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "message": format!("{what} is not implemented"),
    }))
}
