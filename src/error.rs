use std::collections::BTreeMap;

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::Serialize;

/// Field name to human readable messages, the shape 422 responses carry.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

const OVERLAP_CONSTRAINT: &str = "bookings_no_overlap";
const REFERENCE_CONSTRAINT: &str = "bookings_booking_reference_key";

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("the given data was invalid")]
    Validation(FieldErrors),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("room {0} not found")]
    RoomNotFound(i64),
    #[error("room is not available for the requested stay")]
    RoomUnavailable,
    #[error("booking cannot be cancelled: {0}")]
    CancellationNotAllowed(&'static str),
    #[error("authentication required")]
    Unauthorized,
    #[error("administrator access required")]
    Forbidden,
    #[error("payment proof is required")]
    MissingFile,
    #[error("payment proof exceeds the {limit} byte limit")]
    FileTooLarge { limit: usize },
    #[error("payment proof must be a jpeg, jpg, png or pdf file")]
    UnsupportedFileType,
    #[error("failed to store file: {0}")]
    StorageWrite(#[source] std::io::Error),
    #[error("failed to read file: {0}")]
    StorageRead(#[source] std::io::Error),
    #[error("could not allocate a unique booking reference")]
    ReferenceCollision,
    #[error("corrupt record: {0}")]
    CorruptRecord(String),
    #[error("database error: {0}")]
    Database(DieselError),
    #[error("connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),
}

impl AppError {
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_owned(), vec![message.into()]);
        AppError::Validation(errors)
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        let mapped = match &err {
            DieselError::NotFound => Some(AppError::NotFound("record")),
            DieselError::DatabaseError(kind, info) => match (kind, info.constraint_name()) {
                (DatabaseErrorKind::UniqueViolation, Some(REFERENCE_CONSTRAINT)) => {
                    Some(AppError::ReferenceCollision)
                }
                (_, Some(OVERLAP_CONSTRAINT)) => Some(AppError::RoomUnavailable),
                _ => None,
            },
            _ => None,
        };
        mapped.unwrap_or(AppError::Database(err))
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::MissingFile
            | AppError::FileTooLarge { .. }
            | AppError::UnsupportedFileType => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) | AppError::RoomNotFound(_) => StatusCode::NOT_FOUND,
            AppError::RoomUnavailable | AppError::CancellationNotAllowed(_) => {
                StatusCode::CONFLICT
            }
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::ReferenceCollision => StatusCode::SERVICE_UNAVAILABLE,
            AppError::StorageWrite(_)
            | AppError::StorageRead(_)
            | AppError::CorruptRecord(_)
            | AppError::Database(_)
            | AppError::Pool(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("request failed: {:?}", self);
        }

        let file_errors;
        let errors = match self {
            AppError::Validation(errors) => Some(errors),
            AppError::MissingFile | AppError::FileTooLarge { .. } | AppError::UnsupportedFileType => {
                let mut map = FieldErrors::new();
                map.insert("paymentProof".to_owned(), vec![self.to_string()]);
                file_errors = map;
                Some(&file_errors)
            }
            _ => None,
        };

        let message = if status.is_server_error() {
            "internal server error".to_owned()
        } else {
            self.to_string()
        };

        HttpResponse::build(status).json(ErrorBody { message, errors })
    }
}
