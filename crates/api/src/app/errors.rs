use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use lotledger_core::LedgerError;

pub fn ledger_error_to_response(err: LedgerError) -> axum::response::Response {
    let (status, code) = match &err {
        LedgerError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        LedgerError::InvalidId(_) => (StatusCode::BAD_REQUEST, "invalid_id"),
        LedgerError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
        LedgerError::AlreadyReversed(_) => (StatusCode::CONFLICT, "already_reversed"),
        LedgerError::ConcurrencyConflict(_) => (StatusCode::CONFLICT, "conflict"),
        LedgerError::InsufficientQuantity { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_quantity")
        }
        LedgerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
    };
    json_error(status, code, err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
