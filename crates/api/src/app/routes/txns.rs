use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use lotledger_core::TxnId;

use crate::app::{AppState, dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(post_transaction))
        .route("/:id", get(get_transaction))
        .route("/:id/reverse", post(reverse_transaction))
}

pub async fn post_transaction(
    Extension(state): Extension<Arc<AppState>>,
    Extension(actor): Extension<crate::context::ActorContext>,
    Json(body): Json<dto::PostTransactionRequest>,
) -> axum::response::Response {
    let req = match dto::to_post_request(body, actor.actor().clone()) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.service.post(req) {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_transaction(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: TxnId = match dto::parse_id(&id, "transaction id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.service.get_transaction(id) {
        Ok(txn) => (StatusCode::OK, Json(txn)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn reverse_transaction(
    Extension(state): Extension<Arc<AppState>>,
    Extension(actor): Extension<crate::context::ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReverseRequest>,
) -> axum::response::Response {
    let id: TxnId = match dto::parse_id(&id, "transaction id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state
        .service
        .reverse(id, actor.actor().clone(), &body.reason)
    {
        Ok(txn) => (StatusCode::CREATED, Json(txn)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}
