use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};

use lotledger_core::{ItemId, LotId};
use lotledger_infra::audit::AuditStore;
use lotledger_infra::ledger_store::{Pagination, TxnFilter};

use crate::app::{AppState, dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_item))
        .route("/:id", get(get_item).delete(delete_item))
        .route("/:id/lots", post(add_lot))
        .route("/:id/lots/:lot_id", delete(remove_lot))
        .route("/:id/lots/:lot_id/history", get(lot_history))
        .route("/:id/transactions", get(list_transactions))
        .route("/:id/stats", get(item_stats))
        .route("/:id/audit", get(item_audit))
}

pub async fn create_item(
    Extension(state): Extension<Arc<AppState>>,
    Json(body): Json<dto::CreateItemRequest>,
) -> axum::response::Response {
    let item_type = match dto::parse_item_type(&body.item_type) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let bom = match dto::to_bom(body.bom) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state
        .service
        .create_item(&body.sku, &body.name, item_type, &body.uom, bom)
    {
        Ok(item) => (StatusCode::CREATED, Json(item)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn get_item(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id, "item id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.service.get_item(id) {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn delete_item(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id, "item id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.service.delete_item(id) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn add_lot(
    Extension(state): Extension<Arc<AppState>>,
    Extension(actor): Extension<crate::context::ActorContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AddLotRequest>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id, "item id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.service.add_lot(
        id,
        &body.lot_number,
        body.expires_at,
        body.opening_qty,
        actor.actor().clone(),
    ) {
        Ok((item, opening_txn)) => (
            StatusCode::CREATED,
            Json(serde_json::json!({
                "item": item,
                "opening_txn": opening_txn,
            })),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn remove_lot(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, lot_id)): Path<(String, String)>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id, "item id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let lot_id: LotId = match dto::parse_id(&lot_id, "lot id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.service.remove_lot(id, lot_id) {
        Ok(item) => (StatusCode::OK, Json(item)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn list_transactions(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<dto::ListTxnsQuery>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id, "item id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let txn_type = match query.txn_type.as_deref() {
        Some(raw) => match dto::parse_txn_type(raw) {
            Ok(v) => Some(v),
            Err(resp) => return resp,
        },
        None => None,
    };

    let filter = TxnFilter {
        txn_type,
        posted_after: query.after,
        posted_before: query.before,
    };
    let pagination = Pagination::new(query.limit, query.offset);

    match state.service.list_by_item(id, &filter, pagination) {
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn item_stats(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<dto::StatsQuery>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id, "item id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.service.item_stats(id, query.after, query.before) {
        Ok(stats) => (StatusCode::OK, Json(stats)).into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn lot_history(
    Extension(state): Extension<Arc<AppState>>,
    Path((id, lot_id)): Path<(String, String)>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id, "item id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let lot_id: LotId = match dto::parse_id(&lot_id, "lot id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.service.lot_history(id, lot_id) {
        Ok(entries) => (
            StatusCode::OK,
            Json(serde_json::json!({ "entries": entries })),
        )
            .into_response(),
        Err(e) => errors::ledger_error_to_response(e),
    }
}

pub async fn item_audit(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ItemId = match dto::parse_id(&id, "item id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.audit.for_item(id) {
        Ok(entries) => (
            StatusCode::OK,
            Json(serde_json::json!({ "entries": entries })),
        )
            .into_response(),
        Err(e) => errors::json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            e.to_string(),
        ),
    }
}
