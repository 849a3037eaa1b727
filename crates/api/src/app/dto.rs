//! Request DTOs and parsing helpers.
//!
//! Quantities are typed `i64` end to end, so non-numeric input dies at JSON
//! deserialization; the ledger core only sees well-formed numbers.

use core::str::FromStr;

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use lotledger_catalog::{BomComponent, ItemType};
use lotledger_core::{Actor, ItemId, LedgerError};
use lotledger_ledger::{LineRequest, PostRequest, TxnType};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub sku: String,
    pub name: String,
    pub item_type: String,
    pub uom: String,
    #[serde(default)]
    pub bom: Vec<BomComponentRequest>,
}

#[derive(Debug, Deserialize)]
pub struct BomComponentRequest {
    pub component: String,
    pub qty: i64,
    pub uom: String,
}

#[derive(Debug, Deserialize)]
pub struct AddLotRequest {
    pub lot_number: String,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub opening_qty: i64,
}

#[derive(Debug, Deserialize)]
pub struct PostLineRequest {
    pub item_id: String,
    pub lot_id: Option<String>,
    pub qty: i64,
    pub unit_cost: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct PostTransactionRequest {
    pub txn_type: String,
    pub lines: Vec<PostLineRequest>,
    pub effective_date: Option<DateTime<Utc>>,
    pub memo: Option<String>,
    pub project: Option<String>,
    pub department: Option<String>,
    pub batch_id: Option<String>,
    pub work_order_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReverseRequest {
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ListTxnsQuery {
    pub txn_type: Option<String>,
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct StatsQuery {
    pub after: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_id<T>(raw: &str, what: &'static str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = LedgerError>,
{
    raw.parse().map_err(|_| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_id",
            format!("invalid {what}"),
        )
    })
}

pub fn parse_item_type(s: &str) -> Result<ItemType, axum::response::Response> {
    match s.to_lowercase().as_str() {
        "chemical" => Ok(ItemType::Chemical),
        "solution" => Ok(ItemType::Solution),
        "product" => Ok(ItemType::Product),
        _ => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_item_type",
            "item_type must be one of: chemical, solution, product",
        )),
    }
}

pub fn parse_txn_type(s: &str) -> Result<TxnType, axum::response::Response> {
    match s.to_lowercase().as_str() {
        "receipt" => Ok(TxnType::Receipt),
        "issue" => Ok(TxnType::Issue),
        "adjustment" => Ok(TxnType::Adjustment),
        "build" => Ok(TxnType::Build),
        "reversal" => Ok(TxnType::Reversal),
        _ => Err(errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_txn_type",
            "txn_type must be one of: receipt, issue, adjustment, build",
        )),
    }
}

pub fn to_bom(components: Vec<BomComponentRequest>) -> Result<Vec<BomComponent>, axum::response::Response> {
    components
        .into_iter()
        .map(|c| {
            let component: ItemId = parse_id(&c.component, "bom component item id")?;
            Ok(BomComponent {
                component,
                qty: c.qty,
                uom: c.uom,
            })
        })
        .collect()
}

pub fn to_post_request(
    body: PostTransactionRequest,
    actor: Actor,
) -> Result<PostRequest, axum::response::Response> {
    let txn_type = parse_txn_type(&body.txn_type)?;

    let lines = body
        .lines
        .into_iter()
        .map(|l| {
            let item_id = parse_id(&l.item_id, "item id")?;
            let lot_id = l
                .lot_id
                .as_deref()
                .map(|raw| parse_id(raw, "lot id"))
                .transpose()?;
            Ok(LineRequest {
                item_id,
                lot_id,
                qty: l.qty,
                unit_cost: l.unit_cost,
            })
        })
        .collect::<Result<Vec<_>, axum::response::Response>>()?;

    Ok(PostRequest {
        txn_type,
        lines,
        actor,
        effective_date: body.effective_date,
        memo: body.memo,
        project: body.project,
        department: body.department,
        batch_id: body.batch_id,
        work_order_id: body.work_order_id,
    })
}
