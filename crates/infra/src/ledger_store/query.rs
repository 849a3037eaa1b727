//! Transaction query types for the ledger reader.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use lotledger_ledger::{Transaction, TxnType};

/// Pagination parameters.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of transactions to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50, // Safe default
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).min(1000), // Cap at 1000 for safety
            offset: offset.unwrap_or(0),
        }
    }
}

/// Filter criteria for item-scoped transaction listings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TxnFilter {
    pub txn_type: Option<TxnType>,
    /// Only transactions posted strictly after this instant.
    pub posted_after: Option<DateTime<Utc>>,
    /// Only transactions posted strictly before this instant.
    pub posted_before: Option<DateTime<Utc>>,
}

impl TxnFilter {
    pub fn matches(&self, txn: &Transaction) -> bool {
        if let Some(t) = self.txn_type {
            if txn.txn_type != t {
                return false;
            }
        }
        if let Some(after) = self.posted_after {
            if txn.posted_at <= after {
                return false;
            }
        }
        if let Some(before) = self.posted_before {
            if txn.posted_at >= before {
                return false;
            }
        }
        true
    }
}

/// Paginated transaction query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxnQueryResult {
    /// Matching transactions (item-scoped lines), newest first.
    pub transactions: Vec<Transaction>,
    /// Total number matching the filter (across all pages).
    pub total: u64,
    pub pagination: Pagination,
    pub has_more: bool,
}
