//! Negative-stock policy.
//!
//! The source systems this ledger replaces were inconsistent about negative
//! resulting quantities (some call sites rejected them, some silently allowed
//! oversell). Here the policy is explicit and configurable, and it applies
//! uniformly to postings and reversals.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use lotledger_core::LedgerError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NegativeStockPolicy {
    /// Reject any posting whose resulting lot or item quantity is negative.
    #[default]
    Reject,
    /// Allow negative results and record a `StockAnomaly` per offending line
    /// on the committed transaction.
    AllowAndFlag,
}

impl FromStr for NegativeStockPolicy {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "reject" => Ok(Self::Reject),
            "allow" | "allow_and_flag" => Ok(Self::AllowAndFlag),
            other => Err(LedgerError::validation(format!(
                "unknown negative-stock policy '{other}' (expected 'reject' or 'allow')"
            ))),
        }
    }
}
