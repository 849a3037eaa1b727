//! Environment-driven configuration.

use lotledger_infra::service::LedgerConfig;
use lotledger_ledger::NegativeStockPolicy;

/// API process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind address, `LOTLEDGER_ADDR` (default `0.0.0.0:8080`).
    pub addr: String,
    pub ledger: LedgerConfig,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let addr = std::env::var("LOTLEDGER_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let negative_stock = match std::env::var("LOTLEDGER_NEGATIVE_STOCK") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring LOTLEDGER_NEGATIVE_STOCK; using 'reject'");
                NegativeStockPolicy::Reject
            }),
            Err(_) => NegativeStockPolicy::Reject,
        };

        let max_commit_retries = std::env::var("LOTLEDGER_COMMIT_RETRIES")
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(LedgerConfig::default().max_commit_retries);

        Self {
            addr,
            ledger: LedgerConfig {
                negative_stock,
                max_commit_retries,
            },
        }
    }
}
