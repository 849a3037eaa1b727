use axum::{Router, routing::get};

pub mod items;
pub mod system;
pub mod txns;

/// Router for all actor-scoped endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/items", items::router())
        .nest("/transactions", txns::router())
}
