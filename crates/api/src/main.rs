#[tokio::main]
async fn main() {
    lotledger_observability::init();

    let config = lotledger_api::config::AppConfig::from_env();
    tracing::info!(
        negative_stock = ?config.ledger.negative_stock,
        commit_retries = config.ledger.max_commit_retries,
        "starting lotledger"
    );

    let app = lotledger_api::app::build_app(&config);

    let listener = tokio::net::TcpListener::bind(&config.addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {e}", config.addr));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
