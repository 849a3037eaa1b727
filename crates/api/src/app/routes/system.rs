use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(actor): Extension<crate::context::ActorContext>,
) -> impl IntoResponse {
    let actor = actor.actor();
    Json(serde_json::json!({
        "id": actor.id.to_string(),
        "name": actor.name,
        "email": actor.email,
        "role": actor.role,
    }))
}
