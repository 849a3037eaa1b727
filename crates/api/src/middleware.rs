//! Actor-context middleware.
//!
//! Authentication is an external collaborator: something upstream (gateway,
//! auth proxy) has already resolved the caller to an actor identity and
//! forwards it in `x-actor-*` headers. This middleware materializes that
//! identity into an [`ActorContext`] extension and rejects requests that
//! arrive without one.

use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use lotledger_core::{Actor, ActorId};

use crate::context::ActorContext;

pub async fn actor_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let actor = extract_actor(req.headers())?;
    req.extensions_mut().insert(ActorContext::new(actor));
    Ok(next.run(req).await)
}

fn extract_actor(headers: &HeaderMap) -> Result<Actor, StatusCode> {
    let id: ActorId = header_str(headers, "x-actor-id")?
        .parse()
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    let name = header_str(headers, "x-actor-name")?;

    let mut actor = Actor::new(id, name);
    if let Some(email) = optional_header_str(headers, "x-actor-email") {
        actor = actor.with_email(email);
    }
    if let Some(role) = optional_header_str(headers, "x-actor-role") {
        actor = actor.with_role(role);
    }
    Ok(actor)
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Result<&'a str, StatusCode> {
    let value = headers
        .get(name)
        .ok_or(StatusCode::UNAUTHORIZED)?
        .to_str()
        .map_err(|_| StatusCode::UNAUTHORIZED)?
        .trim();

    if value.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(value)
}

fn optional_header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    let value = headers.get(name)?.to_str().ok()?.trim();
    if value.is_empty() { None } else { Some(value) }
}
