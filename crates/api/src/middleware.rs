use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use matricula_auth::{MonitorDirectory, Role, authorize_bearer};

use crate::context::MonitorContext;

/// Shared state for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    pub directory: Arc<dyn MonitorDirectory>,
    /// Minimum role for the routes behind this middleware instance.
    pub required: Role,
}

/// Panel authentication: `Authorization: Bearer <email>` resolved against the
/// monitor directory, with the route group's minimum role enforced.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let header = authorization_header(req.headers());

    let monitor = authorize_bearer(state.directory.as_ref(), header, state.required)
        .map_err(|e| match e {
            matricula_auth::AuthError::Forbidden => StatusCode::FORBIDDEN,
            matricula_auth::AuthError::UnknownMonitor => StatusCode::FORBIDDEN,
            _ => StatusCode::UNAUTHORIZED,
        })?;

    req.extensions_mut().insert(MonitorContext::new(&monitor));

    Ok(next.run(req).await)
}

fn authorization_header(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}
