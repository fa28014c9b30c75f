//! Authentication filter.
//!
//! Attaches an `AuthContext` to every request. A missing, malformed,
//! expired or otherwise invalid token leaves the request anonymous; the
//! access decision belongs to downstream authorization, so public and
//! protected routes share one chain.

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request},
    middleware::Next,
    response::Response,
};

use crate::auth::AuthContext;
use crate::gateway::server::AppState;

/// Identity headers forwarded to upstreams for authenticated callers.
/// Inbound copies are stripped here so callers cannot spoof them.
pub const X_AUTH_SUBJECT: &str = "x-auth-subject";
pub const X_AUTH_ROLES: &str = "x-auth-roles";

pub async fn authentication_filter(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    request.headers_mut().remove(X_AUTH_SUBJECT);
    request.headers_mut().remove(X_AUTH_ROLES);

    let context = match bearer_token(request.headers()) {
        Some(token) => match state.verifier.verify(token) {
            Ok(claims) => {
                tracing::debug!(subject = %claims.sub, "Caller authenticated");
                AuthContext::Authenticated(claims)
            }
            Err(e) => {
                tracing::debug!(error = %e, "Token rejected; continuing anonymously");
                AuthContext::Anonymous
            }
        },
        None => AuthContext::Anonymous,
    };

    request.extensions_mut().insert(context);
    next.run(request).await
}

/// Extract the raw credential from `Authorization: Bearer <token>`. Any
/// other scheme, or no header at all, is treated as anonymous.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}
