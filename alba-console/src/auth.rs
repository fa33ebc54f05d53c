use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;

use crate::app::AppState;

/// Guards the protected router: anonymous visitors are sent to the login
/// view with the requested location in `next`.
pub async fn require_session(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if state.session.is_authenticated() {
        return next.run(req).await;
    }

    let requested = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| "/".to_string());
    tracing::debug!("no session for {}, redirecting to login", requested);
    login_redirect(&requested).into_response()
}

pub fn login_redirect(requested: &str) -> Redirect {
    match sanitize_next(Some(requested)) {
        Some(next) if next != "/" => {
            Redirect::to(&format!("/login?next={}", urlencoding::encode(&next)))
        }
        _ => Redirect::to("/login"),
    }
}

/// Accepts only local absolute paths, and never the login view itself.
pub fn sanitize_next(next: Option<&str>) -> Option<String> {
    let next = next?.trim();
    if !next.starts_with('/') || next.starts_with("//") || next.starts_with("/\\") {
        return None;
    }
    let path = next.split(['?', '#']).next().unwrap_or(next);
    if path == "/login" || path.starts_with("/login/") {
        return None;
    }
    Some(next.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::header::LOCATION;

    #[test]
    fn test_sanitize_next() {
        assert_eq!(sanitize_next(Some("/detail/cluster/5")).as_deref(), Some("/detail/cluster/5"));
        assert_eq!(sanitize_next(Some("https://evil.example")), None);
        assert_eq!(sanitize_next(Some("//evil.example")), None);
        assert_eq!(sanitize_next(Some("/login?next=/")), None);
        assert_eq!(sanitize_next(None), None);
    }

    #[test]
    fn test_login_redirect_keeps_query() {
        let response = login_redirect("/detail/status/aws/running?x=1").into_response();
        assert_eq!(
            response.headers()[LOCATION],
            "/login?next=%2Fdetail%2Fstatus%2Faws%2Frunning%3Fx%3D1"
        );
        let response = login_redirect("/").into_response();
        assert_eq!(response.headers()[LOCATION], "/login");
    }
}
