use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use std::sync::Arc;

/// Whether `path` is `prefix` itself or lies below it. `/api` covers
/// `/api/progress` but not `/apiary`.
pub fn is_under_prefix(path: &str, prefix: &str) -> bool {
    let prefix = prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return false;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Path prefix under which routes serve JSON instead of pages.
#[derive(Debug, Clone)]
pub struct ApiPrefix(pub Arc<str>);

impl ApiPrefix {
    pub fn new(prefix: &str) -> Self {
        Self(Arc::from(prefix))
    }
}

/// Hardening headers for every response.
///
/// Page routes may load same-origin assets; JSON API routes get a CSP that
/// allows nothing.
pub async fn security_headers_middleware(
    State(api_prefix): State<ApiPrefix>,
    req: Request,
    next: Next,
) -> impl IntoResponse {
    let is_api_route = is_under_prefix(req.uri().path(), &api_prefix.0);

    let mut response = next.run(req).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        header::HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        header::HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );
    headers.insert(
        header::REFERRER_POLICY,
        header::HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::X_FRAME_OPTIONS,
        header::HeaderValue::from_static("DENY"),
    );

    if is_api_route {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
        );
    } else {
        headers.insert(
            header::CONTENT_SECURITY_POLICY,
            header::HeaderValue::from_static(
                "default-src 'self'; \
                 img-src 'self' data:; \
                 style-src 'self' 'unsafe-inline'; \
                 frame-ancestors 'none'",
            ),
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::Request, middleware::from_fn_with_state, routing::get};
    use tower::ServiceExt;

    fn app() -> Router {
        Router::new()
            .route("/", get(|| async { "page" }))
            .route("/api/progress", get(|| async { "{}" }))
            .route("/apiary", get(|| async { "page" }))
            .layer(from_fn_with_state(
                ApiPrefix::new("/api"),
                security_headers_middleware,
            ))
    }

    async fn csp(app: Router, uri: &str) -> String {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        response.headers()[header::CONTENT_SECURITY_POLICY]
            .to_str()
            .unwrap()
            .to_string()
    }

    #[test]
    fn prefix_match_stops_at_segment_boundary() {
        assert!(is_under_prefix("/api", "/api"));
        assert!(is_under_prefix("/api/progress", "/api"));
        assert!(is_under_prefix("/api/progress", "/api/"));
        assert!(!is_under_prefix("/apiary", "/api"));
        assert!(!is_under_prefix("/", "/api"));
        assert!(!is_under_prefix("/api/progress", ""));
    }

    #[tokio::test]
    async fn lookalike_page_routes_keep_page_csp() {
        let csp = csp(app(), "/apiary").await;
        assert!(csp.starts_with("default-src 'self'"));
    }

    #[tokio::test]
    async fn configured_prefix_is_honoured() {
        let app = Router::new()
            .route("/v1/progress", get(|| async { "{}" }))
            .route("/api/progress", get(|| async { "page" }))
            .layer(from_fn_with_state(
                ApiPrefix::new("/v1"),
                security_headers_middleware,
            ));

        assert_eq!(
            csp(app.clone(), "/v1/progress").await,
            "default-src 'none'; frame-ancestors 'none'"
        );
        assert!(csp(app, "/api/progress").await.starts_with("default-src 'self'"));
    }

    #[tokio::test]
    async fn api_routes_get_locked_down_csp() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/api/progress")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response.headers()[header::CONTENT_SECURITY_POLICY],
            "default-src 'none'; frame-ancestors 'none'"
        );
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
    }

    #[tokio::test]
    async fn pages_allow_same_origin_assets() {
        let response = app()
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        let csp = response.headers()[header::CONTENT_SECURITY_POLICY]
            .to_str()
            .unwrap();
        assert!(csp.starts_with("default-src 'self'"));
        assert_eq!(response.headers()[header::X_FRAME_OPTIONS], "DENY");
    }
}
