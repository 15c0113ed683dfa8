// ABOUTME: CORS layer configuration for the journaling API
// ABOUTME: Wildcard for development, explicit origin list when configured
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

use http::header::HeaderName;
use http::{HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::ServerConfig;

/// Configure CORS from `CORS_ALLOWED_ORIGINS`
///
/// `*` or an empty value allows any origin. A comma-separated list restricts
/// to those origins and enables credentials so the session cookies travel
/// with cross-origin requests.
///
/// ```bash
/// export CORS_ALLOWED_ORIGINS="https://bubble.example.com,http://localhost:3000"
/// ```
#[must_use]
pub fn setup_cors(config: &ServerConfig) -> CorsLayer {
    let configured = config.cors.allowed_origins.trim();
    let origins: Vec<HeaderValue> = if configured.is_empty() || configured == "*" {
        Vec::new()
    } else {
        configured
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect()
    };

    let layer = CorsLayer::new()
        .allow_headers([
            HeaderName::from_static("content-type"),
            HeaderName::from_static("authorization"),
            HeaderName::from_static("accept"),
            HeaderName::from_static("x-request-id"),
        ])
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ]);

    if origins.is_empty() {
        layer.allow_origin(AllowOrigin::any())
    } else {
        layer
            .allow_origin(AllowOrigin::list(origins))
            .allow_credentials(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::routing::get;
    use axum::Router;
    use http::header::{ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_ORIGIN, ORIGIN};
    use http::Request;
    use tower::ServiceExt;

    fn config_with(origins: &str) -> ServerConfig {
        let mut config = ServerConfig::default();
        origins.clone_into(&mut config.cors.allowed_origins);
        config
    }

    async fn preflight(config: &ServerConfig, origin: &str) -> http::Response<Body> {
        let app = Router::new()
            .route("/", get(|| async { "ok" }))
            .layer(setup_cors(config));
        app.oneshot(
            Request::builder()
                .uri("/")
                .header(ORIGIN, origin)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_wildcard_allows_any_origin() {
        let response = preflight(&config_with("*"), "https://anywhere.test").await;
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "*"
        );
    }

    #[tokio::test]
    async fn test_origin_list_echoes_with_credentials() {
        let config = config_with("https://bubble.test, https://admin.bubble.test");
        let response = preflight(&config, "https://bubble.test").await;
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "https://bubble.test"
        );
        assert_eq!(
            response
                .headers()
                .get(ACCESS_CONTROL_ALLOW_CREDENTIALS)
                .unwrap(),
            "true"
        );

        let response = preflight(&config, "https://evil.test").await;
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }
}
