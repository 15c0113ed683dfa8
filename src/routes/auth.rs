// ABOUTME: Password login, logout and current-user routes backed by the Supabase auth API
// ABOUTME: Login mirrors the user into the users table and sets the session cookies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Async-IO.org

//! Authentication routes
//!
//! Login and logout answer with the `{success, message}` envelope the
//! journaling client expects rather than the generic error body.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bubble_core::constants::{messages, supabase};
use bubble_core::errors::{AppError, ErrorCode};
use bubble_core::models::{Principal, PrincipalSource};
use serde::Deserialize;
use serde_json::json;
use tracing::field::Empty;
use tracing::{error, info, instrument, warn, Span};

use super::parse_json_body;
use crate::auth::cookies;
use crate::auth::AuthSession;
use crate::context::ServerContext;
use crate::logging::AppLogger;
use crate::utils::json_responses::{simple_failure, simple_success};

#[derive(Debug, Default, Deserialize)]
struct LoginBody {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

/// Refresh cookie lifetime, matching the provider's refresh-token validity
const REFRESH_COOKIE_MAX_AGE_SECS: i64 = 60 * 60 * 24 * 30;

/// Authentication routes handler
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(ctx: ServerContext) -> Router {
        Router::new()
            .route("/api/auth/login", post(Self::login))
            .route("/api/auth/logout", post(Self::logout))
            .route("/api/auth/me", get(Self::me))
            .with_state(ctx)
    }

    #[instrument(skip_all, fields(user_id = Empty))]
    async fn login(State(ctx): State<ServerContext>, body: Bytes) -> Response {
        let body: LoginBody = match parse_json_body(&body, messages::LOGIN_FIELDS_REQUIRED) {
            Ok(body) => body,
            Err(e) => return failure(StatusCode::BAD_REQUEST, e.user_message()),
        };
        let email = body.email.trim();
        if email.is_empty() || body.password.is_empty() {
            return failure(StatusCode::BAD_REQUEST, messages::LOGIN_FIELDS_REQUIRED);
        }

        let provider = match ctx.auth().provider() {
            Ok(provider) => provider,
            Err(e) => return failure_from(&e),
        };
        let session = match provider.sign_in_with_password(email, &body.password).await {
            Ok(session) => session,
            Err(e) if e.code == ErrorCode::AuthInvalid => {
                AppLogger::log_auth_event(email, "password_login", false, Some(&e.message));
                return failure(StatusCode::UNAUTHORIZED, messages::LOGIN_INVALID_CREDENTIALS);
            }
            Err(e) => {
                warn!(error = %e, "Sign-in failed upstream");
                return failure_from(&e);
            }
        };
        Span::current().record("user_id", session.user.id.as_str());

        let profile = session.user.to_profile();
        let principal = Principal::new(
            session.user.id.clone(),
            session.user.email.clone(),
            PrincipalSource::RemoteLookup,
        )
        .with_access_token(session.access_token.clone());
        let stored = match ctx.data().store() {
            Ok(store) => store.ensure_user_profile(&principal, &profile).await,
            Err(e) => Err(e),
        };
        if let Err(e) = stored {
            error!(error = %e, "Could not create users row");
            return failure(StatusCode::INTERNAL_SERVER_ERROR, messages::LOGIN_PROFILE_FAILED);
        }

        AppLogger::log_auth_event(&session.user.id, "password_login", true, None);
        let secure = ctx.config().environment.is_production();
        let mut response = Json(json!({
            "success": true,
            "message": messages::LOGIN_SUCCESS,
            "user": {
                "id": profile.id,
                "email": profile.email,
                "createdAt": profile.created_at,
            },
        }))
        .into_response();
        for cookie in session_cookies(&session, secure) {
            append_cookie(response.headers_mut(), &cookie);
        }
        response
    }

    /// Revoke the session upstream when possible and always clear the cookies
    async fn logout(State(ctx): State<ServerContext>, headers: HeaderMap) -> Response {
        let token =
            cookies::bearer_token(&headers).or_else(|| cookies::session_access_token(&headers));
        if let (Some(token), Ok(provider)) = (token, ctx.auth().provider()) {
            if let Err(e) = provider.sign_out(&token).await {
                warn!(error = %e, "Upstream sign-out failed, clearing cookies anyway");
            }
        }

        let secure = ctx.config().environment.is_production();
        let mut response = Json(simple_success(messages::LOGOUT_SUCCESS)).into_response();
        for name in [supabase::ACCESS_TOKEN_COOKIE, supabase::REFRESH_TOKEN_COOKIE] {
            append_cookie(response.headers_mut(), &cookie_header(name, "", 0, secure));
        }
        info!("Session cookies cleared");
        response
    }

    async fn me(
        State(ctx): State<ServerContext>,
        headers: HeaderMap,
    ) -> Result<Json<serde_json::Value>, AppError> {
        let principal = ctx.auth().identity().resolve_or_fail(&headers).await?;
        Ok(Json(json!({
            "success": true,
            "user": {
                "id": principal.id,
                "email": principal.email,
            },
        })))
    }
}

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(simple_failure(message))).into_response()
}

fn failure_from(error: &AppError) -> Response {
    let status =
        StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    failure(status, error.user_message())
}

fn cookie_header(name: &str, value: &str, max_age: i64, secure: bool) -> String {
    let mut cookie = format!("{name}={value}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age}");
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

fn session_cookies(session: &AuthSession, secure: bool) -> [String; 2] {
    [
        cookie_header(
            supabase::ACCESS_TOKEN_COOKIE,
            &session.access_token,
            session.expires_in.max(0),
            secure,
        ),
        cookie_header(
            supabase::REFRESH_TOKEN_COOKIE,
            &session.refresh_token,
            REFRESH_COOKIE_MAX_AGE_SECS,
            secure,
        ),
    ]
}

fn append_cookie(headers: &mut HeaderMap, cookie: &str) {
    match HeaderValue::from_str(cookie) {
        Ok(value) => {
            headers.append(SET_COOKIE, value);
        }
        Err(e) => warn!(error = %e, "Skipping unrepresentable cookie"),
    }
}
