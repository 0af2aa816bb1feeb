//! Session resolution middleware and handler-side extractors.
//!
//! Resolves the session cookie against the injected store (creating a fresh
//! session on the first unauthenticated request), runs the OTP expiry reap
//! so every route observes the deadline, and exposes the result to handlers
//! through request extensions.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde_json::json;
use uuid::Uuid;

use crate::models::Session;
use crate::AppState;

pub const SESSION_COOKIE: &str = "portal_sid";

/// The resolved session and its opaque store key. Handlers that mutate the
/// session write it back through `AppState::sessions`.
#[derive(Debug, Clone)]
pub struct SessionCtx {
    pub id: String,
    pub session: Session,
}

pub async fn session_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    let path = req.uri().path();
    if path == "/health" || path.starts_with("/docs") || path.starts_with("/.well-known") {
        return next.run(req).await;
    }

    let existing = match jar.get(SESSION_COOKIE) {
        Some(cookie) => state
            .sessions
            .get(cookie.value())
            .await
            .map(|session| (cookie.value().to_string(), session)),
        None => None,
    };

    let (id, mut session, fresh) = match existing {
        Some((id, session)) => (id, session, false),
        None => (Uuid::new_v4().to_string(), Session::default(), true),
    };

    let now = Utc::now().timestamp();
    if state.auth_flow.reap_expired(&mut session, now) || fresh {
        state.sessions.put(&id, session.clone()).await;
    }

    req.extensions_mut().insert(SessionCtx {
        id: id.clone(),
        session,
    });

    let mut response = next.run(req).await;

    if fresh {
        let cookie = format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax",
            SESSION_COOKIE, id
        );
        if let Ok(value) = header::HeaderValue::from_str(&cookie) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }

    response
}

/// Any resolved session, regardless of stage.
pub struct CurrentSession(pub SessionCtx);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionCtx>()
            .cloned()
            .map(CurrentSession)
            .ok_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

/// Page-route gate: unauthenticated visitors are bounced to the login form.
pub struct RequireLogin(pub SessionCtx);

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireLogin
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ctx = parts
            .extensions
            .get::<SessionCtx>()
            .cloned()
            .ok_or_else(|| StatusCode::INTERNAL_SERVER_ERROR.into_response())?;
        if !ctx.session.is_authenticated() {
            return Err(Redirect::to("/login").into_response());
        }
        Ok(RequireLogin(ctx))
    }
}

/// API-route gate: missing or unauthenticated sessions get the JSON 401.
pub struct ApiSession(pub SessionCtx);

#[axum::async_trait]
impl<S> FromRequestParts<S> for ApiSession
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let unauthorized = || {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "unauthorized" })),
            )
                .into_response()
        };

        let ctx = parts
            .extensions
            .get::<SessionCtx>()
            .cloned()
            .ok_or_else(unauthorized)?;
        if !ctx.session.is_authenticated() {
            return Err(unauthorized());
        }
        Ok(ApiSession(ctx))
    }
}
