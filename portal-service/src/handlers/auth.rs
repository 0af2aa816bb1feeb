//! Login, OTP confirmation, logout, and the CAPTCHA image.
//!
//! `GET/POST /login` is the whole state machine surface: the GET renders
//! whichever form matches the session stage, and the POST dispatches on the
//! submitted fields (an `otp_code` field means code confirmation, anything
//! else is a credential submission).

use axum::{
    extract::{Form, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;
use minijinja::context;

use super::{display_error, render};
use crate::auth_flow::{CredentialOutcome, OtpOutcome};
use crate::captcha;
use crate::dtos::forms::LoginSubmitForm;
use crate::middleware::CurrentSession;
use crate::models::Session;
use crate::AppState;
use service_core::error::AppError;

/// GET /login
pub async fn login_page(
    State(state): State<AppState>,
    CurrentSession(ctx): CurrentSession,
) -> Result<Response, AppError> {
    if ctx.session.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }

    let now = Utc::now().timestamp();
    if ctx.session.is_awaiting_otp() {
        // expiry was reaped by the session middleware, so the deadline is
        // still ahead of us here
        return Ok(render_otp(&state, &ctx.session, now, None)?.into_response());
    }

    render_login(&state, &ctx.id, ctx.session, None).await
}

/// POST /login
pub async fn login_submit(
    State(state): State<AppState>,
    CurrentSession(ctx): CurrentSession,
    Form(form): Form<LoginSubmitForm>,
) -> Result<Response, AppError> {
    let mut session = ctx.session;
    let now = Utc::now().timestamp();

    if form.is_otp_submission() {
        return submit_otp(&state, &ctx.id, session, form, now).await;
    }

    if session.is_authenticated() {
        return Ok(Redirect::to("/").into_response());
    }

    let pin = form.pin_code.unwrap_or_default();
    let policy = form.policy_number.unwrap_or_default();
    let phone = form.phone_number.unwrap_or_default();

    let outcome = state
        .auth_flow
        .submit_credentials(
            &mut session,
            &pin,
            &policy,
            &phone,
            form.captcha.as_deref(),
            now,
        )
        .await;

    match outcome {
        CredentialOutcome::OtpSent { .. } => {
            state.sessions.put(&ctx.id, session.clone()).await;
            Ok(render_otp(&state, &session, now, None)?.into_response())
        }
        CredentialOutcome::MissingFields => {
            render_login(&state, &ctx.id, session, Some("All fields are required.".into())).await
        }
        CredentialOutcome::CaptchaRejected => {
            render_login(
                &state,
                &ctx.id,
                session,
                Some("Incorrect CAPTCHA answer.".into()),
            )
            .await
        }
        CredentialOutcome::LoginRejected { code } => {
            render_login(&state, &ctx.id, session, Some(display_error(&code))).await
        }
        CredentialOutcome::OtpDeliveryFailed { code } => {
            let message = format!(
                "Failed to send the confirmation code: {}",
                display_error(&code)
            );
            render_login(&state, &ctx.id, session, Some(message)).await
        }
    }
}

/// GET /logout
pub async fn logout(State(state): State<AppState>, CurrentSession(ctx): CurrentSession) -> Response {
    state.sessions.remove(&ctx.id).await;
    Redirect::to("/login").into_response()
}

/// GET /login/captcha, the current challenge drawn by the injected renderer.
pub async fn captcha_image(
    State(state): State<AppState>,
    CurrentSession(ctx): CurrentSession,
) -> Response {
    match ctx.session.captcha_code.as_deref() {
        Some(code) => {
            let (content_type, bytes) = state.captcha.render(code);
            ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn submit_otp(
    state: &AppState,
    session_id: &str,
    mut session: Session,
    form: LoginSubmitForm,
    now: i64,
) -> Result<Response, AppError> {
    if !session.is_awaiting_otp() {
        return Ok(Redirect::to("/login").into_response());
    }

    let code = form.otp_code.unwrap_or_default();
    let outcome = state.auth_flow.submit_otp(&mut session, &code, now);
    state.sessions.put(session_id, session.clone()).await;

    match outcome {
        OtpOutcome::Authenticated => Ok(Redirect::to("/").into_response()),
        // flow left a flash notice; the login page will show it
        OtpOutcome::Expired | OtpOutcome::Exhausted | OtpOutcome::NotPending => {
            Ok(Redirect::to("/login").into_response())
        }
        OtpOutcome::EmptyCode { .. } => {
            Ok(render_otp(state, &session, now, Some("Enter the code.".into()))?.into_response())
        }
        OtpOutcome::Invalid { attempts_left } => {
            let message = format!("Incorrect code. Attempts left: {}.", attempts_left);
            Ok(render_otp(state, &session, now, Some(message))?.into_response())
        }
    }
}

/// Render the plain login form, arming the CAPTCHA gate when due and
/// consuming any pending one-shot notice. Persists the session.
async fn render_login(
    state: &AppState,
    session_id: &str,
    mut session: Session,
    error: Option<String>,
) -> Result<Response, AppError> {
    let flash = session.take_flash().map(|code| display_error(&code));
    let error = error.or(flash);

    let captcha_required = state.auth_flow.requires_captcha(&session);
    if captcha_required {
        session.captcha_code = Some(captcha::generate_challenge());
    }
    state.sessions.put(session_id, session).await;

    let page = render(
        state,
        "login.html",
        context! { error, captcha_required },
    )?;
    Ok(page.into_response())
}

fn render_otp(
    state: &AppState,
    session: &Session,
    now: i64,
    error: Option<String>,
) -> Result<axum::response::Html<String>, AppError> {
    let max_attempts = state.auth_flow.otp_max_attempts();
    let (remaining, attempts_left) = match &session.otp {
        Some(otp) => (otp.remaining(now), max_attempts.saturating_sub(otp.attempts)),
        None => (0, 0),
    };
    render(
        state,
        "otp.html",
        context! {
            name => session.name.as_deref().unwrap_or(""),
            surname => session.surname.as_deref().unwrap_or(""),
            phone => session.phone_number.as_deref().unwrap_or(""),
            remaining,
            attempts_left,
            max_attempts,
            error,
        },
    )
}
