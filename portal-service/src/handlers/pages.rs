//! Session-gated HTML pages. Each one fetches from the backend and renders
//! the generic record table; upstream failures surface as localized text on
//! the page rather than an error status.

use axum::{
    extract::{Path, State},
    response::Html,
};
use minijinja::context;
use minijinja::value::Value;

use super::{display_error, render};
use crate::middleware::RequireLogin;
use crate::soap::unwrap::Record;
use crate::soap::UpstreamError;
use crate::upstream;
use crate::AppState;
use service_core::error::AppError;

/// GET /
pub async fn home(
    State(state): State<AppState>,
    RequireLogin(ctx): RequireLogin,
) -> Result<Html<String>, AppError> {
    render(
        &state,
        "home.html",
        context! {
            name => ctx.session.name.as_deref().unwrap_or(""),
            surname => ctx.session.surname.as_deref().unwrap_or(""),
        },
    )
}

/// GET /policies/
pub async fn policies(
    State(state): State<AppState>,
    RequireLogin(ctx): RequireLogin,
) -> Result<Html<String>, AppError> {
    let pin = ctx.session.pin_code.unwrap_or_default();
    let result = upstream::policy::customer_policies(&state.soap, &pin).await;
    records_page(&state, "My policies", result)
}

/// GET /doctors/
pub async fn doctors(
    State(state): State<AppState>,
    RequireLogin(_ctx): RequireLogin,
) -> Result<Html<String>, AppError> {
    let result = upstream::doctor::specialities(&state.soap).await;
    records_page(&state, "Doctor specialities", result)
}

/// GET /doctors/{speciality_id}/
pub async fn doctors_by_speciality(
    State(state): State<AppState>,
    RequireLogin(_ctx): RequireLogin,
    Path(speciality_id): Path<String>,
) -> Result<Html<String>, AppError> {
    let result = upstream::doctor::doctors_by_speciality(&state.soap, &speciality_id).await;
    records_page(&state, "Doctors", result)
}

/// GET /doctors/{speciality_id}/{doctor_id}/
pub async fn doctor_detail(
    State(state): State<AppState>,
    RequireLogin(_ctx): RequireLogin,
    Path((_speciality_id, doctor_id)): Path<(String, String)>,
) -> Result<Html<String>, AppError> {
    let result = upstream::doctor::doctor_career(&state.soap, &doctor_id).await;
    records_page(&state, "Doctor career", result)
}

/// GET /complaints/
pub async fn complaints(
    State(state): State<AppState>,
    RequireLogin(ctx): RequireLogin,
) -> Result<Html<String>, AppError> {
    let pin = ctx.session.pin_code.unwrap_or_default();
    let result = upstream::claims::medical_claims(&state.soap, &pin).await;
    records_page(&state, "Medical complaints", result)
}

/// GET /complaints-not-medical/
pub async fn complaints_not_medical(
    State(state): State<AppState>,
    RequireLogin(ctx): RequireLogin,
) -> Result<Html<String>, AppError> {
    let pin = ctx.session.pin_code.unwrap_or_default();
    let result = upstream::claims::non_medical_claims(&state.soap, &pin).await;
    records_page(&state, "Other complaints", result)
}

/// GET /refund/
pub async fn refund(
    State(state): State<AppState>,
    RequireLogin(_ctx): RequireLogin,
) -> Result<Html<String>, AppError> {
    render(
        &state,
        "message.html",
        context! {
            title => "Refunds",
            text => "To submit a refund request, contact the call center or visit a service desk with your policy number.",
            error => None::<String>,
        },
    )
}

fn records_page(
    state: &AppState,
    title: &str,
    result: Result<Vec<Record>, UpstreamError>,
) -> Result<Html<String>, AppError> {
    match result {
        Ok(records) => render(
            state,
            "records.html",
            context! {
                title,
                records => Value::from_serialize(&records),
                error => None::<String>,
            },
        ),
        Err(e) => {
            tracing::warn!(code = %e.code(), page = %title, "Upstream failure on page render");
            render(
                state,
                "records.html",
                context! {
                    title,
                    records => Value::from_serialize(&Vec::<Record>::new()),
                    error => Some(display_error(&e.code())),
                },
            )
        }
    }
}
