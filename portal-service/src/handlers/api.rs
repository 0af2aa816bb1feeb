//! JSON API, consumed by the frontend scripts.
//!
//! Contract: 401 `{"error":"unauthorized"}` without an authenticated
//! session; 200 `{ok:true, …payload}` on success; 502 `{ok:false, error}`
//! with the raw machine-readable code on any upstream failure.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use validator::Validate;

use crate::dtos::api::{
    ApiFailure, ComplaintsResponse, DoctorCareerResponse, DoctorsResponse, PoliciesResponse,
    PolicyInfoRequest, PolicyInfoResponse, RegisterDoctorRequest, RegisterDoctorResponse,
    SpecialitiesResponse,
};
use crate::middleware::ApiSession;
use crate::soap::UpstreamError;
use crate::upstream;
use crate::AppState;
use service_core::error::AppError;

fn upstream_failure(e: UpstreamError) -> Response {
    (StatusCode::BAD_GATEWAY, Json(ApiFailure::new(e.code()))).into_response()
}

/// List the customer's policies.
#[utoipa::path(
    get,
    path = "/api/policies",
    responses(
        (status = 200, description = "Policy list", body = PoliciesResponse),
        (status = 401, description = "No authenticated session"),
        (status = 502, description = "Upstream failure", body = ApiFailure)
    ),
    tag = "Portal API"
)]
pub async fn policies(State(state): State<AppState>, ApiSession(ctx): ApiSession) -> Response {
    let pin = ctx.session.pin_code.unwrap_or_default();
    match upstream::policy::customer_policies(&state.soap, &pin).await {
        Ok(policies) => Json(PoliciesResponse { ok: true, policies }).into_response(),
        Err(e) => upstream_failure(e),
    }
}

/// Fetch one policy's details.
#[utoipa::path(
    post,
    path = "/api/policy-info",
    request_body = PolicyInfoRequest,
    responses(
        (status = 200, description = "Policy details", body = PolicyInfoResponse),
        (status = 401, description = "No authenticated session"),
        (status = 502, description = "Upstream failure", body = ApiFailure)
    ),
    tag = "Portal API"
)]
pub async fn policy_info(
    State(state): State<AppState>,
    ApiSession(_ctx): ApiSession,
    Json(req): Json<PolicyInfoRequest>,
) -> Result<Response, AppError> {
    req.validate()?;
    match upstream::policy::policy_informations(&state.soap, &req.policy_number).await {
        Ok(data) => Ok(Json(PolicyInfoResponse { ok: true, data }).into_response()),
        Err(e) => Ok(upstream_failure(e)),
    }
}

/// List doctor specialities.
#[utoipa::path(
    get,
    path = "/api/specialities",
    responses(
        (status = 200, description = "Speciality list", body = SpecialitiesResponse),
        (status = 401, description = "No authenticated session"),
        (status = 502, description = "Upstream failure", body = ApiFailure)
    ),
    tag = "Portal API"
)]
pub async fn specialities(State(state): State<AppState>, ApiSession(_ctx): ApiSession) -> Response {
    match upstream::doctor::specialities(&state.soap).await {
        Ok(specialities) => Json(SpecialitiesResponse {
            ok: true,
            specialities,
        })
        .into_response(),
        Err(e) => upstream_failure(e),
    }
}

/// List doctors for one speciality.
#[utoipa::path(
    get,
    path = "/api/doctors/{speciality_id}",
    params(("speciality_id" = String, Path, description = "Speciality id")),
    responses(
        (status = 200, description = "Doctor list", body = DoctorsResponse),
        (status = 401, description = "No authenticated session"),
        (status = 502, description = "Upstream failure", body = ApiFailure)
    ),
    tag = "Portal API"
)]
pub async fn doctors_by_speciality(
    State(state): State<AppState>,
    ApiSession(_ctx): ApiSession,
    Path(speciality_id): Path<String>,
) -> Response {
    match upstream::doctor::doctors_by_speciality(&state.soap, &speciality_id).await {
        Ok(doctors) => Json(DoctorsResponse { ok: true, doctors }).into_response(),
        Err(e) => upstream_failure(e),
    }
}

/// Fetch a doctor's career history.
#[utoipa::path(
    get,
    path = "/api/doctor-career/{doctor_id}",
    params(("doctor_id" = String, Path, description = "Doctor id")),
    responses(
        (status = 200, description = "Career entries", body = DoctorCareerResponse),
        (status = 401, description = "No authenticated session"),
        (status = 502, description = "Upstream failure", body = ApiFailure)
    ),
    tag = "Portal API"
)]
pub async fn doctor_career(
    State(state): State<AppState>,
    ApiSession(_ctx): ApiSession,
    Path(doctor_id): Path<String>,
) -> Response {
    match upstream::doctor::doctor_career(&state.soap, &doctor_id).await {
        Ok(career) => Json(DoctorCareerResponse { ok: true, career }).into_response(),
        Err(e) => upstream_failure(e),
    }
}

/// List the customer's medical claim notices.
#[utoipa::path(
    get,
    path = "/api/medical-complaints",
    responses(
        (status = 200, description = "Complaint list", body = ComplaintsResponse),
        (status = 401, description = "No authenticated session"),
        (status = 502, description = "Upstream failure", body = ApiFailure)
    ),
    tag = "Portal API"
)]
pub async fn medical_complaints(
    State(state): State<AppState>,
    ApiSession(ctx): ApiSession,
) -> Response {
    let pin = ctx.session.pin_code.unwrap_or_default();
    match upstream::claims::medical_claims(&state.soap, &pin).await {
        Ok(complaints) => Json(ComplaintsResponse {
            ok: true,
            complaints,
        })
        .into_response(),
        Err(e) => upstream_failure(e),
    }
}

/// List the customer's non-medical claim notices.
#[utoipa::path(
    get,
    path = "/api/non-medical-complaints",
    responses(
        (status = 200, description = "Complaint list", body = ComplaintsResponse),
        (status = 401, description = "No authenticated session"),
        (status = 502, description = "Upstream failure", body = ApiFailure)
    ),
    tag = "Portal API"
)]
pub async fn non_medical_complaints(
    State(state): State<AppState>,
    ApiSession(ctx): ApiSession,
) -> Response {
    let pin = ctx.session.pin_code.unwrap_or_default();
    match upstream::claims::non_medical_claims(&state.soap, &pin).await {
        Ok(complaints) => Json(ComplaintsResponse {
            ok: true,
            complaints,
        })
        .into_response(),
        Err(e) => upstream_failure(e),
    }
}

/// Register the customer with a doctor.
#[utoipa::path(
    post,
    path = "/api/register-doctor",
    request_body = RegisterDoctorRequest,
    responses(
        (status = 200, description = "Registered", body = RegisterDoctorResponse),
        (status = 401, description = "No authenticated session"),
        (status = 502, description = "Upstream failure", body = ApiFailure)
    ),
    tag = "Portal API"
)]
pub async fn register_doctor(
    State(state): State<AppState>,
    ApiSession(_ctx): ApiSession,
    Json(req): Json<RegisterDoctorRequest>,
) -> Result<Response, AppError> {
    req.validate()?;
    match upstream::doctor::register_patient(&state.soap, &req.card_number, &req.doctor_id).await {
        Ok(()) => Ok(Json(RegisterDoctorResponse { ok: true }).into_response()),
        Err(e) => Ok(upstream_failure(e)),
    }
}
