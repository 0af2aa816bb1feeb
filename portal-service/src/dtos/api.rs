use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::soap::unwrap::{DetailRecord, Record};

/// Failure body shared by every JSON endpoint: `ok` is always false and
/// `error` is the raw machine-readable code, not localized text.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiFailure {
    pub ok: bool,
    #[schema(example = "http_status_500")]
    pub error: String,
}

impl ApiFailure {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: code.into(),
        }
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PolicyInfoRequest {
    #[validate(length(min = 1, message = "policyNumber is required"))]
    #[schema(example = "POL-2024-001234")]
    pub policy_number: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterDoctorRequest {
    #[validate(length(min = 1, message = "cardNumber is required"))]
    pub card_number: String,
    #[validate(length(min = 1, message = "doctorId is required"))]
    pub doctor_id: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PoliciesResponse {
    pub ok: bool,
    #[schema(value_type = Vec<Object>)]
    pub policies: Vec<Record>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PolicyInfoResponse {
    pub ok: bool,
    #[schema(value_type = Object)]
    pub data: DetailRecord,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SpecialitiesResponse {
    pub ok: bool,
    #[schema(value_type = Vec<Object>)]
    pub specialities: Vec<Record>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorsResponse {
    pub ok: bool,
    #[schema(value_type = Vec<Object>)]
    pub doctors: Vec<Record>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DoctorCareerResponse {
    pub ok: bool,
    #[schema(value_type = Vec<Object>)]
    pub career: Vec<Record>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ComplaintsResponse {
    pub ok: bool,
    #[schema(value_type = Vec<Object>)]
    pub complaints: Vec<Record>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RegisterDoctorResponse {
    pub ok: bool,
}
