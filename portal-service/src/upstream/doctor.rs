//! Affiliated-doctor queries and patient registration.

use super::{error_message, fetch_records};
use crate::soap::envelope::SoapVersion;
use crate::soap::unwrap::{extract_inner, parse_records, Record};
use crate::soap::{SoapClient, UpstreamError};

#[tracing::instrument(skip_all)]
pub async fn specialities(client: &SoapClient) -> Result<Vec<Record>, UpstreamError> {
    fetch_records(
        client,
        "GetSpecialities",
        &[],
        "GetSpecialitiesResult",
        "SPECIALITIES",
    )
    .await
}

// "Specialtiy" is how the backend spells this operation on the wire.
#[tracing::instrument(skip_all, fields(speciality_id = %speciality_id.trim()))]
pub async fn doctors_by_speciality(
    client: &SoapClient,
    speciality_id: &str,
) -> Result<Vec<Record>, UpstreamError> {
    fetch_records(
        client,
        "GetDoctorsBySpecialtiy",
        &[("specialityId", speciality_id.trim())],
        "GetDoctorsBySpecialtiyResult",
        "DOCTORS",
    )
    .await
}

#[tracing::instrument(skip_all, fields(doctor_id = %doctor_id.trim()))]
pub async fn doctor_career(
    client: &SoapClient,
    doctor_id: &str,
) -> Result<Vec<Record>, UpstreamError> {
    fetch_records(
        client,
        "GetDoctorCareer",
        &[("doctorId", doctor_id.trim())],
        "GetDoctorCareerResult",
        "DOCTOR_CAREER",
    )
    .await
}

/// Register the card holder with a doctor. The backend answers with the
/// same status idiom the OTP operation uses.
#[tracing::instrument(skip_all, fields(doctor_id = %doctor_id.trim()))]
pub async fn register_patient(
    client: &SoapClient,
    card_number: &str,
    doctor_id: &str,
) -> Result<(), UpstreamError> {
    let params = [
        ("cardNumber", card_number.trim()),
        ("doctorId", doctor_id.trim()),
    ];
    let body = client
        .call("RegisterPatient", &params, SoapVersion::Soap11)
        .await?;
    let inner = extract_inner("RegisterPatientResult", &body).ok_or(UpstreamError::EmptyInner)?;
    parse_register_inner(&inner)
}

fn parse_register_inner(inner: &str) -> Result<(), UpstreamError> {
    let results = parse_records(inner, "RESULT")?;
    if let Some(rec) = results.first() {
        if rec.get("Result").unwrap_or("").eq_ignore_ascii_case("OK") {
            return Ok(());
        }
        let msg = rec.get("MESSAGE").unwrap_or("");
        return Err(UpstreamError::semantic(if msg.is_empty() {
            "register_failed"
        } else {
            msg
        }));
    }

    if let Some(msg) = error_message(inner)? {
        return Err(UpstreamError::Semantic(msg));
    }

    Err(UpstreamError::semantic("unrecognized_response"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_ok() {
        assert!(parse_register_inner("<R><RESULT><Result>OK</Result></RESULT></R>").is_ok());
    }

    #[test]
    fn register_failure_message_passes_through() {
        let err = parse_register_inner(
            "<R><RESULT><Result>FAIL</Result><MESSAGE>doctor_full</MESSAGE></RESULT></R>",
        )
        .unwrap_err();
        assert_eq!(err.code(), "doctor_full");
    }

    #[test]
    fn register_failure_without_message() {
        let err =
            parse_register_inner("<R><RESULT><Result>FAIL</Result></RESULT></R>").unwrap_err();
        assert_eq!(err.code(), "register_failed");
    }
}
