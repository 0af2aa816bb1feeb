//! Complaint (claim notice) history queries.

use super::fetch_records;
use crate::soap::unwrap::Record;
use crate::soap::{SoapClient, UpstreamError};

/// Medical claim notices, compacted to the fields the UI presents.
#[tracing::instrument(skip_all)]
pub async fn medical_claims(client: &SoapClient, pin: &str) -> Result<Vec<Record>, UpstreamError> {
    let records = fetch_records(
        client,
        "GetMedicalClaimInformations",
        &[("pinCode", pin.trim())],
        "GetMedicalClaimInformationsResult",
        "CLM_NOTICE_DISPETCHER",
    )
    .await?;

    Ok(records
        .into_iter()
        .filter(|rec| !rec.is_empty())
        .map(|rec| {
            let mut compact = Record::new();
            compact.insert("PIN_CODE", rec.get("PIN_CODE").unwrap_or(""));
            compact.insert("CLINIC_NAME", rec.get("CLINIC_NAME").unwrap_or(""));
            compact.insert(
                "EVENT_OCCURRENCE_DATE",
                rec.get("EVENT_OCCURRENCE_DATE").unwrap_or(""),
            );
            compact
        })
        .collect())
}

/// Non-medical claim notices, passed through with their full field sets.
#[tracing::instrument(skip_all)]
pub async fn non_medical_claims(
    client: &SoapClient,
    pin: &str,
) -> Result<Vec<Record>, UpstreamError> {
    fetch_records(
        client,
        "GetNonMedicalClaimInformations",
        &[("pinCode", pin.trim())],
        "GetNonMedicalClaimInformationsResult",
        "CLM_NOTICES",
    )
    .await
}
