//! Policy list and detail queries.

use super::fetch_records;
use crate::soap::envelope::SoapVersion;
use crate::soap::unwrap::{extract_inner, parse_detail, DetailRecord, Record};
use crate::soap::{SoapClient, UpstreamError};

#[tracing::instrument(skip_all)]
pub async fn customer_policies(
    client: &SoapClient,
    pin: &str,
) -> Result<Vec<Record>, UpstreamError> {
    fetch_records(
        client,
        "GetCustomerPolicies",
        &[("pinCode", pin.trim())],
        "GetCustomerPoliciesResult",
        "POLICIES",
    )
    .await
}

/// Single-policy detail with the richer per-field flattening, including the
/// nested collateral-names list.
#[tracing::instrument(skip_all)]
pub async fn policy_informations(
    client: &SoapClient,
    policy_number: &str,
) -> Result<DetailRecord, UpstreamError> {
    let body = client
        .call(
            "GetPolicyInformations",
            &[("policyNumber", policy_number.trim())],
            SoapVersion::Soap11,
        )
        .await?;
    let inner =
        extract_inner("GetPolicyInformationsResult", &body).ok_or(UpstreamError::EmptyInner)?;
    parse_detail(&inner)
}
