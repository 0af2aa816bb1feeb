//! OTP issuance. The backend generates the code and delivers it over SMS;
//! we only receive the value to compare against later.

use super::error_message;
use crate::soap::envelope::SoapVersion;
use crate::soap::unwrap::{extract_inner, parse_records};
use crate::soap::{SoapClient, UpstreamError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedOtp {
    /// Secret code; stored in the session, never echoed to the browser.
    pub code: String,
}

#[tracing::instrument(skip_all)]
pub async fn issue_otp(client: &SoapClient, phone: &str) -> Result<IssuedOtp, UpstreamError> {
    let params = [("phoneNumber", phone.trim())];
    let body = client
        .call("CreateOTPAndSendSMS", &params, SoapVersion::Soap11)
        .await?;
    let inner =
        extract_inner("CreateOTPAndSendSMSResult", &body).ok_or(UpstreamError::EmptyInner)?;
    parse_otp_inner(&inner)
}

fn parse_otp_inner(inner: &str) -> Result<IssuedOtp, UpstreamError> {
    let otps = parse_records(inner, "OTP")?;
    if let Some(rec) = otps.first() {
        let code = rec.get("Code").unwrap_or("").to_string();
        let status = rec.get("Result").unwrap_or("").to_ascii_uppercase();
        if status == "OK" && !code.is_empty() {
            return Ok(IssuedOtp { code });
        }
        let status = if status.is_empty() {
            "unknown".to_string()
        } else {
            status
        };
        return Err(UpstreamError::Semantic(format!("otp_status_{}", status)));
    }

    if let Some(msg) = error_message(inner)? {
        return Err(UpstreamError::Semantic(msg));
    }

    Err(UpstreamError::semantic("unrecognized_response"))
}
