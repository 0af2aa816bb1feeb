//! External credential verification.

use super::error_message;
use crate::soap::unwrap::{extract_inner, parse_records};
use crate::soap::{SoapClient, UpstreamError};

/// Identity fields the backend reports for an authenticated login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginIdentity {
    pub name: String,
    pub surname: String,
}

/// Verify `(pin, policy, phone)` against the backend. This is the only
/// operation that runs the SOAP framing fallback.
#[tracing::instrument(skip_all, fields(pin = %pin.trim()))]
pub async fn verify_login(
    client: &SoapClient,
    pin: &str,
    policy: &str,
    phone: &str,
) -> Result<LoginIdentity, UpstreamError> {
    let params = [
        ("pinCode", pin.trim()),
        ("policyNumber", policy.trim()),
        ("phoneNumber", phone.trim()),
    ];
    let body = client.call_with_login_fallback("Login", &params).await?;
    let inner = extract_inner("LoginResult", &body).ok_or(UpstreamError::EmptyInner)?;
    parse_login_inner(&inner)
}

fn parse_login_inner(inner: &str) -> Result<LoginIdentity, UpstreamError> {
    let logins = parse_records(inner, "LOGIN")?;
    if let Some(rec) = logins.first() {
        let is_logged = rec.get("IS_LOGGED").unwrap_or("");
        let name = rec.get("NAME").unwrap_or("").to_string();
        let surname = rec.get("SURNAME").unwrap_or("").to_string();
        if is_logged == "1" && !name.is_empty() {
            return Ok(LoginIdentity { name, surname });
        }
        return Err(UpstreamError::semantic("not_logged"));
    }

    if let Some(msg) = error_message(inner)? {
        return Err(UpstreamError::Semantic(msg));
    }

    Err(UpstreamError::semantic("unrecognized_response"))
}
