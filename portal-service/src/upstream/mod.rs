//! Domain query functions, one per backend operation.
//!
//! Every function is the same fixed pipeline: build the parameter list,
//! call the SOAP adapter, unwrap with the operation's result-tag and
//! record-tag, and map the records into the operation's normalized shape.
//! The operation-specific parts are pure configuration data.

pub mod claims;
pub mod doctor;
pub mod login;
pub mod otp;
pub mod policy;

use crate::soap::envelope::SoapVersion;
use crate::soap::unwrap::{extract_inner, parse_records, Record};
use crate::soap::{SoapClient, UpstreamError};

/// Shared list-operation pipeline over SOAP 1.1.
pub(crate) async fn fetch_records(
    client: &SoapClient,
    operation: &str,
    params: &[(&str, &str)],
    result_tag: &str,
    record_tag: &str,
) -> Result<Vec<Record>, UpstreamError> {
    let body = client.call(operation, params, SoapVersion::Soap11).await?;
    let inner = extract_inner(result_tag, &body).ok_or(UpstreamError::EmptyInner)?;
    parse_records(&inner, record_tag)
}

/// Pull the first `ERROR` element's message out of an inner document, for
/// operations whose failure responses carry `<ERROR><MESSAGE>…`.
pub(crate) fn error_message(inner: &str) -> Result<Option<String>, UpstreamError> {
    let errors = parse_records(inner, "ERROR")?;
    Ok(errors.first().map(|rec| {
        let msg = rec.get("MESSAGE").unwrap_or("").to_string();
        if msg.is_empty() {
            "unknown_error".to_string()
        } else {
            msg
        }
    }))
}
