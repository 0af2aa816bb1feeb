pub mod api;
pub mod auth;
pub mod pages;

use axum::response::Html;
use minijinja::value::Value;
use service_core::error::AppError;

use crate::auth_flow::{FLASH_OTP_EXHAUSTED, FLASH_OTP_EXPIRED};
use crate::AppState;

/// Render an embedded template with the given context.
pub(crate) fn render(state: &AppState, name: &str, ctx: Value) -> Result<Html<String>, AppError> {
    let template = state
        .templates
        .get_template(name)
        .map_err(|e| AppError::TemplateError(e.to_string()))?;
    let html = template
        .render(ctx)
        .map_err(|e| AppError::TemplateError(e.to_string()))?;
    Ok(Html(html))
}

/// Fixed code→display-text table for the browser surface. API consumers get
/// the raw code instead; unmapped codes are shown verbatim.
pub(crate) fn display_error(code: &str) -> String {
    let text = match code {
        "user_not_found" => "User not found.",
        "incorrect_phone_number" => "Incorrect phone number.",
        "not_logged" => "Invalid credentials. Check the fields and try again.",
        "invalid_inner_xml" => "The insurance service returned an invalid response.",
        "unrecognized_response" => "The insurance service returned an unsupported response.",
        "empty_or_invalid_inner" => "The insurance service returned an empty response.",
        FLASH_OTP_EXPIRED => "The confirmation code has expired. Please log in again.",
        FLASH_OTP_EXHAUSTED => "Too many incorrect codes. Please log in again.",
        other => return other.to_string(),
    };
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_codes_pass_through_verbatim() {
        assert_eq!(display_error("http_status_503"), "http_status_503");
        assert_eq!(display_error("http_error: timeout"), "http_error: timeout");
    }

    #[test]
    fn known_codes_are_localized() {
        assert_ne!(display_error("not_logged"), "not_logged");
        assert_ne!(display_error(FLASH_OTP_EXPIRED), FLASH_OTP_EXPIRED);
    }
}
