use serde::Deserialize;

/// The login page posts two different forms to the same URL: the credential
/// form and, once an OTP is pending, the code form. The presence of
/// `otp_code` decides which path the submission takes.
#[derive(Debug, Deserialize)]
pub struct LoginSubmitForm {
    #[serde(rename = "pinCode", default)]
    pub pin_code: Option<String>,
    #[serde(rename = "policyNumber", default)]
    pub policy_number: Option<String>,
    #[serde(rename = "phoneNumber", default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub otp_code: Option<String>,
    #[serde(default)]
    pub captcha: Option<String>,
}

impl LoginSubmitForm {
    pub fn is_otp_submission(&self) -> bool {
        self.otp_code.is_some()
    }
}
