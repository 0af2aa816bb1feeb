//! Session model - the portal's only per-user state.
//!
//! The portal keeps no store of record; everything here is reconstructible
//! by logging in again. The session lives in an external store keyed by an
//! opaque cookie id.

use serde::{Deserialize, Serialize};

/// Where the user is in the login flow. `AwaitingOtp` always carries OTP
/// sub-state; the pair is kept consistent by the flow methods below.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthStage {
    #[default]
    Anonymous,
    AwaitingOtp,
    Authenticated,
}

/// OTP sub-state, present only between credential verification and code
/// confirmation. The code is held in clear for direct comparison with the
/// value the backend sent over SMS; it is never logged or echoed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtpState {
    pub code: String,
    pub attempts: u32,
    /// Epoch seconds.
    pub expires_at: i64,
    /// Epoch seconds.
    pub sent_at: i64,
}

impl OtpState {
    pub fn new(code: String, now: i64, ttl_seconds: i64) -> Self {
        Self {
            code,
            attempts: 0,
            expires_at: now + ttl_seconds,
            sent_at: now,
        }
    }

    pub fn is_expired(&self, now: i64) -> bool {
        now >= self.expires_at
    }

    pub fn remaining(&self, now: i64) -> i64 {
        (self.expires_at - now).max(0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub stage: AuthStage,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub phone_number: Option<String>,
    pub pin_code: Option<String>,
    pub otp: Option<OtpState>,
    /// Failed credential submissions; drives the CAPTCHA gate.
    pub login_attempts: u32,
    pub captcha_code: Option<String>,
    /// One-shot notice surfaced on the next login page render.
    pub flash: Option<String>,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.stage == AuthStage::Authenticated
    }

    pub fn is_awaiting_otp(&self) -> bool {
        self.stage == AuthStage::AwaitingOtp
    }

    /// Drop OTP sub-state only, keeping identity fields.
    pub fn clear_otp(&mut self) {
        self.otp = None;
    }

    /// Back to the plain login form: OTP and identity gone, the CAPTCHA
    /// gate counters survive.
    pub fn reset_to_login(&mut self) {
        self.stage = AuthStage::Anonymous;
        self.name = None;
        self.surname = None;
        self.phone_number = None;
        self.pin_code = None;
        self.otp = None;
    }

    pub fn take_flash(&mut self) -> Option<String> {
        self.flash.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_expiry_is_inclusive_of_the_deadline() {
        let otp = OtpState::new("123456".into(), 1_000, 60);
        assert!(!otp.is_expired(1_059));
        assert!(otp.is_expired(1_060));
        assert_eq!(otp.remaining(1_020), 40);
        assert_eq!(otp.remaining(2_000), 0);
    }

    #[test]
    fn reset_keeps_gate_counters() {
        let mut session = Session {
            stage: AuthStage::AwaitingOtp,
            name: Some("Ada".into()),
            login_attempts: 2,
            captcha_code: Some("XY23Z".into()),
            otp: Some(OtpState::new("1".into(), 0, 60)),
            ..Session::default()
        };
        session.reset_to_login();
        assert_eq!(session.stage, AuthStage::Anonymous);
        assert!(session.name.is_none() && session.otp.is_none());
        assert_eq!(session.login_attempts, 2);
        assert!(session.captcha_code.is_some());
    }
}
