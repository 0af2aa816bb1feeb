//! Login/OTP state machine.
//!
//! Stages: Anonymous → AwaitingOtp → Authenticated. Credential submission
//! verifies against the backend and triggers OTP issuance; OTP verification
//! is bounded by an attempt cap and a wall-clock expiry; repeated login
//! failures arm a CAPTCHA gate that is checked before any upstream call.
//!
//! The OTP and expiry checks are pure functions of `(session, now)` so the
//! transitions can be tested without a clock or a network.

use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::captcha;
use crate::config::{LoginGateConfig, OtpConfig};
use crate::models::{AuthStage, OtpState, Session};
use crate::soap::SoapClient;
use crate::upstream::{login, otp};

/// Flash codes consumed by the login page. Localization happens at render.
pub const FLASH_OTP_EXPIRED: &str = "otp_expired";
pub const FLASH_OTP_EXHAUSTED: &str = "otp_attempts_exhausted";

#[derive(Clone)]
pub struct AuthFlow {
    client: Arc<SoapClient>,
    otp_cfg: OtpConfig,
    gate: LoginGateConfig,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialOutcome {
    /// External login and OTP issuance both succeeded; the session is now
    /// awaiting the code.
    OtpSent { expires_in: i64 },
    MissingFields,
    /// The gate is armed and the submission lacked a correct answer; no
    /// upstream call was made.
    CaptchaRejected,
    LoginRejected { code: String },
    /// Credentials verified but the SMS could not be issued.
    OtpDeliveryFailed { code: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OtpOutcome {
    Authenticated,
    EmptyCode { attempts_left: u32 },
    Invalid { attempts_left: u32 },
    /// Third incorrect submission; the session was reset to Anonymous.
    Exhausted,
    /// The deadline passed; the session was reset to Anonymous.
    Expired,
    /// No OTP flow in progress.
    NotPending,
}

impl AuthFlow {
    pub fn new(client: Arc<SoapClient>, otp_cfg: OtpConfig, gate: LoginGateConfig) -> Self {
        Self {
            client,
            otp_cfg,
            gate,
        }
    }

    pub fn otp_ttl_seconds(&self) -> i64 {
        self.otp_cfg.ttl_seconds
    }

    pub fn otp_max_attempts(&self) -> u32 {
        self.otp_cfg.max_attempts
    }

    /// The CAPTCHA gate arms once the failure counter reaches the threshold.
    pub fn requires_captcha(&self, session: &Session) -> bool {
        session.login_attempts >= self.gate.captcha_after
    }

    /// Step 1 of the flow: validate the form, enforce the CAPTCHA gate,
    /// verify credentials upstream, and kick off OTP delivery.
    pub async fn submit_credentials(
        &self,
        session: &mut Session,
        pin: &str,
        policy: &str,
        phone: &str,
        captcha_answer: Option<&str>,
        now: i64,
    ) -> CredentialOutcome {
        let pin = pin.trim();
        let policy = policy.trim();
        let phone = phone.trim();
        if pin.is_empty() || policy.is_empty() || phone.is_empty() {
            return CredentialOutcome::MissingFields;
        }

        if self.requires_captcha(session) {
            let ok = match (session.captcha_code.as_deref(), captcha_answer) {
                (Some(expected), Some(answer)) => captcha::answers_match(expected, answer),
                _ => false,
            };
            // single-use challenge, pass or fail
            session.captcha_code = None;
            if !ok {
                return CredentialOutcome::CaptchaRejected;
            }
        }

        let identity = match login::verify_login(&self.client, pin, policy, phone).await {
            Ok(identity) => identity,
            Err(e) => {
                session.login_attempts += 1;
                tracing::info!(
                    code = %e.code(),
                    attempts = session.login_attempts,
                    "Credential check failed"
                );
                return CredentialOutcome::LoginRejected { code: e.code() };
            }
        };

        let issued = match otp::issue_otp(&self.client, phone).await {
            Ok(issued) => issued,
            Err(e) => {
                tracing::warn!(code = %e.code(), "OTP issuance failed after successful login");
                return CredentialOutcome::OtpDeliveryFailed { code: e.code() };
            }
        };

        session.stage = AuthStage::AwaitingOtp;
        session.name = Some(identity.name);
        session.surname = Some(identity.surname);
        session.phone_number = Some(phone.to_string());
        session.pin_code = Some(pin.to_string());
        session.otp = Some(OtpState::new(issued.code, now, self.otp_cfg.ttl_seconds));
        session.login_attempts = 0;
        session.captcha_code = None;

        CredentialOutcome::OtpSent {
            expires_in: self.otp_cfg.ttl_seconds,
        }
    }

    /// Step 2: compare a submitted code against the stored one.
    pub fn submit_otp(&self, session: &mut Session, code: &str, now: i64) -> OtpOutcome {
        if session.stage != AuthStage::AwaitingOtp {
            return OtpOutcome::NotPending;
        }
        let Some(state) = session.otp.clone() else {
            // stage/otp invariant breach; repair by dropping back to login
            session.reset_to_login();
            return OtpOutcome::NotPending;
        };

        if state.is_expired(now) {
            self.expire(session);
            return OtpOutcome::Expired;
        }

        let code = code.trim();
        if code.is_empty() {
            return OtpOutcome::EmptyCode {
                attempts_left: self.otp_cfg.max_attempts.saturating_sub(state.attempts),
            };
        }

        if bool::from(code.as_bytes().ct_eq(state.code.as_bytes())) {
            session.stage = AuthStage::Authenticated;
            session.clear_otp();
            return OtpOutcome::Authenticated;
        }

        let attempts = state.attempts + 1;
        if attempts >= self.otp_cfg.max_attempts {
            session.reset_to_login();
            session.flash = Some(FLASH_OTP_EXHAUSTED.to_string());
            return OtpOutcome::Exhausted;
        }
        if let Some(otp) = session.otp.as_mut() {
            otp.attempts = attempts;
        }
        OtpOutcome::Invalid {
            attempts_left: self.otp_cfg.max_attempts - attempts,
        }
    }

    /// Any interaction observed past the deadline drops the pending OTP.
    /// Returns true when the session changed and needs persisting.
    pub fn reap_expired(&self, session: &mut Session, now: i64) -> bool {
        if session.stage != AuthStage::AwaitingOtp {
            return false;
        }
        match &session.otp {
            Some(state) if state.is_expired(now) => {
                self.expire(session);
                true
            }
            Some(_) => false,
            None => {
                session.reset_to_login();
                true
            }
        }
    }

    pub fn logout(&self, session: &mut Session) {
        *session = Session::default();
    }

    fn expire(&self, session: &mut Session) {
        session.reset_to_login();
        session.flash = Some(FLASH_OTP_EXPIRED.to_string());
    }
}
