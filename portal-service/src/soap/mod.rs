//! SOAP client adapter for the insurer backend.
//!
//! Every upstream operation goes through [`SoapClient::call`]: envelope
//! construction, content-type/SOAPAction headers, the configured timeout and
//! TLS policy, and classification of failures into [`UpstreamError`]. The
//! login operation additionally runs a fixed protocol-version fallback, see
//! [`SoapClient::call_with_login_fallback`].

pub mod envelope;
pub mod unwrap;

use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::UpstreamConfig;
use envelope::SoapVersion;
use service_core::error::AppError;

/// Failure taxonomy for one upstream call. `Display` is the wire-facing
/// machine-readable code returned to API consumers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UpstreamError {
    /// Connection, timeout, or TLS failure. Never propagated as a fault.
    #[error("http_error: {0}")]
    Transport(String),

    /// The backend answered with a non-200 status.
    #[error("http_status_{0}")]
    Status(u16),

    /// The response body carried no extractable inner payload.
    #[error("empty_or_invalid_inner")]
    EmptyInner,

    /// The inner payload was present but not parseable XML.
    #[error("invalid_inner_xml")]
    InvalidInner,

    /// A well-formed response reporting a business failure.
    #[error("{0}")]
    Semantic(String),
}

impl UpstreamError {
    pub fn code(&self) -> String {
        self.to_string()
    }

    pub fn semantic(code: impl Into<String>) -> Self {
        UpstreamError::Semantic(code.into())
    }
}

/// Blocking-from-the-caller's-perspective SOAP transport. One instance per
/// process; `reqwest::Client` pools connections internally.
#[derive(Debug, Clone)]
pub struct SoapClient {
    http: reqwest::Client,
    endpoint: String,
    username: String,
    password: secrecy::SecretString,
}

impl SoapClient {
    pub fn new(cfg: &UpstreamConfig) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .danger_accept_invalid_certs(!cfg.verify_tls)
            .build()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("failed to build HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            endpoint: cfg.url.clone(),
            username: cfg.username.clone(),
            password: cfg.password.clone(),
        })
    }

    /// Perform one SOAP call and return the raw response body on HTTP 200.
    ///
    /// The service credentials are always the first two parameters of the
    /// operation element; `params` supplies the operation-specific rest.
    #[tracing::instrument(skip(self, params), fields(operation = %operation, version = ?version))]
    pub async fn call(
        &self,
        operation: &str,
        params: &[(&str, &str)],
        version: SoapVersion,
    ) -> Result<String, UpstreamError> {
        let mut all: Vec<(&str, &str)> = Vec::with_capacity(params.len() + 2);
        all.push(("userName", self.username.as_str()));
        all.push(("password", self.password.expose_secret().as_str()));
        all.extend_from_slice(params);

        let payload = envelope::build_envelope(version, operation, &all);

        let mut request = self
            .http
            .post(&self.endpoint)
            .header(CONTENT_TYPE, version.content_type(operation))
            .body(payload);
        if version.is_soap11() {
            request = request.header("SOAPAction", envelope::soap_action(operation));
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(operation = %operation, error = %e, "Upstream transport failure");
            UpstreamError::Transport(transport_detail(&e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            tracing::error!(operation = %operation, error = %e, "Failed reading upstream body");
            UpstreamError::Transport(transport_detail(&e))
        })?;

        if status != StatusCode::OK {
            tracing::error!(
                operation = %operation,
                status = status.as_u16(),
                head = %head(&body, 600),
                "Upstream non-200"
            );
            return Err(UpstreamError::Status(status.as_u16()));
        }

        Ok(body)
    }

    /// The login endpoint is picky about framing: try SOAP 1.2 plain, then
    /// SOAP 1.2 with the action in the content type, then SOAP 1.1, in that
    /// order, stopping at the first HTTP 200. The chain advances on either
    /// a transport failure or a non-200; the last attempt's failure is the
    /// call's failure. Preserved as observed against the live backend.
    pub async fn call_with_login_fallback(
        &self,
        operation: &str,
        params: &[(&str, &str)],
    ) -> Result<String, UpstreamError> {
        let mut last: Option<UpstreamError> = None;
        for version in [
            SoapVersion::Soap12,
            SoapVersion::Soap12Action,
            SoapVersion::Soap11,
        ] {
            match self.call(operation, params, version).await {
                Ok(body) => return Ok(body),
                Err(e) => {
                    tracing::warn!(
                        operation = %operation,
                        version = ?version,
                        error = %e,
                        "SOAP attempt failed, trying next framing"
                    );
                    last = Some(e);
                }
            }
        }
        Err(last.unwrap_or_else(|| UpstreamError::Transport("no attempt made".to_string())))
    }
}

fn transport_detail(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        "timeout".to_string()
    } else if e.is_connect() {
        "connect".to_string()
    } else {
        "request failed".to_string()
    }
}

fn head(s: &str, n: usize) -> String {
    s.chars().take(n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_codes_match_wire_contract() {
        assert_eq!(UpstreamError::Status(500).code(), "http_status_500");
        assert_eq!(UpstreamError::EmptyInner.code(), "empty_or_invalid_inner");
        assert_eq!(UpstreamError::InvalidInner.code(), "invalid_inner_xml");
        assert_eq!(
            UpstreamError::Transport("timeout".into()).code(),
            "http_error: timeout"
        );
        assert_eq!(UpstreamError::semantic("not_logged").code(), "not_logged");
    }
}
