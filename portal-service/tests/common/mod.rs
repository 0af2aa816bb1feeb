//! Shared helpers for portal-service integration tests.
//!
//! Tests drive the real router with `tower::ServiceExt::oneshot` and point
//! the SOAP client at a wiremock server standing in for the insurer backend.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response};
use portal_service::config::{
    Environment, LoginGateConfig, OtpConfig, PortalConfig, SecurityConfig, SwaggerConfig,
    SwaggerMode, UpstreamConfig,
};
use portal_service::models::{AuthStage, Session};
use portal_service::{build_router, AppState};
use secrecy::SecretString;
use tower::util::ServiceExt;
use uuid::Uuid;
use wiremock::MockServer;

pub struct TestApp {
    pub router: axum::Router,
    pub state: AppState,
    pub upstream: MockServer,
}

pub fn test_config(upstream_url: &str) -> PortalConfig {
    PortalConfig {
        common: service_core::config::Config { port: 8080 },
        environment: Environment::Dev,
        service_name: "portal-service-test".to_string(),
        service_version: "0.0.0".to_string(),
        log_level: "error".to_string(),
        upstream: UpstreamConfig {
            url: upstream_url.to_string(),
            username: "svc-user".to_string(),
            password: SecretString::new("svc-pass".to_string()),
            timeout_seconds: 5,
            verify_tls: true,
        },
        security: SecurityConfig {
            allowed_origins: Vec::new(),
        },
        otp: OtpConfig {
            ttl_seconds: 60,
            max_attempts: 3,
        },
        login: LoginGateConfig { captcha_after: 3 },
        swagger: SwaggerConfig {
            enabled: SwaggerMode::Disabled,
        },
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|config| config).await
}

pub async fn spawn_app_with(customize: impl FnOnce(PortalConfig) -> PortalConfig) -> TestApp {
    let upstream = MockServer::start().await;
    let config = customize(test_config(&upstream.uri()));
    let state = AppState::from_config(config).expect("failed to build test state");
    let router = build_router(state.clone())
        .await
        .expect("failed to build test router");
    TestApp {
        router,
        state,
        upstream,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(req).await.unwrap()
    }

    /// Insert an authenticated session straight into the store and return
    /// the matching cookie header value.
    pub async fn seed_authenticated(&self, pin: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let session = Session {
            stage: AuthStage::Authenticated,
            name: Some("Test".to_string()),
            surname: Some("User".to_string()),
            phone_number: Some("5551234".to_string()),
            pin_code: Some(pin.to_string()),
            ..Session::default()
        };
        self.state.sessions.put(&id, session).await;
        format!("portal_sid={}", id)
    }

    pub async fn seed_session(&self, session: Session) -> String {
        let id = Uuid::new_v4().to_string();
        self.state.sessions.put(&id, session).await;
        format!("portal_sid={}", id)
    }

    pub async fn session_for(&self, cookie: &str) -> Option<Session> {
        let id = cookie.strip_prefix("portal_sid=")?;
        self.state.sessions.get(id).await
    }
}

// ---------------------------------------------------------------------------
// Request builders
// ---------------------------------------------------------------------------

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn form_post(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn json_post(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Pull the `portal_sid` cookie out of a response's `set-cookie` header.
pub fn session_cookie(res: &Response<Body>) -> Option<String> {
    let value = res.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    let pair = value.split(';').next()?;
    pair.starts_with("portal_sid=").then(|| pair.to_string())
}

pub async fn body_string(res: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub async fn body_json(res: Response<Body>) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ---------------------------------------------------------------------------
// Canned backend responses
// ---------------------------------------------------------------------------

fn escape_inner(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// A SOAP response body carrying `inner_xml` entity-escaped inside the
/// operation's result element, the way the backend double-encodes it.
pub fn soap_result(operation: &str, inner_xml: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
         <soap:Envelope xmlns:soap=\"http://schemas.xmlsoap.org/soap/envelope/\">\
         <soap:Body><{op}Response xmlns=\"http://tempuri.org/\">\
         <{op}Result>{inner}</{op}Result>\
         </{op}Response></soap:Body></soap:Envelope>",
        op = operation,
        inner = escape_inner(inner_xml)
    )
}

pub fn login_ok_body(name: &str, surname: &str) -> String {
    soap_result(
        "Login",
        &format!(
            "<DocumentElement><LOGIN><IS_LOGGED>1</IS_LOGGED>\
             <NAME>{}</NAME><SURNAME>{}</SURNAME></LOGIN></DocumentElement>",
            name, surname
        ),
    )
}

pub fn login_rejected_body() -> String {
    soap_result(
        "Login",
        "<DocumentElement><LOGIN><IS_LOGGED>0</IS_LOGGED></LOGIN></DocumentElement>",
    )
}

pub fn otp_ok_body(code: &str) -> String {
    soap_result(
        "CreateOTPAndSendSMS",
        &format!(
            "<DocumentElement><OTP><Code>{}</Code><Result>OK</Result></OTP></DocumentElement>",
            code
        ),
    )
}

pub fn policies_body() -> String {
    soap_result(
        "GetCustomerPolicies",
        "<DocumentElement>\
         <POLICIES><POLICY_NUMBER>P-1</POLICY_NUMBER><STATUS>active</STATUS></POLICIES>\
         <POLICIES><POLICY_NUMBER>P-2</POLICY_NUMBER><STATUS>expired</STATUS></POLICIES>\
         </DocumentElement>",
    )
}
