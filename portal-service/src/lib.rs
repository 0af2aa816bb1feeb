pub mod auth_flow;
pub mod captcha;
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod session_store;
pub mod soap;
pub mod templates;
pub mod upstream;

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    middleware::{from_fn, from_fn_with_state},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::auth_flow::AuthFlow;
use crate::captcha::{CaptchaRenderer, SvgCaptchaRenderer};
use crate::config::{Environment, PortalConfig, SwaggerMode};
use crate::session_store::{MemorySessionStore, SessionStore};
use crate::soap::SoapClient;
use service_core::error::AppError;
use service_core::middleware::{
    security_headers::security_headers_middleware, tracing::request_id_middleware,
};

#[derive(OpenApi)]
#[openapi(
    paths(
        health_check,
        handlers::api::policies,
        handlers::api::policy_info,
        handlers::api::specialities,
        handlers::api::doctors_by_speciality,
        handlers::api::doctor_career,
        handlers::api::medical_complaints,
        handlers::api::non_medical_complaints,
        handlers::api::register_doctor,
    ),
    components(schemas(
        dtos::api::ApiFailure,
        dtos::api::PolicyInfoRequest,
        dtos::api::RegisterDoctorRequest,
        dtos::api::PoliciesResponse,
        dtos::api::PolicyInfoResponse,
        dtos::api::SpecialitiesResponse,
        dtos::api::DoctorsResponse,
        dtos::api::DoctorCareerResponse,
        dtos::api::ComplaintsResponse,
        dtos::api::RegisterDoctorResponse,
    )),
    tags(
        (name = "Portal API", description = "Authenticated JSON endpoints for the portal frontend"),
        (name = "Observability", description = "Service health and monitoring")
    )
)]
pub struct ApiDoc;

#[derive(Clone)]
pub struct AppState {
    pub config: PortalConfig,
    pub soap: Arc<SoapClient>,
    pub sessions: Arc<dyn SessionStore>,
    pub auth_flow: AuthFlow,
    pub captcha: Arc<dyn CaptchaRenderer>,
    pub templates: Arc<minijinja::Environment<'static>>,
}

impl AppState {
    /// Wire up the default collaborators: the shared SOAP client, the
    /// in-process session store, and the built-in CAPTCHA renderer.
    pub fn from_config(config: PortalConfig) -> Result<Self, AppError> {
        let soap = Arc::new(SoapClient::new(&config.upstream)?);
        let auth_flow = AuthFlow::new(soap.clone(), config.otp.clone(), config.login.clone());
        Ok(Self {
            soap,
            auth_flow,
            sessions: Arc::new(MemorySessionStore::new()),
            captcha: Arc::new(SvgCaptchaRenderer),
            templates: Arc::new(templates::build_environment()?),
            config,
        })
    }
}

pub async fn build_router(state: AppState) -> Result<Router, AppError> {
    let mut app = Router::new().route("/health", get(health_check));

    let swagger_enabled = match state.config.environment {
        Environment::Dev => true,
        Environment::Prod => state.config.swagger.enabled == SwaggerMode::Public,
    };
    if swagger_enabled {
        app =
            app.merge(SwaggerUi::new("/docs").url("/.well-known/openapi.json", ApiDoc::openapi()));
    } else {
        // Swagger UI off, but keep the OpenAPI JSON for programmatic access
        app = app.route(
            "/.well-known/openapi.json",
            get(|| async { Json(ApiDoc::openapi()) }),
        );
    }

    let app = app
        // Pages
        .route("/", get(handlers::pages::home))
        .route(
            "/login",
            get(handlers::auth::login_page).post(handlers::auth::login_submit),
        )
        .route("/login/captcha", get(handlers::auth::captcha_image))
        .route("/logout", get(handlers::auth::logout))
        .route("/policies/", get(handlers::pages::policies))
        .route("/doctors/", get(handlers::pages::doctors))
        .route(
            "/doctors/:speciality_id/",
            get(handlers::pages::doctors_by_speciality),
        )
        .route(
            "/doctors/:speciality_id/:doctor_id/",
            get(handlers::pages::doctor_detail),
        )
        .route("/complaints/", get(handlers::pages::complaints))
        .route(
            "/complaints-not-medical/",
            get(handlers::pages::complaints_not_medical),
        )
        .route("/refund/", get(handlers::pages::refund))
        // JSON API
        .route("/api/policies", get(handlers::api::policies))
        .route("/api/policy-info", post(handlers::api::policy_info))
        .route("/api/specialities", get(handlers::api::specialities))
        .route(
            "/api/doctors/:speciality_id",
            get(handlers::api::doctors_by_speciality),
        )
        .route(
            "/api/doctor-career/:doctor_id",
            get(handlers::api::doctor_career),
        )
        .route(
            "/api/medical-complaints",
            get(handlers::api::medical_complaints),
        )
        .route(
            "/api/non-medical-complaints",
            get(handlers::api::non_medical_complaints),
        )
        .route("/api/register-doctor", post(handlers::api::register_doctor))
        // Session resolution for everything above
        .layer(from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ))
        .with_state(state.clone())
        // Handler panics become a JSON 500 instead of a dropped connection
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("-");

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                )
            }),
        )
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware));

    let app = if state.config.security.allowed_origins.is_empty() {
        app
    } else {
        app.layer(
            CorsLayer::new()
                .allow_origin(
                    state
                        .config
                        .security
                        .allowed_origins
                        .iter()
                        .filter_map(|o| {
                            o.parse::<axum::http::HeaderValue>()
                                .map_err(|e| {
                                    tracing::error!("Invalid CORS origin '{}': {}", o, e);
                                    e
                                })
                                .ok()
                        })
                        .collect::<Vec<axum::http::HeaderValue>>(),
                )
                .allow_methods([axum::http::Method::GET, axum::http::Method::POST])
                .allow_headers([axum::http::header::CONTENT_TYPE]),
        )
    };

    Ok(app)
}

/// Service health check
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is healthy")),
    tag = "Observability"
)]
pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "service": state.config.service_name,
        "version": state.config.service_version,
        "environment": format!("{:?}", state.config.environment),
    }))
}

fn handle_panic(err: Box<dyn std::any::Any + Send + 'static>) -> axum::response::Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unhandled panic".to_string()
    };
    tracing::error!(panic = %detail, "Request handler panicked");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "ok": false, "error": format!("internal_error: {}", detail) })),
    )
        .into_response()
}
