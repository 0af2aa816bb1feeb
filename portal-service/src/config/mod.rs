use secrecy::SecretString;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone)]
pub struct PortalConfig {
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub upstream: UpstreamConfig,
    pub security: SecurityConfig,
    pub otp: OtpConfig,
    pub login: LoginGateConfig,
    pub swagger: SwaggerConfig,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Environment {
    Dev,
    Prod,
}

/// The single configured SOAP endpoint and the shared service credentials
/// embedded in every call body.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub url: String,
    pub username: String,
    pub password: SecretString,
    pub timeout_seconds: u64,
    pub verify_tls: bool,
}

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    pub allowed_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub ttl_seconds: i64,
    pub max_attempts: u32,
}

#[derive(Debug, Clone)]
pub struct LoginGateConfig {
    /// Failed credential submissions before the CAPTCHA gate engages.
    pub captcha_after: u32,
}

#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub enabled: SwaggerMode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SwaggerMode {
    Public,
    Disabled,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = PortalConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("portal-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            upstream: UpstreamConfig {
                url: get_env("UPSTREAM_URL", None, is_prod)?,
                username: get_env("UPSTREAM_USERNAME", None, is_prod)?,
                password: SecretString::new(get_env("UPSTREAM_PASSWORD", None, is_prod)?),
                timeout_seconds: parse_env("UPSTREAM_TIMEOUT_SECONDS", "15", is_prod)?,
                verify_tls: parse_env("UPSTREAM_VERIFY_TLS", "true", is_prod)?,
            },
            security: SecurityConfig {
                allowed_origins: get_env("ALLOWED_ORIGINS", Some(""), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
            },
            otp: OtpConfig {
                ttl_seconds: parse_env("OTP_TTL_SECONDS", "60", is_prod)?,
                max_attempts: parse_env("OTP_MAX_ATTEMPTS", "3", is_prod)?,
            },
            login: LoginGateConfig {
                captcha_after: parse_env("LOGIN_CAPTCHA_AFTER", "3", is_prod)?,
            },
            swagger: SwaggerConfig {
                enabled: get_env("ENABLE_SWAGGER", Some("public"), is_prod)?
                    .parse()
                    .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), AppError> {
        if self.common.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "PORT must be greater than 0"
            )));
        }

        if self.upstream.url.trim().is_empty() {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "UPSTREAM_URL must not be empty"
            )));
        }

        if self.otp.ttl_seconds <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "OTP_TTL_SECONDS must be positive"
            )));
        }

        if self.otp.max_attempts == 0 || self.login.captcha_after == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "OTP_MAX_ATTEMPTS and LOGIN_CAPTCHA_AFTER must be at least 1"
            )));
        }

        if self.environment == Environment::Prod {
            if !self.upstream.verify_tls {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "UPSTREAM_VERIFY_TLS cannot be disabled in production"
                )));
            }
            if self.security.allowed_origins.iter().any(|o| o == "*") {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "Wildcard CORS origin not allowed in production"
                )));
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

fn parse_env<T>(key: &str, default: &str, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_env(key, Some(default), is_prod)?.parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("invalid value for {}: {}", key, e))
    })
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}

impl std::str::FromStr for SwaggerMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "public" => Ok(SwaggerMode::Public),
            "disabled" => Ok(SwaggerMode::Disabled),
            _ => Err(format!("Invalid swagger mode: {}", s)),
        }
    }
}
