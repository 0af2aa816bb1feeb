//! Embedded page templates.
//!
//! Page look-and-feel is out of scope; these templates exist so the login
//! flow and the record pages have something to render. Replacing them with a
//! designed frontend does not touch any handler logic.

use minijinja::Environment;
use service_core::error::AppError;

pub fn build_environment() -> Result<Environment<'static>, AppError> {
    let mut env = Environment::new();
    for (name, source) in [
        ("layout.html", include_str!("../templates/layout.html")),
        ("login.html", include_str!("../templates/login.html")),
        ("otp.html", include_str!("../templates/otp.html")),
        ("home.html", include_str!("../templates/home.html")),
        ("records.html", include_str!("../templates/records.html")),
        ("message.html", include_str!("../templates/message.html")),
    ] {
        env.add_template(name, source)
            .map_err(|e| AppError::TemplateError(format!("{}: {}", name, e)))?;
    }
    Ok(env)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_templates_compile() {
        build_environment().unwrap();
    }
}
