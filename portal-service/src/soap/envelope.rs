//! SOAP envelope construction.
//!
//! The backend exposes every operation under the `http://tempuri.org/`
//! namespace and accepts both SOAP 1.1 and SOAP 1.2 framing. Envelopes are
//! built from a fixed shell per protocol version; the operation element and
//! its parameters are the only variable parts, and every substituted value
//! is XML-escaped before insertion.

use quick_xml::escape::escape;

pub const TEMPURI_NS: &str = "http://tempuri.org/";

/// Protocol framing for one outbound call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoapVersion {
    /// `text/xml` body plus an explicit `SOAPAction` header.
    Soap11,
    /// `application/soap+xml` body, no action parameter.
    Soap12,
    /// `application/soap+xml` with the action embedded in the content type.
    /// Some deployments of the backend insist on this form.
    Soap12Action,
}

impl SoapVersion {
    pub fn content_type(&self, operation: &str) -> String {
        match self {
            SoapVersion::Soap11 => "text/xml; charset=utf-8".to_string(),
            SoapVersion::Soap12 => "application/soap+xml; charset=utf-8".to_string(),
            SoapVersion::Soap12Action => format!(
                "application/soap+xml; charset=utf-8; action=\"{}{}\"",
                TEMPURI_NS, operation
            ),
        }
    }

    pub fn is_soap11(&self) -> bool {
        matches!(self, SoapVersion::Soap11)
    }
}

/// `SOAPAction` header value for SOAP 1.1 calls. The quotes are part of the
/// wire format.
pub fn soap_action(operation: &str) -> String {
    format!("\"{}{}\"", TEMPURI_NS, operation)
}

/// Build a complete envelope for `operation` with the given parameter pairs,
/// in document order. Values are escaped; element names come from the fixed
/// per-operation parameter lists and are never caller-controlled.
pub fn build_envelope(version: SoapVersion, operation: &str, params: &[(&str, &str)]) -> String {
    let mut op = String::new();
    op.push_str(&format!("    <{} xmlns=\"{}\">\n", operation, TEMPURI_NS));
    for (name, value) in params {
        op.push_str(&format!("      <{}>{}</{}>\n", name, escape(*value), name));
    }
    op.push_str(&format!("    </{}>\n", operation));

    match version {
        SoapVersion::Soap11 => format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
               xmlns:xsd="http://www.w3.org/2001/XMLSchema"
               xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
{}  </soap:Body>
</soap:Envelope>
"#,
            op
        ),
        SoapVersion::Soap12 | SoapVersion::Soap12Action => format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap12:Envelope xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
                 xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                 xmlns:soap12="http://www.w3.org/2003/05/soap-envelope">
  <soap12:Body>
{}  </soap12:Body>
</soap12:Envelope>
"#,
            op
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn substituted_values_are_escaped() {
        let envelope = build_envelope(
            SoapVersion::Soap11,
            "Login",
            &[("pinCode", "A&B<C>\"quoted\"'q'")],
        );
        assert!(envelope.contains("<pinCode>A&amp;B&lt;C&gt;&quot;quoted&quot;&apos;q&apos;</pinCode>"));
        assert!(!envelope.contains("A&B<C>"));
    }

    #[test]
    fn soap11_envelope_uses_soap_namespace() {
        let envelope = build_envelope(SoapVersion::Soap11, "GetSpecialities", &[]);
        assert!(envelope.contains("http://schemas.xmlsoap.org/soap/envelope/"));
        assert!(envelope.contains("<GetSpecialities xmlns=\"http://tempuri.org/\">"));
    }

    #[test]
    fn soap12_envelope_uses_soap12_namespace() {
        let envelope = build_envelope(SoapVersion::Soap12, "Login", &[("phoneNumber", "55512345")]);
        assert!(envelope.contains("http://www.w3.org/2003/05/soap-envelope"));
        assert!(envelope.contains("<phoneNumber>55512345</phoneNumber>"));
    }

    #[test]
    fn content_types_per_version() {
        assert_eq!(
            SoapVersion::Soap11.content_type("Login"),
            "text/xml; charset=utf-8"
        );
        assert_eq!(
            SoapVersion::Soap12.content_type("Login"),
            "application/soap+xml; charset=utf-8"
        );
        assert_eq!(
            SoapVersion::Soap12Action.content_type("Login"),
            "application/soap+xml; charset=utf-8; action=\"http://tempuri.org/Login\""
        );
    }

    #[test]
    fn soap_action_is_quoted() {
        assert_eq!(soap_action("GetDoctorCareer"), "\"http://tempuri.org/GetDoctorCareer\"");
    }
}
