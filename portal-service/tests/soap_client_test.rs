//! SOAP adapter behavior against a mock backend: login framing fallback,
//! single-version calls, escaping, and failure classification.

mod common;

use std::time::Duration;

use portal_service::soap::SoapClient;
use portal_service::upstream;
use wiremock::matchers::{body_string_contains, header, method};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{login_ok_body, policies_body, soap_result, test_config};

const SOAP12_PLAIN: &str = "application/soap+xml; charset=utf-8";
const SOAP12_ACTION: &str =
    "application/soap+xml; charset=utf-8; action=\"http://tempuri.org/Login\"";
const SOAP11: &str = "text/xml; charset=utf-8";

fn client_for(server: &MockServer) -> SoapClient {
    SoapClient::new(&test_config(&server.uri()).upstream).unwrap()
}

#[tokio::test]
async fn login_fallback_walks_all_three_framings() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("content-type", SOAP12_PLAIN))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("content-type", SOAP12_ACTION))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("content-type", SOAP11))
        .and(header("SOAPAction", "\"http://tempuri.org/Login\""))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_ok_body("Ada", "Q")))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let identity = upstream::login::verify_login(&client, "PIN1", "POL1", "5551234")
        .await
        .unwrap();
    assert_eq!(identity.name, "Ada");

    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn login_fallback_stops_at_first_200() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("content-type", SOAP12_PLAIN))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_ok_body("Ada", "Q")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("content-type", SOAP12_ACTION))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_ok_body("Ada", "Q")))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("content-type", SOAP11))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_ok_body("Ada", "Q")))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(upstream::login::verify_login(&client, "PIN1", "POL1", "5551234")
        .await
        .is_ok());
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn login_soap12_action_tried_before_soap11() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("content-type", SOAP12_PLAIN))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("content-type", SOAP12_ACTION))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_ok_body("Ada", "Q")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(header("content-type", SOAP11))
        .respond_with(ResponseTemplate::new(200).set_body_string(login_ok_body("Ada", "Q")))
        .expect(0)
        .mount(&server)
        .await;

    let client = client_for(&server);
    assert!(upstream::login::verify_login(&client, "PIN1", "POL1", "5551234")
        .await
        .is_ok());
}

#[tokio::test]
async fn login_transport_failure_on_every_framing_surfaces_http_error() {
    // closed port: every attempt is a connection failure
    let mut config = test_config("http://127.0.0.1:9/insurance.asmx");
    config.upstream.timeout_seconds = 1;
    let client = SoapClient::new(&config.upstream).unwrap();

    let err = upstream::login::verify_login(&client, "PIN1", "POL1", "5551234")
        .await
        .unwrap_err();
    assert!(err.code().starts_with("http_error"), "got {}", err.code());
}

#[tokio::test]
async fn non_login_operations_use_soap11_without_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(header("SOAPAction", "\"http://tempuri.org/GetCustomerPolicies\""))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = upstream::policy::customer_policies(&client, "PIN1")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "http_status_500");
    // no protocol fallback outside the login operation
    assert_eq!(server.received_requests().await.unwrap().len(), 1);
}

#[tokio::test]
async fn parameter_values_are_escaped_on_the_wire() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(body_string_contains("<userName>svc-user</userName>"))
        .and(body_string_contains(
            "<pinCode>O&apos;Brien &amp; Sons &lt;Ltd&gt;</pinCode>",
        ))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(soap_result("GetCustomerPolicies", "<DocumentElement/>")),
        )
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server);
    let records = upstream::policy::customer_policies(&client, "O'Brien & Sons <Ltd>")
        .await
        .unwrap();
    assert!(records.is_empty());
}

#[tokio::test]
async fn timeout_classifies_as_transport_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(policies_body())
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let mut config = test_config(&server.uri());
    config.upstream.timeout_seconds = 1;
    let client = SoapClient::new(&config.upstream).unwrap();

    let err = upstream::policy::customer_policies(&client, "PIN1")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "http_error: timeout");
}

#[tokio::test]
async fn empty_result_element_is_empty_or_invalid_inner() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(soap_result("GetCustomerPolicies", "  ")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = upstream::policy::customer_policies(&client, "PIN1")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "empty_or_invalid_inner");
}

#[tokio::test]
async fn garbage_inner_is_invalid_inner_xml() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(soap_result("GetCustomerPolicies", "<open><unclosed>")),
        )
        .mount(&server)
        .await;

    let client = client_for(&server);
    let err = upstream::policy::customer_policies(&client, "PIN1")
        .await
        .unwrap_err();
    assert_eq!(err.code(), "invalid_inner_xml");
}
