mod common;

use std::sync::Arc;

use dashboard_api_client::{
    ApiClient, Config, ErrorKind, InMemorySession, ResponseBody, SessionStore,
};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::json;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use common::{client, client_with, mount_csrf};

fn anonymous() -> Arc<InMemorySession> {
    Arc::new(InMemorySession::new())
}

#[tokio::test]
async fn malformed_urls_fail_without_touching_the_network() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let cases = [
        ("not a url".to_string(), "/countries"),
        ("ftp://files.example.com".to_string(), "/countries"),
        (String::new(), "/countries"),
        ("mailto:admin@example.com".to_string(), ""),
        (server.uri(), ":notaport/countries"),
    ];
    for (base, target) in cases {
        let client = client_with(Config::new(base.clone()), anonymous());
        let err = client
            .post(target, Some(&json!({ "name": "x" })), None)
            .await
            .expect_err("malformed url must fail");
        assert_eq!(err.kind(), ErrorKind::InvalidUrl, "base={base} path={target}");
        assert_eq!(err.status, 400);
        assert_eq!(err.message, "Invalid request URL");
    }
}

#[tokio::test]
async fn non_2xx_responses_are_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cities/404"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({ "error": "gone" })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cities/500"))
        .respond_with(ResponseTemplate::new(500).set_body_string("stack trace"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cities/422"))
        .respond_with(
            ResponseTemplate::new(422).set_body_json(json!({ "message": "name is required" })),
        )
        .mount(&server)
        .await;

    let client = client(&server, anonymous());

    let err = client.get("/cities/404").await.expect_err("404");
    assert_eq!(err.status, 404);
    assert_eq!(err.message, "Error 404: Not Found");
    assert_eq!(err.data, Some(json!({ "error": "gone" })));

    let err = client.get("/cities/500").await.expect_err("500");
    assert_eq!(err.status, 500);
    assert_eq!(err.message, "Error 500: Internal Server Error");
    assert_eq!(err.data, Some(json!("stack trace")));

    let err = client.get("/cities/422").await.expect_err("422");
    assert_eq!(err.message, "name is required");
    assert_eq!(err.kind(), ErrorKind::Http);
}

#[tokio::test]
async fn unreachable_server_reports_status_zero() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let client = client_with(
        Config::new(format!("http://127.0.0.1:{port}")),
        anonymous(),
    );

    let err = client.get("/countries").await.expect_err("nothing listens");
    assert_eq!(err.status, 0);
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(err.message, "Network error: unable to reach the server");
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
struct Partner {
    name: String,
    tax_id: String,
    tags: Vec<String>,
    active: bool,
}

#[tokio::test]
async fn json_body_round_trips_through_an_echo() {
    let server = MockServer::start().await;
    mount_csrf(&server, "csrf-1").await;
    Mock::given(method("POST"))
        .and(path("/partners"))
        .respond_with(|req: &Request| {
            ResponseTemplate::new(200).set_body_raw(req.body.clone(), "application/json")
        })
        .expect(1)
        .mount(&server)
        .await;

    let partner = Partner {
        name: "Acme".into(),
        tax_id: "20-123".into(),
        tags: vec!["supplier".into(), "priority".into()],
        active: true,
    };
    let client = client(&server, anonymous());
    let echoed: Partner = client
        .post("/partners", Some(&partner), None)
        .await
        .expect("echo succeeds")
        .into_json()
        .expect("json body");
    assert_eq!(echoed, partner);
}

#[tokio::test]
async fn get_and_head_never_send_a_body() {
    let server = MockServer::start().await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client(&server, anonymous());
    for verb in [Method::GET, Method::HEAD] {
        client
            .request(verb, "/employees", Some(json!({ "ignored": true })), None)
            .await
            .expect("request succeeds");
    }

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    assert!(requests.iter().all(|r| r.body.is_empty()));
    assert!(
        requests
            .iter()
            .all(|r| r.headers.get("x-csrf-token").is_none()),
        "read-only verbs carry no csrf header"
    );
}

#[tokio::test]
async fn content_type_decides_how_the_body_is_parsed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/text"))
        .respond_with(ResponseTemplate::new(200).set_body_string("plain words"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{not json", "application/json"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/nothing"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client(&server, anonymous());
    assert_eq!(
        client.get("/text").await.unwrap(),
        ResponseBody::Text("plain words".into())
    );
    assert_eq!(client.get("/broken").await.unwrap(), ResponseBody::Empty);
    assert_eq!(client.get("/nothing").await.unwrap(), ResponseBody::Empty);
}

#[tokio::test]
async fn authenticated_requests_carry_bearer_and_client_scope() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/invoices"))
        .and(header("Authorization", "Bearer tok-1"))
        .and(header("X-Client-Id", "client-9"))
        .and(header("X-Requested-With", "XMLHttpRequest"))
        .and(header("Content-Type", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let session = Arc::new(InMemorySession::new());
    session.set_session("tok-1", "user-1");
    session.set_client_id(Some("client-9"));
    let client: ApiClient = client(&server, session);

    let body = client.get("/invoices").await.expect("headers matched");
    assert_eq!(body.as_json(), Some(&json!([])));
}

#[tokio::test]
async fn supplied_csrf_token_skips_the_provider() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/csrf-token"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/countries"))
        .and(header("X-CSRF-TOKEN", "pre-fetched"))
        .and(body_json(json!({ "name": "Chile" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 3 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = client(&server, anonymous());
    let body = client
        .post("/countries", Some(&json!({ "name": "Chile" })), Some("pre-fetched"))
        .await
        .expect("created");
    assert_eq!(body.as_json(), Some(&json!({ "id": 3 })));
}

#[tokio::test]
async fn csrf_token_can_be_fetched_up_front() {
    let server = MockServer::start().await;
    mount_csrf(&server, "tok-abc").await;

    let client = client(&server, anonymous());
    let csrf = client.fetch_csrf_token().await.expect("csrf fetch");
    assert_eq!(csrf.token, "tok-abc");
    assert_eq!(csrf.header_name, "X-CSRF-TOKEN");
    assert_eq!(csrf.parameter_name, "_csrf");
}

#[tokio::test]
async fn csrf_provider_failure_is_reported_to_direct_callers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/auth/csrf-token"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client(&server, anonymous());
    let err = client.fetch_csrf_token().await.expect_err("provider down");
    assert_eq!(err.status, 503);
}
