//! Request runner against a real HTTP server

use httpmock::prelude::*;
use odata_cli::api::{
    Credentials, FailureKind, ODataRequest, RequestError, RequestRunner, RestVerb, Transport,
    TransportConfig, TransportFactory, TransportFailureKind, ReqwestTransportFactory,
    preference_applied,
};
use serde_json::json;
use std::net::TcpListener;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn runner() -> RequestRunner {
    RequestRunner::new(TransportConfig::default())
}

fn request(method: RestVerb, server: &MockServer, path: &str) -> ODataRequest {
    ODataRequest::parse(method, &server.url(path)).unwrap()
}

#[tokio::test]
async fn test_return_content_sends_prefer_header() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/svc/Products")
                .header("prefer", "return-content");
            then.status(201)
                .header("preference-applied", "return-content")
                .json_body(json!({"ID": 7, "Name": "Chai"}));
        })
        .await;

    let req = request(RestVerb::Post, &server, "/svc/Products")
        .with_json(&json!({"Name": "Chai"}))
        .unwrap()
        .with_return_content(true);

    let response = runner().execute(req, &CancellationToken::new()).await.unwrap();
    mock.assert_async().await;

    assert_eq!(response.status(), 201);
    assert_eq!(preference_applied(&response), Some("return-content"));

    // body is left for the caller
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["ID"], 7);
}

#[tokio::test]
async fn test_no_return_content_sends_prefer_header() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(PUT)
                .path("/svc/Products(1)")
                .header("prefer", "return-no-content");
            then.status(204);
        })
        .await;

    let req = request(RestVerb::Put, &server, "/svc/Products(1)").with_return_content(false);
    runner().execute(req, &CancellationToken::new()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_with_concurrency_check_sends_if_match() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/svc/Products(1)")
                .header("if-match", "*");
            then.status(204);
        })
        .await;

    let req = request(RestVerb::Delete, &server, "/svc/Products(1)").with_optimistic_concurrency(true);
    runner().execute(req, &CancellationToken::new()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_delete_without_concurrency_check_omits_if_match() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(DELETE)
                .path("/svc/Products(1)")
                .header_missing("if-match");
            then.status(204);
        })
        .await;

    let req = request(RestVerb::Delete, &server, "/svc/Products(1)");
    runner().execute(req, &CancellationToken::new()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_get_never_sends_if_match() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/svc/Products").header_missing("if-match");
            then.status(200).json_body(json!({"value": []}));
        })
        .await;

    let req = request(RestVerb::Get, &server, "/svc/Products").with_optimistic_concurrency(true);
    runner().execute(req, &CancellationToken::new()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_merge_carries_if_match() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.path("/svc/Products(1)").header("if-match", "*");
            then.status(204);
        })
        .await;

    let req = request(RestVerb::Merge, &server, "/svc/Products(1)")
        .with_json(&json!({"Name": "Chang"}))
        .unwrap()
        .with_optimistic_concurrency(true);
    runner().execute(req, &CancellationToken::new()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_accept_types_are_sent() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/svc/$metadata")
                .header("accept", "application/xml, application/json");
            then.status(200).body("<edmx:Edmx/>");
        })
        .await;

    let req = request(RestVerb::Get, &server, "/svc/$metadata")
        .with_accept("application/xml")
        .with_accept("application/json");
    runner().execute(req, &CancellationToken::new()).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_basic_credentials_are_pre_authenticated() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/svc/Orders")
                // alice:pw
                .header("authorization", "Basic YWxpY2U6cHc=");
            then.status(200);
        })
        .await;

    let req = request(RestVerb::Get, &server, "/svc/Orders")
        .with_credentials(Credentials::basic("alice", "pw"));
    runner().execute(req, &CancellationToken::new()).await.unwrap();
    mock.assert_hits_async(1).await;
}

#[tokio::test]
async fn test_transport_without_pre_authentication_sends_once() {
    let server = MockServer::start_async().await;
    let challenge = server
        .mock_async(|when, then| {
            when.path("/svc/Orders").header_missing("authorization");
            then.status(401).header("www-authenticate", "Bearer realm=\"svc\"");
        })
        .await;
    let authorized = server
        .mock_async(|when, then| {
            when.path("/svc/Orders").header_exists("authorization");
            then.status(200);
        })
        .await;

    let mut transport = ReqwestTransportFactory::default().acquire().unwrap();
    assert!(transport.supports_pre_authenticate());
    transport.set_credentials(Credentials::bearer("tok"));
    transport.set_pre_authenticate(false);

    let http_request = reqwest::Request::new(
        reqwest::Method::GET,
        server.url("/svc/Orders").parse().unwrap(),
    );
    let response = transport.send(http_request).await.unwrap();

    // the challenge comes back as-is, nothing is resent
    assert_eq!(response.status(), 401);
    challenge.assert_hits_async(1).await;
    authorized.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_not_found_is_request_failure_with_status() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/svc/Nope");
            then.status(404).header("odata-version", "4.0");
        })
        .await;

    let err = runner()
        .execute(request(RestVerb::Get, &server, "/svc/Nope"), &CancellationToken::new())
        .await
        .unwrap_err();

    let failure = err.failure().expect("404 should be a request failure");
    assert_eq!(failure.status_code(), Some(404));
    assert_eq!(failure.reason_phrase(), "Not Found");
    assert_eq!(failure.kind(), FailureKind::Http);
    assert_eq!(failure.headers().get("odata-version").map(String::as_str), Some("4.0"));
}

#[tokio::test]
async fn test_server_reason_phrase_is_kept() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = socket.read(&mut buf).await.unwrap();
        socket
            .write_all(
                b"HTTP/1.1 404 Entity Set Products Missing\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
            )
            .await
            .unwrap();
    });

    let req = ODataRequest::parse(RestVerb::Get, &format!("http://{}/svc/Products", addr)).unwrap();
    let err = runner().execute(req, &CancellationToken::new()).await.unwrap_err();

    let failure = err.failure().expect("404 should be a request failure");
    assert_eq!(failure.status_code(), Some(404));
    assert_eq!(failure.reason_phrase(), "Entity Set Products Missing");
}

#[tokio::test]
async fn test_connection_refused_is_request_failure_without_status() {
    // Grab a free port, then close it so nothing is listening
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let req = ODataRequest::parse(RestVerb::Get, &format!("http://127.0.0.1:{}/svc", port)).unwrap();
    let err = runner().execute(req, &CancellationToken::new()).await.unwrap_err();

    let failure = match err {
        RequestError::Failure(failure) => failure,
        other => panic!("expected a request failure, got {:?}", other),
    };
    assert_eq!(failure.status_code(), None);
    assert_eq!(failure.kind(), FailureKind::Transport(TransportFailureKind::Connect));
}

#[tokio::test]
async fn test_transport_timeout_is_classified() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/svc/Slow");
            then.status(200).delay(Duration::from_secs(2));
        })
        .await;

    let config = TransportConfig {
        timeout: Some(Duration::from_millis(100)),
        ..TransportConfig::default()
    };
    let err = RequestRunner::new(config)
        .execute(request(RestVerb::Get, &server, "/svc/Slow"), &CancellationToken::new())
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), None);
    assert_eq!(
        err.failure().map(|f| f.kind()),
        Some(FailureKind::Transport(TransportFailureKind::Timeout))
    );
}

#[tokio::test]
async fn test_cancellation_during_send() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/svc/Slow");
            then.status(200).delay(Duration::from_secs(5));
        })
        .await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let err = runner()
        .execute(request(RestVerb::Get, &server, "/svc/Slow"), &cancel)
        .await
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(started.elapsed() < Duration::from_secs(4));
}

#[tokio::test]
async fn test_hooks_observe_real_exchange() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/svc/Products")
                .header("x-trace", "on");
            then.status(200);
        })
        .await;

    let runner = runner()
        .before_request(|req| {
            req.headers_mut()
                .insert("x-trace", reqwest::header::HeaderValue::from_static("on"));
            Ok(())
        })
        .after_response(|resp| {
            anyhow::ensure!(resp.status().is_success(), "unexpected status {}", resp.status());
            Ok(())
        });

    runner
        .execute(request(RestVerb::Get, &server, "/svc/Products"), &CancellationToken::new())
        .await
        .unwrap();
    mock.assert_async().await;
}
