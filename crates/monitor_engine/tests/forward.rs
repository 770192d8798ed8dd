use monitor_core::{classify_frame, parse_target_url, InterceptedFrame, OutboundPayload, Url};
use monitor_engine::{DeliveryFailureKind, ForwardSettings, Forwarder, ReqwestForwarder};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_payload() -> OutboundPayload {
    let frame = InterceptedFrame::text(
        "wss://wsd.baaaat.com/ws",
        "2026-01-02T03:04:05.000Z",
        "已站上 105000",
    );
    let message = classify_frame(&frame);
    OutboundPayload::build(&frame, &message, None)
}

fn endpoint(server: &MockServer, route: &str) -> Url {
    parse_target_url(&format!("{}{}", server.uri(), route)).unwrap()
}

#[tokio::test]
async fn delivers_json_post_and_returns_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/webhook"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "source": "bat-chat-websocket",
            "transport": "websocket",
            "encoding": "utf-8",
            "data": "已站上 105000",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&server)
        .await;

    let forwarder = ReqwestForwarder::new(ForwardSettings::default()).unwrap();
    let report = forwarder
        .deliver(&endpoint(&server, "/webhook"), &sample_payload())
        .await
        .expect("delivery ok");

    assert_eq!(report.status, 200);
    assert_eq!(report.body, "ok");
}

#[tokio::test]
async fn non_success_status_is_a_delivery_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404).set_body_string("nope"))
        .mount(&server)
        .await;

    let forwarder = ReqwestForwarder::new(ForwardSettings::default()).unwrap();
    let err = forwarder
        .deliver(&endpoint(&server, "/missing"), &sample_payload())
        .await
        .unwrap_err();

    assert_eq!(err.kind, DeliveryFailureKind::HttpStatus(404));
    assert_eq!(err.message, "nope");
}

#[tokio::test]
async fn unreachable_endpoint_is_a_network_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let target = parse_target_url(&format!("http://127.0.0.1:{port}/webhook")).unwrap();
    let forwarder = ReqwestForwarder::new(ForwardSettings::default()).unwrap();
    let err = forwarder
        .deliver(&target, &sample_payload())
        .await
        .unwrap_err();

    assert_eq!(err.kind, DeliveryFailureKind::Network);
}

#[tokio::test]
async fn custom_user_agent_is_sent() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(header("user-agent", "monitor-test/1.0"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let settings = ForwardSettings {
        user_agent: Some("monitor-test/1.0".to_string()),
        ..ForwardSettings::default()
    };
    let forwarder = ReqwestForwarder::new(settings).unwrap();
    let report = forwarder
        .deliver(&endpoint(&server, "/hook"), &sample_payload())
        .await
        .expect("delivery ok");

    assert_eq!(report.status, 204);
    assert!(report.body.is_empty());
}
