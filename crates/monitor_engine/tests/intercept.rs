use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use monitor_core::{MonitorConfig, RawKind};
use monitor_engine::{
    bridge_channel, BlobHandle, BlobSource, BridgeEventKind, BridgeReceiver, ConfigHandle,
    EventSocket, FramePayload, FrameTap, InterceptingFactory, SocketEvent, SocketFactory,
    SocketListener,
};
use pretty_assertions::assert_eq;

const TARGET_URL: &str = "wss://wsd.baaaat.com/ws?room=42";

struct FakeSocket {
    url: String,
    listeners: Mutex<Vec<SocketListener>>,
}

impl FakeSocket {
    fn emit(&self, event: SocketEvent) {
        for listener in self.listeners.lock().unwrap().iter() {
            listener(&event);
        }
    }

    fn listener_count(&self) -> usize {
        self.listeners.lock().unwrap().len()
    }
}

impl EventSocket for FakeSocket {
    fn url(&self) -> &str {
        &self.url
    }

    fn add_listener(&self, listener: SocketListener) {
        self.listeners.lock().unwrap().push(listener);
    }
}

#[derive(Default)]
struct FakeFactory {
    opened: AtomicUsize,
}

impl SocketFactory for FakeFactory {
    type Socket = FakeSocket;
    type Error = String;

    fn open(&self, url: &str, _protocols: &[String]) -> Result<FakeSocket, String> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        if url.starts_with("fail:") {
            return Err(format!("refused {url}"));
        }
        Ok(FakeSocket {
            url: url.to_string(),
            listeners: Mutex::new(Vec::new()),
        })
    }
}

fn fixed_clock() -> monitor_engine::Clock {
    Arc::new(|| "2026-01-02T03:04:05.000Z".to_string())
}

fn intercepting() -> (InterceptingFactory<FakeFactory>, BridgeReceiver) {
    monitor_logging::initialize_for_tests();
    let (sender, receiver) = bridge_channel();
    let tap = FrameTap::new(ConfigHandle::new(MonitorConfig::default()), sender)
        .with_clock(fixed_clock());
    (InterceptingFactory::new(FakeFactory::default(), tap), receiver)
}

fn recording_listener() -> (SocketListener, Arc<Mutex<Vec<String>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let listener: SocketListener = Box::new(move |event| {
        let label = match event {
            SocketEvent::Open => "open".to_string(),
            SocketEvent::Close { .. } => "close".to_string(),
            SocketEvent::Error(_) => "error".to_string(),
            SocketEvent::Message(FramePayload::Text(text)) => format!("text:{text}"),
            SocketEvent::Message(_) => "binary".to_string(),
        };
        sink.lock().unwrap().push(label);
    });
    (listener, seen)
}

struct FailingBlob;

#[async_trait::async_trait]
impl BlobSource for FailingBlob {
    fn size(&self) -> u64 {
        4
    }

    async fn read_all(&self) -> io::Result<Vec<u8>> {
        Err(io::Error::new(io::ErrorKind::Other, "blob read failed"))
    }
}

#[test]
fn non_target_sockets_are_not_tapped() {
    let (factory, mut receiver) = intercepting();
    let socket = factory.open("wss://example.com/chat", &[]).unwrap();

    assert_eq!(socket.listener_count(), 0);
    socket.emit(SocketEvent::Message(FramePayload::Text("hi".to_string())));
    assert!(receiver.try_recv().is_none());
    assert_eq!(factory.inner().opened.load(Ordering::SeqCst), 1);
}

#[test]
fn target_socket_reports_ready_then_messages() {
    let (factory, mut receiver) = intercepting();
    let socket = factory.open(TARGET_URL, &["chat".to_string()]).unwrap();
    assert_eq!(socket.url(), TARGET_URL);

    let ready = receiver.try_recv().expect("ready event");
    assert_eq!(ready.bridge_id, monitor_engine::BRIDGE_ID);
    assert_eq!(
        ready.kind,
        BridgeEventKind::Ready {
            url: TARGET_URL.to_string(),
            timestamp: "2026-01-02T03:04:05.000Z".to_string(),
        }
    );

    socket.emit(SocketEvent::Open);
    socket.emit(SocketEvent::Message(FramePayload::Text(r#"{"a":1}"#.to_string())));
    socket.emit(SocketEvent::Message(FramePayload::ArrayBuffer(vec![0x00, 0xff])));

    let BridgeEventKind::Message(first) = receiver.try_recv().unwrap().kind else {
        panic!("expected message");
    };
    assert_eq!(first.frame.raw_kind, RawKind::Text);
    assert_eq!(first.frame.timestamp_utc, "2026-01-02T03:04:05.000Z");
    assert_eq!(first.message.decoded_text.as_deref(), Some(r#"{"a":1}"#));

    let BridgeEventKind::Message(second) = receiver.try_recv().unwrap().kind else {
        panic!("expected message");
    };
    assert_eq!(second.frame.raw_kind, RawKind::ArrayBuffer);
    assert!(!second.message.is_text);
    assert_eq!(second.message.hex_preview, "00 ff");
    assert!(receiver.try_recv().is_none());
}

#[test]
fn application_listeners_see_every_event_unchanged() {
    let (factory, _receiver) = intercepting();
    let socket = factory.open(TARGET_URL, &[]).unwrap();
    let (listener, seen) = recording_listener();
    socket.add_listener(listener);

    socket.emit(SocketEvent::Open);
    socket.emit(SocketEvent::Message(FramePayload::Text("hi".to_string())));
    socket.emit(SocketEvent::Message(FramePayload::ArrayBuffer(vec![1, 2, 3])));
    socket.emit(SocketEvent::Close {
        code: Some(1000),
        reason: String::new(),
    });

    assert_eq!(
        *seen.lock().unwrap(),
        vec!["open", "text:hi", "binary", "close"]
    );
}

#[test]
fn a_failing_message_does_not_affect_later_ones_or_other_listeners() {
    monitor_logging::initialize_for_tests();
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let clock: monitor_engine::Clock = Arc::new(move || {
        if counter.fetch_add(1, Ordering::SeqCst) == 1 {
            panic!("clock unavailable");
        }
        "t".to_string()
    });
    let (sender, mut receiver) = bridge_channel();
    let tap = FrameTap::new(ConfigHandle::new(MonitorConfig::default()), sender).with_clock(clock);
    let factory = InterceptingFactory::new(FakeFactory::default(), tap);

    let socket = factory.open(TARGET_URL, &[]).unwrap();
    let (listener, seen) = recording_listener();
    socket.add_listener(listener);

    socket.emit(SocketEvent::Message(FramePayload::Text("first".to_string())));
    socket.emit(SocketEvent::Message(FramePayload::Text("second".to_string())));

    assert!(matches!(
        receiver.try_recv().unwrap().kind,
        BridgeEventKind::Ready { .. }
    ));
    let BridgeEventKind::Message(only) = receiver.try_recv().unwrap().kind else {
        panic!("expected message");
    };
    assert_eq!(only.message.decoded_text.as_deref(), Some("second"));
    assert!(receiver.try_recv().is_none());
    assert_eq!(*seen.lock().unwrap(), vec!["text:first", "text:second"]);
}

#[tokio::test]
async fn blob_messages_arrive_after_materialization() {
    let (factory, mut receiver) = intercepting();
    let socket = factory.open(TARGET_URL, &[]).unwrap();
    receiver.recv().await.expect("ready");

    socket.emit(SocketEvent::Message(FramePayload::Blob(BlobHandle::from_bytes(
        "做多 105000".as_bytes().to_vec(),
    ))));

    let event = tokio::time::timeout(Duration::from_secs(2), receiver.recv())
        .await
        .expect("blob event in time")
        .expect("bridge open");
    let BridgeEventKind::Message(message) = event.kind else {
        panic!("expected message");
    };
    assert_eq!(message.frame.raw_kind, RawKind::Blob);
    assert_eq!(message.frame.raw_preview, "[Blob 13 bytes]");
    assert_eq!(message.message.decoded_text.as_deref(), Some("做多 105000"));
}

#[tokio::test]
async fn unreadable_blob_is_dropped() {
    let (factory, mut receiver) = intercepting();
    let socket = factory.open(TARGET_URL, &[]).unwrap();
    receiver.recv().await.expect("ready");

    socket.emit(SocketEvent::Message(FramePayload::Blob(BlobHandle::new(FailingBlob))));
    socket.emit(SocketEvent::Message(FramePayload::Text("after".to_string())));

    let BridgeEventKind::Message(next) = receiver.recv().await.unwrap().kind else {
        panic!("expected message");
    };
    assert_eq!(next.message.decoded_text.as_deref(), Some("after"));
    let extra = tokio::time::timeout(Duration::from_millis(100), receiver.recv()).await;
    assert!(extra.is_err());
}

#[test]
fn blob_without_runtime_is_logged_and_skipped() {
    let (factory, mut receiver) = intercepting();
    let socket = factory.open(TARGET_URL, &[]).unwrap();
    receiver.try_recv().expect("ready");

    socket.emit(SocketEvent::Message(FramePayload::Blob(BlobHandle::from_bytes(vec![1]))));
    assert!(receiver.try_recv().is_none());
}

#[test]
fn open_errors_propagate_unchanged() {
    let (factory, mut receiver) = intercepting();
    let err = factory
        .open("fail:wss://wsd.baaaat.com/ws", &[])
        .err()
        .expect("open error");

    assert_eq!(err, "refused fail:wss://wsd.baaaat.com/ws");
    assert!(receiver.try_recv().is_none());
}

#[test]
fn host_filter_follows_config_updates() {
    monitor_logging::initialize_for_tests();
    let (sender, mut receiver) = bridge_channel();
    let config = ConfigHandle::new(MonitorConfig::default());
    let factory = InterceptingFactory::new(
        FakeFactory::default(),
        FrameTap::new(config.clone(), sender).with_clock(fixed_clock()),
    );

    config.apply(monitor_core::ConfigChange::TargetHost("chat.example".to_string()));
    let old_target = factory.open(TARGET_URL, &[]).unwrap();
    let new_target = factory.open("wss://chat.example/live", &[]).unwrap();

    assert_eq!(old_target.listener_count(), 0);
    assert_eq!(new_target.listener_count(), 1);
    assert!(matches!(
        receiver.try_recv().unwrap().kind,
        BridgeEventKind::Ready { url, .. } if url == "wss://chat.example/live"
    ));
}
