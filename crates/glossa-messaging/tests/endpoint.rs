//! Endpoint/connection round trips over real sockets.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use glossa_core::{JobId, SessionId, StatusCode};
use glossa_messaging::{
    ConnectParams, MessageSink, SessionEventSink, SessionRegistry, TransJobReq, TransJobResp,
    TransSentData, WireMsg, WsConnection, WsEndpoint,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

/// Echoes every job request back as a one-entry response.
struct EchoSink {
    registry: Arc<SessionRegistry>,
}

#[async_trait::async_trait]
impl MessageSink for EchoSink {
    async fn on_message(&self, session_id: SessionId, msg: WireMsg) {
        if let WireMsg::TransJobReq(req) = msg {
            let mut resp = TransJobResp::new(req.job_id, StatusCode::Ok, "");
            for source in &req.source_sent {
                resp.target_data.push(TransSentData::ok(source.as_str()));
            }
            assert!(
                self.registry
                    .send_response(session_id, &WireMsg::TransJobResp(resp))
            );
        }
    }
}

struct ClosedCounter {
    closed: Arc<AtomicU64>,
}

impl SessionEventSink for ClosedCounter {
    fn session_closed(&self, _session_id: SessionId) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

async fn spawn_echo_endpoint() -> (std::net::SocketAddr, Arc<AtomicU64>, CancellationToken) {
    let registry = Arc::new(SessionRegistry::new());
    let closed = Arc::new(AtomicU64::new(0));
    registry.set_event_sink(Arc::new(ClosedCounter {
        closed: Arc::clone(&closed),
    }));
    let sink = Arc::new(EchoSink {
        registry: Arc::clone(&registry),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let endpoint = WsEndpoint::new(registry, sink);
    let token = CancellationToken::new();
    let serve_token = token.clone();
    tokio::spawn(async move { endpoint.serve(listener, serve_token).await });
    (addr, closed, token)
}

#[tokio::test]
async fn request_is_echoed_back() {
    let (addr, _closed, _token) = spawn_echo_endpoint().await;

    let params = ConnectParams::plain(format!("ws://{addr}"));
    let mut conn = WsConnection::connect(&params).await.unwrap();

    let req = TransJobReq::new(JobId(7), "en", "de", false, 0, vec!["hello".to_owned()]);
    conn.send(&WireMsg::TransJobReq(req)).await.unwrap();

    let msg = tokio::time::timeout(Duration::from_secs(5), conn.recv())
        .await
        .expect("response in time")
        .unwrap()
        .expect("a message");
    match msg {
        WireMsg::TransJobResp(resp) => {
            assert_eq!(resp.job_id, JobId(7));
            assert_eq!(resp.target_data.len(), 1);
            assert_eq!(resp.target_data[0].trans_text, "hello");
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn closing_the_connection_fires_the_session_hook() {
    let (addr, closed, _token) = spawn_echo_endpoint().await;

    let params = ConnectParams::plain(format!("ws://{addr}"));
    let mut conn = WsConnection::connect(&params).await.unwrap();
    conn.close().await.unwrap();
    drop(conn);

    // The close is observed asynchronously.
    for _ in 0..50 {
        if closed.load(Ordering::SeqCst) == 1 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    panic!("session close hook never fired");
}
