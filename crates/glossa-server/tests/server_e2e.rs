//! Translation-server scenarios over real sockets.

use std::sync::Arc;
use std::time::Duration;

use glossa_core::{JobId, StatusCode};
use glossa_decoder::DecoderParams;
use glossa_messaging::{
    ConnectParams, SessionEventSink, SessionRegistry, SuppLangReq, TransJobReq, WireMsg,
    WsConnection, WsEndpoint,
};
use glossa_server::{LoadedModels, TranslationService, WorkerPool};
use glossa_test::{toy_lm, toy_rm, toy_tm};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

fn toy_models() -> LoadedModels {
    let lm = toy_lm();
    let tm = toy_tm(&lm);
    LoadedModels {
        source_lang: "en".to_owned(),
        target_lang: "de".to_owned(),
        lm,
        tm,
        rm: toy_rm(),
    }
}

async fn spawn_server() -> (std::net::SocketAddr, CancellationToken) {
    let models = Arc::new(toy_models());
    let pool = Arc::new(WorkerPool::new(
        2,
        Arc::clone(&models),
        DecoderParams::default(),
    ));
    let registry = Arc::new(SessionRegistry::new());
    let service = Arc::new(TranslationService::new(
        Arc::clone(&registry),
        models,
        pool,
    ));
    registry.set_event_sink(Arc::clone(&service) as Arc<dyn SessionEventSink>);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let endpoint = WsEndpoint::new(registry, service);
    let token = CancellationToken::new();
    let serve_token = token.clone();
    tokio::spawn(async move { endpoint.serve(listener, serve_token).await });
    (addr, token)
}

async fn connect(addr: std::net::SocketAddr) -> WsConnection {
    WsConnection::connect(&ConnectParams::plain(format!("ws://{addr}")))
        .await
        .unwrap()
}

async fn recv_job_resp(conn: &mut WsConnection) -> glossa_messaging::TransJobResp {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(10), conn.recv())
            .await
            .expect("response in time")
            .unwrap()
            .expect("a message");
        if let WireMsg::TransJobResp(resp) = msg {
            return resp;
        }
    }
}

#[tokio::test]
async fn lists_its_language_pair() {
    let (addr, _token) = spawn_server().await;
    let mut conn = connect(addr).await;

    conn.send(&WireMsg::SuppLangReq(SuppLangReq::new()))
        .await
        .unwrap();
    let msg = tokio::time::timeout(Duration::from_secs(5), conn.recv())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    match msg {
        WireMsg::SuppLangResp(resp) => {
            assert!(resp.supports("en", "de"));
            assert!(!resp.supports("de", "en"));
        }
        other => panic!("unexpected message: {other:?}"),
    }
}

#[tokio::test]
async fn translates_a_job_in_input_order() {
    let (addr, _token) = spawn_server().await;
    let mut conn = connect(addr).await;

    let req = TransJobReq::new(
        JobId(7),
        "en",
        "de",
        false,
        0,
        vec!["hello .".to_owned(), "how are you ?".to_owned()],
    );
    conn.send(&WireMsg::TransJobReq(req)).await.unwrap();

    let resp = recv_job_resp(&mut conn).await;
    assert_eq!(resp.job_id, JobId(7));
    assert_eq!(resp.stat_code, StatusCode::Ok);
    assert_eq!(resp.target_data.len(), 2);
    assert_eq!(resp.target_data[0].trans_text, "hallo .");
    assert_eq!(resp.target_data[0].stat_code, StatusCode::Ok);
    assert_eq!(resp.target_data[1].trans_text, "wie geht es dir ?");
    // No translation info was requested.
    assert!(resp.target_data.iter().all(|s| s.stack_load.is_none()));
}

#[tokio::test]
async fn trans_info_carries_stack_loads() {
    let (addr, _token) = spawn_server().await;
    let mut conn = connect(addr).await;

    let req = TransJobReq::new(
        JobId(8),
        "en",
        "de",
        true,
        0,
        vec!["hello .".to_owned(), "how are you ?".to_owned()],
    );
    conn.send(&WireMsg::TransJobReq(req)).await.unwrap();

    let resp = recv_job_resp(&mut conn).await;
    assert_eq!(resp.stat_code, StatusCode::Ok);
    // Token count of the sentence plus one, per sentence.
    let loads0 = resp.target_data[0].stack_load.as_ref().unwrap();
    let loads1 = resp.target_data[1].stack_load.as_ref().unwrap();
    assert_eq!(loads0.len(), 3);
    assert_eq!(loads1.len(), 5);
}

#[tokio::test]
async fn unsupported_pair_fails_every_sentence() {
    let (addr, _token) = spawn_server().await;
    let mut conn = connect(addr).await;

    let req = TransJobReq::new(
        JobId(9),
        "nl",
        "fr",
        false,
        0,
        vec!["a".to_owned(), "b".to_owned()],
    );
    conn.send(&WireMsg::TransJobReq(req)).await.unwrap();

    let resp = recv_job_resp(&mut conn).await;
    assert_eq!(resp.stat_code, StatusCode::ResultError);
    assert_eq!(resp.target_data.len(), 2);
    assert_eq!(resp.target_data[0].trans_text, "a");
    assert_eq!(resp.target_data[1].trans_text, "b");
}

#[tokio::test]
async fn mixed_outcomes_yield_partial_status() {
    let (addr, _token) = spawn_server().await;
    let mut conn = connect(addr).await;

    let too_long = vec!["hello"; 101].join(" ");
    let req = TransJobReq::new(
        JobId(10),
        "en",
        "de",
        false,
        0,
        vec!["hello .".to_owned(), too_long],
    );
    conn.send(&WireMsg::TransJobReq(req)).await.unwrap();

    let resp = recv_job_resp(&mut conn).await;
    assert_eq!(resp.stat_code, StatusCode::Partial);
    assert_eq!(resp.target_data[0].stat_code, StatusCode::Ok);
    assert_eq!(resp.target_data[1].stat_code, StatusCode::ResultError);
}
