use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use lachesis_node::errors::{ProxyError, Result};
use lachesis_node::rpc::{RpcClient, RpcHandler, RpcServer, UNCORRELATED};
use lachesis_node::wire::{self, Method, Reply, Request, Response, WireError};
use lachesis_proxy::{Block, StateHash};
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};

async fn read_request(conn: &mut wire::Connection) -> Request {
    let line = conn.next().await.unwrap().unwrap();
    wire::decode(&line).unwrap()
}

async fn reply(conn: &mut wire::Connection, id: u64, reply: Reply) {
    let line = wire::encode(&Response { id, result: Ok(reply) }).unwrap();
    conn.send(line).await.unwrap();
}

fn commit(index: u64) -> Method {
    Method::CommitBlock(Block::new(index, index, vec![], vec![b"tx".to_vec()]))
}

#[tokio::test]
async fn test_timeout_is_distinct_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept and read, never answer.
    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut conn = wire::framed(stream);
        let _ = read_request(&mut conn).await;
        sleep(Duration::from_secs(5)).await;
    });

    let client = RpcClient::new(addr, Duration::from_millis(100));
    let err = client.call(commit(0)).await.unwrap_err();
    assert!(matches!(
        err,
        ProxyError::Timeout { method: "CommitBlock", after } if after == client.timeout()
    ));
    assert!(err.is_transport());
}

#[tokio::test]
async fn test_late_response_is_discarded() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let late = StateHash::GENESIS.advance(b"late");
    let fresh = StateHash::GENESIS.advance(b"fresh");

    tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut conn = wire::framed(stream);

        let first = read_request(&mut conn).await;
        sleep(Duration::from_millis(700)).await;
        reply(&mut conn, first.id, Reply::StateHash(late)).await;

        let second = read_request(&mut conn).await;
        reply(&mut conn, second.id, Reply::StateHash(fresh)).await;
        sleep(Duration::from_secs(1)).await;
    });

    let client = RpcClient::new(addr, Duration::from_millis(500));
    assert!(matches!(
        client.call(commit(0)).await,
        Err(ProxyError::Timeout { .. })
    ));

    let answer = client.call(commit(0)).await.unwrap();
    assert_eq!(answer, Reply::StateHash(fresh));
}

#[tokio::test]
async fn test_reconnects_once_after_connection_loss() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        // First connection answers one call, then goes away.
        let (stream, _) = listener.accept().await.unwrap();
        counter.fetch_add(1, Ordering::SeqCst);
        let mut conn = wire::framed(stream);
        let req = read_request(&mut conn).await;
        reply(&mut conn, req.id, Reply::Ack).await;
        drop(conn);

        let (stream, _) = listener.accept().await.unwrap();
        counter.fetch_add(1, Ordering::SeqCst);
        let mut conn = wire::framed(stream);
        let req = read_request(&mut conn).await;
        reply(&mut conn, req.id, Reply::Ack).await;
        sleep(Duration::from_secs(1)).await;
    });

    let client = RpcClient::new(addr, Duration::from_secs(2));
    assert_eq!(client.call(Method::SubmitTx(vec![1])).await.unwrap(), Reply::Ack);
    sleep(Duration::from_millis(50)).await;
    assert_eq!(client.call(Method::SubmitTx(vec![2])).await.unwrap(), Reply::Ack);
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_fresh_connection_failure_is_not_retried() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));

    let counter = accepted.clone();
    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else { return };
            counter.fetch_add(1, Ordering::SeqCst);
            drop(stream);
        }
    });

    let client = RpcClient::new(addr, Duration::from_secs(2));
    let err = client.call(Method::SubmitTx(vec![1])).await.unwrap_err();
    assert!(matches!(err, ProxyError::Transport(_)));

    sleep(Duration::from_millis(100)).await;
    assert_eq!(accepted.load(Ordering::SeqCst), 1);
}

struct Echo;

#[async_trait]
impl RpcHandler for Echo {
    async fn handle(&self, method: Method) -> Result<Reply> {
        match method {
            Method::SubmitTx(_) => Ok(Reply::Ack),
            other => Err(ProxyError::Encoding(format!("unsupported {}", other.name()))),
        }
    }
}

#[tokio::test]
async fn test_server_answers_malformed_requests() {
    let server = RpcServer::bind("127.0.0.1:0".parse().unwrap(), Arc::new(Echo))
        .await
        .unwrap();

    let stream = tokio::net::TcpStream::connect(server.local_addr()).await.unwrap();
    let mut conn = wire::framed(stream);

    conn.send("this is not json").await.unwrap();
    let line = conn.next().await.unwrap().unwrap();
    let response: Response = wire::decode(&line).unwrap();
    assert_eq!(response.id, UNCORRELATED);
    assert!(matches!(response.result, Err(WireError::Malformed(_))));

    conn.send(r#"{"id":9,"method":{"Bogus":1}}"#).await.unwrap();
    let line = conn.next().await.unwrap().unwrap();
    let response: Response = wire::decode(&line).unwrap();
    assert_eq!(response.id, 9);
    assert!(matches!(response.result, Err(WireError::Malformed(_))));

    // Same connection keeps working.
    let ok = wire::encode(&Request { id: 10, method: Method::SubmitTx(vec![1]) }).unwrap();
    conn.send(ok).await.unwrap();
    let line = conn.next().await.unwrap().unwrap();
    let response: Response = wire::decode(&line).unwrap();
    assert_eq!(response, Response { id: 10, result: Ok(Reply::Ack) });
}

#[tokio::test]
async fn test_server_stops_on_shutdown() {
    let server = RpcServer::bind("127.0.0.1:0".parse().unwrap(), Arc::new(Echo))
        .await
        .unwrap();
    let addr = server.local_addr();

    let client = RpcClient::new(addr, Duration::from_millis(500));
    assert_eq!(client.call(Method::SubmitTx(vec![1])).await.unwrap(), Reply::Ack);

    server.shutdown();
    sleep(Duration::from_millis(50)).await;

    let err = client.call(Method::SubmitTx(vec![2])).await.unwrap_err();
    assert!(err.is_transport());
}
