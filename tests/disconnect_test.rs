//! A client that goes away mid-stream must release the origin connection.

mod common;

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use vg_core::config::Config;

const CHUNK: usize = 64 * 1024;
const TOTAL: u64 = 1 << 32;

/// Serve one endless 206 response and report when a write fails.
async fn endless_origin() -> (String, oneshot::Receiver<u64>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}", listener.local_addr().unwrap());
    let (tx, rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        while !request.windows(4).any(|w| w == b"\r\n\r\n") {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                return;
            }
            request.extend_from_slice(&buf[..n]);
        }

        let head = format!(
            "HTTP/1.1 206 Partial Content\r\n\
             Content-Type: video/mp4\r\n\
             Content-Range: bytes 0-{}/{}\r\n\
             Content-Length: {}\r\n\r\n",
            TOTAL - 1,
            TOTAL,
            TOTAL
        );
        if socket.write_all(head.as_bytes()).await.is_err() {
            return;
        }

        let chunk = vec![0xABu8; CHUNK];
        let mut written = 0u64;
        while socket.write_all(&chunk).await.is_ok() {
            written += CHUNK as u64;
        }
        let _ = tx.send(written);
    });

    (url, rx)
}

#[tokio::test]
async fn client_disconnect_closes_origin_stream() {
    let (origin_url, write_failed) = endless_origin().await;

    let mut config = Config::default();
    config.origin.url = origin_url;
    config.origin.api_key = common::ORIGIN_KEY.to_string();
    let addr = common::spawn_gateway(config).await;

    let client = reqwest::Client::new();
    let mut resp = client
        .get(format!("http://{addr}/media/77/stream"))
        .header("range", "bytes=0-")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 206);
    assert_eq!(
        resp.headers()["content-range"],
        format!("bytes 0-{}/{}", TOTAL - 1, TOTAL)
    );

    let first = resp.chunk().await.unwrap().expect("expected a body chunk");
    assert!(!first.is_empty());
    drop(resp);
    drop(client);

    let written = tokio::time::timeout(Duration::from_secs(10), write_failed)
        .await
        .expect("origin kept streaming after the client left")
        .expect("origin task ended without reporting");
    assert!(written < TOTAL);
}
