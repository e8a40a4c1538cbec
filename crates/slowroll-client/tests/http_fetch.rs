//! HttpFetcher against an in-process HTTP/1.1 server with canned responses.

use std::time::Duration;

use slowroll_client::{ClientError, FetchOutcome, Fetcher, HttpFetcher};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

fn response(status_line: &str, headers: &[(&str, &str)], body: &str) -> String {
    let mut out = format!("HTTP/1.1 {status_line}\r\n");
    for (name, value) in headers {
        out.push_str(&format!("{name}: {value}\r\n"));
    }
    out.push_str(&format!("Content-Length: {}\r\nConnection: close\r\n\r\n{body}", body.len()));
    out
}

/// Answer one connection per canned response, returning the raw requests.
async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/rollouts.json", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
            }
            requests.push(String::from_utf8_lossy(&buf).into_owned());
            stream.write_all(response.as_bytes()).await.unwrap();
            let _ = stream.shutdown().await;
        }
        requests
    });

    (url, handle)
}

#[tokio::test]
async fn fetch_then_not_modified() {
    let (url, server) = serve(vec![
        response("200 OK", &[("ETag", "\"v1\"")], "1\n2\n"),
        response("304 Not Modified", &[("ETag", "\"v1\"")], ""),
    ])
    .await;
    let fetcher = HttpFetcher::new(Duration::from_secs(5));

    let first = fetcher.fetch(&url, None).await.unwrap();
    let FetchOutcome::Modified { body, etag } = first else {
        panic!("expected Modified");
    };
    assert_eq!(&body[..4], b"1\n2\n");
    assert_eq!(etag.as_deref(), Some("\"v1\""));

    let second = fetcher.fetch(&url, etag.as_deref()).await.unwrap();
    assert_eq!(second, FetchOutcome::NotModified);

    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("GET /rollouts.json HTTP/1.1\r\n"));
    assert!(!requests[0].to_ascii_lowercase().contains("if-none-match"));
    assert!(requests[1].to_ascii_lowercase().contains("if-none-match: \"v1\""));
}

#[tokio::test]
async fn unexpected_status_carries_body() {
    let (url, server) = serve(vec![response(
        "512 Custom",
        &[],
        "Gzip: nope\nResponse code: 512",
    )])
    .await;

    let err = HttpFetcher::default().fetch(&url, None).await.unwrap_err();
    match err {
        ClientError::UnexpectedStatus { status, body } => {
            assert_eq!(status, 512);
            assert_eq!(body, "Gzip: nope\nResponse code: 512");
        }
        other => panic!("expected UnexpectedStatus, got {other:?}"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn missing_etag_is_allowed() {
    let (url, server) = serve(vec![response("200 OK", &[], "{}")]).await;
    let outcome = HttpFetcher::default().fetch(&url, None).await.unwrap();
    assert_eq!(
        outcome,
        FetchOutcome::Modified {
            body: bytes::Bytes::from_static(b"{}"),
            etag: None,
        }
    );
    server.await.unwrap();
}

#[tokio::test]
async fn silent_server_times_out() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("http://{}/rollouts.json", listener.local_addr().unwrap());
    let _server = tokio::spawn(async move {
        let (_stream, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let err = HttpFetcher::new(Duration::from_millis(200))
        .fetch(&url, None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Timeout(_)), "{err:?}");
}

#[tokio::test]
async fn connection_refused_is_io_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = HttpFetcher::default()
        .fetch(&format!("http://{addr}/rollouts.json"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Io(_)), "{err:?}");
}
