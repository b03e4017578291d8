//! Gemini backend against a local one-shot HTTP server
//!
//! The server captures the raw request and replies with a canned body, so
//! these tests cover the URL, headers, JSON body and SSE decoding without
//! network access.

use robogen::artifacts::{ArtifactStore, DirectoryStore};
use robogen::generation::{
    GeminiBackend, GeminiConfig, GenerationBackend, GenerationClient, GenerationError,
    GenerationRequest, PartKind,
};

use futures::StreamExt;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Serve one response; the handle yields the raw request (head and body)
async fn serve_once(status: &'static str, content_type: &'static str, body: String) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        let header_end = loop {
            let n = socket.read(&mut buf).await.unwrap();
            assert!(n > 0, "client closed before sending headers");
            raw.extend_from_slice(&buf[..n]);
            if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&raw[..header_end]).to_lowercase();
        let content_length: usize = head
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .map(|v| v.trim().parse().unwrap())
            .unwrap_or(0);
        while raw.len() < header_end + content_length {
            let n = socket.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
        }

        let response = format!(
            "HTTP/1.1 {}\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            status,
            content_type,
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        String::from_utf8_lossy(&raw).into_owned()
    });

    (base_url, handle)
}

fn backend(base_url: &str) -> GeminiBackend {
    GeminiBackend::new(
        GeminiConfig::new("test-key")
            .with_model("image-model")
            .with_base_url(base_url),
    )
    .unwrap()
}

fn sse(events: &[&str]) -> String {
    events.iter().map(|e| format!("data: {}\r\n\r\n", e)).collect()
}

#[tokio::test]
async fn test_request_shape_and_stream_decoding() {
    let body = sse(&[
        r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"}]}}]}"#,
        r#"{"candidates":[{"content":{"role":"model","parts":[{"inlineData":{"mimeType":"image/png","data":"AQID"}}]}}]}"#,
    ]);
    let (base_url, server) = serve_once("200 OK", "text/event-stream", body).await;

    let request = GenerationRequest::new("Draw a robot")
        .into_content_request()
        .await
        .unwrap();
    let chunks: Vec<_> = backend(&base_url)
        .stream_generate(request)
        .await
        .unwrap()
        .collect()
        .await;

    assert_eq!(chunks.len(), 2);
    let first = chunks[0].as_ref().unwrap();
    assert_eq!(first.parts().unwrap()[0].kind(), PartKind::Text("Hello"));
    let second = chunks[1].as_ref().unwrap();
    assert_eq!(
        second.parts().unwrap()[0].kind(),
        PartKind::InlineImage {
            mime_type: "image/png",
            data: &[1, 2, 3]
        }
    );

    let raw = server.await.unwrap();
    assert!(raw.starts_with(
        "POST /v1beta/models/image-model:streamGenerateContent?alt=sse HTTP/1.1"
    ));
    let lower = raw.to_lowercase();
    assert!(lower.contains("x-goog-api-key: test-key"));
    assert!(raw.contains(r#""responseModalities":["IMAGE","TEXT"]"#));
    assert!(raw.contains(r#""text":"Draw a robot""#));
}

#[tokio::test]
async fn test_error_status_surfaces_service_message() {
    let body = r#"{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}"#;
    let (base_url, server) = serve_once("400 Bad Request", "application/json", body.to_string()).await;

    let request = GenerationRequest::new("x").into_content_request().await.unwrap();
    let result = backend(&base_url).stream_generate(request).await;

    match result {
        Err(GenerationError::Api(message)) => {
            assert!(message.starts_with("400"));
            assert!(message.contains("API key not valid"));
        }
        Err(other) => panic!("Expected API error, got {:?}", other),
        Ok(_) => panic!("Expected API error, got a stream"),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn test_in_stream_error_fails_the_call() {
    let body = sse(&[
        r#"{"candidates":[{"content":{"parts":[{"inlineData":{"mimeType":"image/png","data":"AQID"}}]}}]}"#,
        r#"{"error":{"code":500,"message":"Internal error","status":"INTERNAL"}}"#,
    ]);
    let (base_url, server) = serve_once("200 OK", "text/event-stream", body).await;

    let output = tempfile::tempdir().unwrap();
    let store: Arc<dyn ArtifactStore> = Arc::new(DirectoryStore::new(output.path()).unwrap());
    let client = GenerationClient::new(Arc::new(backend(&base_url)), store);

    let result = client.generate("Draw", None).await;

    assert!(!result.success);
    assert!(result.files.is_empty());
    assert!(result.error.unwrap().contains("Internal error"));
    assert_eq!(std::fs::read_dir(output.path()).unwrap().count(), 1);
    server.await.unwrap();
}

#[tokio::test]
async fn test_unreachable_service_is_a_failed_result() {
    // Bind then drop to get a port nothing listens on
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap().port()
    };
    let output = tempfile::tempdir().unwrap();
    let store: Arc<dyn ArtifactStore> = Arc::new(DirectoryStore::new(output.path()).unwrap());
    let client = GenerationClient::new(
        Arc::new(backend(&format!("http://127.0.0.1:{}", port))),
        store,
    );

    let result = client.generate("Draw", None).await;

    assert!(!result.success);
    assert!(result.error.unwrap().starts_with("Transport error"));
}
