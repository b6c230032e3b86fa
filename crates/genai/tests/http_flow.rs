//! HTTP-level tests for `GenAiClient` against a canned local server.
//!
//! Covers:
//! - Resumable upload: session URL taken from the start response header
//! - Missing session URL
//! - Polling PROCESSING -> ACTIVE, PROCESSING -> FAILED and the deadline
//! - Batch generation request and response parsing
//! - Non-2xx responses surface status and body

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use vidprompt_genai::{
    GenAiApi, GenAiApiError, GenAiClient, GenAiError, PromptBackend, PromptRequest, UploadedVideo,
};

// ---------------------------------------------------------------------------
// Canned server
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    path: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl Recorded {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

struct Reply {
    status: u16,
    headers: Vec<(String, String)>,
    body: String,
}

fn json(body: serde_json::Value) -> Reply {
    Reply {
        status: 200,
        headers: vec![("content-type".into(), "application/json".into())],
        body: body.to_string(),
    }
}

type Handler = dyn Fn(&Recorded, &str) -> Reply + Send + Sync;

struct Server {
    base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl Server {
    fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

/// Serve every connection with `handler`, which also receives the base URL.
async fn serve(handler: impl Fn(&Recorded, &str) -> Reply + Send + Sync + 'static) -> Server {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}", listener.local_addr().unwrap());
    let requests = Arc::new(Mutex::new(Vec::new()));
    let handler: Arc<Handler> = Arc::new(handler);

    let log = requests.clone();
    let base = base_url.clone();
    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let handler = handler.clone();
            let log = log.clone();
            let base = base.clone();
            tokio::spawn(async move {
                handle_connection(stream, &*handler, &log, &base).await;
            });
        }
    });

    Server { base_url, requests }
}

async fn handle_connection(
    stream: TcpStream,
    handler: &Handler,
    log: &Mutex<Vec<Recorded>>,
    base: &str,
) {
    let mut reader = BufReader::new(stream);

    let mut request_line = String::new();
    if reader.read_line(&mut request_line).await.unwrap_or(0) == 0 {
        return;
    }
    let mut parts = request_line.split_whitespace();
    let method = parts.next().unwrap_or_default().to_string();
    let path = parts.next().unwrap_or_default().to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).await.unwrap();
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_ascii_lowercase(), value.trim().to_string()));
        }
    }

    let mut recorded = Recorded {
        method,
        path,
        headers,
        body: Vec::new(),
    };
    if recorded
        .header("transfer-encoding")
        .is_some_and(|v| v.eq_ignore_ascii_case("chunked"))
    {
        recorded.body = read_chunked(&mut reader).await;
    } else if let Some(len) = recorded.header("content-length") {
        let mut body = vec![0u8; len.parse().unwrap()];
        reader.read_exact(&mut body).await.unwrap();
        recorded.body = body;
    }

    let reply = handler(&recorded, base);
    log.lock().unwrap().push(recorded);

    let mut response = format!(
        "HTTP/1.1 {} Canned\r\ncontent-length: {}\r\nconnection: close\r\n",
        reply.status,
        reply.body.len()
    );
    for (name, value) in &reply.headers {
        response.push_str(&format!("{name}: {value}\r\n"));
    }
    response.push_str("\r\n");
    response.push_str(&reply.body);

    let mut stream = reader.into_inner();
    stream.write_all(response.as_bytes()).await.unwrap();
    stream.shutdown().await.ok();
}

async fn read_chunked(reader: &mut BufReader<TcpStream>) -> Vec<u8> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        reader.read_line(&mut size_line).await.unwrap();
        let size = usize::from_str_radix(size_line.trim(), 16).unwrap();
        let mut chunk = vec![0u8; size + 2];
        reader.read_exact(&mut chunk).await.unwrap();
        if size == 0 {
            return body;
        }
        body.extend_from_slice(&chunk[..size]);
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn client(server: &Server, poll: Duration, timeout: Duration) -> GenAiClient {
    let api = GenAiApi::new(&server.base_url, "test-key", Duration::from_secs(5)).unwrap();
    GenAiClient::new(api, "test-model".to_string(), poll, timeout)
}

fn default_client(server: &Server) -> GenAiClient {
    client(server, Duration::from_millis(10), Duration::from_secs(5))
}

fn uploaded() -> UploadedVideo {
    UploadedVideo {
        name: "files/abc".to_string(),
        uri: Some("https://files.test/abc".to_string()),
        mime_type: "video/mp4".to_string(),
    }
}

fn remote_file(state: &str) -> serde_json::Value {
    serde_json::json!({
        "name": "files/abc",
        "uri": "https://files.test/abc",
        "mimeType": "video/mp4",
        "state": state,
    })
}

fn write_video(dir: &tempfile::TempDir, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join("clip.mp4");
    std::fs::write(&path, bytes).unwrap();
    path
}

// ---------------------------------------------------------------------------
// Upload
// ---------------------------------------------------------------------------

/// The finalize request goes to the URL from `x-goog-upload-url` and carries
/// the whole file.
#[tokio::test]
async fn test_upload_follows_session_url() {
    let server = serve(|req, base| match (req.method.as_str(), req.path.as_str()) {
        ("POST", "/upload/v1beta/files") => Reply {
            status: 200,
            headers: vec![("x-goog-upload-url".into(), format!("{base}/session/1"))],
            body: String::new(),
        },
        ("POST", "/session/1") => json(serde_json::json!({ "file": remote_file("PROCESSING") })),
        _ => Reply { status: 404, headers: Vec::new(), body: "unexpected".into() },
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let bytes: Vec<u8> = (0..1000u32).map(|i| (i % 251) as u8).collect();
    let path = write_video(&dir, &bytes);

    let file = default_client(&server).upload_video(&path).await.unwrap();

    assert_eq!(file, uploaded());
    let requests = server.requests();
    assert_eq!(requests.len(), 2);

    let start = &requests[0];
    assert_eq!(start.header("x-goog-api-key"), Some("test-key"));
    assert_eq!(start.header("x-goog-upload-protocol"), Some("resumable"));
    assert_eq!(start.header("x-goog-upload-command"), Some("start"));
    assert_eq!(start.header("x-goog-upload-header-content-length"), Some("1000"));
    assert_eq!(start.header("x-goog-upload-header-content-type"), Some("video/mp4"));
    let meta: serde_json::Value = serde_json::from_slice(&start.body).unwrap();
    assert_eq!(meta["file"]["display_name"], "clip.mp4");

    let finalize = &requests[1];
    assert_eq!(finalize.header("x-goog-upload-command"), Some("upload, finalize"));
    assert_eq!(finalize.header("x-goog-upload-offset"), Some("0"));
    assert_eq!(finalize.body, bytes);
}

/// A start response without the session header aborts the upload.
#[tokio::test]
async fn test_upload_without_session_url() {
    let server = serve(|_, _| json(serde_json::json!({}))).await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_video(&dir, b"video");

    let err = default_client(&server).upload_video(&path).await.unwrap_err();

    assert_matches!(err, GenAiError::Api(GenAiApiError::MissingUploadUrl));
    assert_eq!(server.requests().len(), 1);
}

/// A rejected start call reports the status and body.
#[tokio::test]
async fn test_upload_rejected() {
    let server = serve(|_, _| Reply {
        status: 403,
        headers: Vec::new(),
        body: "key invalid".into(),
    })
    .await;
    let dir = tempfile::tempdir().unwrap();
    let path = write_video(&dir, b"video");

    let err = default_client(&server).upload_video(&path).await.unwrap_err();

    assert_matches!(
        err,
        GenAiError::Api(GenAiApiError::Api { status: 403, ref body }) if body == "key invalid"
    );
}

// ---------------------------------------------------------------------------
// Processing state
// ---------------------------------------------------------------------------

/// The file is polled until it leaves PROCESSING.
#[tokio::test]
async fn test_wait_until_active_polls() {
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = polls.clone();
    let server = serve(move |req, _| {
        assert_eq!(req.path, "/v1beta/files/abc");
        let n = counter.fetch_add(1, Ordering::SeqCst);
        json(remote_file(if n < 2 { "PROCESSING" } else { "ACTIVE" }))
    })
    .await;

    let file = default_client(&server).wait_until_active(&uploaded()).await.unwrap();

    assert_eq!(file, uploaded());
    assert_eq!(polls.load(Ordering::SeqCst), 3);
}

/// FAILED ends the wait with `ProcessingFailed`.
#[tokio::test]
async fn test_wait_until_active_failed() {
    let polls = Arc::new(AtomicUsize::new(0));
    let counter = polls.clone();
    let server = serve(move |_, _| {
        let n = counter.fetch_add(1, Ordering::SeqCst);
        json(remote_file(if n == 0 { "PROCESSING" } else { "FAILED" }))
    })
    .await;

    let err = default_client(&server)
        .wait_until_active(&uploaded())
        .await
        .unwrap_err();

    assert_matches!(err, GenAiError::ProcessingFailed);
    assert_eq!(polls.load(Ordering::SeqCst), 2);
}

/// A file stuck in PROCESSING past the upload timeout gives up.
#[tokio::test]
async fn test_wait_until_active_times_out() {
    let server = serve(|_, _| json(remote_file("PROCESSING"))).await;
    let client = client(&server, Duration::from_millis(10), Duration::from_millis(50));

    let err = client.wait_until_active(&uploaded()).await.unwrap_err();

    assert_matches!(err, GenAiError::ProcessingTimeout { seconds: 0 });
    let polls = server.requests().len();
    assert!((1..=6).contains(&polls), "polled {polls} times");
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// The batch request references the upload and the JSON answer is parsed.
#[tokio::test]
async fn test_generate_prompts_round_trip() {
    let answer = serde_json::json!({ "prompts": ["a misty forest", "a neon city", "extra"] });
    let server = serve(move |_, _| {
        json(serde_json::json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": answer.to_string() }] },
                "finishReason": "STOP",
            }]
        }))
    })
    .await;
    let request = PromptRequest {
        complexity_desc: "detailed".to_string(),
        aspect_ratio: "16:9".to_string(),
        aspect_desc: "widescreen".to_string(),
        variation_instruction: "vary the mood".to_string(),
        count: 2,
    };

    let prompts = default_client(&server)
        .generate_prompts(&uploaded(), &request)
        .await
        .unwrap();

    assert_eq!(prompts, vec!["a misty forest", "a neon city"]);
    let requests = server.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].path, "/v1beta/models/test-model:generateContent");
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    let parts = &body["contents"][0]["parts"];
    assert_eq!(parts[0]["fileData"]["fileUri"], "https://files.test/abc");
    assert_eq!(parts[0]["fileData"]["mimeType"], "video/mp4");
    assert!(parts[1]["text"].as_str().unwrap().contains("16:9"));
}

/// A blocked answer reports the block reason.
#[tokio::test]
async fn test_generate_prompts_blocked() {
    let server = serve(|_, _| {
        json(serde_json::json!({ "promptFeedback": { "blockReason": "SAFETY" } }))
    })
    .await;
    let request = PromptRequest {
        complexity_desc: String::new(),
        aspect_ratio: "1:1".to_string(),
        aspect_desc: String::new(),
        variation_instruction: String::new(),
        count: 3,
    };

    let err = default_client(&server)
        .generate_prompts(&uploaded(), &request)
        .await
        .unwrap_err();

    assert_matches!(
        err,
        GenAiError::Api(GenAiApiError::EmptyResponse(Some(ref reason))) if reason == "SAFETY"
    );
}

/// Deleting an upload issues DELETE on the file resource.
#[tokio::test]
async fn test_delete_file() {
    let server = serve(|_, _| json(serde_json::json!({}))).await;

    default_client(&server).delete_file(&uploaded()).await.unwrap();

    let requests = server.requests();
    assert_eq!(requests[0].method, "DELETE");
    assert_eq!(requests[0].path, "/v1beta/files/abc");
}
