//! `HttpApi` against a minimal in-process HTTP server.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use huecheck::api::{ApiError, HttpApi, ReportApi};
use huecheck::config::PollConfig;
use huecheck::diagnostic::Diagnostic;
use huecheck::orchestrator::{JobOrchestrator, RunOutcome};
use huecheck::render::Renderer;
use huecheck::report::CaptureReporter;

/// One received request: method, path, body.
type Seen = Arc<Mutex<Vec<(String, String, String)>>>;
type Handler = Arc<dyn Fn(&str, &str, &str) -> (u16, String) + Send + Sync>;

struct FakeServer {
    base_url: String,
    seen: Seen,
}

impl FakeServer {
    async fn start(handler: Handler) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let seen: Seen = Arc::new(Mutex::new(Vec::new()));

        let seen_by_server = seen.clone();
        tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    return;
                };
                let handler = handler.clone();
                let seen = seen_by_server.clone();
                tokio::spawn(async move {
                    serve(stream, handler, seen).await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            seen,
        }
    }

    fn api(&self) -> HttpApi {
        HttpApi::new(self.base_url.clone(), Duration::from_secs(5))
    }

    fn requests(&self) -> Vec<(String, String, String)> {
        self.seen.lock().unwrap().clone()
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Decodes a complete chunked body, or `None` if more bytes are needed.
fn decode_chunked(mut data: &[u8]) -> Option<Vec<u8>> {
    let mut body = Vec::new();
    loop {
        let line_end = find(data, b"\r\n")?;
        let size_text = String::from_utf8_lossy(&data[..line_end]);
        let size_text = size_text.split(';').next().unwrap_or("0").trim().to_string();
        let size = usize::from_str_radix(&size_text, 16).ok()?;
        data = &data[line_end + 2..];
        if size == 0 {
            return Some(body);
        }
        if data.len() < size + 2 {
            return None;
        }
        body.extend_from_slice(&data[..size]);
        data = &data[size + 2..];
    }
}

async fn serve(mut stream: TcpStream, handler: Handler, seen: Seen) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let (head_end, head) = loop {
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = find(&buf, b"\r\n\r\n") {
            break (pos + 4, String::from_utf8_lossy(&buf[..pos]).to_string());
        }
    };

    let header = |name: &str| {
        head.lines().skip(1).find_map(|line| {
            let (key, value) = line.split_once(':')?;
            key.trim()
                .eq_ignore_ascii_case(name)
                .then(|| value.trim().to_string())
        })
    };
    let chunked = header("transfer-encoding")
        .map(|v| v.eq_ignore_ascii_case("chunked"))
        .unwrap_or(false);
    let content_length: usize = header("content-length")
        .and_then(|v| v.parse().ok())
        .unwrap_or(0);

    let body = loop {
        let rest = &buf[head_end..];
        if chunked {
            if let Some(body) = decode_chunked(rest) {
                break body;
            }
        } else if rest.len() >= content_length {
            break rest[..content_length].to_vec();
        }
        let n = stream.read(&mut chunk).await.unwrap_or(0);
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
    };

    let mut request_line = head.lines().next().unwrap_or("").split_whitespace();
    let method = request_line.next().unwrap_or("").to_string();
    let path = request_line.next().unwrap_or("").to_string();
    let body = String::from_utf8_lossy(&body).to_string();

    let (status, response_body) = handler(&method, &path, &body);
    seen.lock().unwrap().push((method, path, body));

    let reason = if status < 400 { "OK" } else { "Error" };
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        reason,
        response_body.len(),
        response_body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

const RECORDS: &str = r#"{"data":[
    {"id":1,"value":"login","color":"red","status":"pass"},
    {"id":2,"value":"logout","color":"blue","status":"fail","errorDetails":"boom"}
]}"#;

#[tokio::test]
async fn test_end_to_end_happy_path() {
    let polls = Arc::new(AtomicU32::new(0));
    let polls_in_handler = polls.clone();
    let server = FakeServer::start(Arc::new(move |method: &str, path: &str, _body: &str| {
        match (method, path) {
            ("GET", "/data") => (200, RECORDS.to_string()),
            ("POST", "/test-format") => (200, r#"{"id":"job-123"}"#.to_string()),
            ("POST", "/retrieve") => {
                if polls_in_handler.fetch_add(1, Ordering::SeqCst) == 0 {
                    (200, r#"{"file":null}"#.to_string())
                } else {
                    (
                        200,
                        r#"{"file":{"red":{"pass":[{"id":1,"value":"login","color":"red","status":"pass"}]}}}"#
                            .to_string(),
                    )
                }
            }
            _ => (404, r#"{"message":"Not Found"}"#.to_string()),
        }
    }))
    .await;

    let poll = PollConfig {
        max_attempts: 5,
        interval_ms: 10,
    };
    let orchestrator = JobOrchestrator::new(server.api(), CaptureReporter::new(), poll)
        .with_renderer(Renderer::plain());

    let outcome = orchestrator.run(&["red"]).await;

    match &outcome {
        RunOutcome::Rendered { job_id, output } => {
            assert_eq!(job_id, "job-123");
            assert_eq!(output, "red\n  PASS (1)\n    #1 login");
        }
        other => panic!("expected rendered outcome, got {:?}", other),
    }
    assert_eq!(orchestrator.reporter().logs()[0], "Job ID: job-123");
    assert_eq!(polls.load(Ordering::SeqCst), 2);

    let requests = server.requests();
    let paths: Vec<_> = requests.iter().map(|(m, p, _)| format!("{} {}", m, p)).collect();
    assert_eq!(
        paths,
        vec![
            "GET /data",
            "POST /test-format",
            "POST /retrieve",
            "POST /retrieve"
        ]
    );

    let submitted: serde_json::Value = serde_json::from_str(&requests[1].2).unwrap();
    assert_eq!(submitted["tests"].as_array().unwrap().len(), 1);
    assert_eq!(submitted["tests"][0]["color"], "red");

    let retrieve: serde_json::Value = serde_json::from_str(&requests[2].2).unwrap();
    assert_eq!(retrieve, serde_json::json!({"id": "job-123"}));
}

#[tokio::test]
async fn test_http_error_carries_status_and_body() {
    let server = FakeServer::start(Arc::new(|_: &str, _: &str, _: &str| {
        (404, r#"{"message":"Not Found"}"#.to_string())
    }))
    .await;

    let err = server.api().fetch_data().await.unwrap_err();

    match err {
        ApiError::Http { status, body } => {
            assert_eq!(status, 404);
            assert_eq!(body, serde_json::json!({"message": "Not Found"}));
        }
        other => panic!("expected http error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_http_error_reported_by_orchestrator() {
    let server = FakeServer::start(Arc::new(|_: &str, _: &str, _: &str| {
        (500, "internal".to_string())
    }))
    .await;
    let orchestrator = JobOrchestrator::new(server.api(), CaptureReporter::new(), PollConfig::default());

    let outcome = orchestrator.run(&["red"]).await;

    assert_eq!(
        outcome,
        RunOutcome::Failed(Diagnostic::Http {
            status: 500,
            body: serde_json::json!("internal")
        })
    );
    assert_eq!(
        orchestrator.reporter().errors()[0].lines(),
        vec![r#"Error: API responded with status 500: "internal""#]
    );
}

#[tokio::test]
async fn test_connection_refused() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let api = HttpApi::new(format!("http://127.0.0.1:{}", port), Duration::from_secs(5));

    let err = api.fetch_data().await.unwrap_err();

    match err {
        ApiError::ConnectionRefused { target } => {
            assert_eq!(target, format!("127.0.0.1:{}", port));
        }
        other => panic!("expected connection refused, got {:?}", other),
    }
}

#[tokio::test]
async fn test_help_text_is_plain() {
    let server = FakeServer::start(Arc::new(|_: &str, path: &str, _: &str| {
        assert_eq!(path, "/help");
        (200, "Usage: POST /test-format".to_string())
    }))
    .await;

    let text = server.api().help_text().await.unwrap();
    assert_eq!(text, "Usage: POST /test-format");
}

#[tokio::test]
async fn test_malformed_body_is_decode_error() {
    let server = FakeServer::start(Arc::new(|_: &str, _: &str, _: &str| {
        (200, "not json".to_string())
    }))
    .await;

    let err = server.api().fetch_data().await.unwrap_err();
    assert!(matches!(err, ApiError::Decode(_)), "{:?}", err);
}

#[tokio::test]
async fn test_missing_job_id_from_server() {
    let server = FakeServer::start(Arc::new(|_: &str, path: &str, _: &str| match path {
        "/data" => (200, RECORDS.to_string()),
        "/test-format" => (200, "{}".to_string()),
        _ => (200, r#"{"file":{"red":{}}}"#.to_string()),
    }))
    .await;
    let orchestrator = JobOrchestrator::new(server.api(), CaptureReporter::new(), PollConfig::default());

    let outcome = orchestrator.run(&["blue"]).await;

    assert_eq!(
        outcome,
        RunOutcome::Failed(Diagnostic::Message(
            "Job ID missing from submission response".to_string()
        ))
    );
    assert!(server.requests().iter().all(|(_, p, _)| p != "/retrieve"));
}

#[tokio::test]
async fn test_https_reaches_the_network() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let api = HttpApi::new(format!("https://127.0.0.1:{}", port), Duration::from_secs(5));

    let err = api.fetch_data().await.unwrap_err();

    match err {
        ApiError::ConnectionRefused { target } => {
            assert_eq!(target, format!("127.0.0.1:{}", port));
        }
        other => panic!("expected connection refused, got {:?}", other),
    }
}
