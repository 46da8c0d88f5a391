#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use page_summarizer::llm::CompletionMode;
use page_summarizer::scraper::ExtractionPolicy;
use page_summarizer::{app::output::OutputFormat, Config, LlmConfig};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

static INIT: Once = Once::new();

pub const PAGE_HTML: &str = "<html><body><script>x</script><p>Hello   world</p></body></html>";
pub const COMPLETIONS_PATH: &str = "/v1/chat/completions";

pub fn init_test_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "debug".into()),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn llm_config(server: &MockServer, mode: CompletionMode) -> LlmConfig {
    let mut config = LlmConfig::with_server(format!("{}/v1", server.uri()));
    config.mode = mode;
    config
}

pub fn config(site_url: String, llm: LlmConfig) -> Config {
    Config {
        site_url,
        llm,
        extraction: ExtractionPolicy::default(),
        output: OutputFormat::Text,
    }
}

/// Serves `html` at `/page` and returns the page URL.
pub async fn serve_page(server: &MockServer, html: &str) -> String {
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/html; charset=utf-8")
                .set_body_string(html),
        )
        .mount(server)
        .await;
    format!("{}/page", server.uri())
}

pub fn sse_body(fragments: &[&str]) -> String {
    let mut body = String::new();
    for fragment in fragments {
        let chunk = serde_json::json!({
            "choices": [{ "index": 0, "delta": { "content": fragment } }]
        });
        body.push_str(&format!("data: {chunk}\n\n"));
    }
    body.push_str("data: [DONE]\n\n");
    body
}

pub fn sse_response(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .insert_header("content-type", "text/event-stream")
        .set_body_string(body)
}

/// Serves one completion request with a chunked event stream that delivers
/// `first_event` and then hangs up in the middle of the next chunk.
/// Returns the API base URL.
pub async fn cut_off_stream_server(first_event: String) -> String {
    let head = "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n";
    let first = format!("{head}{:x}\r\n{first_event}\r\n", first_event.len());
    serve_raw(vec![first.into_bytes(), b"40\r\ndata: {\"cho".to_vec()]).await
}

/// Answers with a 500 whose body ends well short of its declared length.
pub async fn cut_off_error_server() -> String {
    let response = "HTTP/1.1 500 Internal Server Error\r\ncontent-length: 100\r\n\r\nmodel cra";
    serve_raw(vec![response.as_bytes().to_vec()]).await
}

/// Accepts one connection, writes `parts` with a pause between each, then hangs up.
async fn serve_raw(parts: Vec<Vec<u8>>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;

        for part in parts {
            socket.write_all(&part).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        let _ = socket.shutdown().await;
    });

    format!("http://{addr}/v1")
}

async fn read_request(socket: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);

        let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") else {
            continue;
        };
        let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
        let body_len = head
            .lines()
            .find_map(|line| line.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok())
            .unwrap_or(0);
        if buf.len() >= end + 4 + body_len {
            return;
        }
    }
}

pub fn delta_event(content: &str) -> String {
    let chunk = serde_json::json!({ "choices": [{ "delta": { "content": content } }] });
    format!("data: {chunk}\n\n")
}
