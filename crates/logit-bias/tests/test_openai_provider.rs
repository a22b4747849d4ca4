use std::time::Duration;

use logit_bias::{Chat, ErrorClass, LM, LmError, Message, OpenAIProvider, RequestSettings};
use serde_json::{Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

struct Captured {
    head: String,
    body: Value,
}

/// Reads one HTTP request, returning its head and raw body.
async fn read_request(socket: &mut TcpStream) -> (String, Vec<u8>) {
    let mut buf = Vec::new();
    let mut chunk = [0_u8; 4096];

    let header_end = loop {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending headers");
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let content_length = head
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse::<usize>().unwrap())
        })
        .unwrap_or(0);
    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.unwrap();
        assert!(n > 0, "client closed before sending body");
        buf.extend_from_slice(&chunk[..n]);
    }

    (head, buf[header_end..header_end + content_length].to_vec())
}

/// Serves exactly one HTTP exchange and hands back what the client sent.
async fn serve_once(
    status_line: &'static str,
    extra_headers: &'static str,
    body: String,
) -> (String, JoinHandle<Captured>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/v1", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let (head, request_body) = read_request(&mut socket).await;

        let response = format!(
            "{status_line}\r\ncontent-type: application/json\r\n{extra_headers}content-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();

        Captured {
            head,
            body: serde_json::from_slice(&request_body).unwrap(),
        }
    });

    (base_url, handle)
}

/// Answers with a status line whose body ends before its declared length.
async fn serve_truncated_body(status_line: &'static str) -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/v1", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await;

        let response = format!("{status_line}\r\ncontent-length: 100\r\n\r\n{{\"error\"");
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    });

    (base_url, handle)
}

/// Accepts one connection and holds it open without ever answering.
async fn accept_and_stall() -> (String, JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/v1", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    (base_url, handle)
}

fn chat() -> Chat {
    Chat::new(vec![
        Message::system("You are a friend who makes recommendations."),
        Message::user("Hi, what should I do this weekend?"),
    ])
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_wire_body_and_response_parsing() {
    let reply = json!({
        "id": "chatcmpl-1",
        "model": "gpt-3.5-turbo",
        "choices": [{
            "index": 0,
            "message": {"role": "assistant", "content": "Try a hike!"},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 21, "completion_tokens": 4, "total_tokens": 25}
    });
    let (base_url, server) = serve_once("HTTP/1.1 200 OK", "", reply.to_string()).await;

    let mut settings = RequestSettings::builder()
        .model("gpt-3.5-turbo")
        .max_tokens(2000)
        .temperature(0.7)
        .build();
    settings.set_logit_bias(3820, -100).unwrap();
    settings.set_logit_bias(15991, -100).unwrap();

    let lm = LM::builder()
        .provider(OpenAIProvider::new("sk-test", Some(base_url)))
        .settings(settings)
        .build();
    let response = lm.call(chat()).await.unwrap();

    assert_eq!(response.output.content(), "Try a hike!");
    assert_eq!(response.usage.total_tokens, 25);
    assert_eq!(response.chat.len(), 3);

    let captured = server.await.unwrap();
    assert!(captured.head.starts_with("POST /v1/chat/completions "));
    assert!(
        captured
            .head
            .to_ascii_lowercase()
            .contains("authorization: bearer sk-test")
    );
    assert_eq!(captured.body["model"], "gpt-3.5-turbo");
    assert_eq!(captured.body["max_tokens"], 2000);
    assert_eq!(
        captured.body["logit_bias"],
        json!({"3820": -100, "15991": -100})
    );
    assert_eq!(captured.body["messages"], chat().to_json().unwrap());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let (base_url, server) = serve_once(
        "HTTP/1.1 429 Too Many Requests",
        "retry-after: 7\r\n",
        json!({"error": {"message": "slow down"}}).to_string(),
    )
    .await;

    let lm = LM::builder()
        .provider(OpenAIProvider::new("sk-test", Some(base_url)))
        .build();
    let err = lm.call(chat()).await.unwrap_err();
    server.await.unwrap();

    match err {
        LmError::RateLimit { retry_after } => {
            assert_eq!(retry_after, Some(Duration::from_secs(7)));
        }
        other => panic!("expected rate limit, got {other:?}"),
    }
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_client_error_status_is_not_retryable() {
    let (base_url, server) = serve_once(
        "HTTP/1.1 400 Bad Request",
        "",
        json!({"error": {"message": "Invalid key in 'logit_bias'"}}).to_string(),
    )
    .await;

    let lm = LM::builder()
        .provider(OpenAIProvider::new("sk-test", Some(base_url)))
        .build();
    let err = lm.call(chat()).await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(
        &err,
        LmError::InvalidResponse { status: 400, body } if body.contains("logit_bias")
    ));
    assert_eq!(err.class(), ErrorClass::BadRequest);
    assert!(!err.is_retryable());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_empty_choices_is_provider_error() {
    let (base_url, server) =
        serve_once("HTTP/1.1 200 OK", "", json!({"choices": []}).to_string()).await;

    let lm = LM::builder()
        .provider(
            OpenAIProvider::new("sk-test", Some(base_url)).with_timeout(Duration::from_secs(5)),
        )
        .build();
    let err = lm.call(chat()).await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, LmError::Provider { .. }), "got {err:?}");
    assert_eq!(err.class(), ErrorClass::Internal);
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_undecodable_body_is_provider_error() {
    let (base_url, server) = serve_once("HTTP/1.1 200 OK", "", "not json".to_string()).await;

    let lm = LM::builder()
        .provider(OpenAIProvider::new("sk-test", Some(base_url)))
        .build();
    let err = lm.call(chat()).await.unwrap_err();
    server.await.unwrap();

    assert!(matches!(err, LmError::Provider { source: Some(_), .. }));
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_stalled_server_is_timeout() {
    let (base_url, server) = accept_and_stall().await;

    let lm = LM::builder()
        .provider(
            OpenAIProvider::new("sk-test", Some(base_url))
                .with_timeout(Duration::from_millis(200)),
        )
        .build();
    let err = lm.call(chat()).await.unwrap_err();
    server.abort();

    match &err {
        LmError::Timeout { after } => assert_eq!(*after, Duration::from_millis(200)),
        other => panic!("expected timeout, got {other:?}"),
    }
    assert_eq!(err.class(), ErrorClass::Temporary);
    assert!(err.is_retryable());
}

#[cfg_attr(miri, ignore)]
#[tokio::test]
async fn test_unreadable_error_body_keeps_status() {
    let (base_url, server) = serve_truncated_body("HTTP/1.1 400 Bad Request").await;

    let lm = LM::builder()
        .provider(OpenAIProvider::new("sk-test", Some(base_url)))
        .build();
    let err = lm.call(chat()).await.unwrap_err();
    server.await.unwrap();

    assert!(
        matches!(&err, LmError::InvalidResponse { status: 400, body } if body.is_empty()),
        "got {err:?}"
    );
    assert!(!err.is_retryable());
}
