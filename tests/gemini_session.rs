#![cfg(feature = "gemini")]

use finance_advisor_chat::llm::{GeminiConfig, GeminiSessionFactory};
use finance_advisor_chat::*;
use futures::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

struct Captured {
    head: String,
    body: String,
}

/// Serves one canned HTTP response per connection and returns each request.
async fn serve(responses: Vec<String>) -> (String, JoinHandle<Vec<Captured>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base_url = format!("http://{}/v1beta", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            requests.push(read_request(&mut socket).await);
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        }
        requests
    });

    (base_url, handle)
}

async fn read_request(socket: &mut tokio::net::TcpStream) -> Captured {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap();
        if n == 0 {
            break;
        }
        raw.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&raw);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if raw.len() >= header_end + 4 + content_length {
                return Captured {
                    head: text[..header_end].to_string(),
                    body: String::from_utf8_lossy(&raw[header_end + 4..]).to_string(),
                };
            }
        }
    }
    Captured {
        head: String::from_utf8_lossy(&raw).to_string(),
        body: String::new(),
    }
}

fn sse_response(events: &[&str]) -> String {
    let body: String = events
        .iter()
        .map(|event| format!("data: {}\r\n\r\n", event))
        .collect();
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/event-stream\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

fn text_event(text: &str) -> String {
    serde_json::json!({
        "candidates": [{ "content": { "role": "model", "parts": [{ "text": text }] } }]
    })
    .to_string()
}

#[tokio::test]
async fn test_streams_chunks_and_keeps_history() {
    let first = [text_event("Hello "), text_event("**world**")];
    let second = [text_event("Again")];
    let (base_url, server) = serve(vec![
        sse_response(&first.iter().map(String::as_str).collect::<Vec<_>>()),
        sse_response(&second.iter().map(String::as_str).collect::<Vec<_>>()),
    ])
    .await;

    let config = GeminiConfig::default()
        .with_api_key("test-key")
        .with_base_url(base_url);
    let factory = GeminiSessionFactory::new(&config);
    assert!(factory.is_configured());

    let mut session = factory.create(Profile::Student);
    let chunks: Vec<String> = session
        .send_streaming("Hi")
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;
    assert_eq!(chunks, vec!["Hello ", "**world**"]);
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history()[1].text(), "Hello **world**");

    let again: Vec<Result<String>> = session.send_streaming("More").collect().await;
    assert_eq!(again.len(), 1);
    assert_eq!(session.history().len(), 4);

    let requests = server.await.unwrap();
    let second_request: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(second_request["contents"].as_array().unwrap().len(), 3);
    assert_eq!(second_request["contents"][2]["parts"][0]["text"], "More");
    assert!(second_request["systemInstruction"]["parts"][0]["text"]
        .as_str()
        .unwrap()
        .contains("is a student."));
}

#[tokio::test]
async fn test_error_status_is_recoverable_request_error() {
    let body = r#"{"error":{"code":429,"message":"Resource exhausted","status":"RESOURCE_EXHAUSTED"}}"#;
    let response = format!(
        "HTTP/1.1 429 Too Many Requests\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let (base_url, server) = serve(vec![response]).await;

    let config = GeminiConfig::default()
        .with_api_key("test-key")
        .with_base_url(base_url);
    let mut session = GeminiSessionFactory::new(&config).create(Profile::Retiree);

    let items: Vec<Result<String>> = session.send_streaming("Hi").collect().await;

    assert_eq!(items.len(), 1);
    let err = items.into_iter().next().unwrap().unwrap_err();
    assert!(err.is_recoverable());
    assert!(err.to_string().contains("Resource exhausted"));
    assert!(session.history().is_empty());
    server.await.unwrap();
}

#[tokio::test]
async fn test_missing_key_fails_every_send_with_configuration_error() {
    let factory = GeminiSessionFactory::new(&GeminiConfig::default());
    assert!(!factory.is_configured());

    let mut session = factory.create(Profile::Professional);
    for _ in 0..2 {
        let items: Vec<Result<String>> = session.send_streaming("Hi").collect().await;
        assert_eq!(items.len(), 1);
        assert!(items[0].as_ref().unwrap_err().is_configuration());
    }
}

fn events(items: &[String]) -> Vec<&str> {
    items.iter().map(String::as_str).collect()
}

#[tokio::test]
async fn test_api_key_sent_as_header_not_query() {
    let (base_url, server) = serve(vec![sse_response(&events(&[text_event("ok")]))]).await;

    let config = GeminiConfig::default()
        .with_api_key("SECRET-KEY-123")
        .with_base_url(base_url);
    let mut session = GeminiSessionFactory::new(&config).create(Profile::Student);
    let items: Vec<Result<String>> = session.send_streaming("Hi").collect().await;
    assert!(items.iter().all(|item| item.is_ok()));

    let requests = server.await.unwrap();
    let head = requests[0].head.to_ascii_lowercase();
    let request_line = head.lines().next().unwrap();
    assert!(request_line.contains(":streamgeneratecontent?alt=sse "));
    assert!(!request_line.contains("key="));
    assert!(head.contains("x-goog-api-key: secret-key-123"));
}

#[tokio::test]
async fn test_connection_error_does_not_leak_api_key() {
    let config = GeminiConfig::default()
        .with_api_key("SECRET-KEY-123")
        .with_base_url("http://127.0.0.1:1/v1beta");
    let mut session = GeminiSessionFactory::new(&config).create(Profile::Retiree);

    let items: Vec<Result<String>> = session.send_streaming("Hi").collect().await;

    assert_eq!(items.len(), 1);
    let err = items.into_iter().next().unwrap().unwrap_err();
    assert!(err.is_recoverable());
    assert!(!err.to_string().contains("SECRET-KEY-123"));
    assert!(!format!("{:?}", err).contains("SECRET-KEY-123"));
}

#[tokio::test]
async fn test_malformed_event_mid_stream_keeps_history_clean() {
    let (base_url, server) = serve(vec![
        sse_response(&[text_event("Partial").as_str(), "{not json"]),
        sse_response(&events(&[text_event("Recovered")])),
    ])
    .await;

    let config = GeminiConfig::default()
        .with_api_key("test-key")
        .with_base_url(base_url);
    let mut session = GeminiSessionFactory::new(&config).create(Profile::Professional);

    let items: Vec<Result<String>> = session.send_streaming("Hi").collect().await;
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_ref().unwrap(), "Partial");
    assert!(items[1].as_ref().unwrap_err().is_recoverable());
    assert!(session.history().is_empty());

    let retry: Vec<String> = session
        .send_streaming("Hi again")
        .map(|chunk| chunk.unwrap())
        .collect()
        .await;
    assert_eq!(retry, vec!["Recovered"]);
    assert_eq!(session.history().len(), 2);
    assert_eq!(session.history()[1].text(), "Recovered");

    // The failed turn was never sent back as context.
    let requests = server.await.unwrap();
    let retry_request: serde_json::Value = serde_json::from_str(&requests[1].body).unwrap();
    assert_eq!(retry_request["contents"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_blocked_prompt_is_recoverable_request_error() {
    let blocked = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
    let (base_url, server) = serve(vec![sse_response(&[blocked])]).await;

    let config = GeminiConfig::default()
        .with_api_key("test-key")
        .with_base_url(base_url);
    let mut session = GeminiSessionFactory::new(&config).create(Profile::Student);

    let items: Vec<Result<String>> = session.send_streaming("Hi").collect().await;

    assert_eq!(items.len(), 1);
    let err = items.into_iter().next().unwrap().unwrap_err();
    assert!(matches!(err, AdvisorError::Request(_)));
    assert!(err.to_string().contains("SAFETY"));
    assert!(err.is_recoverable());
    assert!(session.history().is_empty());
    server.await.unwrap();
}
