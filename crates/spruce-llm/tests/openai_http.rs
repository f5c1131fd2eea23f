//! HTTP-level tests for the OpenAI chat and embedding clients.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use spruce_llm::{
    CompletionRequest, ContentPart, Embedder, LlmBackend, LlmError, Message, OpenAiBackend,
    OpenAiConfig, OpenAiEmbedder, OpenAiEmbedderConfig,
};

fn chat_body(content: &str) -> serde_json::Value {
    json!({
        "id": "chatcmpl-1",
        "model": "gpt-4o-mini",
        "choices": [{"message": {"role": "assistant", "content": content}, "finish_reason": "stop"}],
        "usage": {"prompt_tokens": 12, "completion_tokens": 3}
    })
}

fn backend(server: &MockServer) -> OpenAiBackend {
    let config = OpenAiConfig::openai("sk-test")
        .with_base_url(server.uri())
        .with_max_retries(2)
        .with_retry_backoff(Duration::from_millis(5));
    OpenAiBackend::new(config).unwrap()
}

#[tokio::test]
async fn completion_sends_system_prompt_and_auth() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(json!({
            "model": "gpt-4o-mini",
            "temperature": 0.0,
            "messages": [
                {"role": "system", "content": "write python"},
                {"role": "user", "content": "book me on Monday"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("def f(): pass")))
        .expect(1)
        .mount(&server)
        .await;

    let request = CompletionRequest::new(
        "gpt-4o-mini",
        vec![Message::user("book me on Monday")],
        256,
    )
    .with_system("write python")
    .with_temperature(0.0);

    let response = backend(&server).complete(request).await.unwrap();
    assert_eq!(response.text(), "def f(): pass");
    assert_eq!(response.usage.input_tokens, 12);
}

#[tokio::test]
async fn completion_serializes_image_parts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{
                "role": "user",
                "content": [
                    {"type": "text", "text": "name services"},
                    {"type": "image_url", "image_url": {"url": "https://example.com/a.png"}}
                ]
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("Carpet Cleaning")))
        .expect(1)
        .mount(&server)
        .await;

    let request = CompletionRequest::new(
        "gpt-4o-mini",
        vec![Message::user_parts(vec![
            ContentPart::text("name services"),
            ContentPart::image_url("https://example.com/a.png"),
        ])],
        64,
    );

    let response = backend(&server).complete(request).await.unwrap();
    assert_eq!(response.text(), "Carpet Cleaning");
}

#[tokio::test]
async fn completion_maps_unauthorized_to_auth_error_without_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"error": {"message": "Incorrect API key provided"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let request = CompletionRequest::new("gpt-4o-mini", vec![Message::user("hi")], 16);
    let err = backend(&server).complete(request).await.unwrap_err();
    match err {
        LlmError::Auth(message) => assert!(message.contains("Incorrect API key")),
        other => panic!("expected auth error, got {other:?}"),
    }
}

#[tokio::test]
async fn completion_retries_rate_limits() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(429)
                .set_body_json(json!({"error": {"message": "Rate limit reached"}})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(chat_body("ok")))
        .mount(&server)
        .await;

    let request = CompletionRequest::new("gpt-4o-mini", vec![Message::user("hi")], 16);
    let response = backend(&server).complete(request).await.unwrap();
    assert_eq!(response.text(), "ok");
}

#[tokio::test]
async fn completion_server_error_is_backend_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503).set_body_string("upstream unavailable"))
        .expect(1)
        .mount(&server)
        .await;

    let request = CompletionRequest::new("gpt-4o-mini", vec![Message::user("hi")], 16);
    let err = backend(&server).complete(request).await.unwrap_err();
    assert!(matches!(err, LlmError::Backend(_)));
}

#[tokio::test]
async fn embeddings_are_returned_in_input_order() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .and(body_partial_json(json!({
            "model": "text-embedding-3-small",
            "input": ["first", "second"]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"index": 1, "embedding": [0.0, 1.0]},
                {"index": 0, "embedding": [1.0, 0.0]}
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::new(
        OpenAiEmbedderConfig::new("sk-test").with_base_url(server.uri()),
    )
    .unwrap();

    let vectors = embedder.embed_batch(&["first", "second"]).await.unwrap();
    assert_eq!(vectors, vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
}

#[tokio::test]
async fn embeddings_failure_is_reported() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/embeddings"))
        .respond_with(ResponseTemplate::new(400).set_body_string("bad input"))
        .mount(&server)
        .await;

    let embedder = OpenAiEmbedder::new(
        OpenAiEmbedderConfig::new("sk-test").with_base_url(server.uri()),
    )
    .unwrap();

    let err = embedder.embed("anything").await.unwrap_err();
    assert!(err.to_string().contains("bad input"));
}
