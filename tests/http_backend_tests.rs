//! HTTP backend against a mock conversation/retrieval server.

use parlance::config::EndpointConfig;
use parlance::provider::http::HttpBackend;
use parlance::provider::{ConversationRequest, RetrievalQuery, StreamingCall, TextCall};
use parlance::session::{
    KnowledgeSource, SessionConfig, SessionEngine, SessionMode, PROMPT_FALLBACK,
    RETRIEVAL_FALLBACK,
};
use parlance::types::Message;
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn endpoints(server: &MockServer) -> EndpointConfig {
    EndpointConfig::new()
        .with_conversation_url(format!("{}/api/conversation", server.uri()))
        .with_retrieval_base_url(server.uri())
}

#[tokio::test]
async fn prompt_request_posts_json_and_streams_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/conversation"))
        .and(body_json(json!({
            "prompt": "Answer concisely",
            "input": [
                {"role": "assistant", "content": "Hi"},
                {"role": "user", "content": "What is X?"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_string("The answer is X."))
        .expect(1)
        .mount(&server)
        .await;

    let config = SessionConfig::builder()
        .welcome_message("Hi")
        .mode(SessionMode::prompt("Answer concisely"))
        .build();
    let engine = SessionEngine::new(config, HttpBackend::new(endpoints(&server)));

    let outcome = engine.submit("What is X?").await.expect("submit");

    assert!(outcome.is_answered());
    assert_eq!(
        engine.transcript().last(),
        Some(&Message::assistant("The answer is X."))
    );
}

#[tokio::test]
async fn prompt_error_status_surfaces_before_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/conversation"))
        .respond_with(
            ResponseTemplate::new(500).set_body_json(json!({"error": "model overloaded"})),
        )
        .mount(&server)
        .await;

    let backend = HttpBackend::new(endpoints(&server));
    let request = ConversationRequest {
        prompt: "Be brief".to_string(),
        input: vec![Message::user("hi")],
    };

    let err = match backend.stream_conversation(&request).await {
        Ok(_) => panic!("expected error status"),
        Err(err) => err,
    };
    assert_eq!(err.status(), Some(500));
    assert!(err.to_string().contains("model overloaded"));

    let config = SessionConfig::builder()
        .mode(SessionMode::prompt("Be brief"))
        .build();
    let engine = SessionEngine::new(config, backend);
    engine.submit("hi").await.expect("submit");
    assert_eq!(
        engine.transcript().last(),
        Some(&Message::assistant(PROMPT_FALLBACK))
    );
}

#[tokio::test]
async fn retrieval_request_carries_parameters_in_url() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Chat"))
        .and(query_param("query", "Define Y"))
        .and(query_param("namespace", "ns-1"))
        .and(query_param("index_name", "idx-1"))
        .and(query_param("questions", ""))
        .and(query_param("answers", ""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "Y is Z"})))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/Chat"))
        .and(query_param("query", "And W?"))
        .and(query_param("questions", "Define Y | "))
        .and(query_param("answers", "Y is Z | "))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"response": "W is V"})))
        .expect(1)
        .mount(&server)
        .await;

    let config = SessionConfig::builder()
        .mode(SessionMode::retrieval(KnowledgeSource::new("ns-1", "idx-1")))
        .build();
    let engine = SessionEngine::new(config, HttpBackend::new(endpoints(&server)));

    engine.submit("Define Y").await.expect("first submit");
    engine.submit("And W?").await.expect("second submit");

    let log = engine.retrieval_log();
    assert_eq!(log.questions_asked(), "Define Y | And W? | ");
    assert_eq!(log.answers_given(), "Y is Z | W is V | ");
}

#[tokio::test]
async fn retrieval_not_found_degrades_to_fallback() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Chat"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "index missing"})))
        .mount(&server)
        .await;

    let config = SessionConfig::builder()
        .mode(SessionMode::retrieval(KnowledgeSource::new("ns-1", "gone")))
        .build();
    let engine = SessionEngine::new(config, HttpBackend::new(endpoints(&server)));

    engine.submit("anything").await.expect("submit");

    assert_eq!(
        engine.transcript().last(),
        Some(&Message::assistant(RETRIEVAL_FALLBACK))
    );
    assert!(engine.retrieval_log().answers_given().is_empty());
}

#[tokio::test]
async fn retrieval_body_without_response_field_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/Chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "wrong key"})))
        .mount(&server)
        .await;

    let backend = HttpBackend::new(endpoints(&server));
    let query = RetrievalQuery {
        query: "q".to_string(),
        namespace: "ns".to_string(),
        index_name: "idx".to_string(),
        questions: String::new(),
        answers: String::new(),
    };

    let err = backend.query_retrieval(&query).await.unwrap_err();
    assert!(err.is_transport());
}
