use std::sync::Arc;

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use travel_chat::backend::HttpBackend;
use travel_chat::client::{ChatBackend, ClientError};
use travel_chat::controller::{ChatController, Submission};
use travel_chat::history;
use travel_chat::model::{AgentType, ChunkEvent};
use travel_chat::options::{HttpTransport, RenderOptions, TransportOptions};
use travel_chat::session::Termination;
use travel_chat::transcript::{Entry, Transcript};

fn backend(server: &MockServer) -> Arc<HttpBackend> {
    let transport = HttpTransport::default()
        .with_base_url(server.uri())
        .with_cookie("session=abc");
    Arc::new(HttpBackend::new(TransportOptions::new(transport)).unwrap())
}

fn event_stream(events: &[ChunkEvent]) -> ResponseTemplate {
    let body: String = events.iter().map(ChunkEvent::to_record).collect();
    ResponseTemplate::new(200).set_body_raw(body, "text/event-stream")
}

#[tokio::test]
async fn test_chat_reply_is_streamed_into_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send_message"))
        .and(header("cookie", "session=abc"))
        .and(body_json(json!({ "message": "Weekend in Suzhou?", "agent_type": "travel" })))
        .respond_with(event_stream(&[
            ChunkEvent::Text("**Day 1**: ".to_string()),
            ChunkEvent::Text("Humble Administrator's Garden".to_string()),
            ChunkEvent::Done,
        ]))
        .expect(1)
        .mount(&server)
        .await;

    let mut controller = ChatController::new(backend(&server), RenderOptions::default());
    let mut transcript = Transcript::new();
    let mut completed = None;

    let outcome = controller
        .submit(
            &mut transcript,
            Submission::chat("Weekend in Suzhou?", AgentType::Travel),
            |outcome| completed = Some(outcome.termination.clone()),
        )
        .await
        .unwrap();

    assert_eq!(outcome.termination, Termination::Done);
    assert_eq!(completed, Some(Termination::Done));
    assert_eq!(outcome.chunks, 2);

    let reply = transcript.last_assistant().unwrap();
    assert!(reply.inner_html().contains("<strong>Day 1</strong>"));
    assert!(!reply.has_class("streaming"));
    assert!(!transcript.is_loading());
    assert_eq!(
        transcript.entries()[0],
        Entry::User("Weekend in Suzhou?".to_string())
    );
}

#[tokio::test]
async fn test_error_event_renders_one_inline_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send_message"))
        .respond_with(event_stream(&[ChunkEvent::Error("upstream timeout".to_string())]))
        .mount(&server)
        .await;

    let mut controller = ChatController::new(backend(&server), RenderOptions::default());
    let mut transcript = Transcript::new();

    let outcome = controller
        .submit(&mut transcript, Submission::chat("hi", AgentType::General), |_| {})
        .await
        .unwrap();

    assert_eq!(
        outcome.termination,
        Termination::ServerError("upstream timeout".to_string())
    );
    let html = transcript.last_assistant().unwrap().inner_html();
    assert_eq!(html.matches("stream-error").count(), 1);
    assert!(html.contains("upstream timeout"));
}

#[tokio::test]
async fn test_refused_request_shows_error_entry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/send_message"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "error": "Unauthorized" })))
        .mount(&server)
        .await;

    let mut controller = ChatController::new(backend(&server), RenderOptions::default());
    let mut transcript = Transcript::new();
    let mut hook_called = false;

    let err = controller
        .submit(&mut transcript, Submission::chat("hi", AgentType::General), |_| {
            hook_called = true
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClientError::Status { status: 401, ref message } if message == "Unauthorized"
    ));
    assert!(!hook_called);
    assert_eq!(transcript.error_count(), 1);
    assert!(transcript.last_assistant().is_none());
    assert!(!transcript.is_loading());
}

#[tokio::test]
async fn test_unreachable_backend_is_a_transport_error() {
    let transport = HttpTransport::default().with_base_url("http://127.0.0.1:1".to_string());
    let backend = Arc::new(HttpBackend::new(TransportOptions::new(transport)).unwrap());
    let mut controller = ChatController::new(backend, RenderOptions::default());
    let mut transcript = Transcript::new();

    let err = controller
        .submit(&mut transcript, Submission::chat("hi", AgentType::General), |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, ClientError::Http(_)));
    assert_eq!(transcript.error_count(), 1);
}

#[tokio::test]
async fn test_load_history_accepts_both_field_spellings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/load_history"))
        .and(body_json(json!({ "email": "ann@example.com" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "history": [{
                "id": 12,
                "date": "2025-03-01",
                "messages": [
                    { "text": "Three days in Xi'an", "is_user": true },
                    { "content": "Day 1: city wall", "isUser": false }
                ]
            }]
        })))
        .mount(&server)
        .await;

    let history = backend(&server).load_history("ann@example.com").await.unwrap();

    assert_eq!(history.len(), 1);
    assert_eq!(history[0].id, "12");
    assert!(history[0].messages[0].is_user);
    assert_eq!(history[0].messages[1].text, "Day 1: city wall");
}

#[tokio::test]
async fn test_history_mutations() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/delete_conversation"))
        .and(body_json(json!({ "email": "ann@example.com", "conversation_id": "12" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/clear_history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/new_conversation"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "error": "db locked" })))
        .mount(&server)
        .await;

    let backend = backend(&server);
    backend.delete_conversation("ann@example.com", "12").await.unwrap();
    backend.clear_history("ann@example.com").await.unwrap();

    let err = backend.new_conversation().await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Status { status: 500, ref message } if message == "db locked"
    ));
}

#[tokio::test]
async fn test_error_reply_with_ok_status_is_a_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/load_history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "error": "session expired" })))
        .mount(&server)
        .await;

    let err = backend(&server).load_history("ann@example.com").await.unwrap_err();
    assert!(matches!(err, ClientError::Server(ref message) if message == "session expired"));
}

#[tokio::test]
async fn test_stored_conversation_is_replayed_into_transcript() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/load_history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "history": [
                { "id": 1, "date": "2025-02-01", "messages": [] },
                {
                    "id": 2,
                    "date": "2025-03-01",
                    "messages": [
                        { "text": "Two days in Hangzhou", "is_user": true },
                        { "content": "**Day 1**: West Lake, then `print(route)`", "isUser": false }
                    ]
                }
            ]
        })))
        .mount(&server)
        .await;

    let controller = ChatController::new(backend(&server), RenderOptions::default());
    let conversations = controller.backend().load_history("ann@example.com").await.unwrap();
    let conversation = history::listed(&conversations, 2).unwrap();

    let mut transcript = Transcript::new();
    history::replay(conversation, &mut transcript, controller.renderer().pipeline());

    assert_eq!(
        transcript.entries()[0],
        Entry::User("Two days in Hangzhou".to_string())
    );
    let reply = transcript.last_assistant().unwrap().inner_html();
    assert!(reply.contains("<strong>Day 1</strong>"));
    assert!(reply.contains("<code class=\"language-python hljs\">"));
}
