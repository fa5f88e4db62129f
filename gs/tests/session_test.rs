//! End-to-end session tests
//!
//! Run whole sessions through `SessionHandle` against a wiremock backend,
//! using real time and one-second stages.

use std::sync::Arc;
use std::time::Duration;

use guidedsession::audio::mock::{AmbientCall, RecordingAmbient, RecordingSpeech};
use guidedsession::config::ApiConfig;
use guidedsession::content::HttpContentClient;
use guidedsession::domain::{COMPLETION_CUE, DEFAULT_FALLBACK_NARRATION, fallback_stages};
use guidedsession::reflection::FALLBACK_INSIGHT;
use guidedsession::session::{
    Collaborators, SessionEvent, SessionHandle, SessionOptions, SessionStatus, TokioClock,
};
use serde_json::json;
use tokio::time::timeout;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Devices {
    speech: Arc<RecordingSpeech>,
    ambient: Arc<RecordingAmbient>,
}

fn spawn_against(base_url: &str) -> (SessionHandle, Devices) {
    let client = Arc::new(
        HttpContentClient::from_config(&ApiConfig {
            base_url: base_url.to_string(),
            timeout_ms: 2_000,
            max_retries: 0,
            initial_backoff_ms: 1,
        })
        .expect("client"),
    );
    let speech = Arc::new(RecordingSpeech::new());
    let ambient = Arc::new(RecordingAmbient::new());
    let options = SessionOptions {
        tick_interval: Duration::from_millis(20),
        grace_delay: Duration::ZERO,
        ..Default::default()
    };

    let handle = SessionHandle::spawn(
        options,
        Collaborators {
            content: client.clone(),
            insight: client,
            speech: Some(speech.clone()),
            ambient: Some(ambient.clone()),
            clock: Arc::new(TokioClock::new()),
        },
    );
    (handle, Devices { speech, ambient })
}

async fn backend() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/meditation/stages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stages": [
                {"id": "arrive", "name": "Arrive", "duration": 1, "icon": "heart", "description": "Settle in"},
                {"id": "rest", "name": "Rest", "duration": 1, "icon": "sun", "description": "Simply rest"}
            ],
            "total_duration": 2
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/meditation/stage/arrive/content"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "stage_id": "arrive",
            "stage_name": "Arrive",
            "content": "Arrive here.",
            "duration": 1
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/meditation/stage/rest/content"))
        .respond_with(ResponseTemplate::new(500).set_body_string("generation failed"))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/meditation/reflection"))
        .and(body_json(json!({"text": "I rested", "duration_seconds": 2})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"insight": "Rest is progress."})))
        .expect(1)
        .mount(&server)
        .await;

    server
}

async fn wait_for_completion(handle: &SessionHandle, events: &mut tokio::sync::broadcast::Receiver<SessionEvent>) {
    let finished = timeout(Duration::from_secs(10), async {
        loop {
            match events.recv().await {
                Ok(SessionEvent::SessionCompleted) => break,
                Ok(_) => continue,
                Err(e) => panic!("event stream ended: {}", e),
            }
        }
    })
    .await;
    assert!(finished.is_ok(), "session did not complete in time");
    assert_eq!(handle.snapshot().await.unwrap().status, SessionStatus::Complete);
}

#[tokio::test]
async fn test_full_session_against_backend() {
    let server = backend().await;
    let (handle, devices) = spawn_against(&server.uri());
    let mut events = handle.subscribe();

    handle.start().await.unwrap();
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.stages.len(), 2);
    assert_eq!(snapshot.total_duration_seconds, 2);
    assert!(snapshot.session_id.is_some());

    wait_for_completion(&handle, &mut events).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.completed_stage_ids, vec!["arrive".to_string(), "rest".to_string()]);
    assert_eq!(snapshot.overall_progress, 1.0);
    assert_eq!(
        devices.speech.spoken(),
        vec![
            "Arrive here.".to_string(),
            DEFAULT_FALLBACK_NARRATION.to_string(),
            COMPLETION_CUE.to_string()
        ]
    );
    // Ambient keeps playing into reflection
    assert!(!devices.ambient.calls().contains(&AmbientCall::Stop));

    let insight = handle.submit_reflection("I rested").await.unwrap();
    assert_eq!(insight, "Rest is progress.");
    let reflection = handle.snapshot().await.unwrap().reflection.unwrap();
    assert_eq!(reflection.free_text, "I rested");
    assert!(!reflection.submitting);

    handle.finish().await.unwrap();
    assert_eq!(handle.snapshot().await.unwrap().status, SessionStatus::Idle);
    assert_eq!(devices.ambient.calls().last(), Some(&AmbientCall::Stop));
    handle.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_unreachable_backend_uses_fallbacks() {
    // Nothing listens on the discard port
    let (handle, devices) = spawn_against("http://127.0.0.1:9");

    handle.start().await.unwrap();
    let snapshot = handle.snapshot().await.unwrap();
    assert_eq!(snapshot.stages, fallback_stages());
    assert_eq!(snapshot.total_duration_seconds, 360);

    handle.skip_to(5).await.unwrap();
    let insight = handle.submit_reflection("Hard to settle today").await.unwrap();
    assert_eq!(insight, FALLBACK_INSIGHT);
    assert_eq!(devices.speech.spoken().last().map(String::as_str), Some(COMPLETION_CUE));

    handle.finish().await.unwrap();
    assert_eq!(handle.snapshot().await.unwrap().status, SessionStatus::Idle);
}

#[tokio::test]
async fn test_blank_reflection_is_rejected_without_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/meditation/reflection"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"insight": "unused"})))
        .expect(0)
        .mount(&server)
        .await;

    let (handle, _devices) = spawn_against(&server.uri());
    handle.start().await.unwrap();
    handle.skip_to(99).await.unwrap();

    let err = handle.submit_reflection("  \n ").await.unwrap_err();
    assert_eq!(err, guidedsession::SessionError::EmptyReflection);
    assert_eq!(handle.snapshot().await.unwrap().reflection.unwrap().free_text, "");
}
