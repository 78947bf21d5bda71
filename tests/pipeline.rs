//! Pipeline integration tests
//!
//! Exercise the controller → worker → speech path with recording doubles;
//! no audio hardware or network involved.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use async_trait::async_trait;

use herald::Result;
use herald::config::{AnnounceConfig, ContactEntry};
use herald::directory::{ContactResolver, StaticDirectory};
use herald::pipeline::{CompletionSink, PipelineController};
use herald::speech::{EngineState, SpeechEngineLifecycle, SpeechEngineProvider};

use common::{RecordingProvider, RecordingSink, wait_until};

const START_TIMEOUT: Duration = Duration::from_secs(5);

fn announce_config() -> AnnounceConfig {
    AnnounceConfig {
        template: "{sender}: {body}".to_string(),
        unknown_sender: "unknown".to_string(),
    }
}

fn contacts(entries: &[(&str, &str)]) -> Arc<StaticDirectory> {
    let entries: Vec<ContactEntry> = entries
        .iter()
        .map(|(name, number)| ContactEntry {
            name: (*name).to_string(),
            number: (*number).to_string(),
        })
        .collect();
    Arc::new(StaticDirectory::new(&entries))
}

fn build(
    directory: Arc<dyn ContactResolver>,
) -> (PipelineController, Arc<RecordingProvider>, Arc<RecordingSink>) {
    let provider = Arc::new(RecordingProvider::new());
    let engine_provider: Arc<dyn SpeechEngineProvider> = Arc::clone(&provider) as Arc<dyn SpeechEngineProvider>;
    let speech = Arc::new(SpeechEngineLifecycle::new(engine_provider, START_TIMEOUT));
    let sink = Arc::new(RecordingSink::new());
    let completion: Arc<dyn CompletionSink> = Arc::clone(&sink) as Arc<dyn CompletionSink>;
    let controller = PipelineController::new(speech, directory, announce_config(), completion);
    (controller, provider, sink)
}

/// Poll until the controller reports READY or two seconds elapse
async fn wait_ready(controller: &PipelineController) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    loop {
        if controller.is_ready().await {
            return true;
        }
        if tokio::time::Instant::now() > deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn utterances_follow_enqueue_order() {
    let (controller, provider, sink) = build(contacts(&[("Alice", "+15551234567")]));

    controller.enable().await;
    assert!(wait_ready(&controller).await);

    let first = br#"[
        {"from": "+15551234567", "body": "one"},
        {"body": "two"}
    ]"#;
    let second = br#"[{"from": "+15559990000", "body": "three"}]"#;

    controller.on_arrival_event(first.to_vec(), 1).unwrap();
    controller.on_arrival_event(second.to_vec(), 2).unwrap();

    assert!(wait_until(|| sink.tokens().len() == 2).await);
    assert_eq!(sink.tokens(), vec![1, 2]);

    assert_eq!(
        provider.texts(),
        vec![
            "Alice: one".to_string(),
            "unknown: two".to_string(),
            "5559990000: three".to_string(),
        ]
    );
}

#[tokio::test]
async fn completion_fires_for_malformed_and_empty_batches() {
    let (controller, provider, sink) = build(contacts(&[]));

    controller.on_arrival_event(b"not json".to_vec(), 7).unwrap();
    controller.on_arrival_event(b"[]".to_vec(), 8).unwrap();

    assert!(wait_until(|| sink.tokens().len() == 2).await);
    assert_eq!(sink.tokens(), vec![7, 8]);
    assert!(provider.texts().is_empty());
}

#[tokio::test]
async fn malformed_entry_does_not_cost_the_batch() {
    let (controller, provider, sink) = build(contacts(&[]));

    controller.enable().await;
    assert!(wait_ready(&controller).await);

    let payload = br#"[
        {"from": "+15551111111", "body": "first"},
        {"from": "+15552222222"},
        {"from": "+15553333333", "body": "last"}
    ]"#;
    controller.on_arrival_event(payload.to_vec(), 1).unwrap();

    assert!(wait_until(|| sink.tokens().len() == 1).await);
    assert_eq!(sink.tokens(), vec![1]);
    assert_eq!(
        provider.texts(),
        vec![
            "5551111111: first".to_string(),
            "5553333333: last".to_string()
        ]
    );
}

#[tokio::test]
async fn disabled_pipeline_acks_but_stays_silent() {
    let (controller, provider, sink) = build(contacts(&[]));

    let payload = br#"[{"from": "+15551234567", "body": "into the void"}]"#;
    controller.on_arrival_event(payload.to_vec(), 42).unwrap();

    assert!(wait_until(|| sink.tokens() == vec![42]).await);
    assert!(provider.texts().is_empty());
    assert_eq!(provider.starts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn enqueue_after_stop_fails_fast() {
    let (controller, _provider, _sink) = build(contacts(&[]));

    controller.stop().await;

    let err = controller
        .on_arrival_event(b"[]".to_vec(), 1)
        .expect_err("stopped pipeline must reject events");
    assert!(err.to_string().contains("pipeline stopped"));
}

/// Directory that takes a while, keeping the worker busy per message
struct SlowDirectory;

#[async_trait]
impl ContactResolver for SlowDirectory {
    async fn lookup(&self, _address: &str) -> Result<Option<String>> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(None)
    }
}

#[tokio::test]
async fn queued_events_are_acked_on_stop() {
    let (controller, _provider, sink) = build(Arc::new(SlowDirectory));

    let payload = br#"[{"from": "+15551234567", "body": "slow"}]"#;
    for sequence in 1..=3 {
        controller
            .on_arrival_event(payload.to_vec(), sequence)
            .unwrap();
    }

    controller.stop().await;

    // Every event is released exactly once, processed or drained
    assert_eq!(sink.tokens(), vec![1, 2, 3]);
}

#[tokio::test]
async fn pipeline_end_state_after_stop_is_disabled() {
    let (controller, provider, _sink) = build(contacts(&[]));

    controller.enable().await;
    assert!(wait_ready(&controller).await);

    controller.stop().await;
    assert_eq!(controller.engine_state().await, EngineState::Disabled);
    assert_eq!(provider.shutdowns.load(Ordering::SeqCst), 1);
}
