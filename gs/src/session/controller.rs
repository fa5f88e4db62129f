//! SessionController - owns the session for its whole lifetime
//!
//! Applies the effects of the state machine to the collaborators: stage
//! content fetches, narration cues, ambient playback and reflection insight.
//! Async work is spawned and its result comes back through the inbox, so no
//! collaborator ever blocks stage timing. Superseded fetches are aborted, not
//! merely ignored.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::audio::{AmbientChannel, AmbientDevice, NarrationChannel, SpeechDevice};
use crate::config::Config;
use crate::content::{ContentError, ContentProvider, InsightService};
use crate::domain::{COMPLETION_CUE, Stage, StageId, fallback_narration, fallback_stages, validate_stages};
use crate::reflection::ReflectionState;

use super::clock::Clock;
use super::error::{SessionError, SessionResponse};
use super::events::{SessionEvent, SessionEventBus};
use super::machine::{SessionEffect, SessionMachine, SessionStatus};

/// Pacing and channel defaults for a session
#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub tick_interval: Duration,
    pub grace_delay: Duration,
    pub narration_enabled: bool,
    pub ambient_enabled: bool,
    pub ambient_volume: f32,
}

impl SessionOptions {
    pub fn from_config(config: &Config) -> Self {
        debug!("SessionOptions::from_config: called");
        Self {
            tick_interval: config.session.tick_interval(),
            grace_delay: config.session.grace_delay(),
            narration_enabled: config.session.narration_enabled,
            ambient_enabled: config.session.ambient_enabled,
            ambient_volume: config.ambient.volume,
        }
    }
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// External capabilities injected into the controller
#[derive(Clone)]
pub struct Collaborators {
    pub content: Arc<dyn ContentProvider>,
    pub insight: Arc<dyn InsightService>,
    pub speech: Option<Arc<dyn SpeechDevice>>,
    pub ambient: Option<Arc<dyn AmbientDevice>>,
    pub clock: Arc<dyn Clock>,
}

/// Result of a spawned stage-content fetch
#[derive(Debug)]
pub struct ContentReady {
    epoch: u64,
    stage_id: StageId,
    result: Result<String, ContentError>,
}

/// Result of a spawned insight request
#[derive(Debug)]
pub struct InsightReady {
    epoch: u64,
    result: Result<String, ContentError>,
}

/// Receivers for spawned work, drained by the session actor
pub struct ControllerInbox {
    pub content_rx: mpsc::UnboundedReceiver<ContentReady>,
    pub insight_rx: mpsc::UnboundedReceiver<InsightReady>,
}

/// Point-in-time view of the session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub status: SessionStatus,
    pub stages: Vec<Stage>,
    pub current_stage_index: Option<usize>,
    pub current_stage_progress: f64,
    pub overall_progress: f64,
    /// Completed stage ids in stage order
    pub completed_stage_ids: Vec<StageId>,
    pub paused_at_fraction: f64,
    pub narration_enabled: bool,
    pub ambient_enabled: bool,
    /// Latest narration text handed to the narration channel
    pub narration_text: Option<String>,
    pub total_duration_seconds: u64,
    pub reflection: Option<ReflectionState>,
}

/// Guided session controller
pub struct SessionController {
    machine: SessionMachine,
    narration: NarrationChannel,
    ambient: AmbientChannel,
    reflection: Option<ReflectionState>,
    content: Arc<dyn ContentProvider>,
    insight: Arc<dyn InsightService>,
    clock: Arc<dyn Clock>,
    events: SessionEventBus,
    session_id: Option<String>,
    started_at: Option<DateTime<Utc>>,
    content_epoch: u64,
    content_task: Option<JoinHandle<()>>,
    content_tx: mpsc::UnboundedSender<ContentReady>,
    insight_epoch: u64,
    insight_task: Option<JoinHandle<()>>,
    insight_tx: mpsc::UnboundedSender<InsightReady>,
}

impl SessionController {
    /// Create an idle controller and the inbox its spawned work reports to
    pub fn new(
        options: SessionOptions,
        collaborators: Collaborators,
        events: SessionEventBus,
    ) -> (Self, ControllerInbox) {
        debug!(?options, "SessionController::new: called");
        let (content_tx, content_rx) = mpsc::unbounded_channel();
        let (insight_tx, insight_rx) = mpsc::unbounded_channel();

        let controller = Self {
            machine: SessionMachine::new(options.grace_delay),
            narration: NarrationChannel::new(collaborators.speech, options.narration_enabled),
            ambient: AmbientChannel::new(collaborators.ambient, options.ambient_enabled, options.ambient_volume),
            reflection: None,
            content: collaborators.content,
            insight: collaborators.insight,
            clock: collaborators.clock,
            events,
            session_id: None,
            started_at: None,
            content_epoch: 0,
            content_task: None,
            content_tx,
            insight_epoch: 0,
            insight_task: None,
            insight_tx,
        };

        (controller, ControllerInbox { content_rx, insight_rx })
    }

    pub fn status(&self) -> SessionStatus {
        self.machine.status()
    }

    /// Active and not paused: the progress timer should be ticking
    pub fn is_running(&self) -> bool {
        self.machine.status() == SessionStatus::Active
    }

    pub fn events(&self) -> &SessionEventBus {
        &self.events
    }

    /// Fetch the stage list and begin stage 0 (Idle → Active)
    pub async fn start(&mut self) -> SessionResponse<()> {
        debug!(status = ?self.status(), "SessionController::start: called");
        if self.status() != SessionStatus::Idle {
            return Err(SessionError::AlreadyStarted);
        }

        let stages = self.load_stages().await;
        let session_id = Uuid::now_v7().to_string();
        info!(%session_id, stage_count = stages.len(), "Starting guided session");

        self.events.emit(SessionEvent::SessionStarted {
            session_id: session_id.clone(),
            stage_count: stages.len(),
            total_seconds: crate::domain::total_duration_seconds(&stages),
        });
        self.session_id = Some(session_id);
        self.started_at = Some(Utc::now());
        self.reflection = None;

        self.ambient.start();
        let effects = self.machine.start(stages, self.clock.now());
        self.apply(effects);
        Ok(())
    }

    /// Sample the clock and apply any resulting transitions
    pub fn tick(&mut self) {
        let effects = self.machine.tick(self.clock.now());
        self.apply(effects);
    }

    pub fn advance(&mut self) {
        debug!("SessionController::advance: called");
        let effects = self.machine.advance(self.clock.now());
        self.apply(effects);
    }

    pub fn skip_to(&mut self, index: usize) {
        debug!(index, "SessionController::skip_to: called");
        let effects = self.machine.skip_to(index, self.clock.now());
        self.apply(effects);
    }

    pub fn pause(&mut self) {
        debug!("SessionController::pause: called");
        let effects = self.machine.pause(self.clock.now());
        self.apply(effects);
    }

    pub fn resume(&mut self) {
        debug!("SessionController::resume: called");
        let effects = self.machine.resume(self.clock.now());
        self.apply(effects);
    }

    /// Cancel timers and audio and return to Idle
    pub fn stop(&mut self) {
        debug!(status = ?self.status(), "SessionController::stop: called");
        let effects = self.machine.stop();
        if effects.is_empty() {
            self.release_audio();
        } else {
            self.apply(effects);
        }
    }

    /// Flip narration on/off, returning the new flag
    pub fn toggle_narration(&mut self) -> bool {
        let enabled = self.narration.toggle();
        info!(enabled, "Narration toggled");
        self.events.emit(SessionEvent::NarrationToggled { enabled });
        enabled
    }

    /// Flip ambient on/off, returning the new flag
    pub fn toggle_ambient(&mut self) -> bool {
        let enabled = self.ambient.toggle(self.is_running());
        info!(enabled, "Ambient toggled");
        self.events.emit(SessionEvent::AmbientToggled { enabled });
        enabled
    }

    /// Apply a finished stage-content fetch
    pub fn on_content_ready(&mut self, ready: ContentReady) {
        debug!(stage_id = %ready.stage_id, epoch = ready.epoch, "SessionController::on_content_ready: called");
        if ready.epoch != self.content_epoch {
            debug!(current = self.content_epoch, "SessionController::on_content_ready: stale result dropped");
            return;
        }
        self.content_task = None;

        let (text, fallback) = match ready.result {
            Ok(text) => (text, false),
            Err(e) => {
                warn!(stage_id = %ready.stage_id, error = %e, "Stage content fetch failed, using fallback narration");
                (fallback_narration(&ready.stage_id).to_string(), true)
            }
        };

        let spoken = self.narration.speak(&text);
        if spoken && self.status() == SessionStatus::Paused {
            self.narration.pause_channel();
        }
        self.events.emit(SessionEvent::StageContentReady {
            stage_id: ready.stage_id,
            text,
            spoken,
            fallback,
        });
    }

    /// Validate reflection text and request an insight for it
    pub fn submit_reflection(&mut self, text: &str) -> SessionResponse<()> {
        debug!(text_len = text.len(), status = ?self.status(), "SessionController::submit_reflection: called");
        if self.status() != SessionStatus::Complete {
            return Err(SessionError::NotComplete);
        }
        self.reflection.get_or_insert_with(ReflectionState::new).begin_submit(text)?;

        self.insight_epoch += 1;
        let epoch = self.insight_epoch;
        let insight = self.insight.clone();
        let tx = self.insight_tx.clone();
        let text = text.to_string();
        let duration_seconds = self.machine.total_duration_seconds();
        info!(duration_seconds, "Requesting reflection insight");

        self.insight_task = Some(tokio::spawn(async move {
            let result = insight.request_insight(&text, duration_seconds).await;
            let _ = tx.send(InsightReady { epoch, result });
        }));
        Ok(())
    }

    /// Apply a finished insight request, returning the stored insight
    pub fn on_insight_ready(&mut self, ready: InsightReady) -> Option<String> {
        debug!(epoch = ready.epoch, "SessionController::on_insight_ready: called");
        if ready.epoch != self.insight_epoch {
            debug!("SessionController::on_insight_ready: stale result dropped");
            return None;
        }
        self.insight_task = None;

        let reflection = self.reflection.as_mut()?;
        let insight = reflection.finish_submit(ready.result).to_string();
        self.events.emit(SessionEvent::InsightReady {
            insight: insight.clone(),
        });
        Some(insight)
    }

    /// Leave reflection without calling the insight service
    pub fn skip_reflection(&mut self) -> SessionResponse<()> {
        debug!("SessionController::skip_reflection: called");
        self.finish()
    }

    /// Stop both channels and return to Idle after reflection
    pub fn finish(&mut self) -> SessionResponse<()> {
        debug!(status = ?self.status(), "SessionController::finish: called");
        if self.status() != SessionStatus::Complete {
            return Err(SessionError::NotComplete);
        }
        info!("Reflection finished");
        let effects = self.machine.stop();
        self.apply(effects);
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let stages = self.machine.stages();
        let completed = self.machine.completed_stage_ids();
        SessionSnapshot {
            session_id: self.session_id.clone(),
            started_at: self.started_at,
            status: self.machine.status(),
            stages: stages.to_vec(),
            current_stage_index: self.machine.current_index(),
            current_stage_progress: self.machine.current_stage_progress(),
            overall_progress: self.machine.overall_progress(),
            completed_stage_ids: stages
                .iter()
                .filter(|s| completed.contains(&s.id))
                .map(|s| s.id.clone())
                .collect(),
            paused_at_fraction: self.machine.paused_at_fraction(),
            narration_enabled: self.narration.is_enabled(),
            ambient_enabled: self.ambient.is_enabled(),
            narration_text: self.narration.held_text().map(str::to_string),
            total_duration_seconds: self.machine.total_duration_seconds(),
            reflection: self.reflection.clone(),
        }
    }

    async fn load_stages(&self) -> Vec<Stage> {
        match self.content.fetch_stages().await {
            Ok(stages) => match validate_stages(&stages) {
                Ok(()) => stages,
                Err(e) => {
                    warn!(error = %e, "Fetched stage list unusable, using fallback script");
                    fallback_stages()
                }
            },
            Err(e) => {
                warn!(error = %e, "Stage list fetch failed, using fallback script");
                fallback_stages()
            }
        }
    }

    fn apply(&mut self, effects: Vec<SessionEffect>) {
        for effect in effects {
            debug!(?effect, "SessionController::apply: effect");
            match effect {
                SessionEffect::StageEntered { index, stage_id } => self.enter_stage(index, stage_id),
                SessionEffect::StageCompleted { stage_id } => {
                    self.events.emit(SessionEvent::StageCompleted { stage_id });
                }
                SessionEffect::SessionCompleted => {
                    self.cancel_content_fetch();
                    self.narration.speak(COMPLETION_CUE);
                    self.reflection = Some(ReflectionState::new());
                    self.events.emit(SessionEvent::SessionCompleted);
                }
                SessionEffect::Paused { fraction } => {
                    self.narration.pause_channel();
                    self.ambient.pause();
                    self.events.emit(SessionEvent::Paused { fraction });
                }
                SessionEffect::Resumed { fraction } => {
                    self.narration.resume_channel();
                    self.ambient.resume();
                    self.events.emit(SessionEvent::Resumed { fraction });
                }
                SessionEffect::Reset => {
                    self.cancel_content_fetch();
                    self.cancel_insight();
                    self.release_audio();
                    self.reflection = None;
                    self.session_id = None;
                    self.started_at = None;
                    self.events.emit(SessionEvent::SessionReset);
                }
            }
        }
    }

    /// Cancel the previous stage's work, then fetch this stage's content
    fn enter_stage(&mut self, index: usize, stage_id: StageId) {
        self.cancel_content_fetch();
        self.narration.cancel();

        let epoch = self.content_epoch;
        let content = self.content.clone();
        let tx = self.content_tx.clone();
        let fetch_id = stage_id.clone();
        self.content_task = Some(tokio::spawn(async move {
            let result = content.fetch_stage_content(&fetch_id).await;
            let _ = tx.send(ContentReady {
                epoch,
                stage_id: fetch_id,
                result,
            });
        }));

        let name = self
            .machine
            .stages()
            .get(index)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        self.events.emit(SessionEvent::StageStarted { index, stage_id, name });
    }

    fn cancel_content_fetch(&mut self) {
        if let Some(task) = self.content_task.take() {
            debug!("SessionController::cancel_content_fetch: aborting in-flight fetch");
            task.abort();
        }
        self.content_epoch += 1;
    }

    fn cancel_insight(&mut self) {
        if let Some(task) = self.insight_task.take() {
            debug!("SessionController::cancel_insight: aborting in-flight insight request");
            task.abort();
        }
        self.insight_epoch += 1;
    }

    fn release_audio(&mut self) {
        self.narration.release();
        self.ambient.stop();
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        debug!("SessionController::drop: releasing session resources");
        if let Some(task) = self.content_task.take() {
            task.abort();
        }
        if let Some(task) = self.insight_task.take() {
            task.abort();
        }
        self.release_audio();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::mock::{AmbientCall, RecordingAmbient, RecordingSpeech, SpeechCall};
    use crate::content::mock::{MockContentProvider, MockInsightService};
    use crate::reflection::FALLBACK_INSIGHT;
    use crate::session::clock::ManualClock;

    struct Fixture {
        controller: SessionController,
        inbox: ControllerInbox,
        clock: ManualClock,
        speech: Arc<RecordingSpeech>,
        ambient: Arc<RecordingAmbient>,
        content: Arc<MockContentProvider>,
        insight: Arc<MockInsightService>,
    }

    fn two_stages() -> Vec<Stage> {
        vec![Stage::new("a", "A", 30, "", ""), Stage::new("b", "B", 60, "", "")]
    }

    fn fixture(content: MockContentProvider, insight: MockInsightService) -> Fixture {
        let clock = ManualClock::new();
        let speech = Arc::new(RecordingSpeech::new());
        let ambient = Arc::new(RecordingAmbient::new());
        let content = Arc::new(content);
        let insight = Arc::new(insight);
        let options = SessionOptions {
            grace_delay: Duration::ZERO,
            ..Default::default()
        };
        let collaborators = Collaborators {
            content: content.clone(),
            insight: insight.clone(),
            speech: Some(speech.clone()),
            ambient: Some(ambient.clone()),
            clock: Arc::new(clock.clone()),
        };
        let (controller, inbox) = SessionController::new(options, collaborators, SessionEventBus::default());
        Fixture {
            controller,
            inbox,
            clock,
            speech,
            ambient,
            content,
            insight,
        }
    }

    impl Fixture {
        async fn deliver_content(&mut self) {
            let ready = self.inbox.content_rx.recv().await.unwrap();
            self.controller.on_content_ready(ready);
        }

        async fn deliver_insight(&mut self) -> Option<String> {
            let ready = self.inbox.insight_rx.recv().await.unwrap();
            self.controller.on_insight_ready(ready)
        }

        fn run_to(&mut self, secs: u64) {
            self.clock.set(Duration::from_secs(secs));
            self.controller.tick();
        }
    }

    #[tokio::test]
    async fn test_start_falls_back_when_provider_unreachable() {
        let mut f = fixture(MockContentProvider::unreachable(), MockInsightService::new(None));
        f.controller.start().await.unwrap();

        let snapshot = f.controller.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Active);
        assert_eq!(snapshot.stages, fallback_stages());
        assert_eq!(snapshot.current_stage_index, Some(0));

        // Stage text also falls back
        f.deliver_content().await;
        assert_eq!(f.speech.spoken(), vec![fallback_narration("welcome").to_string()]);
        assert_eq!(f.controller.start().await, Err(SessionError::AlreadyStarted));
    }

    #[tokio::test]
    async fn test_invalid_stage_list_uses_fallback() {
        let dup = vec![Stage::new("a", "A", 30, "", ""), Stage::new("a", "A", 30, "", "")];
        let mut f = fixture(MockContentProvider::new(Some(dup)), MockInsightService::new(None));
        f.controller.start().await.unwrap();
        assert_eq!(f.controller.snapshot().stages.len(), 5);
    }

    #[tokio::test]
    async fn test_stage_content_is_spoken_and_ambient_started() {
        let provider = MockContentProvider::new(Some(two_stages()))
            .with_text("a", "breathe a")
            .with_text("b", "breathe b");
        let mut f = fixture(provider, MockInsightService::new(None));
        f.controller.start().await.unwrap();
        f.deliver_content().await;

        assert_eq!(f.speech.spoken(), vec!["breathe a".to_string()]);
        assert_eq!(f.ambient.calls(), vec![AmbientCall::SetVolume(0.3), AmbientCall::Play]);

        f.run_to(30);
        f.deliver_content().await;
        assert_eq!(f.speech.spoken(), vec!["breathe a".to_string(), "breathe b".to_string()]);
        assert_eq!(f.content.fetched(), vec!["a".to_string(), "b".to_string()]);
    }

    #[tokio::test]
    async fn test_stale_content_is_not_spoken() {
        let provider = MockContentProvider::new(Some(two_stages()))
            .with_text("a", "breathe a")
            .with_text("b", "breathe b");
        let mut f = fixture(provider, MockInsightService::new(None));
        f.controller.start().await.unwrap();

        let stale = f.inbox.content_rx.recv().await.unwrap();
        f.controller.skip_to(1);
        f.controller.on_content_ready(stale);
        assert!(f.speech.spoken().is_empty());

        f.deliver_content().await;
        assert_eq!(f.speech.spoken(), vec!["breathe b".to_string()]);
    }

    #[tokio::test]
    async fn test_muted_stage_holds_content() {
        let provider = MockContentProvider::new(Some(two_stages()))
            .with_text("a", "breathe a")
            .with_text("b", "breathe b");
        let mut f = fixture(provider, MockInsightService::new(None));
        f.controller.start().await.unwrap();
        f.deliver_content().await;

        assert!(!f.controller.toggle_narration());
        assert_eq!(f.speech.calls().last(), Some(&SpeechCall::Cancel));

        f.run_to(30);
        f.deliver_content().await;
        assert_eq!(f.speech.spoken(), vec!["breathe a".to_string()]);
        assert_eq!(f.controller.snapshot().narration_text.as_deref(), Some("breathe b"));
        // Ambient unaffected
        assert!(f.controller.snapshot().ambient_enabled);
    }

    #[tokio::test]
    async fn test_pause_suspends_both_channels() {
        let provider = MockContentProvider::new(Some(two_stages())).with_text("a", "breathe a");
        let mut f = fixture(provider, MockInsightService::new(None));
        f.controller.start().await.unwrap();
        f.deliver_content().await;

        f.run_to(10);
        f.controller.pause();
        assert_eq!(f.speech.calls().last(), Some(&SpeechCall::Pause));
        assert_eq!(f.ambient.calls().last(), Some(&AmbientCall::Pause));

        // Toggling ambient on while paused does not resume it
        f.controller.toggle_ambient();
        f.controller.toggle_ambient();
        assert_eq!(f.ambient.calls().last(), Some(&AmbientCall::Pause));

        f.clock.set(Duration::from_secs(100));
        f.controller.resume();
        assert_eq!(f.speech.calls().last(), Some(&SpeechCall::Resume));
        assert_eq!(f.ambient.calls().last(), Some(&AmbientCall::Play));
        assert!((f.controller.snapshot().current_stage_progress - 1.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_completion_enters_reflection_and_keeps_ambient() {
        let provider = MockContentProvider::new(Some(two_stages()));
        let mut f = fixture(provider, MockInsightService::new(Some("You were present.")));
        f.controller.start().await.unwrap();

        f.run_to(90);
        let snapshot = f.controller.snapshot();
        assert_eq!(snapshot.status, SessionStatus::Complete);
        assert_eq!(snapshot.completed_stage_ids, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(snapshot.reflection, Some(ReflectionState::new()));
        assert_eq!(f.speech.spoken().last().map(String::as_str), Some(COMPLETION_CUE));
        assert!(!f.ambient.calls().contains(&AmbientCall::Stop));

        f.controller.submit_reflection("I felt calm").unwrap();
        assert_eq!(f.deliver_insight().await.as_deref(), Some("You were present."));
        assert_eq!(f.insight.last_request(), Some(("I felt calm".to_string(), 90)));

        f.controller.finish().unwrap();
        assert_eq!(f.controller.status(), SessionStatus::Idle);
        assert_eq!(f.ambient.calls().last(), Some(&AmbientCall::Stop));
        assert!(f.controller.snapshot().reflection.is_none());
    }

    #[tokio::test]
    async fn test_blank_reflection_makes_no_call() {
        let provider = MockContentProvider::new(Some(two_stages()));
        let mut f = fixture(provider, MockInsightService::new(Some("unused")));
        f.controller.start().await.unwrap();
        f.controller.skip_to(2);

        let before = f.controller.snapshot().reflection;
        assert_eq!(f.controller.submit_reflection("   "), Err(SessionError::EmptyReflection));
        assert_eq!(f.controller.submit_reflection(""), Err(SessionError::EmptyReflection));
        assert_eq!(f.controller.snapshot().reflection, before);
        assert_eq!(f.insight.call_count(), 0);
    }

    #[tokio::test]
    async fn test_insight_failure_stores_fallback() {
        let provider = MockContentProvider::new(Some(two_stages()));
        let mut f = fixture(provider, MockInsightService::new(None));
        f.controller.start().await.unwrap();
        f.controller.skip_to(2);

        f.controller.submit_reflection("It was hard to focus").unwrap();
        f.deliver_insight().await;
        let reflection = f.controller.snapshot().reflection.unwrap();
        assert_eq!(reflection.insight, FALLBACK_INSIGHT);
        assert!(!reflection.submitting);
    }

    #[tokio::test]
    async fn test_skip_reflection_resets_without_calling_service() {
        let provider = MockContentProvider::new(Some(two_stages()));
        let mut f = fixture(provider, MockInsightService::new(Some("unused")));
        f.controller.start().await.unwrap();
        assert_eq!(f.controller.skip_reflection(), Err(SessionError::NotComplete));

        f.controller.skip_to(5);
        f.controller.skip_reflection().unwrap();
        assert_eq!(f.controller.status(), SessionStatus::Idle);
        assert_eq!(f.insight.call_count(), 0);
    }

    #[tokio::test]
    async fn test_stop_releases_devices() {
        let provider = MockContentProvider::new(Some(two_stages())).with_text("a", "breathe a");
        let mut f = fixture(provider, MockInsightService::new(None));
        f.controller.start().await.unwrap();
        f.deliver_content().await;

        f.controller.stop();
        assert_eq!(f.controller.status(), SessionStatus::Idle);
        assert_eq!(f.speech.calls().last(), Some(&SpeechCall::Cancel));
        assert_eq!(f.ambient.calls().last(), Some(&AmbientCall::Stop));
    }

    #[tokio::test]
    async fn test_drop_releases_devices() {
        let provider = MockContentProvider::new(Some(two_stages()));
        let f = fixture(provider, MockInsightService::new(None));
        let speech = f.speech.clone();
        let ambient = f.ambient.clone();
        let Fixture { mut controller, .. } = f;
        controller.start().await.unwrap();
        drop(controller);

        assert_eq!(speech.calls().last(), Some(&SpeechCall::Cancel));
        assert_eq!(ambient.calls().last(), Some(&AmbientCall::Stop));
    }
}
