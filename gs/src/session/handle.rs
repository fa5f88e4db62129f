//! SessionHandle - cloneable client for the session actor
//!
//! The actor is the single cooperative driver of a session: one task that
//! selects over caller commands, the progress tick, and results of spawned
//! content and insight work. All state lives in the `SessionController` it
//! owns, so no locking is needed.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use super::controller::{Collaborators, ControllerInbox, SessionController, SessionOptions, SessionSnapshot};
use super::error::{SessionError, SessionResponse};
use super::events::{SessionEvent, SessionEventBus};
use super::messages::SessionCommand;

/// Handle to send commands to the session actor
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionCommand>,
    events: SessionEventBus,
}

impl SessionHandle {
    /// Spawn a session actor; the session stays Idle until `start`
    pub fn spawn(options: SessionOptions, collaborators: Collaborators) -> Self {
        debug!(?options, "spawn: called");
        let events = SessionEventBus::default();
        let tick_interval = options.tick_interval;
        let (controller, inbox) = SessionController::new(options, collaborators, events.clone());

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(actor_loop(controller, inbox, rx, tick_interval));
        info!("Session actor spawned");

        Self { tx, events }
    }

    /// Subscribe to session events emitted after this call
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Fetch the stage list (or fall back) and begin the first stage
    pub async fn start(&self) -> SessionResponse<()> {
        debug!("start: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Start { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    /// Cancel timers and audio and return to Idle
    pub async fn stop(&self) -> SessionResponse<()> {
        debug!("stop: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Stop { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    pub async fn pause(&self) -> SessionResponse<()> {
        debug!("pause: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Pause { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    pub async fn resume(&self) -> SessionResponse<()> {
        debug!("resume: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Resume { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    /// Move to the next stage, completing after the last
    pub async fn advance(&self) -> SessionResponse<()> {
        debug!("advance: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Advance { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    /// Jump to a stage; an index past the last completes the session
    pub async fn skip_to(&self, index: usize) -> SessionResponse<()> {
        debug!(index, "skip_to: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::SkipTo { index, reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    /// Returns the new narration flag
    pub async fn toggle_narration(&self) -> SessionResponse<bool> {
        debug!("toggle_narration: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::ToggleNarration { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    /// Returns the new ambient flag
    pub async fn toggle_ambient(&self) -> SessionResponse<bool> {
        debug!("toggle_ambient: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::ToggleAmbient { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    /// Submit reflection text and wait for the stored insight
    ///
    /// Resolves with the fallback insight when the service fails, and with
    /// `Cancelled` if the session is stopped or finished first.
    pub async fn submit_reflection(&self, text: &str) -> SessionResponse<String> {
        debug!(text_len = text.len(), "submit_reflection: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::SubmitReflection {
                text: text.to_string(),
                reply: reply_tx,
            })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    pub async fn skip_reflection(&self) -> SessionResponse<()> {
        debug!("skip_reflection: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::SkipReflection { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    pub async fn finish(&self) -> SessionResponse<()> {
        debug!("finish: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Finish { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    pub async fn snapshot(&self) -> SessionResponse<SessionSnapshot> {
        debug!("snapshot: called");
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(SessionCommand::Snapshot { reply: reply_tx })
            .await
            .map_err(|_| SessionError::ChannelClosed)?;
        reply_rx.await.map_err(|_| SessionError::ChannelClosed)?
    }

    /// Stop the actor; the controller releases both devices as it drops
    pub async fn shutdown(&self) -> SessionResponse<()> {
        debug!("shutdown: called");
        self.tx
            .send(SessionCommand::Shutdown)
            .await
            .map_err(|_| SessionError::ChannelClosed)
    }
}

type InsightReply = oneshot::Sender<SessionResponse<String>>;

async fn actor_loop(
    mut controller: SessionController,
    mut inbox: ControllerInbox,
    mut rx: mpsc::Receiver<SessionCommand>,
    tick_interval: Duration,
) {
    debug!(?tick_interval, "actor_loop: called");
    let mut ticker = tokio::time::interval(tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut pending_insight: Option<InsightReply> = None;

    loop {
        tokio::select! {
            cmd = rx.recv() => {
                let Some(cmd) = cmd else {
                    debug!("actor_loop: all handles dropped");
                    break;
                };
                if !handle_command(&mut controller, cmd, &mut pending_insight).await {
                    break;
                }
            }
            _ = ticker.tick(), if controller.is_running() => {
                controller.tick();
            }
            Some(ready) = inbox.content_rx.recv() => {
                controller.on_content_ready(ready);
            }
            Some(ready) = inbox.insight_rx.recv() => {
                if let Some(insight) = controller.on_insight_ready(ready)
                    && let Some(reply) = pending_insight.take()
                {
                    let _ = reply.send(Ok(insight));
                }
            }
        }
    }

    cancel_pending(&mut pending_insight);
    info!("Session actor stopped");
}

/// Apply one command; returns false when the actor should exit
async fn handle_command(
    controller: &mut SessionController,
    cmd: SessionCommand,
    pending_insight: &mut Option<InsightReply>,
) -> bool {
    match cmd {
        SessionCommand::Start { reply } => {
            debug!("actor_loop: Start command");
            let _ = reply.send(controller.start().await);
        }

        SessionCommand::Stop { reply } => {
            debug!("actor_loop: Stop command");
            cancel_pending(pending_insight);
            controller.stop();
            let _ = reply.send(Ok(()));
        }

        SessionCommand::Pause { reply } => {
            debug!("actor_loop: Pause command");
            controller.pause();
            let _ = reply.send(Ok(()));
        }

        SessionCommand::Resume { reply } => {
            debug!("actor_loop: Resume command");
            controller.resume();
            let _ = reply.send(Ok(()));
        }

        SessionCommand::Advance { reply } => {
            debug!("actor_loop: Advance command");
            controller.advance();
            let _ = reply.send(Ok(()));
        }

        SessionCommand::SkipTo { index, reply } => {
            debug!(index, "actor_loop: SkipTo command");
            controller.skip_to(index);
            let _ = reply.send(Ok(()));
        }

        SessionCommand::ToggleNarration { reply } => {
            debug!("actor_loop: ToggleNarration command");
            let _ = reply.send(Ok(controller.toggle_narration()));
        }

        SessionCommand::ToggleAmbient { reply } => {
            debug!("actor_loop: ToggleAmbient command");
            let _ = reply.send(Ok(controller.toggle_ambient()));
        }

        SessionCommand::SubmitReflection { text, reply } => {
            debug!(text_len = text.len(), "actor_loop: SubmitReflection command");
            match controller.submit_reflection(&text) {
                Ok(()) => *pending_insight = Some(reply),
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            }
        }

        SessionCommand::SkipReflection { reply } => {
            debug!("actor_loop: SkipReflection command");
            let result = controller.skip_reflection();
            if result.is_ok() {
                cancel_pending(pending_insight);
            }
            let _ = reply.send(result);
        }

        SessionCommand::Finish { reply } => {
            debug!("actor_loop: Finish command");
            let result = controller.finish();
            if result.is_ok() {
                cancel_pending(pending_insight);
            }
            let _ = reply.send(result);
        }

        SessionCommand::Snapshot { reply } => {
            let _ = reply.send(Ok(controller.snapshot()));
        }

        SessionCommand::Shutdown => {
            debug!("actor_loop: Shutdown command");
            info!("Session actor shutting down");
            return false;
        }
    }
    true
}

fn cancel_pending(pending_insight: &mut Option<InsightReply>) {
    if let Some(reply) = pending_insight.take() {
        debug!("cancel_pending: cancelling in-flight reflection submit");
        let _ = reply.send(Err(SessionError::Cancelled));
    }
}
