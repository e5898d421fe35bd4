//! The conversation driver: timers, completion calls and transcript writes
//! around a [`Session`].
//!
//! Every mutation goes through one `watch` channel, so the playback task,
//! in-flight exchanges and front-ends observing the session never race.
//! Shutting the driver down cancels a single token; anything that wakes up
//! afterwards (a timer, a late completion reply) finds it cancelled and
//! leaves the session alone.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::ai::CompletionClient;
use crate::playback::{self, Timings};
use crate::session::{Effect, Event, Session};
use crate::state::ScriptedCommand;
use crate::transcript;

#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub timings: Timings,
    pub transcript_dir: PathBuf,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            timings: Timings::default(),
            transcript_dir: transcript::default_dir(),
        }
    }
}

struct Inner {
    state: watch::Sender<Session>,
    script: Arc<[ScriptedCommand]>,
    client: Arc<dyn CompletionClient>,
    options: DriverOptions,
    cancel: CancellationToken,
}

/// Cheap to clone; all clones drive the same session.
#[derive(Clone)]
pub struct Driver {
    inner: Arc<Inner>,
}

impl Driver {
    pub fn new(
        script: Vec<ScriptedCommand>,
        client: Arc<dyn CompletionClient>,
        options: DriverOptions,
    ) -> Self {
        let (state, _) = watch::channel(Session::new(script.clone()));
        Self {
            inner: Arc::new(Inner {
                state,
                script: script.into(),
                client,
                options,
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Spawn the scripted playback. Call once.
    pub fn start(&self) -> JoinHandle<()> {
        tokio::spawn(playback::play(self.clone()))
    }

    /// Receive a notification after every state change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Tear down: pending timers stop and late results are dropped.
    pub fn shutdown(&self) {
        debug!("conversation driver shutting down");
        self.inner.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.cancel.is_cancelled()
    }

    /// Run one chat exchange to completion.
    ///
    /// Blank input, input before the chat has started and input while an
    /// exchange is pending are ignored.
    pub async fn submit(&self, input: impl Into<String>) {
        let event = Event::Submitted {
            input: input.into(),
            timestamp: self.timestamp(),
        };

        match self.apply(event) {
            Some(Effect::Request(request)) => {
                let mut pending = Pending::new(self);
                let event = match self.inner.client.complete(request).await {
                    Ok(response) => Event::Completed {
                        response: response.response,
                        context: response.conversation_history,
                        timestamp: self.timestamp(),
                    },
                    Err(e) => {
                        warn!(error = %e, "completion request failed");
                        Event::CompletionFailed {
                            timestamp: self.timestamp(),
                        }
                    }
                };
                pending.settle(event);
            }
            Some(Effect::SaveTranscript(text)) => {
                let mut pending = Pending::new(self);
                let dir = self.inner.options.transcript_dir.clone();
                let date = Local::now().date_naive();
                let written = tokio::task::spawn_blocking(move || transcript::write(&dir, date, &text))
                    .await
                    .map_err(anyhow::Error::from)
                    .and_then(|result| result);
                let lines = match written {
                    Ok(path) => {
                        info!(path = %path.display(), "conversation saved");
                        vec![
                            format!("Conversation saved to {}", path.display()),
                            "Thanks for chatting!".to_string(),
                        ]
                    }
                    Err(e) => {
                        warn!(error = %e, "failed to save conversation");
                        vec!["Sorry, I couldn't save the conversation:".to_string(), e.to_string()]
                    }
                };
                pending.settle(Event::Replied {
                    lines,
                    timestamp: self.timestamp(),
                });
            }
            Some(Effect::None) | Some(Effect::Ignored) | None => {}
        }
    }

    /// Apply `event` unless shut down. Returns `None` after shutdown.
    fn apply(&self, event: Event) -> Option<Effect> {
        if self.is_shut_down() {
            debug!(?event, "dropping event after shutdown");
            return None;
        }

        let mut effect = Effect::Ignored;
        self.inner.state.send_if_modified(|session| {
            effect = session.apply(event);
            effect != Effect::Ignored
        });
        Some(effect)
    }

    /// Apply a playback event; `false` means stop.
    pub(crate) fn step(&self, event: Event) -> bool {
        self.apply(event).is_some()
    }

    /// Sleep for `duration`; `false` if shut down meanwhile.
    pub(crate) async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            _ = self.inner.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => !self.is_shut_down(),
        }
    }

    pub(crate) fn timings(&self) -> Timings {
        self.inner.options.timings
    }

    pub(crate) fn script(&self) -> Arc<[ScriptedCommand]> {
        Arc::clone(&self.inner.script)
    }

    pub(crate) fn timestamp(&self) -> String {
        Local::now().format("%-I:%M:%S %p").to_string()
    }
}

/// Guarantees that a pending exchange ends, even if the task running it is
/// aborted: dropping an unsettled guard applies `CompletionFailed`.
struct Pending<'a> {
    driver: &'a Driver,
    settled: bool,
}

impl<'a> Pending<'a> {
    fn new(driver: &'a Driver) -> Self {
        Self {
            driver,
            settled: false,
        }
    }

    fn settle(&mut self, event: Event) {
        self.settled = true;
        self.driver.apply(event);
    }
}

impl Drop for Pending<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.driver.apply(Event::CompletionFailed {
                timestamp: self.driver.timestamp(),
            });
        }
    }
}
