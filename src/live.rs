//! Live cursor session — one task that owns all cursor state.
//!
//! ARCHITECTURE
//! ============
//! `LiveCursors::spawn` starts a task owning the tracker, the fabricated
//! simulator, the presence aggregator, and (optionally) a transport
//! subscription. The task multiplexes with `select!`:
//! - sweep tick: liveness sweep + fabricated population control
//! - motion tick: fabricated visitor movement
//! - inbound frames from the channel
//! - commands from the handle (pointer, route, viewport, touch, shutdown)
//!
//! After every change the merged `CursorView` is published on a `watch`
//! channel. Renderers hold a receiver; nothing else can mutate the state.
//!
//! DESIGN
//! ======
//! Without a subscription (or after it closes) the session runs standalone:
//! no remote cursors, `is_connected` false, fabricated visitors still shown.
//! Outbound frames are fire-and-forget; a full queue drops the frame.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::{CursorConfig, FabricatedConfig};
use crate::frame::{self, Frame, PresenceMeta};
use crate::presence::{PresenceAggregator, PresenceSummary};
use crate::simulator::{FabricatedSimulator, Viewport};
use crate::tracker::{CursorTracker, PointerSample, RemoteCursor};
use crate::transport::{ChannelSender, Subscription, TransportError};

const COMMAND_BUFFER: usize = 64;

// =============================================================================
// TYPES
// =============================================================================

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorView {
    /// Route-filtered real cursors followed by fabricated ones.
    pub cursors: Vec<RemoteCursor>,
    pub presence: PresenceSummary,
}

#[derive(Debug, Clone)]
pub struct LiveOptions {
    pub user_id: String,
    pub pathname: String,
    pub is_touch: bool,
    pub cursor: CursorConfig,
    pub fabricated: FabricatedConfig,
    pub viewport: Viewport,
    /// Fixed RNG seed for the simulator. Random when `None`.
    pub seed: Option<u64>,
}

impl LiveOptions {
    /// Options with configuration read from the environment.
    pub fn new(user_id: impl Into<String>, pathname: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            pathname: pathname.into(),
            is_touch: false,
            cursor: CursorConfig::from_env(),
            fabricated: FabricatedConfig::from_env(),
            viewport: Viewport::default(),
            seed: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LiveError {
    #[error("live cursor session has stopped")]
    Closed,
    #[error("live cursor command queue full")]
    Full,
}

impl From<mpsc::error::TrySendError<Command>> for LiveError {
    fn from(err: mpsc::error::TrySendError<Command>) -> Self {
        match err {
            mpsc::error::TrySendError::Full(_) => Self::Full,
            mpsc::error::TrySendError::Closed(_) => Self::Closed,
        }
    }
}

#[derive(Debug)]
pub enum Command {
    PointerMove(PointerSample),
    PointerLeave,
    Navigate(String),
    Viewport(Viewport),
    TouchStart,
    Shutdown(oneshot::Sender<()>),
}

// =============================================================================
// HANDLE
// =============================================================================

/// Handle to a running session. Dropping it also ends the session, but
/// without waiting for the farewell frames to be queued.
pub struct LiveCursors {
    commands: mpsc::Sender<Command>,
    view: watch::Receiver<CursorView>,
    task: JoinHandle<()>,
}

impl LiveCursors {
    /// Start a session. Must be called inside a tokio runtime.
    pub fn spawn(options: LiveOptions, subscription: Option<Subscription>) -> Self {
        let (commands, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (view_tx, view) = watch::channel(CursorView::default());
        let session = Session::new(options, subscription, view_tx);
        let task = tokio::spawn(session.run(command_rx));
        Self { commands, view, task }
    }

    /// Receiver for the merged view. Each call returns an independent clone.
    #[must_use]
    pub fn view(&self) -> watch::Receiver<CursorView> {
        self.view.clone()
    }

    /// # Errors
    ///
    /// Returns `LiveError` when the session is gone or its queue is full.
    pub fn pointer_move(&self, sample: PointerSample) -> Result<(), LiveError> {
        Ok(self.commands.try_send(Command::PointerMove(sample))?)
    }

    /// # Errors
    ///
    /// Returns `LiveError` when the session is gone or its queue is full.
    pub fn pointer_leave(&self) -> Result<(), LiveError> {
        Ok(self.commands.try_send(Command::PointerLeave)?)
    }

    /// # Errors
    ///
    /// Returns `LiveError` when the session is gone or its queue is full.
    pub fn navigate(&self, pathname: impl Into<String>) -> Result<(), LiveError> {
        Ok(self.commands.try_send(Command::Navigate(pathname.into()))?)
    }

    /// # Errors
    ///
    /// Returns `LiveError` when the session is gone or its queue is full.
    pub fn set_viewport(&self, viewport: Viewport) -> Result<(), LiveError> {
        Ok(self.commands.try_send(Command::Viewport(viewport))?)
    }

    /// # Errors
    ///
    /// Returns `LiveError` when the session is gone or its queue is full.
    pub fn touch_start(&self) -> Result<(), LiveError> {
        Ok(self.commands.try_send(Command::TouchStart)?)
    }

    /// Send the leave notice, untrack presence, and stop the task.
    pub async fn shutdown(self) {
        let (done_tx, done_rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown(done_tx)).await.is_ok() {
            let _ = done_rx.await;
        }
        let _ = self.task.await;
    }
}

// =============================================================================
// SESSION TASK
// =============================================================================

struct Session {
    tracker: CursorTracker,
    simulator: FabricatedSimulator,
    presence: PresenceAggregator,
    sender: Option<ChannelSender>,
    inbound: Option<mpsc::Receiver<Frame>>,
    view_tx: watch::Sender<CursorView>,
    sweep_every: Duration,
    motion_every: Duration,
}

impl Session {
    fn new(options: LiveOptions, subscription: Option<Subscription>, view_tx: watch::Sender<CursorView>) -> Self {
        let tracker = CursorTracker::new(options.cursor, options.user_id, options.pathname.clone(), options.is_touch);
        let mut simulator = match options.seed {
            Some(seed) => FabricatedSimulator::with_seed(options.fabricated, options.pathname, seed),
            None => FabricatedSimulator::new(options.fabricated, options.pathname),
        };
        simulator.set_viewport(options.viewport);

        let (sender, inbound) = match subscription {
            Some(sub) => {
                let (sender, inbound) = sub.split();
                (Some(sender), Some(inbound))
            }
            None => (None, None),
        };

        Self {
            tracker,
            simulator,
            presence: PresenceAggregator::new(),
            sender,
            inbound,
            view_tx,
            sweep_every: Duration::from_millis(options.cursor.sweep_interval_ms.max(1)),
            motion_every: Duration::from_millis(options.fabricated.movement_interval_ms.max(1)),
        }
    }

    async fn run(mut self, mut commands: mpsc::Receiver<Command>) {
        let mut sweep = tokio::time::interval(self.sweep_every);
        sweep.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut motion = tokio::time::interval(self.motion_every);
        motion.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(user_id = %self.tracker.user_id(), connected = self.sender.is_some(), "live: session started");

        let done = loop {
            tokio::select! {
                _ = sweep.tick() => {
                    self.tracker.sweep();
                    let report = self.simulator.tick_population(frame::now_ms(), self.presence.real_count());
                    if report.changed() {
                        debug!(wanted = report.target, spawned = ?report.spawned, removed = report.removed.len(), "live: population changed");
                    }
                    self.publish();
                }
                _ = motion.tick() => {
                    if !self.simulator.users().is_empty() {
                        self.simulator.tick_motion(frame::now_ms());
                        self.publish();
                    }
                }
                frame = next_frame(&mut self.inbound) => {
                    match frame {
                        Some(frame) => self.handle_frame(&frame),
                        None => self.disconnect(),
                    }
                    self.publish();
                }
                command = commands.recv() => {
                    match command {
                        Some(Command::Shutdown(done)) => break Some(done),
                        Some(command) => self.handle_command(command),
                        None => break None,
                    }
                    self.publish();
                }
            }
        };

        self.teardown();
        if let Some(done) = done {
            let _ = done.send(());
        }
        info!(user_id = %self.tracker.user_id(), "live: session stopped");
    }

    fn handle_frame(&mut self, frame: &Frame) {
        match frame.syscall.as_str() {
            frame::CHANNEL_SUBSCRIBED => {
                self.presence.set_connected(true);
                let meta = PresenceMeta { id: self.tracker.user_id().to_owned(), is_mobile: self.tracker.is_touch() };
                self.send(|sender| sender.track(self.tracker.user_id(), &meta));
            }
            frame::PRESENCE_SYNC => match frame.presence_keys() {
                Ok(keys) => self.presence.apply_sync(&keys),
                Err(e) => debug!(error = %e, "live: ignoring malformed presence sync"),
            },
            frame::CURSOR_MOVE | frame::CURSOR_LEAVE => {
                self.tracker.apply_frame(frame);
            }
            frame::GATEWAY_ERROR => {
                debug!(code = ?frame.data.get(frame::FRAME_CODE), "live: channel reported error");
            }
            _ => {}
        }
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::PointerMove(sample) => {
                if let Some(position) = self.tracker.on_pointer_move(sample) {
                    self.send(|sender| sender.cursor_move(&position));
                }
            }
            Command::PointerLeave => {
                if let Some(leave) = self.tracker.on_pointer_leave() {
                    self.send(|sender| sender.cursor_leave(&leave.user_id));
                }
            }
            Command::Navigate(pathname) => {
                self.tracker.navigate(pathname.clone());
                self.simulator.navigate(pathname);
            }
            Command::Viewport(viewport) => self.simulator.set_viewport(viewport),
            Command::TouchStart => self.tracker.set_touch(true),
            Command::Shutdown(_) => {}
        }
    }

    /// Run one outbound operation if connected. Failures only get logged.
    fn send(&self, op: impl FnOnce(&ChannelSender) -> Result<(), TransportError>) {
        let Some(sender) = &self.sender else {
            return;
        };
        if let Err(e) = op(sender) {
            debug!(error = %e, "live: outbound frame dropped");
        }
    }

    fn disconnect(&mut self) {
        info!(user_id = %self.tracker.user_id(), "live: channel closed");
        self.inbound = None;
        self.sender = None;
        self.presence.set_connected(false);
    }

    fn teardown(&mut self) {
        if let Some(leave) = self.tracker.teardown() {
            self.send(|sender| sender.cursor_leave(&leave.user_id));
        }
        self.send(ChannelSender::untrack);
        self.sender = None;
        self.inbound = None;
    }

    fn publish(&self) {
        let now = frame::now_ms();
        let mut cursors = self.tracker.visible();
        if !self.tracker.is_touch() {
            cursors.extend(self.simulator.cursors(now));
        }
        let presence = self.presence.summary(self.simulator.active_count());
        self.view_tx.send_replace(CursorView { cursors, presence });
    }
}

/// Next inbound frame, or never when there is no subscription.
async fn next_frame(inbound: &mut Option<mpsc::Receiver<Frame>>) -> Option<Frame> {
    match inbound {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
#[path = "live_test.rs"]
mod tests;
