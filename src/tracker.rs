//! Real cursor tracker — throttled outbound samples and the remote cursor table.
//!
//! DESIGN
//! ======
//! The tracker is a plain state machine with no I/O. Outbound methods return
//! the payload to publish (or `None` when throttled or gated) and inbound
//! methods apply keyed upserts, so replaying a message is harmless. Every
//! time-dependent method has an `_at` variant taking `now` in epoch
//! milliseconds; the plain variants read the wall clock.
//!
//! LIVENESS
//! ========
//! Peers that crash or close a tab never send `cursor:leave`. The periodic
//! sweep marks them inactive after `timeout_ms` of silence and drops them
//! after twice that, which bounds the table without any explicit signal.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::CursorConfig;
use crate::frame::{self, CursorLeave, CursorPosition, Frame};
use crate::identity;

// =============================================================================
// TYPES
// =============================================================================

/// Local view of one peer's cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteCursor {
    pub user_id: String,
    pub x: f64,
    pub y: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub color: String,
    pub pathname: String,
    pub last_seen: i64,
    pub is_active: bool,
}

impl RemoteCursor {
    fn from_position(position: CursorPosition, now: i64) -> Self {
        Self {
            user_id: position.user_id,
            x: position.x,
            y: position.y,
            scroll_x: position.scroll_x,
            scroll_y: position.scroll_y,
            color: position.color,
            pathname: position.pathname,
            last_seen: now,
            is_active: true,
        }
    }
}

/// One local pointer observation in viewport coordinates plus page scroll.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerSample {
    pub x: f64,
    pub y: f64,
    pub scroll_x: f64,
    pub scroll_y: f64,
}

// =============================================================================
// TRACKER
// =============================================================================

pub struct CursorTracker {
    config: CursorConfig,
    user_id: String,
    color: String,
    pathname: String,
    is_touch: bool,
    last_broadcast: Option<i64>,
    remote: HashMap<String, RemoteCursor>,
}

impl CursorTracker {
    pub fn new(config: CursorConfig, user_id: impl Into<String>, pathname: impl Into<String>, is_touch: bool) -> Self {
        let user_id = user_id.into();
        let color = identity::color_for(&user_id).to_owned();
        Self {
            config,
            user_id,
            color,
            pathname: pathname.into(),
            is_touch,
            last_broadcast: None,
            remote: HashMap::new(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    #[must_use]
    pub fn color(&self) -> &str {
        &self.color
    }

    #[must_use]
    pub fn pathname(&self) -> &str {
        &self.pathname
    }

    #[must_use]
    pub fn is_touch(&self) -> bool {
        self.is_touch
    }

    /// Switch device mode. Entering touch mode discards every remote cursor.
    pub fn set_touch(&mut self, is_touch: bool) {
        self.is_touch = is_touch;
        if is_touch {
            self.remote.clear();
        }
    }

    /// Change the local route. Hidden cursors stay in the table.
    pub fn navigate(&mut self, pathname: impl Into<String>) {
        self.pathname = pathname.into();
    }

    // -------------------------------------------------------------------------
    // OUTBOUND
    // -------------------------------------------------------------------------

    /// Build the broadcast for a pointer sample, or `None` if throttled.
    pub fn on_pointer_move(&mut self, sample: PointerSample) -> Option<CursorPosition> {
        self.on_pointer_move_at(sample, frame::now_ms())
    }

    fn on_pointer_move_at(&mut self, sample: PointerSample, now: i64) -> Option<CursorPosition> {
        if self.is_touch {
            return None;
        }
        if let Some(last) = self.last_broadcast
            && now - last < self.config.throttle_ms
        {
            return None;
        }
        self.last_broadcast = Some(now);

        Some(CursorPosition {
            x: sample.x,
            y: sample.y,
            scroll_x: sample.scroll_x,
            scroll_y: sample.scroll_y,
            user_id: self.user_id.clone(),
            color: self.color.clone(),
            pathname: self.pathname.clone(),
            timestamp: now,
        })
    }

    /// Pointer left the document: tell peers to hide this cursor now.
    #[must_use]
    pub fn on_pointer_leave(&self) -> Option<CursorLeave> {
        if self.is_touch {
            return None;
        }
        Some(CursorLeave { user_id: self.user_id.clone() })
    }

    /// Final leave notice on session end. Same gating as a pointer leave.
    #[must_use]
    pub fn teardown(&self) -> Option<CursorLeave> {
        self.on_pointer_leave()
    }

    // -------------------------------------------------------------------------
    // INBOUND
    // -------------------------------------------------------------------------

    /// Apply an inbound cursor frame. Returns true when the table changed.
    ///
    /// Malformed payloads and unrelated syscalls are ignored.
    pub fn apply_frame(&mut self, frame: &Frame) -> bool {
        self.apply_frame_at(frame, frame::now_ms())
    }

    pub(crate) fn apply_frame_at(&mut self, frame: &Frame, now: i64) -> bool {
        match frame.syscall.as_str() {
            frame::CURSOR_MOVE => match frame.cursor_position() {
                Ok(position) => self.apply_position_at(position, now),
                Err(e) => {
                    debug!(error = %e, "tracker: ignoring malformed cursor move");
                    false
                }
            },
            frame::CURSOR_LEAVE => match frame.cursor_leave_payload() {
                Ok(leave) => self.remove(&leave.user_id),
                Err(e) => {
                    debug!(error = %e, "tracker: ignoring malformed cursor leave");
                    false
                }
            },
            _ => false,
        }
    }

    /// Upsert a peer position. Own id and touch mode are ignored.
    fn apply_position_at(&mut self, position: CursorPosition, now: i64) -> bool {
        if self.is_touch || position.user_id == self.user_id {
            return false;
        }
        match self.remote.get_mut(&position.user_id) {
            Some(existing) => {
                let last_seen = existing.last_seen.max(now);
                *existing = RemoteCursor::from_position(position, last_seen);
            }
            None => {
                self.remote
                    .insert(position.user_id.clone(), RemoteCursor::from_position(position, now));
            }
        }
        true
    }

    /// Drop a peer immediately. Returns true if it was present.
    pub fn remove(&mut self, user_id: &str) -> bool {
        self.remote.remove(user_id).is_some()
    }

    // -------------------------------------------------------------------------
    // LIVENESS
    // -------------------------------------------------------------------------

    /// Recompute activity and purge long-silent peers.
    pub fn sweep(&mut self) {
        self.sweep_at(frame::now_ms());
    }

    pub(crate) fn sweep_at(&mut self, now: i64) {
        let timeout = self.config.timeout_ms;
        let purge = self.config.purge_ms();
        self.remote.retain(|_, cursor| now - cursor.last_seen < purge);
        for cursor in self.remote.values_mut() {
            cursor.is_active = now - cursor.last_seen < timeout;
        }
    }

    // -------------------------------------------------------------------------
    // VIEW
    // -------------------------------------------------------------------------

    /// Cursors on the current route, ordered by user id.
    #[must_use]
    pub fn visible(&self) -> Vec<RemoteCursor> {
        if self.is_touch {
            return Vec::new();
        }
        let mut cursors: Vec<RemoteCursor> = self
            .remote
            .values()
            .filter(|c| c.pathname == self.pathname)
            .cloned()
            .collect();
        cursors.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        cursors
    }

    #[must_use]
    pub fn get(&self, user_id: &str) -> Option<&RemoteCursor> {
        self.remote.get(user_id)
    }

    /// Number of tracked peers on any route.
    #[must_use]
    pub fn len(&self) -> usize {
        self.remote.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.remote.is_empty()
    }
}

#[cfg(test)]
#[path = "tracker_test.rs"]
mod tests;
