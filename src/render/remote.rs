//! Remote cursor markers — spring-smoothed arrows for other visitors.
//!
//! Each marker lives at the cursor's page coordinate (viewport position plus
//! the sender's scroll) and is drawn shifted by the local scroll, so it
//! stays attached to the content it was pointing at. Markers fade in from
//! half scale, fade out when the cursor goes inactive, and play the same
//! exit before being dropped once the cursor is no longer in the view.

use std::collections::HashMap;

use super::spring::{Fade, Spring};
use crate::config::SpringConfig;
use crate::identity;
use crate::tracker::RemoteCursor;

/// Seconds for the opacity fade.
const OPACITY_SECONDS: f64 = 0.3;
const HIDDEN_SCALE: f64 = 0.5;

#[derive(Debug, Clone)]
struct Marker {
    color: String,
    label: String,
    x: Spring,
    y: Spring,
    opacity: Fade,
    scale: Spring,
    active: bool,
    exiting: bool,
}

impl Marker {
    fn new(cursor: &RemoteCursor) -> Self {
        let (page_x, page_y) = page_position(cursor);
        Self {
            color: cursor.color.clone(),
            label: identity::label_for(&cursor.user_id),
            x: Spring::new(SpringConfig::REMOTE, page_x),
            y: Spring::new(SpringConfig::REMOTE, page_y),
            opacity: Fade::new(0.0, OPACITY_SECONDS),
            scale: Spring::new(SpringConfig::SCALE, HIDDEN_SCALE),
            active: cursor.is_active,
            exiting: false,
        }
    }

    fn update(&mut self, cursor: &RemoteCursor) {
        let (page_x, page_y) = page_position(cursor);
        self.x.set_target(page_x);
        self.y.set_target(page_y);
        self.color.clone_from(&cursor.color);
        self.active = cursor.is_active;
        self.exiting = false;
    }

    fn shown(&self) -> bool {
        self.active && !self.exiting
    }

    fn step(&mut self, dt: f64) {
        let shown = self.shown();
        self.opacity.set_target(if shown { 1.0 } else { 0.0 });
        self.scale.set_target(if shown { 1.0 } else { HIDDEN_SCALE });
        self.x.step(dt);
        self.y.step(dt);
        self.opacity.step(dt);
        self.scale.step(dt);
    }

    fn finished_exit(&self) -> bool {
        self.exiting && self.opacity.value() <= 0.0
    }
}

fn page_position(cursor: &RemoteCursor) -> (f64, f64) {
    (cursor.x + cursor.scroll_x, cursor.y + cursor.scroll_y)
}

/// Drawing state for one marker in viewport coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteMarkerModel {
    pub user_id: String,
    pub x: f64,
    pub y: f64,
    pub color: String,
    pub opacity: f64,
    pub scale: f64,
    pub label: String,
    pub label_visible: bool,
}

/// All remote markers for one page.
#[derive(Debug, Clone, Default)]
pub struct RemoteCursorLayer {
    markers: HashMap<String, Marker>,
    scroll: (f64, f64),
    hovered: Option<String>,
}

impl RemoteCursorLayer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile markers with the latest merged cursor list.
    pub fn sync(&mut self, cursors: &[RemoteCursor]) {
        for marker in self.markers.values_mut() {
            marker.exiting = true;
        }
        for cursor in cursors {
            match self.markers.get_mut(&cursor.user_id) {
                Some(marker) => marker.update(cursor),
                None => {
                    self.markers.insert(cursor.user_id.clone(), Marker::new(cursor));
                }
            }
        }
    }

    /// Local page scroll, subtracted from every marker.
    pub fn set_scroll(&mut self, x: f64, y: f64) {
        self.scroll = (x, y);
    }

    /// Hover target for the visitor label. `None` clears it.
    pub fn set_hovered(&mut self, user_id: Option<&str>) {
        self.hovered = user_id.map(str::to_owned);
    }

    pub fn step(&mut self, dt: f64) {
        for marker in self.markers.values_mut() {
            marker.step(dt);
        }
        self.markers.retain(|_, marker| !marker.finished_exit());
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    /// Markers sorted by user id.
    #[must_use]
    pub fn models(&self) -> Vec<RemoteMarkerModel> {
        let mut out: Vec<RemoteMarkerModel> = self
            .markers
            .iter()
            .map(|(user_id, marker)| RemoteMarkerModel {
                user_id: user_id.clone(),
                x: marker.x.value() - self.scroll.0,
                y: marker.y.value() - self.scroll.1,
                color: marker.color.clone(),
                opacity: marker.opacity.value(),
                scale: marker.scale.value(),
                label: marker.label.clone(),
                label_visible: self.hovered.as_deref() == Some(user_id.as_str()),
            })
            .collect();
        out.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        out
    }
}

#[cfg(test)]
#[path = "remote_test.rs"]
mod tests;
