//! Presence aggregation — the "N visitors online" figure.
//!
//! Real visitors come from the channel's presence snapshots; active synthetic
//! visitors are added on top so the count agrees with the cursors on screen.

use serde::{Deserialize, Serialize};

/// Real presence as last reported by the channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceAggregator {
    real_count: usize,
    connected: bool,
}

/// Aggregated figures handed to renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresenceSummary {
    pub online_count: usize,
    pub is_connected: bool,
}

impl PresenceAggregator {
    /// Starts counting only the local visitor, disconnected.
    #[must_use]
    pub fn new() -> Self {
        Self { real_count: 1, connected: false }
    }

    /// Replace the real count with the size of a presence snapshot.
    ///
    /// Never drops below one: the local visitor is present even before its
    /// own key shows up in a snapshot.
    pub fn apply_sync(&mut self, keys: &[String]) {
        self.real_count = keys.len().max(1);
    }

    pub fn set_connected(&mut self, connected: bool) {
        self.connected = connected;
    }

    #[must_use]
    pub fn real_count(&self) -> usize {
        self.real_count
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Real visitors plus synthetic visitors that have not started leaving.
    #[must_use]
    pub fn online_count(&self, fabricated_active: usize) -> usize {
        self.real_count + fabricated_active
    }

    #[must_use]
    pub fn summary(&self, fabricated_active: usize) -> PresenceSummary {
        PresenceSummary { online_count: self.online_count(fabricated_active), is_connected: self.connected }
    }
}

impl Default for PresenceAggregator {
    fn default() -> Self {
        Self::new()
    }
}

/// Display text such as `3 visitors online`. Hidden while disconnected.
#[must_use]
pub fn online_label(summary: &PresenceSummary) -> Option<String> {
    if !summary.is_connected {
        return None;
    }
    let noun = if summary.online_count == 1 { "visitor" } else { "visitors" };
    Some(format!("{} {noun} online", summary.online_count))
}

#[cfg(test)]
#[path = "presence_test.rs"]
mod tests;
