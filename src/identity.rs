//! Visitor identity — session ids, display colors, and labels.
//!
//! DESIGN
//! ======
//! A visitor is identified by an opaque per-session string. Color and label
//! are pure functions of that string so every peer derives the same values
//! without exchanging them. The hash reproduces the browser's 32-bit
//! `h = c + ((h << 5) - h)` over UTF-16 code units, which keeps colors stable
//! across mixed Rust and browser peers.

use std::collections::HashMap;

use rand::Rng;
use uuid::Uuid;

/// Session-store key under which the visitor id is cached.
pub const SESSION_KEY: &str = "cursor-user-id";

/// Display palette. Index is `|hash| % 8`.
pub const CURSOR_COLORS: [&str; 8] = [
    "#EF4444", "#F59E0B", "#10B981", "#3B82F6", "#8B5CF6", "#EC4899", "#06B6D4", "#F97316",
];

// =============================================================================
// SESSION STORE
// =============================================================================

/// Key-value storage scoped to one browsing session.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

/// Process-local store. Lives exactly as long as the owning session.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.values.insert(key.to_owned(), value);
    }
}

/// Return the cached visitor id, creating and caching a fresh UUID if absent.
pub fn get_or_create_session_id(store: &mut impl SessionStore) -> String {
    if let Some(existing) = store.get(SESSION_KEY).filter(|id| !id.is_empty()) {
        return existing;
    }
    let id = Uuid::new_v4().to_string();
    store.set(SESSION_KEY, id.clone());
    id
}

// =============================================================================
// COLOR + LABEL
// =============================================================================

/// Rolling hash of `id`. Shift is 32-bit, accumulation is not.
fn hash_id(id: &str) -> i64 {
    id.encode_utf16().fold(0_i64, |acc, unit| {
        #[allow(clippy::cast_possible_truncation)]
        let shifted = (acc as i32).wrapping_shl(5);
        i64::from(unit) + (i64::from(shifted) - acc)
    })
}

/// Deterministic palette color for a visitor id.
#[must_use]
pub fn color_for(id: &str) -> &'static str {
    #[allow(clippy::cast_possible_truncation)]
    let index = (hash_id(id).unsigned_abs() % CURSOR_COLORS.len() as u64) as usize;
    CURSOR_COLORS[index]
}

/// Human label such as `Visitor 417`. Collisions are cosmetic.
#[must_use]
pub fn label_for(id: &str) -> String {
    format!("Visitor {}", hash_id(id).unsigned_abs() % 1000)
}

/// Random lowercase-hex id in UUID layout, for synthetic visitors.
pub fn generate_fabricated_user_id(rng: &mut impl Rng) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(36);
    for (i, len) in [8, 4, 4, 4, 12].into_iter().enumerate() {
        if i > 0 {
            out.push('-');
        }
        for _ in 0..len {
            out.push(char::from(HEX[rng.random_range(0..HEX.len())]));
        }
    }
    out
}

#[cfg(test)]
#[path = "identity_test.rs"]
mod tests;
