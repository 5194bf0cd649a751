//! Tunables for cursor tracking, synthetic visitors, smoothing, and the relay.
//!
//! DESIGN
//! ======
//! Every value has a compiled-in default. A
//! subset can be overridden through environment variables so the relay and
//! demo sessions can be tuned without a rebuild. Unparseable values fall back
//! to the default instead of failing start-up.

use rand::Rng;

pub const DEFAULT_THROTTLE_MS: i64 = 50;
pub const DEFAULT_CURSOR_TIMEOUT_MS: i64 = 5000;
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1000;

pub const DEFAULT_MIN_TTL_MS: i64 = 20_000;
pub const DEFAULT_MAX_TTL_MS: i64 = 90_000;
pub const DEFAULT_MAX_FABRICATED_USERS: usize = 3;
pub const DEFAULT_RESPAWN_MIN_MS: i64 = 3000;
pub const DEFAULT_RESPAWN_MAX_MS: i64 = 15_000;
pub const DEFAULT_MOVEMENT_INTERVAL_MS: u64 = 50;
pub const DEFAULT_LEAVE_GRACE_MS: i64 = 2000;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_CLIENT_BUFFER: usize = 256;

// =============================================================================
// RANGES
// =============================================================================

/// Inclusive integer range used for randomized durations and distances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntRange {
    pub min: i64,
    pub max: i64,
}

impl IntRange {
    #[must_use]
    pub const fn new(min: i64, max: i64) -> Self {
        Self { min, max }
    }

    /// Uniform integer in `[min, max]`. A reversed range collapses to `min`.
    pub fn sample(self, rng: &mut impl Rng) -> i64 {
        if self.max <= self.min {
            return self.min;
        }
        rng.random_range(self.min..=self.max)
    }

    /// Uniform real in `[min, max)`.
    #[allow(clippy::cast_precision_loss)]
    pub fn sample_f64(self, rng: &mut impl Rng) -> f64 {
        let span = (self.max - self.min).max(0) as f64;
        rng.random::<f64>() * span + self.min as f64
    }
}

// =============================================================================
// CURSOR TRACKING
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorConfig {
    /// Minimum spacing between outbound broadcasts.
    pub throttle_ms: i64,
    /// Silence after which a remote cursor is shown as inactive.
    pub timeout_ms: i64,
    /// Period of the liveness sweep and population-control tick.
    pub sweep_interval_ms: u64,
}

impl CursorConfig {
    /// Silence after which a remote cursor is dropped entirely.
    #[must_use]
    pub fn purge_ms(&self) -> i64 {
        self.timeout_ms.saturating_mul(2)
    }

    /// Read overrides from `CURSOR_THROTTLE_MS`, `CURSOR_TIMEOUT_MS` and
    /// `CURSOR_SWEEP_INTERVAL_MS`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            throttle_ms: env_parse("CURSOR_THROTTLE_MS", DEFAULT_THROTTLE_MS),
            timeout_ms: env_parse("CURSOR_TIMEOUT_MS", DEFAULT_CURSOR_TIMEOUT_MS),
            sweep_interval_ms: env_parse("CURSOR_SWEEP_INTERVAL_MS", DEFAULT_SWEEP_INTERVAL_MS).max(1),
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            throttle_ms: DEFAULT_THROTTLE_MS,
            timeout_ms: DEFAULT_CURSOR_TIMEOUT_MS,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
        }
    }
}

// =============================================================================
// FABRICATED VISITORS
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FabricatedConfig {
    /// Floor on the drawn target count.
    pub min_users: usize,
    /// Ceiling on concurrently active synthetic visitors.
    pub max_users: usize,
    /// Count drawn most of the time while real traffic is low.
    pub target_users: usize,
    pub ttl: IntRange,
    pub respawn_delay: IntRange,
    /// Scaled by 0.01 and checked once per population tick.
    pub empty_period_probability: f64,
    pub empty_period_duration: IntRange,
    pub movement_interval_ms: u64,
    pub pause_probability: f64,
    pub pause_duration: IntRange,
    pub scroll_probability: f64,
    pub scroll_amount: IntRange,
    /// Extra lifetime after expiry so the exit animation can play.
    pub leave_grace_ms: i64,
}

impl FabricatedConfig {
    /// Read overrides from the `FABRICATED_*` environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_users: env_parse("FABRICATED_MAX_USERS", defaults.max_users),
            ttl: IntRange::new(
                env_parse("FABRICATED_MIN_TTL_MS", defaults.ttl.min),
                env_parse("FABRICATED_MAX_TTL_MS", defaults.ttl.max),
            ),
            respawn_delay: IntRange::new(
                env_parse("FABRICATED_RESPAWN_MIN_MS", defaults.respawn_delay.min),
                env_parse("FABRICATED_RESPAWN_MAX_MS", defaults.respawn_delay.max),
            ),
            movement_interval_ms: env_parse("FABRICATED_MOVEMENT_INTERVAL_MS", defaults.movement_interval_ms).max(1),
            ..defaults
        }
    }
}

impl Default for FabricatedConfig {
    fn default() -> Self {
        Self {
            min_users: 0,
            max_users: DEFAULT_MAX_FABRICATED_USERS,
            target_users: 1,
            ttl: IntRange::new(DEFAULT_MIN_TTL_MS, DEFAULT_MAX_TTL_MS),
            respawn_delay: IntRange::new(DEFAULT_RESPAWN_MIN_MS, DEFAULT_RESPAWN_MAX_MS),
            empty_period_probability: 0.2,
            empty_period_duration: IntRange::new(5000, 20_000),
            movement_interval_ms: DEFAULT_MOVEMENT_INTERVAL_MS,
            pause_probability: 0.15,
            pause_duration: IntRange::new(500, 3000),
            scroll_probability: 0.05,
            scroll_amount: IntRange::new(50, 300),
            leave_grace_ms: DEFAULT_LEAVE_GRACE_MS,
        }
    }
}

// =============================================================================
// SMOOTHING
// =============================================================================

/// Damped spring parameters for position smoothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpringConfig {
    pub stiffness: f64,
    pub damping: f64,
    pub mass: f64,
}

impl SpringConfig {
    /// Remote cursor markers.
    pub const REMOTE: Self = Self { stiffness: 400.0, damping: 28.0, mass: 0.5 };
    /// Local cursor position.
    pub const LOCAL: Self = Self { stiffness: 400.0, damping: 25.0, mass: 0.5 };
    /// Local cursor width/height when morphing.
    pub const SIZE: Self = Self { stiffness: 400.0, damping: 30.0, mass: 1.0 };
    /// Press and fade-out scale.
    pub const SCALE: Self = Self { stiffness: 400.0, damping: 25.0, mass: 1.0 };
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self::REMOTE
    }
}

// =============================================================================
// RELAY
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayConfig {
    pub port: u16,
    /// Per-client outbound queue depth. Frames beyond it are dropped.
    pub client_buffer: usize,
}

impl RelayConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            port: env_parse("PORT", DEFAULT_PORT),
            client_buffer: env_parse("RELAY_CLIENT_BUFFER", DEFAULT_CLIENT_BUFFER).max(1),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self { port: DEFAULT_PORT, client_buffer: DEFAULT_CLIENT_BUFFER }
    }
}

// =============================================================================
// HELPERS
// =============================================================================

fn env_parse<T>(key: &str, default: T) -> T
where
    T: std::str::FromStr + Copy,
{
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
