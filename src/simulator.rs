//! Fabricated visitor simulator — synthetic cursors that keep the page lively.
//!
//! DESIGN
//! ======
//! Two ticks drive the simulation. The population tick (1 s) retires expired
//! visitors and decides whether to spawn one; the motion tick (50 ms) walks
//! every active visitor toward a target with pauses, wobble, and the odd
//! scroll. Both ticks take `now` explicitly and all randomness comes from the
//! simulator's own seedable RNG, so a seeded simulator is fully reproducible.
//!
//! LIFECYCLE
//! =========
//! `active → leaving → removed`. A visitor starts leaving once its age
//! exceeds its ttl; it stops moving and keeps rendering (inactive) for the
//! leave grace so the exit animation can play, then it is dropped.
//!
//! TRADE-OFFS
//! ==========
//! The empty-period roll happens once per population tick, so its real-time
//! incidence depends on the tick period.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::config::FabricatedConfig;
use crate::identity;
use crate::tracker::RemoteCursor;

/// Distance under which a visitor has "arrived" and picks a new target.
const ARRIVAL_RADIUS: f64 = 30.0;
/// Offset outside the viewport where new visitors appear.
const EDGE_OFFSET: f64 = 20.0;
/// Margin kept between natural targets and the viewport edge.
const TARGET_MARGIN: f64 = 50.0;

// =============================================================================
// TYPES
// =============================================================================

/// Host viewport and document size used for spawning and scrolling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub page_height: f64,
}

impl Viewport {
    /// Largest valid vertical scroll offset.
    #[must_use]
    pub fn max_scroll(&self) -> f64 {
        (self.page_height - self.height).max(0.0)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 1200.0, height: 800.0, page_height: 2000.0 }
    }
}

/// A synthetic peer plus its simulation state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricatedUser {
    pub user_id: String,
    pub color: String,
    pub created_at: i64,
    pub ttl: i64,
    pub current_x: f64,
    pub current_y: f64,
    pub target_x: f64,
    pub target_y: f64,
    pub scroll_y: f64,
    pub is_paused: bool,
    pub pause_until: i64,
    pub pathname: String,
    pub is_leaving: bool,
}

impl FabricatedUser {
    /// Project into the remote-cursor shape. Renderers cannot tell the two apart.
    #[must_use]
    pub fn to_cursor(&self, now: i64) -> RemoteCursor {
        RemoteCursor {
            user_id: self.user_id.clone(),
            x: self.current_x,
            y: self.current_y,
            scroll_x: 0.0,
            scroll_y: self.scroll_y,
            color: self.color.clone(),
            pathname: self.pathname.clone(),
            last_seen: now,
            is_active: !self.is_leaving,
        }
    }

    #[must_use]
    pub fn is_expired(&self, now: i64) -> bool {
        now - self.created_at > self.ttl
    }
}

/// What one population tick did. Used for logging and tests.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulationReport {
    pub target: usize,
    pub spawned: Option<String>,
    pub started_leaving: Vec<String>,
    pub removed: Vec<String>,
}

impl PopulationReport {
    #[must_use]
    pub fn changed(&self) -> bool {
        self.spawned.is_some() || !self.started_leaving.is_empty() || !self.removed.is_empty()
    }
}

// =============================================================================
// SIMULATOR
// =============================================================================

pub struct FabricatedSimulator {
    config: FabricatedConfig,
    rng: StdRng,
    viewport: Viewport,
    pathname: String,
    users: Vec<FabricatedUser>,
    /// No visitors are wanted before this instant.
    empty_until: i64,
    /// Earliest instant for the next spawn.
    next_spawn_at: i64,
}

impl FabricatedSimulator {
    pub fn new(config: FabricatedConfig, pathname: impl Into<String>) -> Self {
        Self::with_seed(config, pathname, rand::rng().random())
    }

    pub fn with_seed(config: FabricatedConfig, pathname: impl Into<String>, seed: u64) -> Self {
        Self {
            config,
            rng: StdRng::seed_from_u64(seed),
            viewport: Viewport::default(),
            pathname: pathname.into(),
            users: Vec::new(),
            empty_until: 0,
            next_spawn_at: 0,
        }
    }

    #[must_use]
    pub fn config(&self) -> &FabricatedConfig {
        &self.config
    }

    #[must_use]
    pub fn users(&self) -> &[FabricatedUser] {
        &self.users
    }

    /// Visitors that have not started leaving.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.users.iter().filter(|u| !u.is_leaving).count()
    }

    #[must_use]
    pub fn empty_until(&self) -> i64 {
        self.empty_until
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Follow the host to a new route so visitors stay on the visible page.
    pub fn navigate(&mut self, pathname: impl Into<String>) {
        self.pathname = pathname.into();
        for user in &mut self.users {
            user.pathname.clone_from(&self.pathname);
        }
    }

    /// Every visitor, leaving ones included, in remote-cursor shape.
    #[must_use]
    pub fn cursors(&self, now: i64) -> Vec<RemoteCursor> {
        self.users.iter().map(|u| u.to_cursor(now)).collect()
    }

    // -------------------------------------------------------------------------
    // POPULATION
    // -------------------------------------------------------------------------

    /// Retire expired visitors, then spawn at most one if below target.
    pub fn tick_population(&mut self, now: i64, real_count: usize) -> PopulationReport {
        let mut report = PopulationReport::default();
        let grace = self.config.leave_grace_ms;

        self.users.retain(|u| {
            let keep = now - u.created_at <= u.ttl + grace;
            if !keep {
                report.removed.push(u.user_id.clone());
            }
            keep
        });
        for user in &mut self.users {
            if !user.is_leaving && user.is_expired(now) {
                user.is_leaving = true;
                report.started_leaving.push(user.user_id.clone());
            }
        }

        let active = self.active_count();
        report.target = self.target_count(now, real_count, active);

        if active < report.target && active < self.config.max_users && now >= self.next_spawn_at {
            let user = self.spawn(now);
            report.spawned = Some(user.user_id.clone());
            self.users.push(user);
            self.next_spawn_at = now + self.config.respawn_delay.sample(&mut self.rng);
        }

        report
    }

    /// How many visitors should exist right now.
    pub fn target_count(&mut self, now: i64, real_count: usize, current: usize) -> usize {
        if real_count >= 2 {
            return 0;
        }
        if now < self.empty_until {
            return 0;
        }

        if current > 0 && self.rng.random::<f64>() < self.config.empty_period_probability * 0.01 {
            #[allow(clippy::cast_possible_truncation)]
            let duration = self.config.empty_period_duration.sample_f64(&mut self.rng) as i64;
            self.empty_until = now + duration;
            return 0;
        }

        let roll = self.rng.random::<f64>();
        let target = if roll < 0.15 {
            0
        } else if roll < 0.85 {
            self.config.target_users
        } else {
            self.config.target_users + 1
        };

        target.max(self.config.min_users).min(self.config.max_users)
    }

    /// Create a visitor entering from a random viewport edge.
    fn spawn(&mut self, now: i64) -> FabricatedUser {
        let user_id = identity::generate_fabricated_user_id(&mut self.rng);
        let Viewport { width, height, .. } = self.viewport;

        let (start_x, start_y) = match self.rng.random_range(0..4) {
            0 => (random_in_range(&mut self.rng, 100.0, width - 100.0), -EDGE_OFFSET),
            1 => (width + EDGE_OFFSET, random_in_range(&mut self.rng, 100.0, height - 100.0)),
            2 => (random_in_range(&mut self.rng, 100.0, width - 100.0), height + EDGE_OFFSET),
            _ => (-EDGE_OFFSET, random_in_range(&mut self.rng, 100.0, height - 100.0)),
        };
        let (target_x, target_y) = natural_target(&mut self.rng, &self.viewport);

        FabricatedUser {
            color: identity::color_for(&user_id).to_owned(),
            user_id,
            created_at: now,
            ttl: self.config.ttl.sample(&mut self.rng),
            current_x: start_x,
            current_y: start_y,
            target_x,
            target_y,
            scroll_y: 0.0,
            is_paused: false,
            pause_until: 0,
            pathname: self.pathname.clone(),
            is_leaving: false,
        }
    }

    // -------------------------------------------------------------------------
    // MOTION
    // -------------------------------------------------------------------------

    /// Advance every active visitor by one movement step.
    pub fn tick_motion(&mut self, now: i64) {
        for user in &mut self.users {
            if user.is_leaving {
                continue;
            }
            step_user(user, now, &self.config, &self.viewport, &mut self.rng);
        }
    }

    #[cfg(test)]
    pub(crate) fn push_user(&mut self, user: FabricatedUser) {
        self.users.push(user);
    }
}

// =============================================================================
// MOTION MODEL
// =============================================================================

/// One movement step: pause, retarget, or glide toward the target.
fn step_user(user: &mut FabricatedUser, now: i64, config: &FabricatedConfig, viewport: &Viewport, rng: &mut impl Rng) {
    if user.is_paused {
        if now < user.pause_until {
            return;
        }
        user.is_paused = false;
    }

    // Reading pause.
    if rng.random::<f64>() < config.pause_probability {
        user.is_paused = true;
        user.pause_until = now + config.pause_duration.sample(rng);
        return;
    }

    let dx = user.target_x - user.current_x;
    let dy = user.target_y - user.current_y;
    let distance = dx.hypot(dy);

    if distance < ARRIVAL_RADIUS {
        let (tx, ty) = natural_target(rng, viewport);
        user.target_x = tx;
        user.target_y = ty;
        return;
    }

    // Decelerate near the target.
    let base_speed = 3.0 + rng.random::<f64>() * 4.0;
    let speed_multiplier = (distance / 200.0).min(1.0);
    let speed = base_speed * (0.3 + speed_multiplier * 0.7);

    let wobble = (rng.random::<f64>() - 0.5) * 2.0;
    user.current_x += dx / distance * speed + wobble;
    user.current_y += dy / distance * speed + wobble * 0.5;

    if rng.random::<f64>() < config.scroll_probability {
        let direction = if rng.random::<f64>() > 0.5 { 1.0 } else { -1.0 };
        #[allow(clippy::cast_precision_loss)]
        let delta = direction * config.scroll_amount.sample(rng) as f64;
        user.scroll_y = (user.scroll_y + delta).min(viewport.max_scroll()).max(0.0);
    }
}

/// Target biased toward the center-left content column, with jitter.
fn natural_target(rng: &mut impl Rng, viewport: &Viewport) -> (f64, f64) {
    let Viewport { width, height, .. } = *viewport;

    let bias_x = 0.3 + rng.random::<f64>() * 0.5;
    let bias_y = 0.15 + rng.random::<f64>() * 0.6;
    let jitter_x = (rng.random::<f64>() - 0.5) * width * 0.3;
    let jitter_y = (rng.random::<f64>() - 0.5) * height * 0.3;

    (
        clamp_to_margin(width * bias_x + jitter_x, width),
        clamp_to_margin(height * bias_y + jitter_y, height),
    )
}

fn clamp_to_margin(value: f64, extent: f64) -> f64 {
    value.min(extent - TARGET_MARGIN).max(TARGET_MARGIN)
}

/// Whole number uniformly drawn from `[min, max]`.
fn random_in_range(rng: &mut impl Rng, min: f64, max: f64) -> f64 {
    if max <= min {
        return min.floor();
    }
    (rng.random::<f64>() * (max - min + 1.0)).floor() + min.floor()
}

#[cfg(test)]
#[path = "simulator_test.rs"]
mod tests;
