use super::*;
use crate::config::IntRange;

const T0: i64 = 1_700_000_000_000;

fn quiet_config() -> FabricatedConfig {
    FabricatedConfig {
        pause_probability: 0.0,
        scroll_probability: 0.0,
        empty_period_probability: 0.0,
        ..FabricatedConfig::default()
    }
}

/// Always wants the maximum population.
fn greedy_config() -> FabricatedConfig {
    FabricatedConfig {
        min_users: 3,
        target_users: 10,
        empty_period_probability: 0.0,
        ..FabricatedConfig::default()
    }
}

fn user_at(created_at: i64, ttl: i64) -> FabricatedUser {
    FabricatedUser {
        user_id: format!("ghost-{created_at}-{ttl}"),
        color: "#8B5CF6".into(),
        created_at,
        ttl,
        current_x: 100.0,
        current_y: 100.0,
        target_x: 900.0,
        target_y: 600.0,
        scroll_y: 0.0,
        is_paused: false,
        pause_until: 0,
        pathname: "/".into(),
        is_leaving: false,
    }
}

// =============================================================================
// POPULATION CONTROL
// =============================================================================

#[test]
fn target_is_zero_with_two_real_visitors() {
    let mut sim = FabricatedSimulator::with_seed(FabricatedConfig::default(), "/", 3);
    for i in 0..1000 {
        assert_eq!(sim.target_count(T0 + i, 2, 0), 0);
        assert_eq!(sim.target_count(T0 + i, 5, 1), 0);
    }
}

#[test]
fn target_distribution_is_mostly_one() {
    let mut sim = FabricatedSimulator::with_seed(FabricatedConfig::default(), "/", 42);
    let mut counts = [0_usize; 3];
    for i in 0..10_000 {
        counts[sim.target_count(T0 + i, 1, 0)] += 1;
    }
    assert!((1200..1800).contains(&counts[0]), "zero draws: {}", counts[0]);
    assert!((6500..7500).contains(&counts[1]), "one draws: {}", counts[1]);
    assert!((1200..1800).contains(&counts[2]), "two draws: {}", counts[2]);
}

#[test]
fn target_is_capped_at_max() {
    let mut sim = FabricatedSimulator::with_seed(greedy_config(), "/", 9);
    for i in 0..1000 {
        assert_eq!(sim.target_count(T0 + i, 0, 0), 3);
    }
}

#[test]
fn empty_period_suppresses_target_until_deadline() {
    let config = FabricatedConfig { empty_period_probability: 100.0, ..FabricatedConfig::default() };
    let mut sim = FabricatedSimulator::with_seed(config, "/", 5);

    assert_eq!(sim.target_count(T0, 1, 1), 0);
    let until = sim.empty_until();
    assert!(until >= T0 + 5000 && until < T0 + 20_000, "empty until {until}");

    // Inside the window nothing is wanted, even with no visitors present.
    assert_eq!(sim.target_count(until - 1, 0, 0), 0);
}

#[test]
fn empty_period_needs_existing_visitors() {
    let config = FabricatedConfig { empty_period_probability: 100.0, ..FabricatedConfig::default() };
    let mut sim = FabricatedSimulator::with_seed(config, "/", 5);
    for i in 0..50 {
        sim.target_count(T0 + i, 0, 0);
    }
    assert_eq!(sim.empty_until(), 0);
}

#[test]
fn spawns_at_most_one_per_tick() {
    let mut sim = FabricatedSimulator::with_seed(greedy_config(), "/", 1);
    let report = sim.tick_population(T0, 0);
    assert!(report.spawned.is_some());
    assert_eq!(sim.users().len(), 1);
}

#[test]
fn respawn_delay_spaces_spawns() {
    let config = FabricatedConfig { respawn_delay: IntRange::new(5000, 5000), ..greedy_config() };
    let mut sim = FabricatedSimulator::with_seed(config, "/", 1);

    assert!(sim.tick_population(T0, 0).spawned.is_some());
    assert!(sim.tick_population(T0 + 1000, 0).spawned.is_none());
    assert!(sim.tick_population(T0 + 4999, 0).spawned.is_none());
    assert!(sim.tick_population(T0 + 5000, 0).spawned.is_some());
    assert_eq!(sim.active_count(), 2);
}

#[test]
fn population_never_exceeds_ceiling() {
    let mut sim = FabricatedSimulator::with_seed(greedy_config(), "/", 77);
    for tick in 0..2000 {
        let now = T0 + tick * 1000;
        sim.tick_population(now, usize::try_from(tick % 2).unwrap_or(0));
        assert!(sim.active_count() <= 3, "tick {tick}: {} active", sim.active_count());
    }
}

#[test]
fn population_with_defaults_stays_under_ceiling() {
    let mut sim = FabricatedSimulator::with_seed(FabricatedConfig::default(), "/", 2024);
    let mut saw_visitor = false;
    for tick in 0..5000 {
        let now = T0 + tick * 1000;
        let report = sim.tick_population(now, 1);
        saw_visitor |= report.spawned.is_some();
        assert!(sim.active_count() <= 3);
    }
    assert!(saw_visitor);
}

#[test]
fn no_spawns_with_enough_real_visitors() {
    let mut sim = FabricatedSimulator::with_seed(greedy_config(), "/", 8);
    for tick in 0..100 {
        let report = sim.tick_population(T0 + tick * 1000, 2);
        assert_eq!(report.target, 0);
        assert!(report.spawned.is_none());
    }
    assert!(sim.users().is_empty());
}

// =============================================================================
// LIFECYCLE
// =============================================================================

fn no_spawn_config() -> FabricatedConfig {
    FabricatedConfig { max_users: 0, ..FabricatedConfig::default() }
}

#[test]
fn visitor_starts_leaving_after_ttl() {
    let mut sim = FabricatedSimulator::with_seed(no_spawn_config(), "/", 1);
    sim.push_user(user_at(T0, 20_000));

    sim.tick_population(T0 + 20_000, 0);
    assert!(!sim.users()[0].is_leaving);

    let report = sim.tick_population(T0 + 20_001, 0);
    assert!(sim.users()[0].is_leaving);
    assert_eq!(report.started_leaving.len(), 1);
    assert_eq!(sim.active_count(), 0);
}

#[test]
fn visitor_is_removed_after_grace_and_not_before() {
    let mut sim = FabricatedSimulator::with_seed(no_spawn_config(), "/", 1);
    sim.push_user(user_at(T0, 20_000));

    sim.tick_population(T0 + 20_001, 0);
    sim.tick_population(T0 + 22_000, 0);
    assert_eq!(sim.users().len(), 1, "removed before grace elapsed");

    let report = sim.tick_population(T0 + 22_001, 0);
    assert!(sim.users().is_empty());
    assert_eq!(report.removed.len(), 1);
}

#[test]
fn spawned_ttl_is_within_range() {
    let mut sim = FabricatedSimulator::with_seed(greedy_config(), "/", 13);
    for tick in 0..200 {
        sim.tick_population(T0 + tick * 5000, 0);
    }
    for user in sim.users() {
        assert!((20_000..=90_000).contains(&user.ttl), "ttl {}", user.ttl);
    }
}

#[test]
fn to_cursor_hides_simulation_state() {
    let mut user = user_at(T0, 20_000);
    let cursor = user.to_cursor(T0 + 5);
    assert_eq!(cursor.user_id, user.user_id);
    assert!(cursor.is_active);
    assert_eq!(cursor.last_seen, T0 + 5);
    assert!(cursor.scroll_x.abs() < f64::EPSILON);

    user.is_leaving = true;
    assert!(!user.to_cursor(T0 + 5).is_active);
}

// =============================================================================
// SPAWNING
// =============================================================================

#[test]
fn spawn_enters_from_outside_the_viewport() {
    let mut sim = FabricatedSimulator::with_seed(quiet_config(), "/home", 99);
    let viewport = Viewport::default();
    for i in 0..100 {
        let user = sim.spawn(T0 + i);
        let outside = user.current_x < 0.0
            || user.current_y < 0.0
            || user.current_x > viewport.width
            || user.current_y > viewport.height;
        assert!(outside, "spawned inside at ({}, {})", user.current_x, user.current_y);
        assert!((50.0..=1150.0).contains(&user.target_x));
        assert!((50.0..=750.0).contains(&user.target_y));
        assert_eq!(user.pathname, "/home");
        assert_eq!(user.color, identity::color_for(&user.user_id));
    }
}

#[test]
fn seeded_simulators_are_reproducible() {
    let mut a = FabricatedSimulator::with_seed(greedy_config(), "/", 31);
    let mut b = FabricatedSimulator::with_seed(greedy_config(), "/", 31);
    for tick in 0..50 {
        let now = T0 + tick * 1000;
        a.tick_population(now, 0);
        b.tick_population(now, 0);
        a.tick_motion(now);
        b.tick_motion(now);
    }
    assert_eq!(a.users(), b.users());
}

#[test]
fn navigate_moves_visitors_to_new_route() {
    let mut sim = FabricatedSimulator::with_seed(greedy_config(), "/", 4);
    sim.tick_population(T0, 0);
    sim.navigate("/work");
    assert!(sim.cursors(T0).iter().all(|c| c.pathname == "/work"));
}

// =============================================================================
// MOTION
// =============================================================================

#[test]
fn motion_closes_distance_to_target() {
    let mut sim = FabricatedSimulator::with_seed(quiet_config(), "/", 21);
    sim.push_user(user_at(T0, 90_000));

    let mut last = f64::MAX;
    for i in 0..10 {
        sim.tick_motion(T0 + i * 50);
        let u = &sim.users()[0];
        let d = (u.target_x - u.current_x).hypot(u.target_y - u.current_y);
        assert!(d < last, "step {i} did not approach target");
        last = d;
    }
}

#[test]
fn arrival_picks_new_target_without_moving() {
    let mut sim = FabricatedSimulator::with_seed(quiet_config(), "/", 21);
    let mut user = user_at(T0, 90_000);
    user.target_x = 110.0;
    user.target_y = 110.0;
    sim.push_user(user);

    sim.tick_motion(T0);
    let u = &sim.users()[0];
    assert!((u.current_x - 100.0).abs() < f64::EPSILON);
    assert!((u.current_y - 100.0).abs() < f64::EPSILON);
    assert!((50.0..=1150.0).contains(&u.target_x));
    assert!((50.0..=750.0).contains(&u.target_y));
}

#[test]
fn paused_visitor_holds_position_until_pause_ends() {
    let mut sim = FabricatedSimulator::with_seed(quiet_config(), "/", 21);
    let mut user = user_at(T0, 90_000);
    user.is_paused = true;
    user.pause_until = T0 + 1000;
    sim.push_user(user);

    sim.tick_motion(T0 + 999);
    assert!((sim.users()[0].current_x - 100.0).abs() < f64::EPSILON);
    assert!(sim.users()[0].is_paused);

    sim.tick_motion(T0 + 1000);
    assert!(!sim.users()[0].is_paused);
    assert!(sim.users()[0].current_x > 100.0);
}

#[test]
fn pause_rolls_stop_movement() {
    let config = FabricatedConfig { pause_probability: 1.0, ..quiet_config() };
    let mut sim = FabricatedSimulator::with_seed(config, "/", 21);
    sim.push_user(user_at(T0, 90_000));

    sim.tick_motion(T0);
    let u = &sim.users()[0];
    assert!(u.is_paused);
    assert!((500..=3000).contains(&(u.pause_until - T0)));
    assert!((u.current_x - 100.0).abs() < f64::EPSILON);
}

#[test]
fn leaving_visitors_are_frozen() {
    let mut sim = FabricatedSimulator::with_seed(quiet_config(), "/", 21);
    let mut user = user_at(T0, 90_000);
    user.is_leaving = true;
    sim.push_user(user.clone());

    sim.tick_motion(T0);
    assert_eq!(sim.users()[0], user);
}

#[test]
fn scroll_stays_within_page() {
    let config = FabricatedConfig { scroll_probability: 1.0, ..quiet_config() };
    let mut sim = FabricatedSimulator::with_seed(config, "/", 55);
    sim.set_viewport(Viewport { width: 1200.0, height: 800.0, page_height: 1400.0 });
    let mut user = user_at(T0, 90_000);
    user.target_x = 100_000.0;
    sim.push_user(user);

    let mut scrolled = false;
    for i in 0..500 {
        sim.tick_motion(T0 + i * 50);
        let s = sim.users()[0].scroll_y;
        assert!((0.0..=600.0).contains(&s), "scroll {s}");
        scrolled |= s > 0.0;
    }
    assert!(scrolled);
}

#[test]
fn short_page_never_scrolls() {
    let config = FabricatedConfig { scroll_probability: 1.0, ..quiet_config() };
    let mut sim = FabricatedSimulator::with_seed(config, "/", 55);
    sim.set_viewport(Viewport { width: 1200.0, height: 800.0, page_height: 600.0 });
    let mut user = user_at(T0, 90_000);
    user.target_x = 100_000.0;
    sim.push_user(user);

    for i in 0..100 {
        sim.tick_motion(T0 + i * 50);
        assert!(sim.users()[0].scroll_y.abs() < f64::EPSILON);
    }
}
