use super::*;

fn keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("k{i}")).collect()
}

#[test]
fn starts_with_self_and_disconnected() {
    let agg = PresenceAggregator::new();
    assert_eq!(agg.real_count(), 1);
    assert!(!agg.is_connected());
}

#[test]
fn one_real_plus_one_fabricated_is_two() {
    let mut agg = PresenceAggregator::new();
    agg.apply_sync(&keys(1));
    assert_eq!(agg.online_count(1), 2);
}

#[test]
fn sync_replaces_previous_count() {
    let mut agg = PresenceAggregator::new();
    agg.apply_sync(&keys(4));
    agg.apply_sync(&keys(2));
    assert_eq!(agg.real_count(), 2);
    assert_eq!(agg.online_count(0), 2);
}

#[test]
fn snapshot_without_own_key_still_counts_self() {
    let mut agg = PresenceAggregator::new();
    agg.set_connected(true);
    agg.apply_sync(&[]);
    assert_eq!(agg.real_count(), 1);
    assert_eq!(online_label(&agg.summary(0)).as_deref(), Some("1 visitor online"));
}

#[test]
fn summary_reflects_connection() {
    let mut agg = PresenceAggregator::new();
    agg.set_connected(true);
    agg.apply_sync(&keys(3));
    assert_eq!(agg.summary(1), PresenceSummary { online_count: 4, is_connected: true });
}

#[test]
fn label_is_hidden_while_disconnected() {
    let summary = PresenceSummary { online_count: 3, is_connected: false };
    assert_eq!(online_label(&summary), None);
}

#[test]
fn label_uses_singular_for_one() {
    let summary = PresenceSummary { online_count: 1, is_connected: true };
    assert_eq!(online_label(&summary).as_deref(), Some("1 visitor online"));
    let summary = PresenceSummary { online_count: 2, is_connected: true };
    assert_eq!(online_label(&summary).as_deref(), Some("2 visitors online"));
}
