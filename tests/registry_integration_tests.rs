use delivery_watcher::registry::{HostBandwidthRegistry, HostUpdateRecord};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

/// Integration tests for the host bandwidth registry
/// These exercise the reconcile/select cycle the delivery service runs in
/// production, including concurrent access from updater and router threads

fn fleet(records: &[(&str, bool, i64)]) -> Vec<HostUpdateRecord> {
    records
        .iter()
        .map(|(host, running, correction)| HostUpdateRecord::new(*host, *running, *correction))
        .collect()
}

#[test]
fn test_reconcile_select_cycle() {
    let registry = HostBandwidthRegistry::new();

    // decoded payload exactly as the fleet updater delivers it
    let records: Vec<HostUpdateRecord> = serde_json::from_str(
        r#"[
            {"host": "edge-1", "running": true},
            {"host": "edge-2", "running": true, "bandwidthCorrection": -50},
            {"host": "edge-3", "running": false}
        ]"#,
    )
    .expect("payload should decode");
    registry.update_hosts(&records);

    // delivery tracking pushes measured bandwidth per host
    registry.add_bandwidth("edge-1", 100);
    registry.add_bandwidth("edge-2", 60);
    registry.add_bandwidth("edge-3", 1);

    // edge-2 wins on effective bandwidth (60 - 50 = 10), edge-3 is excluded
    assert_eq!(
        registry.min_bandwidth_host(),
        Some("edge-2".to_string())
    );

    let mut running = HashSet::new();
    registry.fill_with_running_hosts(&mut running);
    assert_eq!(
        running,
        HashSet::from(["edge-1".to_string(), "edge-2".to_string()])
    );
}

#[test]
fn test_reconcile_membership_follows_latest_update() {
    let registry = HostBandwidthRegistry::new();

    registry.update_hosts(&fleet(&[("a", true, 0), ("b", true, 0), ("c", true, 0)]));
    registry.add_bandwidth("c", 10_000);
    assert_eq!(registry.len(), 3);

    // c disappears from the fleet, accumulated bandwidth and all
    registry.update_hosts(&fleet(&[("a", true, 0), ("b", true, 0)]));
    assert_eq!(registry.len(), 2);
    assert_eq!(registry.entry("c"), None);

    // back again: a fresh host starting from zero
    registry.update_hosts(&fleet(&[("a", true, 0), ("b", true, 0), ("c", true, 0)]));
    registry.set_bandwidth("a", 5);
    registry.set_bandwidth("b", 5);
    assert_eq!(registry.min_bandwidth_host(), Some("c".to_string()));
}

#[test]
fn test_repeated_reconcile_preserves_bandwidth_state() {
    let registry = HostBandwidthRegistry::new();
    let records = fleet(&[("a", true, 3), ("b", true, 0)]);

    registry.update_hosts(&records);
    registry.add_bandwidth("a", 70);
    registry.add_bandwidth("b", 80);

    for _ in 0..5 {
        registry.update_hosts(&records);
    }

    assert_eq!(registry.entry("a").unwrap().bandwidth, 70);
    assert_eq!(registry.entry("a").unwrap().correction, 3);
    assert_eq!(registry.entry("b").unwrap().bandwidth, 80);
    assert_eq!(registry.min_bandwidth_host(), Some("a".to_string()));
}

#[test]
fn test_concurrent_updates_and_queries() {
    // updater, tracker, and router threads hammer the registry at once;
    // the point is the lock discipline, not a particular winner
    let registry = Arc::new(HostBandwidthRegistry::new());
    registry.update_hosts(&fleet(&[("a", true, 0), ("b", true, 0), ("c", true, 0)]));

    let mut handles = Vec::new();

    for _ in 0..4 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for _ in 0..500 {
                registry.add_bandwidth("a", 3);
                registry.add_bandwidth("b", 2);
                registry.add_bandwidth("c", 1);
            }
        }));
    }

    for _ in 0..2 {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for _ in 0..500 {
                let _ = registry.min_bandwidth_host();
                let mut running = HashSet::new();
                registry.fill_with_running_hosts(&mut running);
                assert!(running.len() <= 3);
            }
        }));
    }

    {
        let registry = Arc::clone(&registry);
        handles.push(thread::spawn(move || {
            for _ in 0..100 {
                registry.update_hosts(&fleet(&[("a", true, 0), ("b", true, 0), ("c", true, 0)]));
            }
        }));
    }

    for handle in handles {
        handle.join().expect("registry thread should not panic");
    }

    // all additions landed: membership was never disturbed by the
    // identical reconciles running alongside
    assert_eq!(registry.entry("a").unwrap().bandwidth, 4 * 500 * 3);
    assert_eq!(registry.entry("b").unwrap().bandwidth, 4 * 500 * 2);
    assert_eq!(registry.entry("c").unwrap().bandwidth, 4 * 500);
    assert_eq!(registry.min_bandwidth_host(), Some("c".to_string()));
}
