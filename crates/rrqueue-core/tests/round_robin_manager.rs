#![allow(clippy::tests_outside_test_module, reason = "integration tests live in tests/ dir")]
#![allow(clippy::expect_used, reason = "integration tests assert through expect")]

use rrqueue_core::backend::{Backend, Delay, PushOptions};
use rrqueue_core::store::{rotation_key, IndexStore};
use rrqueue_core::QueueManager;
use rrqueue_types::{AppConfig, QueueError};
use serde_json::json;

fn config_json(store_path: &std::path::Path) -> serde_json::Value {
    json!({
        "queue": {
            "default": "rr",
            "connections": {
                "rr": { "driver": "roundrobin", "queue": "default", "connections": ["q1", "q2"] },
                "loop": { "driver": "roundrobin", "connections": ["q1", "loop"] },
                "q1": { "driver": "memory" },
                "q2": { "driver": "memory" }
            }
        },
        "store": { "kind": "sqlite", "path": store_path }
    })
}

fn manager_for(store_path: &std::path::Path) -> QueueManager {
    let config: AppConfig =
        serde_json::from_value(config_json(store_path)).expect("config parses");
    QueueManager::from_app_config(&config).expect("manager builds")
}

#[tokio::test]
async fn test_rotation_continues_across_managers() {
    let dir = tempfile::tempdir().expect("tempdir");
    let store_path = dir.path().join("rotation.db");

    let first = manager_for(&store_path);
    let rr = first.default_connection().expect("rr connection");
    rr.push("job1", &json!(""), None).await.expect("push to q1");

    // A second manager stands in for another worker process.
    let second = manager_for(&store_path);
    let rr_again = second.default_connection().expect("rr connection");
    rr_again.push("job2", &json!(""), None).await.expect("push to q2");

    let q1 = first.connection("q1").expect("q1");
    let q2 = second.connection("q2").expect("q2");
    assert_eq!(q1.pop(None).await.expect("pop").map(|j| j.name), Some("job1".to_string()));
    assert_eq!(q2.pop(None).await.expect("pop").map(|j| j.name), Some("job2".to_string()));

    let stored = second.store().get(&rotation_key("rr"), 99).await.expect("stored index");
    assert_eq!(stored, 0);
}

#[tokio::test]
async fn test_every_operation_rotates_and_size_aggregates() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manager = manager_for(&dir.path().join("rotation.db"));
    let rr = manager.connection("rr").expect("rr");

    rr.push("a", &json!({"id": 1}), None).await.expect("push");
    rr.push_raw("{\"id\":2}", None, &PushOptions::new()).await.expect("push_raw");
    rr.later(Delay::Seconds(3600), "c", &json!({"id": 3}), None).await.expect("later");
    rr.push("d", &json!({"id": 4}), Some("reports")).await.expect("push to reports");

    let q1 = manager.connection("q1").expect("q1");
    let q2 = manager.connection("q2").expect("q2");
    assert_eq!(q1.size(None).await.expect("size"), 2);
    assert_eq!(q2.size(None).await.expect("size"), 1);
    assert_eq!(q2.size(Some("reports")).await.expect("size"), 1);

    assert_eq!(rr.size(None).await.expect("size"), 3);
    assert_eq!(rr.size(Some("reports")).await.expect("size"), 1);

    // The delayed job on q1 stays put.
    assert_eq!(q1.pop(None).await.expect("pop").map(|j| j.name), Some("a".to_string()));
    assert!(q1.pop(None).await.expect("pop").is_none());
}

#[tokio::test]
async fn test_self_referencing_connection_is_refused() {
    let dir = tempfile::tempdir().expect("tempdir");
    let manager = manager_for(&dir.path().join("rotation.db"));
    let looping = manager.connection("loop").expect("constructs lazily");

    let err = looping.push("job", &json!(""), None).await.expect_err("recursion guard");
    assert!(matches!(err, QueueError::Config(_)));
    assert!(err.is_infinite_recursion());
    assert!(looping.size(None).await.expect_err("recursion guard").is_infinite_recursion());
    assert!(looping.pop(None).await.expect("pop never fails").is_none());

    let q1 = manager.connection("q1").expect("q1");
    assert_eq!(q1.size(None).await.expect("size"), 0);
    assert_eq!(manager.store().get(&rotation_key("loop"), 42).await.expect("get"), 42);
}
