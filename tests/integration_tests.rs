use simtrace::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn manifest(id: u32, batches: &[(&str, f64, f64)], stats: &[(&str, &str, &str, &str)]) -> String {
    let batches: Vec<_> = batches
        .iter()
        .map(|(path, start, end)| {
            serde_json::json!({ "path": path, "entryTimeStart": start, "entryTimeEnd": end })
        })
        .collect();
    let stats: Vec<_> = stats
        .iter()
        .map(|(stat_type, component, metric, path)| {
            serde_json::json!({
                "type": stat_type, "componentId": component, "metricName": metric, "path": path
            })
        })
        .collect();

    serde_json::json!({
        "formatVersion": 1,
        "metadata": {
            "simulationId": "bank",
            "replicationNumber": id,
            "duration": 100.0,
            "timeUnit": "minutes",
            "modelLayoutPath": "shared/layout.json",
            "visualConfigPath": "shared/visual.json"
        },
        "entityPathFiles": batches,
        "statisticsFiles": stats
    })
    .to_string()
}

/// Two replications on disk: replication 1 has E1 and a queue metric,
/// replication 2 has E2 only.
fn bank_study() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();

    write(
        root,
        "replications/replication_1/replication_1_manifest.json",
        &manifest(
            1,
            &[("replications/replication_1/paths_0.json", 0.0, 0.0)],
            &[(
                "activity_metric",
                "act1",
                "queueLength",
                "replications/replication_1/queue.json",
            )],
        ),
    );
    write(
        root,
        "replications/replication_1/paths_0.json",
        r#"{ "entities": { "E1": { "type": "customer", "path": [
                { "clock": 0, "x": 0, "y": 0, "state": "idle" },
                { "clock": 10, "x": 10, "y": 0, "state": "moving" } ] } } }"#,
    );
    write(
        root,
        "replications/replication_1/queue.json",
        r#"{ "metadata": { "type": "activity_metric", "componentId": "act1", "metricName": "queueLength" },
             "summary": { "min": 2, "max": 8, "mean": 5, "median": 5, "stdDev": 3, "count": 2 },
             "timeSeries": [ { "time": 0, "value": 2 }, { "time": 10, "value": 8 } ] }"#,
    );

    write(
        root,
        "replications/replication_2/replication_2_manifest.json",
        &manifest(2, &[("replications/replication_2/paths_0.json", 0.0, 5.0)], &[]),
    );
    write(
        root,
        "replications/replication_2/paths_0.json",
        r#"{ "entities": [ { "id": "E2", "type": "teller", "path": [
                { "clock": 5, "x": 1, "y": 1, "state": "serving" } ] } ] }"#,
    );

    write(root, "shared/layout.json", r#"{ "components": ["act1"] }"#);
    write(root, "shared/visual.json", r#"{ "theme": "dark" }"#);
    dir
}

#[tokio::test]
async fn test_entity_state_end_to_end() {
    init_logging();
    let dir = bank_study();
    let mut study = Study::open(dir.path()).unwrap();

    let report = study.discover_replications().await;
    assert_eq!(report.registered, 2);
    study.set_active_replication(1).await.unwrap();

    let metadata = study.get_active_replication_metadata().unwrap();
    assert_eq!(metadata.duration, 100.0);

    let state = study.get_entity_state_at_time("E1", 5.0).unwrap();
    assert_eq!(state.state, "idle");
    assert_eq!(state.x, 5.0);
    assert_eq!(state.y, 0.0);
    assert!(state.interpolated);

    let exact = study.get_entity_state_at_time("E1", 10.0).unwrap();
    assert_eq!((exact.state.as_str(), exact.x, exact.y), ("moving", 10.0, 0.0));
    assert!(!exact.interpolated);

    assert!(study.get_entity_state_at_time("E1", 10.5).is_none());
    assert!(study.get_entity_ids_at_time(5.0).contains("E1"));
    assert_eq!(study.get_entities_by_type("customer").len(), 1);
}

#[tokio::test]
async fn test_statistics_end_to_end() {
    init_logging();
    let dir = bank_study();
    let mut study = Study::open(dir.path()).unwrap();
    study.discover_replications().await;
    study.set_active_replication(1).await.unwrap();

    let key = StatisticKey::new("activity_metric", "act1", "queueLength");
    assert_eq!(study.get_statistic_value_at_time(&key, 5.0, true), Some(5.0));
    // Equidistant from both samples: the earlier one wins.
    assert_eq!(study.get_statistic_value_at_time(&key, 5.0, false), Some(2.0));
    assert_eq!(study.get_statistic_value_at_time(&key, -1.0, true), Some(2.0));
    assert_eq!(study.get_statistic_value_at_time(&key, 99.0, true), Some(8.0));

    let summary = study.get_statistics_summary(&key).unwrap();
    assert_eq!(summary.std_dev, 3.0);
    assert_eq!(study.get_time_series_for_range(&key, 0.0, 10.0).len(), 2);
    assert_eq!(study.get_available_statistics(), vec![key]);
}

#[tokio::test]
async fn test_activation_replaces_previous_replication() {
    init_logging();
    let dir = bank_study();
    let mut study = Study::open(dir.path()).unwrap();
    study.discover_replications().await;

    study.set_active_replication(1).await.unwrap();
    assert!(study.get_loaded_entity_ids().contains("E1"));

    let report = study.set_active_replication(2).await.unwrap();
    assert_eq!(report.replication_id, 2);

    let ids = study.get_loaded_entity_ids();
    assert!(!ids.contains("E1"));
    assert!(ids.contains("E2"));
    assert!(study.get_statistics_by_type("activity_metric").is_empty());
    assert_eq!(study.active_replication_id(), Some(2));
}

#[tokio::test]
async fn test_discovery_tolerates_bad_units() {
    init_logging();
    let dir = bank_study();
    let root = dir.path();
    write(root, "replications/replication_x/notes.json", "{}");
    write(
        root,
        "replications/replication_7/replication_7_manifest.json",
        "{ \"metadata\": ",
    );
    write(root, "replications/replication_8/other.json", "{}");
    write(
        root,
        "replications/replication_9/replication_9_manifest.json",
        r#"{ "formatVersion": 2, "metadata": {} }"#,
    );

    let mut study = Study::open(root).unwrap();
    let report = study.discover_replications().await;

    assert_eq!(report.registered, 2);
    assert_eq!(report.skipped, 4);
    assert_eq!(study.replication_ids(), vec![1, 2]);
}

#[tokio::test]
async fn test_shared_documents_follow_lowest_replication() {
    init_logging();
    let dir = bank_study();
    let root = dir.path();
    // A replication with a lower id pointing at other shared documents.
    write(
        root,
        "replications/replication_0/replication_0_manifest.json",
        r#"{ "metadata": { "replicationNumber": 0, "modelLayoutPath": "shared/layout_0.json" } }"#,
    );
    write(root, "shared/layout_0.json", r#"{ "components": [] }"#);

    let mut study = Study::open(root).unwrap();
    study.discover_replications().await;

    let layout = study.model_layout().unwrap();
    assert_eq!(layout.get("components").unwrap(), &serde_json::json!([]));
    assert!(study.visual_config().is_none());
}

#[tokio::test]
async fn test_shared_documents_available_after_discovery() {
    init_logging();
    let dir = bank_study();
    let mut study = Study::open(dir.path()).unwrap();
    study.discover_replications().await;

    assert_eq!(
        study.visual_config().unwrap().get("theme").unwrap(),
        &serde_json::json!("dark")
    );
    assert!(study.model_layout().is_some());
}

#[tokio::test]
async fn test_lazy_entity_loading_by_time_range() {
    init_logging();
    let reader = MemoryReader::with_files([
        (
            "replications/replication_1/replication_1_manifest.json".to_string(),
            manifest(
                1,
                &[("batches/early.json", 0.0, 9.0), ("batches/late.json", 50.0, 59.0)],
                &[],
            ),
        ),
        (
            "batches/early.json".to_string(),
            r#"{ "entities": [ { "id": "A", "path": [ { "clock": 0, "x": 0, "y": 0 },
                                                       { "clock": 60, "x": 6, "y": 0 } ] } ] }"#
                .to_string(),
        ),
        (
            "batches/late.json".to_string(),
            r#"{ "entities": [ { "id": "B", "path": [ { "clock": 55, "x": 0, "y": 0 } ] } ] }"#
                .to_string(),
        ),
    ]);
    let mut study = Study::builder()
        .reader(reader)
        .lazy_entity_loading(true)
        .build()
        .unwrap();
    study.discover_replications().await;

    let report = study.set_active_replication(1).await.unwrap();
    assert_eq!(report.entity_batches.total(), 0);
    assert!(study.get_loaded_entity_ids().is_empty());

    let report = study.load_entity_paths_for_time_range(0.0, 20.0).await.unwrap();
    assert_eq!(report.loaded, 1);
    assert_eq!(study.get_entity_ids_at_time(30.0).len(), 1);

    let report = study.load_entity_paths_for_time_range(20.0, 60.0).await.unwrap();
    assert_eq!((report.loaded, report.skipped), (1, 1));
    assert_eq!(study.get_entity_ids_at_time(55.0).len(), 2);
    assert_eq!(study.entity_index_stats().loaded_files, 2);
}

#[tokio::test]
async fn test_cache_serves_repeated_loads() {
    init_logging();
    let manifest_path = "replications/replication_1/replication_1_manifest.json";
    let reader = MemoryReader::with_files([
        (
            manifest_path.to_string(),
            manifest(1, &[("batches/a.json", 0.0, 0.0)], &[]),
        ),
        (
            "batches/a.json".to_string(),
            r#"{ "entities": [ { "id": "A", "path": [ { "clock": 0, "x": 0, "y": 0 } ] } ] }"#
                .to_string(),
        ),
    ]);
    let mut study = Study::with_reader(reader).unwrap();

    study.discover_replications().await;
    study.discover_replications().await;
    assert_eq!(study.reader().read_count_for(manifest_path), 1);

    study.set_active_replication(1).await.unwrap();
    let first = study.get_entity_path("A").unwrap();
    study.reload_active_replication().await.unwrap();
    let second = study.get_entity_path("A").unwrap();

    assert_eq!(first, second);
    assert_eq!(study.reader().read_count_for("batches/a.json"), 1);

    let stats = study.cache_stats();
    assert!(stats.hits >= 2);
    assert_eq!(stats.parse_failures, 0);

    // An explicit eviction forces the next load back to storage.
    assert_eq!(study.clear_cache(Some("batches/a.json")), 1);
    study.reload_active_replication().await.unwrap();
    assert_eq!(study.reader().read_count_for("batches/a.json"), 2);
}

#[test]
fn test_open_rejects_invalid_config() {
    let dir = TempDir::new().unwrap();
    let config = Config::default().with_replication_dir_prefix("");
    assert!(matches!(
        Study::open_with_config(dir.path(), config),
        Err(SimtraceError::InvalidConfig(_))
    ));
}
