use home_price_backend::ArtifactStore;
use serde_json::Value;
use std::fs;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

#[test]
fn fresh_load_creates_and_persists_both_artifacts() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    store.load();

    let columns: Value =
        serde_json::from_str(&fs::read_to_string(store.columns_path()).unwrap()).unwrap();
    let data_columns = columns["data_columns"].as_array().unwrap();
    assert_eq!(data_columns.len(), 14);
    assert_eq!(data_columns[0], "total_sqft");
    assert_eq!(data_columns[1], "bath");
    assert_eq!(data_columns[2], "bhk");
    assert!(data_columns[3..].iter().all(|c| {
        let name = c.as_str().unwrap();
        name == name.to_lowercase()
    }));

    // The repair model is as wide as the manifest it was generated against.
    let model: Value =
        serde_json::from_str(&fs::read_to_string(store.model_path()).unwrap()).unwrap();
    assert_eq!(model["coefficients"].as_array().unwrap().len(), 14);
}

#[test]
fn corrupt_artifacts_are_rebuilt_on_load() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    fs::write(store.columns_path(), "{not json").unwrap();
    fs::write(store.model_path(), "garbage").unwrap();

    store.load();
    assert_eq!(store.locations().len(), 11);

    let columns: Value =
        serde_json::from_str(&fs::read_to_string(store.columns_path()).unwrap()).unwrap();
    assert_eq!(columns["data_columns"].as_array().unwrap().len(), 14);
    let model: Value =
        serde_json::from_str(&fs::read_to_string(store.model_path()).unwrap()).unwrap();
    assert!(model["coefficients"].is_array());
}

#[test]
fn valid_manifest_round_trips_unchanged() {
    let dir = TempDir::new().unwrap();
    let manifest = r#"{"data_columns":["total_sqft","bath","bhk","hsr layout","mg road"]}"#;
    let store = ArtifactStore::new(dir.path());
    fs::write(store.columns_path(), manifest).unwrap();

    store.load();
    assert_eq!(store.locations(), ["hsr layout", "mg road"]);
    // A valid manifest is never rewritten.
    assert_eq!(fs::read_to_string(store.columns_path()).unwrap(), manifest);

    let reloaded = ArtifactStore::new(dir.path());
    reloaded.load();
    assert_eq!(reloaded.locations(), store.locations());
}

#[test]
fn repair_model_width_follows_the_manifest() {
    let dir = TempDir::new().unwrap();
    let store = ArtifactStore::new(dir.path());
    fs::write(
        store.columns_path(),
        r#"{"data_columns":["total_sqft","bath","bhk","whitefield","koramangala"]}"#,
    )
    .unwrap();

    store.load();
    let model: Value =
        serde_json::from_str(&fs::read_to_string(store.model_path()).unwrap()).unwrap();
    assert_eq!(model["coefficients"].as_array().unwrap().len(), 5);
}

#[test]
fn concurrent_first_loads_leave_one_complete_document() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(ArtifactStore::new(dir.path()));

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                if i % 2 == 0 {
                    store.load();
                } else {
                    store.ensure_loaded();
                }
                store.locations()
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap().len(), 11);
    }

    let columns: Value =
        serde_json::from_str(&fs::read_to_string(store.columns_path()).unwrap()).unwrap();
    assert_eq!(columns["data_columns"].as_array().unwrap().len(), 14);
    let model: Value =
        serde_json::from_str(&fs::read_to_string(store.model_path()).unwrap()).unwrap();
    assert!(model["coefficients"].is_array());
}
