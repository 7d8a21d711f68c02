use recapd::application::ports::SettingsProvider;
use recapd::infrastructure::persistence::JsonSettingsStore;

#[tokio::test]
async fn given_missing_file_when_loading_then_defaults_and_file_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    let store = JsonSettingsStore::new(path.clone()).unwrap();

    let settings = store.load().await;

    assert_eq!(settings.model, "gemini-2.5-flash");
    assert_eq!(settings.max_duration_seconds, 3600);
    assert!(settings.api_key.is_empty());
    assert!(!settings.transcription_prompt.is_empty());
    assert!(path.exists(), "defaults should be written for operators to edit");
}

#[tokio::test]
async fn given_saved_settings_when_loading_then_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonSettingsStore::new(dir.path().join("settings.json")).unwrap();

    let mut settings = store.load().await;
    settings.model = "gemini-exp".to_string();
    settings.max_duration_seconds = 900;
    store.save(&settings).await.unwrap();

    let reloaded = store.load().await;
    assert_eq!(reloaded.model, "gemini-exp");
    assert_eq!(reloaded.max_duration_seconds, 900);
}

#[tokio::test]
async fn given_numeric_string_threshold_when_loading_then_parsed_into_number() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    tokio::fs::write(&path, br#"{"max_duration_seconds": "1800"}"#)
        .await
        .unwrap();
    let store = JsonSettingsStore::new(path).unwrap();

    let settings = store.load().await;

    assert_eq!(settings.max_duration_seconds, 1800);
}

#[tokio::test]
async fn given_invalid_threshold_when_loading_then_falls_back_to_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    tokio::fs::write(&path, br#"{"max_duration_seconds": [1, 2]}"#)
        .await
        .unwrap();
    let store = JsonSettingsStore::new(path).unwrap();

    let settings = store.load().await;

    assert_eq!(settings.max_duration_seconds, 3600);
}

#[tokio::test]
async fn given_corrupt_file_when_loading_then_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    tokio::fs::write(&path, b"not even json").await.unwrap();
    let store = JsonSettingsStore::new(path).unwrap();

    let settings = store.load().await;

    assert_eq!(settings.model, "gemini-2.5-flash");
    assert_eq!(settings.max_duration_seconds, 3600);
}

#[tokio::test]
async fn given_partial_file_when_loading_then_missing_fields_default() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("settings.json");
    tokio::fs::write(&path, br#"{"model": "gemini-other"}"#)
        .await
        .unwrap();
    let store = JsonSettingsStore::new(path).unwrap();

    let settings = store.load().await;

    assert_eq!(settings.model, "gemini-other");
    assert_eq!(settings.max_duration_seconds, 3600);
    assert!(!settings.summary_prompt.is_empty());
}

#[tokio::test]
async fn given_snapshot_when_taken_then_threshold_has_numeric_type() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonSettingsStore::new(dir.path().join("settings.json")).unwrap();

    let mut settings = store.load().await;
    settings.max_duration_seconds = 900;
    store.save(&settings).await.unwrap();

    let snapshot = store.snapshot().await.unwrap();

    assert_eq!(snapshot.max_chunk_secs, 900.0);
    assert_eq!(snapshot.model, "gemini-2.5-flash");
}
