use std::fs;
use std::path::Path;

use figment::providers::{Format, Toml};
use figment::Figment;
use tempfile::TempDir;

use askgita_core::config::Config;
use askgita_core::types::MatchPolicy;
use askgita_core::{ChunkStore, Error};

#[test]
fn chunk_store_loads_json_array_in_order() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("chunks.json");
    fs::write(&path, r#"["first verse", "second verse", "third verse"]"#).unwrap();

    let store = ChunkStore::load(&path).expect("load");
    assert_eq!(store.len(), 3);
    assert_eq!(store.get(0), Some("first verse"));
    assert_eq!(store.get(2), Some("third verse"));
    assert_eq!(store.get(3), None, "ids past the end do not resolve");
    assert_eq!(store.fingerprint().len(), 64, "blake3 hex digest");
}

#[test]
fn chunk_store_fingerprint_tracks_content() {
    let tmp = TempDir::new().unwrap();
    let a = tmp.path().join("a.json");
    let b = tmp.path().join("b.json");
    fs::write(&a, r#"["alpha"]"#).unwrap();
    fs::write(&b, r#"["bravo"]"#).unwrap();
    let fa = ChunkStore::load(&a).unwrap();
    let fa2 = ChunkStore::load(&a).unwrap();
    let fb = ChunkStore::load(&b).unwrap();
    assert_eq!(fa.fingerprint(), fa2.fingerprint());
    assert_ne!(fa.fingerprint(), fb.fingerprint());
}

#[test]
fn missing_chunk_store_is_index_not_loaded() {
    let err = ChunkStore::load(Path::new("/definitely/not/here.json")).unwrap_err();
    assert!(matches!(err, Error::IndexNotLoaded(_)), "got {err:?}");
}

#[test]
fn malformed_chunk_store_is_index_not_loaded() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("chunks.json");
    fs::write(&path, r#"{"not": "an array"}"#).unwrap();
    let err = ChunkStore::load(&path).unwrap_err();
    assert!(matches!(err, Error::IndexNotLoaded(_)), "got {err:?}");
}

#[test]
fn settings_defaults_apply_to_missing_sections() {
    let figment = Figment::new().merge(Toml::string(
        r#"
        [llm]
        model = "gpt-4o-mini"
        "#,
    ));
    let settings = Config::from_figment(figment, Path::new("/srv/gita")).settings().expect("settings");
    assert_eq!(settings.llm.model, "gpt-4o-mini");
    assert_eq!(settings.corpus.table, "gita_chunks");
    assert_eq!(settings.embedding.max_len, 256);
    assert_eq!(settings.intent.match_policy, MatchPolicy::Exact);
    assert_eq!(settings.chunks_path(), Path::new("/srv/gita/data/gita_chunks.json"));
}

#[test]
fn settings_parse_contains_policy_and_reject_empty_model() {
    let figment = Figment::new().merge(Toml::string(
        r#"
        [intent]
        match_policy = "contains"
        "#,
    ));
    let settings = Config::from_figment(figment, Path::new(".")).settings().unwrap();
    assert_eq!(settings.intent.match_policy, MatchPolicy::Contains);

    let figment = Figment::new().merge(Toml::string("[llm]\nmodel = \"\"\n"));
    let err = Config::from_figment(figment, Path::new(".")).settings().unwrap_err();
    assert!(matches!(err, Error::InvalidConfig(_)));
}

#[test]
fn config_get_reads_nested_keys() {
    let figment = Figment::new().merge(Toml::string("[corpus]\ntable = \"verses\"\n"));
    let config = Config::from_figment(figment, Path::new("."));
    let table: String = config.get("corpus.table").unwrap();
    assert_eq!(table, "verses");
    assert!(config.get::<String>("corpus.nope").is_err());
}
