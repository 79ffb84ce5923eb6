use std::fs;

use assert_matches::assert_matches;

use sheddome_atlas::config::{Config, ConfigLoader, DEFAULT_ENDPOINT};
use sheddome_atlas::error::SheddomeError;
use sheddome_atlas::resolver::resolve;

const EXTRA_RECORDS: &str = r#"[{
    "name": "Tumor necrosis factor",
    "geneSymbol": "TNF",
    "uniprotId": "p01375",
    "role": "Substrate",
    "length": 233,
    "domains": [
        {"name": "Cytoplasmic", "start": 1, "end": 35, "type": "Intracellular"},
        {"name": "Transmembrane", "start": 36, "end": 56, "type": "Transmembrane"},
        {"name": "Extracellular", "start": 57, "end": 233, "type": "Extracellular"}
    ],
    "cleavageSites": [{"position": 76, "protease": "ADAM17", "evidence": "Verified"}]
}]"#;

#[test]
fn explicit_config_is_loaded() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheddome.json");
    fs::write(
        &path,
        r#"{"schema_version": 2, "collaborator": {"enabled": true, "model": "gemini-pro", "timeout_secs": 5}}"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.schema_version, 2);
    assert!(resolved.collaborator.enabled);
    assert_eq!(resolved.collaborator.model, "gemini-pro");
    assert_eq!(resolved.collaborator.timeout_secs, 5);
    assert_eq!(resolved.collaborator.endpoint, DEFAULT_ENDPOINT);
    assert_eq!(resolved.collaborator.api_key_env, "API_KEY");
}

#[test]
fn curated_records_extend_builtin_store() {
    let dir = tempfile::tempdir().unwrap();
    let records = dir.path().join("records.json");
    fs::write(&records, EXTRA_RECORDS).unwrap();
    let config_path = dir.path().join("sheddome.json");
    fs::write(
        &config_path,
        serde_json::json!({ "curated_records": records.to_str().unwrap() }).to_string(),
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(config_path.to_str()).unwrap();
    let store = resolved.curated_store().unwrap();
    assert_eq!(store.len(), 3);
    let tnf = resolve(&store, "P01375").unwrap();
    assert_eq!(tnf.uniprot_id.as_deref(), Some("P01375"));
    assert_eq!(tnf.domains.len(), 3);
    assert!(resolve(&store, "ace2").is_ok());
}

#[test]
fn invalid_accession_in_curated_records() {
    let dir = tempfile::tempdir().unwrap();
    let records = dir.path().join("records.json");
    fs::write(&records, EXTRA_RECORDS.replace("p01375", "not-an-id")).unwrap();

    let resolved = ConfigLoader::resolve_config(Config {
        curated_records: Some(camino::Utf8PathBuf::from_path_buf(records).unwrap()),
        ..Default::default()
    })
    .unwrap();
    assert_matches!(
        resolved.curated_store(),
        Err(SheddomeError::InvalidUniprotId(id)) if id == "not-an-id"
    );
}

#[test]
fn missing_explicit_config_is_an_error() {
    let err = ConfigLoader::resolve(Some("/nonexistent/sheddome.json")).unwrap_err();
    assert_matches!(err, SheddomeError::ConfigRead(_));
}

#[test]
fn malformed_config_is_a_parse_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheddome.json");
    fs::write(&path, "{ not json").unwrap();
    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(SheddomeError::ConfigParse(_))
    );
}

#[test]
fn zero_timeout_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sheddome.json");
    fs::write(&path, r#"{"collaborator": {"timeout_secs": 0}}"#).unwrap();
    assert_matches!(
        ConfigLoader::resolve(path.to_str()),
        Err(SheddomeError::ConfigParse(_))
    );
}
