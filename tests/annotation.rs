use assert_matches::assert_matches;
use serde_json::{Value, json};

use sheddome_atlas::annotation::{
    AnnotationClient, AnnotationRequest, DisabledCollaborator, GenerationClient,
    SAMPLE_PEPTIDE_COUNT, extract_candidate_text, parse_annotation_payload,
    parse_generation_payload,
};
use sheddome_atlas::demo::DEMO_CSV;
use sheddome_atlas::domain::{Location, PartialProteinRecord, Role};
use sheddome_atlas::error::SheddomeError;
use sheddome_atlas::ingest::parse_csv;

fn fixture(name: &str) -> Value {
    let path = format!("{}/tests/fixtures/{name}", env!("CARGO_MANIFEST_DIR"));
    let content = std::fs::read_to_string(path).unwrap();
    serde_json::from_str(&content).unwrap()
}

#[test]
fn parses_annotation_response() {
    let raw = fixture("gemini_annotation_response.json");
    let text = extract_candidate_text(&raw).unwrap();
    let response = parse_annotation_payload(&text).unwrap();

    assert_eq!(response.interpretation, "ADAM17 is a major sheddase.");
    let annotation = response.annotation;
    assert_eq!(annotation.uniprot_id.as_deref(), Some("P78536"));
    assert_eq!(annotation.length, Some(824));
    assert_eq!(annotation.role, Some(Role::Sheddase));
    assert_eq!(
        annotation.known_substrates,
        Some(vec!["TNF".to_string(), "ACE2".to_string()])
    );
    assert_eq!(annotation.domains.len(), 3);
    assert_eq!(annotation.domains[2].kind, Location::Intracellular);
    assert_eq!(annotation.cleavage_sites[0].pmid(), Some("9034191"));
}

#[test]
fn parses_generation_response() {
    let raw = fixture("gemini_generation_response.json");
    let text = extract_candidate_text(&raw).unwrap();
    let generated = parse_generation_payload(&text).unwrap();

    assert_eq!(generated.interpretation, "APP is shed by alpha-secretase.");
    let record = generated.record;
    assert_eq!(record.gene_symbol, "APP");
    assert_eq!(record.length, 770);
    assert_eq!(record.domains.len(), 3);
    assert_eq!(record.peptides[0].start, 688);
    assert_eq!(record.data_sources.method, "TMT LC-MS/MS");
}

#[test]
fn missing_interpretation_gets_placeholder() {
    let response = parse_annotation_payload(r#"{"metadata": {}}"#).unwrap();
    assert_eq!(response.interpretation, "No interpretation available.");
    assert!(response.annotation.domains.is_empty());
}

#[test]
fn response_without_candidates_is_rejected() {
    let err = extract_candidate_text(&json!({ "candidates": [] })).unwrap_err();
    assert_matches!(err, SheddomeError::CollaboratorResponse(_));
    let err = extract_candidate_text(&json!({ "error": "quota" })).unwrap_err();
    assert_matches!(err, SheddomeError::CollaboratorResponse(_));
}

#[test]
fn non_json_payload_is_rejected() {
    let err = parse_annotation_payload("Sure! Here is the data:").unwrap_err();
    assert_matches!(err, SheddomeError::CollaboratorResponse(_));
    let err = parse_generation_payload(r#"{"data": {"name": "X"}}"#).unwrap_err();
    assert_matches!(err, SheddomeError::CollaboratorResponse(_));
}

#[test]
fn request_samples_leading_peptides() {
    let parsed = parse_csv(DEMO_CSV).unwrap();
    let request = AnnotationRequest::from_partial(&parsed.record);
    assert_eq!(request.identifier, "ACE2");
    assert_eq!(request.sample_peptides.len(), SAMPLE_PEPTIDE_COUNT);
    assert_eq!(request.sample_peptides[0].start, 19);
    assert_eq!(request.sample_peptides[0].end, 45);

    let value = serde_json::to_value(&request).unwrap();
    assert!(value.get("samplePeptides").is_some());

    let empty = AnnotationRequest::from_partial(&PartialProteinRecord::default());
    assert!(empty.sample_peptides.is_empty());
}

#[test]
fn disabled_collaborator_refuses() {
    let request = AnnotationRequest::from_partial(&PartialProteinRecord::default());
    assert_matches!(
        DisabledCollaborator.annotate(&request),
        Err(SheddomeError::CollaboratorDisabled)
    );
    assert_matches!(
        DisabledCollaborator.generate("TNF"),
        Err(SheddomeError::CollaboratorDisabled)
    );
}
