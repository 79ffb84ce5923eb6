use assert_matches::assert_matches;

use sheddome_atlas::domain::ProteinRecord;
use sheddome_atlas::error::SheddomeError;
use sheddome_atlas::resolver::resolve;
use sheddome_atlas::store::{CuratedStore, RecordStore};

#[test]
fn every_curated_key_resolves_in_any_case() {
    let store = CuratedStore::builtin();
    for record in store.records() {
        let mut keys = vec![record.name.clone(), record.gene_symbol.clone()];
        keys.extend(record.uniprot_id.clone());
        for key in keys {
            for query in [key.clone(), key.to_lowercase(), key.to_uppercase()] {
                let found = resolve(&store, &query).unwrap();
                assert_eq!(found, record, "query {query:?}");
            }
        }
    }
}

#[test]
fn surrounding_whitespace_is_ignored() {
    let store = CuratedStore::builtin();
    let found = resolve(&store, "  q9byf1 \n").unwrap();
    assert_eq!(found.gene_symbol, "ACE2");
}

#[test]
fn unknown_query_keeps_typed_text() {
    let store = CuratedStore::builtin();
    let err = resolve(&store, " Nonexistent-XYZ ").unwrap_err();
    assert_matches!(err, SheddomeError::NotFound(query) if query == " Nonexistent-XYZ ");
}

#[test]
fn partial_matches_do_not_resolve() {
    let store = CuratedStore::builtin();
    assert_matches!(resolve(&store, "ACE"), Err(SheddomeError::NotFound(_)));
    assert_matches!(resolve(&store, "Angiotensin"), Err(SheddomeError::NotFound(_)));
    assert_matches!(resolve(&store, "   "), Err(SheddomeError::NotFound(_)));
}

struct SingleRecordStore {
    record: ProteinRecord,
    key: String,
}

impl RecordStore for SingleRecordStore {
    fn find_by_key(&self, key: &str) -> Option<&ProteinRecord> {
        (key == self.key).then_some(&self.record)
    }
}

#[test]
fn resolver_works_over_any_store() {
    let record = CuratedStore::builtin().records()[1].clone();
    let store = SingleRecordStore {
        record,
        key: "cdcp1".to_string(),
    };
    let found = resolve(&store, "CDCP1").unwrap();
    assert_eq!(found.uniprot_id.as_deref(), Some("Q9H5V8"));
    assert_matches!(resolve(&store, "ACE2"), Err(SheddomeError::NotFound(_)));
}
