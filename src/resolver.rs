use crate::domain::ProteinRecord;
use crate::error::SheddomeError;
use crate::store::RecordStore;

pub fn normalize_query(query: &str) -> String {
    query.trim().to_lowercase()
}

/// Exact, case-insensitive lookup by name, gene symbol or UniProt accession.
///
/// The error carries the query as typed so it can be shown back to the user.
pub fn resolve<'s, S>(store: &'s S, query: &str) -> Result<&'s ProteinRecord, SheddomeError>
where
    S: RecordStore + ?Sized,
{
    let key = normalize_query(query);
    if key.is_empty() {
        return Err(SheddomeError::NotFound(query.to_string()));
    }
    match store.find_by_key(&key) {
        Some(record) => {
            tracing::debug!(query, gene = %record.gene_symbol, "resolved curated record");
            Ok(record)
        }
        None => Err(SheddomeError::NotFound(query.to_string())),
    }
}
