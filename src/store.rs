use std::fs;

use camino::Utf8Path;

use crate::domain::{
    CleavageSite, DataSources, Domain, Location, Peptide, ProteinRecord, Role, UniprotId,
};
use crate::error::SheddomeError;

/// Read-only repository of curated protein records.
pub trait RecordStore: Send + Sync {
    /// First record whose name, gene symbol or UniProt accession equals `key` after
    /// lower-casing. `key` is expected to be trimmed and lower-cased already.
    fn find_by_key(&self, key: &str) -> Option<&ProteinRecord>;
}

#[derive(Debug, Clone)]
pub struct CuratedStore {
    records: Vec<ProteinRecord>,
}

impl CuratedStore {
    pub fn builtin() -> Self {
        Self {
            records: vec![ace2(), cdcp1()],
        }
    }

    pub fn from_records(records: Vec<ProteinRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ProteinRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Appends records from a JSON array file. Records keep file order after the built-ins.
    pub fn extend_from_file(&mut self, path: &Utf8Path) -> Result<usize, SheddomeError> {
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| SheddomeError::Filesystem(format!("read {path}: {err}")))?;
        let records = parse_records(&content)?;
        let added = records.len();
        tracing::debug!(path = %path, added, "loaded curated records");
        self.records.extend(records);
        Ok(added)
    }
}

impl Default for CuratedStore {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RecordStore for CuratedStore {
    fn find_by_key(&self, key: &str) -> Option<&ProteinRecord> {
        self.records.iter().find(|record| {
            record
                .lookup_keys()
                .any(|candidate| candidate.to_lowercase() == key)
        })
    }
}

pub fn parse_records(content: &str) -> Result<Vec<ProteinRecord>, SheddomeError> {
    let mut records: Vec<ProteinRecord> = serde_json::from_str(content)
        .map_err(|err| SheddomeError::ConfigParse(err.to_string()))?;
    for record in &mut records {
        if let Some(accession) = record.uniprot_id.as_deref() {
            let id: UniprotId = accession.parse()?;
            record.uniprot_id = Some(id.as_str().to_string());
        }
    }
    Ok(records)
}

fn curated_sources() -> DataSources {
    DataSources::new(
        "Curated Local Database",
        "Curated Local Database",
        "Literature Review / Verified Exp.",
    )
}

fn domain(name: &str, start: u32, end: u32, kind: Location) -> Domain {
    Domain {
        name: name.to_string(),
        start,
        end,
        kind,
    }
}

fn peptide(
    sequence: &str,
    (start, end): (u32, u32),
    log2_fold_change: f64,
    pvalue: f64,
    intensity: f64,
    location: Location,
) -> Peptide {
    Peptide {
        sequence: sequence.to_string(),
        start,
        end,
        log2_fold_change,
        pvalue,
        intensity,
        location,
    }
}

fn cleavage(position: u32, protease: &str, evidence: &str) -> CleavageSite {
    CleavageSite {
        position,
        protease: protease.to_string(),
        evidence: evidence.to_string(),
        sequence_context: None,
    }
}

fn ace2() -> ProteinRecord {
    ProteinRecord {
        name: "Angiotensin-converting enzyme 2".to_string(),
        gene_symbol: "ACE2".to_string(),
        uniprot_id: Some("Q9BYF1".to_string()),
        role: Role::Substrate,
        known_substrates: None,
        length: 805,
        description: "Verified local record: Essential counter-regulatory carboxypeptidase. \
                      Known substrate of ADAM17 and TMPRSS2."
            .to_string(),
        shedding_score: 9.5,
        fluid_ecto_abundance: 15_000_000.0,
        tissue_abundance: 5_000_000.0,
        ecto_cto_ratio: 22.0,
        domains: vec![
            domain("Signal Peptide", 1, 17, Location::Extracellular),
            domain("Ectodomain", 18, 740, Location::Extracellular),
            domain("Transmembrane", 741, 761, Location::Transmembrane),
            domain("Cytoplasmic Tail", 762, 805, Location::Intracellular),
        ],
        peptides: vec![
            peptide(
                "STIEEQAKTFLDKFNHEAEDLFYQSS",
                (19, 45),
                4.5,
                0.0001,
                900_000.0,
                Location::Extracellular,
            ),
            peptide(
                "IVSLCTCVFAA",
                (745, 755),
                0.1,
                0.5,
                15_000.0,
                Location::Transmembrane,
            ),
            peptide(
                "KKKNKARSGEN",
                (765, 775),
                -2.1,
                0.01,
                500.0,
                Location::Intracellular,
            ),
        ],
        cleavage_sites: vec![cleavage(740, "ADAM17", "Verified (PMID: 15194784)")],
        data_sources: curated_sources(),
    }
}

fn cdcp1() -> ProteinRecord {
    ProteinRecord {
        name: "CUB domain-containing protein 1".to_string(),
        gene_symbol: "CDCP1".to_string(),
        uniprot_id: Some("Q9H5V8".to_string()),
        role: Role::Substrate,
        known_substrates: None,
        length: 836,
        description: "Verified local record: Essential counter-regulatory carboxypeptidase. \
                      Known substrate of TMPRSS4."
            .to_string(),
        shedding_score: 9.5,
        fluid_ecto_abundance: 15_000_000.0,
        tissue_abundance: 5_000_000.0,
        ecto_cto_ratio: 22.0,
        domains: vec![
            domain("Signal Peptide", 1, 29, Location::Extracellular),
            domain("Ectodomain", 30, 667, Location::Extracellular),
            domain("Transmembrane", 668, 688, Location::Transmembrane),
        ],
        peptides: Vec::new(),
        cleavage_sites: vec![cleavage(368, "TMPRSS4", "Verified (PMID: 20551327)")],
        data_sources: curated_sources(),
    }
}
