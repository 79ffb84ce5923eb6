use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use camino::Utf8Path;
use clap::ValueEnum;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::SheddomeError;
use crate::serde_util::{
    deserialize_f64, deserialize_lenient_location, deserialize_optional_residue,
    deserialize_residue, serialize_f64,
};

static UNIPROT_ACCESSION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[OPQ][0-9][A-Z0-9]{3}[0-9]|[A-NR-Z][0-9](?:[A-Z][A-Z0-9]{2}[0-9]){1,2})$")
        .expect("UniProt accession pattern is valid")
});

static PMID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"PMID:?\s*(\d+)").expect("PMID pattern is valid"));

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Sheddase,
    Substrate,
    Both,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Role {
    /// Sheddases (and dual-role proteins) are the only records that list known substrates.
    pub fn implies_sheddase(self) -> bool {
        matches!(self, Role::Sheddase | Role::Both)
    }

    /// Drops a substrate list that this role cannot carry.
    pub fn retain_substrates(self, substrates: Option<Vec<String>>) -> Option<Vec<String>> {
        substrates.filter(|_| self.implies_sheddase())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Sheddase => write!(f, "Sheddase"),
            Role::Substrate => write!(f, "Substrate"),
            Role::Both => write!(f, "Both"),
            Role::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Topological region of a membrane protein. Shared by domains (asserted) and peptides (assigned).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    #[default]
    Extracellular,
    Transmembrane,
    Intracellular,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Extracellular => write!(f, "Extracellular"),
            Location::Transmembrane => write!(f, "Transmembrane"),
            Location::Intracellular => write!(f, "Intracellular"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Domain {
    pub name: String,
    #[serde(deserialize_with = "deserialize_residue")]
    pub start: u32,
    #[serde(deserialize_with = "deserialize_residue")]
    pub end: u32,
    #[serde(rename = "type")]
    pub kind: Location,
}

impl Domain {
    pub fn contains(&self, position: u32) -> bool {
        self.start <= position && position <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Peptide {
    pub sequence: String,
    #[serde(deserialize_with = "deserialize_residue")]
    pub start: u32,
    #[serde(deserialize_with = "deserialize_residue")]
    pub end: u32,
    #[serde(
        default = "undefined_fold_change",
        serialize_with = "serialize_f64",
        deserialize_with = "deserialize_f64"
    )]
    pub log2_fold_change: f64,
    #[serde(default = "placeholder_pvalue")]
    pub pvalue: f64,
    #[serde(default)]
    pub intensity: f64,
    #[serde(default, deserialize_with = "deserialize_lenient_location")]
    pub location: Location,
}

/// p-value used when an upload carries no statistics of its own.
pub const PLACEHOLDER_PVALUE: f64 = 0.05;

fn placeholder_pvalue() -> f64 {
    PLACEHOLDER_PVALUE
}

fn undefined_fold_change() -> f64 {
    f64::NAN
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CleavageSite {
    #[serde(deserialize_with = "deserialize_residue")]
    pub position: u32,
    pub protease: String,
    pub evidence: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sequence_context: Option<String>,
}

impl CleavageSite {
    /// PubMed identifier cited in the evidence string, e.g. `Verified (PMID: 15194784)`.
    pub fn pmid(&self) -> Option<&str> {
        PMID.captures(&self.evidence)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSources {
    pub fluid: String,
    pub tissue: String,
    pub method: String,
}

impl DataSources {
    pub fn new(fluid: &str, tissue: &str, method: &str) -> Self {
        Self {
            fluid: fluid.to_string(),
            tissue: tissue.to_string(),
            method: method.to_string(),
        }
    }

    pub fn user_json() -> Self {
        Self::new("User JSON", "User JSON", "Uploaded")
    }

    pub fn csv_import() -> Self {
        Self::new("Experimental Upload", "Experimental Upload", "CSV Import")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProteinRecord {
    pub name: String,
    pub gene_symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniprot_id: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_substrates: Option<Vec<String>>,
    #[serde(deserialize_with = "deserialize_residue")]
    pub length: u32,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub shedding_score: f64,
    #[serde(default)]
    pub fluid_ecto_abundance: f64,
    #[serde(default)]
    pub tissue_abundance: f64,
    #[serde(default)]
    pub ecto_cto_ratio: f64,
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub peptides: Vec<Peptide>,
    #[serde(default)]
    pub cleavage_sites: Vec<CleavageSite>,
    #[serde(default)]
    pub data_sources: DataSources,
}

impl ProteinRecord {
    /// Keys a lookup may match, in precedence order.
    pub fn lookup_keys(&self) -> impl Iterator<Item = &str> {
        [
            Some(self.name.as_str()),
            Some(self.gene_symbol.as_str()),
            self.uniprot_id.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// A record that has not been structurally annotated yet. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialProteinRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gene_symbol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uniprot_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub known_substrates: Option<Vec<String>>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_optional_residue"
    )]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shedding_score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fluid_ecto_abundance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tissue_abundance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecto_cto_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domains: Option<Vec<Domain>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peptides: Option<Vec<Peptide>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cleavage_sites: Option<Vec<CleavageSite>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_sources: Option<DataSources>,
}

impl PartialProteinRecord {
    /// Gene symbol, else name, else the empty string. Blank values fall through.
    pub fn identifier(&self) -> &str {
        [self.gene_symbol.as_deref(), self.name.as_deref()]
            .into_iter()
            .flatten()
            .find(|value| !value.trim().is_empty())
            .unwrap_or("")
    }

    pub fn has_structure(&self) -> bool {
        self.domains.as_ref().is_some_and(|domains| !domains.is_empty())
    }

    /// Completes an already-annotated upload. Absent collections become empty and
    /// absent measurements fall back to zero.
    pub fn into_record(self) -> ProteinRecord {
        let name = self.name.unwrap_or_default();
        let role = self.role.unwrap_or_default();
        ProteinRecord {
            gene_symbol: self.gene_symbol.unwrap_or_else(|| name.clone()),
            name,
            uniprot_id: self.uniprot_id,
            role,
            known_substrates: role.retain_substrates(self.known_substrates),
            length: self.length.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            shedding_score: self.shedding_score.unwrap_or_default(),
            fluid_ecto_abundance: self.fluid_ecto_abundance.unwrap_or_default(),
            tissue_abundance: self.tissue_abundance.unwrap_or_default(),
            ecto_cto_ratio: self.ecto_cto_ratio.unwrap_or_default(),
            domains: self.domains.unwrap_or_default(),
            peptides: self.peptides.unwrap_or_default(),
            cleavage_sites: self.cleavage_sites.unwrap_or_default(),
            data_sources: self.data_sources.unwrap_or_else(DataSources::user_json),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UniprotId(String);

impl UniprotId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UniprotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for UniprotId {
    type Err = SheddomeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_uppercase();
        if !UNIPROT_ACCESSION.is_match(&normalized) {
            return Err(SheddomeError::InvalidUniprotId(value.to_string()));
        }
        Ok(Self(normalized))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UploadFormat {
    Json,
    Csv,
}

impl UploadFormat {
    pub fn from_path(path: &Utf8Path) -> Result<Self, SheddomeError> {
        match path.extension().map(|ext| ext.to_ascii_lowercase()).as_deref() {
            Some("json") => Ok(UploadFormat::Json),
            Some("csv") => Ok(UploadFormat::Csv),
            _ => Err(SheddomeError::UnsupportedFormat(path.to_string())),
        }
    }
}

impl fmt::Display for UploadFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadFormat::Json => write!(f, "json"),
            UploadFormat::Csv => write!(f, "csv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_uniprot_id_valid() {
        let id: UniprotId = "q9byf1".parse().unwrap();
        assert_eq!(id.as_str(), "Q9BYF1");
        let long: UniprotId = "A0A023GPI8".parse().unwrap();
        assert_eq!(long.as_str(), "A0A023GPI8");
    }

    #[test]
    fn parse_uniprot_id_invalid() {
        let err = "ACE2".parse::<UniprotId>().unwrap_err();
        assert_matches!(err, SheddomeError::InvalidUniprotId(_));
    }

    #[test]
    fn partial_identifier_falls_through_blank_gene() {
        let partial = PartialProteinRecord {
            name: Some("CUB domain-containing protein 1".to_string()),
            gene_symbol: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(partial.identifier(), "CUB domain-containing protein 1");
        assert_eq!(PartialProteinRecord::default().identifier(), "");
    }

    #[test]
    fn peptide_defaults_when_fields_absent() {
        let peptide: Peptide =
            serde_json::from_str(r#"{"sequence":"KKK","start":765,"end":775}"#).unwrap();
        assert!(peptide.log2_fold_change.is_nan());
        assert_eq!(peptide.pvalue, PLACEHOLDER_PVALUE);
        assert_eq!(peptide.intensity, 0.0);
        assert_eq!(peptide.location, Location::Extracellular);
    }

    #[test]
    fn null_fold_change_reads_as_nan() {
        let peptide: Peptide = serde_json::from_str(
            r#"{"sequence":"A","start":1,"end":2,"log2FoldChange":null}"#,
        )
        .unwrap();
        assert!(peptide.log2_fold_change.is_nan());
    }

    #[test]
    fn pmid_extraction() {
        let site = CleavageSite {
            position: 740,
            protease: "ADAM17".to_string(),
            evidence: "Verified (PMID: 15194784)".to_string(),
            sequence_context: None,
        };
        assert_eq!(site.pmid(), Some("15194784"));
    }

    #[test]
    fn upload_format_from_extension() {
        assert_eq!(
            UploadFormat::from_path(Utf8Path::new("peptides.CSV")).unwrap(),
            UploadFormat::Csv
        );
        let err = UploadFormat::from_path(Utf8Path::new("peptides.xlsx")).unwrap_err();
        assert_matches!(err, SheddomeError::UnsupportedFormat(_));
    }
}
