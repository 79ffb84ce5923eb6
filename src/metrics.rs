use serde::Serialize;

use crate::domain::{Location, Peptide, ProteinRecord};
use crate::serde_util::serialize_f64;

/// Plain IEEE division. Zero or negative denominators yield `inf`/`NaN`, never a panic.
pub fn ratio(a: f64, b: f64) -> f64 {
    a / b
}

pub fn log2_fold_change(fluid: f64, tissue: f64) -> f64 {
    ratio(fluid, tissue).log2()
}

pub fn intensity_at(peptides: &[Peptide], location: Location) -> f64 {
    peptides
        .iter()
        .filter(|peptide| peptide.location == location)
        .map(|peptide| peptide.intensity)
        .sum()
}

/// Ectodomain over intracellular peptide intensity.
pub fn peptide_ecto_cyto_ratio(peptides: &[Peptide]) -> f64 {
    ratio(
        intensity_at(peptides, Location::Extracellular),
        intensity_at(peptides, Location::Intracellular),
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LocationCounts {
    pub extracellular: usize,
    pub transmembrane: usize,
    pub intracellular: usize,
}

impl LocationCounts {
    pub fn tally(peptides: &[Peptide]) -> Self {
        let mut counts = Self::default();
        for peptide in peptides {
            match peptide.location {
                Location::Extracellular => counts.extracellular += 1,
                Location::Transmembrane => counts.transmembrane += 1,
                Location::Intracellular => counts.intracellular += 1,
            }
        }
        counts
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSummary {
    pub gene_symbol: String,
    pub shedding_score: f64,
    pub fluid_ecto_abundance: f64,
    pub tissue_abundance: f64,
    pub ecto_cto_ratio: f64,
    #[serde(serialize_with = "serialize_f64")]
    pub fluid_tissue_ratio: f64,
    #[serde(serialize_with = "serialize_f64")]
    pub peptide_ecto_cyto_ratio: f64,
    pub peptide_counts: LocationCounts,
}

impl MetricsSummary {
    pub fn from_record(record: &ProteinRecord) -> Self {
        Self {
            gene_symbol: record.gene_symbol.clone(),
            shedding_score: record.shedding_score,
            fluid_ecto_abundance: record.fluid_ecto_abundance,
            tissue_abundance: record.tissue_abundance,
            ecto_cto_ratio: record.ecto_cto_ratio,
            fluid_tissue_ratio: ratio(record.fluid_ecto_abundance, record.tissue_abundance),
            peptide_ecto_cyto_ratio: peptide_ecto_cyto_ratio(&record.peptides),
            peptide_counts: LocationCounts::tally(&record.peptides),
        }
    }
}
