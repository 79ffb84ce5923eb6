use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::error::SheddomeError;
use crate::serde_util::serialize_f64;

/// log10 fluid-over-tissue margin above which a protein is flagged as shed.
pub const CANDIDATE_LOG_MARGIN: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DatasetKind {
    Fluid,
    Tissue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AbundanceEntry {
    pub id: String,
    pub abundance: f64,
}

/// Whole-proteome abundance table from one fluid or tissue experiment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadedDataset {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DatasetKind,
    #[serde(default)]
    pub entries: Vec<AbundanceEntry>,
}

impl UploadedDataset {
    pub fn from_json(raw: &str) -> Result<Self, SheddomeError> {
        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|err| SheddomeError::MalformedJson(err.to_string()))?;
        serde_json::from_value(value).map_err(|err| SheddomeError::InvalidSchema(err.to_string()))
    }

    fn abundance_by_id(&self) -> HashMap<&str, f64> {
        self.entries
            .iter()
            .map(|entry| (entry.id.as_str(), entry.abundance))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AtlasPoint {
    pub id: String,
    /// log10 tissue abundance, NaN when the protein was not measured in tissue.
    #[serde(serialize_with = "serialize_f64")]
    pub x: f64,
    /// log10 fluid abundance, NaN when the protein was not measured in fluid.
    #[serde(serialize_with = "serialize_f64")]
    pub y: f64,
    pub is_candidate: bool,
}

impl AtlasPoint {
    fn new(id: &str, fluid: Option<f64>, tissue: Option<f64>) -> Self {
        let x = tissue.map_or(f64::NAN, f64::log10);
        let y = fluid.map_or(f64::NAN, f64::log10);
        Self {
            id: id.to_string(),
            x,
            y,
            is_candidate: y - x > CANDIDATE_LOG_MARGIN,
        }
    }
}

/// Joins the two tables by identifier. Fluid order comes first, then tissue-only proteins.
pub fn build_points(
    fluid: Option<&UploadedDataset>,
    tissue: Option<&UploadedDataset>,
) -> Vec<AtlasPoint> {
    let tissue_by_id = tissue.map(UploadedDataset::abundance_by_id).unwrap_or_default();
    let mut seen = HashSet::new();
    let mut points = Vec::new();

    for entry in fluid.into_iter().flat_map(|dataset| &dataset.entries) {
        seen.insert(entry.id.as_str());
        let tissue_abundance = tissue_by_id.get(entry.id.as_str()).copied();
        points.push(AtlasPoint::new(&entry.id, Some(entry.abundance), tissue_abundance));
    }
    for entry in tissue.into_iter().flat_map(|dataset| &dataset.entries) {
        if seen.insert(entry.id.as_str()) {
            points.push(AtlasPoint::new(&entry.id, None, Some(entry.abundance)));
        }
    }

    let candidates = points.iter().filter(|point| point.is_candidate).count();
    tracing::debug!(points = points.len(), candidates, "built atlas points");
    points
}
