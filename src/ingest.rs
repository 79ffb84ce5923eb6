use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::domain::{
    DataSources, Location, PLACEHOLDER_PVALUE, PartialProteinRecord, Peptide, UploadFormat,
};
use crate::error::SheddomeError;
use crate::metrics::log2_fold_change;

/// Neutral shedding score given to CSV uploads until they are annotated.
pub const PLACEHOLDER_SHEDDING_SCORE: f64 = 5.0;
pub const PLACEHOLDER_ECTO_CTO_RATIO: f64 = 1.0;
pub const DEFAULT_POSITION: u32 = 0;
pub const DEFAULT_INTENSITY: f64 = 1.0;

const UNKNOWN_PROTEIN_NAME: &str = "Unknown Protein";
const UNKNOWN_GENE_SYMBOL: &str = "Unknown";

#[derive(Debug, Clone)]
pub struct ParsedUpload {
    pub record: PartialProteinRecord,
    pub needs_annotation: bool,
    /// Data rows dropped for being short or belonging to another protein.
    pub skipped_rows: usize,
}

pub fn parse(raw: &str, format: UploadFormat) -> Result<ParsedUpload, SheddomeError> {
    match format {
        UploadFormat::Json => parse_json(raw),
        UploadFormat::Csv => parse_csv(raw),
    }
}

pub fn parse_json(raw: &str) -> Result<ParsedUpload, SheddomeError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| SheddomeError::MalformedJson(err.to_string()))?;
    let object = value
        .as_object()
        .ok_or_else(|| SheddomeError::InvalidSchema("expected a JSON object".to_string()))?;

    let has_name = object
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.is_empty());
    if !has_name {
        return Err(SheddomeError::InvalidSchema(
            "\"name\" must be a non-empty string".to_string(),
        ));
    }
    if !object.get("peptides").is_some_and(Value::is_array) {
        return Err(SheddomeError::InvalidSchema(
            "\"peptides\" must be an array".to_string(),
        ));
    }

    let mut record: PartialProteinRecord = serde_json::from_value(value)
        .map_err(|err| SheddomeError::InvalidSchema(err.to_string()))?;
    let needs_annotation = !record.has_structure();
    record.data_sources.get_or_insert_with(DataSources::user_json);

    tracing::debug!(
        identifier = record.identifier(),
        needs_annotation,
        "parsed JSON upload"
    );
    Ok(ParsedUpload {
        record,
        needs_annotation,
        skipped_rows: 0,
    })
}

/// Semantic role of a CSV column, recognised by header substrings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ColumnRole {
    Identifier,
    Sequence,
    Start,
    End,
    FluidIntensity,
    TissueIntensity,
}

impl ColumnRole {
    pub const ALL: [ColumnRole; 6] = [
        ColumnRole::Identifier,
        ColumnRole::Sequence,
        ColumnRole::Start,
        ColumnRole::End,
        ColumnRole::FluidIntensity,
        ColumnRole::TissueIntensity,
    ];

    fn needles(self) -> &'static [&'static str] {
        match self {
            ColumnRole::Identifier => &["protein", "gene"],
            ColumnRole::Sequence => &["sequence", "peptide"],
            ColumnRole::Start => &["start"],
            ColumnRole::End => &["end"],
            ColumnRole::FluidIntensity => &["fluid", "cond"],
            ColumnRole::TissueIntensity => &["tissue", "control"],
        }
    }

    pub fn is_required(self) -> bool {
        matches!(self, ColumnRole::Sequence | ColumnRole::FluidIntensity)
    }

    pub fn matches(self, header: &str) -> bool {
        let header = header.trim().to_lowercase();
        self.needles().iter().any(|needle| header.contains(needle))
    }
}

impl fmt::Display for ColumnRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRole::Identifier => write!(f, "protein/gene"),
            ColumnRole::Sequence => write!(f, "sequence"),
            ColumnRole::Start => write!(f, "start"),
            ColumnRole::End => write!(f, "end"),
            ColumnRole::FluidIntensity => write!(f, "fluid intensity"),
            ColumnRole::TissueIntensity => write!(f, "tissue intensity"),
        }
    }
}

/// Column index per role. Each role independently takes the first matching header, so
/// one header may serve several roles (`Peptide_Start` is both sequence and start).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ColumnMap {
    pub identifier: Option<usize>,
    pub sequence: Option<usize>,
    pub start: Option<usize>,
    pub end: Option<usize>,
    pub fluid: Option<usize>,
    pub tissue: Option<usize>,
}

impl ColumnMap {
    pub fn classify<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let headers = headers
            .into_iter()
            .map(|header| header.as_ref().to_string())
            .collect::<Vec<_>>();
        let find = |role: ColumnRole| headers.iter().position(|header| role.matches(header));
        Self {
            identifier: find(ColumnRole::Identifier),
            sequence: find(ColumnRole::Sequence),
            start: find(ColumnRole::Start),
            end: find(ColumnRole::End),
            fluid: find(ColumnRole::FluidIntensity),
            tissue: find(ColumnRole::TissueIntensity),
        }
    }

    pub fn get(&self, role: ColumnRole) -> Option<usize> {
        match role {
            ColumnRole::Identifier => self.identifier,
            ColumnRole::Sequence => self.sequence,
            ColumnRole::Start => self.start,
            ColumnRole::End => self.end,
            ColumnRole::FluidIntensity => self.fluid,
            ColumnRole::TissueIntensity => self.tissue,
        }
    }

    pub fn missing_required(&self) -> Vec<ColumnRole> {
        ColumnRole::ALL
            .into_iter()
            .filter(|role| role.is_required() && self.get(*role).is_none())
            .collect()
    }
}

/// A field value that either came from the input or was substituted for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Parsed<T> {
    Value(T),
    Defaulted(T),
}

impl<T: Copy> Parsed<T> {
    pub fn get(&self) -> T {
        match self {
            Parsed::Value(value) | Parsed::Defaulted(value) => *value,
        }
    }

    pub fn is_defaulted(&self) -> bool {
        matches!(self, Parsed::Defaulted(_))
    }
}

/// Residue position. Absent, negative or unparseable cells default to 0;
/// fractional positions such as `20.0` are truncated.
pub fn parse_position(field: Option<&str>) -> Parsed<u32> {
    let Some(text) = field.map(str::trim) else {
        return Parsed::Defaulted(DEFAULT_POSITION);
    };
    if let Ok(value) = text.parse::<u32>() {
        return Parsed::Value(value);
    }
    match text.parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 0.0 && value <= f64::from(u32::MAX) => {
            Parsed::Value(value.trunc() as u32)
        }
        _ => Parsed::Defaulted(DEFAULT_POSITION),
    }
}

/// Peptide intensity. Absent or unparseable cells default to 1; an explicit zero is kept.
pub fn parse_intensity(field: Option<&str>) -> Parsed<f64> {
    match field.map(str::trim).map(str::parse::<f64>) {
        Some(Ok(value)) if !value.is_nan() => Parsed::Value(value),
        _ => Parsed::Defaulted(DEFAULT_INTENSITY),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CsvRow {
    pub identifier: Option<String>,
    pub sequence: String,
    pub start: Parsed<u32>,
    pub end: Parsed<u32>,
    pub fluid: Parsed<f64>,
    pub tissue: Parsed<f64>,
}

impl CsvRow {
    pub fn from_fields(columns: &ColumnMap, fields: &csv::StringRecord) -> Self {
        let cell = |index: Option<usize>| index.and_then(|index| fields.get(index));
        Self {
            identifier: cell(columns.identifier).map(str::to_string),
            sequence: cell(columns.sequence).unwrap_or_default().to_string(),
            start: parse_position(cell(columns.start)),
            end: parse_position(cell(columns.end)),
            fluid: parse_intensity(cell(columns.fluid)),
            tissue: parse_intensity(cell(columns.tissue)),
        }
    }

    pub fn to_peptide(&self) -> Peptide {
        let fluid = self.fluid.get();
        Peptide {
            sequence: self.sequence.clone(),
            start: self.start.get(),
            end: self.end.get(),
            log2_fold_change: log2_fold_change(fluid, self.tissue.get()),
            pvalue: PLACEHOLDER_PVALUE,
            intensity: fluid,
            location: Location::Extracellular,
        }
    }
}

pub fn parse_csv(raw: &str) -> Result<ParsedUpload, SheddomeError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(raw.trim().as_bytes());

    let mut lines = Vec::new();
    for (index, result) in reader.records().enumerate() {
        match result {
            Ok(fields) => lines.push(fields),
            Err(err) => tracing::warn!(line = index + 1, %err, "unreadable CSV line"),
        }
    }
    if lines.len() < 2 {
        return Err(SheddomeError::EmptyOrHeaderOnly);
    }

    let header = &lines[0];
    let columns = ColumnMap::classify(header.iter());
    let missing = columns.missing_required();
    if !missing.is_empty() {
        return Err(SheddomeError::MissingRequiredColumns(missing));
    }
    tracing::debug!(?columns, "classified CSV header");

    let width = header.len();
    let mut protein: Option<String> = None;
    let mut peptides = Vec::new();
    let mut skipped_rows = 0usize;
    let mut total_fluid = 0.0;
    let mut total_tissue = 0.0;

    for (offset, fields) in lines.iter().enumerate().skip(1) {
        if fields.len() < width {
            tracing::debug!(line = offset + 1, "skipping short CSV row");
            skipped_rows += 1;
            continue;
        }
        let row = CsvRow::from_fields(&columns, fields);
        if let Some(identifier) = row.identifier.as_deref() {
            match protein.as_deref() {
                None => protein = Some(identifier.to_string()),
                Some(fixed) if fixed != identifier => {
                    tracing::debug!(line = offset + 1, identifier, "skipping row for another protein");
                    skipped_rows += 1;
                    continue;
                }
                Some(_) => {}
            }
        }

        total_fluid += row.fluid.get();
        total_tissue += row.tissue.get();
        peptides.push(row.to_peptide());
    }

    let (name, gene_symbol) = match protein {
        Some(identifier) => (identifier.clone(), identifier),
        None => (
            UNKNOWN_PROTEIN_NAME.to_string(),
            UNKNOWN_GENE_SYMBOL.to_string(),
        ),
    };
    tracing::info!(
        gene = %gene_symbol,
        peptides = peptides.len(),
        skipped_rows,
        "parsed CSV upload"
    );

    let record = PartialProteinRecord {
        name: Some(name),
        gene_symbol: Some(gene_symbol),
        peptides: Some(peptides),
        fluid_ecto_abundance: Some(total_fluid),
        tissue_abundance: Some(total_tissue),
        shedding_score: Some(PLACEHOLDER_SHEDDING_SCORE),
        ecto_cto_ratio: Some(PLACEHOLDER_ECTO_CTO_RATIO),
        domains: Some(Vec::new()),
        data_sources: Some(DataSources::csv_import()),
        ..Default::default()
    };
    Ok(ParsedUpload {
        record,
        needs_annotation: true,
        skipped_rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_zero_intensity_is_not_defaulted() {
        assert_eq!(parse_intensity(Some("0")), Parsed::Value(0.0));
        assert_eq!(parse_intensity(Some("n/a")), Parsed::Defaulted(1.0));
        assert_eq!(parse_intensity(None), Parsed::Defaulted(1.0));
    }

    #[test]
    fn positions_default_to_zero() {
        assert_eq!(parse_position(Some("20")), Parsed::Value(20));
        assert_eq!(parse_position(Some("20.0")), Parsed::Value(20));
        assert_eq!(parse_position(Some("")), Parsed::Defaulted(0));
        assert_eq!(parse_position(Some("-4")), Parsed::Defaulted(0));
        assert!(parse_position(None).is_defaulted());
    }

    #[test]
    fn header_roles_are_independent() {
        let columns = ColumnMap::classify(["Peptide_Start", "Gene", "Cond_A"]);
        assert_eq!(columns.sequence, Some(0));
        assert_eq!(columns.start, Some(0));
        assert_eq!(columns.identifier, Some(1));
        assert_eq!(columns.fluid, Some(2));
        assert_eq!(columns.tissue, None);
        assert!(columns.missing_required().is_empty());
    }
}
