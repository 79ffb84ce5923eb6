use std::fs;
use std::time::Duration;

use camino::Utf8Path;
use serde::Serialize;

use crate::annotation::{AnnotationClient, GenerationClient};
use crate::atlas::{AtlasPoint, UploadedDataset, build_points};
use crate::demo::DemoKind;
use crate::domain::{ProteinRecord, Role, UploadFormat};
use crate::error::SheddomeError;
use crate::ingest;
use crate::merge::{AnnotationMerger, AnnotationSource};
use crate::metrics::MetricsSummary;
use crate::resolver;
use crate::store::{CuratedStore, RecordStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    /// Straight from the curated store.
    Curated,
    /// Uploaded peptides mapped onto a curated record.
    Mapped,
    /// Uploaded peptides mapped onto externally supplied annotations.
    Annotated,
    /// A complete upload shown as-is.
    Uploaded,
    /// Produced by the generation service.
    Generated,
}

impl Provenance {
    pub fn is_verified(self) -> bool {
        !matches!(self, Provenance::Annotated | Provenance::Generated)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub record: ProteinRecord,
    pub interpretation: String,
    pub provenance: Provenance,
    pub verified: bool,
    pub analyzed_at: String,
}

impl AnalysisResult {
    fn new(record: ProteinRecord, interpretation: String, provenance: Provenance) -> Self {
        Self {
            record,
            interpretation,
            provenance,
            verified: provenance.is_verified(),
            analyzed_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadResult {
    #[serde(flatten)]
    pub analysis: AnalysisResult,
    pub needs_annotation: bool,
    pub skipped_rows: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListResult {
    pub records: Vec<ListEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    pub gene_symbol: String,
    pub name: String,
    pub uniprot_id: Option<String>,
    pub role: Role,
}

#[derive(Debug, Clone, Serialize)]
pub struct AtlasResult {
    pub points: Vec<AtlasPoint>,
    pub candidates: usize,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

fn report(sink: &dyn ProgressSink, message: String) {
    sink.event(ProgressEvent {
        message,
        elapsed: None,
    });
}

pub const PASS_THROUGH_INTERPRETATION: &str =
    "Data uploaded by user. Interpretation requires external analysis.";

/// Entry point for searches and uploads. One request at a time; nothing is kept between calls.
#[derive(Clone)]
pub struct App<S: RecordStore, A: AnnotationClient, G: GenerationClient> {
    store: S,
    annotator: A,
    generator: G,
}

impl<S: RecordStore, A: AnnotationClient, G: GenerationClient> App<S, A, G> {
    pub fn new(store: S, annotator: A, generator: G) -> Self {
        Self {
            store,
            annotator,
            generator,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn search(
        &self,
        query: &str,
        sink: &dyn ProgressSink,
    ) -> Result<AnalysisResult, SheddomeError> {
        report(sink, format!("phase=Resolve; looking up {}", query.trim()));
        match resolver::resolve(&self.store, query) {
            Ok(record) => {
                let interpretation = format!(
                    "Curated record for {} ({}). {}",
                    record.gene_symbol, record.role, record.description
                );
                Ok(AnalysisResult::new(
                    record.clone(),
                    interpretation,
                    Provenance::Curated,
                ))
            }
            Err(SheddomeError::NotFound(_)) => self.generate(query, sink),
            Err(err) => Err(err),
        }
    }

    fn generate(
        &self,
        query: &str,
        sink: &dyn ProgressSink,
    ) -> Result<AnalysisResult, SheddomeError> {
        let identifier = query.trim();
        report(sink, "phase=Generate; requesting generated record".to_string());
        let start = std::time::Instant::now();
        match self.generator.generate(identifier) {
            Ok(generated) => {
                sink.event(ProgressEvent {
                    message: "phase=Generate; generated record received".to_string(),
                    elapsed: Some(start.elapsed()),
                });
                tracing::info!(identifier, "using generated record");
                let mut record = generated.record;
                record.known_substrates = record.role.retain_substrates(record.known_substrates);
                Ok(AnalysisResult::new(
                    record,
                    generated.interpretation,
                    Provenance::Generated,
                ))
            }
            Err(SheddomeError::CollaboratorDisabled) => {
                Err(SheddomeError::NotFound(query.to_string()))
            }
            Err(err) => {
                tracing::warn!(identifier, error = %err, "record generation failed");
                Err(SheddomeError::NotFound(query.to_string()))
            }
        }
    }

    pub fn upload(
        &self,
        raw: &str,
        format: UploadFormat,
        sink: &dyn ProgressSink,
    ) -> Result<UploadResult, SheddomeError> {
        report(sink, format!("phase=Parse; reading {format} upload"));
        let parsed = ingest::parse(raw, format)?;

        let analysis = if parsed.needs_annotation {
            report(
                sink,
                format!(
                    "phase=Annotate; mapping {} onto structural annotations",
                    parsed.record.identifier()
                ),
            );
            let merged = AnnotationMerger::new(&self.store, &self.annotator).merge(parsed.record)?;
            let provenance = match merged.source {
                AnnotationSource::KnowledgeBase => Provenance::Mapped,
                AnnotationSource::External => Provenance::Annotated,
            };
            AnalysisResult::new(merged.record, merged.interpretation, provenance)
        } else {
            AnalysisResult::new(
                parsed.record.into_record(),
                PASS_THROUGH_INTERPRETATION.to_string(),
                Provenance::Uploaded,
            )
        };

        Ok(UploadResult {
            analysis,
            needs_annotation: parsed.needs_annotation,
            skipped_rows: parsed.skipped_rows,
        })
    }

    /// Reads an upload from disk. The format follows the extension unless given.
    pub fn upload_file(
        &self,
        path: &Utf8Path,
        format: Option<UploadFormat>,
        sink: &dyn ProgressSink,
    ) -> Result<UploadResult, SheddomeError> {
        let format = match format {
            Some(format) => format,
            None => UploadFormat::from_path(path)?,
        };
        let raw = fs::read_to_string(path.as_std_path())
            .map_err(|err| SheddomeError::Filesystem(format!("read {path}: {err}")))?;
        self.upload(&raw, format, sink)
    }

    pub fn demo(&self, kind: DemoKind, sink: &dyn ProgressSink) -> Result<UploadResult, SheddomeError> {
        let (raw, format) = kind.payload();
        self.upload(raw, format, sink)
    }

    pub fn metrics(&self, query: &str) -> Result<MetricsSummary, SheddomeError> {
        let record = resolver::resolve(&self.store, query)?;
        Ok(MetricsSummary::from_record(record))
    }
}

pub fn list_records(store: &CuratedStore) -> ListResult {
    ListResult {
        records: store
            .records()
            .iter()
            .map(|record| ListEntry {
                gene_symbol: record.gene_symbol.clone(),
                name: record.name.clone(),
                uniprot_id: record.uniprot_id.clone(),
                role: record.role,
            })
            .collect(),
    }
}

pub fn atlas(fluid: Option<&str>, tissue: Option<&str>) -> Result<AtlasResult, SheddomeError> {
    let fluid = fluid.map(UploadedDataset::from_json).transpose()?;
    let tissue = tissue.map(UploadedDataset::from_json).transpose()?;
    let points = build_points(fluid.as_ref(), tissue.as_ref());
    let candidates = points.iter().filter(|point| point.is_candidate).count();
    Ok(AtlasResult { points, candidates })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::DisabledCollaborator;
    use crate::output::JsonOutput;

    #[test]
    fn demo_json_passes_through() {
        let app = App::new(
            CuratedStore::builtin(),
            DisabledCollaborator,
            DisabledCollaborator,
        );
        let result = app.demo(DemoKind::Json, &JsonOutput).unwrap();
        assert!(!result.needs_annotation);
        assert_eq!(result.analysis.provenance, Provenance::Uploaded);
        assert_eq!(result.analysis.interpretation, PASS_THROUGH_INTERPRETATION);
        assert_eq!(result.analysis.record.domains.len(), 4);
    }
}
