use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

use crate::ingest::ColumnRole;

#[derive(Debug, Error, Diagnostic)]
pub enum SheddomeError {
    #[error("record not found: {0}")]
    #[diagnostic(help("search by protein name, gene symbol or UniProt accession"))]
    NotFound(String),

    #[error("malformed JSON upload: {0}")]
    #[diagnostic(help("the upload must be a single UTF-8 JSON object"))]
    MalformedJson(String),

    #[error("invalid JSON upload: {0}")]
    #[diagnostic(help("a JSON upload needs a non-empty \"name\" string and a \"peptides\" array"))]
    InvalidSchema(String),

    #[error("CSV is empty or missing data rows")]
    #[diagnostic(help("the first line is the header, peptides start on the second line"))]
    EmptyOrHeaderOnly,

    #[error("CSV is missing required columns: {}", format_roles(.0))]
    #[diagnostic(help(
        "CSV must contain columns for: Sequence, Start, End, FluidIntensity, TissueIntensity \
         (template header: ProteinId,PeptideSequence,Start,End,Intensity_Fluid,Intensity_Tissue)"
    ))]
    MissingRequiredColumns(Vec<ColumnRole>),

    #[error("{0} is not in the curated knowledge base")]
    #[diagnostic(help("add a curated record for this identifier before mapping uploaded peptides"))]
    NotInKnowledgeBase(String),

    #[error("unsupported upload format: {0}")]
    #[diagnostic(help("use a .json or .csv file"))]
    UnsupportedFormat(String),

    #[error("external annotation service is disabled")]
    CollaboratorDisabled,

    #[error("annotation service request failed: {0}")]
    CollaboratorHttp(String),

    #[error("annotation service returned status {status}: {message}")]
    CollaboratorStatus { status: u16, message: String },

    #[error("annotation service returned an unusable response: {0}")]
    CollaboratorResponse(String),

    #[error("missing access credential in environment variable {0}")]
    MissingCredential(String),

    #[error("invalid UniProt accession: {0}")]
    InvalidUniprotId(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl SheddomeError {
    pub fn is_upload_error(&self) -> bool {
        matches!(
            self,
            SheddomeError::MalformedJson(_)
                | SheddomeError::InvalidSchema(_)
                | SheddomeError::EmptyOrHeaderOnly
                | SheddomeError::MissingRequiredColumns(_)
                | SheddomeError::UnsupportedFormat(_)
        )
    }
}

fn format_roles(roles: &[ColumnRole]) -> String {
    roles
        .iter()
        .map(|role| role.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
