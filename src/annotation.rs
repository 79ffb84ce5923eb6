use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::config::CollaboratorSettings;
use crate::domain::{CleavageSite, Domain, PartialProteinRecord, ProteinRecord, Role};
use crate::error::SheddomeError;

pub const SAMPLE_PEPTIDE_COUNT: usize = 5;

const NO_INTERPRETATION: &str = "No interpretation available.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeptideSpan {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationRequest {
    pub identifier: String,
    pub sample_peptides: Vec<PeptideSpan>,
}

impl AnnotationRequest {
    pub fn from_partial(partial: &PartialProteinRecord) -> Self {
        let sample_peptides = partial
            .peptides
            .iter()
            .flatten()
            .take(SAMPLE_PEPTIDE_COUNT)
            .map(|peptide| PeptideSpan {
                start: peptide.start,
                end: peptide.end,
            })
            .collect();
        Self {
            identifier: partial.identifier().to_string(),
            sample_peptides,
        }
    }
}

/// Structural metadata supplied by an external annotator for an uncurated identifier.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuralAnnotation {
    #[serde(default)]
    pub uniprot_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default)]
    pub known_substrates: Option<Vec<String>>,
    #[serde(default)]
    pub domains: Vec<Domain>,
    #[serde(default)]
    pub cleavage_sites: Vec<CleavageSite>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnnotationResponse {
    #[serde(rename = "metadata")]
    pub annotation: StructuralAnnotation,
    #[serde(default = "no_interpretation")]
    pub interpretation: String,
}

/// A record produced by a generative service. Unverified.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GeneratedRecord {
    #[serde(rename = "data")]
    pub record: ProteinRecord,
    #[serde(default = "no_interpretation")]
    pub interpretation: String,
}

fn no_interpretation() -> String {
    NO_INTERPRETATION.to_string()
}

pub trait AnnotationClient: Send + Sync {
    fn annotate(&self, request: &AnnotationRequest) -> Result<AnnotationResponse, SheddomeError>;
}

pub trait GenerationClient: Send + Sync {
    fn generate(&self, identifier: &str) -> Result<GeneratedRecord, SheddomeError>;
}

/// Stand-in used when no external service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCollaborator;

impl AnnotationClient for DisabledCollaborator {
    fn annotate(&self, _request: &AnnotationRequest) -> Result<AnnotationResponse, SheddomeError> {
        Err(SheddomeError::CollaboratorDisabled)
    }
}

impl GenerationClient for DisabledCollaborator {
    fn generate(&self, _identifier: &str) -> Result<GeneratedRecord, SheddomeError> {
        Err(SheddomeError::CollaboratorDisabled)
    }
}

#[derive(Clone)]
pub struct GeminiHttpClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiHttpClient {
    pub fn new(settings: &CollaboratorSettings) -> Result<Self, SheddomeError> {
        let api_key = std::env::var(&settings.api_key_env)
            .map_err(|_| SheddomeError::MissingCredential(settings.api_key_env.clone()))?;
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("sheddome/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| SheddomeError::CollaboratorHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()
            .map_err(|err| SheddomeError::CollaboratorHttp(err.to_string()))?;
        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            model: settings.model.clone(),
            api_key,
        })
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, SheddomeError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "annotation service request failed".to_string());
        Err(SheddomeError::CollaboratorStatus { status, message })
    }

    /// One request, no retry. Returns the text of the first candidate.
    fn generate_text(&self, system: &str, prompt: &str) -> Result<String, SheddomeError> {
        let body = json!({
            "systemInstruction": { "parts": [{ "text": system }] },
            "contents": [{ "role": "user", "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" },
        });
        let start = std::time::Instant::now();
        let response = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .map_err(|err| SheddomeError::CollaboratorHttp(err.to_string()))?;
        let response = Self::handle_status(response)?;
        let raw: Value = response
            .json()
            .map_err(|err| SheddomeError::CollaboratorHttp(err.to_string()))?;
        tracing::debug!(
            model = %self.model,
            latency_ms = start.elapsed().as_millis() as u64,
            "annotation service responded"
        );
        extract_candidate_text(&raw)
    }
}

impl AnnotationClient for GeminiHttpClient {
    fn annotate(&self, request: &AnnotationRequest) -> Result<AnnotationResponse, SheddomeError> {
        let text = self.generate_text(ANNOTATION_INSTRUCTION, &annotation_prompt(request)?)?;
        parse_annotation_payload(&text)
    }
}

impl GenerationClient for GeminiHttpClient {
    fn generate(&self, identifier: &str) -> Result<GeneratedRecord, SheddomeError> {
        let prompt = format!(
            "Generate detailed shedding data for protein: \"{identifier}\". \
             Ensure geneSymbol is provided."
        );
        let text = self.generate_text(GENERATION_INSTRUCTION, &prompt)?;
        parse_generation_payload(&text)
    }
}

const ANNOTATION_INSTRUCTION: &str = "You annotate membrane proteins for an ectodomain shedding \
atlas. Reply with a JSON object {\"metadata\": {\"uniprotId\", \"description\", \"length\", \
\"role\" (Sheddase|Substrate|Both|Unknown), \"knownSubstrates\", \"domains\": [{\"name\", \
\"start\", \"end\", \"type\" (Extracellular|Transmembrane|Intracellular)}], \"cleavageSites\": \
[{\"position\", \"protease\", \"evidence\"}]}, \"interpretation\": string}. Use UniProt residue \
numbering.";

const GENERATION_INSTRUCTION: &str = "You are a bioinformatics database specialised in proteomic \
shedding. Reply with a JSON object {\"data\": ProteinData, \"interpretation\": string} where \
ProteinData has name, geneSymbol, uniprotId, role (Sheddase|Substrate|Both|Unknown), \
knownSubstrates, description, length, sheddingScore (0-10), fluidEctoAbundance, \
tissueAbundance, ectoCtoRatio, dataSources {fluid, tissue, method}, domains, peptides \
{sequence, start, end, log2FoldChange, pvalue, intensity, location} and cleavageSites. \
Substrates and sheddases have ectoCtoRatio above 5; non-shed proteins stay near 1. \
Abundances lie between 1000 and 10000000.";

fn annotation_prompt(request: &AnnotationRequest) -> Result<String, SheddomeError> {
    let sample = serde_json::to_string(&request.sample_peptides)
        .map_err(|err| SheddomeError::CollaboratorResponse(err.to_string()))?;
    Ok(format!(
        "I have experimental peptide data for the protein \"{}\". Provide its domains with \
         UniProt positions, its length, literature cleavage sites, a description and its \
         shedding role. Sample of peptide positions: {sample}",
        request.identifier
    ))
}

/// Text of the first candidate's first part in a `generateContent` response.
pub fn extract_candidate_text(raw: &Value) -> Result<String, SheddomeError> {
    raw.get("candidates")
        .and_then(|v| v.as_array())
        .and_then(|candidates| candidates.first())
        .and_then(|candidate| candidate.get("content"))
        .and_then(|content| content.get("parts"))
        .and_then(|v| v.as_array())
        .and_then(|parts| parts.iter().find_map(|part| part.get("text")))
        .and_then(|v| v.as_str())
        .map(|text| text.to_string())
        .ok_or_else(|| SheddomeError::CollaboratorResponse("response has no text".to_string()))
}

pub fn parse_annotation_payload(text: &str) -> Result<AnnotationResponse, SheddomeError> {
    serde_json::from_str(text).map_err(|err| SheddomeError::CollaboratorResponse(err.to_string()))
}

pub fn parse_generation_payload(text: &str) -> Result<GeneratedRecord, SheddomeError> {
    serde_json::from_str(text).map_err(|err| SheddomeError::CollaboratorResponse(err.to_string()))
}
