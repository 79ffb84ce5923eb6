use serde::Serialize;

use crate::annotation::{
    AnnotationClient, AnnotationRequest, DisabledCollaborator, StructuralAnnotation,
};
use crate::domain::{Domain, Location, PartialProteinRecord, Peptide, ProteinRecord};
use crate::error::SheddomeError;
use crate::resolver;
use crate::store::RecordStore;

/// Where the structural half of a merged record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum AnnotationSource {
    KnowledgeBase,
    External,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergedRecord {
    pub record: ProteinRecord,
    pub interpretation: String,
    pub source: AnnotationSource,
}

/// Region type of the first domain containing `position`, else extracellular.
pub fn locate(position: u32, domains: &[Domain]) -> Location {
    domains
        .iter()
        .find(|domain| domain.contains(position))
        .map(|domain| domain.kind)
        .unwrap_or_default()
}

/// Reassigns each peptide's location from its start residue.
pub fn relocate_peptides(peptides: Vec<Peptide>, domains: &[Domain]) -> Vec<Peptide> {
    peptides
        .into_iter()
        .map(|peptide| Peptide {
            location: locate(peptide.start, domains),
            ..peptide
        })
        .collect()
}

/// Curated domains and cleavage sites win; every measurement the upload carries wins.
/// An upload without peptides shows the curated peptides unchanged.
pub fn merge_with_curated(partial: PartialProteinRecord, curated: &ProteinRecord) -> ProteinRecord {
    let peptides = match partial.peptides {
        Some(peptides) if !peptides.is_empty() => relocate_peptides(peptides, &curated.domains),
        _ => curated.peptides.clone(),
    };
    let role = partial.role.unwrap_or(curated.role);
    let known_substrates = partial
        .known_substrates
        .or_else(|| curated.known_substrates.clone());
    ProteinRecord {
        name: partial.name.unwrap_or_else(|| curated.name.clone()),
        gene_symbol: partial
            .gene_symbol
            .unwrap_or_else(|| curated.gene_symbol.clone()),
        uniprot_id: partial.uniprot_id.or_else(|| curated.uniprot_id.clone()),
        role,
        known_substrates: role.retain_substrates(known_substrates),
        length: partial.length.unwrap_or(curated.length),
        description: partial
            .description
            .unwrap_or_else(|| curated.description.clone()),
        shedding_score: partial.shedding_score.unwrap_or(curated.shedding_score),
        fluid_ecto_abundance: partial
            .fluid_ecto_abundance
            .unwrap_or(curated.fluid_ecto_abundance),
        tissue_abundance: partial.tissue_abundance.unwrap_or(curated.tissue_abundance),
        ecto_cto_ratio: partial.ecto_cto_ratio.unwrap_or(curated.ecto_cto_ratio),
        domains: curated.domains.clone(),
        peptides,
        cleavage_sites: curated.cleavage_sites.clone(),
        data_sources: partial
            .data_sources
            .unwrap_or_else(|| curated.data_sources.clone()),
    }
}

/// Annotator metadata wins over the upload wherever it is present.
pub fn merge_with_annotation(
    partial: PartialProteinRecord,
    annotation: StructuralAnnotation,
) -> ProteinRecord {
    let peptides = relocate_peptides(partial.peptides.unwrap_or_default(), &annotation.domains);
    let name = partial.name.unwrap_or_default();
    let role = annotation.role.or(partial.role).unwrap_or_default();
    ProteinRecord {
        gene_symbol: partial.gene_symbol.unwrap_or_else(|| name.clone()),
        name,
        uniprot_id: annotation.uniprot_id.or(partial.uniprot_id),
        role,
        known_substrates: role
            .retain_substrates(annotation.known_substrates.or(partial.known_substrates)),
        length: annotation.length.or(partial.length).unwrap_or_default(),
        description: annotation
            .description
            .or(partial.description)
            .unwrap_or_default(),
        shedding_score: partial.shedding_score.unwrap_or_default(),
        fluid_ecto_abundance: partial.fluid_ecto_abundance.unwrap_or_default(),
        tissue_abundance: partial.tissue_abundance.unwrap_or_default(),
        ecto_cto_ratio: partial.ecto_cto_ratio.unwrap_or_default(),
        domains: annotation.domains,
        peptides,
        cleavage_sites: annotation.cleavage_sites,
        data_sources: partial.data_sources.unwrap_or_default(),
    }
}

pub struct AnnotationMerger<'a, S: ?Sized, A: ?Sized> {
    store: &'a S,
    annotator: &'a A,
}

impl<'a, S: RecordStore + ?Sized> AnnotationMerger<'a, S, DisabledCollaborator> {
    pub fn knowledge_base_only(store: &'a S) -> Self {
        Self {
            store,
            annotator: &DisabledCollaborator,
        }
    }
}

impl<'a, S, A> AnnotationMerger<'a, S, A>
where
    S: RecordStore + ?Sized,
    A: AnnotationClient + ?Sized,
{
    pub fn new(store: &'a S, annotator: &'a A) -> Self {
        Self { store, annotator }
    }

    pub fn merge(&self, partial: PartialProteinRecord) -> Result<MergedRecord, SheddomeError> {
        let identifier = partial.identifier().to_string();

        if let Ok(curated) = resolver::resolve(self.store, &identifier) {
            let uploaded = partial.peptides.as_ref().map_or(0, Vec::len);
            let interpretation = if uploaded == 0 {
                format!("No uploaded peptides for {identifier}; showing curated peptides.")
            } else {
                format!(
                    "Mapped {uploaded} uploaded peptides onto curated annotations for {identifier}."
                )
            };
            tracing::info!(identifier = %identifier, uploaded, "merged upload with curated record");
            return Ok(MergedRecord {
                record: merge_with_curated(partial, curated),
                interpretation,
                source: AnnotationSource::KnowledgeBase,
            });
        }

        let request = AnnotationRequest::from_partial(&partial);
        match self.annotator.annotate(&request) {
            Ok(response) => {
                tracing::info!(identifier = %identifier, "merged upload with external annotation");
                Ok(MergedRecord {
                    record: merge_with_annotation(partial, response.annotation),
                    interpretation: response.interpretation,
                    source: AnnotationSource::External,
                })
            }
            Err(SheddomeError::CollaboratorDisabled) => {
                Err(SheddomeError::NotInKnowledgeBase(identifier))
            }
            Err(err) => {
                tracing::warn!(identifier = %identifier, error = %err, "external annotation failed");
                Err(SheddomeError::NotInKnowledgeBase(identifier))
            }
        }
    }
}
