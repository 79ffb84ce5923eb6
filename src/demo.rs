use clap::ValueEnum;

use crate::domain::UploadFormat;

pub const CSV_TEMPLATE: &str = "ProteinId,PeptideSequence,Start,End,Intensity_Fluid,Intensity_Tissue
ACE2,SAMPLE_PEPTIDE_SEQ,20,35,50000,1000";

pub const CSV_TEMPLATE_FILE_NAME: &str = "shedding_template.csv";

/// Nine ACE2 peptides spanning ectodomain, transmembrane and cytoplasmic regions.
pub const DEMO_CSV: &str = "ProteinId,PeptideSequence,Start,End,Intensity_Fluid,Intensity_Tissue
ACE2,STIEEQAKTFLDKFNHEAEDLFYQSS,19,45,850000,20000
ACE2,GLTTEPHKSNAT,100,112,720000,15000
ACE2,MYPGIQVSNNKY,250,262,900000,18000
ACE2,AWDLGKGDFRI,400,411,680000,14000
ACE2,VVEKLNQLGT,600,610,750000,16000
ACE2,LGANQGFEA,720,729,500000,12000
ACE2,IVSLCTCVFAA,745,755,20000,80000
ACE2,KKKNKARSGEN,765,775,1000,95000
ACE2,PYNASRIRK,780,788,500,98000";

/// A fully annotated record; it needs no structural mapping.
pub const DEMO_JSON: &str = r#"{
  "name": "Angiotensin-converting enzyme 2",
  "geneSymbol": "ACE2",
  "length": 805,
  "description": "Curated Demo: Essential counter-regulatory carboxypeptidase.",
  "role": "Substrate",
  "sheddingScore": 9.2,
  "fluidEctoAbundance": 12500000,
  "tissueAbundance": 4500000,
  "ectoCtoRatio": 18.5,
  "domains": [
    { "name": "Signal Peptide", "start": 1, "end": 17, "type": "Extracellular" },
    { "name": "Ectodomain", "start": 18, "end": 740, "type": "Extracellular" },
    { "name": "Transmembrane", "start": 741, "end": 761, "type": "Transmembrane" },
    { "name": "Cytoplasmic Tail", "start": 762, "end": 805, "type": "Intracellular" }
  ],
  "peptides": [
    { "sequence": "STIEEQAKTFLDKFNHEAEDLFYQSS", "start": 19, "end": 45, "log2FoldChange": 4.2, "intensity": 850000, "location": "Extracellular" },
    { "sequence": "KKKNKARSGEN", "start": 765, "end": 775, "log2FoldChange": -1.5, "intensity": 1000, "location": "Intracellular" }
  ],
  "cleavageSites": [
    { "position": 740, "protease": "ADAM17", "evidence": "Verified" }
  ]
}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum DemoKind {
    Csv,
    Json,
}

impl DemoKind {
    pub fn payload(self) -> (&'static str, UploadFormat) {
        match self {
            DemoKind::Csv => (DEMO_CSV, UploadFormat::Csv),
            DemoKind::Json => (DEMO_JSON, UploadFormat::Json),
        }
    }
}
