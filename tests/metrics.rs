use sheddome_atlas::domain::Location;
use sheddome_atlas::metrics::{
    LocationCounts, MetricsSummary, intensity_at, log2_fold_change, peptide_ecto_cyto_ratio, ratio,
};
use sheddome_atlas::resolver::resolve;
use sheddome_atlas::store::CuratedStore;

#[test]
fn ratio_is_plain_division() {
    assert_eq!(ratio(6.0, 3.0), 2.0);
    assert_eq!(ratio(1.0, 0.0), f64::INFINITY);
    assert!(ratio(0.0, 0.0).is_nan());
}

#[test]
fn fold_change_of_template_row() {
    let value = log2_fold_change(50_000.0, 1_000.0);
    assert!((value - 5.643_856).abs() < 1e-6);
    assert!(log2_fold_change(-1.0, 1.0).is_nan());
}

#[test]
fn ace2_peptide_ratios() {
    let store = CuratedStore::builtin();
    let ace2 = resolve(&store, "ACE2").unwrap();
    assert_eq!(intensity_at(&ace2.peptides, Location::Extracellular), 900_000.0);
    assert_eq!(intensity_at(&ace2.peptides, Location::Intracellular), 500.0);
    assert_eq!(peptide_ecto_cyto_ratio(&ace2.peptides), 1800.0);
}

#[test]
fn ace2_summary() {
    let store = CuratedStore::builtin();
    let summary = MetricsSummary::from_record(resolve(&store, "q9byf1").unwrap());
    assert_eq!(summary.gene_symbol, "ACE2");
    assert_eq!(summary.fluid_tissue_ratio, 3.0);
    assert_eq!(summary.ecto_cto_ratio, 22.0);
    assert_eq!(
        summary.peptide_counts,
        LocationCounts {
            extracellular: 1,
            transmembrane: 1,
            intracellular: 1,
        }
    );
}

#[test]
fn record_without_peptides_has_undefined_peptide_ratio() {
    let store = CuratedStore::builtin();
    let summary = MetricsSummary::from_record(resolve(&store, "CDCP1").unwrap());
    assert!(summary.peptide_ecto_cyto_ratio.is_nan());
    assert_eq!(summary.peptide_counts, LocationCounts::default());
}

#[test]
fn undefined_ratios_are_labelled_in_json() {
    let store = CuratedStore::builtin();
    let summary = MetricsSummary::from_record(resolve(&store, "CDCP1").unwrap());
    let value = serde_json::to_value(&summary).unwrap();
    assert_eq!(value["peptide_ecto_cyto_ratio"], "NaN");
    assert_eq!(value["fluid_tissue_ratio"], 3.0);
}
