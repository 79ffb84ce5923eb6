use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use sheddome_atlas::annotation::{
    AnnotationClient, AnnotationRequest, AnnotationResponse, DisabledCollaborator,
    GeminiHttpClient, GeneratedRecord, GenerationClient,
};
use sheddome_atlas::app::{
    self, AnalysisResult, App, AtlasResult, ProgressEvent, ProgressSink, UploadResult,
};
use sheddome_atlas::config::{ConfigLoader, ResolvedConfig};
use sheddome_atlas::demo::{CSV_TEMPLATE, CSV_TEMPLATE_FILE_NAME, DemoKind};
use sheddome_atlas::domain::UploadFormat;
use sheddome_atlas::error::SheddomeError;
use sheddome_atlas::metrics::MetricsSummary;
use sheddome_atlas::output::{JsonOutput, OutputMode};
use sheddome_atlas::store::CuratedStore;

#[derive(Parser)]
#[command(name = "sheddome")]
#[command(about = "Ectodomain shedding atlas: curated lookup and peptide upload mapping")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    non_interactive: bool,

    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Look up a protein by name, gene symbol or UniProt accession")]
    Lookup(LookupArgs),
    #[command(about = "Upload a JSON record or CSV peptide table")]
    Upload(UploadArgs),
    #[command(about = "Run a bundled demo upload")]
    Demo(DemoArgs),
    #[command(about = "Print the CSV upload template")]
    Template,
    #[command(about = "Show derived metrics for a curated protein")]
    Metrics(LookupArgs),
    #[command(about = "Build global atlas points from fluid and tissue tables")]
    Atlas(AtlasArgs),
    #[command(about = "List curated records")]
    List,
}

#[derive(Args)]
struct LookupArgs {
    query: String,
}

#[derive(Args)]
struct UploadArgs {
    file: Utf8PathBuf,

    #[arg(long)]
    format: Option<UploadFormat>,
}

#[derive(Args)]
struct DemoArgs {
    kind: DemoKind,
}

#[derive(Args)]
struct AtlasArgs {
    #[arg(long)]
    fluid: Option<Utf8PathBuf>,

    #[arg(long)]
    tissue: Option<Utf8PathBuf>,
}

/// Either the configured external service or nothing.
enum Collaborator {
    Disabled(DisabledCollaborator),
    Gemini(GeminiHttpClient),
}

impl Collaborator {
    fn from_config(config: &ResolvedConfig) -> Result<Self, SheddomeError> {
        if config.collaborator.enabled {
            Ok(Collaborator::Gemini(GeminiHttpClient::new(&config.collaborator)?))
        } else {
            Ok(Collaborator::Disabled(DisabledCollaborator))
        }
    }
}

impl AnnotationClient for Collaborator {
    fn annotate(&self, request: &AnnotationRequest) -> Result<AnnotationResponse, SheddomeError> {
        match self {
            Collaborator::Disabled(client) => client.annotate(request),
            Collaborator::Gemini(client) => client.annotate(request),
        }
    }
}

impl GenerationClient for Collaborator {
    fn generate(&self, identifier: &str) -> Result<GeneratedRecord, SheddomeError> {
        match self {
            Collaborator::Disabled(client) => client.generate(identifier),
            Collaborator::Gemini(client) => client.generate(identifier),
        }
    }
}

struct StderrProgress;

impl ProgressSink for StderrProgress {
    fn event(&self, event: ProgressEvent) {
        match event.elapsed {
            Some(elapsed) => eprintln!("• {} ({} ms)", event.message, elapsed.as_millis()),
            None => eprintln!("• {}", event.message),
        }
    }
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<SheddomeError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &SheddomeError) -> u8 {
    match error {
        SheddomeError::NotFound(_) | SheddomeError::NotInKnowledgeBase(_) => 2,
        SheddomeError::CollaboratorHttp(_)
        | SheddomeError::CollaboratorStatus { .. }
        | SheddomeError::CollaboratorResponse(_)
        | SheddomeError::MissingCredential(_) => 3,
        err if err.is_upload_error() => 4,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let output_mode = if cli.non_interactive {
        OutputMode::NonInteractive
    } else {
        OutputMode::Interactive
    };

    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let store = config.curated_store()?;

    match cli.command {
        Commands::Template => {
            if matches!(output_mode, OutputMode::Interactive) {
                eprintln!("# save as {CSV_TEMPLATE_FILE_NAME}");
            }
            println!("{CSV_TEMPLATE}");
            Ok(())
        }
        Commands::List => {
            let result = app::list_records(&store);
            match output_mode {
                OutputMode::NonInteractive => JsonOutput::print_list(&result).into_diagnostic(),
                OutputMode::Interactive => {
                    for entry in &result.records {
                        println!(
                            "{:<8} {:<8} {} [{}]",
                            entry.gene_symbol,
                            entry.uniprot_id.as_deref().unwrap_or("-"),
                            entry.name,
                            entry.role
                        );
                    }
                    Ok(())
                }
            }
        }
        Commands::Atlas(args) => run_atlas(args, output_mode),
        command => {
            // Generation shares the annotation client's settings.
            let app = App::new(
                store,
                Collaborator::from_config(&config)?,
                Collaborator::from_config(&config)?,
            );
            run_app_command(command, &app, output_mode)
        }
    }
}

fn run_app_command(
    command: Commands,
    app: &App<CuratedStore, Collaborator, Collaborator>,
    output_mode: OutputMode,
) -> miette::Result<()> {
    let sink: &dyn ProgressSink = match output_mode {
        OutputMode::Interactive => &StderrProgress,
        OutputMode::NonInteractive => &JsonOutput,
    };
    match command {
        Commands::Lookup(args) => {
            let result = app.search(&args.query, sink)?;
            print_analysis(&result, output_mode)
        }
        Commands::Upload(args) => {
            let result = app.upload_file(&args.file, args.format, sink)?;
            print_upload(&result, output_mode)
        }
        Commands::Demo(args) => {
            let result = app.demo(args.kind, sink)?;
            print_upload(&result, output_mode)
        }
        Commands::Metrics(args) => {
            let result = app.metrics(&args.query)?;
            print_metrics(&result, output_mode)
        }
        Commands::Template | Commands::List | Commands::Atlas(_) => Ok(()),
    }
}

fn run_atlas(args: AtlasArgs, output_mode: OutputMode) -> miette::Result<()> {
    if args.fluid.is_none() && args.tissue.is_none() {
        return Err(miette::Report::msg(
            "atlas needs --fluid and/or --tissue dataset files",
        ));
    }
    let read = |path: &Option<Utf8PathBuf>| -> miette::Result<Option<String>> {
        path.as_ref()
            .map(|path| std::fs::read_to_string(path.as_std_path()).into_diagnostic())
            .transpose()
    };
    let fluid = read(&args.fluid)?;
    let tissue = read(&args.tissue)?;
    let result = app::atlas(fluid.as_deref(), tissue.as_deref())?;
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_atlas(&result).into_diagnostic(),
        OutputMode::Interactive => {
            print_atlas_summary(&result);
            Ok(())
        }
    }
}

fn print_analysis(result: &AnalysisResult, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_analysis(result).into_diagnostic(),
        OutputMode::Interactive => {
            print_summary(result);
            Ok(())
        }
    }
}

fn print_upload(result: &UploadResult, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_upload(result).into_diagnostic(),
        OutputMode::Interactive => {
            print_summary(&result.analysis);
            if result.skipped_rows > 0 {
                println!("\x1b[33m⚠ skipped rows: {}\x1b[0m", result.skipped_rows);
            }
            Ok(())
        }
    }
}

fn print_metrics(result: &MetricsSummary, output_mode: OutputMode) -> miette::Result<()> {
    match output_mode {
        OutputMode::NonInteractive => JsonOutput::print_metrics(result).into_diagnostic(),
        OutputMode::Interactive => {
            println!("\x1b[36m{} metrics\x1b[0m", result.gene_symbol);
            println!("  shedding score        {:.1} / 10.0", result.shedding_score);
            println!("  fluid ecto abundance  {:.0}", result.fluid_ecto_abundance);
            println!("  tissue abundance      {:.0}", result.tissue_abundance);
            println!("  ecto/cyto ratio       {:.1}", result.ecto_cto_ratio);
            println!("  fluid/tissue ratio    {:.2}", result.fluid_tissue_ratio);
            println!("  peptide ecto/cyto     {:.2}", result.peptide_ecto_cyto_ratio);
            Ok(())
        }
    }
}

fn print_summary(result: &AnalysisResult) {
    let green = "\x1b[32m";
    let yellow = "\x1b[33m";
    let cyan = "\x1b[36m";
    let reset = "\x1b[0m";

    let record = &result.record;
    let color = if result.verified { green } else { yellow };
    println!(
        "{cyan}{} ({}){reset} {color}[{:?}]{reset}",
        record.name, record.gene_symbol, result.provenance
    );
    if !result.verified {
        println!("{yellow}⚠ generated annotations, not verified{reset}");
    }
    println!("  role: {}  length: {}", record.role, record.length);
    println!(
        "  domains: {}  peptides: {}  cleavage sites: {}",
        record.domains.len(),
        record.peptides.len(),
        record.cleavage_sites.len()
    );
    for peptide in &record.peptides {
        println!(
            "  {:>5}-{:<5} {:<14} log2FC {:>6.2}  {}",
            peptide.start,
            peptide.end,
            peptide.location,
            peptide.log2_fold_change,
            peptide.sequence
        );
    }
    println!("  {}", result.interpretation);
}

fn print_atlas_summary(result: &AtlasResult) {
    println!(
        "\x1b[36matlas: {} proteins, {} shedding candidates\x1b[0m",
        result.points.len(),
        result.candidates
    );
    for point in result.points.iter().filter(|point| point.is_candidate) {
        println!("  {:<12} tissue {:.2}  fluid {:.2}", point.id, point.x, point.y);
    }
}
