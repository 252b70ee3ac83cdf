use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use tracing_subscriber::EnvFilter;

use mip_dataset_tools::catalogue::FunctionCatalogue;
use mip_dataset_tools::config::SearchOptions;
use mip_dataset_tools::emit;
use mip_dataset_tools::error::MipError;
use mip_dataset_tools::search::SearchEngine;
use mip_dataset_tools::tmalign;

#[derive(Parser)]
#[command(name = "mip-tools")]
#[command(about = "Post-process MIP model batches: merge TM-align logs, search DeepFRI predictions")]
#[command(version, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Merge one TM-align one-to-all log into a single sorted CSV")]
    CollectTm(CollectTmArgs),
    #[command(about = "Search DeepFRI prediction shards for functions scoring above a threshold")]
    Search(SearchArgs),
}

#[derive(Args)]
struct CollectTmArgs {
    /// Path to the TM-align output file
    #[arg(short = 't', long)]
    tm_align_output: Utf8PathBuf,

    /// Path of the merged CSV to write
    #[arg(short = 'c', long)]
    merged_csv: Utf8PathBuf,
}

#[derive(Args)]
struct SearchArgs {
    /// GO or EC terms to look up, e.g. GO:0030246 EC:4.99.1.-
    #[arg(short = 'f', long = "functions", num_args = 1.., required = true)]
    functions: Vec<String>,

    /// Minimum DeepFRI score, range 0.0--1.0 (default 0.10)
    #[arg(short = 't', long)]
    threshold: Option<f64>,

    /// Directory of gzipped JSON DeepFRI output files
    #[arg(short = 'd', long = "deepfri-functions")]
    corpus_dir: Utf8PathBuf,

    /// Prefix for output filenames (default MIP_FUNCTIONS)
    #[arg(short = 'p', long)]
    output_prefix: Option<String>,

    /// Worker pool size (default 8)
    #[arg(short = 'n', long)]
    num_workers: Option<usize>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(mip) = report.downcast_ref::<MipError>() {
            return ExitCode::from(map_exit_code(mip));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &MipError) -> u8 {
    match error {
        MipError::ShardNotFound(_) | MipError::MalformedBlock { .. } => 2,
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
    match cli.command {
        Commands::CollectTm(args) => run_collect_tm(args),
        Commands::Search(args) => run_search(args),
    }
}

fn run_collect_tm(args: CollectTmArgs) -> miette::Result<()> {
    let mut records = tmalign::parse_log(&args.tm_align_output).into_diagnostic()?;
    tmalign::sort_by_tm_score(&mut records);
    emit::write_alignment_csv(&args.merged_csv, &records).into_diagnostic()?;
    Ok(())
}

fn run_search(args: SearchArgs) -> miette::Result<()> {
    let options = SearchOptions::resolve(
        args.corpus_dir,
        args.threshold,
        args.num_workers,
        args.output_prefix,
    )
    .into_diagnostic()?;

    let catalogue = FunctionCatalogue::load(&options.corpus_dir).into_diagnostic()?;
    let tokens = catalogue.resolve(&args.functions);

    let engine = SearchEngine::new(options.threshold, options.workers);
    let table = engine.search(&options.corpus_dir, &tokens).into_diagnostic()?;

    for token in &tokens {
        let path = emit::function_csv_path(&options.output_prefix, token, options.threshold);
        let description = catalogue.description(token).unwrap_or_default();
        let matches = table.get(token).map(Vec::as_slice).unwrap_or_default();
        emit::write_function_csv(&path, token, description, matches).into_diagnostic()?;
    }
    Ok(())
}
