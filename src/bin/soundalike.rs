use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use soundalike::catalog::{self, DirectorySource, ExtensionFilter};
use soundalike::config::AppConfig;
use soundalike::fixtures::{self, SyntheticPattern, SyntheticSpec};
use soundalike::ranking::{self, Metric};
use soundalike::service::{AnalyzeOptions, QueryService, Upload};
use soundalike::{AudioSource, MfccExtractor, ReferenceRecord};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(
    name = "soundalike",
    about = "Find audio clips that sound like a query clip"
)]
struct Cli {
    /// JSON configuration file (defaults to $SOUNDALIKE_CONFIG or ./soundalike.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Override the number of MFCC coefficients per fingerprint
    #[arg(long, global = true)]
    coefficients: Option<usize>,
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the fingerprint of one audio file as JSON
    Fingerprint {
        file: PathBuf,
    },
    /// Fingerprint every audio file in one or more directories
    Scan(ScanArgs),
    /// Rank the other files of a directory against one of its files
    Rank(RankArgs),
    /// Analyze a query file against a reference catalog and print a JSON report
    Query(QueryArgs),
    /// Write a deterministic synthetic WAV clip
    Synth(SynthArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    #[arg(required = true)]
    directories: Vec<PathBuf>,
    /// Write the fingerprint records (usable with `query --catalog`) here
    #[arg(long)]
    output: Option<PathBuf>,
    #[arg(long)]
    recursive: bool,
}

#[derive(Args, Debug)]
struct RankArgs {
    /// File name of the query clip inside DIRECTORY
    input: String,
    directory: PathBuf,
    #[arg(long)]
    metric: Option<String>,
    /// Only print the first N matches
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args, Debug)]
struct QueryArgs {
    file: PathBuf,
    /// Reference directories to fingerprint before querying
    #[arg(long = "dir")]
    directories: Vec<PathBuf>,
    /// Precomputed fingerprint records from `scan --output`
    #[arg(long, conflicts_with = "directories")]
    catalog: Option<PathBuf>,
    #[arg(long)]
    threshold: Option<f64>,
    #[arg(long)]
    limit: Option<usize>,
    #[arg(long)]
    metric: Option<String>,
}

#[derive(Args, Debug)]
struct SynthArgs {
    /// sine, square, white_noise or impulse_train
    #[arg(long, default_value = "sine")]
    pattern: SyntheticPattern,
    #[arg(long, default_value_t = 440.0)]
    frequency: f32,
    #[arg(long, default_value_t = 1.0)]
    duration: f32,
    #[arg(long, default_value_t = 22_050)]
    sample_rate: u32,
    #[arg(long, default_value_t = 0.8)]
    amplitude: f32,
    #[arg(long, default_value_t = fixtures::DEFAULT_SEED)]
    seed: u64,
    #[arg(long)]
    output: PathBuf,
}

#[derive(Serialize)]
struct FingerprintOutput<'a> {
    file: String,
    coefficient_count: usize,
    features: &'a [f32],
}

#[derive(Serialize)]
struct ScanOutput {
    num_files: usize,
    skipped: Vec<String>,
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();
    soundalike::init_logging(match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        _ => Level::DEBUG,
    });

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::load(),
    };
    if let Some(n) = cli.coefficients {
        config.extraction.coefficient_count = n;
    }

    match cli.command {
        Commands::Fingerprint { file } => run_fingerprint(&config, &file),
        Commands::Scan(args) => run_scan(&config, args),
        Commands::Rank(args) => run_rank(&config, args),
        Commands::Query(args) => run_query(&config, args),
        Commands::Synth(args) => run_synth(args),
    }
}

fn build_extractor(config: &AppConfig) -> Result<MfccExtractor> {
    MfccExtractor::new(config.extraction.clone()).context("invalid extraction configuration")
}

fn run_fingerprint(config: &AppConfig, file: &Path) -> Result<ExitCode> {
    let extractor = build_extractor(config)?;
    let fingerprint = extractor
        .extract(&AudioSource::path(file))
        .with_context(|| format!("fingerprinting {}", file.display()))?;

    let output = FingerprintOutput {
        file: file.display().to_string(),
        coefficient_count: fingerprint.dimension(),
        features: fingerprint.as_slice(),
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(ExitCode::SUCCESS)
}

fn run_scan(config: &AppConfig, args: ScanArgs) -> Result<ExitCode> {
    let extractor = build_extractor(config)?;
    let source = DirectorySource::with_roots(args.directories)
        .recursive(args.recursive || config.catalog.recursive);
    let filter = ExtensionFilter::from_config(&config.catalog);
    let report = catalog::load_all(&source, &filter, &extractor)?;

    for item in &report.skipped {
        eprintln!("skipped {}: {}", item.identifier, item.reason);
    }

    if let Some(path) = args.output {
        let mut records: Vec<&ReferenceRecord> = report.collection.records().collect();
        records.sort_by(|a, b| a.identifier.cmp(&b.identifier));
        fs::write(&path, serde_json::to_string_pretty(&records)?)
            .with_context(|| format!("writing {}", path.display()))?;
    }

    let summary = ScanOutput {
        num_files: report.loaded_count(),
        skipped: report.skipped.iter().map(|s| s.identifier.clone()).collect(),
    };
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(ExitCode::SUCCESS)
}

fn run_rank(config: &AppConfig, args: RankArgs) -> Result<ExitCode> {
    if !args.directory.join(&args.input).is_file() {
        bail!(
            "Input file {} not found in {}",
            args.input,
            args.directory.display()
        );
    }

    let metric: Metric = args
        .metric
        .as_deref()
        .unwrap_or(&config.query.metric)
        .parse()?;
    let extractor = build_extractor(config)?;
    let source = DirectorySource::new(&args.directory).recursive(config.catalog.recursive);
    let filter = ExtensionFilter::from_config(&config.catalog);
    let report = catalog::load_all(&source, &filter, &extractor)?;

    if !report.collection.contains(&args.input) {
        bail!("Could not load features for {}", args.input);
    }

    let ranking = ranking::rank(&args.input, &report.collection, &metric)?.filter(None, args.limit);

    println!("\nFiles similar to {}:", args.input);
    for (position, m) in ranking.matches().iter().enumerate() {
        println!(
            "{}. {} (Similarity Score: {:.4})",
            position + 1,
            m.identifier,
            m.similarity()
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn run_query(config: &AppConfig, args: QueryArgs) -> Result<ExitCode> {
    let service = QueryService::new(config)?;

    if let Some(path) = &args.catalog {
        let text =
            fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
        let records: Vec<ReferenceRecord> = serde_json::from_str(&text)
            .with_context(|| format!("parsing {}", path.display()))?;
        service.load_records(records)?;
    } else if !args.directories.is_empty() {
        let summary = service.initialize(&args.directories)?;
        for skipped in &summary.skipped {
            eprintln!("skipped {}: {}", skipped.filename, skipped.error.message);
        }
    } else {
        bail!("provide reference directories with --dir or a catalog with --catalog");
    }

    let filename = args
        .file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let data = fs::read(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
    let upload = Upload::new(filename, data);
    let options = AnalyzeOptions {
        threshold: args.threshold,
        limit: args.limit,
        metric: args.metric,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    let report = runtime.block_on(service.analyze(upload, options))?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::SUCCESS)
}

fn run_synth(args: SynthArgs) -> Result<ExitCode> {
    let samples = SyntheticSpec::new(args.pattern, args.frequency)
        .with_amplitude(args.amplitude)
        .with_seed(args.seed)
        .render(args.sample_rate, args.duration);
    fixtures::write_wav(&args.output, &samples, args.sample_rate, 1)
        .with_context(|| format!("writing {}", args.output.display()))?;

    println!("{}", args.output.display());
    Ok(ExitCode::SUCCESS)
}
