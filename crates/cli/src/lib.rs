use anyhow::{Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use context_graph::{SnapshotFileProvider, DEFAULT_SNAPSHOT_PATH};
use context_test_engine::analyzers::GoTestAnalyzer;
use context_test_engine::{
    AffectedGraph, CancellationToken, Diagnosed, EngineConfig, LanguageRegistry, TestAnalyzer,
    TestEngine, TestResult, TestService,
};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "context-tests")]
#[command(about = "Affected-test selection from a symbol graph", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long, global = true)]
    quiet: bool,

    /// Engine config file (JSON or TOML)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the affected graph for a set of changed files
    Affected(AffectedArgs),

    /// List imports of a Go test file
    Imports(ImportsArgs),

    /// List languages with analyzers and runners
    Languages,

    /// Summarise a JSON array of test results
    Validate(ValidateArgs),
}

#[derive(Args)]
struct AffectedArgs {
    /// Changed files, relative to the project root
    #[arg(required = true)]
    files: Vec<String>,

    /// Project root
    #[arg(short, long, default_value = ".")]
    project: PathBuf,

    /// Symbol graph snapshot (default: <project>/.context/symbol_graph.json)
    #[arg(long)]
    graph: Option<PathBuf>,
}

#[derive(Args)]
struct ImportsArgs {
    /// Test file, relative to the project root
    test: String,

    /// Project root
    #[arg(short, long, default_value = ".")]
    project: PathBuf,
}

#[derive(Args)]
struct ValidateArgs {
    /// JSON file holding an array of test results ("-" for stdin)
    results: PathBuf,

    /// Exit with status 1 when any test failed
    #[arg(long)]
    strict: bool,
}

#[derive(Serialize)]
struct LanguagesOutput {
    analyzers: Vec<String>,
    runners: Vec<String>,
}

#[derive(Serialize)]
struct AffectedOutput<'a> {
    #[serde(flatten)]
    report: &'a Diagnosed<AffectedGraph>,
    /// Deduplicated tests across `test_mapping`, in affected-file order
    tests: Vec<String>,
}

#[derive(Serialize)]
struct ImportsOutput<'a> {
    test: &'a str,
    imports: Vec<String>,
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    serde_json::to_writer_pretty(&mut stdout, value)?;
    writeln!(stdout)?;
    Ok(())
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

/// Cancelled on Ctrl-C
fn shutdown_token() -> CancellationToken {
    let token = CancellationToken::new();
    let on_signal = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("Interrupted, cancelling");
            on_signal.cancel();
        }
    });
    token
}

fn build_engine(
    project: &Path,
    graph: Option<PathBuf>,
    config: EngineConfig,
) -> Result<TestEngine> {
    let analyzer = GoTestAnalyzer::new(project)
        .context("Failed to create Go test analyzer")?
        .with_smoke_markers(config.smoke_markers.clone());
    let registry = LanguageRegistry::builder()
        .register_analyzer("go", analyzer)
        .build();

    let provider = match graph {
        Some(path) => SnapshotFileProvider::with_path(path),
        None => SnapshotFileProvider::new(),
    };

    Ok(TestEngine::with_config(registry, Arc::new(provider), config))
}

pub async fn main_entry() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let config = EngineConfig::load(cli.config.as_deref()).context("Failed to load engine config")?;

    match cli.command {
        Commands::Affected(args) => run_affected(args, config).await,
        Commands::Imports(args) => run_imports(args).await,
        Commands::Languages => run_languages(config),
        Commands::Validate(args) => run_validate(args),
    }
}

async fn run_affected(args: AffectedArgs, config: EngineConfig) -> Result<()> {
    let project = args
        .project
        .canonicalize()
        .with_context(|| format!("Invalid project path {}", args.project.display()))?;
    // Relative snapshot paths are taken from the working directory, not the project
    let graph = match args.graph {
        Some(path) if path.is_relative() => Some(std::env::current_dir()?.join(path)),
        other => other,
    };
    log::debug!(
        "Snapshot: {}",
        graph
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| DEFAULT_SNAPSHOT_PATH.to_string())
    );

    let engine = build_engine(&project, graph, config)?;
    let cancel = shutdown_token();
    let affected = engine
        .build_affected_graph(&args.files, &project, &cancel)
        .await?;

    print_json(&AffectedOutput {
        tests: affected.value.mapped_tests(),
        report: &affected,
    })
}

async fn run_imports(args: ImportsArgs) -> Result<()> {
    let analyzer = GoTestAnalyzer::new(&args.project).context("Failed to create Go test analyzer")?;
    let imports = analyzer.analyze_test_dependencies(&args.test).await?;
    print_json(&ImportsOutput {
        test: &args.test,
        imports,
    })
}

fn run_languages(config: EngineConfig) -> Result<()> {
    let engine = build_engine(Path::new("."), None, config)?;
    print_json(&LanguagesOutput {
        analyzers: engine.registry().analyzer_languages(),
        runners: engine.supported_languages(),
    })
}

fn run_validate(args: ValidateArgs) -> Result<()> {
    let raw = if args.results.as_os_str() == "-" {
        io::read_to_string(io::stdin()).context("Failed to read results from stdin")?
    } else {
        std::fs::read_to_string(&args.results)
            .with_context(|| format!("Failed to read {}", args.results.display()))?
    };
    let results: Vec<TestResult> =
        serde_json::from_str(&raw).context("Results must be a JSON array of test results")?;

    let validation = TestService::validate_results(&results);
    print_json(&validation)?;

    if args.strict && !validation.success {
        std::process::exit(1);
    }
    Ok(())
}
