//! Elastiform CLI entrypoint.
//!
//! This is the main entrypoint for the elastiform command-line tool.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use elastiform::cli::{Cli, Commands, FilterArgs, LogFormat, OutputFormat, OutputFormatter};
use elastiform::cluster::ClusterClient;
use elastiform::config::{ConfigParser, ConfigValidator, ElastiformConfig, find_config_file};
use elastiform::error::Result;
use elastiform::loader::ResourceLoader;
use elastiform::planner::ResourceFilter;
use elastiform::reconciler::{Reconciler, RunOutcome};
use elastiform::resource::ResourceDescriptor;
use elastiform::scaffold::scaffold_project;

use clap::Parser;
use tokio::sync::watch;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Main entrypoint.
fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose, cli.log_format);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Failed to create async runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(run(cli)) {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(RunOutcome::Failed.exit_code())
        }
    }
}

/// Initializes the logging system. Logs always go to stderr.
fn init_logging(verbose: bool, format: LogFormat) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr);

    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

/// Main async entry point.
async fn run(cli: Cli) -> Result<RunOutcome> {
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Init { directory } => cmd_init(&directory),
        Commands::Validate { filter } => cmd_validate(config_path, &filter),
        Commands::Plan {
            cluster,
            filter,
            output,
        } => cmd_plan(config_path, &cluster, &filter, output).await,
        Commands::Apply {
            cluster,
            filter,
            auto_approve,
        } => cmd_apply(config_path, &cluster, &filter, auto_approve).await,
    }
}

/// Create a starter project.
fn cmd_init(directory: &Path) -> Result<RunOutcome> {
    let created = scaffold_project(directory)?;

    if created.is_empty() {
        eprintln!("Nothing to do: {} is already initialized.", directory.display());
        return Ok(RunOutcome::Clean);
    }

    for path in &created {
        eprintln!("Created: {}", path.display());
    }

    eprintln!("\nProject initialized successfully!");
    eprintln!("Next steps:");
    eprintln!("  1. Edit clusters.yaml and put credentials in a .env file next to it");
    eprintln!("  2. Add resource files under the kind directories");
    eprintln!("  3. Run 'elastiform validate' to check your files");
    eprintln!("  4. Run 'elastiform plan --cluster local' to see what would change");
    eprintln!("  5. Run 'elastiform apply --cluster local' to write the changes");

    Ok(RunOutcome::Clean)
}

/// Validate configuration and resource files.
fn cmd_validate(config_path: Option<&Path>, filter: &FilterArgs) -> Result<RunOutcome> {
    let config_file = resolve_config_path(config_path)?;
    info!("Validating configuration: {}", config_file.display());

    let config = parse_config(&config_file)?;
    let result = ConfigValidator::new().check(&config);

    for warning in &result.warnings {
        eprintln!("  warning: {warning}");
    }
    for error in &result.errors {
        eprintln!("  error: {}: {}", error.field, error.message);
    }

    let loader = ResourceLoader::new(config.resource_root());
    let (descriptors, load_errors) = loader.validate(&filter.to_filter())?;
    for error in &load_errors {
        eprintln!("  error: {error}");
    }

    eprintln!("\nConfiguration summary:");
    eprintln!("  Clusters: {}", config.cluster_names().join(", "));
    eprintln!("  Resource directory: {}", loader.root().display());
    eprintln!("  Resources: {}", descriptors.len());

    if result.is_valid() && load_errors.is_empty() {
        eprintln!("\nConfiguration is valid!");
        Ok(RunOutcome::Clean)
    } else {
        eprintln!(
            "\nValidation failed with {} error(s).",
            result.error_count() + load_errors.len()
        );
        Ok(RunOutcome::Failed)
    }
}

/// Show what would change on a cluster.
async fn cmd_plan(
    config_path: Option<&Path>,
    cluster: &str,
    filter: &FilterArgs,
    output: OutputFormat,
) -> Result<RunOutcome> {
    let config = load_config(config_path)?;
    let filter = filter.to_filter();
    let descriptors = load_resources(&config, &filter)?;
    let reconciler = connect(&config, cluster)?;

    let plan = reconciler.plan(cluster, &descriptors, &filter).await?;

    let rendered = OutputFormatter::new(output).format_plan(&plan);
    match output {
        OutputFormat::Json => println!("{rendered}"),
        OutputFormat::Text => eprint!("{rendered}"),
    }

    Ok(RunOutcome::from_plan(&plan))
}

/// Plan, confirm and apply.
async fn cmd_apply(
    config_path: Option<&Path>,
    cluster: &str,
    filter: &FilterArgs,
    auto_approve: bool,
) -> Result<RunOutcome> {
    let config = load_config(config_path)?;
    let filter = filter.to_filter();
    let descriptors = load_resources(&config, &filter)?;
    let reconciler = connect(&config, cluster)?;

    let plan = reconciler.plan(cluster, &descriptors, &filter).await?;
    let formatter = OutputFormatter::new(OutputFormat::Text);
    eprint!("{}", formatter.format_plan(&plan));

    if !plan.has_changes() {
        eprintln!("No changes to apply.");
        return Ok(RunOutcome::from_apply(&plan, &reconciler.apply(&plan, None).await));
    }

    if plan.has_failures() {
        warn!(
            "{} resource(s) could not be planned and will not be written",
            plan.failures().len()
        );
    }

    if !auto_approve && !confirm(cluster)? {
        eprintln!("Apply cancelled.");
        return Ok(RunOutcome::Clean);
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing the in-flight write");
            let _ = shutdown_tx.send(true);
        }
    });

    let report = reconciler.apply(&plan, Some(shutdown_rx)).await;
    signal_task.abort();

    eprint!("{}", formatter.format_apply_report(&report));

    Ok(RunOutcome::from_apply(&plan, &report))
}

/// Asks for interactive approval on stdin.
fn confirm(cluster: &str) -> Result<bool> {
    eprint!("Do you want to apply this plan to cluster '{cluster}'? [y/N]: ");
    std::io::stderr().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Resolves the configuration file path.
fn resolve_config_path(config_path: Option<&Path>) -> Result<PathBuf> {
    config_path.map_or_else(|| find_config_file("."), |path| Ok(path.to_path_buf()))
}

/// Reads the configuration file after loading the neighbouring `.env`.
fn parse_config(config_file: &Path) -> Result<ElastiformConfig> {
    let parser = ConfigParser::new().with_base_path(
        config_file
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new(".")),
    );
    parser.load_dotenv()?;
    parser.load_file(config_file)
}

/// Loads and validates the configuration.
fn load_config(config_path: Option<&Path>) -> Result<ElastiformConfig> {
    let config_file = resolve_config_path(config_path)?;
    debug!("Loading configuration from: {}", config_file.display());

    let config = parse_config(&config_file)?;
    let result = ConfigValidator::new().validate(&config)?;
    for warning in &result.warnings {
        warn!("{warning}");
    }

    Ok(config)
}

/// Loads the selected resource files.
fn load_resources(
    config: &ElastiformConfig,
    filter: &ResourceFilter,
) -> Result<Vec<ResourceDescriptor>> {
    ResourceLoader::new(config.resource_root()).discover(filter)
}

/// Builds the reconciler for one configured cluster.
fn connect(config: &ElastiformConfig, cluster: &str) -> Result<Reconciler> {
    let cluster_config = config.cluster(cluster)?;
    let client = ClusterClient::new(cluster_config, config.settings.timeout())?;
    info!("Using cluster {cluster} at {}", client.base_url());

    Ok(Reconciler::new(Arc::new(client), &config.settings))
}
