//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::planner::ResourceFilter;
use crate::resource::ResourceKind;

/// Elastiform - Declarative Elasticsearch resource reconciliation.
#[derive(Parser, Debug)]
#[command(name = "elastiform")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the cluster configuration file.
    #[arg(short, long, global = true, env = "ELASTIFORM_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Log line format (text, json).
    #[arg(long, global = true, default_value = "text")]
    pub log_format: LogFormat,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create a starter project layout.
    Init {
        /// Directory to initialize.
        #[arg(short, long, default_value = ".")]
        directory: PathBuf,
    },

    /// Check the cluster configuration and every resource file.
    Validate {
        /// Resource selection.
        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Compare resource files with a cluster and show what would change.
    Plan {
        /// Cluster to plan against.
        #[arg(long)]
        cluster: String,

        /// Resource selection.
        #[command(flatten)]
        filter: FilterArgs,

        /// Output format (text, json).
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Plan, confirm and write the changes to a cluster.
    Apply {
        /// Cluster to apply to.
        #[arg(long)]
        cluster: String,

        /// Resource selection.
        #[command(flatten)]
        filter: FilterArgs,

        /// Skip the confirmation prompt.
        #[arg(short = 'y', long)]
        auto_approve: bool,
    },
}

/// Resource selection shared by `validate`, `plan` and `apply`.
#[derive(Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only consider these resource kinds (repeatable).
    #[arg(short = 't', long = "resource-type", value_parser = parse_resource_kind)]
    pub kinds: Vec<ResourceKind>,

    /// Only consider resources with these names (repeatable).
    #[arg(short = 'r', long = "resource")]
    pub names: Vec<String>,
}

impl FilterArgs {
    /// Builds the resource filter described by these arguments.
    #[must_use]
    pub fn to_filter(&self) -> ResourceFilter {
        ResourceFilter::all()
            .with_kinds(self.kinds.iter().copied())
            .with_names(self.names.iter().cloned())
    }
}

fn parse_resource_kind(value: &str) -> Result<ResourceKind, String> {
    value.parse()
}

/// Output format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// Log line format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Compact human-readable lines.
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_arguments() {
        let cli = Cli::try_parse_from([
            "elastiform",
            "plan",
            "--cluster",
            "prod",
            "-t",
            "index_template",
            "--resource-type",
            "ingest_pipelines",
            "-r",
            "logs",
            "-o",
            "json",
        ])
        .unwrap();

        let Commands::Plan {
            cluster,
            filter,
            output,
        } = cli.command
        else {
            panic!("expected plan command");
        };
        assert_eq!(cluster, "prod");
        assert_eq!(output, OutputFormat::Json);
        assert_eq!(
            filter.kinds,
            vec![ResourceKind::IndexTemplate, ResourceKind::IngestPipeline]
        );
        assert_eq!(filter.names, vec![String::from("logs")]);

        let selection = filter.to_filter();
        assert!(selection.matches(ResourceKind::IndexTemplate, "logs"));
        assert!(!selection.matches(ResourceKind::Index, "logs"));
        assert!(!selection.matches(ResourceKind::IndexTemplate, "metrics"));
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result = Cli::try_parse_from(["elastiform", "plan", "--cluster", "x", "-t", "alias"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_plan_requires_cluster() {
        assert!(Cli::try_parse_from(["elastiform", "plan"]).is_err());
    }

    #[test]
    fn test_apply_defaults() {
        let cli = Cli::try_parse_from(["elastiform", "apply", "--cluster", "local", "-y"]).unwrap();
        assert!(!cli.verbose);
        assert!(!cli.no_color);
        assert_eq!(cli.log_format, LogFormat::Text);

        let Commands::Apply {
            auto_approve,
            filter,
            ..
        } = cli.command
        else {
            panic!("expected apply command");
        };
        assert!(auto_approve);
        assert!(filter.to_filter().is_unrestricted());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "elastiform",
            "validate",
            "--no-color",
            "--log-format",
            "json",
            "-c",
            "ops/clusters.yaml",
        ])
        .unwrap();
        assert!(cli.no_color);
        assert_eq!(cli.log_format, LogFormat::Json);
        assert_eq!(cli.config, Some(PathBuf::from("ops/clusters.yaml")));
        assert!(matches!(cli.command, Commands::Validate { .. }));
    }

    #[test]
    fn test_init_directory() {
        let cli = Cli::try_parse_from(["elastiform", "init", "--directory", "search"]).unwrap();
        let Commands::Init { directory } = cli.command else {
            panic!("expected init command");
        };
        assert_eq!(directory, PathBuf::from("search"));
    }
}
