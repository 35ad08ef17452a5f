//! shipconf CLI tool.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "shipconf")]
#[command(about = "Resolve release-build configuration", long_about = None)]
struct Cli {
    /// Defaults file (KDL)
    #[arg(long, env = "SHIPCONF_DEFAULTS", default_value = "shipconf.kdl")]
    defaults: PathBuf,

    /// Emit logs as JSON
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve and print the build configuration
    Resolve {
        #[command(flatten)]
        inputs: ResolveArgs,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check that the build configuration resolves
    Validate {
        #[command(flatten)]
        inputs: ResolveArgs,
    },
    /// Show which archive paths the packaging exclusions drop
    CheckExcludes {
        /// Archive paths to check
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Signing properties file
    #[arg(long, env = "SHIPCONF_PROPERTIES", default_value = "key.properties")]
    pub properties: PathBuf,
    /// Resolve for a release build (signing credentials required)
    #[arg(long)]
    pub release: bool,
    /// Minimum platform version
    #[arg(long)]
    pub min_platform: Option<u32>,
    /// Target platform version
    #[arg(long)]
    pub target_platform: Option<u32>,
    /// Compile platform version
    #[arg(long)]
    pub compile_platform: Option<u32>,
    /// Version code
    #[arg(long)]
    pub version_code: Option<u32>,
    /// Version name
    #[arg(long)]
    pub version_name: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }

    match cli.command {
        Commands::Resolve { inputs, json } => {
            commands::resolve(&cli.defaults, &inputs, json)?;
        }
        Commands::Validate { inputs } => {
            commands::validate(&cli.defaults, &inputs)?;
        }
        Commands::CheckExcludes { paths } => {
            commands::check_excludes(&cli.defaults, &paths)?;
        }
    }

    Ok(())
}
