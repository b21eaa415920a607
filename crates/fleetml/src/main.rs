mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use fleetml_cloud::{CancellationToken, ResourceKind};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "fleetml")]
#[command(about = "Provision versioned Azure ML resources", long_about = None)]
#[command(version)]
struct Cli {
    #[command(flatten)]
    scope: ScopeArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Target workspace and environment, shared by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct ScopeArgs {
    /// Azure subscription ID
    #[arg(long, global = true, env = "AZURE_SUBSCRIPTION_ID")]
    pub subscription: Option<String>,

    /// Resource group containing the workspace
    #[arg(long, global = true, env = "AZURE_RESOURCE_GROUP")]
    pub resource_group: Option<String>,

    /// Azure ML workspace name
    #[arg(long, global = true, env = "AZUREML_WORKSPACE_NAME")]
    pub workspace: Option<String>,

    /// Environment whose `.fleetml/<env>/.env` values are read and published
    #[arg(
        short,
        long,
        global = true,
        env = "FLEETML_ENV",
        default_value = "default"
    )]
    pub environment: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Provision a service's resources
    Provision {
        /// Service name in the project file
        service: String,

        /// Provision only these kinds (environment, model, endpoint, deployment, flow)
        #[arg(long, value_delimiter = ',')]
        only: Vec<ResourceKind>,
    },
    /// Online endpoint operations
    Endpoint {
        #[command(subcommand)]
        command: EndpointCommands,
    },
    /// Workspace operations
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommands,
    },
    /// Show version information
    Version,
}

#[derive(Subcommand)]
enum EndpointCommands {
    /// Show an online endpoint
    Show {
        /// Endpoint name
        name: String,
    },
}

#[derive(Subcommand)]
enum WorkspaceCommands {
    /// Check that the workspace exists and matches the configured name
    Check,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("{}", "Interrupted, cancelling...".yellow());
            on_interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Provision { service, only } => {
            commands::provision::handle(&cli.scope, &service, &only, &cancel).await?;
        }
        Commands::Endpoint { command } => match command {
            EndpointCommands::Show { name } => {
                commands::endpoint::handle_show(&cli.scope, &name, &cancel).await?;
            }
        },
        Commands::Workspace { command } => match command {
            WorkspaceCommands::Check => {
                commands::workspace::handle_check(&cli.scope, &cancel).await?;
            }
        },
        Commands::Version => {
            println!("fleetml {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
