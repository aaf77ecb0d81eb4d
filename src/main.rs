/// maas-admin - MAAS cluster management for orchestration agents
///
/// Every command resolves credentials, opens its own signed session against the
/// MAAS API and prints the resulting record as JSON on stdout.
mod config;
mod maas;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AgentConfig, ConnectionOptions};
use crate::maas::models::{Cluster, ClusterUpdate, ProjectRef};
use crate::maas::{ClusterManager, MaasClient};

#[derive(Parser)]
#[command(name = "maas-admin")]
#[command(about = "Manage MAAS clusters", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Minion configuration file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Pillar data file (YAML), consulted after the minion configuration
    #[arg(short, long)]
    pillar: Option<PathBuf>,

    /// MAAS API token (consumer_key:token_key:token_secret), overrides maas.token
    #[arg(long)]
    connection_token: Option<String>,

    /// MAAS API url, overrides maas.url
    #[arg(long)]
    connection_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List all clusters keyed by name
    ClusterList,

    /// Show a single cluster
    ClusterGet {
        cluster_name: String,
    },

    /// Create a cluster in a project unless its url is already registered
    ClusterCreate {
        cluster_name: String,

        /// Cluster url
        #[arg(long)]
        url: String,

        #[command(flatten)]
        project: ProjectArgs,
    },

    /// Update name, domain or status of a cluster
    ClusterUpdate {
        /// Cluster uuid; when omitted the cluster is looked up by --old-cluster-name
        #[arg(long)]
        cluster_id: Option<String>,

        #[arg(long)]
        old_cluster_name: Option<String>,

        #[arg(long)]
        new_cluster_name: Option<String>,

        /// DNS zone name
        #[arg(long)]
        domain: Option<String>,

        #[arg(long)]
        status: Option<String>,
    },

    /// Delete the project cluster registered under a url
    ClusterDelete {
        cluster_url: String,

        #[command(flatten)]
        project: ProjectArgs,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct ProjectArgs {
    /// Project name
    #[arg(long)]
    project_name: Option<String>,

    /// Project id
    #[arg(long)]
    project_id: Option<String>,
}

impl ProjectArgs {
    fn to_ref(&self) -> Result<ProjectRef> {
        match (&self.project_name, &self.project_id) {
            (Some(name), _) => Ok(ProjectRef::Name(name.clone())),
            (None, Some(id)) => Ok(ProjectRef::Id(id.clone())),
            (None, None) => anyhow::bail!("Either --project-name or --project-id is required"),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize tracing; stdout is reserved for the result record
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("maas_admin={}", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Execute command
    let result = match cli.command {
        Commands::ClusterList => cluster_list(&cli).await,
        Commands::ClusterGet { ref cluster_name } => cluster_get(&cli, cluster_name).await,
        Commands::ClusterCreate {
            ref cluster_name,
            ref url,
            ref project,
        } => cluster_create(&cli, cluster_name, url, project).await,
        Commands::ClusterUpdate {
            ref cluster_id,
            ref old_cluster_name,
            ref new_cluster_name,
            ref domain,
            ref status,
        } => {
            let update = ClusterUpdate {
                cluster_name: new_cluster_name.clone(),
                domain: domain.clone(),
                status: status.clone(),
            };
            cluster_update(&cli, cluster_id.as_deref(), old_cluster_name.as_deref(), update).await
        }
        Commands::ClusterDelete {
            ref cluster_url,
            ref project,
        } => cluster_delete(&cli, cluster_url, project).await,
    };

    if let Err(e) = result {
        error!("Error: {:#}", e);
        std::process::exit(1);
    }
}

/// Resolve credentials and open a session for one command
fn connect(cli: &Cli) -> Result<ClusterManager> {
    let config = AgentConfig::load(cli.config.as_deref(), cli.pillar.as_deref())
        .context("Failed to load configuration")?;
    let options = ConnectionOptions {
        token: cli.connection_token.clone(),
        url: cli.connection_url.clone(),
    };

    let client = MaasClient::connect(&config, &options)?;
    Ok(ClusterManager::new(client))
}

fn print_record<T: Serialize>(record: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(record).context("Failed to encode result")?;
    println!("{}", json);
    Ok(())
}

/// List all clusters
async fn cluster_list(cli: &Cli) -> Result<()> {
    let clusters = connect(cli)?
        .list_clusters()
        .await
        .context("Failed to list clusters")?;
    print_record(&clusters)
}

/// Show one cluster as `{name: record}`
async fn cluster_get(cli: &Cli, cluster_name: &str) -> Result<()> {
    let outcome = connect(cli)?
        .get_cluster(cluster_name)
        .await
        .context("Failed to fetch clusters")?;
    print_record(&outcome.map(Cluster::keyed))
}

/// Create a cluster
async fn cluster_create(
    cli: &Cli,
    cluster_name: &str,
    cluster_url: &str,
    project: &ProjectArgs,
) -> Result<()> {
    let project = project.to_ref()?;
    info!("Ensuring cluster {} in project {}", cluster_name, project);

    let outcome = connect(cli)?
        .create_cluster(cluster_name, cluster_url, &project)
        .await
        .context("Failed to create cluster")?;
    print_record(&outcome.map(Cluster::keyed))
}

/// Update a cluster
async fn cluster_update(
    cli: &Cli,
    cluster_id: Option<&str>,
    old_cluster_name: Option<&str>,
    update: ClusterUpdate,
) -> Result<()> {
    let outcome = connect(cli)?
        .update_cluster(cluster_id, old_cluster_name, &update)
        .await
        .context("Failed to update cluster")?;
    print_record(&outcome)
}

/// Delete a cluster
async fn cluster_delete(cli: &Cli, cluster_url: &str, project: &ProjectArgs) -> Result<()> {
    let project = project.to_ref()?;
    let outcome = connect(cli)?
        .delete_cluster(cluster_url, &project)
        .await
        .context("Failed to delete cluster")?;
    print_record(&outcome)
}
