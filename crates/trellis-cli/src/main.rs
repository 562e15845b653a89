use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use tracing_subscriber::EnvFilter;

use trellis_core::config::Config;
use trellis_core::storage::FileStorage;

mod commands;

#[derive(Parser)]
#[command(name = "trellis")]
#[command(about = "QA functional-coverage catalog", long_about = None)]
struct Cli {
    /// Path to the catalog file (overrides config).
    #[arg(long, global = true)]
    catalog: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize an empty catalog
    Init,
    /// Add an entity to the catalog
    Add {
        /// Entity kind: module, epic, feature, story, page, element, service
        #[arg(long)]
        kind: String,
        #[arg(long)]
        title: String,
        /// Owning module title (ancestry hint)
        #[arg(long)]
        module: Option<String>,
        /// Owning epic title (ancestry hint)
        #[arg(long)]
        epic: Option<String>,
        /// Owning feature title (ancestry hint)
        #[arg(long)]
        feature: Option<String>,
        /// Explicit parent entity id; its id chain is reused for the new id
        #[arg(long)]
        parent: Option<String>,
        /// Mark as business-critical
        #[arg(long)]
        critical: bool,
    },
    /// List catalog entities
    List {
        /// Filter by kind
        #[arg(long)]
        kind: Option<String>,
    },
    /// Create a relation between two entities
    Link {
        source: String,
        target: String,
        /// Relation kind slug (hierarchy, functional, test-coverage, ...)
        #[arg(long, default_value = "hierarchy")]
        kind: String,
        #[arg(long)]
        note: Option<String>,
    },
    /// Deactivate a relation by record id (soft delete)
    Unlink { id: String },
    /// Build the graph view and print it as JSON
    Graph {
        /// Write to a file instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Persist resolver-inferred hierarchy edges as relations
    Materialize,
    /// Reconcile external tracker data into the catalog
    Sync {
        /// Read records from a JSON export file
        #[arg(long)]
        from: Option<PathBuf>,
        /// Fetch records from a tracker REST API
        #[arg(long)]
        url: Option<String>,
        /// Merge policy: smart, local_priority, external_priority
        #[arg(long)]
        policy: Option<String>,
        /// Report what would change without saving
        #[arg(long)]
        dry_run: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load()?;

    let catalog_path = cli
        .catalog
        .unwrap_or_else(|| config.storage.catalog_file.clone());
    let storage = FileStorage::new(catalog_path);

    match cli.command {
        Commands::Init => commands::catalog::init(&storage),
        Commands::Add {
            kind,
            title,
            module,
            epic,
            feature,
            parent,
            critical,
        } => commands::catalog::add(
            &storage,
            &kind,
            &title,
            module.as_deref(),
            epic.as_deref(),
            feature.as_deref(),
            parent.as_deref(),
            critical,
        ),
        Commands::List { kind } => commands::catalog::list(&storage, kind.as_deref()),
        Commands::Link {
            source,
            target,
            kind,
            note,
        } => commands::catalog::link(&storage, &source, &target, &kind, note),
        Commands::Unlink { id } => commands::catalog::unlink(&storage, &id),
        Commands::Graph { output } => commands::graph::run(&storage, output.as_deref()),
        Commands::Materialize => commands::catalog::materialize(&storage),
        Commands::Sync {
            from,
            url,
            policy,
            dry_run,
        } => {
            commands::sync::run(
                &storage,
                &config,
                from.as_deref(),
                url.as_deref(),
                policy.as_deref(),
                dry_run,
            )
            .await
        }
    }
}
