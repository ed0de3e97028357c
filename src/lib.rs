//! classroom-seed: startup schema provisioning for the classroom backend.
//!
//! On startup the host runs its "before serve" hooks. This crate registers one that
//! ensures two record collections exist in the backing store:
//!
//! - `behaviors`: `label` (text), `pts` (number), `type` (select: wow | nono), `icon` (text)
//! - `classes`: `name` (text), `teacher` (text), `students` (json), `tasks` (json)
//!
//! Provisioning is idempotent and best-effort. A collection that already exists is
//! logged as a warning; any other failure is logged and reported; startup continues
//! either way.
//!
//! # Examples
//!
//! ```bash
//! # Create the data directory, config file and collection registry
//! classroom-seed --dir ./pb_data init
//!
//! # Run the startup hooks (provisions the built-in collections)
//! classroom-seed --dir ./pb_data bootstrap
//!
//! # Inspect what is there
//! classroom-seed --dir ./pb_data status
//! classroom-seed --dir ./pb_data collections show behaviors
//! ```
//!
//! # Crate Structure
//!
//! - [`core`]: descriptors, store, provisioning, lifecycle, config and logging
//! - [`plugins`]: the `collections` and `status` command surfaces

pub mod core;
pub mod plugins;

use crate::core::{
    catalog, config, error,
    lifecycle::{self, App},
    logging,
    output::{self, OutputFormat},
    store::{CollectionStore, MemoryStore, SqliteStore},
    time,
};
use crate::plugins::{collections, status};

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Debug)]
#[clap(
    name = "classroom-seed",
    version = env!("CARGO_PKG_VERSION"),
    about = "Provision the classroom backend's collections"
)]
struct Cli {
    /// Data directory (defaults to $CLASSROOM_SEED_DIR, then ./pb_data).
    #[clap(long, global = true)]
    dir: Option<PathBuf>,
    /// Output format.
    #[clap(long, value_enum, global = true, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the data directory, config file and collection registry
    Init,

    /// Run the startup hooks: provision the built-in collections
    Bootstrap {
        /// Provision against an in-memory copy of the store; nothing is written.
        #[clap(long)]
        dry_run: bool,
    },

    /// Inspect, export and import collections
    Collections(collections::CollectionsCli),

    /// Report whether the built-in collections are provisioned
    Status,

    /// Print the version
    Version,
}

/// Builds the host app with the built-in collections registered for provisioning.
pub fn build_app<S: CollectionStore>(store: S) -> App<S> {
    let mut app = App::new(store);
    lifecycle::register_schema_provisioner(&mut app, catalog::default_collections());
    app
}

struct Context {
    data_dir: PathBuf,
    config: config::SeedConfig,
}

impl Context {
    fn load(dir: Option<PathBuf>) -> Result<Self, error::SeedError> {
        let cwd = std::env::current_dir()?;
        let data_dir = config::resolve_data_dir(dir, &cwd);
        let config = config::load_config(&data_dir)?;
        logging::init_logging(&config.log)
            .map_err(|e| error::SeedError::ConfigError(e.to_string()))?;
        Ok(Self { data_dir, config })
    }

    fn open_store(&self) -> Result<SqliteStore, error::SeedError> {
        SqliteStore::open(&self.data_dir, &self.config.db_file, self.config.audit)
    }
}

pub fn run() -> Result<(), error::SeedError> {
    let cli = Cli::parse();
    let format = cli.format;

    match cli.command {
        Command::Version => {
            println!("v{}", VERSION);
        }
        Command::Init => {
            let ctx = Context::load(cli.dir)?;
            let wrote_config = config::write_default_config(&ctx.data_dir)?;
            let store = ctx.open_store()?;
            match format {
                OutputFormat::Json => {
                    let envelope = time::command_envelope(
                        "init",
                        "ok",
                        serde_json::json!({
                            "data_dir": ctx.data_dir.display().to_string(),
                            "db_path": store.db_path().display().to_string(),
                            "config_written": wrote_config,
                        }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
                OutputFormat::Text => {
                    println!(
                        "{} store initialized at {}",
                        "✓".bright_green(),
                        store.db_path().display()
                    );
                    if wrote_config {
                        println!(
                            "  wrote {}",
                            ctx.data_dir.join(config::CONFIG_FILE_NAME).display()
                        );
                    }
                }
            }
        }
        Command::Bootstrap { dry_run } => {
            let ctx = Context::load(cli.dir)?;
            let store = ctx.open_store()?;
            let startup = if dry_run {
                build_app(MemoryStore::seeded(store.list_collections()?)).start()?
            } else {
                build_app(store).start()?
            };
            let warnings = startup.warnings();
            match format {
                OutputFormat::Json => {
                    let envelope = time::command_envelope(
                        "bootstrap",
                        "ok",
                        serde_json::json!({
                            "dry_run": dry_run,
                            "reports": startup.reports,
                            "warnings": warnings,
                        }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
                OutputFormat::Text => {
                    for report in &startup.reports {
                        println!("{}", output::render_report(report));
                    }
                    if !warnings.is_empty() {
                        println!(
                            "{} {} warning(s); startup continues",
                            "▸".bright_yellow(),
                            warnings.len()
                        );
                    }
                    if dry_run {
                        println!("{} dry run: no collections were written", "▸".bright_yellow());
                    }
                    println!("{} startup complete", "✓".bright_green());
                }
            }
        }
        Command::Collections(collections_cli) => {
            let ctx = Context::load(cli.dir)?;
            let store = ctx.open_store()?;
            collections::run_collections_cli(&store, collections_cli, format)?;
        }
        Command::Status => {
            let ctx = Context::load(cli.dir)?;
            let store = ctx.open_store()?;
            let report = status::status_report(&store)?;
            match format {
                OutputFormat::Json => {
                    let envelope = time::command_envelope(
                        "status",
                        if report.fully_provisioned() { "ok" } else { "incomplete" },
                        serde_json::json!({
                            "db_path": store.db_path().display().to_string(),
                            "report": report,
                        }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
                OutputFormat::Text => {
                    println!("Store: {}", store.db_path().display());
                    println!("Collections: {}", report.total_collections);
                    for entry in &report.builtins {
                        let state = match entry.state {
                            status::CollectionState::Provisioned => {
                                entry.state.to_string().bright_green()
                            }
                            status::CollectionState::Missing => {
                                entry.state.to_string().bright_red()
                            }
                            status::CollectionState::Drifted => {
                                entry.state.to_string().bright_yellow()
                            }
                        };
                        println!("  {:<10} {}", entry.name, state);
                    }
                }
            }
        }
    }
    Ok(())
}
