use crate::core::error;
use crate::core::output::{self, OutputFormat};
use crate::core::provision::{self, ProvisionReport};
use crate::core::schema::CollectionSchema;
use crate::core::store::{CollectionStore, StoredCollection};
use crate::core::time;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[clap(name = "collections", about = "Inspect, export and import collections")]
pub struct CollectionsCli {
    #[clap(subcommand)]
    pub command: CollectionsCommand,
}

#[derive(Subcommand, Debug)]
pub enum CollectionsCommand {
    /// List provisioned collections.
    List,
    /// Show one collection's fields.
    Show {
        name: String,
    },
    /// Write every collection schema as a JSON array.
    Export {
        /// Output file (defaults to stdout).
        #[clap(long)]
        out: Option<PathBuf>,
    },
    /// Provision collections from a JSON array; existing names are left alone.
    Import {
        #[clap(long)]
        file: PathBuf,
    },
}

pub fn export_collections(
    store: &dyn CollectionStore,
) -> Result<Vec<CollectionSchema>, error::SeedError> {
    Ok(store
        .list_collections()?
        .into_iter()
        .map(|c| c.schema)
        .collect())
}

pub fn write_export(store: &dyn CollectionStore, path: &Path) -> Result<usize, error::SeedError> {
    let schemas = export_collections(store)?;
    let body = serde_json::to_string_pretty(&schemas)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(error::SeedError::IoError)?;
    }
    fs::write(path, body).map_err(error::SeedError::IoError)?;
    Ok(schemas.len())
}

/// Reads an import file. A malformed file is an error; nothing is provisioned from it.
pub fn read_import(path: &Path) -> Result<Vec<CollectionSchema>, error::SeedError> {
    if !path.exists() {
        return Err(error::SeedError::NotFound(format!(
            "import file {}",
            path.display()
        )));
    }
    let content = fs::read_to_string(path).map_err(error::SeedError::IoError)?;
    let schemas: Vec<CollectionSchema> = serde_json::from_str(&content)?;
    Ok(schemas.into_iter().map(CollectionSchema::normalized).collect())
}

pub fn import_collections(
    store: &dyn CollectionStore,
    path: &Path,
) -> Result<ProvisionReport, error::SeedError> {
    let schemas = read_import(path)?;
    Ok(provision::provision_all(store, &schemas))
}

fn find_or_not_found(
    store: &dyn CollectionStore,
    name: &str,
) -> Result<StoredCollection, error::SeedError> {
    store
        .find_collection(name)?
        .ok_or_else(|| error::SeedError::NotFound(format!("collection '{}'", name)))
}

pub fn run_collections_cli(
    store: &dyn CollectionStore,
    cli: CollectionsCli,
    format: OutputFormat,
) -> Result<(), error::SeedError> {
    match cli.command {
        CollectionsCommand::List => {
            let collections = store.list_collections()?;
            match format {
                OutputFormat::Json => {
                    let items: Vec<_> = collections
                        .iter()
                        .map(|c| {
                            serde_json::json!({
                                "id": c.id,
                                "name": c.schema.name,
                                "type": c.schema.kind,
                                "fields": c.schema.fields.len(),
                                "fingerprint": c.fingerprint,
                                "created": c.created,
                            })
                        })
                        .collect();
                    let envelope = time::command_envelope(
                        "collections.list",
                        "ok",
                        serde_json::json!({ "collections": items }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
                OutputFormat::Text => {
                    if collections.is_empty() {
                        println!("No collections provisioned.");
                    }
                    for c in &collections {
                        println!(
                            "{}  {}  {} fields  {}",
                            c.schema.name.bright_white().bold(),
                            c.schema.kind,
                            c.schema.fields.len(),
                            c.id.dimmed()
                        );
                    }
                }
            }
        }
        CollectionsCommand::Show { name } => {
            let stored = find_or_not_found(store, &name)?;
            match format {
                OutputFormat::Json => {
                    let envelope = time::command_envelope(
                        "collections.show",
                        "ok",
                        serde_json::json!({ "collection": stored }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
                OutputFormat::Text => {
                    println!(
                        "{} ({}, {})",
                        stored.schema.name.bright_white().bold(),
                        stored.schema.kind,
                        stored.id
                    );
                    for field in &stored.schema.fields {
                        let mut line = format!("  {:<12} {}", field.name, field.field_type());
                        if field.required {
                            line.push_str(" required");
                        }
                        if let Some(values) = field.select_values() {
                            line.push_str(&format!(" [{}]", values.join(", ")));
                        }
                        println!("{}", line);
                    }
                }
            }
        }
        CollectionsCommand::Export { out } => match out {
            Some(path) => {
                let count = write_export(store, &path)?;
                match format {
                    OutputFormat::Json => {
                        let envelope = time::command_envelope(
                            "collections.export",
                            "ok",
                            serde_json::json!({
                                "path": path.display().to_string(),
                                "count": count,
                            }),
                        );
                        println!("{}", serde_json::to_string_pretty(&envelope)?);
                    }
                    OutputFormat::Text => {
                        println!("Exported {} collections to {}", count, path.display());
                    }
                }
            }
            None => {
                let schemas = export_collections(store)?;
                println!("{}", serde_json::to_string_pretty(&schemas)?);
            }
        },
        CollectionsCommand::Import { file } => {
            let report = import_collections(store, &file)?;
            match format {
                OutputFormat::Json => {
                    let envelope = time::command_envelope(
                        "collections.import",
                        if report.has_failures() { "partial" } else { "ok" },
                        serde_json::json!({
                            "report": report,
                            "warnings": report.warnings(),
                        }),
                    );
                    println!("{}", serde_json::to_string_pretty(&envelope)?);
                }
                OutputFormat::Text => {
                    println!("Imported from {}", file.display());
                    println!("{}", output::render_report(&report));
                }
            }
        }
    }
    Ok(())
}
