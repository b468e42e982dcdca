//! oxide-collections CLI
//!
//! Validates collection definitions and previews the SQL that migrates
//! them. Logs go to stderr; stdout carries only SQL or JSON.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use oxide_collections::prelude::*;

/// Declarative collection schemas for PostgreSQL.
#[derive(Parser)]
#[command(name = "oxide-collections")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Output format.
    #[arg(short, long, env = "OXIDE_COLLECTIONS_FORMAT", value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Enable verbose output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a collection definition.
    Validate {
        /// Definition file (JSON).
        definition: PathBuf,
    },

    /// Show the classified diff between two definitions.
    Diff {
        /// Old definition file.
        old: PathBuf,

        /// New definition file.
        new: PathBuf,

        /// Treat renamed fields as a drop plus an add.
        #[arg(long)]
        no_renames: bool,
    },

    /// Print the CREATE script of a collection.
    CreateSql {
        /// Definition file (JSON).
        definition: PathBuf,
    },

    /// Print the ALTER script migrating one definition to another.
    AlterSql {
        /// Old definition file.
        old: PathBuf,

        /// New definition file.
        new: PathBuf,

        /// Table to alter (defaults to the new definition's name).
        #[arg(short, long)]
        table: Option<String>,

        /// Treat renamed fields as a drop plus an add.
        #[arg(long)]
        no_renames: bool,

        /// Emit SQL even if it destroys data.
        #[arg(long)]
        allow_data_loss: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Validate { definition } => {
            let def = load(&definition)?;
            let result = validate(&def);
            if cli.format == Format::Json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else if result.valid {
                info!("Collection '{}' is valid.", def.name);
            }
            result.into_result(&def.name)?;
        }

        Commands::Diff {
            old,
            new,
            no_renames,
        } => {
            let plan = planner(no_renames, None).plan(Some(&load(&old)?), &load(&new)?)?;
            let Some(diff) = plan.diff else {
                anyhow::bail!("no diff for a new collection");
            };
            if cli.format == Format::Json {
                println!("{}", serde_json::to_string_pretty(&diff)?);
            } else {
                print_diff(&diff);
            }
        }

        Commands::CreateSql { definition } => {
            let plan = MigrationPlanner::new().plan(None, &load(&definition)?)?;
            emit(cli.format, &plan)?;
        }

        Commands::AlterSql {
            old,
            new,
            table,
            no_renames,
            allow_data_loss,
        } => {
            let plan = planner(no_renames, table).plan(Some(&load(&old)?), &load(&new)?)?;
            for warning in plan.warnings() {
                warn!("{warning}");
            }
            if !allow_data_loss {
                plan.ensure_no_data_loss()?;
            }
            emit(cli.format, &plan)?;
        }
    }

    Ok(())
}

fn load(path: &Path) -> anyhow::Result<CollectionDefinition> {
    info!("Loading {}", path.display());
    Ok(CollectionDefinition::from_path(path)?)
}

fn planner(no_renames: bool, table: Option<String>) -> MigrationPlanner {
    let mut options = DiffOptions::new();
    if no_renames {
        options = options.without_rename_detection();
    }
    let planner = MigrationPlanner::new().with_options(options);
    match table {
        Some(table) => planner.table(table),
        None => planner,
    }
}

fn emit(format: Format, plan: &MigrationPlan) -> anyhow::Result<()> {
    match format {
        Format::Json => println!("{}", serde_json::to_string_pretty(plan)?),
        Format::Text => println!("{}", plan.sql),
    }
    Ok(())
}

fn print_diff(diff: &SchemaDiff) {
    if !diff.has_changes {
        println!("No changes.");
        return;
    }
    for renamed in &diff.renamed_fields {
        println!(" ~ {} -> {}", renamed.old_name, renamed.new_name);
    }
    for field in &diff.added_fields {
        println!(" + {} ({})", field.name, field.kind);
    }
    for field in &diff.removed_fields {
        println!(" - {} ({})", field.name, field.kind);
    }
    for modified in &diff.modified_fields {
        let changed: Vec<&str> = modified
            .changed_attributes
            .iter()
            .map(|a| a.as_str())
            .collect();
        println!(" * {} [{}]", modified.name(), changed.join(", "));
    }
    for index in &diff.added_indexes {
        println!(" + index {}", index.name);
    }
    for index in &diff.removed_indexes {
        println!(" - index {}", index.name);
    }
    for modified in &diff.modified_indexes {
        println!(" * index {}", modified.new_index.name);
    }
    if !diff.warnings.is_empty() {
        println!();
        for warning in &diff.warnings {
            println!("{warning}");
        }
    }
}
