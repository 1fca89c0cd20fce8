//! sfa - sound file association command line
//!
//! Every command prints JSON to stdout. Logs go to stderr; `RUST_LOG`
//! overrides the configured level.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;

use sfa_common::config::{self as common_config, TomlConfig};
use sfa_reconcile::catalog::naming::{self, DEFAULT_TEMPLATE};
use sfa_reconcile::catalog::{self, Catalog, JsonCatalog};
use sfa_reconcile::models::Operation;
use sfa_reconcile::services::{
    create_backup, AudioFolderScanner, FileHistory, OperationExecutor, RuleSet, SuffixResolver,
};
use sfa_reconcile::workflow;
use sfa_reconcile::{ProjectContext, SuffixMapping};

/// Command-line arguments for sfa
#[derive(Parser, Debug)]
#[command(name = "sfa")]
#[command(about = "Reconcile a record catalog against an audio folder")]
#[command(version)]
struct Args {
    /// Config file (default: $SFA_CONFIG, then ~/.config/sfa/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Audio folder (default: $SFA_AUDIO_FOLDER, then the config file)
    #[arg(short, long, global = true)]
    audio_folder: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List audio files in the audio folder
    Scan,

    /// Discover suffixes from a catalog's base filenames
    Suffixes {
        /// Catalog file (JSON array of records)
        #[arg(long)]
        catalog: PathBuf,
    },

    /// Report missing and orphaned files
    Reconcile {
        #[arg(long)]
        catalog: PathBuf,

        /// Suffix mapping (tab exchange format, or JSON export)
        #[arg(long)]
        mapping: Option<PathBuf>,
    },

    /// Suggest renames for orphaned files
    Match {
        #[arg(long)]
        catalog: PathBuf,

        #[arg(long)]
        mapping: Option<PathBuf>,

        /// Print a proposed operation batch instead of the suggestions
        #[arg(long)]
        plan: bool,
    },

    /// Execute an operation batch (JSON array)
    Execute {
        batch: PathBuf,

        /// Back up the audio folder into this directory first
        #[arg(long, value_name = "DIR")]
        backup_to: Option<PathBuf>,
    },

    /// Copy the audio folder into a timestamped directory
    Backup {
        /// Parent directory for the backup
        dest: PathBuf,
    },

    /// Show what happened to a file
    History {
        /// Filename, current or former
        file: String,
    },

    /// Generate base filenames for records that lack one
    GenerateNames {
        #[arg(long)]
        catalog: PathBuf,

        /// Template naming fields in braces
        #[arg(long, default_value = DEFAULT_TEMPLATE)]
        template: String,

        /// Write the names into the catalog instead of previewing
        #[arg(long)]
        apply: bool,
    },

    /// Convert a suffix mapping between the tab format and JSON
    Mapping {
        file: PathBuf,

        /// Print the JSON export document (default: tab format)
        #[arg(long)]
        json: bool,
    },

    /// Configuration file management
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a config file with default settings
    Init {
        /// Destination (default: ~/.config/sfa/config.toml)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let loaded = common_config::load_config(args.config.as_deref());
    let level = loaded
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&level)),
        )
        .init();

    tracing::debug!(
        version = env!("CARGO_PKG_VERSION"),
        git = env!("GIT_HASH"),
        built = env!("BUILD_TIMESTAMP"),
        "sfa starting"
    );

    let toml_config = loaded.context("Failed to load configuration")?;
    run(args, toml_config)
}

fn run(args: Args, toml_config: TomlConfig) -> Result<()> {
    let project = |toml_config: &TomlConfig| -> Result<ProjectContext> {
        ProjectContext::from_config(args.audio_folder.as_deref(), toml_config)
            .context("Failed to resolve audio folder")
    };

    match &args.command {
        Command::Scan => {
            let ctx = project(&toml_config)?;
            let result = AudioFolderScanner::new(&ctx.audio_extensions)
                .scan_with_stats(&ctx.audio_folder)
                .context("Scan failed")?;
            print_json(&result)
        }

        Command::Suffixes { catalog: path } => {
            let ctx = project(&toml_config)?;
            let records = open_catalog(path)?;
            let actual = workflow::scan_folder(&ctx)?;
            let bases = workflow::base_names(&ctx, records.records());

            let resolver = SuffixResolver::new(ctx.case_sensitive);
            #[derive(Serialize)]
            struct Output {
                resolution: sfa_reconcile::models::SuffixResolution,
                extension_mismatches: Vec<sfa_reconcile::models::ExtensionMismatch>,
                duplicate_references: std::collections::BTreeMap<String, Vec<usize>>,
                empty_base_filenames: Vec<usize>,
            }
            print_json(&Output {
                resolution: resolver.resolve(&actual, &bases),
                extension_mismatches: resolver.extension_mismatches(&actual, &bases),
                duplicate_references: catalog::duplicate_references(records.records(), &ctx.fields),
                empty_base_filenames: catalog::empty_base_filenames(records.records(), &ctx.fields),
            })
        }

        Command::Reconcile {
            catalog: path,
            mapping,
        } => {
            let ctx = project(&toml_config)?;
            let analysis = analyze(&ctx, &toml_config, path, mapping.as_deref())?;
            info!(
                missing = analysis.report.missing.len(),
                orphaned = analysis.report.orphaned.len(),
                "Reconciled"
            );
            print_json(&analysis.report)
        }

        Command::Match {
            catalog: path,
            mapping,
            plan,
        } => {
            let ctx = project(&toml_config)?;
            let analysis = analyze(&ctx, &toml_config, path, mapping.as_deref())?;
            if *plan {
                print_json(&workflow::plan_batch(&analysis))
            } else {
                print_json(&analysis.suggestions)
            }
        }

        Command::Execute { batch, backup_to } => {
            let ctx = project(&toml_config)?;
            let text = fs::read_to_string(batch)
                .with_context(|| format!("Failed to read batch {}", batch.display()))?;
            let operations: Vec<Operation> =
                serde_json::from_str(&text).context("Invalid operation batch")?;

            if let Some(parent) = backup_to {
                let dest = create_backup(&ctx.audio_folder, parent).context("Backup failed")?;
                info!(path = %dest.display(), "Backup created before execution");
            }

            let mut executor = OperationExecutor::new(&ctx).context("Failed to load history")?;
            let report = executor.execute(&operations).context("Batch rejected")?;
            print_json(&report)?;
            if !report.success {
                bail!("{} operation(s) failed", report.failed);
            }
            Ok(())
        }

        Command::Backup { dest } => {
            let ctx = project(&toml_config)?;
            let path = create_backup(&ctx.audio_folder, dest).context("Backup failed")?;
            print_json(&serde_json::json!({ "backup_path": path }))
        }

        Command::History { file } => {
            let ctx = project(&toml_config)?;
            let history = FileHistory::load(&ctx.history_path()).context("Failed to load history")?;
            let trail: std::collections::BTreeMap<&str, _> = history.trail(file).into_iter().collect();
            print_json(&trail)
        }

        Command::GenerateNames {
            catalog: path,
            template,
            apply,
        } => {
            let fields = toml_config.fields.clone();
            let mut catalog = open_catalog(path)?;
            if *apply {
                let count = naming::apply_generated(&mut catalog, &fields, template)
                    .context("Failed to update catalog")?;
                print_json(&serde_json::json!({ "updated": count }))
            } else {
                print_json(&naming::preview(catalog.records(), &fields, template))
            }
        }

        Command::Mapping { file, json } => {
            let mapping = load_mapping(file)?;
            if *json {
                println!("{}", mapping.to_export_json()?);
            } else {
                print!("{}", mapping.to_exchange());
            }
            Ok(())
        }

        Command::Config {
            action: ConfigCommand::Init { path, force },
        } => {
            let path = match path {
                Some(p) => p.clone(),
                None => common_config::default_config_path()
                    .context("No config directory on this platform; pass a path")?,
            };
            if path.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", path.display());
            }
            common_config::write_toml_config(&TomlConfig::default(), &path)?;
            info!(path = %path.display(), "Config written");
            print_json(&serde_json::json!({ "config_path": path }))
        }
    }
}

fn analyze(
    ctx: &ProjectContext,
    toml_config: &TomlConfig,
    catalog_path: &Path,
    mapping_path: Option<&Path>,
) -> Result<workflow::Analysis> {
    let catalog = open_catalog(catalog_path)?;
    let mapping = mapping_path.map(load_mapping).transpose()?;
    let rules = RuleSet::from_config(toml_config);

    workflow::analyze_folder(ctx, catalog.records(), mapping.as_ref(), &rules)
        .context("Reconciliation failed")
}

fn open_catalog(path: &Path) -> Result<JsonCatalog> {
    JsonCatalog::open(path).with_context(|| format!("Failed to open catalog {}", path.display()))
}

fn load_mapping(path: &Path) -> Result<SuffixMapping> {
    workflow::load_mapping(path).with_context(|| format!("Invalid mapping {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
