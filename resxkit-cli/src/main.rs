mod view;

use std::fs::File;
use std::path::{Path, PathBuf};

use clap::{ArgAction, Parser, Subcommand};
use resxkit::{CodeReferenceTracker, CultureKey, ResourceManager, export_to_string, import_table};
use resxkit_cli::{open_manager, validation};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::view::{print_entities, print_references, print_rule_failures, print_snapshot_diff};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Increase log output (-v info, -vv debug, -vvv trace); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (defaults to resxkit.toml in the root directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Glob of project-relative paths to skip; may be repeated
    #[arg(long = "exclude", global = true)]
    exclude: Vec<String>,

    #[command(subcommand)]
    commands: Commands,
}

/// Supported subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// List resources and their entries.
    List {
        /// Root directory to scan
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Only show this culture next to the neutral value
        #[arg(short, long)]
        lang: Option<String>,

        /// Display full values without truncation
        #[arg(long)]
        full: bool,
    },

    /// Check translations against the neutral text; fails if any rule is violated.
    Validate {
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Print violations as JSON
        #[arg(long)]
        json: bool,
    },

    /// Find where resource keys are used in source files.
    Refs {
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Only list keys without any reference
        #[arg(long)]
        unused: bool,
    },

    /// Sort the nodes of every resource file by key.
    Sort {
        #[arg(default_value = ".")]
        root: PathBuf,
    },

    /// Export all entries as tab separated text.
    Export {
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Import a tab separated table produced by `export`.
    Import {
        #[arg(default_value = ".")]
        root: PathBuf,

        /// The table to import
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Add a culture file to every resource that lacks it.
    AddLanguage {
        #[arg(default_value = ".")]
        root: PathBuf,

        /// Culture tag, e.g. de or fr-FR
        #[arg(short, long)]
        culture: String,
    },

    /// Save the current values and comments to a JSON snapshot.
    Snapshot {
        #[arg(default_value = ".")]
        root: PathBuf,

        #[arg(short, long)]
        output: PathBuf,
    },

    /// Show what changed since a snapshot.
    Diff {
        #[arg(default_value = ".")]
        root: PathBuf,

        #[arg(short, long)]
        snapshot: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn save(manager: &mut ResourceManager) -> Result<usize, String> {
    manager.save().map_err(|e| e.to_string())
}

fn run_refs(manager: &mut ResourceManager, unused: bool) -> Result<(), String> {
    let mut tracker = CodeReferenceTracker::new();
    manager.find_code_references(&mut tracker);
    let results = tracker
        .wait()
        .ok_or_else(|| "Code reference scan did not finish".to_string())?;
    manager.apply_code_references(&results);
    let printed = print_references(manager, unused);
    info!("{} keys printed", printed);
    Ok(())
}

fn run_add_language(manager: &mut ResourceManager, tag: &str) -> Result<(), String> {
    validation::validate_culture(tag)?;
    let culture = CultureKey::parse(tag).map_err(|e| e.to_string())?;
    let mut added = 0;
    for entity in manager.entities_mut() {
        if entity.language(&culture).is_some() {
            continue;
        }
        let identity = entity.identity().to_string();
        entity
            .add_language(culture.clone())
            .map_err(|e| format!("{}: {}", identity, e))?;
        added += 1;
    }
    println!("Added {} to {} resource(s)", culture.tag(), added);
    Ok(())
}

fn write_output(path: Option<&Path>, text: &str) -> Result<(), String> {
    match path {
        Some(path) => {
            validation::validate_output_path(path)?;
            std::fs::write(path, text).map_err(|e| format!("Cannot write {}: {}", path.display(), e))
        }
        None => {
            print!("{}", text);
            Ok(())
        }
    }
}

fn run(args: Args) -> Result<(), String> {
    let config = args.config.as_deref();
    let exclude = &args.exclude;

    match args.commands {
        Commands::List { root, lang, full } => {
            let manager = open_manager(&root, config, exclude)?;
            let lang = lang
                .map(|l| CultureKey::parse(&l).map_err(|e| e.to_string()))
                .transpose()?;
            if print_entities(&manager, lang.as_ref(), full) == 0 {
                return Err("No resources found".to_string());
            }
            Ok(())
        }
        Commands::Validate { root, json } => {
            let manager = open_manager(&root, config, exclude)?;
            match print_rule_failures(&manager, json) {
                0 => Ok(()),
                count => Err(format!("{} entries violate translation rules", count)),
            }
        }
        Commands::Refs { root, unused } => {
            let mut manager = open_manager(&root, config, exclude)?;
            run_refs(&mut manager, unused)
        }
        Commands::Sort { root } => {
            let mut manager = open_manager(&root, config, exclude)?;
            for entity in manager.entities_mut() {
                entity.sort_nodes().map_err(|e| e.to_string())?;
            }
            println!("Sorted {} resource(s)", save(&mut manager)?);
            Ok(())
        }
        Commands::Export { root, output } => {
            let manager = open_manager(&root, config, exclude)?;
            let text = export_to_string(&manager).map_err(|e| e.to_string())?;
            write_output(output.as_deref(), &text)
        }
        Commands::Import { root, input } => {
            validation::validate_file_path(&input)?;
            let mut manager = open_manager(&root, config, exclude)?;
            let file = File::open(&input).map_err(|e| format!("Cannot read {}: {}", input.display(), e))?;
            let summary = import_table(&mut manager, file).map_err(|e| e.to_string())?;
            let saved = save(&mut manager)?;
            println!(
                "Imported {} row(s): {} cell(s) changed, {} key(s) added, {} row(s) skipped, {} resource(s) saved",
                summary.rows, summary.changed_cells, summary.added_keys, summary.skipped_rows, saved
            );
            Ok(())
        }
        Commands::AddLanguage { root, culture } => {
            let mut manager = open_manager(&root, config, exclude)?;
            run_add_language(&mut manager, &culture)
        }
        Commands::Snapshot { root, output } => {
            let manager = open_manager(&root, config, exclude)?;
            let json = manager.create_snapshot().to_json().map_err(|e| e.to_string())?;
            write_output(Some(&output), &json)
        }
        Commands::Diff { root, snapshot } => {
            validation::validate_file_path(&snapshot)?;
            let mut manager = open_manager(&root, config, exclude)?;
            let json = std::fs::read_to_string(&snapshot)
                .map_err(|e| format!("Cannot read {}: {}", snapshot.display(), e))?;
            manager.load_snapshot(&json).map_err(|e| e.to_string())?;
            let count = print_snapshot_diff(&manager);
            println!("{} change(s) since snapshot", count);
            Ok(())
        }
    }
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
