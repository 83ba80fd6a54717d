//! conftree CLI
//!
//! Entry point for the `conftree` command-line tool: read, write, and remove
//! settings in a declarative settings file.

use clap::{Parser, Subcommand};
use conftree::{Config, LoadTarget, NamedIdentity, ROOT_NAME};
use serde_json::Value;
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "conftree")]
#[command(about = "Dot-addressed settings store", version)]
struct Cli {
    /// Editor name recorded in the save footer
    #[arg(long, global = true)]
    editor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value at a dot path
    Get {
        /// Settings file to read
        file: PathBuf,

        /// Dot-delimited path (e.g. Database.Host)
        path: String,

        /// Default printed when the path is absent (JSON literal)
        #[arg(long, default_value = "null")]
        default: String,
    },

    /// Assign a value at a dot path and save the file
    Set {
        /// Settings file to update
        file: PathBuf,

        /// Dot-delimited path (e.g. Database.Host)
        path: String,

        /// Value to assign; parsed as JSON, else taken as a string
        value: String,

        /// Keep an existing value instead of overwriting it
        #[arg(long)]
        keep_existing: bool,
    },

    /// Remove the value at a dot path and save the file
    Remove {
        /// Settings file to update
        file: PathBuf,

        /// Dot-delimited path (e.g. Database.Host)
        path: String,
    },

    /// Print the whole settings tree as JSON
    Render {
        /// Settings file to read
        file: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match cli.editor {
        Some(name) => Config::new().with_identity(NamedIdentity(name)),
        None => Config::new(),
    };

    match cli.command {
        Commands::Get { file, path, default } => run_get(config, &file, &path, &default),
        Commands::Set {
            file,
            path,
            value,
            keep_existing,
        } => run_set(config, &file, &path, &value, keep_existing),
        Commands::Remove { file, path } => run_remove(config, &file, &path),
        Commands::Render { file } => run_render(config, &file),
    }
}

fn run_get(mut config: Config, file: &PathBuf, path: &str, default: &str) {
    if !config.load(file, LoadTarget::Use, ROOT_NAME) {
        eprintln!("Cannot read settings file: {}", file.display());
        process::exit(1);
    }
    let default = parse_value(default);
    let value = config.get(path, default);
    match serde_json::to_string_pretty(&value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_set(mut config: Config, file: &PathBuf, path: &str, value: &str, keep_existing: bool) {
    // A missing file is fine here; the destination is still remembered and
    // the save creates it.
    config.load(file, LoadTarget::Use, ROOT_NAME);
    config.load(file, LoadTarget::Save, ROOT_NAME);

    config.set_overwrite(path, parse_value(value), !keep_existing);

    // The file's content is already in the pending tree, so the save
    // replaces the file wholesale.
    if let Err(e) = config.save_as(None, None, false) {
        eprintln!("Error saving {}: {}", file.display(), e);
        process::exit(1);
    }
}

fn run_remove(mut config: Config, file: &PathBuf, path: &str) {
    if !config.load(file, LoadTarget::Use, ROOT_NAME) {
        eprintln!("Cannot read settings file: {}", file.display());
        process::exit(1);
    }
    config.load(file, LoadTarget::Save, ROOT_NAME);

    if !config.remove(path) {
        eprintln!("Not found: {}", path);
        process::exit(1);
    }

    if let Err(e) = config.save_as(None, None, false) {
        eprintln!("Error saving {}: {}", file.display(), e);
        process::exit(1);
    }
}

fn run_render(mut config: Config, file: &PathBuf) {
    if !config.load(file, LoadTarget::Use, ROOT_NAME) {
        eprintln!("Cannot read settings file: {}", file.display());
        process::exit(1);
    }
    match serde_json::to_string_pretty(config.live()) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

/// Parse a CLI argument as a JSON literal, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}
