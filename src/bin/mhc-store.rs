//! mhc-store CLI
//!
//! Command-line interface for a local record store.

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use mhc_store::txlog::{LogReader, Operation};
use mhc_store::{Config, RecordStore, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// mhc-store CLI
#[derive(Parser, Debug)]
#[command(name = "mhc-store")]
#[command(about = "Filesystem record store for schedule entries")]
#[command(version)]
struct Args {
    /// Base directory (defaults to ~/Mail/schedule)
    #[arg(short, long)]
    base_dir: Option<PathBuf>,

    /// Do not append to the transaction log
    #[arg(long)]
    no_log: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Store a record under a slot and index it by uid
    Store {
        /// Unique id of the record
        uid: String,

        /// Slot name, e.g. 2024/01
        slot: String,

        /// Read the record from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print the record indexed under a uid
    Find {
        /// Unique id of the record
        uid: String,
    },

    /// Delete the record indexed under a uid
    Delete {
        /// Unique id of the record
        uid: String,
    },

    /// List the records of a slot
    Entries {
        /// Slot name
        slot: String,
    },

    /// Write a cache blob
    CacheSet {
        /// Cache name
        name: String,

        /// Read the value from this file instead of stdin
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Print a cache blob
    CacheGet {
        /// Cache name
        name: String,
    },

    /// Print the paths modified after a cache blob
    Newer {
        /// Cache name to compare against
        name: String,

        /// Candidate paths
        paths: Vec<PathBuf>,
    },

    /// Dump the transaction log
    Log,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,mhc_store=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    if let Err(e) = run(args) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<()> {
    let mut builder = Config::builder().transaction_log(!args.no_log);
    if let Some(base_dir) = args.base_dir {
        builder = builder.base_dir(base_dir);
    }
    let config = builder.build();

    tracing::debug!("mhc-store v{}", mhc_store::VERSION);
    tracing::debug!("Base directory: {}", config.base_dir.display());

    let store = RecordStore::open(config)?;

    match args.command {
        Commands::Store { uid, slot, file } => {
            let data = read_input(file)?;
            let path = store.store(&uid, &slot, &data)?;
            println!("{}", path.display());
        }
        Commands::Find { uid } => {
            print!("{}", store.find_by_uid(&uid)?);
        }
        Commands::Delete { uid } => {
            let removed = store.delete(&uid)?;
            println!("{}", removed.path.display());
        }
        Commands::Entries { slot } => {
            for entry in &store.entries(&slot)? {
                let entry = entry?;
                match entry.path {
                    Some(path) => println!("== {}", path.display()),
                    None => println!("=="),
                }
                println!("{}", entry.text);
            }
        }
        Commands::CacheSet { name, file } => {
            let value = read_input(file)?;
            store.set_cache(&name, &value)?;
        }
        Commands::CacheGet { name } => {
            print!("{}", store.cache(&name)?);
        }
        Commands::Newer { name, paths } => {
            let cache_file = store.cache_path(&name)?;
            for path in store.newer_items(&cache_file, &paths)? {
                println!("{}", path.display());
            }
        }
        Commands::Log => {
            let reader = LogReader::open(store.layout().log_path())?;
            for entry in reader.entries() {
                let entry = entry?;
                let (op, path) = match &entry.operation {
                    Operation::Store { path, .. } => ("store", path),
                    Operation::Delete { path, .. } => ("delete", path),
                };
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    entry.lsn,
                    entry.timestamp,
                    op,
                    entry.operation.uid(),
                    path.display()
                );
            }
        }
    }

    store.close()
}

fn read_input(file: Option<PathBuf>) -> Result<String> {
    match file {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
    }
}
