//! CosmoStore CLI
//!
//! Command-line interface for appending to and reading from a storage
//! directory.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use cosmostore::{Config, Storage, StrategyKind};
use tracing_subscriber::{fmt, EnvFilter};

/// CosmoStore CLI
#[derive(Parser, Debug)]
#[command(name = "cosmo-cli")]
#[command(about = "Append-only log-structured storage")]
#[command(version)]
struct Args {
    /// Storage directory
    #[arg(short, long, default_value = "./cosmo_data")]
    dir: PathBuf,

    /// Create the storage directory if it does not exist
    #[arg(long)]
    create: bool,

    /// Rotate the active file once it reaches this many bytes
    #[arg(short, long, default_value = "104857600")]
    max_file_size: u64,

    /// Write staging strategy
    #[arg(short, long, value_enum, default_value = "basic")]
    strategy: StrategyArg,

    /// Staging buffer size in bytes (buffered strategy only)
    #[arg(long, default_value = "1048576")]
    buffer_size: usize,

    /// fsync after every append
    #[arg(long)]
    sync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    Basic,
    Buffered,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Append a value and print where it landed
    Write {
        /// The value to append
        value: String,
    },

    /// Read a byte range and print it
    Read {
        /// File id holding the record
        file_id: u32,

        /// Byte offset within the file
        offset: u64,

        /// Number of bytes to read
        len: usize,
    },

    /// Show archive and active file details
    Info,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,cosmostore=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let strategy = match args.strategy {
        StrategyArg::Basic => StrategyKind::Basic,
        StrategyArg::Buffered => StrategyKind::Buffered {
            capacity: args.buffer_size,
        },
    };

    let config = Config::builder()
        .storage_dir(&args.dir)
        .create_if_missing(args.create)
        .max_data_file_size(args.max_file_size)
        .strategy(strategy)
        .sync_on_write(args.sync)
        .build();

    let storage = match Storage::open(config) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to open storage: {}", e);
            process::exit(1);
        }
    };

    let outcome = match args.command {
        Commands::Write { value } => storage.write(value.as_bytes()).map(|location| {
            println!("file_id={} offset={}", location.file_id, location.offset);
        }),
        Commands::Read {
            file_id,
            offset,
            len,
        } => storage.read(file_id, offset, len).map(|bytes| {
            println!("{}", String::from_utf8_lossy(&bytes));
        }),
        Commands::Info => {
            println!("directory:      {}", storage.storage_dir().display());
            println!("max file size:  {}", storage.max_data_file_size());
            println!(
                "active file:    {} (id {})",
                storage.active_file_path().display(),
                storage.active_file_id()
            );
            println!("active size:    {}", storage.active_file_size());
            println!("archived files: {}", storage.data_file_count());
            for (id, path) in storage.data_files().iter().enumerate() {
                println!("  [{}] {}", id, path.display());
            }
            Ok(())
        }
    };

    if let Err(e) = outcome.and_then(|_| storage.close()) {
        tracing::error!("{}", e);
        process::exit(1);
    }
}
