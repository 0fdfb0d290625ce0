//! recordkv CLI
//!
//! Command-line interface over a file-backed record store.

use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use recordkv::{Config, FileBackend, OverflowPolicy, Query, Quota, Record, RecordStore};
use tracing_subscriber::{fmt, EnvFilter};

/// recordkv CLI
#[derive(Parser, Debug)]
#[command(name = "recordkv-cli")]
#[command(about = "Records with timestamps over a flat key-value file")]
#[command(version)]
struct Args {
    /// Snapshot file
    #[arg(short, long, default_value = "./recordkv.db")]
    file: String,

    /// Key namespace prefix
    #[arg(long, default_value = "db")]
    prefix: String,

    /// Separator between prefix, id and field
    #[arg(long, default_value = "_")]
    separator: String,

    /// Name of the payload field
    #[arg(long, default_value = "data")]
    data_field: String,

    /// Overflow policy when the quota is exceeded
    #[arg(short, long, value_enum, default_value_t = Policy::Relaxed)]
    policy: Policy,

    /// Byte quota over all stored entries
    #[arg(short, long)]
    quota: Option<usize>,

    /// Maximum evictions per save under the greedy policy
    #[arg(long)]
    max_evictions: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Policy {
    Relaxed,
    Greedy,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Find {
    Newest,
    Oldest,
    Smallest,
    Biggest,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Timestamp {
    Created,
    Modified,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Check that the store accepts writes
    Capable,

    /// Save a record
    Save {
        /// Record id
        id: String,

        /// Payload
        data: String,

        /// Timestamp in seconds since epoch instead of now
        #[arg(short, long)]
        time: Option<u64>,
    },

    /// Fetch by magic token (newest, oldest, smallest, biggest) or non-numeric id
    Fetch {
        param: String,
    },

    /// Fetch by id, numeric ids included
    Get {
        id: String,
    },

    /// Print the id matching a magic find
    Find {
        #[arg(value_enum)]
        query: Find,
    },

    /// Remove a record
    Remove {
        id: String,
    },

    /// Wipe the whole store
    Clear,

    /// List ids with their created or modified timestamps
    List {
        #[arg(value_enum)]
        field: Timestamp,
    },

    /// List record ids
    Ids,
}

fn main() -> ExitCode {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn,recordkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> recordkv::Result<ExitCode> {
    let mut builder = Config::builder()
        .prefix(args.prefix)
        .separator(args.separator)
        .data_field_name(args.data_field)
        .overflow_policy(match args.policy {
            Policy::Relaxed => OverflowPolicy::Relaxed,
            Policy::Greedy => OverflowPolicy::Greedy,
        });
    if let Some(count) = args.max_evictions {
        builder = builder.max_evictions(count);
    }
    let config = builder.build();

    let quota = args.quota.map(Quota::bytes).unwrap_or_default();
    let backend = FileBackend::open(&args.file, quota)?;
    tracing::debug!(file = %args.file, "opened store");

    let store = RecordStore::new(backend, config)?;

    match args.command {
        Commands::Capable => {
            let capable = store.capable();
            println!("{}", capable);
            return Ok(if capable { ExitCode::SUCCESS } else { ExitCode::from(1) });
        }
        Commands::Save { id, data, time } => {
            let report = store.save(&id, &data, time)?;
            for victim in &report.evicted {
                println!("evicted {}", victim);
            }
            println!("{} {}", if report.created { "created" } else { "updated" }, id);
        }
        Commands::Fetch { param } => return Ok(print_record(store.fetch(&param)?)),
        Commands::Get { id } => return Ok(print_record(store.fetch_by_id(&id)?)),
        Commands::Find { query } => {
            let query = match query {
                Find::Newest => Query::Newest,
                Find::Oldest => Query::Oldest,
                Find::Smallest => Query::Smallest,
                Find::Biggest => Query::Biggest,
            };
            match store.find(query)? {
                Some(id) => println!("{}", id),
                None => return Ok(ExitCode::from(2)),
            }
        }
        Commands::Remove { id } => store.remove(&id)?,
        Commands::Clear => store.clear_all()?,
        Commands::List { field } => {
            let listing = match field {
                Timestamp::Created => store.list_all_created()?,
                Timestamp::Modified => store.list_all_modified()?,
            };
            for (id, ts) in listing {
                println!("{}\t{}", id, ts);
            }
        }
        Commands::Ids => {
            for id in store.ids() {
                println!("{}", id);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_record(record: Option<Record>) -> ExitCode {
    let Some(record) = record else {
        return ExitCode::from(2);
    };

    let show = |ts: Option<u64>| ts.map_or_else(|| "-".to_string(), |t| t.to_string());
    let (field, data) = record.data_entry();
    println!("id\t{}", record.id);
    println!("{}\t{}", field, data);
    println!("created\t{}", show(record.created));
    println!("modified\t{}", show(record.modified));
    ExitCode::SUCCESS
}
