use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use mr_reduce::mapreduce::apps::{get_app, APPS};
use mr_reduce::mapreduce::{merge_name, ReduceTask};

/// Run one reduce task over the shards the map phase left behind.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Reduce function to apply (wc, indexer, concat, sum)
    app: String,

    /// Job name shards are named after
    #[arg(short, long)]
    job: String,

    /// Index of this reduce task
    #[arg(short, long)]
    reduce_task: usize,

    /// Number of map tasks, one shard each
    #[arg(short, long)]
    n_map: usize,

    /// Directory holding the shards
    #[arg(short, long, default_value = ".")]
    shard_dir: PathBuf,

    /// Output path [default: mrtmp.<job>-res-<reduce_task>]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Reduce keys in parallel
    #[arg(short, long)]
    parallel: bool,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Cli::parse();

    let level = match args.verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let Some(reducer) = get_app(&args.app) else {
        error!("Invalid app {}, expected one of {:?}", args.app, APPS);
        return ExitCode::from(2);
    };

    let output = args
        .output
        .unwrap_or_else(|| PathBuf::from(merge_name(&args.job, args.reduce_task)));

    let task = ReduceTask::new(&args.job, args.reduce_task, args.n_map, output)
        .shard_dir(&args.shard_dir)
        .parallel(args.parallel);

    match task.run(reducer) {
        Ok(summary) => {
            println!(
                "{}: {} keys from {} records in {} shards",
                summary.out_file.display(),
                summary.keys,
                summary.records,
                summary.shards
            );
            ExitCode::SUCCESS
        }
        // already logged by the task
        Err(_) => ExitCode::FAILURE,
    }
}
