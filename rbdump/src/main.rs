use std::io::{self, BufRead};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{LevelFilter, debug, error, info, warn};
use redblack::{DuplicateKey, KeyNotFound, Rbtree};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

#[derive(clap::Parser)]
#[command(name = "rbdump", about = "Builds a red-black tree from integer keys read from stdin.")]
struct Opt {
    #[arg(short, long, action = clap::ArgAction::Count)]
    /// Log more to stderr. Repeat for debug and trace output.
    verbose: u8,

    #[arg(short, long, value_delimiter = ',', allow_hyphen_values = true)]
    /// Keys to delete after every key from stdin has been inserted.
    delete: Vec<i64>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tree structure as (key left right), with * marking red nodes and _ empty
    /// children.
    Dump,
    /// Print the keys in ascending order, one per line.
    Sorted,
}

fn main() -> ExitCode {
    let opt = Opt::parse();
    init_logging(opt.verbose);

    let tree = match build(io::stdin().lock(), &opt.delete) {
        Ok(tree) => tree,
        Err(e) => {
            error!("Failed to read keys from stdin: {e}");
            return ExitCode::FAILURE;
        }
    };

    match opt.cmd {
        Command::Dump => println!("{tree}"),
        Command::Sorted => {
            for k in &tree {
                println!("{k}");
            }
        }
    }

    ExitCode::SUCCESS
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let logger = TermLogger::init(level, Config::default(), TerminalMode::Stderr, ColorChoice::Auto);
    if let Err(e) = logger {
        eprintln!("Failed to initialize logging: {e}");
    }
}

fn build<R: BufRead>(input: R, deletes: &[i64]) -> io::Result<Rbtree<i64>> {
    let mut tree = Rbtree::new();

    for line in input.lines() {
        for token in line?.split_whitespace() {
            let Ok(key) = token.parse::<i64>() else {
                warn!("Skipping {token:?}, not an integer key");
                continue;
            };

            match tree.insert(key) {
                Ok(()) => debug!("Inserted {key}"),
                Err(DuplicateKey(key)) => warn!("Skipping duplicate key {key}"),
            }
        }
    }

    for key in deletes {
        match tree.delete(key) {
            Ok(key) => debug!("Deleted {key}"),
            Err(e @ KeyNotFound) => warn!("Cannot delete {key}: {e}"),
        }
    }

    info!("Tree holds {} keys", tree.len());
    Ok(tree)
}
