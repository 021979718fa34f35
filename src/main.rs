use std::path::PathBuf;

use clap::Parser;
use log::LevelFilter;

use cminusc::ir::Layout;
use cminusc::{run, Config, Mode};

/// Front end for the C-minus language: prints three-address code.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// The file to compile
    #[clap(value_parser)]
    file: PathBuf,

    /// Print the token stream instead of triplets
    #[clap(short, long)]
    tokens: bool,

    /// Always print five fields per triplet, keeping trailing blanks
    #[clap(short, long)]
    pad_fields: bool,

    /// Write to this file instead of standard output
    #[clap(short, long, value_parser)]
    output: Option<PathBuf>,

    /// Log every grammar expansion step to standard error
    #[clap(short, long)]
    debug: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut logger =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if args.debug {
        logger.filter_level(LevelFilter::Debug);
    }
    logger.init();

    run(&Config {
        file: args.file,
        output: args.output,
        mode: if args.tokens {
            Mode::Tokens
        } else {
            Mode::Triplets
        },
        layout: if args.pad_fields {
            Layout::Padded
        } else {
            Layout::Trimmed
        },
    })
}
