//! bzcodec CLI
//!
//! A Pure Rust bzip2 utility: compress, decompress, test and inspect `.bz2`
//! files.

mod commands;
mod utils;

use clap::{ArgAction, Parser, Subcommand};
use log::LevelFilter;
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bzcodec")]
#[command(author, version, about = "Pure Rust bzip2 compressor and decompressor")]
#[command(long_about = "
bzcodec reads and writes the bzip2 stream format (BZh1..BZh9).

Examples:
  bzcodec compress notes.txt
  bzcodec compress -l 1 -k big.log
  bzcodec decompress notes.txt.bz2
  bzcodec test *.bz2
  bzcodec info --json data.bz2
")]
struct Cli {
    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only report errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compress files to FILE.bz2
    #[command(alias = "z")]
    Compress {
        /// Files to compress
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Block size level (1 = 100k .. 9 = 900k)
        #[arg(short, long, default_value_t = 9, value_parser = clap::value_parser!(u8).range(1..=9))]
        level: u8,

        /// Keep the input files
        #[arg(short, long)]
        keep: bool,

        /// Overwrite existing output files
        #[arg(short, long)]
        force: bool,
    },

    /// Decompress .bz2 files
    #[command(alias = "d")]
    Decompress {
        /// Files to decompress
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Keep the input files
        #[arg(short, long)]
        keep: bool,

        /// Overwrite existing output files
        #[arg(short, long)]
        force: bool,
    },

    /// Check that files decode and all CRCs match
    #[command(alias = "t")]
    Test {
        /// Files to test
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Show stream and block details of a .bz2 file
    #[command(alias = "i")]
    Info {
        /// File to inspect
        file: PathBuf,

        /// Output as JSON (machine-readable)
        #[arg(short, long)]
        json: bool,
    },
}

fn log_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = TermLogger::init(
        log_level(cli.verbose, cli.quiet),
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ) {
        eprintln!("Warning: logging unavailable: {}", e);
    }

    let progress = !cli.quiet;
    let result = match cli.command {
        Commands::Compress {
            files,
            level,
            keep,
            force,
        } => commands::cmd_compress(&files, level, keep, force, progress),
        Commands::Decompress { files, keep, force } => {
            commands::cmd_decompress(&files, keep, force, progress)
        }
        Commands::Test { files } => commands::cmd_test(&files, cli.quiet),
        Commands::Info { file, json } => commands::cmd_info(&file, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(utils::exit_code(e.as_ref()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_level_range() {
        assert!(Cli::try_parse_from(["bzcodec", "compress", "-l", "0", "a"]).is_err());
        assert!(Cli::try_parse_from(["bzcodec", "compress", "-l", "10", "a"]).is_err());
        let cli = Cli::try_parse_from(["bzcodec", "compress", "-l", "3", "-k", "a"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Compress {
                level: 3,
                keep: true,
                force: false,
                ..
            }
        ));
    }

    #[test]
    fn test_verbosity() {
        let cli = Cli::try_parse_from(["bzcodec", "-vv", "test", "a.bz2"]).unwrap();
        assert_eq!(log_level(cli.verbose, cli.quiet), LevelFilter::Debug);
        let cli = Cli::try_parse_from(["bzcodec", "test", "-q", "a.bz2"]).unwrap();
        assert_eq!(log_level(cli.verbose, cli.quiet), LevelFilter::Error);
        assert!(Cli::try_parse_from(["bzcodec", "-q", "-v", "test", "a.bz2"]).is_err());
    }
}
