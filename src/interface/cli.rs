use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[clap(
    author = "rekindle contributors",
    version,
    about = "Instruments JVM class files for hot code reload"
)]
pub struct Cli {
    /// Directory to dump transformed classes into, for diagnostics
    #[clap(short, long, value_name = "DIR")]
    pub dump_dir: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: CliCommand,
}

#[derive(Subcommand)]
pub enum CliCommand {
    #[clap(about = "Transforms the given class files")]
    Transform {
        #[clap(value_name = "FILE", required = true)]
        files: Vec<PathBuf>,

        /// Where transformed classes are written; defaults to a
        /// `.transformed.class` sibling of each input
        #[clap(short, long, value_name = "DIR")]
        out_dir: Option<PathBuf>,
    },
}
