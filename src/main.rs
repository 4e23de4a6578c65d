use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::fmt;

use rekindle::interface::cli::{Cli, CliCommand};
use rekindle::transform::{TransformConfig, Transformer};

fn main() -> Result<()> {
    let args = Cli::parse();

    let format = fmt::format()
        .with_ansi(true)
        .without_time()
        .with_level(true)
        .with_target(false)
        .with_thread_names(false)
        .with_source_location(false)
        .compact();

    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .event_format(format)
        .init();

    let transformer = Transformer::new(TransformConfig {
        dump_path: args.dump_dir,
    });

    match args.command {
        CliCommand::Transform { files, out_dir } => {
            // One broken class must not take the rest down with it; report
            // per file and keep going.
            let mut failures = 0usize;

            for file in &files {
                if let Err(err) = transform_file(&transformer, file, out_dir.as_deref()) {
                    failures += 1;
                    error!("failed to transform '{}': {:#}", file.display(), err);
                }
            }

            if failures > 0 {
                return Err(anyhow!("{} of {} classes failed", failures, files.len()));
            }
        }
    }

    Ok(())
}

fn transform_file(transformer: &Transformer, file: &Path, out_dir: Option<&Path>) -> Result<()> {
    let data = fs::read(file)?;
    let transformed = transformer.transform(&data)?;

    let target: PathBuf = match out_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            dir.join(
                file.file_name()
                    .ok_or_else(|| anyhow!("'{}' has no file name", file.display()))?,
            )
        }
        None => file.with_extension("transformed.class"),
    };

    fs::write(&target, &transformed.bytes)?;
    info!("wrote '{}'", target.display());

    Ok(())
}
