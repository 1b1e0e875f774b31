//! Main entry point for the unfarc CLI application.
//!
//! Reads one FArc archive, decrypts and parses it, then extracts every entry
//! into a directory next to the archive.

use std::env::{self, VarError};
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use unfarc::cli::KEY_ENV;
use unfarc::farc::{ExtractOptions, ParserOptions, parse_hex_key};
use unfarc::{ArchiveParser, Cli, EntryDecoder, FarcExtractor, NativeCodecs, SoftwareCrypto};

/// Application entry point.
///
/// Any error returned from here ends the process with exit code 1.
#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let (Some(input), Some(output_dir)) = (cli.input(), cli.output_dir()) else {
        Cli::command().print_help()?;
        bail!("no input archive given");
    };

    let failed = extract_archive(input, &output_dir).await?;
    if failed > 0 {
        bail!("{failed} entries could not be extracted");
    }

    Ok(())
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default `info` level.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

/// Parser configuration, with the key optionally taken from the environment.
fn parser_options() -> Result<ParserOptions> {
    match env::var(KEY_ENV) {
        Ok(text) => {
            let key = parse_hex_key(&text).with_context(|| format!("invalid {KEY_ENV}"))?;
            Ok(ParserOptions { key })
        }
        Err(VarError::NotPresent) => Ok(ParserOptions::default()),
        Err(err) => Err(err).with_context(|| format!("invalid {KEY_ENV}")),
    }
}

/// Parse `input` and extract it into `output_dir`.
///
/// Parse failures are returned as errors; per-entry failures are logged as
/// they happen and counted in the return value.
async fn extract_archive(input: &Path, output_dir: &Path) -> Result<usize> {
    let data = unfarc::io::read_entire_file(input)
        .await
        .with_context(|| format!("failed to read {}", input.display()))?;

    let parser = ArchiveParser::with_options(Arc::new(SoftwareCrypto), parser_options()?);
    let archive = parser
        .parse(data)
        .with_context(|| format!("failed to parse {}", input.display()))?;
    archive.ensure_valid()?;

    info!(
        archive = %input.display(),
        entries = archive.entries.len(),
        encrypted = archive.flags().encrypted,
        "opened archive"
    );

    let decoder = EntryDecoder::new(Arc::new(NativeCodecs));
    let extractor = FarcExtractor::new(Arc::new(archive), decoder)
        .with_options(ExtractOptions::default());
    let summary = extractor.extract_to_dir(output_dir).await?;

    info!(
        output = %output_dir.display(),
        extracted = summary.extracted,
        failed = summary.failures.len(),
        shadowed = summary.shadowed,
        "done"
    );

    Ok(summary.failures.len())
}
