use std::path::{Path, PathBuf};

use clap::Parser;

use crate::io::default_output_dir;

/// Environment variable that overrides the built-in AES key.
pub const KEY_ENV: &str = "FARC_KEY";

#[derive(Parser, Debug)]
#[command(name = "unfarc")]
#[command(version)]
#[command(about = "Extract compressed and encrypted files stored within FArc archives", long_about = None)]
#[command(after_help = "Notes:\n  \
  Output files are written into a directory next to the archive, named after\n  \
  it without its extension (bgm.farc -> bgm/).\n\n\
Environment:\n  \
  FARC_KEY   32 hex digit AES-128 key replacing the built-in one\n  \
  RUST_LOG   log filter, e.g. RUST_LOG=debug (default: info)")]
pub struct Cli {
    /// FArc archive path
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,
}

impl Cli {
    pub fn input(&self) -> Option<&Path> {
        self.file.as_deref()
    }

    pub fn output_dir(&self) -> Option<PathBuf> {
        self.input().map(default_output_dir)
    }
}
