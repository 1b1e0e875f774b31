//! Local filesystem access for archives and extracted entries.

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use tokio::io::AsyncWriteExt;

/// Read a whole archive into memory.
pub async fn read_entire_file(path: &Path) -> io::Result<Vec<u8>> {
    fs::read(path).await
}

pub async fn create_output_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path).await
}

/// Write `data` to `path`, creating parent directories and replacing any existing file.
pub async fn write_entire_file(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).await?;
        }
    }

    let mut file = fs::File::create(path).await?;
    file.write_all(data).await?;
    file.flush().await?;

    Ok(())
}

/// Directory next to the archive named after it, minus the final extension.
///
/// An input without extension gets an `_extracted` suffix instead, so the
/// directory never collides with the archive itself.
pub fn default_output_dir(input: &Path) -> PathBuf {
    if input.extension().is_some() {
        return input.with_extension("");
    }

    let mut name = OsString::from(input.as_os_str());
    name.push("_extracted");
    PathBuf::from(name)
}
