use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{error, info, warn};

use crate::io::{create_output_dir, write_entire_file};

use super::codec::CodecProvider;
use super::decoder::EntryDecoder;
use super::error::{DecodeError, ExtractError};
use super::structures::Archive;

#[derive(Debug, Clone)]
pub struct ExtractOptions {
    /// Maximum number of entries decoded at the same time.
    pub workers: usize,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            workers: std::thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1),
        }
    }
}

/// Outcome of [`FarcExtractor::extract_to_dir`].
#[derive(Debug, Default)]
pub struct ExtractSummary {
    pub extracted: usize,
    /// Earlier entries shadowed by a later entry with the same name.
    pub shadowed: usize,
    pub failures: Vec<ExtractError>,
}

impl ExtractSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// FArc entry extractor
pub struct FarcExtractor<D: CodecProvider> {
    archive: Arc<Archive>,
    decoder: Arc<EntryDecoder<D>>,
    options: ExtractOptions,
}

impl<D: CodecProvider + 'static> FarcExtractor<D> {
    pub fn new(archive: Arc<Archive>, decoder: EntryDecoder<D>) -> Self {
        Self {
            archive,
            decoder: Arc::new(decoder),
            options: ExtractOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ExtractOptions) -> Self {
        self.options = options;
        self
    }

    pub fn archive(&self) -> &Archive {
        &self.archive
    }

    /// Decode a single entry to memory
    pub fn extract_to_memory(&self, index: usize) -> Option<Result<Vec<u8>, DecodeError>> {
        let entry = self.archive.entries.get(index)?;
        Some(self.decoder.decode(&self.archive, entry))
    }

    /// Extract every entry into `output_dir`.
    ///
    /// Entries are decoded concurrently, at most `workers` at a time, and each
    /// is written as soon as it is decoded. A failing entry is recorded in the
    /// summary and does not stop its siblings.
    ///
    /// # Errors
    ///
    /// Only if `output_dir` cannot be created.
    pub async fn extract_to_dir(&self, output_dir: &Path) -> Result<ExtractSummary, ExtractError> {
        create_output_dir(output_dir)
            .await
            .map_err(|source| ExtractError::CreateDir {
                path: output_dir.to_path_buf(),
                source,
            })?;

        let mut summary = ExtractSummary::default();
        let targets = self.plan(output_dir, &mut summary);

        let limit = Arc::new(Semaphore::new(self.options.workers.max(1)));
        let mut tasks = JoinSet::new();

        for (index, path) in targets {
            let archive = Arc::clone(&self.archive);
            let decoder = Arc::clone(&self.decoder);
            let limit = Arc::clone(&limit);

            tasks.spawn(async move {
                let _permit = limit
                    .acquire_owned()
                    .await
                    .map_err(|e| ExtractError::Worker(format!("entry {index}: {e}")))?;
                extract_entry(archive, decoder, index, path).await
            });
        }

        while let Some(joined) = tasks.join_next().await {
            let result = joined
                .map_err(|e| ExtractError::Worker(e.to_string()))
                .and_then(|outcome| outcome);
            match result {
                Ok(()) => summary.extracted += 1,
                Err(err) => {
                    error!("{err}");
                    summary.failures.push(err);
                }
            }
        }

        Ok(summary)
    }

    /// Resolve output paths, recording entries that cannot be extracted.
    ///
    /// When several entries land on the same output path only the last one is
    /// kept, so the result does not depend on which write finishes first.
    fn plan(&self, output_dir: &Path, summary: &mut ExtractSummary) -> Vec<(usize, PathBuf)> {
        let mut resolved = Vec::with_capacity(self.archive.entries.len());
        for (index, entry) in self.archive.entries.iter().enumerate() {
            let err = if entry.name.is_empty() {
                ExtractError::EmptyName { index }
            } else if let Some(path) = join_entry_path(output_dir, &entry.name) {
                resolved.push((index, path));
                continue;
            } else {
                ExtractError::UnsafePath {
                    index,
                    name: entry.name.clone(),
                }
            };
            error!("{err}");
            summary.failures.push(err);
        }

        let keep: Vec<bool> = {
            let last_index: HashMap<&Path, usize> = resolved
                .iter()
                .map(|(index, path)| (path.as_path(), *index))
                .collect();
            resolved
                .iter()
                .map(|(index, path)| last_index.get(path.as_path()) == Some(index))
                .collect()
        };

        let mut targets = Vec::with_capacity(resolved.len());
        for ((index, path), keep) in resolved.into_iter().zip(keep) {
            if keep {
                targets.push((index, path));
            } else {
                let name = &self.archive.entries[index].name;
                warn!(index, %name, "skipping entry shadowed by a later duplicate");
                summary.shadowed += 1;
            }
        }

        targets
    }
}

async fn extract_entry<D: CodecProvider + 'static>(
    archive: Arc<Archive>,
    decoder: Arc<EntryDecoder<D>>,
    index: usize,
    path: PathBuf,
) -> Result<(), ExtractError> {
    // Decoding is CPU bound; keep it off the async workers.
    let decode_archive = Arc::clone(&archive);
    let data = tokio::task::spawn_blocking(move || {
        decoder.decode(&decode_archive, &decode_archive.entries[index])
    })
    .await
    .map_err(|e| ExtractError::Worker(format!("entry {index}: {e}")))?;

    let entry = &archive.entries[index];
    let data = data.map_err(|source| ExtractError::Decode {
        index,
        name: entry.name.clone(),
        source,
    })?;

    write_entire_file(&path, &data)
        .await
        .map_err(|source| ExtractError::Write {
            path: path.clone(),
            source,
        })?;

    info!(name = %entry.name, size = data.len(), "extracted");
    Ok(())
}

/// Join an archive entry name onto `output_dir`.
///
/// `.` components and repeated separators are dropped, so names that refer to
/// the same file give equal paths. `None` for names that are absolute, would
/// climb out of the directory, or name no file at all.
pub fn join_entry_path(output_dir: &Path, name: &str) -> Option<PathBuf> {
    let mut path = output_dir.to_path_buf();
    let mut depth = 0;
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => {
                path.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            _ => return None,
        }
    }

    (depth > 0).then_some(path)
}
