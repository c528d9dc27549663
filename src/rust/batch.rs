//! Directory scan → CSV results table, one row per classified file.

use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::classifier::ModelLoadError;
use crate::config::BatchConfig;
use crate::error::ClassificationError;
use crate::models::{BatchResultRow, MediaType, RawImage};
use crate::pipeline::InferenceService;

pub const CSV_HEADER: [&str; 3] = ["filename", "predicted_digit", "confidence"];

/// Run-level failures. Every one of these terminates the batch tool.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("{what} not found: {}", path.display())]
    PathNotFound { what: &'static str, path: PathBuf },
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),
    #[error("Failed to list {}: {source}", path.display())]
    ListDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write results: {0}")]
    Io(#[from] io::Error),
    #[error("Failed to write results: {0}")]
    Csv(#[from] csv::Error),
}

/// Why a single file produced no row.
#[derive(Debug, thiserror::Error)]
pub enum SkipReason {
    #[error("{0}")]
    Unreadable(#[from] io::Error),
    #[error(transparent)]
    Classification(#[from] ClassificationError),
}

/// Result of processing one file.
#[derive(Debug)]
pub enum FileOutcome {
    Classified(BatchResultRow),
    Skipped { filename: String, reason: SkipReason },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub processed: usize,
    pub skipped: usize,
}

impl BatchSummary {
    fn record(&mut self, outcome: &FileOutcome) {
        match outcome {
            FileOutcome::Classified(_) => self.processed += 1,
            FileOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Lists regular files with a jpg/jpeg/png extension (any case), sorted so
/// repeated runs emit rows in the same order.
pub fn collect_image_paths(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && media_type_of(&path).is_some() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn media_type_of(path: &Path) -> Option<MediaType> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .and_then(MediaType::from_extension)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Sequential batch classifier over a borrowed service.
pub struct BatchRunner<'a> {
    service: &'a InferenceService,
}

impl<'a> BatchRunner<'a> {
    pub fn new(service: &'a InferenceService) -> Self {
        Self { service }
    }

    /// Reads and classifies one file. Never fails: errors become a skip.
    pub fn classify_file(&self, path: &Path) -> FileOutcome {
        let filename = file_name_of(path);
        // collect_image_paths only yields supported extensions
        let media_type = media_type_of(path).unwrap_or(MediaType::Png);

        let result = fs::read(path)
            .map_err(SkipReason::from)
            .and_then(|bytes| {
                self.service
                    .classify(&RawImage::new(bytes, media_type))
                    .map_err(SkipReason::from)
            });

        match result {
            Ok(prediction) => FileOutcome::Classified(BatchResultRow::new(filename, prediction)),
            Err(reason) => FileOutcome::Skipped { filename, reason },
        }
    }

    /// Classifies every image in `image_dir`, streaming rows into `writer`.
    ///
    /// Each row is flushed as soon as it is produced; nothing but the sorted
    /// path list is held in memory.
    pub fn run_to_writer<W: Write>(
        &self,
        image_dir: &Path,
        writer: W,
    ) -> Result<BatchSummary, BatchError> {
        let paths = list_images(image_dir)?;
        self.write_rows(&paths, writer)
    }

    /// Like [`run_to_writer`](Self::run_to_writer), writing to a file at `output`.
    ///
    /// The directory is listed before `output` is created, so a listing
    /// failure leaves no file behind.
    pub fn run(&self, image_dir: &Path, output: &Path) -> Result<BatchSummary, BatchError> {
        let paths = list_images(image_dir)?;
        let file = File::create(output)?;
        self.write_rows(&paths, BufWriter::new(file))
    }

    fn write_rows<W: Write>(&self, paths: &[PathBuf], writer: W) -> Result<BatchSummary, BatchError> {
        let mut table = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        table.write_record(CSV_HEADER)?;

        let mut summary = BatchSummary::default();
        for path in paths {
            let outcome = self.classify_file(path);
            summary.record(&outcome);

            match outcome {
                FileOutcome::Classified(row) => {
                    table.serialize(&row)?;
                    table.flush()?;
                }
                FileOutcome::Skipped { filename, reason } => match reason {
                    SkipReason::Classification(e) if e.is_decode() => {
                        warn!("Could not identify image {}, skipping ({})", filename, e);
                    }
                    reason => {
                        warn!("Error processing {}: {}, skipping", filename, reason);
                    }
                },
            }
        }
        table.flush()?;

        info!(
            "Batch finished: {} processed, {} skipped",
            summary.processed, summary.skipped
        );
        Ok(summary)
    }
}

fn list_images(image_dir: &Path) -> Result<Vec<PathBuf>, BatchError> {
    let paths = collect_image_paths(image_dir).map_err(|source| BatchError::ListDir {
        path: image_dir.to_path_buf(),
        source,
    })?;
    info!("Found {} candidate images in {:?}", paths.len(), image_dir);
    Ok(paths)
}

/// Validates paths, loads the model once and processes the whole directory.
///
/// Path and model problems are returned before the output file is created.
pub fn run_batch(config: &BatchConfig) -> Result<BatchSummary, BatchError> {
    if !config.weights.exists() {
        return Err(BatchError::PathNotFound {
            what: "Model file",
            path: config.weights.path().to_path_buf(),
        });
    }
    if !config.image_dir.is_dir() {
        return Err(BatchError::PathNotFound {
            what: "Image directory",
            path: config.image_dir.clone(),
        });
    }

    let service = InferenceService::load(config.weights.clone(), config.runtime.clone())?;

    info!("Processing images from {:?}...", config.image_dir);
    BatchRunner::new(&service).run(&config.image_dir, &config.output)
}
