use std::fs;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::classifier::ModelLoadError;

/// Where the classifier weights come from, plus an optional integrity pin.
#[derive(Debug, Clone)]
pub struct WeightsSource {
    path: PathBuf,
    expected_sha256: Option<String>,
}

impl WeightsSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            expected_sha256: None,
        }
    }

    /// Pins the weights to a hex-encoded SHA-256 digest.
    pub fn with_expected_sha256(mut self, digest: impl Into<String>) -> Self {
        self.expected_sha256 = Some(digest.into());
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Checks the file is present and, when a digest is pinned, that it matches.
    pub fn verify(&self) -> Result<(), ModelLoadError> {
        if !self.exists() {
            return Err(ModelLoadError::NotFound(self.path.clone()));
        }

        let Some(expected) = &self.expected_sha256 else {
            return Ok(());
        };

        log::info!("Verifying weights file: {:?}", self.path);
        let actual = sha256_file(&self.path)?;
        log::debug!("Calculated hash: {}", actual);
        log::debug!("Expected hash:   {}", expected);

        if !actual.eq_ignore_ascii_case(expected.trim()) {
            log::error!("Weights hash mismatch: expected {}, got {}", expected, actual);
            return Err(ModelLoadError::ChecksumMismatch {
                expected: expected.clone(),
                actual,
            });
        }
        Ok(())
    }
}

fn sha256_file(path: &Path) -> Result<String, ModelLoadError> {
    let bytes = fs::read(path).map_err(|source| ModelLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    Ok(format!("{:x}", hasher.finalize()))
}
