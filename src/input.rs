//! Signature lists read from plain text files, one signature per line.

use crate::validation::validate_signature;
use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum InputError {
    #[error("Signature file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Load signatures from `path`, skipping blank lines, duplicates and lines
/// that are not base58 signatures. File order is kept.
pub async fn load_signatures(path: &Path) -> Result<Vec<String>, InputError> {
    let contents = tokio::fs::read_to_string(path).await.map_err(|source| {
        if source.kind() == ErrorKind::NotFound {
            InputError::NotFound(path.to_path_buf())
        } else {
            InputError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    Ok(parse_signatures(&contents))
}

fn parse_signatures(contents: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut signatures = Vec::new();

    for (index, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Err(e) = validate_signature(line) {
            warn!("Skipping line {}: {}", index + 1, e);
            continue;
        }

        if seen.insert(line.to_string()) {
            signatures.push(line.to_string());
        }
    }

    info!("Loaded {} signatures", signatures.len());
    signatures
}
