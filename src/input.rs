//! Resolve the `--data` path into the list of files to process.
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{LcError, LcResult};

pub const DATA_EXTENSION: &str = "txt";

/// A single file is returned as given.
/// A directory gives its immediate `.txt` children, sorted by path;
/// subdirectories and other files, `.TXT` included, are ignored.
pub fn resolve_input(path: &Path) -> LcResult<Vec<PathBuf>> {
    if !path.exists() {
        return Err(LcError::InputNotFound {
            path: path.to_path_buf(),
        });
    }
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in fs::read_dir(path).map_err(|e| LcError::io(path, e))? {
        let entry = entry.map_err(|e| LcError::io(path, e))?;
        let p = entry.path();
        if p.is_file() && is_data_file(&p) {
            files.push(p);
        } else {
            debug!("skipping {}", p.display());
        }
    }
    if files.is_empty() {
        return Err(LcError::NoDataFiles {
            path: path.to_path_buf(),
        });
    }
    files.sort();
    Ok(files)
}

fn is_data_file(p: &Path) -> bool {
    p.extension()
        .and_then(|e| e.to_str())
        .map(|e| e == DATA_EXTENSION)
        .unwrap_or(false)
}
