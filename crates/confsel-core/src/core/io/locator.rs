use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

#[derive(Debug, Error)]
pub enum LocatorError {
    #[error("Cannot read directory '{path}': {source}", path = path.display())]
    ReadDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Recursively finds every file called `file_name` below `root`.
///
/// Results are sorted by path so that runs over the same tree are reproducible.
/// Symbolic links to directories are not followed. An empty result is not an error.
pub fn locate_ensembles(root: &Path, file_name: &str) -> Result<Vec<PathBuf>, LocatorError> {
    let mut found = Vec::new();
    walk(root, file_name, &mut found)?;
    found.sort();
    debug!(
        "Located {} file(s) named '{}' under {:?}",
        found.len(),
        file_name,
        root
    );
    Ok(found)
}

fn walk(dir: &Path, file_name: &str, found: &mut Vec<PathBuf>) -> Result<(), LocatorError> {
    let read_dir_error = |source| LocatorError::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(dir).map_err(read_dir_error)? {
        let entry = entry.map_err(read_dir_error)?;
        let file_type = entry.file_type().map_err(read_dir_error)?;
        let path = entry.path();

        if file_type.is_dir() {
            walk(&path, file_name, found)?;
        } else if file_type.is_file() && entry.file_name() == file_name {
            trace!("Found ensemble file {:?}", path);
            found.push(path);
        }
    }
    Ok(())
}
