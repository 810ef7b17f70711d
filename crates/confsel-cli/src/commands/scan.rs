use crate::cli::ScanArgs;
use crate::config::resolve_scan_target;
use crate::error::Result;
use confsel::core::io::ensemble::{EnsembleError, EnsembleFile};
use confsel::core::io::locator::locate_ensembles;
use confsel::engine::error::EngineError;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsembleSummary {
    pub path: PathBuf,
    pub molecule: String,
    pub atom_count: usize,
    pub conformers: usize,
}

pub fn run(args: ScanArgs) -> Result<()> {
    let (root, file_name) = resolve_scan_target(&args)?;
    let summaries = scan(&root, &file_name)?;

    if summaries.is_empty() {
        println!("No {} files found under {}.", file_name, root.display());
        return Ok(());
    }

    println!("{:<24} {:>6} {:>11}  path", "molecule", "atoms", "conformers");
    for summary in &summaries {
        println!(
            "{:<24} {:>6} {:>11}  {}",
            summary.molecule,
            summary.atom_count,
            summary.conformers,
            summary.path.display()
        );
    }
    Ok(())
}

/// Reads every ensemble named `file_name` under `root` without writing anything.
///
/// Ensembles whose first line is not a valid atom count are logged and left out.
pub fn scan(root: &Path, file_name: &str) -> Result<Vec<EnsembleSummary>> {
    let paths = locate_ensembles(root, file_name).map_err(EngineError::from)?;
    info!("Found {} ensemble file(s) under {:?}.", paths.len(), root);

    let mut summaries = Vec::with_capacity(paths.len());
    for path in paths {
        let ensemble = EnsembleFile::read(&path).map_err(|source| EngineError::Ensemble {
            path: path.clone(),
            source,
        })?;
        match summarize(&ensemble) {
            Ok(summary) => summaries.push(summary),
            Err(e) => warn!("Skipping {:?}: {}", path, e),
        }
    }
    Ok(summaries)
}

fn summarize(ensemble: &EnsembleFile) -> std::result::Result<EnsembleSummary, EnsembleError> {
    let blocks = ensemble.conformers(usize::MAX)?;
    Ok(EnsembleSummary {
        path: ensemble.path().to_path_buf(),
        molecule: ensemble.molecule().to_string(),
        atom_count: blocks.atom_count(),
        conformers: blocks.count(),
    })
}
