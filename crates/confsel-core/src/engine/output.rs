use super::best::BestRecord;
use super::ledger::{EnergyLedger, LEDGER_FILE_NAME};
use super::optimizer::SIDE_EFFECT_FILES;
use super::state::SelectedStructure;
use crate::core::io::ensemble::Conformer;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

pub const STRUCTURES_DIR: &str = "allxyz";
pub const BEST_DIR: &str = "allbest";
pub const LOGS_DIR: &str = "allout";

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Output operation on '{path}' failed: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to write energy ledger '{path}': {source}", path = path.display())]
    Ledger {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> OutputError {
    let path = path.to_path_buf();
    move |source| OutputError::Io { path, source }
}

/// Owner of the result tree and the energy ledger for one run.
///
/// ```text
/// <root>/
/// ├── allxyz/        every optimized structure
/// ├── allbest/       one `<molecule>_xtb_best.xyz` per molecule
/// ├── allout/        optimizer logs (removed at the end unless kept)
/// └── energies.csv
/// ```
#[derive(Debug)]
pub struct OutputOrganizer {
    root: PathBuf,
    structures_dir: PathBuf,
    best_dir: PathBuf,
    logs_dir: PathBuf,
    keep_logs: bool,
    ledger: EnergyLedger,
}

impl OutputOrganizer {
    /// Creates a fresh output tree at `root`.
    ///
    /// An existing `root` is deleted first, together with everything in it.
    pub fn prepare(root: impl Into<PathBuf>, keep_logs: bool) -> Result<Self, OutputError> {
        let root = root.into();
        if root.is_dir() {
            info!("Removing existing output folder {:?}", root);
            fs::remove_dir_all(&root).map_err(io_error(&root))?;
        }

        let organizer = Self {
            structures_dir: root.join(STRUCTURES_DIR),
            best_dir: root.join(BEST_DIR),
            logs_dir: root.join(LOGS_DIR),
            root,
            keep_logs,
            ledger: EnergyLedger::new(),
        };
        for dir in [
            &organizer.root,
            &organizer.structures_dir,
            &organizer.best_dir,
            &organizer.logs_dir,
        ] {
            fs::create_dir(dir).map_err(io_error(dir))?;
        }
        debug!("Output tree ready at {:?}", organizer.root);
        Ok(organizer)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn structures_dir(&self) -> &Path {
        &self.structures_dir
    }

    pub fn best_dir(&self) -> &Path {
        &self.best_dir
    }

    pub fn logs_dir(&self) -> &Path {
        &self.logs_dir
    }

    pub fn ledger(&self) -> &EnergyLedger {
        &self.ledger
    }

    pub fn structure_path(&self, structure: &SelectedStructure) -> PathBuf {
        self.structures_dir.join(structure.file_name())
    }

    pub fn log_path(&self, structure: &SelectedStructure) -> PathBuf {
        self.logs_dir.join(structure.log_file_name())
    }

    /// Writes the conformer as a standalone XYZ file in the all-structures folder.
    pub fn materialize(
        &self,
        structure: &SelectedStructure,
        conformer: &Conformer,
    ) -> Result<PathBuf, OutputError> {
        let path = self.structure_path(structure);
        conformer.write_to_path(&path).map_err(io_error(&path))?;
        Ok(path)
    }

    pub fn record(&mut self, structure: &SelectedStructure, energy_hartree: f64) {
        self.ledger.push(structure.file_name(), energy_hartree);
    }

    /// Copies a molecule's best structure into the best-per-molecule folder.
    pub fn finalize_best(&self, record: &BestRecord) -> Result<PathBuf, OutputError> {
        let source = self.structures_dir.join(&record.source_file);
        let target = self.best_dir.join(&record.best_file);
        fs::copy(&source, &target).map_err(io_error(&source))?;
        debug!("Copied {:?} to {:?}", source, target);
        Ok(target)
    }

    /// Persists the ledger, drops the logs folder unless logs are kept, and sweeps
    /// optimizer leftovers from `shared_workdir`.
    pub fn finish(self, shared_workdir: Option<&Path>) -> Result<EnergyLedger, OutputError> {
        let ledger_path = self.root.join(LEDGER_FILE_NAME);
        self.ledger
            .write_to_path(&ledger_path)
            .map_err(|source| OutputError::Ledger {
                path: ledger_path.clone(),
                source,
            })?;
        info!(
            "Wrote {} ledger row(s) to {:?}",
            self.ledger.len(),
            ledger_path
        );

        if !self.keep_logs {
            fs::remove_dir(&self.logs_dir).map_err(io_error(&self.logs_dir))?;
        }

        if let Some(dir) = shared_workdir {
            sweep_side_effects(dir);
        }

        Ok(self.ledger)
    }
}

/// Removes the files xTB leaves in its working directory.
///
/// Each file is handled on its own: a missing file is skipped and a failed
/// removal is logged, neither stops the sweep. Returns the files removed.
pub fn sweep_side_effects(dir: &Path) -> Vec<PathBuf> {
    let mut removed = Vec::new();
    for name in SIDE_EFFECT_FILES {
        let path = dir.join(name);
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed optimizer artifact {:?}", path);
                removed.push(path);
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Optimizer artifact {:?} not present, skipping.", path);
            }
            Err(e) => warn!("Could not remove optimizer artifact {:?}: {}", path, e),
        }
    }
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::io::ensemble::EnsembleFile;
    use tempfile::tempdir;

    fn conformer() -> Conformer {
        EnsembleFile::from_content("M/crest_conformers.xyz", "1\n-1.5\nH 0 0 0\n")
            .conformers(1)
            .unwrap()
            .next()
            .unwrap()
    }

    #[test]
    fn prepare_creates_the_folder_layout() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("crest_best_xtbopt");

        let organizer = OutputOrganizer::prepare(&root, false).unwrap();

        assert!(organizer.structures_dir().is_dir());
        assert!(organizer.best_dir().is_dir());
        assert!(organizer.logs_dir().is_dir());
        assert_eq!(organizer.root(), root);
    }

    #[test]
    fn prepare_discards_previous_results() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("out");
        fs::create_dir_all(root.join(STRUCTURES_DIR)).unwrap();
        fs::write(root.join(STRUCTURES_DIR).join("old_01.xyz"), "old").unwrap();
        fs::write(root.join("notes.txt"), "old").unwrap();

        OutputOrganizer::prepare(&root, false).unwrap();

        assert!(!root.join(STRUCTURES_DIR).join("old_01.xyz").exists());
        assert!(!root.join("notes.txt").exists());
    }

    #[test]
    fn materialize_and_finalize_best_place_files() {
        let dir = tempdir().unwrap();
        let organizer = OutputOrganizer::prepare(dir.path().join("out"), false).unwrap();
        let structure = SelectedStructure::new("M", 1);

        let path = organizer.materialize(&structure, &conformer()).unwrap();
        assert_eq!(path, organizer.structures_dir().join("M_01.xyz"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "1\n-1.5\nH 0 0 0\n");

        let record = BestRecord {
            energy: -1.5,
            source_file: structure.file_name(),
            best_file: structure.best_file_name(),
        };
        let best = organizer.finalize_best(&record).unwrap();
        assert_eq!(best, organizer.best_dir().join("M_xtb_best.xyz"));
        assert_eq!(fs::read_to_string(best).unwrap(), "1\n-1.5\nH 0 0 0\n");
    }

    #[test]
    fn log_path_uses_out_extension() {
        let dir = tempdir().unwrap();
        let organizer = OutputOrganizer::prepare(dir.path().join("out"), true).unwrap();
        assert_eq!(
            organizer.log_path(&SelectedStructure::new("M", 4)),
            organizer.logs_dir().join("M_04.out")
        );
    }

    #[test]
    fn finish_writes_ledger_and_drops_empty_logs_folder() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("out");
        let mut organizer = OutputOrganizer::prepare(&root, false).unwrap();
        organizer.record(&SelectedStructure::new("M", 1), -2.0);
        organizer.record(&SelectedStructure::new("M", 2), -2.5);

        let ledger = organizer.finish(None).unwrap();

        assert_eq!(ledger.len(), 2);
        assert!(!root.join(LOGS_DIR).exists());
        let csv = fs::read_to_string(root.join(LEDGER_FILE_NAME)).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("xyzfile,energy(Eh),energy(eV)"));
        assert!(lines.next().unwrap().starts_with("M_01.xyz,-2.0,"));
        assert!(lines.next().unwrap().starts_with("M_02.xyz,-2.5,"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn finish_keeps_logs_folder_when_requested() {
        let dir = tempdir().unwrap();
        let root = dir.path().join("out");
        let organizer = OutputOrganizer::prepare(&root, true).unwrap();
        fs::write(organizer.logs_dir().join("M_01.out"), "log").unwrap();

        organizer.finish(None).unwrap();

        assert!(root.join(LOGS_DIR).join("M_01.out").exists());
    }

    #[test]
    fn finish_sweeps_shared_working_directory() {
        let dir = tempdir().unwrap();
        let workdir = dir.path().join("work");
        fs::create_dir(&workdir).unwrap();
        fs::write(workdir.join("charges"), "").unwrap();
        fs::write(workdir.join("wbo"), "").unwrap();

        let organizer = OutputOrganizer::prepare(dir.path().join("out"), false).unwrap();
        organizer.finish(Some(&workdir)).unwrap();

        assert!(!workdir.join("charges").exists());
        assert!(!workdir.join("wbo").exists());
    }

    #[test]
    fn sweep_skips_missing_artifacts() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("xtbrestart"), "").unwrap();
        fs::write(dir.path().join("unrelated.txt"), "").unwrap();

        let removed = sweep_side_effects(dir.path());

        assert_eq!(removed, vec![dir.path().join("xtbrestart")]);
        assert!(dir.path().join("unrelated.txt").exists());
        assert!(sweep_side_effects(dir.path()).is_empty());
    }
}
