use super::state::SelectedStructure;

/// The lowest-energy structure seen so far for one molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct BestRecord {
    pub energy: f64,
    /// File name of the optimized structure in the all-structures folder.
    pub source_file: String,
    /// File name the structure gets in the best-per-molecule folder.
    pub best_file: String,
}

/// Running minimum over the optimized conformers of a single molecule.
///
/// A tracker starts empty (minimum `+inf`), only moves on strictly lower energies,
/// and hands back `None` from [`BestTracker::finish`] when nothing was observed.
#[derive(Debug, Clone)]
pub struct BestTracker {
    molecule: String,
    best: Option<BestRecord>,
}

impl BestTracker {
    pub fn new(molecule: impl Into<String>) -> Self {
        Self {
            molecule: molecule.into(),
            best: None,
        }
    }

    pub fn molecule(&self) -> &str {
        &self.molecule
    }

    pub fn minimum(&self) -> f64 {
        self.best.as_ref().map_or(f64::INFINITY, |b| b.energy)
    }

    pub fn best(&self) -> Option<&BestRecord> {
        self.best.as_ref()
    }

    /// Returns `true` when `energy` became the new minimum.
    pub fn observe(&mut self, structure: &SelectedStructure, energy: f64) -> bool {
        if energy < self.minimum() {
            self.best = Some(BestRecord {
                energy,
                source_file: structure.file_name(),
                best_file: structure.best_file_name(),
            });
            true
        } else {
            false
        }
    }

    pub fn finish(self) -> Option<BestRecord> {
        self.best
    }
}
