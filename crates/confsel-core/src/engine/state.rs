/// Marker that replaces the rank index in the file name of a molecule's best structure.
pub const BEST_MARKER: &str = "xtb_best";

/// A conformer picked out of an ensemble, identified by molecule and 1-based rank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedStructure {
    pub molecule: String,
    pub rank: usize,
}

impl SelectedStructure {
    pub fn new(molecule: impl Into<String>, rank: usize) -> Self {
        Self {
            molecule: molecule.into(),
            rank,
        }
    }

    /// `{molecule}_{rank:02}.xyz`
    pub fn file_name(&self) -> String {
        format!("{}_{:02}.xyz", self.molecule, self.rank)
    }

    /// `{molecule}_{rank:02}.out`
    pub fn log_file_name(&self) -> String {
        format!("{}_{:02}.out", self.molecule, self.rank)
    }

    /// `{molecule}_xtb_best.xyz`
    pub fn best_file_name(&self) -> String {
        format!("{}_{}.xyz", self.molecule, BEST_MARKER)
    }
}
