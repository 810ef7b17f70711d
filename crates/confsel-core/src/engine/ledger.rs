use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Hartree to electronvolt conversion factor used for the ledger.
pub const HARTREE_TO_EV: f64 = 27.2114;

pub const LEDGER_FILE_NAME: &str = "energies.csv";
pub const LEDGER_HEADER: [&str; 3] = ["xyzfile", "energy(Eh)", "energy(eV)"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    pub structure: String,
    pub energy_hartree: f64,
    pub energy_ev: f64,
}

impl LedgerRow {
    pub fn new(structure: impl Into<String>, energy_hartree: f64) -> Self {
        Self {
            structure: structure.into(),
            energy_hartree,
            energy_ev: energy_hartree * HARTREE_TO_EV,
        }
    }
}

/// Append-only record of every optimized structure, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyLedger {
    rows: Vec<LedgerRow>,
}

impl EnergyLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, structure: impl Into<String>, energy_hartree: f64) {
        self.rows.push(LedgerRow::new(structure, energy_hartree));
    }

    pub fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Writes the header followed by one line per row. The header is written
    /// even when the ledger is empty.
    pub fn write_to(&self, writer: impl Write) -> Result<(), csv::Error> {
        let mut csv_writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(writer);
        csv_writer.write_record(LEDGER_HEADER)?;
        for row in &self.rows {
            csv_writer.serialize(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), csv::Error> {
        let file = std::fs::File::create(path)?;
        self.write_to(file)
    }
}
