use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XyzError {
    #[error("Cannot read '{path}': {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Structure has no comment line to read the energy from")]
    MissingCommentLine,
    #[error("Comment line has no energy token (line: '{line}')")]
    MissingEnergyToken { line: String },
    #[error("Invalid energy value '{value}'")]
    InvalidEnergy { value: String },
}

/// Reads the total energy (Hartree) written by xTB into an optimized structure.
///
/// xTB writes `energy: <value> gnorm: <value> xtb: <version>` as the comment
/// line, so the energy is the second whitespace-separated token of line two.
pub fn read_energy<P: AsRef<Path>>(path: P) -> Result<f64, XyzError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|source| XyzError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_energy(&content)
}

pub fn parse_energy(content: &str) -> Result<f64, XyzError> {
    let line = content.lines().nth(1).ok_or(XyzError::MissingCommentLine)?;
    let token = line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| XyzError::MissingEnergyToken {
            line: line.to_string(),
        })?;
    token.parse().map_err(|_| XyzError::InvalidEnergy {
        value: token.to_string(),
    })
}
