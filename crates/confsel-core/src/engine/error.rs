use thiserror::Error;

use super::config::ConfigError;
use super::optimizer::OptimizerError;
use super::output::OutputError;
use crate::core::io::ensemble::EnsembleError;
use crate::core::io::locator::LocatorError;
use std::path::PathBuf;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to locate ensemble files: {0}")]
    Locator(#[from] LocatorError),

    #[error("Malformed ensemble '{path}': {source}", path = path.display())]
    Ensemble {
        path: PathBuf,
        #[source]
        source: EnsembleError,
    },

    #[error("Optimization of '{structure}' failed: {source}")]
    Optimization {
        structure: String,
        #[source]
        source: OptimizerError,
    },

    #[error(transparent)]
    Output(#[from] OutputError),
}
