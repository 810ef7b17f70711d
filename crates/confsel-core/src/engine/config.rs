use crate::core::io::ensemble::ENSEMBLE_FILE_NAME;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_OPTIMIZER_EXECUTABLE: &str = "xtb";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for {parameter}: {reason}")]
    InvalidParameter {
        parameter: &'static str,
        reason: String,
    },
}

/// Electronic-state parameters forwarded to every optimizer invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChemistryParams {
    pub charge: i32,
    pub unpaired_electrons: u32,
    /// ALPB implicit solvent name, e.g. `water`.
    pub solvent: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceMode {
    /// Every invocation runs in its own scratch directory under the output root.
    Isolated,
    /// All invocations share one working directory, as xTB does when run by hand.
    Shared(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimizerConfig {
    pub executable: PathBuf,
    pub chemistry: ChemistryParams,
    pub workspace: WorkspaceMode,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionConfig {
    pub search_root: PathBuf,
    pub ensemble_file_name: String,
    pub output_root: PathBuf,
    pub n_best: usize,
    pub keep_logs: bool,
    pub optimizer: OptimizerConfig,
}

#[derive(Default)]
pub struct SelectionConfigBuilder {
    search_root: Option<PathBuf>,
    ensemble_file_name: Option<String>,
    output_root: Option<PathBuf>,
    n_best: Option<usize>,
    keep_logs: Option<bool>,
    executable: Option<PathBuf>,
    chemistry: Option<ChemistryParams>,
    workspace: Option<WorkspaceMode>,
}

impl SelectionConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn search_root(mut self, path: PathBuf) -> Self {
        self.search_root = Some(path);
        self
    }
    pub fn ensemble_file_name(mut self, name: impl Into<String>) -> Self {
        self.ensemble_file_name = Some(name.into());
        self
    }
    pub fn output_root(mut self, path: PathBuf) -> Self {
        self.output_root = Some(path);
        self
    }
    pub fn n_best(mut self, n: usize) -> Self {
        self.n_best = Some(n);
        self
    }
    pub fn keep_logs(mut self, keep: bool) -> Self {
        self.keep_logs = Some(keep);
        self
    }
    pub fn executable(mut self, path: PathBuf) -> Self {
        self.executable = Some(path);
        self
    }
    pub fn chemistry(mut self, params: ChemistryParams) -> Self {
        self.chemistry = Some(params);
        self
    }
    pub fn workspace(mut self, mode: WorkspaceMode) -> Self {
        self.workspace = Some(mode);
        self
    }

    pub fn build(self) -> Result<SelectionConfig, ConfigError> {
        let n_best = self.n_best.ok_or(ConfigError::MissingParameter("n_best"))?;
        if n_best == 0 {
            return Err(ConfigError::InvalidParameter {
                parameter: "n_best",
                reason: "at least one conformer must be selected".to_string(),
            });
        }

        let chemistry = self.chemistry.unwrap_or_default();
        if chemistry.solvent.as_deref().is_some_and(|s| s.trim().is_empty()) {
            return Err(ConfigError::InvalidParameter {
                parameter: "solvent",
                reason: "solvent name cannot be empty".to_string(),
            });
        }

        Ok(SelectionConfig {
            search_root: self.search_root.unwrap_or_else(|| PathBuf::from(".")),
            ensemble_file_name: self
                .ensemble_file_name
                .unwrap_or_else(|| ENSEMBLE_FILE_NAME.to_string()),
            output_root: self
                .output_root
                .ok_or(ConfigError::MissingParameter("output_root"))?,
            n_best,
            keep_logs: self.keep_logs.unwrap_or(false),
            optimizer: OptimizerConfig {
                executable: self
                    .executable
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_OPTIMIZER_EXECUTABLE)),
                chemistry,
                workspace: self.workspace.unwrap_or(WorkspaceMode::Isolated),
            },
        })
    }
}
