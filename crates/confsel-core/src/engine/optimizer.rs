use super::config::{ChemistryParams, OptimizerConfig, WorkspaceMode};
use crate::core::io::xyz::{self, XyzError};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use tempfile::TempDir;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Name xTB always gives the optimized geometry, in its working directory.
pub const OPTIMIZED_STRUCTURE_FILE: &str = "xtbopt.xyz";

/// Files xTB leaves next to `xtbopt.xyz` after an optimization.
pub const SIDE_EFFECT_FILES: [&str; 5] = ["charges", "wbo", "xtbopt.log", "xtbrestart", "xtbtopo.mol"];

const GFN_LEVEL: &str = "2";
const STDERR_TAIL_LINES: usize = 20;

#[derive(Debug, Error)]
pub enum OptimizerError {
    #[error("Failed to launch optimizer '{executable}': {source}", executable = executable.display())]
    Spawn {
        executable: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Optimizer exited with {status}{}", format_stderr(stderr))]
    ProcessFailed { status: ExitStatus, stderr: String },

    #[error("Optimizer finished but wrote no '{path}'", path = path.display())]
    MissingOutput { path: PathBuf },

    #[error("Optimizer output '{path}' is malformed: {source}", path = path.display())]
    MalformedOutput {
        path: PathBuf,
        #[source]
        source: XyzError,
    },

    #[error("File operation on '{path}' failed: {source}", path = path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn format_stderr(stderr: &str) -> String {
    if stderr.trim().is_empty() {
        String::new()
    } else {
        format!(":\n{}", stderr.trim_end())
    }
}

/// One optimization job.
///
/// `structure` is the materialized input geometry; on success it is replaced by
/// the optimized geometry. `log` receives the optimizer's standard output and is
/// deleted after the energy has been read unless `keep_log` is set.
#[derive(Debug, Clone, Copy)]
pub struct OptimizationRequest<'a> {
    pub structure: &'a Path,
    pub log: &'a Path,
    pub keep_log: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OptimizationOutcome {
    /// Total energy in Hartree.
    pub energy: f64,
    pub structure: PathBuf,
}

/// A geometry optimizer that refines one structure at a time.
pub trait Optimizer {
    /// Optimizes the structure in place and reports its final energy.
    ///
    /// # Errors
    ///
    /// Returns an error if the process could not run, failed, or did not leave a
    /// readable optimized structure behind.
    fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationOutcome, OptimizerError>;

    /// Directory shared by all invocations, if the optimizer does not isolate them.
    fn shared_working_directory(&self) -> Option<&Path> {
        None
    }
}

/// Working directory handed to a single xTB process.
enum WorkingDirectory {
    Scratch(TempDir),
    Shared(PathBuf),
}

impl WorkingDirectory {
    fn path(&self) -> &Path {
        match self {
            WorkingDirectory::Scratch(dir) => dir.path(),
            WorkingDirectory::Shared(path) => path,
        }
    }
}

/// Runs `xtb <structure> --opt --chrg <c> --uhf <u> --gfn 2 [-alpb <solvent>]`.
#[derive(Debug, Clone)]
pub struct XtbOptimizer {
    executable: PathBuf,
    chemistry: ChemistryParams,
    workspace: WorkspaceMode,
    scratch_root: PathBuf,
}

impl XtbOptimizer {
    /// `scratch_root` is where isolated working directories are created. It should
    /// live on the same filesystem as the structure files.
    pub fn new(config: &OptimizerConfig, scratch_root: impl Into<PathBuf>) -> Self {
        Self {
            executable: config.executable.clone(),
            chemistry: config.chemistry.clone(),
            workspace: config.workspace.clone(),
            scratch_root: scratch_root.into(),
        }
    }

    pub fn command_args(&self, structure: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            structure.as_os_str().to_owned(),
            "--opt".into(),
            "--chrg".into(),
            self.chemistry.charge.to_string().into(),
            "--uhf".into(),
            self.chemistry.unpaired_electrons.to_string().into(),
            "--gfn".into(),
            GFN_LEVEL.into(),
        ];
        if let Some(solvent) = &self.chemistry.solvent {
            args.push("-alpb".into());
            args.push(solvent.into());
        }
        args
    }

    /// Bare program names are looked up on `PATH`; anything with a directory
    /// component is made absolute before the working directory changes.
    fn resolve_executable(&self) -> io::Result<PathBuf> {
        if self.executable.components().count() > 1 {
            std::path::absolute(&self.executable)
        } else {
            Ok(self.executable.clone())
        }
    }

    fn acquire_working_directory(&self) -> Result<WorkingDirectory, OptimizerError> {
        match &self.workspace {
            WorkspaceMode::Isolated => tempfile::Builder::new()
                .prefix(".xtb-")
                .tempdir_in(&self.scratch_root)
                .map(WorkingDirectory::Scratch)
                .map_err(|source| OptimizerError::Io {
                    path: self.scratch_root.clone(),
                    source,
                }),
            WorkspaceMode::Shared(dir) => {
                let stale = dir.join(OPTIMIZED_STRUCTURE_FILE);
                match fs::remove_file(&stale) {
                    Ok(()) => warn!("Removed stale {:?} left by an earlier run.", stale),
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                    Err(source) => return Err(OptimizerError::Io { path: stale, source }),
                }
                Ok(WorkingDirectory::Shared(dir.clone()))
            }
        }
    }
}

impl Optimizer for XtbOptimizer {
    fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationOutcome, OptimizerError> {
        let io_error = |path: &Path| {
            let path = path.to_path_buf();
            move |source| OptimizerError::Io { path, source }
        };

        // The process runs elsewhere, so relative paths would break.
        let structure = std::path::absolute(request.structure).map_err(io_error(request.structure))?;
        let executable = self.resolve_executable().map_err(io_error(&self.executable))?;
        let workdir = self.acquire_working_directory()?;
        let log = File::create(request.log).map_err(io_error(request.log))?;

        let args = self.command_args(&structure);
        info!("Optimizing {:?}", request.structure);
        debug!(
            "Running {:?} {:?} in {:?} > {:?}",
            self.executable,
            args,
            workdir.path(),
            request.log
        );

        let output = Command::new(&executable)
            .args(&args)
            .current_dir(workdir.path())
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| OptimizerError::Spawn {
                executable: self.executable.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(OptimizerError::ProcessFailed {
                status: output.status,
                stderr: stderr_tail(&output.stderr),
            });
        }

        let optimized = workdir.path().join(OPTIMIZED_STRUCTURE_FILE);
        if !optimized.is_file() {
            return Err(OptimizerError::MissingOutput { path: optimized });
        }
        let energy = xyz::read_energy(&optimized).map_err(|source| OptimizerError::MalformedOutput {
            path: optimized.clone(),
            source,
        })?;
        debug!("Optimized energy for {:?}: {} Eh", request.structure, energy);

        if !request.keep_log {
            fs::remove_file(request.log).map_err(io_error(request.log))?;
        }

        fs::rename(&optimized, request.structure).map_err(io_error(&optimized))?;

        Ok(OptimizationOutcome {
            energy,
            structure: request.structure.to_path_buf(),
        })
    }

    fn shared_working_directory(&self) -> Option<&Path> {
        match &self.workspace {
            WorkspaceMode::Shared(dir) => Some(dir),
            WorkspaceMode::Isolated => None,
        }
    }
}

fn stderr_tail(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(STDERR_TAIL_LINES);
    lines[start..].join("\n")
}
