use crate::core::io::ensemble::EnsembleFile;
use crate::core::io::locator::locate_ensembles;
use crate::engine::best::{BestRecord, BestTracker};
use crate::engine::config::SelectionConfig;
use crate::engine::error::EngineError;
use crate::engine::ledger::EnergyLedger;
use crate::engine::optimizer::{OptimizationRequest, Optimizer};
use crate::engine::output::OutputOrganizer;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::state::SelectedStructure;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, instrument, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct MoleculeSummary {
    pub molecule: String,
    pub ensemble: PathBuf,
    /// File names of the optimized structures, in rank order.
    pub structures: Vec<String>,
    pub best: Option<BestRecord>,
}

#[derive(Debug, Clone)]
pub struct SelectionResult {
    pub output_root: PathBuf,
    pub molecules: Vec<MoleculeSummary>,
    pub ledger: EnergyLedger,
}

/// Runs the complete selection pipeline.
///
/// Ensembles are processed one after another in path order, and each selected
/// conformer is optimized before the next one is written. The first error aborts
/// the run; whatever was already written to the output tree stays there.
#[instrument(skip_all, name = "selection_workflow")]
pub fn run<O: Optimizer + ?Sized>(
    config: &SelectionConfig,
    optimizer: &O,
    reporter: &ProgressReporter,
) -> Result<SelectionResult, EngineError> {
    // === Phase 1: Locate ensembles ===
    let ensembles = locate_ensembles(&config.search_root, &config.ensemble_file_name)?;
    info!(
        "Found {} ensemble file(s) under {:?}.",
        ensembles.len(),
        config.search_root
    );

    // === Phase 2: Reset the output tree ===
    let mut organizer = OutputOrganizer::prepare(&config.output_root, config.keep_logs)?;

    // === Phase 3: Select and optimize, one molecule at a time ===
    reporter.report(Progress::RunStart {
        total_molecules: ensembles.len() as u64,
    });
    let mut molecules = Vec::with_capacity(ensembles.len());
    let mut seen = HashSet::new();
    for path in &ensembles {
        let summary =
            process_ensemble(path, config, optimizer, &mut organizer, &mut seen, reporter)?;
        molecules.push(summary);
    }

    // === Phase 4: Persist the ledger and clean up ===
    let ledger = organizer.finish(optimizer.shared_working_directory())?;
    reporter.report(Progress::RunFinish);

    info!(
        "Selection complete: {} molecule(s), {} optimized structure(s).",
        molecules.len(),
        ledger.len()
    );
    Ok(SelectionResult {
        output_root: config.output_root.clone(),
        molecules,
        ledger,
    })
}

fn process_ensemble<O: Optimizer + ?Sized>(
    path: &Path,
    config: &SelectionConfig,
    optimizer: &O,
    organizer: &mut OutputOrganizer,
    seen: &mut HashSet<String>,
    reporter: &ProgressReporter,
) -> Result<MoleculeSummary, EngineError> {
    let ensemble_error = |source| EngineError::Ensemble {
        path: path.to_path_buf(),
        source,
    };
    let ensemble = EnsembleFile::read(path).map_err(ensemble_error)?;
    let molecule = ensemble.molecule().to_string();

    info!("Processing molecule '{}' from {:?}", molecule, path);
    reporter.report(Progress::MoleculeStart {
        name: molecule.clone(),
    });
    // Output names derive from the molecule name alone.
    if !seen.insert(molecule.clone()) {
        warn!(
            "Molecule name '{}' from {:?} was already used; its files replace the earlier ones.",
            molecule, path
        );
        reporter.report(Progress::Message(format!(
            "Duplicate molecule name '{}' ({})",
            molecule,
            path.display()
        )));
    }

    let mut tracker = BestTracker::new(&molecule);
    let mut structures = Vec::new();

    for (i, conformer) in ensemble.conformers(config.n_best).map_err(ensemble_error)?.enumerate() {
        let structure = SelectedStructure::new(&molecule, i + 1);
        let structure_path = organizer.materialize(&structure, &conformer)?;
        let log_path = organizer.log_path(&structure);

        let outcome = optimizer
            .optimize(&OptimizationRequest {
                structure: &structure_path,
                log: &log_path,
                keep_log: config.keep_logs,
            })
            .map_err(|source| EngineError::Optimization {
                structure: structure.file_name(),
                source,
            })?;

        if tracker.observe(&structure, outcome.energy) {
            info!(
                "New best for '{}': {} ({} Eh)",
                molecule,
                structure.file_name(),
                outcome.energy
            );
        }
        organizer.record(&structure, outcome.energy);
        reporter.report(Progress::StructureOptimized {
            file_name: structure.file_name(),
            energy: outcome.energy,
        });
        structures.push(structure.file_name());
    }

    let best = tracker.finish();
    match &best {
        Some(record) => {
            organizer.finalize_best(record)?;
        }
        None => {
            warn!(
                "Ensemble {:?} has no complete conformer block; no best structure for '{}'.",
                path, molecule
            );
            reporter.report(Progress::Message(format!(
                "Skipped '{}': no complete conformer block",
                molecule
            )));
        }
    }
    reporter.report(Progress::MoleculeFinish);

    Ok(MoleculeSummary {
        molecule,
        ensemble: path.to_path_buf(),
        structures,
        best,
    })
}
