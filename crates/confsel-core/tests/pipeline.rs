use confsel::core::io::ensemble::ENSEMBLE_FILE_NAME;
use confsel::core::io::xyz;
use confsel::engine::config::{SelectionConfig, SelectionConfigBuilder};
use confsel::engine::error::EngineError;
use confsel::engine::ledger::{HARTREE_TO_EV, LEDGER_FILE_NAME};
use confsel::engine::optimizer::{
    OptimizationOutcome, OptimizationRequest, Optimizer, OptimizerError,
};
use confsel::engine::output::{BEST_DIR, LOGS_DIR, STRUCTURES_DIR};
use confsel::engine::progress::{Progress, ProgressReporter};
use confsel::workflows::select;
use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::{TempDir, tempdir};

/// Stands in for xTB: the optimized energy is the CREST energy from the comment
/// line lowered by `shift`, and the geometry is passed through unchanged.
struct ScriptedOptimizer {
    shift: f64,
    fail_on: Option<String>,
    calls: RefCell<Vec<String>>,
}

impl ScriptedOptimizer {
    fn new() -> Self {
        Self {
            shift: 0.01,
            fail_on: None,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn failing_on(name: &str) -> Self {
        Self {
            fail_on: Some(name.to_string()),
            ..Self::new()
        }
    }
}

impl Optimizer for ScriptedOptimizer {
    fn optimize(
        &self,
        request: &OptimizationRequest,
    ) -> Result<OptimizationOutcome, OptimizerError> {
        let name = request
            .structure
            .file_name()
            .unwrap()
            .to_string_lossy()
            .into_owned();
        self.calls.borrow_mut().push(name.clone());

        fs::write(request.log, format!("optimizing {}\n", name)).unwrap();
        if self.fail_on.as_deref() == Some(name.as_str()) {
            return Err(OptimizerError::MissingOutput {
                path: PathBuf::from("xtbopt.xyz"),
            });
        }

        let input = fs::read_to_string(request.structure).unwrap();
        let mut lines = input.lines();
        let count = lines.next().unwrap();
        let crest_energy: f64 = lines.next().unwrap().trim().parse().unwrap();
        let energy = crest_energy - self.shift;

        let mut optimized = format!("{}\n energy: {} gnorm: 0.0001 xtb: scripted\n", count, energy);
        for line in lines {
            optimized.push_str(line);
            optimized.push('\n');
        }
        fs::write(request.structure, optimized).unwrap();

        if !request.keep_log {
            fs::remove_file(request.log).unwrap();
        }
        Ok(OptimizationOutcome {
            energy,
            structure: request.structure.to_path_buf(),
        })
    }
}

fn write_ensemble(root: &Path, molecule: &str, atom_count: usize, energies: &[f64]) {
    let dir = root.join(molecule);
    fs::create_dir_all(&dir).unwrap();
    let mut text = String::new();
    for (b, energy) in energies.iter().enumerate() {
        text.push_str(&format!("{:>6}\n", atom_count));
        text.push_str(&format!("    {:.8}\n", energy));
        for a in 0..atom_count {
            text.push_str(&format!(
                " C {:>12.6} {:>12.6} {:>12.6}\n",
                a as f64 * 1.4,
                b as f64 * 0.1,
                0.0
            ));
        }
    }
    fs::write(dir.join(ENSEMBLE_FILE_NAME), text).unwrap();
}

struct Fixture {
    _dir: TempDir,
    input: PathBuf,
    output: PathBuf,
}

fn fixture() -> Fixture {
    let dir = tempdir().unwrap();
    let input = dir.path().join("crest");
    let output = dir.path().join("crest_best_xtbopt");
    fs::create_dir_all(&input).unwrap();
    Fixture {
        input,
        output,
        _dir: dir,
    }
}

fn config(fx: &Fixture, n_best: usize, keep_logs: bool) -> SelectionConfig {
    SelectionConfigBuilder::new()
        .search_root(fx.input.clone())
        .output_root(fx.output.clone())
        .n_best(n_best)
        .keep_logs(keep_logs)
        .build()
        .unwrap()
}

fn list(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

fn ledger_rows(output: &Path) -> Vec<(String, f64, f64)> {
    let mut reader = csv::Reader::from_path(output.join(LEDGER_FILE_NAME)).unwrap();
    assert_eq!(
        reader.headers().unwrap().iter().collect::<Vec<_>>(),
        ["xyzfile", "energy(Eh)", "energy(eV)"]
    );
    reader
        .records()
        .map(|r| {
            let r = r.unwrap();
            (
                r[0].to_string(),
                r[1].parse().unwrap(),
                r[2].parse().unwrap(),
            )
        })
        .collect()
}

#[test]
fn three_blocks_with_n_two_selects_two_structures() {
    let fx = fixture();
    write_ensemble(&fx.input, "M", 4, &[-12.50, -12.40, -12.30]);
    let optimizer = ScriptedOptimizer::new();

    let result = select::run(&config(&fx, 2, false), &optimizer, &ProgressReporter::new()).unwrap();

    assert_eq!(list(&fx.output.join(STRUCTURES_DIR)), ["M_01.xyz", "M_02.xyz"]);
    assert_eq!(list(&fx.output.join(BEST_DIR)), ["M_xtb_best.xyz"]);
    assert!(!fx.output.join(LOGS_DIR).exists());

    let rows = ledger_rows(&fx.output);
    assert_eq!(rows.len(), 2);
    assert_eq!(result.ledger.len(), 2);

    let best_energy = xyz::read_energy(fx.output.join(BEST_DIR).join("M_xtb_best.xyz")).unwrap();
    let min = rows.iter().map(|r| r.1).fold(f64::INFINITY, f64::min);
    assert_eq!(best_energy, min);
    assert_eq!(result.molecules[0].best.as_ref().unwrap().source_file, "M_01.xyz");

    for structure in ["M_01.xyz", "M_02.xyz"] {
        let text = fs::read_to_string(fx.output.join(STRUCTURES_DIR).join(structure)).unwrap();
        assert_eq!(text.lines().count(), 4 + 2);
    }
}

#[test]
fn best_follows_the_optimized_energy_not_the_rank() {
    let fx = fixture();
    // CREST ordering is trusted, but the optimized energies decide the best.
    write_ensemble(&fx.input, "M", 2, &[-5.0, -5.2, -4.9]);
    let optimizer = ScriptedOptimizer::new();

    let result = select::run(&config(&fx, 3, false), &optimizer, &ProgressReporter::new()).unwrap();

    let best = result.molecules[0].best.as_ref().unwrap();
    assert_eq!(best.source_file, "M_02.xyz");
    assert_eq!(
        fs::read(fx.output.join(BEST_DIR).join("M_xtb_best.xyz")).unwrap(),
        fs::read(fx.output.join(STRUCTURES_DIR).join("M_02.xyz")).unwrap()
    );
}

#[test]
fn shortfall_extracts_all_available_blocks() {
    let fx = fixture();
    write_ensemble(&fx.input, "M", 3, &[-1.0, -0.9]);
    let optimizer = ScriptedOptimizer::new();

    let result = select::run(&config(&fx, 5, false), &optimizer, &ProgressReporter::new()).unwrap();

    assert_eq!(result.molecules[0].structures, ["M_01.xyz", "M_02.xyz"]);
    assert_eq!(ledger_rows(&fx.output).len(), 2);
}

#[test]
fn ledger_covers_all_molecules_in_path_order() {
    let fx = fixture();
    write_ensemble(&fx.input, "water", 3, &[-5.07, -5.06, -5.05]);
    write_ensemble(&fx.input, "benzene", 12, &[-18.9, -18.8]);
    write_ensemble(&fx.input, "ethanol", 9, &[-11.4, -11.38, -11.37, -11.36]);
    let optimizer = ScriptedOptimizer::new();

    let result = select::run(&config(&fx, 3, false), &optimizer, &ProgressReporter::new()).unwrap();

    let names: Vec<_> = result.molecules.iter().map(|m| m.molecule.as_str()).collect();
    assert_eq!(names, ["benzene", "ethanol", "water"]);

    let rows = ledger_rows(&fx.output);
    assert_eq!(rows.len(), 2 + 3 + 3);
    let files: Vec<_> = rows.iter().map(|r| r.0.as_str()).collect();
    assert_eq!(
        files,
        [
            "benzene_01.xyz",
            "benzene_02.xyz",
            "ethanol_01.xyz",
            "ethanol_02.xyz",
            "ethanol_03.xyz",
            "water_01.xyz",
            "water_02.xyz",
            "water_03.xyz",
        ]
    );
    for (_, eh, ev) in &rows {
        assert_eq!(*ev, eh * HARTREE_TO_EV);
    }
    assert_eq!(*optimizer.calls.borrow(), files);

    assert_eq!(
        list(&fx.output.join(BEST_DIR)),
        [
            "benzene_xtb_best.xyz",
            "ethanol_xtb_best.xyz",
            "water_xtb_best.xyz"
        ]
    );
    for molecule in ["benzene", "ethanol", "water"] {
        let best = xyz::read_energy(
            fx.output
                .join(BEST_DIR)
                .join(format!("{}_xtb_best.xyz", molecule)),
        )
        .unwrap();
        let min = rows
            .iter()
            .filter(|r| r.0.starts_with(&format!("{}_", molecule)))
            .map(|r| r.1)
            .fold(f64::INFINITY, f64::min);
        assert_eq!(best, min);
    }
}

#[test]
fn molecule_without_complete_blocks_is_skipped() {
    let fx = fixture();
    // Sorts first, so it is the very first molecule of the run.
    let empty = fx.input.join("A_empty");
    fs::create_dir_all(&empty).unwrap();
    fs::write(empty.join(ENSEMBLE_FILE_NAME), "5\n").unwrap();
    write_ensemble(&fx.input, "M", 2, &[-3.0]);
    let optimizer = ScriptedOptimizer::new();

    let result = select::run(&config(&fx, 2, false), &optimizer, &ProgressReporter::new()).unwrap();

    assert_eq!(result.molecules.len(), 2);
    assert!(result.molecules[0].structures.is_empty());
    assert!(result.molecules[0].best.is_none());
    assert_eq!(list(&fx.output.join(BEST_DIR)), ["M_xtb_best.xyz"]);
    assert_eq!(ledger_rows(&fx.output).len(), 1);
}

#[test]
fn no_ensembles_produces_an_empty_ledger() {
    let fx = fixture();
    let optimizer = ScriptedOptimizer::new();

    let result = select::run(&config(&fx, 5, false), &optimizer, &ProgressReporter::new()).unwrap();

    assert!(result.molecules.is_empty());
    assert!(ledger_rows(&fx.output).is_empty());
    assert!(list(&fx.output.join(STRUCTURES_DIR)).is_empty());
}

#[test]
fn keep_logs_retains_one_log_per_structure() {
    let fx = fixture();
    write_ensemble(&fx.input, "M", 1, &[-1.0, -0.5, -0.2]);
    let optimizer = ScriptedOptimizer::new();

    select::run(&config(&fx, 2, true), &optimizer, &ProgressReporter::new()).unwrap();

    assert_eq!(list(&fx.output.join(LOGS_DIR)), ["M_01.out", "M_02.out"]);
}

#[test]
fn rerun_rebuilds_an_identical_tree() {
    let fx = fixture();
    write_ensemble(&fx.input, "A", 2, &[-2.0, -2.1]);
    write_ensemble(&fx.input, "B", 3, &[-3.0, -2.9, -2.8]);
    let optimizer = ScriptedOptimizer::new();
    let cfg = config(&fx, 2, false);

    select::run(&cfg, &optimizer, &ProgressReporter::new()).unwrap();
    let first_structures = list(&fx.output.join(STRUCTURES_DIR));
    let first_ledger = fs::read_to_string(fx.output.join(LEDGER_FILE_NAME)).unwrap();
    fs::write(fx.output.join(STRUCTURES_DIR).join("stray.xyz"), "x").unwrap();

    select::run(&cfg, &optimizer, &ProgressReporter::new()).unwrap();

    assert_eq!(list(&fx.output.join(STRUCTURES_DIR)), first_structures);
    assert_eq!(
        fs::read_to_string(fx.output.join(LEDGER_FILE_NAME)).unwrap(),
        first_ledger
    );
}

#[test]
fn malformed_ensemble_aborts_the_run() {
    let fx = fixture();
    let bad = fx.input.join("bad");
    fs::create_dir_all(&bad).unwrap();
    fs::write(bad.join(ENSEMBLE_FILE_NAME), "three\ncomment\n").unwrap();
    let optimizer = ScriptedOptimizer::new();

    let err = select::run(&config(&fx, 2, false), &optimizer, &ProgressReporter::new()).unwrap_err();

    assert!(matches!(err, EngineError::Ensemble { ref path, .. } if path.ends_with("bad/crest_conformers.xyz")));
    assert!(!fx.output.join(LEDGER_FILE_NAME).exists());
}

#[test]
fn optimizer_failure_aborts_with_the_structure_name() {
    let fx = fixture();
    write_ensemble(&fx.input, "M", 2, &[-1.0, -0.9, -0.8]);
    let optimizer = ScriptedOptimizer::failing_on("M_02.xyz");

    let err = select::run(&config(&fx, 3, false), &optimizer, &ProgressReporter::new()).unwrap_err();

    match err {
        EngineError::Optimization { structure, source } => {
            assert_eq!(structure, "M_02.xyz");
            assert!(matches!(source, OptimizerError::MissingOutput { .. }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(*optimizer.calls.borrow(), ["M_01.xyz", "M_02.xyz"]);
    assert!(fx.output.join(STRUCTURES_DIR).join("M_01.xyz").exists());
    assert!(!fx.output.join(LEDGER_FILE_NAME).exists());
}

#[test]
fn progress_events_bracket_each_molecule() {
    let fx = fixture();
    write_ensemble(&fx.input, "M", 1, &[-1.0, -2.0]);
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let reporter = ProgressReporter::with_callback(Box::new(move |p| {
        sink.lock().unwrap().push(p);
    }));

    select::run(&config(&fx, 2, false), &ScriptedOptimizer::new(), &reporter).unwrap();

    let events = events.lock().unwrap();
    assert_eq!(events.first(), Some(&Progress::RunStart { total_molecules: 1 }));
    assert_eq!(
        events[1],
        Progress::MoleculeStart {
            name: "M".to_string()
        }
    );
    let optimized = events
        .iter()
        .filter(|e| matches!(e, Progress::StructureOptimized { .. }))
        .count();
    assert_eq!(optimized, 2);
    assert_eq!(events[events.len() - 2], Progress::MoleculeFinish);
    assert_eq!(events.last(), Some(&Progress::RunFinish));
}

fn recording_reporter() -> (ProgressReporter<'static>, Arc<Mutex<Vec<Progress>>>) {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    let reporter = ProgressReporter::with_callback(Box::new(move |p| {
        sink.lock().unwrap().push(p);
    }));
    (reporter, events)
}

fn messages(events: &Mutex<Vec<Progress>>) -> Vec<String> {
    events
        .lock()
        .unwrap()
        .iter()
        .filter_map(|e| match e {
            Progress::Message(msg) => Some(msg.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn skipped_molecule_is_reported() {
    let fx = fixture();
    let empty = fx.input.join("E");
    fs::create_dir_all(&empty).unwrap();
    fs::write(empty.join(ENSEMBLE_FILE_NAME), "4\ncomment\nC 0 0 0\n").unwrap();
    let (reporter, events) = recording_reporter();

    select::run(&config(&fx, 2, false), &ScriptedOptimizer::new(), &reporter).unwrap();

    assert_eq!(
        messages(&events),
        ["Skipped 'E': no complete conformer block"]
    );
}

#[test]
fn repeated_molecule_name_is_reported() {
    let fx = fixture();
    write_ensemble(&fx.input, "a/conf", 1, &[-1.0]);
    write_ensemble(&fx.input, "b/conf", 1, &[-2.0]);
    let (reporter, events) = recording_reporter();

    let result = select::run(&config(&fx, 1, false), &ScriptedOptimizer::new(), &reporter).unwrap();

    assert_eq!(result.molecules.len(), 2);
    let messages = messages(&events);
    assert_eq!(messages.len(), 1);
    assert!(messages[0].starts_with("Duplicate molecule name 'conf'"));
    assert!(messages[0].contains("b"));
    assert_eq!(list(&fx.output.join(STRUCTURES_DIR)), ["conf_01.xyz"]);
}
