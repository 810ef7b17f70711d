use crate::cli::RunArgs;
use crate::config::build_config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use confsel::engine::optimizer::XtbOptimizer;
use confsel::engine::progress::ProgressReporter;
use confsel::workflows::select::{self, SelectionResult};
use tracing::info;

pub fn run(args: RunArgs, show_progress: bool) -> Result<()> {
    info!("Resolving configuration...");
    let config = build_config(&args)?;

    let optimizer = XtbOptimizer::new(&config.optimizer, &config.output_root);
    info!(
        "Optimizer: {:?} (charge {}, uhf {}, solvent {})",
        config.optimizer.executable,
        config.optimizer.chemistry.charge,
        config.optimizer.chemistry.unpaired_electrons,
        config.optimizer.chemistry.solvent.as_deref().unwrap_or("none"),
    );

    let progress_handler = CliProgressHandler::new(show_progress);
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let result = select::run(&config, &optimizer, &reporter)?;

    print_summary(&result);
    Ok(())
}

fn print_summary(result: &SelectionResult) {
    println!(
        "\n{} molecule(s), {} optimized structure(s) in {}",
        result.molecules.len(),
        result.ledger.len(),
        result.output_root.display()
    );
    for molecule in &result.molecules {
        match &molecule.best {
            Some(best) => println!(
                "  {:<24} {:>2} structure(s)  best: {} ({:.8} Eh)",
                molecule.molecule,
                molecule.structures.len(),
                best.source_file,
                best.energy
            ),
            None => println!(
                "  {:<24} no complete conformer block, skipped",
                molecule.molecule
            ),
        }
    }
}
