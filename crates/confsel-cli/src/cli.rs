use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Alex S. Moraes",
    version,
    about = "confsel - Picks the N lowest-energy CREST conformers of every molecule, re-optimizes them with xTB and collects the energies.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Optimize the best conformers of every CREST ensemble and write the energy table.
    Run(RunArgs),
    /// List the CREST ensembles that a run would pick up, without optimizing anything.
    Scan(ScanArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    // --- Output ---
    /// Output folder name. It is deleted and recreated on every run. [default: crest_best_xtbopt]
    #[arg(long, value_name = "FOLDER")]
    pub fol: Option<PathBuf>,

    /// Keep the xTB output of every optimization in the `allout` folder.
    #[arg(long)]
    pub keepout: bool,

    // --- Selection ---
    /// Number of best conformers to take from each ensemble. [default: 5]
    #[arg(short = 'n', long, value_name = "N")]
    pub nbest: Option<usize>,

    /// Folder to search for CREST ensembles instead of the current directory.
    #[arg(long = "crest-fol", alias = "crest_fol", value_name = "C_FOL")]
    pub crest_fol: Option<PathBuf>,

    // --- Chemistry ---
    /// Net charge of the molecules. [default: 0]
    #[arg(short = 'c', long, value_name = "CHRG", allow_negative_numbers = true)]
    pub chrg: Option<i32>,

    /// Number of unpaired electrons. [default: 0]
    #[arg(long, value_name = "UHF")]
    pub uhf: Option<u32>,

    /// Implicit solvent for the ALPB model (see the xTB documentation for valid names).
    #[arg(short = 's', long, value_name = "SOL")]
    pub solvent: Option<String>,

    // --- Optimizer ---
    /// Path or name of the xTB executable. [default: xtb]
    #[arg(long, value_name = "PATH")]
    pub xtb: Option<PathBuf>,

    /// Run xTB in the current directory instead of a private scratch folder per structure.
    #[arg(long)]
    pub shared_workdir: bool,

    // --- Configuration ---
    /// Path to an optional configuration file in TOML format.
    #[arg(short = 'C', long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S selection.n-best=3
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `scan` subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct ScanArgs {
    /// Folder to search for CREST ensembles instead of the current directory.
    #[arg(long = "crest-fol", alias = "crest_fol", value_name = "C_FOL")]
    pub crest_fol: Option<PathBuf>,

    /// Configuration file whose `[selection]` settings the scan should follow.
    #[arg(short = 'C', long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}
