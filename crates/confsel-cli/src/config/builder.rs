use super::defaults::DefaultsConfig;
use super::file::FileConfig;
use crate::cli::{RunArgs, ScanArgs};
use crate::error::{CliError, Result};
use crate::utils::parser::{self, SetKey};
use confsel::core::io::ensemble::ENSEMBLE_FILE_NAME;
use confsel::engine::config::{
    ChemistryParams, SelectionConfig, SelectionConfigBuilder, WorkspaceMode,
};
use std::path::PathBuf;
use tracing::debug;

pub fn build_config(args: &RunArgs) -> Result<SelectionConfig> {
    let defaults = DefaultsConfig::default();

    let file_config = if let Some(config_path) = &args.config {
        FileConfig::from_file(config_path)?
    } else {
        FileConfig::default()
    };

    let mut file_config = apply_set_values(file_config, &args.set_values)?;

    let output_file = file_config.output.take().unwrap_or_default();
    let output_root = args
        .fol
        .clone()
        .or(output_file.folder)
        .unwrap_or_else(|| PathBuf::from(&defaults.output_folder));
    let keep_logs = args.keepout || output_file.keep_logs.unwrap_or(defaults.keep_logs);

    let selection_file = file_config.selection.take().unwrap_or_default();
    let n_best = args
        .nbest
        .or(selection_file.n_best)
        .unwrap_or(defaults.n_best);

    let chemistry_file = file_config.chemistry.take().unwrap_or_default();
    let chemistry = ChemistryParams {
        charge: args
            .chrg
            .or(chemistry_file.charge)
            .unwrap_or(defaults.charge),
        unpaired_electrons: args
            .uhf
            .or(chemistry_file.uhf)
            .unwrap_or(defaults.unpaired_electrons),
        solvent: args.solvent.clone().or(chemistry_file.solvent),
    };

    let optimizer_file = file_config.optimizer.take().unwrap_or_default();
    let executable = args
        .xtb
        .clone()
        .or(optimizer_file.executable)
        .unwrap_or_else(|| PathBuf::from(&defaults.executable));
    let shared_workdir = args.shared_workdir
        || optimizer_file
            .shared_workdir
            .unwrap_or(defaults.shared_workdir);
    let workspace = if shared_workdir {
        WorkspaceMode::Shared(std::env::current_dir()?)
    } else {
        WorkspaceMode::Isolated
    };

    let mut builder = SelectionConfigBuilder::new()
        .output_root(output_root)
        .n_best(n_best)
        .keep_logs(keep_logs)
        .executable(executable)
        .chemistry(chemistry)
        .workspace(workspace);
    if let Some(root) = args.crest_fol.clone().or(selection_file.crest_fol) {
        builder = builder.search_root(root);
    }
    if let Some(name) = selection_file.ensemble_file {
        builder = builder.ensemble_file_name(name);
    }

    let config = builder
        .build()
        .map_err(|e| CliError::Config(e.to_string()))?;
    debug!("Resolved selection configuration: {:?}", config);
    Ok(config)
}

/// Search root and ensemble file name a `run` with the same settings would use.
pub fn resolve_scan_target(args: &ScanArgs) -> Result<(PathBuf, String)> {
    let selection_file = match &args.config {
        Some(path) => FileConfig::from_file(path)?.selection.unwrap_or_default(),
        None => Default::default(),
    };
    let root = args
        .crest_fol
        .clone()
        .or(selection_file.crest_fol)
        .unwrap_or_else(|| PathBuf::from("."));
    let file_name = selection_file
        .ensemble_file
        .unwrap_or_else(|| ENSEMBLE_FILE_NAME.to_string());
    Ok((root, file_name))
}

fn apply_set_values(mut config: FileConfig, set_values: &[String]) -> Result<FileConfig> {
    let invalid = |e: parser::ParseError| CliError::Config(e.to_string());

    for raw in set_values {
        let set = parser::parse_set_value(raw).map_err(|e| CliError::Argument(e.to_string()))?;

        match set.key {
            SetKey::OutputFolder => {
                config.output.get_or_insert_with(Default::default).folder =
                    Some(PathBuf::from(&set.value));
            }
            SetKey::NBest => {
                config.selection.get_or_insert_with(Default::default).n_best =
                    Some(set.parse_value("integer").map_err(invalid)?);
            }
            SetKey::Charge => {
                config.chemistry.get_or_insert_with(Default::default).charge =
                    Some(set.parse_value("integer").map_err(invalid)?);
            }
            SetKey::Uhf => {
                config.chemistry.get_or_insert_with(Default::default).uhf =
                    Some(set.parse_value("non-negative integer").map_err(invalid)?);
            }
            SetKey::Solvent => {
                config.chemistry.get_or_insert_with(Default::default).solvent =
                    Some(set.value.clone());
            }
            SetKey::Executable => {
                config.optimizer.get_or_insert_with(Default::default).executable =
                    Some(PathBuf::from(&set.value));
            }
        }
    }
    Ok(config)
}
