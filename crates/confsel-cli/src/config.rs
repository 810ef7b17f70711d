//! Resolution of the `run` configuration.
//!
//! Values are merged in order of precedence: command-line flags, then `--set`
//! overrides, then the TOML config file, then [`defaults::DefaultsConfig`].

mod builder;
mod defaults;
mod file;

pub use builder::{build_config, resolve_scan_target};
