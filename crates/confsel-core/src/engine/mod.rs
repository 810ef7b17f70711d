//! # Engine Module
//!
//! The stateful layer of a selection run.
//!
//! ## Overview
//!
//! A run walks every located ensemble, hands each selected conformer to an external
//! optimizer, and files the optimized structures into an output tree. The engine holds
//! the pieces with state or side effects that the [`crate::workflows`] layer strings
//! together.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Run parameters and the chemistry passed to xTB
//! - **Optimizer Invocation** ([`optimizer`]) - The [`optimizer::Optimizer`] seam and the
//!   process-backed [`optimizer::XtbOptimizer`]
//! - **Best Tracking** ([`best`]) - Per-molecule running minimum
//! - **Energy Ledger** ([`ledger`]) - Ordered per-structure energies and the CSV writer
//! - **Output Tree** ([`output`]) - Ownership of the result folders
//! - **State** ([`state`]) - Selected structures and their file names
//! - **Progress Monitoring** ([`progress`]) - Progress reporting callbacks
//! - **Error Handling** ([`error`]) - Engine-level error aggregation

pub mod best;
pub mod config;
pub mod error;
pub mod ledger;
pub mod optimizer;
pub mod output;
pub mod progress;
pub mod state;
