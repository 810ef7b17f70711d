//! # confsel Core Library
//!
//! Picks the lowest-energy conformers out of CREST ensemble files, refines each of them
//! with the xTB optimizer and collects the resulting energies into a single ledger.
//!
//! ## Architectural Philosophy
//!
//! The library follows a three-layer layout so that parsing, orchestration and the
//! user-facing pipeline can be tested in isolation.
//!
//! - **[`core`]: The Foundation.** Stateless file handling: locating ensemble files,
//!   slicing them into conformer blocks, and reading energies back from optimized
//!   XYZ files.
//!
//! - **[`engine`]: The Logic Core.** The stateful pieces of a run: the optimizer
//!   invocation seam, the per-molecule best tracker, the energy ledger and the output
//!   organizer that owns the result tree.
//!
//! - **[`workflows`]: The Public API.** Ties `core` and `engine` together into the
//!   complete selection pipeline.

pub mod core;
pub mod engine;
pub mod workflows;
