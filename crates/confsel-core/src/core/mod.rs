//! # Core Module
//!
//! Stateless building blocks for reading CREST output and xTB results.
//!
//! ## Overview
//!
//! Everything in this module works on plain files and text. Nothing here spawns
//! processes or owns the output tree; those concerns live in [`crate::engine`].
//!
//! - **File I/O** ([`io`]) - Locating ensemble files, slicing them into conformer
//!   blocks and extracting energies from optimized structures.

pub mod io;
