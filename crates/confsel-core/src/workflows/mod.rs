//! # Workflows Module
//!
//! High-level entry points that run a complete selection from start to finish.
//!
//! ## Overview
//!
//! A workflow locates the input ensembles, resets the output tree, drives the
//! optimizer for each selected conformer and returns a summary of everything it
//! produced. Callers only supply a [`crate::engine::config::SelectionConfig`], an
//! [`crate::engine::optimizer::Optimizer`] and an optional progress reporter.
//!
//! - **Selection Workflow** ([`select`]) - N-best conformer selection, optimization
//!   and energy aggregation.

pub mod select;
