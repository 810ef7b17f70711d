//! Provides input/output functionality for the XYZ-based files of a selection run.
//!
//! CREST writes its sorted conformer ensemble as concatenated XYZ blocks, and xTB
//! writes each optimized geometry as a single XYZ block whose comment line carries
//! the final energy. This module covers discovering the former, slicing it into
//! blocks, and reading the energy back out of the latter.

pub mod ensemble;
pub mod locator;
pub mod xyz;
