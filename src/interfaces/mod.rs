//! Outer surfaces: the command line and its CSV formats.

pub mod cli;
pub mod csv;
