//! Command line interface.

mod commands;
pub mod icons;

pub use commands::run;
