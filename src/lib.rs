pub mod clean;
pub mod config;
pub mod csv_output;
pub mod equalize;
pub mod error;
pub mod grid;
pub mod merge;
pub mod probe;
pub mod prompt;
pub mod rename;
pub mod tools;
pub mod utils;

pub mod args;
