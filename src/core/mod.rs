//! Core library modules for quality-unwrap
//!
//! Grid storage, the frontier, phase arithmetic and the region-growing engine,
//! plus the configuration and file formats used by the CLI.

pub mod config;
pub mod connectivity;
pub mod engine;
pub mod error;
pub mod field;
pub mod frontier;
pub mod grid;
pub mod phase;
pub mod progress;
