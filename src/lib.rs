//! Physics simulators and their shared stepping machinery.
//!
//! The binary in `main.rs` only draws; everything that evolves state lives
//! here so it can be exercised without a window.

pub mod config;
pub mod simulation;
