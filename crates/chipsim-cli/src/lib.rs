//! chipsim CLI crate
//!
//! Purpose:
//! - Provide a CLI-first interface to the chipsim NoC/LIF simulation engine.
//! - Expose user-facing commands to check, run, and inspect simulator
//!   program files and workspaces.
//!
//! Public responsibilities (library view):
//! - Re-export the primary CLI entry ([`ChipSimCli`]) for integration in
//!   binary and testing contexts (`Cli::try_parse_from` in integration
//!   tests).
//! - Expose command modules as a library so they can be invoked
//!   programmatically without spawning a subprocess.
//!
//! Integration points:
//! - `chipsim_core`: `Chip`, `SimController`, the engine's error type.
//! - `chipsim_program`: `ChipProgrammer`, the program-file parser.

pub mod commands;
pub mod config;
pub mod error;

pub use commands::ChipSimCli;
