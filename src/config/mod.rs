//! Monitor Configuration Module
//!
//! All parameters come from environment variables, optionally backed by a
//! `.env` file.
//!
//! ## Loading Order
//!
//! 1. Process environment variables
//! 2. `--env-file <PATH>` if given, otherwise `.env` in the working directory if present
//!
//! Missing required parameters are fatal at startup; the error lists every
//! missing name, not just the first.

mod monitor_config;
pub mod defaults;

pub use monitor_config::*;
