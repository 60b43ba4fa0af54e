//! Command-line front end components for the contribution ledger.

pub mod commands;
pub mod config;
pub mod logging;
