//! CLI subcommand modules.
//!
//! This module contains the implementations for all intramom CLI subcommands.

pub(crate) mod backtest;
pub(crate) mod loadings;
pub(crate) mod synthesize;
