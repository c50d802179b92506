//! Rally - league bookkeeping for pickup team sports.
//!
//! This crate wires the rating engine to a configuration file and a SQLite
//! database, and backs the `rally` command line tool.
//!
//! # Modules
//!
//! - [`config`] - `rally.toml` loading and conversion to engine settings
//! - [`storage`] - SQLite store for participants and matches
//! - [`json_output`] - serializable views for `--json` output

pub mod config;
pub mod json_output;
pub mod storage;
