//! getrid - pick top-level pacman packages to get rid of
//!
//! This library exposes the core modules for use by the debug CLI and tests.

pub mod details;
pub mod graph;
pub mod keepfile;
pub mod ledger;
pub mod pacman;
pub mod removal;
pub mod session;
pub mod stats;
pub mod types;
pub mod view;
