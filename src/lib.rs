//! LOADSCOPE — Freight load profitability estimator and deal ledger
//!
//! Library crate exposing all modules for use by integration tests
//! and the binary entry point.

pub mod config;
pub mod engine;
pub mod model;
pub mod types;
