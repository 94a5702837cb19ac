//! Core engine — the stateful side: sources, the deal ledger, scan cycles.

pub mod cycle;
pub mod ledger;
pub mod source;
