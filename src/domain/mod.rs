//! Core ledger types and logic.

pub mod edit;
pub mod error;
pub mod ledger;
pub mod merge;
pub mod metrics;
pub mod summary;
pub mod trade;
