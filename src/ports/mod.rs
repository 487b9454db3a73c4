//! Port traits at the seams of the ledger core.

pub mod config_port;
pub mod store_port;
