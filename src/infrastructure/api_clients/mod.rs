//! API clients for external vulnerability databases

pub mod ghsa;
pub mod models;
pub mod osv;

pub use ghsa::{GhsaAdvisory, GhsaClient};
pub use models::*;
pub use osv::OsvClient;
