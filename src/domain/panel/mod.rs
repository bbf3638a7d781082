//! Panel aggregate: persisted form state, position and storage contract.

pub mod config;
pub mod entities;
pub mod repositories;

pub use config::*;
pub use entities::*;
pub use repositories::*;
