//! History aggregate: saved computations and their bounded list.

pub mod entities;

pub use entities::*;
