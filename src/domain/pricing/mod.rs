//! Pricing aggregate: number parsing, display formatting and the solver.

pub mod format;
pub mod parser;
pub mod services;
pub mod value_objects;

pub use format::*;
pub use parser::parse_loose;
pub use services::*;
pub use value_objects::*;
