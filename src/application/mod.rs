pub mod controller;
pub mod echo_guard;
pub mod history_ledger;
pub mod host;

pub use controller::*;
pub use echo_guard::*;
pub use history_ledger::*;
pub use host::*;
