// Application layer - the ledger engine and its error taxonomy.
// Adapters (CLI, HTTP, ...) call into LedgerEngine with validated arguments.

pub mod clock;
pub mod engine;
pub mod error;

pub use clock::*;
pub use engine::*;
pub use error::*;
