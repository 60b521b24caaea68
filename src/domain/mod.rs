mod ledger;
mod money;
mod transaction;
mod validation;
mod wallet;

pub use ledger::*;
pub use money::*;
pub use transaction::*;
pub use validation::*;
pub use wallet::*;
