mod revocation_ledger_redis;
mod session_registry_redis;

pub use revocation_ledger_redis::*;
pub use session_registry_redis::*;
