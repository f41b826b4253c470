// stores

mod revocation_ledger;
mod session_registry;

pub use revocation_ledger::*;
pub use session_registry::*;

// external collaborators

mod credential_hasher;
mod principal_directory;

pub use credential_hasher::*;
pub use principal_directory::*;
