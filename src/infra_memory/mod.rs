//! In-process adapters with the same TTL semantics as the Redis ones.
//! Used by the "memory" backends and by the test suites. Expiry is lazy on
//! read; the server runs a sweeper task that calls [`PurgeExpired`]
//! periodically so idle entries do not pile up.

mod principal_directory_memory;
mod revocation_ledger_memory;
mod session_registry_memory;

pub use principal_directory_memory::*;
pub use revocation_ledger_memory::*;
pub use session_registry_memory::*;

pub trait PurgeExpired: Send + Sync {
    /// Drop every expired entry, returning how many were removed.
    fn purge_expired(&self) -> usize;
}
