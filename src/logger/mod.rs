//! The `logger` module is a simple utility: a bootstrap subscriber whose
//! filter can be reloaded once settings have been parsed.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
