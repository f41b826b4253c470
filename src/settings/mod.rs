//! Settings are layered: compiled-in defaults per profile, a TOML file, and
//! `JWT_ACCESS_SECRET` / `JWT_REFRESH_SECRET` env overrides applied at wiring
//! time in `server`.

mod cli;
pub use clap::Parser;
pub use cli::*;

mod settings;
pub use settings::*;
