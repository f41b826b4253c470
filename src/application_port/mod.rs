mod metrics;
mod request_authenticator;
mod rotation_service;
mod token_issuer;

pub use metrics::*;
pub use request_authenticator::*;
pub use rotation_service::*;
pub use token_issuer::*;
