mod credential_hasher_impl;
mod jwt_issuer;
mod request_authenticator_impl;
mod rotation_service_fake;
mod rotation_service_impl;

pub use credential_hasher_impl::*;
pub use jwt_issuer::*;
pub use request_authenticator_impl::*;
pub use rotation_service_fake::*;
pub use rotation_service_impl::*;
