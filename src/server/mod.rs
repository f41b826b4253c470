mod server;
mod port;
mod event_publisher_impl;
mod sweeper;

pub use server::*;
pub use port::*;
pub use event_publisher_impl::*;
pub use sweeper::*;
