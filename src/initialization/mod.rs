//! Process-level resource initialization.
//!
//! Construction of the logger, the probe HTTP client, and the DNS resolver,
//! kept separate from the components that use them so each piece stays
//! independently constructible.

mod client;
mod logger;
mod resolver;

pub use client::init_probe_client;
pub use logger::init_logger_with;
pub use resolver::init_resolver;
