//! HTTP webhook delivery.
//!
//! [`endpoint`] validates the target URL and credential, [`transport`]
//! performs the request and [`webhook`] ties filtering, serialization and
//! response classification together.

pub mod endpoint;
pub mod transport;
pub mod webhook;
