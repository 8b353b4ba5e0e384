//! Learning-platform backend library.
//!
//! Layering:
//! - [`domain`] — entities, services, and the ports they drive.
//! - [`inbound`] — HTTP handlers mapping requests onto the services.
//! - [`outbound`] — Diesel persistence and third-party HTTP adapters.
//! - [`middleware`] — request tracing.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

pub use doc::ApiDoc;
pub use middleware::Trace;
