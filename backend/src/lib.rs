//! Trip-planning backend library.
//!
//! Layered hexagonally: `domain` holds transport-agnostic types, ports, and
//! the suggestion ranker; `inbound` adapts HTTP and WebSocket traffic onto
//! the domain; `outbound` implements the ports; `server` assembles the
//! application.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod server;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
