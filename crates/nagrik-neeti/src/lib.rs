//! Data access and derived metrics for the NagrikNeeti civic transparency portal.
//!
//! Every entity collection (candidates, promises, feedback, reports, users, analytics)
//! is wrapped by a service that sanitizes writes, shapes queries, and reports failures
//! through [`entities::AccessError`]. Persistence goes through the [`store::DocumentStore`]
//! trait so any backend exposing document CRUD and equality/ordered queries can be used.

pub mod aggregate;
pub mod compare;
pub mod config;
pub mod entities;
pub mod error;
pub mod filters;
pub mod format;
pub mod portal;
pub mod router;
pub mod seed;
pub mod storage;
pub mod store;
pub mod telemetry;
pub mod validate;

#[cfg(test)]
mod tests;

pub use portal::Portal;
pub use router::portal_router;
