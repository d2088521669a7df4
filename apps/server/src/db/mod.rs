//! Data access layer
//!
//! [`EntityStore`] abstracts persistence so services stay backend-agnostic.
//! PostgreSQL is the production backend; the in-memory store serves tests and
//! local runs.

pub mod memory;
pub mod postgres;
pub mod traits;

pub use memory::InMemoryEntityStore;
pub use postgres::PostgresEntityStore;
pub use traits::EntityStore;
