//! Repository layer: database-backed implementations of the storage traits.

pub mod version_repo;

pub use version_repo::PgVersionStore;
