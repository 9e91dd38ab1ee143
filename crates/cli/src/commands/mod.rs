//! CLI command implementations.
//!
//! Commands take the document store as a trait object so they can run
//! against the in-memory store in tests.

pub mod products;
pub mod users;
