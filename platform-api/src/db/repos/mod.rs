//! Repository implementations for database access
//!
//! Repositories borrow a session for their lifetime; the caller owns the
//! connection and returns it to the pool by dropping it.

pub mod items;

pub use items::{Item, ItemRepo, DEFAULT_LIST_LIMIT};
