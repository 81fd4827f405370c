//! Domain models with validation at construction
//!
//! Request input is validated when these types are built. Invalid input
//! returns ValidationError, never reaches a repository.

pub mod item;
pub mod validation;

pub use item::{ItemName, NewItem, MAX_ITEM_NAME_LEN};
pub use validation::ValidationError;
