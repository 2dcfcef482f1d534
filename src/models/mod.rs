//! Domain models for the rulebook.
//!
//! JSON field names are camelCase to match the web front-end; the store's
//! snake_case rows are translated in [`crate::mapper`].

mod backup;
mod patch;
mod rule;
mod section;

pub use backup::*;
pub use patch::*;
pub use rule::*;
pub use section::*;
