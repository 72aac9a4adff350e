//! Root Categories
//!
//! Names the kinds of GC roots and the bitmask used to select them.

pub mod types;

pub use types::{RootCategory, RootTypes};
