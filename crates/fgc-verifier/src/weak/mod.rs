//! Weak Roots
//!
//! Tables of weak references and the processor that walks them.

pub mod processor;
pub mod storage;

pub use processor::{SerialWeakPhase, WeakProcessor, WeakStorageId};
pub use storage::{OopStorage, StorageHandle};
