//! Backing filesystem implementations.

pub mod memory;

pub use memory::{MemoryFileSystem, MemoryHandle, READ_ONLY_OPTION};
