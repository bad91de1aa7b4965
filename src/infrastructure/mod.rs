//! Storage backends and external collaborators.

pub mod in_memory;
pub mod locks;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod verification;
