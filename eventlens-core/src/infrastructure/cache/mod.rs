//! Aggregate cache stores

pub mod dragonfly_cache;
pub mod memory_cache;

pub use dragonfly_cache::DragonflyCache;
pub use memory_cache::MemoryCache;
