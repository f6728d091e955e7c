//! Durable key-value persistence for the serialized profile and raw OAuth
//! tokens. The store is the only shared mutable resource in this core:
//! read at initialization, written on every state-changing operation.
//! Writes are whole-value replacements keyed by a fixed set of string keys.

mod cache;
mod file;
mod memory;

pub use cache::SessionCache;
pub use file::FileSessionStore;
pub use memory::MemorySessionStore;

use crate::error::Result;
use async_trait::async_trait;

/// Persistent key-value storage surviving app restarts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Returns the stored value, or `None` if absent.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores the value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes the key; idempotent.
    async fn remove(&self, key: &str) -> Result<()>;
}
