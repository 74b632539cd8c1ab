//! Boundary to the hosted backend: a generic row store and an object store.
//!
//! The catalog only talks to these traits, so the Supabase client can be
//! swapped for the in-memory store in tests.

#[cfg(test)]
pub mod memory;
mod query;
mod supabase;

use async_trait::async_trait;

use crate::error::Result;

pub use query::{value_to_plain, Direction, Filter, Row, SelectQuery};
pub use supabase::SupabaseClient;

#[async_trait]
pub trait RowStore: Send + Sync {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Row>>;

    /// Inserts one row and returns it as stored.
    async fn insert(&self, table: &str, row: Row) -> Result<Row>;

    /// Updates every row matching `filters` and returns the updated rows.
    async fn update(&self, table: &str, filters: &[Filter], patch: Row) -> Result<Vec<Row>>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadOptions {
    pub cache_control_seconds: u32,
    pub upsert: bool,
    pub content_type: String,
}

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    async fn upload(&self, path: &str, bytes: Vec<u8>, options: &UploadOptions) -> Result<()>;

    fn public_url(&self, path: &str) -> String;
}
