use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{Duration, SecondsFormat, Utc};
use serde_json::Value;

use crate::error::{AppError, Result};

use super::{value_to_plain, Direction, Filter, ObjectStorage, Row, RowStore, SelectQuery, UploadOptions};

/// In-memory row and object store with switchable failures.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<HashMap<String, Vec<Row>>>>,
    objects: Arc<RwLock<HashMap<String, (Vec<u8>, UploadOptions)>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    fail_uploads: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_uploads(&self, fail: bool) {
        self.fail_uploads.store(fail, Ordering::SeqCst);
    }

    pub fn rows(&self, table: &str) -> Vec<Row> {
        self.tables
            .read()
            .unwrap()
            .get(table)
            .cloned()
            .unwrap_or_default()
    }

    pub fn object(&self, path: &str) -> Option<(Vec<u8>, UploadOptions)> {
        self.objects.read().unwrap().get(path).cloned()
    }

    pub fn object_paths(&self) -> Vec<String> {
        self.objects.read().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Fetch("connection refused".to_string()));
        }

        let mut rows: Vec<Row> = self
            .rows(&query.table)
            .into_iter()
            .filter(|row| query.filters.iter().all(|f| f.matches(row)))
            .collect();

        if let Some(order) = &query.order {
            rows.sort_by_key(|row| row.get(&order.column).map(value_to_plain).unwrap_or_default());
            if order.direction == Direction::Descending {
                rows.reverse();
            }
        }

        if let Some(limit) = query.limit {
            rows.truncate(limit);
        }

        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("insert rejected".to_string()));
        }

        let mut tables = self.tables.write().unwrap();
        let rows = tables.entry(table.to_string()).or_default();

        // Strictly increasing so created_at ordering is stable within a test.
        let created_at = Utc::now() + Duration::milliseconds(rows.len() as i64);
        row.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        row.insert("created_at".to_string(), Value::String(created_at.to_rfc3339_opts(SecondsFormat::Micros, true)));
        row.entry("last_downloaded".to_string()).or_insert(Value::Null);

        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Row) -> Result<Vec<Row>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("update rejected".to_string()));
        }

        let mut tables = self.tables.write().unwrap();
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| filters.iter().all(|f| f.matches(row))) {
                for (column, value) in &patch {
                    row.insert(column.clone(), value.clone());
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("delete rejected".to_string()));
        }

        let mut tables = self.tables.write().unwrap();
        if let Some(rows) = tables.get_mut(table) {
            rows.retain(|row| !filters.iter().all(|f| f.matches(row)));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MemoryStore {
    async fn upload(&self, path: &str, bytes: Vec<u8>, options: &UploadOptions) -> Result<()> {
        if self.fail_uploads.load(Ordering::SeqCst) {
            return Err(AppError::Upload("storage unavailable".to_string()));
        }

        let mut objects = self.objects.write().unwrap();
        if objects.contains_key(path) && !options.upsert {
            return Err(AppError::Upload("The resource already exists".to_string()));
        }
        objects.insert(path.to_string(), (bytes, options.clone()));
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        format!("https://storage.test/object/public/images/{path}")
    }
}
