//! Data access for the three catalog kinds.
//!
//! `Catalog` is the only place that knows store column names or storage
//! paths. Read failures are logged and degraded to empty results; write
//! failures are returned with the store's message.

mod mapping;
mod seed;
mod upload;

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use rand::Rng;
use serde_json::{json, Map};

use crate::error::{AppError, Result};
use crate::models::{EntityKind, Record};
use crate::store::{Direction, Filter, ObjectStorage, RowStore, SelectQuery, UploadOptions};

use mapping::{
    merge_saved, record_from_row, write_payload, CREATED_AT_COLUMN, ID_COLUMN,
    LAST_DOWNLOADED_COLUMN,
};

pub use upload::ImageUpload;

/// Rows fetched before a random pick. Tables larger than this are not
/// sampled uniformly.
pub const RANDOM_PICK_LIMIT: usize = 100;

pub const DEFAULT_IMAGE_CACHE_SECONDS: u32 = 3600;

#[derive(Clone)]
pub struct Catalog {
    rows: Arc<dyn RowStore>,
    storage: Arc<dyn ObjectStorage>,
    image_cache_seconds: u32,
}

impl Catalog {
    pub fn new(rows: Arc<dyn RowStore>, storage: Arc<dyn ObjectStorage>) -> Self {
        Self {
            rows,
            storage,
            image_cache_seconds: DEFAULT_IMAGE_CACHE_SECONDS,
        }
    }

    pub fn with_image_cache_seconds(mut self, seconds: u32) -> Self {
        self.image_cache_seconds = seconds;
        self
    }

    /// All rows of a kind, newest first. A failed query is logged and reads
    /// as an empty table.
    pub async fn list(&self, kind: EntityKind) -> Vec<Record> {
        match self.try_list(kind).await {
            Ok(records) => records,
            Err(e) => {
                tracing::error!("Failed to list {}: {}", kind.table(), e);
                Vec::new()
            }
        }
    }

    pub async fn try_list(&self, kind: EntityKind) -> Result<Vec<Record>> {
        let query =
            SelectQuery::from(kind.table()).order_by(CREATED_AT_COLUMN, Direction::Descending);
        let rows = self.rows.select(&query).await?;
        Ok(rows.iter().map(|row| record_from_row(kind, row)).collect())
    }

    /// Uploads `image` (if any), then inserts or updates the row.
    ///
    /// An upload failure aborts before the row is touched.
    pub async fn save(&self, mut record: Record, image: Option<ImageUpload>) -> Result<Record> {
        let kind = record.kind;

        if let Some(image) = image {
            let url = self.upload_image(kind, image).await?;
            record.set_image(url);
        }

        let payload = write_payload(&record);

        let saved = match record.id.clone() {
            Some(id) => {
                let mut rows = self
                    .rows
                    .update(kind.table(), &[Filter::eq(ID_COLUMN, id.as_str())], payload)
                    .await
                    .map_err(into_persistence)?;
                if rows.len() != 1 {
                    return Err(AppError::Persistence(format!(
                        "expected one {} row with id {}, found {}",
                        kind.singular().to_lowercase(),
                        id,
                        rows.len()
                    )));
                }
                rows.remove(0)
            }
            None => self
                .rows
                .insert(kind.table(), payload)
                .await
                .map_err(into_persistence)?,
        };

        let merged = merge_saved(record, &saved);
        tracing::info!(
            "Saved {} {}",
            kind.singular().to_lowercase(),
            merged.id.as_deref().unwrap_or("?")
        );
        Ok(merged)
    }

    async fn upload_image(&self, kind: EntityKind, image: ImageUpload) -> Result<String> {
        let path = image.storage_path(kind.upload_folder(), Utc::now().timestamp_millis());
        let options = UploadOptions {
            cache_control_seconds: self.image_cache_seconds,
            upsert: true,
            content_type: image.content_type(),
        };

        self.storage
            .upload(&path, image.bytes, &options)
            .await
            .map_err(|e| match e {
                AppError::Upload(_) => e,
                other => AppError::Upload(other.to_string()),
            })?;

        Ok(self.storage.public_url(&path))
    }

    /// Deleting an id that does not exist is not an error.
    pub async fn delete(&self, kind: EntityKind, id: &str) -> Result<()> {
        self.rows
            .delete(kind.table(), &[Filter::eq(ID_COLUMN, id)])
            .await
            .map_err(into_persistence)?;
        tracing::info!("Deleted {} {}", kind.singular().to_lowercase(), id);
        Ok(())
    }

    /// Picks one of the oldest `RANDOM_PICK_LIMIT` rows, optionally limited
    /// to a category. A blank category means no filter. Errors and empty
    /// results both yield `None`.
    pub async fn pick_random(&self, kind: EntityKind, category: Option<&str>) -> Option<Record> {
        let mut query = SelectQuery::from(kind.table())
            .order_by(CREATED_AT_COLUMN, Direction::Ascending)
            .limit(RANDOM_PICK_LIMIT);
        if let Some(category) = category.map(str::trim).filter(|c| !c.is_empty()) {
            query = query.eq(kind.category_column(), category);
        }

        let rows = match self.rows.select(&query).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Failed to pick random {}: {}", kind.singular().to_lowercase(), e);
                return None;
            }
        };

        if rows.is_empty() {
            return None;
        }
        let index = rand::thread_rng().gen_range(0..rows.len());
        Some(record_from_row(kind, &rows[index]))
    }

    pub async fn mark_downloaded(&self, kind: EntityKind, id: &str) -> Result<()> {
        let mut patch = Map::new();
        patch.insert(
            LAST_DOWNLOADED_COLUMN.to_string(),
            json!(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)),
        );

        self.rows
            .update(kind.table(), &[Filter::eq(ID_COLUMN, id)], patch)
            .await
            .map_err(into_persistence)?;
        Ok(())
    }
}

fn into_persistence(e: AppError) -> AppError {
    match e {
        AppError::Persistence(_) => e,
        other => AppError::Persistence(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use tokio_test::{assert_err, assert_ok};

    fn catalog() -> (Catalog, MemoryStore) {
        let store = MemoryStore::new();
        let catalog = Catalog::new(Arc::new(store.clone()), Arc::new(store.clone()));
        (catalog, store)
    }

    fn quote(text: &str) -> Record {
        Record::new(EntityKind::Quote)
            .with("category", "Motivação")
            .with("quote", text)
            .with("authorName", "A")
    }

    #[tokio::test]
    async fn insert_assigns_id_and_keeps_text() {
        let (catalog, _) = catalog();

        let saved = catalog.save(quote("Test"), None).await.unwrap();

        assert!(saved.id.as_deref().is_some_and(|id| !id.is_empty()));
        assert_eq!(saved.get("category"), "Motivação");
        assert_eq!(saved.get("quote"), "Test");
        assert_eq!(saved.get("authorName"), "A");
    }

    #[tokio::test]
    async fn list_is_newest_first() {
        let (catalog, _) = catalog();
        catalog.save(quote("first"), None).await.unwrap();
        catalog.save(quote("second"), None).await.unwrap();

        let titles: Vec<String> = catalog
            .list(EntityKind::Quote)
            .await
            .iter()
            .map(|r| r.title().to_string())
            .collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[tokio::test]
    async fn list_error_reads_as_empty_but_try_list_reports_it() {
        let (catalog, store) = catalog();
        catalog.save(quote("kept"), None).await.unwrap();
        store.fail_reads(true);

        assert!(catalog.list(EntityKind::Quote).await.is_empty());
        assert_err!(catalog.try_list(EntityKind::Quote).await);
    }

    #[tokio::test]
    async fn update_with_new_image_uploads_under_kind_folder() {
        let (catalog, store) = catalog();
        let mut saved = catalog.save(quote("with image"), None).await.unwrap();
        saved.set("authorName", "B");

        let image = ImageUpload::new("Foto Autor.PNG", vec![9, 9]);
        let updated = catalog.save(saved.clone(), Some(image)).await.unwrap();

        let paths = store.object_paths();
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        assert!(path.starts_with("authors/"), "{path}");
        assert!(path.ends_with("_foto-autor.png"), "{path}");
        let timestamp = path
            .trim_start_matches("authors/")
            .split('_')
            .next()
            .unwrap();
        assert!(timestamp.parse::<i64>().is_ok());

        assert_eq!(updated.id, saved.id);
        assert_eq!(updated.image(), store.public_url(path));
        assert_eq!(updated.get("authorName"), "B");

        let (bytes, options) = store.object(path).unwrap();
        assert_eq!(bytes, vec![9, 9]);
        assert!(options.upsert);
        assert_eq!(options.cache_control_seconds, 3600);
        assert_eq!(options.content_type, "image/png");

        let rows = store.rows("quotes");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["author_image"], store.public_url(path));
    }

    #[tokio::test]
    async fn image_url_is_sticky_across_saves_without_new_image() {
        let (catalog, _) = catalog();
        for kind in EntityKind::ALL {
            let first = catalog
                .save(Record::new(kind), Some(ImageUpload::new("a.jpg", vec![1])))
                .await
                .unwrap();
            let url = first.image().to_string();
            assert!(url.starts_with("https://"));

            let second = catalog.save(first, None).await.unwrap();
            assert_eq!(second.image(), url);
            let listed = catalog.list(kind).await;
            assert_eq!(listed[0].image(), url);
        }
    }

    #[tokio::test]
    async fn upload_failure_leaves_rows_untouched() {
        let (catalog, store) = catalog();
        let saved = catalog.save(quote("original"), None).await.unwrap();
        store.fail_uploads(true);

        let mut edited = saved.clone();
        edited.set("quote", "changed");
        let err = catalog
            .save(edited, Some(ImageUpload::new("x.png", vec![1])))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Upload(_)));
        assert_eq!(store.rows("quotes")[0]["quote"], "original");

        let err = catalog
            .save(quote("new"), Some(ImageUpload::new("x.png", vec![1])))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Upload(_)));
        assert_eq!(store.rows("quotes").len(), 1);
    }

    #[tokio::test]
    async fn write_failure_is_persistence_error_with_store_message() {
        let (catalog, store) = catalog();
        store.fail_writes(true);

        let err = catalog.save(quote("x"), None).await.unwrap_err();
        match err {
            AppError::Persistence(message) => assert_eq!(message, "insert rejected"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn update_of_unknown_id_fails() {
        let (catalog, _) = catalog();
        let mut ghost = quote("ghost");
        ghost.id = Some("missing".to_string());

        let err = catalog.save(ghost, None).await.unwrap_err();
        assert!(matches!(err, AppError::Persistence(_)));
    }

    #[tokio::test]
    async fn delete_removes_row_and_is_idempotent() {
        let (catalog, _) = catalog();
        let keep = catalog.save(quote("keep"), None).await.unwrap();
        let gone = catalog.save(quote("gone"), None).await.unwrap();
        let gone_id = gone.id.unwrap();

        assert_ok!(catalog.delete(EntityKind::Quote, &gone_id).await);
        assert_ok!(catalog.delete(EntityKind::Quote, &gone_id).await);
        assert_ok!(catalog.delete(EntityKind::Quote, "never-existed").await);

        let ids: Vec<Option<String>> = catalog
            .list(EntityKind::Quote)
            .await
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, vec![keep.id]);
    }

    #[tokio::test]
    async fn pick_random_respects_category() {
        let (catalog, _) = catalog();
        for (i, category) in ["Carreira", "Liderança", "Carreira", "Gestão"].iter().enumerate() {
            let record = quote(&format!("q{i}")).with("category", *category);
            catalog.save(record, None).await.unwrap();
        }

        for _ in 0..20 {
            let picked = catalog
                .pick_random(EntityKind::Quote, Some("Carreira"))
                .await
                .unwrap();
            assert_eq!(picked.category(), "Carreira");
        }
        assert!(catalog
            .pick_random(EntityKind::Quote, Some("Inexistente"))
            .await
            .is_none());
        assert!(catalog.pick_random(EntityKind::Book, None).await.is_none());
    }

    #[tokio::test]
    async fn pick_random_only_samples_the_first_rows() {
        let (catalog, store) = catalog();
        for i in 0..RANDOM_PICK_LIMIT + 50 {
            let book = Record::new(EntityKind::Book).with("bookTitle", format!("b{i}"));
            catalog.save(book, None).await.unwrap();
        }
        let window: Vec<String> = store
            .rows("books")
            .iter()
            .take(RANDOM_PICK_LIMIT)
            .map(|row| row["book_title"].as_str().unwrap().to_string())
            .collect();

        for _ in 0..500 {
            let picked = catalog.pick_random(EntityKind::Book, None).await.unwrap();
            assert!(window.iter().any(|t| t == picked.title()), "{}", picked.title());
        }
    }

    #[tokio::test]
    async fn pick_random_treats_blank_category_as_no_filter() {
        let (catalog, _) = catalog();
        catalog.save(quote("only"), None).await.unwrap();

        for blank in ["", "  "] {
            let picked = catalog.pick_random(EntityKind::Quote, Some(blank)).await;
            assert_eq!(picked.unwrap().title(), "only");
        }
    }

    #[tokio::test]
    async fn pick_random_query_caps_rows_and_filters_category() {
        use crate::store::SupabaseClient;
        use wiremock::matchers::{method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/quotes"))
            .and(query_param("limit", RANDOM_PICK_LIMIT.to_string()))
            .and(query_param("order", "created_at.asc"))
            .and(query_param("category", "eq.Carreira"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "id": 3, "quote": "q", "category": "Carreira" }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = Arc::new(
            SupabaseClient::new(&server.uri(), "key".to_string(), "images".to_string()).unwrap(),
        );
        let catalog = Catalog::new(client.clone(), client);

        let picked = catalog
            .pick_random(EntityKind::Quote, Some("Carreira"))
            .await
            .unwrap();
        assert_eq!(picked.id.as_deref(), Some("3"));
    }

    #[tokio::test]
    async fn pick_random_filters_jobs_by_sector() {
        let (catalog, _) = catalog();
        let job = Record::new(EntityKind::Job)
            .with("jobTitle", "Analista")
            .with("sector", "Financeiro");
        catalog.save(job, None).await.unwrap();

        let picked = catalog
            .pick_random(EntityKind::Job, Some("Financeiro"))
            .await
            .unwrap();
        assert_eq!(picked.title(), "Analista");
    }

    #[tokio::test]
    async fn pick_random_error_is_none() {
        let (catalog, store) = catalog();
        catalog.save(quote("x"), None).await.unwrap();
        store.fail_reads(true);
        assert!(catalog.pick_random(EntityKind::Quote, None).await.is_none());
    }

    #[tokio::test]
    async fn mark_downloaded_sets_timestamp_and_save_never_clears_it() {
        let (catalog, _) = catalog();
        let saved = catalog.save(quote("dl"), None).await.unwrap();
        let id = saved.id.clone().unwrap();
        assert!(saved.last_downloaded.is_none());

        catalog.mark_downloaded(EntityKind::Quote, &id).await.unwrap();
        let listed = catalog.list(EntityKind::Quote).await;
        let stamped = listed[0].last_downloaded.unwrap();

        let mut stale = saved.clone();
        stale.set("quote", "edited");
        catalog.save(stale, None).await.unwrap();
        let listed = catalog.list(EntityKind::Quote).await;
        assert_eq!(listed[0].last_downloaded, Some(stamped));
        assert_eq!(listed[0].get("quote"), "edited");
    }
}
