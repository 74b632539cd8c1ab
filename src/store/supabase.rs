use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CACHE_CONTROL, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;
use url::Url;

use crate::error::{AppError, Result};

use super::{Filter, ObjectStorage, Row, RowStore, SelectQuery, UploadOptions};

const REST_PATH: &str = "rest/v1/";
const STORAGE_PATH: &str = "storage/v1/object/";

/// Supabase project client: PostgREST for rows, Storage for images.
pub struct SupabaseClient {
    client: Client,
    base_url: Url,
    api_key: String,
    bucket: String,
}

impl SupabaseClient {
    pub fn new(base_url: &str, api_key: String, bucket: String) -> Result<Self> {
        let mut normalized = base_url.trim().to_string();
        if !normalized.ends_with('/') {
            normalized.push('/');
        }
        let base_url = Url::parse(&normalized)
            .map_err(|e| AppError::Config(format!("invalid supabase_url '{base_url}': {e}")))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .default_headers(auth_headers(&api_key)?)
            .build()?;

        Ok(Self {
            client,
            base_url,
            api_key,
            bucket,
        })
    }

    fn table_url(&self, table: &str) -> Result<Url> {
        self.base_url
            .join(REST_PATH)
            .and_then(|u| u.join(table))
            .map_err(|e| AppError::Config(format!("invalid table url for {table}: {e}")))
    }

    fn object_url(&self, path: &str, public: bool) -> String {
        let encoded = path
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let scope = if public { "public/" } else { "" };
        format!(
            "{}{}{}{}/{}",
            self.base_url, STORAGE_PATH, scope, self.bucket, encoded
        )
    }

    async fn send(&self, request: RequestBuilder, fail: fn(String) -> AppError) -> Result<Response> {
        let response = request.send().await.map_err(|e| fail(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::debug!("supabase request failed with {}: {}", status, body);
            return Err(fail(error_message(status, &body)));
        }

        Ok(response)
    }
}

#[async_trait]
impl RowStore for SupabaseClient {
    async fn select(&self, query: &SelectQuery) -> Result<Vec<Row>> {
        let url = self.table_url(&query.table)?;
        let request = self.client.get(url).query(&query.to_query_pairs());

        let response = self.send(request, AppError::Fetch).await?;
        response
            .json::<Vec<Row>>()
            .await
            .map_err(|e| AppError::Fetch(e.to_string()))
    }

    async fn insert(&self, table: &str, row: Row) -> Result<Row> {
        let url = self.table_url(table)?;
        let request = self
            .client
            .post(url)
            .header("Prefer", "return=representation")
            .json(&row);

        let response = self.send(request, AppError::Persistence).await?;
        let rows: Vec<Row> = response
            .json()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))?;

        rows.into_iter()
            .next()
            .ok_or_else(|| AppError::Persistence(format!("insert into {table} returned no row")))
    }

    async fn update(&self, table: &str, filters: &[Filter], patch: Row) -> Result<Vec<Row>> {
        let url = self.table_url(table)?;
        let pairs: Vec<(String, String)> = filters.iter().map(Filter::to_query_pair).collect();
        let request = self
            .client
            .patch(url)
            .query(&pairs)
            .header("Prefer", "return=representation")
            .json(&patch);

        let response = self.send(request, AppError::Persistence).await?;
        response
            .json::<Vec<Row>>()
            .await
            .map_err(|e| AppError::Persistence(e.to_string()))
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> Result<()> {
        let url = self.table_url(table)?;
        let pairs: Vec<(String, String)> = filters.iter().map(Filter::to_query_pair).collect();
        let request = self.client.delete(url).query(&pairs);

        self.send(request, AppError::Persistence).await?;
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for SupabaseClient {
    async fn upload(&self, path: &str, bytes: Vec<u8>, options: &UploadOptions) -> Result<()> {
        let request = self
            .client
            .post(self.object_url(path, false))
            .header(
                CACHE_CONTROL,
                format!("max-age={}", options.cache_control_seconds),
            )
            .header("x-upsert", options.upsert.to_string())
            .header(CONTENT_TYPE, options.content_type.as_str())
            .body(bytes);

        self.send(request, AppError::Upload).await?;
        tracing::info!("Uploaded {} to bucket {}", path, self.bucket);
        Ok(())
    }

    fn public_url(&self, path: &str) -> String {
        self.object_url(path, true)
    }
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url.as_str())
            .field("bucket", &self.bucket)
            .field("api_key", &format!("{}…", self.api_key.chars().take(6).collect::<String>()))
            .finish()
    }
}

fn auth_headers(api_key: &str) -> Result<HeaderMap> {
    let invalid = |e: reqwest::header::InvalidHeaderValue| {
        AppError::Config(format!("supabase_key is not a valid header value: {e}"))
    };

    let mut headers = HeaderMap::new();
    headers.insert("apikey", HeaderValue::from_str(api_key).map_err(invalid)?);
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {api_key}")).map_err(invalid)?,
    );
    Ok(headers)
}

/// Pulls the human readable message out of a PostgREST or Storage error body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error", "msg"] {
            if let Some(Value::String(message)) = map.get(key) {
                return message.clone();
            }
        }
    }

    if body.trim().is_empty() {
        status.to_string()
    } else {
        body.trim().to_string()
    }
}
