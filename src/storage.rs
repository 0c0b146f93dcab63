//! Article persistence through a PostgREST-style upsert endpoint.
//!
//! The whole batch goes out in one `POST {base}/rest/v1/{table}` with
//! `Prefer: resolution=merge-duplicates`, so rows that already exist are
//! overwritten instead of rejected. There is no retry and no chunking: the
//! call either succeeds as a whole or is reported as one failure.
//!
//! # Architecture
//!
//! - [`ArticleStore`]: The seam the pipeline depends on
//! - [`RestStore`]: The HTTP implementation used in production
//! - [`StorageRow`]: The snake_case row shape the table expects

use crate::models::Article;
use crate::utils::truncate_for_log;
use chrono::{DateTime, Utc};
use reqwest::header::AUTHORIZATION;
use serde::Serialize;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument};
use url::Url;

/// Asks the store to merge rows whose key already exists.
pub const PREFER_MERGE_DUPLICATES: &str = "resolution=merge-duplicates";

/// Upper bound on one upsert request unless overridden.
pub const DEFAULT_SYNC_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("invalid storage url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code {status}: {body}")]
    Status { status: u16, body: String },
}

/// Something that can take a full batch of articles and upsert it.
pub trait ArticleStore {
    /// Upsert `articles` in one call and return how many were sent.
    async fn upsert(&self, articles: &[Article]) -> Result<usize, SyncError>;
}

/// One article as the storage table sees it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StorageRow<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub summary: &'a str,
    pub url: &'a str,
    pub thumbnail: &'a str,
    pub source: &'a str,
    pub source_id: &'a str,
    pub source_icon: &'a str,
    pub published_at: DateTime<Utc>,
    pub is_new: bool,
}

impl<'a> From<&'a Article> for StorageRow<'a> {
    fn from(article: &'a Article) -> Self {
        Self {
            id: &article.id,
            title: &article.title,
            summary: &article.summary,
            url: &article.url,
            thumbnail: &article.thumbnail,
            source: &article.source,
            source_id: &article.source_id,
            source_icon: &article.source_icon,
            published_at: article.published_at,
            is_new: article.is_new,
        }
    }
}

/// Where and how to reach the storage API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
}

/// [`ArticleStore`] backed by a PostgREST endpoint.
#[derive(Debug, Clone)]
pub struct RestStore {
    client: reqwest::Client,
    endpoint: Url,
    api_key: String,
    timeout: Duration,
}

impl RestStore {
    pub fn new(client: reqwest::Client, config: &StorageConfig) -> Result<Self, SyncError> {
        let mut base = config.base_url.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint = Url::parse(&base)?.join(&format!("rest/v1/{}", config.table.trim()))?;
        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
            timeout: DEFAULT_SYNC_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl ArticleStore for RestStore {
    #[instrument(level = "info", skip_all, fields(endpoint = %self.endpoint, count = articles.len()))]
    async fn upsert(&self, articles: &[Article]) -> Result<usize, SyncError> {
        let t0 = Instant::now();
        let rows: Vec<StorageRow<'_>> = articles.iter().map(StorageRow::from).collect();

        let response = self
            .client
            .post(self.endpoint.clone())
            .header("apikey", &self.api_key)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header("Prefer", PREFER_MERGE_DUPLICATES)
            .timeout(self.timeout)
            .json(&rows)
            .send()
            .await?;

        let status = response.status().as_u16();
        if matches!(status, 200 | 201) {
            info!(
                synced = rows.len(),
                elapsed_ms = t0.elapsed().as_millis() as u64,
                "Upserted articles"
            );
            return Ok(rows.len());
        }

        let body = response.text().await.unwrap_or_default();
        let body = truncate_for_log(&body, 300);
        error!(status, %body, "Storage rejected upsert");
        Err(SyncError::Status { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use chrono::TimeZone;
    use std::sync::{Arc, Mutex};

    type Captured = Arc<Mutex<Vec<(HeaderMap, serde_json::Value)>>>;

    fn article() -> Article {
        Article {
            id: "5d41402abc4b".to_string(),
            title: "Title".to_string(),
            summary: "Summary".to_string(),
            url: "https://example.com/a".to_string(),
            thumbnail: "https://cdn/a.png".to_string(),
            source: "Example".to_string(),
            source_id: "example".to_string(),
            source_icon: "📰".to_string(),
            published_at: Utc.with_ymd_and_hms(2026, 2, 24, 10, 0, 0).unwrap(),
            is_new: true,
        }
    }

    fn config(base_url: &str) -> StorageConfig {
        StorageConfig {
            base_url: base_url.to_string(),
            api_key: "anon-key".to_string(),
            table: "articles".to_string(),
        }
    }

    async fn spawn_store_server(status: StatusCode) -> (String, Captured, tokio::task::JoinHandle<()>) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route(
                "/rest/v1/articles",
                post(
                    move |State(captured): State<Captured>,
                          headers: HeaderMap,
                          Json(body): Json<serde_json::Value>| async move {
                        captured.lock().unwrap().push((headers, body));
                        (status, "duplicate key value violates unique constraint")
                    },
                ),
            )
            .with_state(captured.clone());
        let (base, server) = spawn_server(app).await;
        (base, captured, server)
    }

    #[test]
    fn test_storage_row_uses_snake_case() {
        let article = article();
        let json = serde_json::to_value(StorageRow::from(&article)).unwrap();
        assert_eq!(json["source_id"], "example");
        assert_eq!(json["source_icon"], "📰");
        assert_eq!(json["published_at"], "2026-02-24T10:00:00Z");
        assert_eq!(json["is_new"], true);
        assert_eq!(json["id"], "5d41402abc4b");
        assert!(json.get("sourceId").is_none());
        assert_eq!(json.as_object().unwrap().len(), 10);
    }

    #[test]
    fn test_endpoint_joins_table() {
        let client = reqwest::Client::new();
        let store = RestStore::new(client.clone(), &config("https://abc.supabase.co")).unwrap();
        assert_eq!(store.endpoint().as_str(), "https://abc.supabase.co/rest/v1/articles");

        let store = RestStore::new(client.clone(), &config("https://abc.supabase.co/")).unwrap();
        assert_eq!(store.endpoint().as_str(), "https://abc.supabase.co/rest/v1/articles");

        assert!(matches!(
            RestStore::new(client, &config("not a url")),
            Err(SyncError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_posts_batch_with_merge_headers() {
        let (base, captured, server) = spawn_store_server(StatusCode::CREATED).await;
        let store = RestStore::new(reqwest::Client::new(), &config(&base)).unwrap();

        let synced = store.upsert(&[article(), article()]).await.unwrap();
        assert_eq!(synced, 2);

        let requests = captured.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let (headers, body) = &requests[0];
        assert_eq!(headers["apikey"], "anon-key");
        assert_eq!(headers["authorization"], "Bearer anon-key");
        assert_eq!(headers["prefer"], PREFER_MERGE_DUPLICATES);
        assert!(
            headers["content-type"]
                .to_str()
                .unwrap()
                .starts_with("application/json")
        );
        assert_eq!(body.as_array().unwrap().len(), 2);
        assert_eq!(body[0]["source_id"], "example");

        server.abort();
    }

    #[tokio::test]
    async fn test_upsert_accepts_200() {
        let (base, _captured, server) = spawn_store_server(StatusCode::OK).await;
        let store = RestStore::new(reqwest::Client::new(), &config(&base)).unwrap();
        assert_eq!(store.upsert(&[article()]).await.unwrap(), 1);
        server.abort();
    }

    #[tokio::test]
    async fn test_upsert_reports_rejection() {
        let (base, _captured, server) = spawn_store_server(StatusCode::CONFLICT).await;
        let store = RestStore::new(reqwest::Client::new(), &config(&base)).unwrap();

        match store.upsert(&[article()]).await {
            Err(SyncError::Status { status, body }) => {
                assert_eq!(status, 409);
                assert!(body.contains("duplicate key"));
            }
            other => panic!("expected a status error, got {other:?}"),
        }

        server.abort();
    }

    #[tokio::test]
    async fn test_upsert_times_out_on_stalled_store() {
        let app = Router::new().route(
            "/rest/v1/articles",
            post(|| async {
                tokio::time::sleep(std::time::Duration::from_secs(10)).await;
                StatusCode::CREATED
            }),
        );
        let (base, server) = spawn_server(app).await;
        let store = RestStore::new(reqwest::Client::new(), &config(&base))
            .unwrap()
            .with_timeout(Duration::from_millis(300));

        match store.upsert(&[article()]).await {
            Err(SyncError::Request(e)) => assert!(e.is_timeout()),
            other => panic!("expected a timeout, got {other:?}"),
        }

        server.abort();
    }

    #[tokio::test]
    async fn test_upsert_reports_transport_error() {
        let store =
            RestStore::new(reqwest::Client::new(), &config("http://127.0.0.1:9")).unwrap();
        assert!(matches!(
            store.upsert(&[article()]).await,
            Err(SyncError::Request(_))
        ));
    }
}
