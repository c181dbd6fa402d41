use std::time::Duration;

use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client, Method, StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Database-layer failures, split so callers can tell a transient transport
/// problem (fall back to the cache) from a definitive API answer.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("database unreachable: {0}")]
    Unavailable(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("authentication error: {0}")]
    Auth(String),

    #[error("database error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("invalid response body: {0}")]
    Decode(String),
}

/// Thin PostgREST client over the Supabase REST API.
pub struct SupabaseClient {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseClient {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .unwrap_or_default(),
            base_url: config.supabase_url.clone(),
            service_key: config.supabase_service_key.clone(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.base_url.is_empty() && !self.service_key.is_empty()
    }

    fn headers(&self, prefer_representation: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();

        if let Ok(key) = HeaderValue::from_str(&self.service_key) {
            headers.insert("apikey", key);
        }
        if let Ok(bearer) = HeaderValue::from_str(&format!("Bearer {}", self.service_key)) {
            headers.insert(AUTHORIZATION, bearer);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if prefer_representation {
            headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        }

        headers
    }

    pub async fn request<T>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<T, DbError>
    where
        T: DeserializeOwned,
    {
        if !self.is_configured() {
            return Err(DbError::Unavailable("supabase is not configured".into()));
        }

        let url = format!("{}{}", self.base_url, path);
        debug!("Making request to {}", url);

        let mutating = matches!(method, Method::POST | Method::PATCH | Method::DELETE);
        let mut req = self
            .client
            .request(method, &url)
            .headers(self.headers(mutating));

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = req
            .send()
            .await
            .map_err(|e| DbError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Supabase error ({}): {}", status, error_text);

            return Err(match status {
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => DbError::Auth(error_text),
                StatusCode::NOT_FOUND => DbError::NotFound(error_text),
                _ => DbError::Api {
                    status: status.as_u16(),
                    message: error_text,
                },
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| DbError::Decode(e.to_string()))
    }

    /// `GET /rest/v1/{table}?{query}` returning the matching rows.
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
    ) -> Result<Vec<T>, DbError> {
        let path = format!("/rest/v1/{}?{}", table, query);
        self.request(Method::GET, &path, None).await
    }

    /// Insert one row and return its stored representation.
    pub async fn insert<T: DeserializeOwned>(&self, table: &str, row: Value) -> Result<T, DbError> {
        let path = format!("/rest/v1/{}", table);
        let mut rows: Vec<T> = self
            .request(Method::POST, &path, Some(Value::Array(vec![row])))
            .await?;
        rows.pop()
            .ok_or_else(|| DbError::Decode("insert returned no representation".into()))
    }

    /// `PATCH` the rows matched by `query`, returning the updated rows.
    /// The filter and write are one statement, so read-modify-write races
    /// resolve inside the database.
    pub async fn update<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &str,
        changes: Value,
    ) -> Result<Vec<T>, DbError> {
        let path = format!("/rest/v1/{}?{}", table, query);
        self.request(Method::PATCH, &path, Some(changes)).await
    }

    /// Delete the rows matched by `query`, returning what was removed.
    pub async fn delete(&self, table: &str, query: &str) -> Result<Vec<Value>, DbError> {
        let path = format!("/rest/v1/{}?{}", table, query);
        self.request(Method::DELETE, &path, None).await
    }
}
