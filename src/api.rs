use crate::error::ApiError;
use crate::models::{Category, NewsId};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

pub const NEWS_PATH: &str = "/api/news";
pub const IMAGE_UPLOAD_PATH: &str = "/api/images/upload";
const ALL_CATEGORIES: &str = "all";
const PATH_ROOT: &str = "http://localhost/";

/// An image picked for upload, already read into memory
#[derive(Debug, Clone, PartialEq)]
pub struct ImageFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Minimal JSON-over-HTTP surface the controller talks to.
/// Paths are relative to the API root and may carry a query string.
#[async_trait]
pub trait ApiClient: Send + Sync {
    async fn get(&self, path: &str) -> Result<Value, ApiError>;
    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError>;
    async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError>;
    async fn del(&self, path: &str) -> Result<Value, ApiError>;
    /// Sends `image` as the single multipart field `file`
    async fn upload(&self, path: &str, image: ImageFile) -> Result<Value, ApiError>;
}

/// `/api/news/category/{category|all}?...`
pub fn news_list_path(category: Option<Category>, params: &[(&str, String)]) -> String {
    let segment = category.map(|c| c.as_str()).unwrap_or(ALL_CATEGORIES);
    let mut query = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        query.append_pair(key, value);
    }
    let query = query.finish();

    if query.is_empty() {
        format!("{}/category/{}", NEWS_PATH, segment)
    } else {
        format!("{}/category/{}?{}", NEWS_PATH, segment, query)
    }
}

/// `/api/news/{id}` with the id escaped as a single path segment
pub fn news_item_path(id: &NewsId) -> String {
    let id = id.to_string();
    let mut url = match url::Url::parse(PATH_ROOT) {
        Ok(url) => url,
        Err(_) => return format!("{}/{}", NEWS_PATH, id),
    };
    if let Ok(mut segments) = url.path_segments_mut() {
        segments.clear().extend(NEWS_PATH.split('/').filter(|s| !s.is_empty())).push(&id);
    }
    url.path().to_string()
}

/// `reqwest` backed client for the news API
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl HttpApiClient {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent("Newsdesk/0.1")
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        debug!(%method, path, "api request");
        let builder = self.client.request(method, format!("{}{}", self.base_url, path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder, lenient_text: bool) -> Result<Value, ApiError> {
        let response = builder.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: server_message(&bytes),
            });
        }

        // DELETE typically answers 204 with no body
        if bytes.iter().all(|b| b.is_ascii_whitespace()) {
            return Ok(Value::Null);
        }

        match serde_json::from_slice(&bytes) {
            Ok(value) => Ok(value),
            Err(_) if lenient_text => Ok(Value::String(
                String::from_utf8_lossy(&bytes).trim().to_string(),
            )),
            Err(err) => Err(err.into()),
        }
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.send(self.request(Method::GET, path), false).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(self.request(Method::POST, path).json(body), false).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.send(self.request(Method::PUT, path).json(body), false).await
    }

    async fn del(&self, path: &str) -> Result<Value, ApiError> {
        self.send(self.request(Method::DELETE, path), false).await
    }

    async fn upload(&self, path: &str, image: ImageFile) -> Result<Value, ApiError> {
        let part = reqwest::multipart::Part::bytes(image.bytes)
            .file_name(image.filename)
            .mime_str(&image.mime_type)?;
        let form = reqwest::multipart::Form::new().part("file", part);

        // Some upload endpoints answer with the URL as plain text
        self.send(self.request(Method::POST, path).multipart(form), true).await
    }
}

/// Pulls `message` (or `error`) out of a JSON error body
fn server_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    ["message", "error"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .filter(|m| !m.trim().is_empty())
        .map(String::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_path_falls_back_to_all() {
        let path = news_list_path(None, &[("page", "0".to_string()), ("size", "10".to_string())]);
        assert_eq!(path, "/api/news/category/all?page=0&size=10");
    }

    #[test]
    fn test_list_path_encodes_search() {
        let path = news_list_path(
            Some(Category::Tech),
            &[("search", "Tech launch".to_string()), ("page", "2".to_string())],
        );
        assert_eq!(path, "/api/news/category/tech?search=Tech+launch&page=2");
    }

    #[test]
    fn test_item_path() {
        assert_eq!(news_item_path(&NewsId::Number(5)), "/api/news/5");
        assert_eq!(news_item_path(&NewsId::from("a b")), "/api/news/a%20b");
        assert_eq!(news_item_path(&NewsId::from("x/y+z")), "/api/news/x%2Fy+z");
    }

    #[test]
    fn test_server_message_extraction() {
        assert_eq!(
            server_message(br#"{"message":"Title already exists"}"#).as_deref(),
            Some("Title already exists")
        );
        assert_eq!(server_message(br#"{"error":"Not Found"}"#).as_deref(), Some("Not Found"));
        assert_eq!(server_message(b"<html>oops</html>"), None);
        assert_eq!(server_message(br#"{"message":""}"#), None);
    }
}
