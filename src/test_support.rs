//! Scripted [`ApiClient`] shared by the unit tests.

use crate::api::{ApiClient, ImageFile};
use crate::error::ApiError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use tokio::sync::oneshot;

pub type Reply = Result<Value, ApiError>;

/// Scripted API: replies are queued per "METHOD path", gates let a test
/// decide when a particular request completes.
#[derive(Default)]
pub struct MockApi {
    pub calls: Mutex<Vec<String>>,
    pub bodies: Mutex<Vec<Value>>,
    pub uploads: Mutex<Vec<ImageFile>>,
    pub replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    pub gates: Mutex<HashMap<String, oneshot::Receiver<Reply>>>,
}

impl MockApi {
    pub fn reply(&self, method: &str, path: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .entry(format!("{} {}", method, path))
            .or_default()
            .push_back(reply);
    }

    pub fn gate(&self, method: &str, path: &str) -> oneshot::Sender<Reply> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(format!("{} {}", method, path), rx);
        tx
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub async fn answer(&self, method: &str, path: &str) -> Reply {
        let key = format!("{} {}", method, path);
        self.calls.lock().unwrap().push(key.clone());

        let gate = self.gates.lock().unwrap().remove(&key);
        if let Some(rx) = gate {
            return rx
                .await
                .unwrap_or_else(|_| Err(ApiError::Malformed("gate dropped".to_string())));
        }

        self.replies
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front)
            .unwrap_or(Err(ApiError::Status { status: 404, message: None }))
    }
}

#[async_trait]
impl ApiClient for MockApi {
    async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.answer("GET", path).await
    }

    async fn post(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.bodies.lock().unwrap().push(body.clone());
        self.answer("POST", path).await
    }

    async fn put(&self, path: &str, body: &Value) -> Result<Value, ApiError> {
        self.bodies.lock().unwrap().push(body.clone());
        self.answer("PUT", path).await
    }

    async fn del(&self, path: &str) -> Result<Value, ApiError> {
        self.answer("DELETE", path).await
    }

    async fn upload(&self, path: &str, image: ImageFile) -> Result<Value, ApiError> {
        self.uploads.lock().unwrap().push(image);
        self.answer("UPLOAD", path).await
    }
}

pub fn record(id: i64, title: &str) -> Value {
    json!({
        "id": id,
        "titleEnglish": title,
        "titleArabic": "خبر",
        "descriptionEnglish": "<p>Body text</p>",
        "descriptionArabic": "<p>نص</p>",
        "category": "tech",
        "date": "2024-05-01",
        "image": "https://cdn.test/news.png",
    })
}

pub fn page_of(ids: std::ops::Range<i64>, total: u64) -> Value {
    let content: Vec<Value> = ids.map(|id| record(id, &format!("News {}", id))).collect();
    json!({ "content": content, "totalElements": total })
}

