use crate::api::{news_item_path, news_list_path, ApiClient, NEWS_PATH};
use crate::error::ApiError;
use crate::models::{Category, ListResponse, NewsId, NewsPayload, NewsRecord, Notification};
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{error, info, warn};

pub const PAGE_SIZE: u64 = 10;
const EXPORT_PAGE_SIZE: u64 = 10_000;

/// Search text plus optional category filter
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryFilters {
    pub search: String,
    pub category: Option<Category>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult {
    pub news: Vec<NewsRecord>,
    pub total_count: u64,
    pub page_count: u64,
}

impl Default for PageResult {
    fn default() -> Self {
        Self { news: Vec::new(), total_count: 0, page_count: 1 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadingFlags {
    pub news: bool,
    pub single: bool,
    pub delete: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingDeletion {
    pub target: Option<NewsId>,
    pub dialog_open: bool,
}

/// Everything the presentation layer reads from the controller
#[derive(Debug, Clone, Default)]
pub struct ControllerState {
    pub draft: QueryFilters,
    pub applied: QueryFilters,
    pub page: u64,
    pub result: PageResult,
    pub loading: LoadingFlags,
    pub single_news: Option<NewsRecord>,
    pub pending_deletion: PendingDeletion,
    pub notifications: VecDeque<Notification>,
}

/// Per-call overrides for [`NewsController::fetch_page`].
/// `None` falls back to the applied filters and the current page.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub search: Option<String>,
    pub category: Option<Option<Category>>,
    pub page: Option<u64>,
}

pub fn page_count(total: u64) -> u64 {
    total.div_ceil(PAGE_SIZE).max(1)
}

/// Owns list, filter, pagination and mutation state for the news collection.
///
/// Methods that fetch do their synchronous bookkeeping (including taking a
/// sequence ticket) at call time and return the network part as a future, so
/// the order requests are initiated in is the order they were called in.
/// Only the most recently initiated list fetch may write its result, so the
/// returned futures must be awaited: dropping the latest one leaves
/// `loading.news` set until another fetch completes.
pub struct NewsController<C> {
    client: C,
    state: Mutex<ControllerState>,
    fetch_seq: AtomicU64,
}

impl<C: ApiClient> NewsController<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            state: Mutex::new(ControllerState::default()),
            fetch_seq: AtomicU64::new(0),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, notification: Notification) {
        self.state().notifications.push_back(notification);
    }

    pub fn snapshot(&self) -> ControllerState {
        self.state().clone()
    }

    pub fn drain_notifications(&self) -> Vec<Notification> {
        self.state().notifications.drain(..).collect()
    }

    pub fn set_search(&self, search: impl Into<String>) {
        self.state().draft.search = search.into();
    }

    pub fn set_category(&self, category: Option<Category>) {
        self.state().draft.category = category;
    }

    #[must_use = "the fetch only runs when awaited"]
    pub fn fetch_page(&self, options: FetchOptions) -> impl Future<Output = ()> + '_ {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let path = {
            let mut state = self.state();
            state.loading.news = true;

            let search = options.search.unwrap_or_else(|| state.applied.search.clone());
            let category = options.category.unwrap_or(state.applied.category);
            let page = options.page.unwrap_or(state.page);

            let mut params = Vec::new();
            let search = search.trim();
            if !search.is_empty() {
                params.push(("search", search.to_string()));
            }
            params.push(("page", page.to_string()));
            params.push(("size", PAGE_SIZE.to_string()));
            news_list_path(category, &params)
        };

        async move {
            let outcome = match self.client.get(&path).await {
                Ok(Value::Null) => Ok(ListResponse::default()),
                Ok(value) => serde_json::from_value::<ListResponse>(value).map_err(ApiError::from),
                Err(err) => Err(err),
            };

            if self.fetch_seq.load(Ordering::SeqCst) != seq {
                warn!(seq, path = %path, "discarding superseded news page response");
                return;
            }

            let mut state = self.state();
            state.loading.news = false;
            match outcome {
                Ok(page) => {
                    state.result = PageResult {
                        page_count: page_count(page.total_elements),
                        total_count: page.total_elements,
                        news: page.content,
                    };
                }
                Err(err) => {
                    error!(error = %err, path = %path, "error fetching news");
                    state.result = PageResult::default();
                    state.notifications.push_back(Notification::error("Failed to fetch news."));
                }
            }
        }
    }

    /// Promotes the draft filters and reloads from the first page
    #[must_use = "the fetch only runs when awaited"]
    pub fn apply_filters(&self) -> impl Future<Output = ()> + '_ {
        let applied = {
            let mut state = self.state();
            state.applied = state.draft.clone();
            state.page = 0;
            state.applied.clone()
        };
        self.fetch_page(FetchOptions {
            search: Some(applied.search),
            category: Some(applied.category),
            page: Some(0),
        })
    }

    #[must_use = "the fetch only runs when awaited"]
    pub fn reset_filters(&self) -> impl Future<Output = ()> + '_ {
        {
            let mut state = self.state();
            state.draft = QueryFilters::default();
            state.applied = QueryFilters::default();
            state.page = 0;
        }
        self.fetch_page(FetchOptions {
            search: Some(String::new()),
            category: Some(None),
            page: Some(0),
        })
    }

    #[must_use = "the fetch only runs when awaited"]
    pub fn change_page(&self, page: u64) -> impl Future<Output = ()> + '_ {
        self.state().page = page;
        self.fetch_page(FetchOptions { page: Some(page), ..FetchOptions::default() })
    }

    /// Reloads the current page with the applied filters
    #[must_use = "the fetch only runs when awaited"]
    pub fn refresh(&self) -> impl Future<Output = ()> + '_ {
        self.fetch_page(FetchOptions::default())
    }

    pub fn request_deletion(&self, id: NewsId) {
        let mut state = self.state();
        state.pending_deletion = PendingDeletion { target: Some(id), dialog_open: true };
    }

    pub fn cancel_deletion(&self) {
        self.state().pending_deletion = PendingDeletion::default();
    }

    /// Deletes the pending target. Returns whether the record was removed.
    /// The caller decides whether to refresh the list afterwards.
    pub async fn confirm_deletion(&self) -> bool {
        let target = {
            let mut state = self.state();
            let Some(target) = state.pending_deletion.target.clone() else {
                return false;
            };
            state.loading.delete = true;
            target
        };

        let outcome = self.client.del(&news_item_path(&target)).await;

        let mut state = self.state();
        state.loading.delete = false;
        state.pending_deletion = PendingDeletion::default();
        match outcome {
            Ok(_) => {
                info!(id = %target, "news deleted");
                state.notifications.push_back(Notification::success("News deleted successfully."));
                true
            }
            Err(err) => {
                error!(id = %target, error = %err, "error deleting news");
                let message = err
                    .user_message()
                    .unwrap_or_else(|| "Failed to delete news. Please try again.".to_string());
                state.notifications.push_back(Notification::error(message));
                false
            }
        }
    }

    pub async fn fetch_record_by_id(&self, id: &NewsId) -> Option<NewsRecord> {
        self.state().loading.single = true;

        let outcome = match self.client.get(&news_item_path(id)).await {
            Ok(value) => serde_json::from_value::<NewsRecord>(value).map_err(ApiError::from),
            Err(err) => Err(err),
        };

        let mut state = self.state();
        state.loading.single = false;
        match outcome {
            Ok(record) => {
                state.single_news = Some(record.clone());
                Some(record)
            }
            Err(err) => {
                error!(%id, error = %err, "error fetching news by id");
                state
                    .notifications
                    .push_back(Notification::error("Failed to fetch news details."));
                None
            }
        }
    }

    pub async fn create_record(&self, payload: &NewsPayload) -> Result<Value, ApiError> {
        let body = serde_json::to_value(payload)?;
        match self.client.post(NEWS_PATH, &body).await {
            Ok(response) => {
                info!(title = %payload.title_english, "news created");
                self.notify(Notification::success("News created successfully."));
                Ok(response)
            }
            Err(err) => {
                error!(error = %err, "error creating news");
                self.notify(Notification::error(
                    err.user_message()
                        .unwrap_or_else(|| "Failed to create news. Please try again.".to_string()),
                ));
                Err(err)
            }
        }
    }

    pub async fn update_record(&self, id: &NewsId, payload: &NewsPayload) -> Result<Value, ApiError> {
        let body = serde_json::to_value(payload)?;
        match self.client.put(&news_item_path(id), &body).await {
            Ok(response) => {
                info!(%id, "news updated");
                self.notify(Notification::success("News updated successfully."));
                Ok(response)
            }
            Err(err) => {
                error!(%id, error = %err, "error updating news");
                self.notify(Notification::error(
                    err.user_message()
                        .unwrap_or_else(|| "Failed to update news. Please try again.".to_string()),
                ));
                Err(err)
            }
        }
    }

    /// Every record matching the applied filters, for export.
    /// Failures are logged and yield an empty list without notifying.
    pub async fn fetch_all_matching(&self) -> Vec<NewsRecord> {
        let path = {
            let state = self.state();
            let mut params = Vec::new();
            let search = state.applied.search.trim();
            if !search.is_empty() {
                params.push(("titleEnglish", search.to_string()));
            }
            params.push(("page", "0".to_string()));
            params.push(("size", EXPORT_PAGE_SIZE.to_string()));
            news_list_path(state.applied.category, &params)
        };

        match self.client.get(&path).await {
            Ok(Value::Null) => Vec::new(),
            Ok(value) => match serde_json::from_value::<ListResponse>(value) {
                Ok(page) => page.content,
                Err(err) => {
                    error!(error = %err, "unexpected export response");
                    Vec::new()
                }
            },
            Err(err) => {
                error!(error = %err, "error fetching all news for export");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
