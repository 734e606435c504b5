use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};
use crate::http::{self, HttpReply};
use crate::sequence::{RequestSequence, Ticket};

/// Chip label that stands for "no filter".
pub const ALL_FILTER: &str = "All";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListQuery {
    pub page: u32,
    pub limit: u32,
    pub filter: Option<String>,
}

impl ListQuery {
    pub fn new(limit: u32) -> Self {
        Self {
            page: 1,
            limit: limit.max(1),
            filter: None,
        }
    }

    pub fn with_page(mut self, page: u32) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn with_filter(mut self, filter: Option<&str>) -> Self {
        self.filter = normalize_filter(filter);
        self
    }

    /// Query-string pairs, filter first.
    pub fn params(&self, filter_key: &str) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(3);
        if let Some(f) = &self.filter {
            params.push((filter_key.to_string(), f.clone()));
        }
        params.push(("page".to_string(), self.page.to_string()));
        params.push(("limit".to_string(), self.limit.to_string()));
        params
    }
}

/// An empty string and the exact `All` chip mean "no filter". Anything else
/// is sent as given.
pub fn normalize_filter(filter: Option<&str>) -> Option<String> {
    filter
        .filter(|f| !f.is_empty() && *f != ALL_FILTER)
        .map(str::to_string)
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl<T> ListResult<T> {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Decode a listing reply of the shape
/// `{ success, data: [...], totalCount, totalPages, hasMore }`.
///
/// Only an explicit `success: true` counts as success. A non-array `data`
/// is an empty page; entries that do not decode are dropped.
pub fn parse_list_reply<T: DeserializeOwned>(
    reply: &HttpReply,
    query: &ListQuery,
) -> Result<ListResult<T>> {
    let value = reply.json_value();
    if !reply.is_success() || value.get("success") != Some(&Value::Bool(true)) {
        return Err(ClientError::server(reply.status, http::error_message(&value)));
    }

    let items: Vec<T> = match value.get("data") {
        Some(Value::Array(data)) => data
            .iter()
            .filter_map(|v| match T::deserialize(v) {
                Ok(item) => Some(item),
                Err(e) => {
                    log::warn!("skipping malformed list entry: {}", e);
                    None
                }
            })
            .collect(),
        Some(other) => {
            log::warn!("list data is not an array: {}", other);
            Vec::new()
        }
        None => Vec::new(),
    };

    let total_count = value
        .get("totalCount")
        .and_then(Value::as_u64)
        .unwrap_or(items.len() as u64);
    let total_pages = value
        .get("totalPages")
        .and_then(Value::as_u64)
        .unwrap_or(0);
    let has_more = value
        .get("hasMore")
        .and_then(Value::as_bool)
        .unwrap_or((query.page as u64) < total_pages);

    Ok(ListResult {
        items,
        total_count,
        total_pages,
        has_more,
    })
}

#[async_trait]
pub trait ListSource<T>: Send + Sync {
    async fn fetch(&self, query: &ListQuery) -> Result<ListResult<T>>;
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestState<T> {
    #[default]
    Idle,
    Loading,
    Success(ListResult<T>),
    Failure(String),
}

impl<T> RequestState<T> {
    pub fn is_loading(&self) -> bool {
        matches!(self, RequestState::Loading)
    }

    /// A successful fetch with no items. Not a failure.
    pub fn is_empty(&self) -> bool {
        matches!(self, RequestState::Success(r) if r.is_empty())
    }

    pub fn result(&self) -> Option<&ListResult<T>> {
        match self {
            RequestState::Success(r) => Some(r),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            RequestState::Failure(msg) => Some(msg),
            _ => None,
        }
    }
}

/// Holds the page/filter state of a list view and refetches whenever it
/// changes. A response for a superseded query never reaches the state.
pub struct ListLoader<T, S> {
    source: S,
    config: Arc<ClientConfig>,
    query: Mutex<ListQuery>,
    seq: RequestSequence,
    state: watch::Sender<RequestState<T>>,
    failure_message: String,
}

impl<T, S> ListLoader<T, S>
where
    T: Clone + Send + Sync,
    S: ListSource<T>,
{
    pub fn new(source: S, config: Arc<ClientConfig>) -> Self {
        let query = ListQuery::new(config.page_size);
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            source,
            config,
            query: Mutex::new(query),
            seq: RequestSequence::new(),
            state,
            failure_message: "Failed to load".to_string(),
        }
    }

    pub fn with_failure_message(mut self, message: &str) -> Self {
        self.failure_message = message.to_string();
        self
    }

    pub fn with_query(self, query: ListQuery) -> Self {
        *self.query.lock().unwrap_or_else(|e| e.into_inner()) = query;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        self.state.subscribe()
    }

    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    pub fn query(&self) -> ListQuery {
        self.query.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub async fn load(&self) -> RequestState<T> {
        self.run(|_| {}).await
    }

    /// Re-run the current query, e.g. after a failure.
    pub async fn refresh(&self) -> RequestState<T> {
        self.load().await
    }

    pub async fn set_filter(&self, filter: Option<&str>) -> RequestState<T> {
        let filter = normalize_filter(filter);
        self.run(move |q| {
            q.filter = filter;
            q.page = 1;
        })
        .await
    }

    pub async fn set_page(&self, page: u32) -> RequestState<T> {
        self.run(move |q| q.page = page.max(1)).await
    }

    /// `None` while the last result reports no further pages.
    pub async fn next_page(&self) -> Option<RequestState<T>> {
        let has_more = self.state.borrow().result().map(|r| r.has_more) == Some(true);
        if !has_more {
            return None;
        }
        let page = self.query().page.saturating_add(1);
        Some(self.set_page(page).await)
    }

    /// `None` on the first page.
    pub async fn previous_page(&self) -> Option<RequestState<T>> {
        let page = self.query().page;
        if page <= 1 {
            return None;
        }
        Some(self.set_page(page - 1).await)
    }

    pub fn can_go_previous(&self) -> bool {
        self.query().page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.state.borrow().result().map(|r| r.has_more) == Some(true)
    }

    async fn run<F>(&self, update: F) -> RequestState<T>
    where
        F: FnOnce(&mut ListQuery),
    {
        // Query change, ticket and Loading are published together so a late
        // publish from an older ticket cannot interleave.
        let mut issued: Option<(Ticket, ListQuery)> = None;
        self.state.send_modify(|state| {
            let mut query = self.query.lock().unwrap_or_else(|e| e.into_inner());
            update(&mut query);
            issued = Some((self.seq.issue(), query.clone()));
            *state = RequestState::Loading;
        });
        let Some((ticket, query)) = issued else {
            return self.state();
        };

        log::debug!("list request #{} {:?}", ticket.id(), query);
        let state = match ticket
            .run(self.config.request_timeout, self.source.fetch(&query))
            .await
        {
            Ok(result) => RequestState::Success(result),
            Err(ClientError::Cancelled) => {
                log::debug!("list request #{} superseded", ticket.id());
                return self.state();
            }
            Err(e) => {
                log::warn!("list request #{} failed: {}", ticket.id(), e);
                RequestState::Failure(e.user_message(&self.failure_message))
            }
        };

        let published = self.state.send_if_modified(|current| {
            if self.seq.is_current(&ticket) {
                *current = state;
                true
            } else {
                false
            }
        });
        if !published {
            log::debug!("dropping stale response for request #{}", ticket.id());
        }
        self.state()
    }
}
