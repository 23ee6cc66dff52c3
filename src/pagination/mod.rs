//! Cursor-based pagination.
//!
//! A [`Paginator`] drives a page-fetch function with a continuation token:
//!
//! 1. The first call carries the initial token (absent means "from start").
//! 2. Each page is handed to the caller before the next fetch is issued.
//! 3. The next call carries the token the previous page returned.
//! 4. The run stops when the token is absent or empty, after one page when
//!    auto-iteration is off, or when the service repeats the token it was
//!    just sent.
//!
//! Fetches are strictly sequential. Cancellation is observed before every
//! fetch and while a fetch is in flight, in which case the in-flight call is
//! dropped. Pages already handed out are never taken back.
//!
//! # Example
//!
//! ```rust
//! use aws_operations::pagination::{Page, Paginator, PagingOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn example() -> aws_operations::OperationResult<()> {
//! let pages = vec![(vec!["A", "B"], Some("t1")), (vec!["C"], None)];
//!
//! let mut paginator = Paginator::new(
//!     |token: Option<String>| {
//!         let index = if token.is_some() { 1 } else { 0 };
//!         let (items, next) = pages[index].clone();
//!         async move { Ok(Page::new(items, next.map(String::from))) }
//!     },
//!     PagingOptions::default(),
//!     CancellationToken::new(),
//! );
//!
//! let items: Vec<&str> = paginator.collect_all().await?.into_iter().flatten().collect();
//! assert_eq!(items, vec!["A", "B", "C"]);
//! # Ok(())
//! # }
//! ```

use std::future::Future;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{OperationError, OperationResult};

/// Call-scoped paging state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageState {
    /// Token to send with the next call.
    pub token: Option<String>,
    /// The caller asked for one page at a time.
    pub user_controls_paging: bool,
}

/// Caller paging preferences.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PagingOptions {
    /// Page-size hint sent to the service.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    /// Token to start from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
    /// Fetch all pages (true) or just one.
    #[serde(default = "default_auto_iterate")]
    pub auto_iterate: bool,
}

fn default_auto_iterate() -> bool {
    true
}

impl Default for PagingOptions {
    fn default() -> Self {
        Self {
            page_size: None,
            next_token: None,
            auto_iterate: true,
        }
    }
}

impl PagingOptions {
    /// Create default options (auto-iterate, no page size, from start).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the page-size hint.
    pub fn with_page_size(mut self, size: u32) -> Self {
        self.page_size = Some(size);
        self
    }

    /// Start from a continuation token.
    pub fn with_next_token(mut self, token: impl Into<String>) -> Self {
        self.next_token = Some(token.into());
        self
    }

    /// Fetch a single page.
    pub fn manual(mut self) -> Self {
        self.auto_iterate = false;
        self
    }

    /// Initial paging state for a run.
    pub fn initial_state(&self) -> PageState {
        PageState {
            token: normalize_token(self.next_token.clone()),
            user_controls_paging: !self.auto_iterate,
        }
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    /// Page payload.
    pub data: T,
    /// Continuation token returned with this page.
    pub next_token: Option<String>,
    /// 1-based position of this page in the run.
    pub number: usize,
}

impl<T> Page<T> {
    /// Creates a new page. The number is assigned by the paginator.
    pub fn new(data: T, next_token: Option<String>) -> Self {
        Self {
            data,
            next_token,
            number: 0,
        }
    }

    /// Returns true if there is a next page.
    pub fn has_next(&self) -> bool {
        self.next_token.is_some()
    }

    /// Maps the payload to a different type.
    pub fn map<U, F>(self, f: F) -> Page<U>
    where
        F: FnOnce(T) -> U,
    {
        Page {
            data: f(self.data),
            next_token: self.next_token,
            number: self.number,
        }
    }
}

/// Summary of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationOutcome {
    /// Pages fetched and handed out.
    pub pages: usize,
    /// Token a caller paging manually supplies next time.
    pub next_token: Option<String>,
}

/// Sequential page fetcher.
pub struct Paginator<T, F, Fut>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = OperationResult<Page<T>>>,
{
    fetch_fn: F,
    state: PageState,
    cancel: CancellationToken,
    pages_completed: usize,
    done: bool,
}

impl<T, F, Fut> Paginator<T, F, Fut>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = OperationResult<Page<T>>>,
{
    /// Creates a new paginator.
    pub fn new(fetch_fn: F, options: PagingOptions, cancel: CancellationToken) -> Self {
        Self {
            fetch_fn,
            state: options.initial_state(),
            cancel,
            pages_completed: 0,
            done: false,
        }
    }

    /// Fetches the next page, or `None` when the run is over.
    ///
    /// # Errors
    ///
    /// Returns the fetch error, or [`OperationError::Cancelled`] if the
    /// cancellation token fires before or during the fetch. Either way the
    /// run is over.
    pub async fn next_page(&mut self) -> OperationResult<Option<Page<T>>> {
        if self.done {
            return Ok(None);
        }

        if self.cancel.is_cancelled() {
            self.done = true;
            return Err(self.cancelled());
        }

        let sent = self.state.token.clone();
        debug!(
            page = self.pages_completed + 1,
            has_token = sent.is_some(),
            "Fetching page"
        );

        let fetch = (self.fetch_fn)(sent.clone());
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                self.done = true;
                return Err(self.cancelled());
            }
            result = fetch => result,
        };

        let mut page = match result {
            Ok(page) => page,
            Err(e) => {
                self.done = true;
                return Err(e);
            }
        };

        self.pages_completed += 1;
        page.number = self.pages_completed;
        page.next_token = normalize_token(page.next_token.take());

        match &page.next_token {
            None => {
                self.done = true;
                self.state.token = None;
            }
            Some(next) if sent.as_deref() == Some(next.as_str()) => {
                warn!(page = page.number, "Service returned the token it was sent, stopping");
                self.done = true;
                self.state.token = None;
                page.next_token = None;
            }
            Some(next) => {
                self.state.token = Some(next.clone());
                if self.state.user_controls_paging {
                    self.done = true;
                }
            }
        }

        Ok(Some(page))
    }

    /// Hands each page to `on_page` as it arrives.
    ///
    /// A callback error stops the run and is returned as-is.
    pub async fn for_each_page<C>(mut self, mut on_page: C) -> OperationResult<PaginationOutcome>
    where
        C: FnMut(Page<T>) -> OperationResult<()>,
    {
        while let Some(page) = self.next_page().await? {
            on_page(page)?;
        }
        Ok(self.outcome())
    }

    /// Collects the payloads of all remaining pages.
    pub async fn collect_all(&mut self) -> OperationResult<Vec<T>> {
        let mut all = Vec::new();
        while let Some(page) = self.next_page().await? {
            all.push(page.data);
        }
        Ok(all)
    }

    /// Returns true if there are more pages to fetch.
    pub fn has_next(&self) -> bool {
        !self.done
    }

    /// Pages fetched so far.
    pub fn pages_completed(&self) -> usize {
        self.pages_completed
    }

    /// Current paging state.
    pub fn state(&self) -> &PageState {
        &self.state
    }

    /// Summary of the run so far.
    pub fn outcome(&self) -> PaginationOutcome {
        PaginationOutcome {
            pages: self.pages_completed,
            next_token: self.state.token.clone(),
        }
    }

    fn cancelled(&self) -> OperationError {
        debug!(pages_completed = self.pages_completed, "Pagination cancelled");
        OperationError::Cancelled {
            pages_completed: self.pages_completed,
        }
    }
}

/// Empty tokens mean "no more pages".
pub fn normalize_token(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}
