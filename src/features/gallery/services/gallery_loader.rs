use std::sync::{Arc, Mutex, MutexGuard};

use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use validator::Validate;

use crate::core::error::{AppError, Result};
use crate::features::gallery::models::{
    header_for, GalleryQuery, GalleryView, OwnerFilter, SortOrder,
};
use crate::modules::http::{ApiRequest, RequestClient};
use crate::modules::notify::{Notifier, Severity};
use crate::shared::constants::{IMAGES_PATH, UNKNOWN_ERROR_MESSAGE};
use crate::shared::types::ImagePage;

/// How a single load resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The response was current and is now visible
    Applied,
    /// A newer query was issued first; the response was dropped
    Stale,
    /// The current query failed; prior content stays visible
    Failed(String),
}

struct LoaderState {
    /// Generation of the most recently issued query
    latest: u64,
    query: GalleryQuery,
}

struct LoaderInner {
    client: Arc<dyn RequestClient>,
    notifier: Arc<dyn Notifier>,
    base_header: String,
    state: Mutex<LoaderState>,
    view: watch::Sender<GalleryView>,
}

/// Gallery listing fetcher with a last-issued-wins guard.
///
/// Any number of loads may be in flight. Each is stamped with a generation
/// when issued and only the one matching the latest generation at resolution
/// time may touch the view.
#[derive(Clone)]
pub struct GalleryLoader {
    inner: Arc<LoaderInner>,
}

impl GalleryLoader {
    pub fn new(
        client: Arc<dyn RequestClient>,
        notifier: Arc<dyn Notifier>,
        base_header: impl Into<String>,
    ) -> Self {
        let base_header = base_header.into();
        let (view, _) = watch::channel(GalleryView::new(base_header.clone()));

        Self {
            inner: Arc::new(LoaderInner {
                client,
                notifier,
                base_header,
                state: Mutex::new(LoaderState {
                    latest: 0,
                    query: GalleryQuery::default(),
                }),
                view,
            }),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<GalleryView> {
        self.inner.view.subscribe()
    }

    pub fn view(&self) -> GalleryView {
        self.inner.view.borrow().clone()
    }

    /// The last issued query, whether or not it has resolved
    pub fn current_query(&self) -> GalleryQuery {
        self.lock_state().query.clone()
    }

    pub fn load(&self, mut query: GalleryQuery) -> JoinHandle<LoadOutcome> {
        if let Err(e) = query.validate() {
            tracing::warn!("{}, loading page 1 instead", AppError::from(e));
            query.page = 1;
        }

        let generation = self.issue(&query);
        let loader = self.clone();
        tokio::spawn(async move { loader.fetch(generation, query).await })
    }

    /// Re-issue the last query as is
    pub fn reload(&self) -> JoinHandle<LoadOutcome> {
        self.load(self.current_query())
    }

    pub fn go_to_page(&self, page: u32) -> JoinHandle<LoadOutcome> {
        self.load(self.current_query().with_page(page.max(1)))
    }

    /// None when the visible page is the last known one
    pub fn next_page(&self) -> Option<JoinHandle<LoadOutcome>> {
        let page = {
            let view = self.inner.view.borrow();
            if !view.has_next_page() {
                return None;
            }
            view.current_page + 1
        };
        Some(self.load(self.current_query().with_page(page)))
    }

    /// None when the visible page is the first
    pub fn prev_page(&self) -> Option<JoinHandle<LoadOutcome>> {
        let page = {
            let view = self.inner.view.borrow();
            if !view.has_prev_page() {
                return None;
            }
            view.current_page - 1
        };
        Some(self.load(self.current_query().with_page(page)))
    }

    pub fn set_sort(&self, sort: SortOrder) -> JoinHandle<LoadOutcome> {
        self.load(self.current_query().with_sort(sort).with_page(1))
    }

    pub fn set_owner_filter(&self, filter: OwnerFilter) -> JoinHandle<LoadOutcome> {
        self.load(
            self.current_query()
                .with_owner_filter(Some(filter))
                .with_page(1),
        )
    }

    pub fn clear_owner_filter(&self) -> JoinHandle<LoadOutcome> {
        self.load(self.current_query().with_owner_filter(None).with_page(1))
    }

    /// Delete one image, then refresh the current page
    pub async fn delete_image(&self, id: i64) -> Result<()> {
        let request = ApiRequest::delete(format!("{}/{}", IMAGES_PATH, id));
        let result = match self.inner.client.send(request, None).await {
            Ok(response) => response
                .into_result::<Value>(UNKNOWN_ERROR_MESSAGE)
                .map(|_| ()),
            Err(e) => Err(AppError::from(e)),
        };

        match result {
            Ok(()) => {
                tracing::info!("Deleted image {}", id);
                self.inner.notifier.notify("Deleted", Severity::Success);
                drop(self.reload());
                Ok(())
            }
            Err(e) => {
                tracing::error!("Failed to delete image {}: {}", id, e);
                self.inner
                    .notifier
                    .notify(&e.user_message(), Severity::Error);
                Err(e)
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, LoaderState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stamp `query` as the latest and show the loading state
    fn issue(&self, query: &GalleryQuery) -> u64 {
        let mut state = self.lock_state();
        state.latest += 1;
        state.query = query.clone();

        let header = header_for(&self.inner.base_header, query.owner_filter.as_ref());
        self.inner.view.send_modify(|view| {
            view.loading = true;
            view.header = header;
        });

        state.latest
    }

    async fn fetch(&self, generation: u64, query: GalleryQuery) -> LoadOutcome {
        tracing::debug!(
            "Loading gallery page {} sorted {} (generation {})",
            query.page,
            query.sort,
            generation
        );

        let result = match self.inner.client.send(query.to_request(), None).await {
            Ok(response) => response.into_result::<ImagePage>(UNKNOWN_ERROR_MESSAGE),
            Err(e) => Err(AppError::from(e)),
        };

        let failure = {
            let state = self.lock_state();
            if state.latest != generation {
                tracing::debug!(
                    "Dropping gallery response for generation {}, latest is {}",
                    generation,
                    state.latest
                );
                return LoadOutcome::Stale;
            }

            match result {
                Ok(page) => {
                    tracing::debug!(
                        "Gallery page {}/{} applied ({} images)",
                        page.current_page,
                        page.pages,
                        page.images.len()
                    );
                    self.inner.view.send_modify(|view| view.apply_page(page));
                    None
                }
                Err(e) => {
                    tracing::error!("Gallery load failed: {}", e);
                    let message = e.user_message();
                    self.inner
                        .view
                        .send_modify(|view| view.apply_error(message.clone()));
                    Some(message)
                }
            }
        };

        match failure {
            None => LoadOutcome::Applied,
            Some(message) => {
                self.inner.notifier.notify(&message, Severity::Error);
                LoadOutcome::Failed(message)
            }
        }
    }
}
