// src/orm/mod.rs

//! Entity model over a [`Source`].
//!
//! [`Wiki`] hands out [`Page`] and [`ForumThread`] handles. Their
//! properties are fetched on first use and cached; mutating calls drop the
//! cached fields they can change. The entities never know whether their
//! source is live or captured.

pub mod cache;
pub mod page;
pub mod thread;

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::OnceCell;

use crate::error::Result;
use crate::models::{Category, Override, PageFilter};
use crate::source::Source;
use crate::utils::page_url;

pub use cache::{Field, PropertyCache};
pub use page::{Credit, Page, Role};
pub use thread::{ForumThread, ThreadEntry};

struct WikiInner {
    source: Arc<dyn Source>,
    titles: OnceCell<HashMap<String, String>>,
    overrides: OnceCell<Vec<Override>>,
}

/// A wiki seen through one source. Cheap to clone.
#[derive(Clone)]
pub struct Wiki {
    inner: Arc<WikiInner>,
}

impl std::fmt::Debug for Wiki {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wiki").field("site", &self.site()).finish()
    }
}

impl Wiki {
    pub fn new(source: Arc<dyn Source>) -> Self {
        Self {
            inner: Arc::new(WikiInner {
                source,
                titles: OnceCell::new(),
                overrides: OnceCell::new(),
            }),
        }
    }

    pub fn site(&self) -> &str {
        self.inner.source.site()
    }

    pub fn source(&self) -> &dyn Source {
        self.inner.source.as_ref()
    }

    /// Page by name or URL. `SCP 173`, `scp_173` and the full URL are the
    /// same page.
    pub fn page(&self, name: &str) -> Page {
        Page::new(self.clone(), page_url(self.site(), name))
    }

    /// Create a page and return its handle.
    pub async fn create(
        &self,
        name: &str,
        source: &str,
        title: &str,
        comment: &str,
    ) -> Result<Page> {
        let page = self.page(name);
        self.source()
            .create_page(page.url(), source, title, comment)
            .await?;
        Ok(page)
    }

    pub fn thread(&self, id: i64) -> ForumThread {
        ForumThread::new(self.clone(), id, None)
    }

    /// Pages matching `filter`.
    pub async fn list_pages(&self, filter: &PageFilter) -> Result<Vec<Page>> {
        let urls = self.source().list_pages(filter).await?;
        Ok(urls
            .into_iter()
            .map(|url| Page::new(self.clone(), url))
            .collect())
    }

    pub async fn categories(&self) -> Result<Vec<Category>> {
        self.source().categories().await
    }

    pub async fn threads(&self, category_id: i64) -> Result<Vec<ForumThread>> {
        let threads = self.source().threads(category_id).await?;
        Ok(threads
            .into_iter()
            .map(|info| ForumThread::new(self.clone(), info.id, Some(info)))
            .collect())
    }

    /// `url -> title` of numbered entries, loaded once.
    pub async fn titles(&self) -> Result<&HashMap<String, String>> {
        self.inner
            .titles
            .get_or_try_init(|| self.source().titles())
            .await
    }

    /// Author overrides, loaded once.
    pub async fn overrides(&self) -> Result<&[Override]> {
        let overrides = self
            .inner
            .overrides
            .get_or_try_init(|| self.source().overrides())
            .await?;
        Ok(overrides.as_slice())
    }
}
