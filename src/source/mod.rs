// src/source/mod.rs

//! Uniform access to wiki data, live or captured.
//!
//! [`Source`] is the capability set the entity model consumes. Two
//! implementations exist:
//! - [`LiveSource`]: every read is a request against the wiki
//! - [`LocalSource`]: reads are lookups in a captured store; mutations fail
//!   with [`AppError::BackendReadOnly`](crate::error::AppError::BackendReadOnly)
//!
//! Both return the same record shapes: history sorted by revision number,
//! votes de-duplicated per user, tags as a sorted set, posts sorted by time.

pub mod live;
pub mod local;

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{
    Category, Image, Override, PageFile, PageFilter, Post, Revision, ThreadInfo, Vote,
};

pub use live::LiveSource;
pub use local::LocalSource;

/// Sort posts into display order.
pub(crate) fn sort_posts(posts: &mut [Post]) {
    posts.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));
}

/// Read and write surface of one wiki.
#[async_trait]
pub trait Source: Send + Sync {
    /// Base URL of the wiki, e.g. `http://www.scp-wiki.net`.
    fn site(&self) -> &str;

    /// Numeric id of the page at `url`.
    async fn page_id(&self, url: &str, markup: &str) -> Result<i64>;

    /// Discussion thread of a page, if it has one.
    async fn thread_id(&self, page_id: i64, markup: &str) -> Result<Option<i64>>;

    /// Rendered `#main-content` HTML of a page.
    async fn markup(&self, url: &str) -> Result<String>;

    /// Wiki source text of a page.
    async fn source_text(&self, page_id: i64) -> Result<String>;

    /// Revisions, oldest first.
    async fn history(&self, page_id: i64) -> Result<Vec<Revision>>;

    /// Current votes, one per user.
    async fn votes(&self, page_id: i64) -> Result<Vec<Vote>>;

    async fn tags(&self, page_id: i64, markup: &str) -> Result<BTreeSet<String>>;

    /// Files attached to a page.
    async fn files(&self, page_id: i64) -> Result<Vec<PageFile>>;

    /// Posts of a thread sorted by time.
    async fn posts(&self, thread_id: i64) -> Result<Vec<Post>>;

    /// URLs of the pages matching every criterion of `filter`.
    async fn list_pages(&self, filter: &PageFilter) -> Result<Vec<String>>;

    /// Forum categories.
    async fn categories(&self) -> Result<Vec<Category>>;

    /// Threads of a forum category.
    async fn threads(&self, category_id: i64) -> Result<Vec<ThreadInfo>>;

    /// Author and rewrite overrides.
    async fn overrides(&self) -> Result<Vec<Override>>;

    /// Licensed images with provenance; `data` is not loaded.
    async fn images(&self) -> Result<Vec<Image>>;

    /// Bytes of one image.
    async fn image_data(&self, url: &str) -> Result<Vec<u8>>;

    /// `url -> title` of numbered entries from the series index pages.
    async fn titles(&self) -> Result<HashMap<String, String>>;

    /// Replace the source text of a page.
    async fn edit(
        &self,
        page_id: i64,
        url: &str,
        source: &str,
        title: &str,
        comment: &str,
    ) -> Result<()>;

    /// Create the page at `url`.
    async fn create_page(
        &self,
        url: &str,
        source: &str,
        title: &str,
        comment: &str,
    ) -> Result<()>;

    /// Revert a page to an earlier revision.
    async fn revert(&self, page_id: i64, revision_id: i64) -> Result<()>;

    /// Replace the tags of a page.
    async fn set_tags(&self, page_id: i64, tags: &BTreeSet<String>) -> Result<()>;

    /// Cast `+1` or `-1`; `0` withdraws the current vote.
    async fn vote(&self, page_id: i64, value: i32) -> Result<()>;

    /// Post to a thread, as a reply to `parent` when given.
    async fn new_post(
        &self,
        thread_id: i64,
        source: &str,
        title: Option<&str>,
        parent: Option<i64>,
    ) -> Result<()>;
}
