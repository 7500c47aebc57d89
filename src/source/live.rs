// src/source/live.rs

//! Network-backed source.
//!
//! Page documents are fetched as plain GETs; everything else goes through
//! the ajax module connector. The numeric page id only appears in the full
//! document, outside `#main-content`, so ids seen while fetching markup are
//! remembered per URL.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::NaiveDateTime;
use rand::seq::SliceRandom;
use tokio::sync::RwLock;

use crate::error::{AppError, Result};
use crate::models::{
    Category, Config, Image, ImageReviewConfig, Order, Override, PageFile, PageFilter, Post,
    Revision, ThreadInfo, Vote, credited_urls, dedupe_votes, parse_time,
};
use crate::utils::http::Transport;
use crate::utils::{page_name, page_url};
use crate::wikidot::pager::page_number;
use crate::wikidot::{
    Connector, ModuleConnector, ModuleResponse, Params, WikiConnector, parse, walk,
};

use super::{Source, sort_posts};

const LIST_PAGES: &str = "list/ListPagesModule";
const PER_PAGE: usize = 250;

/// Fields requested from `ListPagesModule`, with optional format suffixes.
const LIST_FIELDS: [(&str, Option<&str>); 4] = [
    ("fullname", None),
    ("title", None),
    ("rating", None),
    ("created_at", Some("%Y-%m-%d %H:%M:%S")),
];

/// One row of a `ListPagesModule` answer.
#[derive(Debug, Clone)]
struct Listed {
    url: String,
    title: String,
    rating: i64,
    created: Option<NaiveDateTime>,
}

/// Source answering every read from the live wiki.
#[derive(Debug)]
pub struct LiveSource<C = Connector> {
    connector: C,
    ids: RwLock<HashMap<String, i64>>,
    attribution_page: String,
    image_review: ImageReviewConfig,
    title_index_pages: Vec<String>,
}

impl LiveSource {
    /// Create a live source for `config.site`.
    pub fn new(config: &Config) -> Result<Self> {
        let transport = Transport::new(&config.crawler)?;
        Ok(Self::with_transport(config, transport))
    }

    /// Create a live source over an existing transport.
    pub fn with_transport(config: &Config, transport: Transport) -> Self {
        let connector = Connector::new(
            config.site.clone(),
            transport,
            config.crawler.session_id.clone(),
        );
        Self::with_connector(config, connector)
    }

    /// Log in so that mutations are attributed to `username`.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        self.connector.login(username, password).await
    }
}

impl<C: WikiConnector> LiveSource<C> {
    /// Create a live source talking to the wiki through `connector`.
    pub fn with_connector(config: &Config, connector: C) -> Self {
        Self {
            connector,
            ids: RwLock::new(HashMap::new()),
            attribution_page: config.capture.attribution_page.clone(),
            image_review: config.capture.image_review.clone(),
            title_index_pages: config.capture.title_index_pages.clone(),
        }
    }

    async fn module(&self, name: &str, params: Params) -> Result<ModuleResponse> {
        self.connector.call(name, &params).await
    }

    /// `Empty` module call carrying a `WikiPageAction` event.
    async fn page_action(&self, page_id: i64, event: &str, params: Params) -> Result<()> {
        let form = params
            .with("page_id", page_id)
            .with("action", "WikiPageAction")
            .with("event", event);
        self.module("Empty", form).await?;
        Ok(())
    }

    /// Fetch a page document, remember its ids and return `#main-content`.
    async fn fetch_page(&self, url: &str) -> Result<String> {
        let document = self.connector.get_text(url).await?;
        let markup = parse::main_content(&document)?;
        match parse::page_id(&document) {
            Some(page_id) => {
                self.ids.write().await.insert(url.to_string(), page_id);
            }
            None => log::warn!("No page id in {url}"),
        }
        Ok(markup)
    }

    /// Walk `ListPagesModule` and parse every row.
    async fn listing(&self, filter: &PageFilter, created_by: Option<&str>) -> Result<Vec<Listed>> {
        let body = LIST_FIELDS
            .iter()
            .map(|(key, format)| match format {
                Some(format) => format!("||{key}||%%{key}|{format}%% ||"),
                None => format!("||{key}||%%{key}%% ||"),
            })
            .collect::<Vec<_>>()
            .join("\n");

        let mut params = Params::new()
            .with("category", "*")
            .with("perPage", PER_PAGE)
            .with("module_body", body);
        if let Some(tag) = &filter.tag {
            params.set("tags", tag);
        }
        if let Some(author) = created_by {
            params.set("created_by", author);
        }

        let pages = walk(&self.connector, LIST_PAGES, params, "offset", |idx| {
            (PER_PAGE * (idx - 1)).to_string()
        })
        .await?;

        let mut listed = Vec::new();
        for page in &pages {
            for item in parse::list_items(&page.body)? {
                let Some(name) = item.get("fullname") else {
                    continue;
                };
                listed.push(Listed {
                    url: page_url(self.site(), name),
                    title: item.get("title").cloned().unwrap_or_default(),
                    rating: item
                        .get("rating")
                        .and_then(|r| r.trim_start_matches('+').parse().ok())
                        .unwrap_or(0),
                    created: item.get("created_at").and_then(|t| parse_time(t)),
                });
            }
        }
        Ok(listed)
    }

    /// Take the edit lock and save. Without `page_id` the page is created.
    async fn save_page(
        &self,
        page_id: Option<i64>,
        url: &str,
        source: &str,
        title: &str,
        comment: &str,
    ) -> Result<()> {
        let wiki_page = page_name(url);
        let mut lock_params = Params::new()
            .with("mode", "page")
            .with("wiki_page", wiki_page)
            .with("force_lock", "yes");
        if let Some(page_id) = page_id {
            lock_params.set("page_id", page_id);
        }
        let lock = self.module("edit/PageEditModule", lock_params).await?;
        let lock_id = lock
            .field("lock_id")
            .ok_or_else(|| AppError::malformed("edit lock without lock_id"))?;
        let lock_secret = lock
            .field("lock_secret")
            .ok_or_else(|| AppError::malformed("edit lock without lock_secret"))?;

        let mut params = Params::new()
            .with("action", "WikiPageAction")
            .with("event", "savePage")
            .with("source", source)
            .with("title", title)
            .with("comments", comment)
            .with("wiki_page", wiki_page)
            .with("lock_id", lock_id)
            .with("lock_secret", lock_secret);
        if let Some(page_id) = page_id {
            params.set("page_id", page_id);
        }
        if let Some(revision_id) = lock.field("page_revision_id") {
            params.set("revision_id", revision_id);
        }
        self.module("Empty", params).await?;
        log::info!("Saved {url}");
        Ok(())
    }
}

#[async_trait]
impl<C: WikiConnector> Source for LiveSource<C> {
    fn site(&self) -> &str {
        self.connector.site()
    }

    async fn page_id(&self, url: &str, _markup: &str) -> Result<i64> {
        if let Some(page_id) = self.ids.read().await.get(url) {
            return Ok(*page_id);
        }
        self.fetch_page(url).await?;
        self.ids
            .read()
            .await
            .get(url)
            .copied()
            .ok_or_else(|| AppError::malformed(format!("no page id in {url}")))
    }

    async fn thread_id(&self, _page_id: i64, markup: &str) -> Result<Option<i64>> {
        parse::thread_id(markup)
    }

    async fn markup(&self, url: &str) -> Result<String> {
        self.fetch_page(url).await
    }

    async fn source_text(&self, page_id: i64) -> Result<String> {
        let response = self
            .module(
                "viewsource/ViewSourceModule",
                Params::new().with("page_id", page_id),
            )
            .await?;
        parse::source_text(&response.body)
    }

    async fn history(&self, page_id: i64) -> Result<Vec<Revision>> {
        let params = Params::new()
            .with("page_id", page_id)
            .with("page", 1)
            .with("perpage", 99999);
        let pages = walk(
            &self.connector,
            "history/PageRevisionListModule",
            params,
            "page",
            page_number,
        )
        .await?;

        let mut history = Vec::new();
        for page in &pages {
            history.extend(parse::history(&page.body)?);
        }
        history.sort_by_key(|revision| revision.number);
        history.dedup_by_key(|revision| revision.number);
        Ok(history)
    }

    async fn votes(&self, page_id: i64) -> Result<Vec<Vote>> {
        let pages = walk(
            &self.connector,
            "pagerate/WhoRatedPageModule",
            Params::new().with("page_id", page_id),
            "page",
            page_number,
        )
        .await?;

        let mut votes = Vec::new();
        for page in &pages {
            votes.extend(parse::votes(&page.body)?);
        }
        Ok(dedupe_votes(votes))
    }

    async fn tags(&self, _page_id: i64, markup: &str) -> Result<BTreeSet<String>> {
        parse::tags(markup)
    }

    async fn files(&self, page_id: i64) -> Result<Vec<PageFile>> {
        let response = self
            .module("files/PageFilesModule", Params::new().with("page_id", page_id))
            .await?;
        parse::files(&response.body, self.site())
    }

    async fn posts(&self, thread_id: i64) -> Result<Vec<Post>> {
        let params = Params::new().with("t", thread_id).with("pageNo", 1);
        let pages = walk(
            &self.connector,
            "forum/ForumViewThreadPostsModule",
            params,
            "pageNo",
            page_number,
        )
        .await?;

        let mut posts = Vec::new();
        for page in &pages {
            posts.extend(parse::posts(&page.body)?);
        }
        sort_posts(&mut posts);
        Ok(posts)
    }

    async fn list_pages(&self, filter: &PageFilter) -> Result<Vec<String>> {
        let credited = match &filter.author {
            Some(author) => {
                let authored = self
                    .listing(&PageFilter::default(), Some(author))
                    .await?
                    .into_iter()
                    .map(|page| page.url);
                let overrides = self.overrides().await?;
                Some(credited_urls(authored, &overrides, author))
            }
            None => None,
        };

        let mut urls: Vec<String> = match &credited {
            Some(credited) if !filter.has_non_author_criteria() && filter.order != Some(Order::Title) => {
                credited.iter().cloned().collect()
            }
            _ => {
                let mut listed: Vec<Listed> = self
                    .listing(filter, None)
                    .await?
                    .into_iter()
                    .filter(|page| filter.rating.as_ref().is_none_or(|r| r.matches(page.rating)))
                    .filter(|page| {
                        filter.created.as_ref().is_none_or(|c| {
                            page.created.as_ref().is_some_and(|created| c.matches(created))
                        })
                    })
                    .filter(|page| credited.as_ref().is_none_or(|set| set.contains(&page.url)))
                    .collect();
                if filter.order == Some(Order::Title) {
                    listed.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.url.cmp(&b.url)));
                }
                listed.into_iter().map(|page| page.url).collect()
            }
        };

        match filter.order {
            Some(Order::Title) => {}
            Some(Order::Random) => urls.shuffle(&mut rand::rng()),
            None => urls.sort(),
        }
        if let Some(limit) = filter.limit {
            urls.truncate(limit);
        }
        Ok(urls)
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        let response = self.module("forum/ForumStartModule", Params::new()).await?;
        parse::categories(&response.body)
    }

    async fn threads(&self, category_id: i64) -> Result<Vec<ThreadInfo>> {
        let params = Params::new().with("c", category_id);
        let pages = walk(
            &self.connector,
            "forum/ForumViewCategoryModule",
            params,
            "p",
            page_number,
        )
        .await?;

        let mut threads = Vec::new();
        for page in &pages {
            threads.extend(parse::threads(&page.body, category_id)?);
        }
        Ok(threads)
    }

    async fn overrides(&self) -> Result<Vec<Override>> {
        let url = page_url(self.site(), &self.attribution_page);
        let document = self.connector.get_text(&url).await?;
        parse::overrides(&parse::main_content(&document)?, self.site())
    }

    async fn images(&self) -> Result<Vec<Image>> {
        let mut images = Vec::new();
        for url in self.image_review.urls() {
            let document = self.connector.get_text(&url).await?;
            images.extend(parse::image_reviews(&document, &url)?);
        }
        Ok(images)
    }

    async fn image_data(&self, url: &str) -> Result<Vec<u8>> {
        self.connector.get_bytes(url).await
    }

    async fn titles(&self) -> Result<HashMap<String, String>> {
        let mut titles = HashMap::new();
        for name in &self.title_index_pages {
            let url = page_url(self.site(), name);
            match self.fetch_page(&url).await {
                Ok(markup) => titles.extend(parse::title_entries(&markup, self.site())?),
                Err(e) => log::warn!("Skipping title index {url}: {e}"),
            }
        }
        Ok(titles)
    }

    async fn edit(
        &self,
        page_id: i64,
        url: &str,
        source: &str,
        title: &str,
        comment: &str,
    ) -> Result<()> {
        self.save_page(Some(page_id), url, source, title, comment).await
    }

    async fn create_page(
        &self,
        url: &str,
        source: &str,
        title: &str,
        comment: &str,
    ) -> Result<()> {
        self.save_page(None, url, source, title, comment).await
    }

    async fn revert(&self, page_id: i64, revision_id: i64) -> Result<()> {
        self.page_action(page_id, "revert", Params::new().with("revisionId", revision_id))
            .await
    }

    async fn set_tags(&self, page_id: i64, tags: &BTreeSet<String>) -> Result<()> {
        let joined = tags.iter().cloned().collect::<Vec<_>>().join(" ");
        self.page_action(page_id, "saveTags", Params::new().with("tags", joined))
            .await
    }

    async fn vote(&self, page_id: i64, value: i32) -> Result<()> {
        let mut params = Params::new()
            .with("page_id", page_id)
            .with("action", "RateAction");
        if value == 0 {
            params.set("event", "cancelVote");
        } else {
            params.set("event", "ratePage");
            params.set("points", value.signum());
            params.set("force", "yes");
        }
        self.module("Empty", params).await?;
        Ok(())
    }

    async fn new_post(
        &self,
        thread_id: i64,
        source: &str,
        title: Option<&str>,
        parent: Option<i64>,
    ) -> Result<()> {
        let mut params = Params::new()
            .with("threadId", thread_id)
            .with("title", title.unwrap_or_default())
            .with("source", source)
            .with("action", "ForumAction")
            .with("event", "savePost");
        if let Some(parent) = parent {
            params.set("parentId", parent);
        }
        self.module("Empty", params).await?;
        Ok(())
    }
}
