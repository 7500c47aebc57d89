// src/orm/page.rs

//! Wiki page entity.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::NaiveDateTime;
use regex::Regex;

use super::cache::{self, Field, PropertyCache};
use super::thread::ForumThread;
use super::Wiki;
use crate::error::{AppError, Result};
use crate::models::{DELETED_ACCOUNT, OverrideKind, PageFile, Revision, Vote};
use crate::wikidot::parse;

const WORD: &str = r"[\w'█_-]+";

/// Role of a credited user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Original,
    Rewrite,
}

/// A user credited for a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credit {
    pub user: String,
    pub role: Role,
}

/// Handle to one page. Properties load on first access.
#[derive(Debug, Clone)]
pub struct Page {
    url: String,
    wiki: Wiki,
    cache: Arc<PropertyCache>,
}

impl PartialEq for Page {
    fn eq(&self, other: &Self) -> bool {
        self.url == other.url
    }
}

impl Eq for Page {}

impl Page {
    pub(crate) fn new(wiki: Wiki, url: String) -> Self {
        Self {
            url,
            wiki,
            cache: Arc::new(PropertyCache::new()),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn wiki(&self) -> &Wiki {
        &self.wiki
    }

    /// Rendered `#main-content` HTML.
    pub async fn markup(&self) -> Result<Arc<String>> {
        self.cache
            .get_or_fetch(Field::Markup, || self.wiki.source().markup(&self.url))
            .await
    }

    pub async fn id(&self) -> Result<i64> {
        let id = self
            .cache
            .get_or_fetch(Field::Id, || async {
                let markup = self.markup().await?;
                self.wiki.source().page_id(&self.url, &markup).await
            })
            .await?;
        Ok(*id)
    }

    pub async fn thread_id(&self) -> Result<Option<i64>> {
        let thread_id = self
            .cache
            .get_or_fetch(Field::ThreadId, || async {
                let id = self.id().await?;
                let markup = self.markup().await?;
                self.wiki.source().thread_id(id, &markup).await
            })
            .await?;
        Ok(*thread_id)
    }

    /// Wiki source text.
    pub async fn source(&self) -> Result<Arc<String>> {
        self.cache
            .get_or_fetch(Field::Source, || async {
                let id = self.id().await?;
                self.wiki.source().source_text(id).await
            })
            .await
    }

    /// Revisions, oldest first.
    pub async fn history(&self) -> Result<Arc<Vec<Revision>>> {
        self.cache
            .get_or_fetch(Field::History, || async {
                let id = self.id().await?;
                self.wiki.source().history(id).await
            })
            .await
    }

    pub async fn votes(&self) -> Result<Arc<Vec<Vote>>> {
        self.cache
            .get_or_fetch(Field::Votes, || async {
                let id = self.id().await?;
                self.wiki.source().votes(id).await
            })
            .await
    }

    pub async fn tags(&self) -> Result<Arc<BTreeSet<String>>> {
        self.cache
            .get_or_fetch(Field::Tags, || async {
                let id = self.id().await?;
                let markup = self.markup().await?;
                self.wiki.source().tags(id, &markup).await
            })
            .await
    }

    /// Files attached to the page.
    pub async fn files(&self) -> Result<Arc<Vec<PageFile>>> {
        self.cache
            .get_or_fetch(Field::Files, || async {
                let id = self.id().await?;
                self.wiki.source().files(id).await
            })
            .await
    }

    /// Title as shown on the page.
    pub async fn raw_title(&self) -> Result<String> {
        parse::raw_title(&self.markup().await?)
    }

    /// Title with the series index entry appended, e.g. `SCP-173: The Sculpture`.
    pub async fn title(&self) -> Result<String> {
        let raw = self.raw_title().await?;
        let titles = self.wiki.titles().await?;
        Ok(match titles.get(&self.url) {
            Some(indexed) => format!("{raw}: {indexed}"),
            None => raw,
        })
    }

    /// Time of revision 0.
    pub async fn created(&self) -> Result<NaiveDateTime> {
        let history = self.history().await?;
        history
            .first()
            .map(|revision| revision.time)
            .ok_or_else(|| AppError::not_found(format!("history of {}", self.url)))
    }

    /// Credited users: the original author first, then rewrites.
    ///
    /// An author override replaces the revision-0 user.
    pub async fn authors(&self) -> Result<Vec<Credit>> {
        let overrides = self.wiki.overrides().await?;
        let mine: Vec<_> = overrides.iter().filter(|o| o.url == self.url).collect();

        let original = match mine.iter().find(|o| o.kind == OverrideKind::Author) {
            Some(item) => Some(item.user.clone()),
            None => self.history().await?.first().map(|r| r.user.clone()),
        };

        let mut credits: Vec<Credit> = original
            .into_iter()
            .map(|user| Credit {
                user,
                role: Role::Original,
            })
            .collect();
        credits.extend(
            mine.iter()
                .filter(|o| o.kind == OverrideKind::Rewrite)
                .map(|o| Credit {
                    user: o.user.clone(),
                    role: Role::Rewrite,
                }),
        );
        Ok(credits)
    }

    /// The most recent rewrite author, else the original author.
    pub async fn author(&self) -> Result<Option<String>> {
        let credits = self.authors().await?;
        Ok(credits
            .iter()
            .rev()
            .find(|c| c.role == Role::Rewrite)
            .or_else(|| credits.first())
            .map(|c| c.user.clone()))
    }

    /// Sum of vote values, ignoring votes of deleted accounts.
    pub async fn rating(&self) -> Result<i64> {
        let votes = self.votes().await?;
        Ok(votes
            .iter()
            .filter(|v| v.user != DELETED_ACCOUNT)
            .map(|v| i64::from(v.value))
            .sum())
    }

    /// Pages linked from the content.
    pub async fn links(&self) -> Result<Vec<String>> {
        parse::links(&self.markup().await?, self.wiki.site())
    }

    /// Plain text of the content.
    pub async fn text(&self) -> Result<String> {
        parse::page_text(&self.markup().await?)
    }

    pub async fn wordcount(&self) -> Result<usize> {
        let word = Regex::new(WORD).map_err(|e| AppError::validation(e.to_string()))?;
        Ok(word.find_iter(&self.text().await?).count())
    }

    /// Image sources shown on the page.
    pub async fn images(&self) -> Result<Vec<String>> {
        parse::image_sources(&self.markup().await?)
    }

    /// Parent page from the breadcrumbs.
    pub async fn parent(&self) -> Result<Option<String>> {
        parse::parent(&self.markup().await?, self.wiki.site())
    }

    /// Discussion thread, if the page has one.
    pub async fn thread(&self) -> Result<Option<ForumThread>> {
        Ok(self.thread_id().await?.map(|id| self.wiki.thread(id)))
    }

    /// Posts of the discussion thread, empty without one.
    pub async fn comments(&self) -> Result<Vec<crate::models::Post>> {
        match self.thread().await? {
            Some(thread) => Ok(thread.posts().await?.to_vec()),
            None => Ok(Vec::new()),
        }
    }

    /// Replace the source text. The current title is kept when `title` is None.
    pub async fn edit(&self, source: &str, title: Option<&str>, comment: &str) -> Result<()> {
        let id = self.id().await?;
        let title = match title {
            Some(title) => title.to_string(),
            None => self.raw_title().await?,
        };
        self.wiki
            .source()
            .edit(id, &self.url, source, &title, comment)
            .await?;
        self.cache.invalidate(cache::EDIT);
        Ok(())
    }

    /// Revert to revision `number`.
    pub async fn revert(&self, number: u32) -> Result<()> {
        let id = self.id().await?;
        let history = self.history().await?;
        let revision = history
            .iter()
            .find(|r| r.number == number)
            .ok_or_else(|| AppError::not_found(format!("revision {number} of {}", self.url)))?;
        self.wiki.source().revert(id, revision.id).await?;
        self.cache.invalidate(cache::REVERT);
        Ok(())
    }

    pub async fn set_tags(&self, tags: &BTreeSet<String>) -> Result<()> {
        let id = self.id().await?;
        self.wiki.source().set_tags(id, tags).await?;
        self.cache.invalidate(cache::SET_TAGS);
        Ok(())
    }

    pub async fn upvote(&self) -> Result<()> {
        self.vote(1).await
    }

    pub async fn downvote(&self) -> Result<()> {
        self.vote(-1).await
    }

    pub async fn cancel_vote(&self) -> Result<()> {
        self.vote(0).await
    }

    async fn vote(&self, value: i32) -> Result<()> {
        let id = self.id().await?;
        self.wiki.source().vote(id, value).await?;
        self.cache.invalidate(cache::VOTE);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use crate::models::Override;
    use crate::orm::stub::{SITE, StubSource, post, revision};

    const MARKUP: &str = r#"<div id="main-content">
        <div id="breadcrumbs"><a href="/">Main</a> &raquo; <a href="/scp-series">Series</a></div>
        <div id="page-title">SCP-173</div>
        <div id="page-content">
            <p>Moved to Site-19 in 1993. Origin is as of yet unknown.</p>
            <img src="http://files.test/173.jpg" />
            <a href="/scp-172">prev</a> <a href="/scp-174|">next</a> <a href="/scp-172">again</a>
            <a href="/pic.png">image</a> <a href="http://other.site/x">external</a>
        </div>
        <div class="page-tags"><span><a href="/system:page-tags/tag/euclid">euclid</a><a href="/system:page-tags/tag/scp">scp</a></span></div>
    </div>"#;

    fn vote(user: &str, value: i32) -> Vote {
        Vote {
            user: user.to_string(),
            value,
        }
    }

    fn stub() -> StubSource {
        StubSource {
            markup: MARKUP.to_string(),
            history: vec![revision(0, "Moto42"), revision(1, "Dr Gears")],
            votes: vec![vote("a", 1), vote("b", 1), vote("c", -1), vote(DELETED_ACCOUNT, 1)],
            ..StubSource::default()
        }
    }

    fn page(source: StubSource) -> (Arc<StubSource>, Page) {
        let source = Arc::new(source);
        let page = Wiki::new(source.clone()).page("scp-173");
        (source, page)
    }

    #[tokio::test]
    async fn test_properties_fetch_once() {
        let (source, page) = page(stub());
        page.tags().await.unwrap();
        page.history().await.unwrap();
        page.links().await.unwrap();
        page.history().await.unwrap();
        assert_eq!(source.count("markup"), 1);
        assert_eq!(source.count("page_id"), 1);
        assert_eq!(source.count("history"), 1);
        assert_eq!(source.count("tags"), 1);
    }

    #[tokio::test]
    async fn test_rating_ignores_deleted_accounts() {
        let (_, page) = page(stub());
        assert_eq!(page.rating().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_derived_properties() {
        let (_, page) = page(stub());
        assert_eq!(page.id().await.unwrap(), 42);
        assert_eq!(page.thread_id().await.unwrap(), Some(7));
        assert_eq!(
            page.links().await.unwrap(),
            vec![format!("{SITE}/scp-172"), format!("{SITE}/scp-174")]
        );
        assert_eq!(page.parent().await.unwrap(), Some(format!("{SITE}/scp-series")));
        assert_eq!(page.images().await.unwrap(), vec!["http://files.test/173.jpg"]);
        assert_eq!(
            page.created().await.unwrap(),
            revision(0, "Moto42").time
        );
        assert!(page.wordcount().await.unwrap() >= 10);
        let tags: Vec<_> = page.tags().await.unwrap().iter().cloned().collect();
        assert_eq!(tags, vec!["euclid", "scp"]);
    }

    #[tokio::test]
    async fn test_title_uses_index() {
        let mut titles = HashMap::new();
        titles.insert(format!("{SITE}/scp-173"), "The Sculpture".to_string());
        let (_, page) = page(StubSource { titles, ..stub() });
        assert_eq!(page.title().await.unwrap(), "SCP-173: The Sculpture");

        let (_, plain) = self::page(stub());
        assert_eq!(plain.title().await.unwrap(), "SCP-173");
    }

    #[tokio::test]
    async fn test_author_from_history() {
        let (_, page) = page(stub());
        assert_eq!(page.author().await.unwrap().as_deref(), Some("Moto42"));
        assert_eq!(
            page.authors().await.unwrap(),
            vec![Credit {
                user: "Moto42".into(),
                role: Role::Original
            }]
        );
    }

    #[tokio::test]
    async fn test_author_overrides() {
        let url = format!("{SITE}/scp-173");
        let overrides = vec![
            Override {
                url: url.clone(),
                user: "Someone Else".into(),
                kind: OverrideKind::Author,
            },
            Override {
                url: url.clone(),
                user: "Rewriter".into(),
                kind: OverrideKind::Rewrite,
            },
            Override {
                url: format!("{SITE}/scp-999"),
                user: "Unrelated".into(),
                kind: OverrideKind::Author,
            },
        ];
        let (source, page) = page(StubSource { overrides, ..stub() });
        let authors = page.authors().await.unwrap();
        assert_eq!(
            authors,
            vec![
                Credit {
                    user: "Someone Else".into(),
                    role: Role::Original
                },
                Credit {
                    user: "Rewriter".into(),
                    role: Role::Rewrite
                },
            ]
        );
        assert_eq!(page.author().await.unwrap().as_deref(), Some("Rewriter"));
        assert_eq!(source.count("history"), 0);
    }

    #[tokio::test]
    async fn test_edit_invalidates_markup_not_votes() {
        let (source, page) = page(stub());
        page.votes().await.unwrap();
        page.history().await.unwrap();
        page.edit("new text", None, "fix").await.unwrap();
        page.markup().await.unwrap();
        page.votes().await.unwrap();
        page.history().await.unwrap();
        assert_eq!(source.count("edit"), 1);
        assert_eq!(source.count("votes"), 1);
        assert_eq!(source.count("history"), 2);
        assert_eq!(source.count("markup"), 2);
    }

    #[tokio::test]
    async fn test_vote_invalidates_votes_only() {
        let (source, page) = page(stub());
        page.votes().await.unwrap();
        page.tags().await.unwrap();
        page.upvote().await.unwrap();
        page.cancel_vote().await.unwrap();
        page.votes().await.unwrap();
        page.tags().await.unwrap();
        assert_eq!(source.count("vote"), 2);
        assert_eq!(source.count("votes"), 2);
        assert_eq!(source.count("tags"), 1);
    }

    #[tokio::test]
    async fn test_set_tags_and_revert() {
        let (source, page) = page(stub());
        page.tags().await.unwrap();
        page.set_tags(&BTreeSet::from(["keter".to_string()])).await.unwrap();
        page.tags().await.unwrap();
        assert_eq!(source.count("tags"), 2);

        page.revert(1).await.unwrap();
        assert_eq!(source.count("revert"), 1);
        assert!(page.revert(9).await.is_err());
    }

    #[tokio::test]
    async fn test_comments_follow_thread() {
        let posts = vec![post(2, 5, Some(1)), post(1, 1, None)];
        let (_, page) = page(StubSource { posts, ..stub() });
        let ids: Vec<i64> = page.comments().await.unwrap().iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
    }

    #[tokio::test]
    async fn test_files_load_once() {
        let files = vec![PageFile {
            url: format!("{SITE}/local--files/scp-173/173.jpg"),
            name: "173.jpg".into(),
            filetype: "JPG image".into(),
            size: "25 kB".into(),
        }];
        let (source, page) = page(StubSource { files: files.clone(), ..stub() });
        assert_eq!(*page.files().await.unwrap(), files);
        page.upvote().await.unwrap();
        page.files().await.unwrap();
        assert_eq!(source.count("files"), 1);
    }
}
