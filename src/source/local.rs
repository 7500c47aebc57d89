// src/source/local.rs

//! Source backed by a captured store.

use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use async_trait::async_trait;
use rand::seq::SliceRandom;
use sqlx::sqlite::{SqlitePool, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite};

use crate::error::{AppError, Result};
use crate::models::{
    Category, Image, ImageStatus, Order, Override, PageFile, PageFilter, Post, Revision,
    ThreadInfo, Vote, credited_urls, parse_time,
};
use crate::storage;

use super::{Source, sort_posts};

/// Read-only source over a capture file.
#[derive(Debug, Clone)]
pub struct LocalSource {
    pool: SqlitePool,
    site: String,
}

fn time_column(row: &SqliteRow, column: &str) -> Result<chrono::NaiveDateTime> {
    let text: String = row.try_get(column)?;
    parse_time(&text).ok_or_else(|| AppError::malformed(format!("stored time '{text}'")))
}

impl LocalSource {
    /// Open the capture at `path` for the wiki at `site`.
    pub async fn open(path: &Path, site: impl Into<String>) -> Result<Self> {
        let pool = storage::open_reader(path).await?;
        Ok(Self::from_pool(pool, site))
    }

    pub fn from_pool(pool: SqlitePool, site: impl Into<String>) -> Self {
        Self {
            pool,
            site: site.into(),
        }
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }

    async fn authored(&self, author: &str) -> Result<Vec<String>> {
        let urls = sqlx::query_scalar(
            "SELECT p.url FROM pages p
             JOIN revisions r ON r.page_id = p.id AND r.number = 0
             JOIN users u ON u.id = r.user_id
             WHERE u.name = ?",
        )
        .bind(author)
        .fetch_all(&self.pool)
        .await?;
        Ok(urls)
    }

    /// Pages matching tag, rating and creation date, in listing order.
    async fn candidates(&self, filter: &PageFilter) -> Result<Vec<String>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT p.url FROM pages p");

        if let Some(tag) = &filter.tag {
            query
                .push(" JOIN page_tags pt ON pt.page_id = p.id")
                .push(" JOIN tags t ON t.id = pt.tag_id AND t.name = ")
                .push_bind(tag.clone());
        }
        if filter.rating.is_some() {
            // Every vote counts, as in the rating the wiki lists.
            query.push(" LEFT JOIN votes v ON v.page_id = p.id");
        }
        if let Some(created) = &filter.created {
            let prefix = created.date.prefix();
            query
                .push(" JOIN revisions r0 ON r0.page_id = p.id AND r0.number = 0")
                .push(" AND substr(r0.time, 1, ")
                .push_bind(prefix.len() as i64)
                .push(") ")
                .push(created.op.sql())
                .push(" ")
                .push_bind(prefix);
        }

        query.push(" GROUP BY p.id");
        if let Some(rating) = &filter.rating {
            query
                .push(" HAVING COALESCE(SUM(v.value), 0) ")
                .push(rating.op.sql())
                .push(" ")
                .push_bind(rating.value);
        }
        query.push(match filter.order {
            Some(Order::Title) => " ORDER BY p.title, p.url",
            _ => " ORDER BY p.url",
        });

        let urls = query.build_query_scalar().fetch_all(&self.pool).await?;
        Ok(urls)
    }
}

#[async_trait]
impl Source for LocalSource {
    fn site(&self) -> &str {
        &self.site
    }

    async fn page_id(&self, url: &str, _markup: &str) -> Result<i64> {
        sqlx::query_scalar("SELECT id FROM pages WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(url))
    }

    async fn thread_id(&self, page_id: i64, _markup: &str) -> Result<Option<i64>> {
        let thread_id: Option<Option<i64>> =
            sqlx::query_scalar("SELECT thread_id FROM pages WHERE id = ?")
                .bind(page_id)
                .fetch_optional(&self.pool)
                .await?;
        thread_id.ok_or_else(|| AppError::not_found(format!("page {page_id}")))
    }

    async fn markup(&self, url: &str) -> Result<String> {
        sqlx::query_scalar("SELECT html FROM pages WHERE url = ?")
            .bind(url)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found(url))
    }

    async fn source_text(&self, page_id: i64) -> Result<String> {
        let source: Option<Option<String>> =
            sqlx::query_scalar("SELECT source FROM pages WHERE id = ?")
                .bind(page_id)
                .fetch_optional(&self.pool)
                .await?;
        source
            .flatten()
            .ok_or_else(|| AppError::not_found(format!("source of page {page_id}")))
    }

    async fn history(&self, page_id: i64) -> Result<Vec<Revision>> {
        let rows = sqlx::query(
            "SELECT r.id, r.number, u.name AS user, r.time, r.comment
             FROM revisions r JOIN users u ON u.id = r.user_id
             WHERE r.page_id = ? ORDER BY r.number",
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Revision {
                    id: row.try_get("id")?,
                    number: row.try_get::<i64, _>("number")? as u32,
                    user: row.try_get("user")?,
                    time: time_column(row, "time")?,
                    comment: row.try_get("comment")?,
                })
            })
            .collect()
    }

    async fn votes(&self, page_id: i64) -> Result<Vec<Vote>> {
        let rows = sqlx::query(
            "SELECT u.name AS user, v.value
             FROM votes v JOIN users u ON u.id = v.user_id
             WHERE v.page_id = ? ORDER BY v.rowid",
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Vote {
                    user: row.try_get("user")?,
                    value: row.try_get("value")?,
                })
            })
            .collect()
    }

    async fn tags(&self, page_id: i64, _markup: &str) -> Result<BTreeSet<String>> {
        let tags: Vec<String> = sqlx::query_scalar(
            "SELECT t.name FROM page_tags pt JOIN tags t ON t.id = pt.tag_id WHERE pt.page_id = ?",
        )
        .bind(page_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(tags.into_iter().collect())
    }

    async fn files(&self, page_id: i64) -> Result<Vec<PageFile>> {
        Err(AppError::not_found(format!(
            "attached files of page {page_id} (not part of a capture)"
        )))
    }

    async fn posts(&self, thread_id: i64) -> Result<Vec<Post>> {
        let rows = sqlx::query(
            "SELECT p.id, p.title, p.content, u.name AS user, p.time, p.parent_id
             FROM forum_posts p JOIN users u ON u.id = p.user_id
             WHERE p.thread_id = ?",
        )
        .bind(thread_id)
        .fetch_all(&self.pool)
        .await?;

        let mut posts = rows
            .iter()
            .map(|row| {
                Ok(Post {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    content: row.try_get("content")?,
                    user: row.try_get("user")?,
                    time: time_column(row, "time")?,
                    parent: row.try_get("parent_id")?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        sort_posts(&mut posts);
        Ok(posts)
    }

    async fn list_pages(&self, filter: &PageFilter) -> Result<Vec<String>> {
        let credited = match &filter.author {
            Some(author) => {
                let authored = self.authored(author).await?;
                let overrides = self.overrides().await?;
                Some(credited_urls(authored, &overrides, author))
            }
            None => None,
        };

        let mut urls: Vec<String> = match &credited {
            Some(credited)
                if !filter.has_non_author_criteria() && filter.order != Some(Order::Title) =>
            {
                credited.iter().cloned().collect()
            }
            _ => self
                .candidates(filter)
                .await?
                .into_iter()
                .filter(|url| credited.as_ref().is_none_or(|set| set.contains(url)))
                .collect(),
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
        let rows = sqlx::query(
            "SELECT id, title, description, size FROM forum_categories ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(Category {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    description: row.try_get("description")?,
                    size: row.try_get::<i64, _>("size")? as u32,
                })
            })
            .collect()
    }

    async fn threads(&self, category_id: i64) -> Result<Vec<ThreadInfo>> {
        let rows = sqlx::query(
            "SELECT id, title, description, category_id FROM forum_threads
             WHERE category_id = ? ORDER BY id",
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(ThreadInfo {
                    id: row.try_get("id")?,
                    title: row.try_get("title")?,
                    description: row.try_get("description")?,
                    category_id: row.try_get("category_id")?,
                })
            })
            .collect()
    }

    async fn overrides(&self) -> Result<Vec<Override>> {
        let rows = sqlx::query(
            "SELECT o.url, u.name AS user, k.name AS kind
             FROM overrides o
             JOIN users u ON u.id = o.user_id
             JOIN override_kinds k ON k.id = o.kind_id
             ORDER BY o.rowid",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let kind: String = row.try_get("kind")?;
                Ok(Override {
                    url: row.try_get("url")?,
                    user: row.try_get("user")?,
                    kind: kind.parse().map_err(AppError::malformed)?,
                })
            })
            .collect()
    }

    async fn images(&self) -> Result<Vec<Image>> {
        let rows = sqlx::query(
            "SELECT i.url, i.source, s.name AS status, i.notes
             FROM images i JOIN image_statuses s ON s.id = i.status_id
             ORDER BY i.url",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let status: String = row.try_get("status")?;
                Ok(Image {
                    url: row.try_get("url")?,
                    source: row.try_get("source")?,
                    status: ImageStatus::from_label(&status)
                        .ok_or_else(|| AppError::malformed(format!("image status '{status}'")))?,
                    notes: row.try_get("notes")?,
                    data: None,
                })
            })
            .collect()
    }

    async fn image_data(&self, url: &str) -> Result<Vec<u8>> {
        let data: Option<Option<Vec<u8>>> =
            sqlx::query_scalar("SELECT data FROM images WHERE url = ?")
                .bind(url)
                .fetch_optional(&self.pool)
                .await?;
        data.flatten().ok_or_else(|| AppError::not_found(url))
    }

    async fn titles(&self) -> Result<HashMap<String, String>> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT url, title FROM titles")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().collect())
    }

    async fn edit(
        &self,
        _page_id: i64,
        _url: &str,
        _source: &str,
        _title: &str,
        _comment: &str,
    ) -> Result<()> {
        Err(AppError::read_only("edit"))
    }

    async fn create_page(&self, _: &str, _: &str, _: &str, _: &str) -> Result<()> {
        Err(AppError::read_only("create page"))
    }

    async fn revert(&self, _page_id: i64, _revision_id: i64) -> Result<()> {
        Err(AppError::read_only("revert"))
    }

    async fn set_tags(&self, _page_id: i64, _tags: &BTreeSet<String>) -> Result<()> {
        Err(AppError::read_only("set tags"))
    }

    async fn vote(&self, _page_id: i64, _value: i32) -> Result<()> {
        Err(AppError::read_only("vote"))
    }

    async fn new_post(&self, _: i64, _: &str, _: Option<&str>, _: Option<i64>) -> Result<()> {
        Err(AppError::read_only("post"))
    }
}
