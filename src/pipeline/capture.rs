// src/pipeline/capture.rs

//! Full-site capture into a local store.
//!
//! Phases run strictly in order:
//! 1. purge the old capture
//! 2. create the schema
//! 3. pages, fetched by a bounded pool of workers
//! 4. standalone forum threads (optional)
//! 5. images, author overrides and titles (optional)
//! 6. interned name tables
//!
//! A failing page, thread or image is logged and counted; it never stops
//! the phase. Records of one page are only enqueued once every fetch for
//! that page succeeded.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{self, StreamExt};

use crate::error::Result;
use crate::models::{
    CaptureConfig, Config, Image, PageFilter, Post, StoreConfig, ThreadInfo, format_time,
};
use crate::source::Source;
use crate::storage::{self, BufferedWriter, Interner, Record, Table, WriterStats};
use crate::utils::log::{header, progress, step, sub_item, success, summary};
use crate::wikidot::parse;

const PHASES: usize = 6;
const PROGRESS_EVERY: usize = 100;

/// Counts gathered during one capture.
#[derive(Debug, Clone, Default)]
pub struct CaptureReport {
    pub pages: usize,
    pub page_failures: usize,
    pub threads: usize,
    pub thread_failures: usize,
    pub posts: usize,
    pub images: usize,
    pub image_failures: usize,
    pub overrides: usize,
    pub titles: usize,
    pub users: usize,
    pub tags: usize,
    pub writer: WriterStats,
    pub elapsed: Duration,
}

impl CaptureReport {
    /// Log the report as a summary block.
    pub fn log(&self) {
        summary(
            "Capture complete",
            &[
                ("Pages", format!("{} ({} failed)", self.pages, self.page_failures)),
                (
                    "Threads",
                    format!("{} ({} failed)", self.threads, self.thread_failures),
                ),
                ("Posts", self.posts.to_string()),
                ("Images", format!("{} ({} failed)", self.images, self.image_failures)),
                ("Overrides", self.overrides.to_string()),
                ("Titles", self.titles.to_string()),
                ("Users", self.users.to_string()),
                ("Tags", self.tags.to_string()),
                (
                    "Writes",
                    format!(
                        "{} in {} batches ({} failed)",
                        self.writer.written,
                        self.writer.flushes(),
                        self.writer.failed
                    ),
                ),
                ("Elapsed", format!("{:.1}s", self.elapsed.as_secs_f64())),
            ],
        );
    }
}

/// State of one capture: the source, its settings and the name tables.
///
/// Interned ids are only meaningful within the run that assigned them.
pub struct CaptureRun {
    source: Arc<dyn Source>,
    settings: CaptureConfig,
    concurrency: usize,
    users: Interner,
    tags: Interner,
    override_kinds: Interner,
    image_statuses: Interner,
}

impl CaptureRun {
    pub fn new(source: Arc<dyn Source>, config: &Config) -> Self {
        Self {
            source,
            settings: config.capture.clone(),
            concurrency: config.crawler.max_concurrent.max(1),
            users: Interner::new(Table::Users),
            tags: Interner::new(Table::Tags),
            override_kinds: Interner::new(Table::OverrideKinds),
            image_statuses: Interner::new(Table::ImageStatuses),
        }
    }

    /// Run every phase against the store described by `store`.
    pub async fn run(&self, store: &StoreConfig) -> Result<CaptureReport> {
        let started = Instant::now();
        let mut report = CaptureReport::default();
        header(&format!("Capturing {}", self.source.site()));

        step(1, PHASES, &format!("Purging {}", store.path.display()));
        storage::purge(&store.path).await?;

        step(2, PHASES, "Creating schema");
        let conn = storage::open_writer_connection(&store.path).await?;
        let writer = BufferedWriter::start(conn, store.batch_size, store.queue_high_water);
        for table in Table::ALL {
            writer.create_table(table).await?;
        }
        writer.sync().await?;

        step(3, PHASES, "Capturing pages");
        self.capture_pages(&writer, &mut report).await?;

        step(4, PHASES, "Capturing forums");
        if self.settings.forums {
            self.capture_forums(&writer, &mut report).await;
        } else {
            sub_item("Skipped");
        }

        step(5, PHASES, "Capturing metadata");
        if self.settings.metadata {
            self.capture_metadata(&writer, &mut report).await;
        } else {
            sub_item("Skipped");
        }

        step(6, PHASES, "Writing name tables");
        for interner in [
            &self.users,
            &self.tags,
            &self.override_kinds,
            &self.image_statuses,
        ] {
            sub_item(&format!("{}: {}", interner.table(), interner.len()));
            writer.insert_many(interner.records()).await?;
        }
        report.users = self.users.len();
        report.tags = self.tags.len();

        report.writer = writer.finish().await?;
        report.elapsed = started.elapsed();
        success(&format!("Capture written to {}", store.path.display()));
        Ok(report)
    }

    async fn capture_pages(&self, writer: &BufferedWriter, report: &mut CaptureReport) -> Result<()> {
        let urls = self.source.list_pages(&PageFilter::default()).await?;
        let total = urls.len();
        sub_item(&format!("{total} pages listed"));

        let mut results = stream::iter(urls)
            .map(|url| async move {
                let result = self.capture_page(writer, &url).await;
                (url, result)
            })
            .buffer_unordered(self.concurrency);

        let mut done = 0;
        while let Some((url, result)) = results.next().await {
            done += 1;
            match result {
                Ok(posts) => {
                    report.pages += 1;
                    report.posts += posts;
                }
                Err(e) => {
                    report.page_failures += 1;
                    log::warn!("Failed to capture {url}: {e}");
                }
            }
            progress("Pages", done, total, PROGRESS_EVERY);
        }
        Ok(())
    }

    /// Fetch one page with its history, votes, tags and discussion.
    async fn capture_page(&self, writer: &BufferedWriter, url: &str) -> Result<usize> {
        let source = &self.source;
        let markup = source.markup(url).await?;
        let page_id = source.page_id(url, &markup).await?;
        let thread_id = source.thread_id(page_id, &markup).await?;
        let history = source.history(page_id).await?;
        let votes = source.votes(page_id).await?;
        let tags = source.tags(page_id, &markup).await?;
        let posts = match thread_id {
            Some(thread_id) => source.posts(thread_id).await?,
            None => Vec::new(),
        };
        let text = if self.settings.source_text {
            match source.source_text(page_id).await {
                Ok(text) => Some(text),
                Err(e) => {
                    log::warn!("No source for {url}: {e}");
                    None
                }
            }
        } else {
            None
        };
        let title = parse::raw_title(&markup)?;

        let mut records = vec![Record::Page {
            id: page_id,
            url: url.to_string(),
            title: (!title.is_empty()).then_some(title),
            thread_id,
            html: markup,
            source: text,
        }];
        records.extend(history.into_iter().map(|revision| Record::Revision {
            id: revision.id,
            page_id,
            number: revision.number,
            user_id: self.users.id(&revision.user),
            time: format_time(&revision.time),
            comment: revision.comment,
        }));
        records.extend(votes.into_iter().map(|vote| Record::Vote {
            page_id,
            user_id: self.users.id(&vote.user),
            value: vote.value,
        }));
        records.extend(tags.iter().map(|tag| Record::PageTag {
            page_id,
            tag_id: self.tags.id(tag),
        }));

        let post_count = posts.len();
        if let Some(thread_id) = thread_id {
            records.push(Record::Thread(ThreadInfo {
                id: thread_id,
                title: None,
                description: None,
                category_id: None,
            }));
            records.extend(self.post_records(thread_id, posts));
        }

        writer.insert_many(records).await?;
        Ok(post_count)
    }

    fn post_records(&self, thread_id: i64, posts: Vec<Post>) -> impl Iterator<Item = Record> + '_ {
        posts.into_iter().map(move |post| Record::Post {
            thread_id,
            user_id: self.users.id(&post.user),
            post,
        })
    }

    async fn capture_forums(&self, writer: &BufferedWriter, report: &mut CaptureReport) {
        let categories = match self.source.categories().await {
            Ok(categories) => categories,
            Err(e) => {
                log::warn!("Failed to list forum categories: {e}");
                return;
            }
        };

        let mut threads = Vec::new();
        for category in categories {
            if self.settings.excluded_categories.contains(&category.title) {
                log::debug!("Skipping forum category {}", category.title);
                continue;
            }
            match self.source.threads(category.id).await {
                Ok(found) => {
                    sub_item(&format!("{}: {} threads", category.title, found.len()));
                    threads.extend(found);
                }
                Err(e) => log::warn!("Failed to list threads of {}: {e}", category.title),
            }
            if let Err(e) = writer.create(Record::Category(category)).await {
                log::warn!("Failed to enqueue category: {e}");
            }
        }

        let total = threads.len();
        let mut results = stream::iter(threads)
            .map(|thread| async move {
                let id = thread.id;
                (id, self.capture_thread(writer, thread).await)
            })
            .buffer_unordered(self.concurrency);

        let mut done = 0;
        while let Some((id, result)) = results.next().await {
            done += 1;
            match result {
                Ok(posts) => {
                    report.threads += 1;
                    report.posts += posts;
                }
                Err(e) => {
                    report.thread_failures += 1;
                    log::warn!("Failed to capture thread {id}: {e}");
                }
            }
            progress("Threads", done, total, PROGRESS_EVERY);
        }
    }

    async fn capture_thread(&self, writer: &BufferedWriter, thread: ThreadInfo) -> Result<usize> {
        let posts = self.source.posts(thread.id).await?;
        let count = posts.len();
        let mut records: Vec<Record> = self.post_records(thread.id, posts).collect();
        records.push(Record::Thread(thread));
        writer.insert_many(records).await?;
        Ok(count)
    }

    async fn capture_metadata(&self, writer: &BufferedWriter, report: &mut CaptureReport) {
        match self.source.overrides().await {
            Ok(overrides) => {
                report.overrides = overrides.len();
                let records = overrides
                    .into_iter()
                    .map(|item| Record::Override {
                        user_id: self.users.id(&item.user),
                        kind_id: self.override_kinds.id(item.kind.as_str()),
                        url: item.url,
                    })
                    .collect();
                if let Err(e) = writer.insert_many(records).await {
                    log::warn!("Failed to enqueue overrides: {e}");
                }
            }
            Err(e) => log::warn!("Failed to read author overrides: {e}"),
        }

        match self.source.titles().await {
            Ok(titles) => {
                report.titles = titles.len();
                let records = titles
                    .into_iter()
                    .map(|(url, title)| Record::Title { url, title })
                    .collect();
                if let Err(e) = writer.insert_many(records).await {
                    log::warn!("Failed to enqueue titles: {e}");
                }
            }
            Err(e) => log::warn!("Failed to read title index: {e}"),
        }

        let images: Vec<Image> = match self.source.images().await {
            Ok(images) => images
                .into_iter()
                .filter(|image| image.status.is_licensed() && image.source.is_some())
                .collect(),
            Err(e) => {
                log::warn!("Failed to read image reviews: {e}");
                return;
            }
        };

        let total = images.len();
        sub_item(&format!("{total} licensed images"));
        let mut results = stream::iter(images)
            .map(|image| async move {
                let data = self.source.image_data(&image.url).await;
                (image, data)
            })
            .buffer_unordered(self.concurrency);

        let mut done = 0;
        while let Some((image, data)) = results.next().await {
            done += 1;
            match data {
                Ok(data) => {
                    let record = Record::Image {
                        status_id: self.image_statuses.id(image.status.label()),
                        url: image.url,
                        source: image.source,
                        data: Some(data),
                        notes: image.notes,
                    };
                    match writer.create(record).await {
                        Ok(()) => report.images += 1,
                        Err(e) => {
                            report.image_failures += 1;
                            log::warn!("Failed to enqueue image: {e}");
                        }
                    }
                }
                Err(e) => {
                    report.image_failures += 1;
                    log::warn!("Failed to download {}: {e}", image.url);
                }
            }
            progress("Images", done, total, PROGRESS_EVERY);
        }
    }
}

/// Capture `config.site` from `source` into `config.store`.
pub async fn run_capture(config: &Config, source: Arc<dyn Source>) -> Result<CaptureReport> {
    let run = CaptureRun::new(source, config);
    let report = run.run(&config.store).await?;
    report.log();
    Ok(report)
}
