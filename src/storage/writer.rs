// src/storage/writer.rs

//! Single background writer for the capture store.
//!
//! Producers enqueue [`WriteOp`]s on a bounded channel; a full channel
//! blocks them until the writer catches up. The writer owns the only
//! connection. It takes one operation, keeps draining while more are
//! already queued, and applies the batch as one transaction once the batch
//! grows past `batch_size` or the queue runs dry. A failing record is logged
//! and counted; the rest of its batch is still committed.

use sqlx::{Connection, SqliteConnection};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::error::{AppError, Result};
use crate::models::{Category, Post, ThreadInfo, format_time};

use super::schema::Table;

/// One row destined for the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Record {
    Page {
        id: i64,
        url: String,
        title: Option<String>,
        thread_id: Option<i64>,
        html: String,
        source: Option<String>,
    },
    Revision {
        id: i64,
        page_id: i64,
        number: u32,
        user_id: i64,
        time: String,
        comment: Option<String>,
    },
    Vote {
        page_id: i64,
        user_id: i64,
        value: i32,
    },
    PageTag {
        page_id: i64,
        tag_id: i64,
    },
    Category(Category),
    Thread(ThreadInfo),
    Post {
        thread_id: i64,
        user_id: i64,
        post: Post,
    },
    Override {
        url: String,
        user_id: i64,
        kind_id: i64,
    },
    Image {
        url: String,
        source: Option<String>,
        data: Option<Vec<u8>>,
        status_id: i64,
        notes: Option<String>,
    },
    Title {
        url: String,
        title: String,
    },
    /// Row of an interned name table
    Name {
        table: Table,
        id: i64,
        name: String,
    },
}

impl Record {
    /// Insert the record. Votes replace an earlier vote by the same user.
    pub async fn insert(&self, conn: &mut SqliteConnection) -> Result<()> {
        match self {
            Record::Page { id, url, title, thread_id, html, source } => {
                sqlx::query(
                    "INSERT INTO pages (id, url, title, thread_id, html, source) VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(id)
                .bind(url)
                .bind(title)
                .bind(thread_id)
                .bind(html)
                .bind(source)
                .execute(&mut *conn)
                .await?;
            }
            Record::Revision { id, page_id, number, user_id, time, comment } => {
                sqlx::query(
                    "INSERT INTO revisions (id, page_id, number, user_id, time, comment) VALUES (?, ?, ?, ?, ?, ?)",
                )
                .bind(id)
                .bind(page_id)
                .bind(i64::from(*number))
                .bind(user_id)
                .bind(time)
                .bind(comment)
                .execute(&mut *conn)
                .await?;
            }
            Record::Vote { page_id, user_id, value } => {
                sqlx::query("INSERT OR REPLACE INTO votes (page_id, user_id, value) VALUES (?, ?, ?)")
                    .bind(page_id)
                    .bind(user_id)
                    .bind(value)
                    .execute(&mut *conn)
                    .await?;
            }
            Record::PageTag { page_id, tag_id } => {
                sqlx::query("INSERT OR IGNORE INTO page_tags (page_id, tag_id) VALUES (?, ?)")
                    .bind(page_id)
                    .bind(tag_id)
                    .execute(&mut *conn)
                    .await?;
            }
            Record::Category(category) => {
                sqlx::query(
                    "INSERT INTO forum_categories (id, title, description, size) VALUES (?, ?, ?, ?)",
                )
                .bind(category.id)
                .bind(&category.title)
                .bind(&category.description)
                .bind(i64::from(category.size))
                .execute(&mut *conn)
                .await?;
            }
            Record::Thread(thread) => {
                sqlx::query(
                    "INSERT OR REPLACE INTO forum_threads (id, title, description, category_id) VALUES (?, ?, ?, ?)",
                )
                .bind(thread.id)
                .bind(&thread.title)
                .bind(&thread.description)
                .bind(thread.category_id)
                .execute(&mut *conn)
                .await?;
            }
            Record::Post { thread_id, user_id, post } => {
                sqlx::query(
                    "INSERT INTO forum_posts (id, thread_id, parent_id, title, user_id, time, content) VALUES (?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(post.id)
                .bind(thread_id)
                .bind(post.parent)
                .bind(&post.title)
                .bind(user_id)
                .bind(format_time(&post.time))
                .bind(&post.content)
                .execute(&mut *conn)
                .await?;
            }
            Record::Override { url, user_id, kind_id } => {
                sqlx::query("INSERT INTO overrides (url, user_id, kind_id) VALUES (?, ?, ?)")
                    .bind(url)
                    .bind(user_id)
                    .bind(kind_id)
                    .execute(&mut *conn)
                    .await?;
            }
            Record::Image { url, source, data, status_id, notes } => {
                sqlx::query(
                    "INSERT INTO images (url, source, data, status_id, notes) VALUES (?, ?, ?, ?, ?)",
                )
                .bind(url)
                .bind(source)
                .bind(data)
                .bind(status_id)
                .bind(notes)
                .execute(&mut *conn)
                .await?;
            }
            Record::Title { url, title } => {
                sqlx::query("INSERT OR REPLACE INTO titles (url, title) VALUES (?, ?)")
                    .bind(url)
                    .bind(title)
                    .execute(&mut *conn)
                    .await?;
            }
            Record::Name { table, id, name } => {
                if !table.is_name_table() {
                    return Err(AppError::validation(format!("{table} is not a name table")));
                }
                sqlx::query(&format!("INSERT INTO {} (id, name) VALUES (?, ?)", table.name()))
                    .bind(id)
                    .bind(name)
                    .execute(&mut *conn)
                    .await?;
            }
        }
        Ok(())
    }
}

/// An operation on the writer queue.
#[derive(Debug)]
pub enum WriteOp {
    CreateTable(Table),
    Create(Record),
    InsertMany(Vec<Record>),
    /// Flush everything queued before this and report the running totals
    Sync(oneshot::Sender<WriterStats>),
}

impl WriteOp {
    /// Number of statements the operation contributes to a batch.
    fn weight(&self) -> usize {
        match self {
            WriteOp::CreateTable(_) | WriteOp::Create(_) => 1,
            WriteOp::InsertMany(records) => records.len(),
            WriteOp::Sync(_) => 0,
        }
    }
}

/// Running totals of the writer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriterStats {
    /// Size of every committed batch, in order
    pub batches: Vec<usize>,
    pub written: usize,
    pub failed: usize,
}

impl WriterStats {
    pub fn flushes(&self) -> usize {
        self.batches.len()
    }
}

/// Handle to the background writer task.
#[derive(Debug)]
pub struct BufferedWriter {
    queue: mpsc::Sender<WriteOp>,
    task: JoinHandle<WriterStats>,
    batch_size: usize,
}

impl BufferedWriter {
    /// Start the writer on `conn`.
    ///
    /// At most `high_water` operations wait in the queue; `batch_size` is
    /// the flush threshold.
    pub fn start(conn: SqliteConnection, batch_size: usize, high_water: usize) -> Self {
        let batch_size = batch_size.max(1);
        let (queue, receiver) = mpsc::channel(high_water.max(1));
        let worker = WriterWorker {
            conn,
            receiver,
            batch_size,
            stats: WriterStats::default(),
        };
        let task = tokio::spawn(worker.run());
        Self { queue, task, batch_size }
    }

    async fn send(&self, op: WriteOp) -> Result<()> {
        self.queue
            .send(op)
            .await
            .map_err(|_| AppError::validation("store writer has stopped"))
    }

    pub async fn create_table(&self, table: Table) -> Result<()> {
        self.send(WriteOp::CreateTable(table)).await
    }

    pub async fn create(&self, record: Record) -> Result<()> {
        self.send(WriteOp::Create(record)).await
    }

    /// Enqueue records in chunks of at most `batch_size`.
    pub async fn insert_many(&self, records: Vec<Record>) -> Result<()> {
        let mut records = records.into_iter().peekable();
        while records.peek().is_some() {
            let chunk: Vec<Record> = records.by_ref().take(self.batch_size).collect();
            self.send(WriteOp::InsertMany(chunk)).await?;
        }
        Ok(())
    }

    /// Wait until everything enqueued so far is committed.
    pub async fn sync(&self) -> Result<WriterStats> {
        let (reply, done) = oneshot::channel();
        self.send(WriteOp::Sync(reply)).await?;
        done.await
            .map_err(|_| AppError::validation("store writer stopped before sync"))
    }

    /// Drain the queue, stop the writer and return its totals.
    pub async fn finish(self) -> Result<WriterStats> {
        drop(self.queue);
        self.task
            .await
            .map_err(|e| AppError::validation(format!("store writer failed: {e}")))
    }
}

struct WriterWorker {
    conn: SqliteConnection,
    receiver: mpsc::Receiver<WriteOp>,
    batch_size: usize,
    stats: WriterStats,
}

impl WriterWorker {
    async fn run(mut self) -> WriterStats {
        log::debug!("Store writer started (batch_size={})", self.batch_size);

        while let Some(op) = self.receiver.recv().await {
            let mut batch = Vec::new();
            let mut weight = 0;
            let mut sync = None;

            let mut next = Some(op);
            while let Some(op) = next.take() {
                match op {
                    WriteOp::Sync(reply) => {
                        sync = Some(reply);
                        break;
                    }
                    op => {
                        weight += op.weight();
                        batch.push(op);
                    }
                }
                if weight > self.batch_size {
                    break;
                }
                next = self.receiver.try_recv().ok();
            }

            self.flush(batch, weight).await;
            if let Some(reply) = sync {
                let _ = reply.send(self.stats.clone());
            }
        }

        // Leave a self-contained file behind for read-only openers
        if let Err(e) = sqlx::query("PRAGMA journal_mode = DELETE")
            .execute(&mut self.conn)
            .await
        {
            log::warn!("Leaving WAL mode failed: {e}");
        }
        if let Err(e) = self.conn.close().await {
            log::warn!("Closing store connection failed: {e}");
        }
        log::debug!(
            "Store writer stopped: {} written, {} failed in {} batches",
            self.stats.written,
            self.stats.failed,
            self.stats.flushes()
        );
        self.stats
    }

    async fn flush(&mut self, batch: Vec<WriteOp>, weight: usize) {
        if batch.is_empty() {
            return;
        }
        log::debug!("Flushing {weight} writes");

        let mut tx = match self.conn.begin().await {
            Ok(tx) => tx,
            Err(e) => {
                log::error!("Could not open write transaction: {e}");
                self.stats.failed += weight;
                return;
            }
        };

        let mut written = 0;
        let mut failed = 0;
        for op in &batch {
            match op {
                WriteOp::CreateTable(table) => {
                    let mut created = true;
                    for statement in table.ddl() {
                        if let Err(e) = sqlx::query(statement).execute(&mut *tx).await {
                            log::error!("Creating {table} failed: {e}");
                            created = false;
                        }
                    }
                    if created {
                        written += 1;
                    } else {
                        failed += 1;
                    }
                }
                WriteOp::Create(record) => match record.insert(&mut *tx).await {
                    Ok(()) => written += 1,
                    Err(e) => {
                        log::warn!("Write failed: {e}");
                        failed += 1;
                    }
                },
                WriteOp::InsertMany(records) => {
                    for record in records {
                        match record.insert(&mut *tx).await {
                            Ok(()) => written += 1,
                            Err(e) => {
                                log::warn!("Write failed: {e}");
                                failed += 1;
                            }
                        }
                    }
                }
                WriteOp::Sync(_) => {}
            }
        }

        match tx.commit().await {
            Ok(()) => {
                self.stats.written += written;
                self.stats.failed += failed;
            }
            Err(e) => {
                log::error!("Committing {weight} writes failed: {e}");
                self.stats.failed += weight;
            }
        }
        self.stats.batches.push(weight);
    }
}
