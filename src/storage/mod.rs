//! SQLite capture store.
//!
//! A capture is a single SQLite file written by one [`BufferedWriter`] and
//! read through a read-only pool by [`LocalSource`](crate::source::LocalSource).
//!
//! ## Layout
//!
//! ```text
//! pages            id, url, title, thread_id, html, source
//! revisions        id, page_id, number, user_id, time, comment
//! votes            page_id, user_id, value
//! page_tags        page_id, tag_id
//! forum_*          categories, threads, posts
//! overrides        url, user_id, kind_id
//! images           url, source, data, status_id, notes
//! titles           url, title
//! users, tags, override_kinds, image_statuses   id, name
//! ```

pub mod intern;
pub mod schema;
pub mod writer;

use std::path::{Path, PathBuf};

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{ConnectOptions, SqliteConnection};

use crate::error::{AppError, Result};

pub use intern::Interner;
pub use schema::Table;
pub use writer::{BufferedWriter, Record, WriteOp, WriterStats};

/// Files SQLite keeps next to the database in WAL mode.
fn companion_files(path: &Path) -> Vec<PathBuf> {
    ["-wal", "-shm"]
        .iter()
        .map(|suffix| {
            let mut name = path.as_os_str().to_owned();
            name.push(suffix);
            PathBuf::from(name)
        })
        .collect()
}

/// Delete a capture and its WAL files. Missing files are fine.
pub async fn purge(path: &Path) -> Result<()> {
    let mut files = vec![path.to_path_buf()];
    files.extend(companion_files(path));
    for file in files {
        match tokio::fs::remove_file(&file).await {
            Ok(()) => log::debug!("Removed {}", file.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(AppError::Io(e)),
        }
    }
    Ok(())
}

/// Open (creating if needed) the connection the writer will own.
pub async fn open_writer_connection(path: &Path) -> Result<SqliteConnection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let conn = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .connect()
        .await?;
    Ok(conn)
}

/// Open an existing capture for reading.
pub async fn open_reader(path: &Path) -> Result<SqlitePool> {
    if !tokio::fs::try_exists(path).await? {
        return Err(AppError::not_found(format!("capture {}", path.display())));
    }
    let options = SqliteConnectOptions::new().filename(path).read_only(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(4)
        .connect_with(options)
        .await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_companion_files() {
        let files = companion_files(Path::new("/tmp/capture.db"));
        assert_eq!(
            files,
            vec![
                PathBuf::from("/tmp/capture.db-wal"),
                PathBuf::from("/tmp/capture.db-shm")
            ]
        );
    }

    #[tokio::test]
    async fn test_purge_removes_capture() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("capture.db");

        let writer = BufferedWriter::start(open_writer_connection(&path).await.unwrap(), 10, 10);
        writer.create_table(Table::Pages).await.unwrap();
        writer.finish().await.unwrap();
        assert!(path.exists());

        purge(&path).await.unwrap();
        assert!(!path.exists());
        for file in companion_files(&path) {
            assert!(!file.exists());
        }
        // Purging again is a no-op
        purge(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_open_reader_requires_capture() {
        let dir = tempfile::tempdir().unwrap();
        let result = open_reader(&dir.path().join("missing.db")).await;
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
