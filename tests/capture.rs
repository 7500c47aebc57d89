//! Capture a source into a store and read it back through the local backend.

mod common;

use std::path::Path;
use std::sync::Arc;

use common::{MemorySource, SITE, fixture, url};
use wikimirror::error::AppError;
use wikimirror::models::{Config, PageFilter};
use wikimirror::orm::Wiki;
use wikimirror::pipeline::{CaptureReport, run_capture};
use wikimirror::source::{LocalSource, Source};

fn config(store: &Path) -> Config {
    let mut config = Config::default().with_site(SITE);
    config.store.path = store.to_path_buf();
    config.store.batch_size = 4;
    config.store.queue_high_water = 8;
    config.crawler.max_concurrent = 2;
    config.capture.forums = true;
    config.capture.metadata = true;
    config.capture.source_text = true;
    config
}

async fn capture(store: &Path) -> (Arc<MemorySource>, CaptureReport, LocalSource) {
    let memory = Arc::new(fixture());
    let report = run_capture(&config(store), memory.clone()).await.unwrap();
    let local = LocalSource::open(store, SITE).await.unwrap();
    (memory, report, local)
}

async fn list(local: &LocalSource, filters: &[&str]) -> Vec<String> {
    let filter = PageFilter::parse(filters.iter().copied()).unwrap();
    local.list_pages(&filter).await.unwrap()
}

#[tokio::test]
async fn test_capture_report_counts() {
    let dir = tempfile::tempdir().unwrap();
    let (_, report, _) = capture(&dir.path().join("capture.db")).await;

    assert_eq!(report.pages, 3);
    assert_eq!(report.page_failures, 1);
    assert_eq!(report.threads, 1);
    assert_eq!(report.thread_failures, 0);
    assert_eq!(report.posts, 4);
    assert_eq!(report.images, 1);
    assert_eq!(report.overrides, 2);
    assert_eq!(report.titles, 1);
    assert_eq!(report.writer.failed, 0);
}

#[tokio::test]
async fn test_pages_read_back_identically() {
    let dir = tempfile::tempdir().unwrap();
    let (memory, _, local) = capture(&dir.path().join("capture.db")).await;

    for page in &memory.pages {
        let id = local.page_id(&page.url, "").await.unwrap();
        assert_eq!(id, page.id);
        assert_eq!(local.thread_id(id, "").await.unwrap(), page.thread_id);
        assert_eq!(local.markup(&page.url).await.unwrap(), page.markup());
        assert_eq!(local.source_text(id).await.unwrap(), page.source);
        assert_eq!(local.history(id).await.unwrap(), page.history);
        assert_eq!(local.votes(id).await.unwrap(), page.votes);
        assert_eq!(local.tags(id, "").await.unwrap(), page.tags);
        if let Some(thread_id) = page.thread_id {
            assert_eq!(
                local.posts(thread_id).await.unwrap(),
                memory.posts(thread_id).await.unwrap()
            );
        }
    }

    assert!(matches!(
        local.page_id(&url("broken"), "").await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn test_forums_skip_excluded_categories() {
    let dir = tempfile::tempdir().unwrap();
    let (memory, _, local) = capture(&dir.path().join("capture.db")).await;

    let categories = local.categories().await.unwrap();
    assert_eq!(categories, vec![memory.categories[0].clone()]);

    let threads = local.threads(1).await.unwrap();
    assert_eq!(threads, memory.threads[&1]);
    assert_eq!(local.posts(200).await.unwrap(), memory.posts[&200]);
    assert!(local.posts(201).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_metadata_read_back() {
    let dir = tempfile::tempdir().unwrap();
    let (memory, _, local) = capture(&dir.path().join("capture.db")).await;

    assert_eq!(local.overrides().await.unwrap(), memory.overrides);
    assert_eq!(local.titles().await.unwrap(), memory.titles);

    let images = local.images().await.unwrap();
    assert_eq!(images.len(), 1);
    assert_eq!(images[0].url, "http://files.test/cat.png");
    assert_eq!(images[0].source.as_deref(), Some("http://photos.test/cat"));
    assert_eq!(images[0].notes.as_deref(), Some("own work"));
    assert_eq!(
        local.image_data("http://files.test/cat.png").await.unwrap(),
        vec![0x89, b'P', b'N', b'G']
    );
    assert!(local.image_data("http://files.test/dog.png").await.is_err());
}

#[tokio::test]
async fn test_filters_intersect_on_capture() {
    let dir = tempfile::tempdir().unwrap();
    let (_, _, local) = capture(&dir.path().join("capture.db")).await;
    let urls = |names: &[&str]| names.iter().map(|name| url(name)).collect::<Vec<_>>();

    assert_eq!(list(&local, &[]).await, urls(&["alpha", "beta", "gamma"]));
    assert_eq!(list(&local, &["tag=scp"]).await, urls(&["alpha", "beta"]));
    // alpha lists at +1: the deleted account's downvote counts
    assert_eq!(list(&local, &["rating=>1"]).await, urls(&["gamma"]));
    assert_eq!(list(&local, &["rating=1"]).await, urls(&["alpha"]));
    assert_eq!(list(&local, &["tag=scp", "rating=>0"]).await, urls(&["alpha"]));
    assert_eq!(list(&local, &["created=2015"]).await, urls(&["beta"]));
    assert_eq!(list(&local, &["created=>=2015"]).await, urls(&["beta", "gamma"]));
    assert_eq!(
        list(&local, &["order=title", "limit=2"]).await,
        urls(&["alpha", "beta"])
    );
    assert_eq!(list(&local, &["author=alice"]).await, urls(&["alpha", "beta"]));
    assert_eq!(list(&local, &["author=carol"]).await, urls(&["gamma"]));
    assert_eq!(
        list(&local, &["author=alice", "rating=<0"]).await,
        urls(&["beta"])
    );
}

#[tokio::test]
async fn test_entities_agree_across_backends() {
    let dir = tempfile::tempdir().unwrap();
    let (memory, _, local) = capture(&dir.path().join("capture.db")).await;
    let live = Wiki::new(memory);
    let captured = Wiki::new(Arc::new(local));

    for name in ["alpha", "beta", "gamma"] {
        let a = live.page(name);
        let b = captured.page(name);
        assert_eq!(a.rating().await.unwrap(), b.rating().await.unwrap());
        assert_eq!(a.title().await.unwrap(), b.title().await.unwrap());
        assert_eq!(a.authors().await.unwrap(), b.authors().await.unwrap());
        assert_eq!(a.comments().await.unwrap(), b.comments().await.unwrap());
    }

    assert_eq!(captured.page("alpha").title().await.unwrap(), "Alpha: The First");
    assert_eq!(captured.page("alpha").rating().await.unwrap(), 2);
    assert_eq!(
        captured.page("gamma").author().await.unwrap().as_deref(),
        Some("carol")
    );
    assert!(matches!(
        captured.page("alpha").upvote().await,
        Err(AppError::BackendReadOnly(_))
    ));
}
