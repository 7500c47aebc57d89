// src/orm/thread.rs

//! Forum thread entity.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::OnceCell;

use super::Wiki;
use crate::error::Result;
use crate::models::{Post, ThreadInfo};

/// A post placed in the reply tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadEntry {
    pub post: Post,
    /// 0 for top-level posts
    pub depth: usize,
}

/// Handle to one forum thread.
#[derive(Debug, Clone)]
pub struct ForumThread {
    id: i64,
    info: Option<ThreadInfo>,
    wiki: Wiki,
    posts: Arc<OnceCell<Vec<Post>>>,
}

impl ForumThread {
    pub(crate) fn new(wiki: Wiki, id: i64, info: Option<ThreadInfo>) -> Self {
        Self {
            id,
            info,
            wiki,
            posts: Arc::new(OnceCell::new()),
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn title(&self) -> Option<&str> {
        self.info.as_ref()?.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.info.as_ref()?.description.as_deref()
    }

    pub fn category_id(&self) -> Option<i64> {
        self.info.as_ref()?.category_id
    }

    /// Posts sorted by time.
    pub async fn posts(&self) -> Result<&[Post]> {
        let posts = self
            .posts
            .get_or_try_init(|| self.wiki.source().posts(self.id))
            .await?;
        Ok(posts.as_slice())
    }

    /// Post to the thread, replying to `parent` when given. Cached posts are
    /// dropped.
    pub async fn new_post(
        &mut self,
        source: &str,
        title: Option<&str>,
        parent: Option<i64>,
    ) -> Result<()> {
        self.wiki
            .source()
            .new_post(self.id, source, title, parent)
            .await?;
        self.posts = Arc::new(OnceCell::new());
        Ok(())
    }

    /// Posts in display order: each post followed by its replies.
    pub async fn tree(&self) -> Result<Vec<ThreadEntry>> {
        Ok(reply_tree(self.posts().await?))
    }
}

/// Depth-first order over time-sorted posts.
///
/// A post whose parent is not in the thread is a root.
pub fn reply_tree(posts: &[Post]) -> Vec<ThreadEntry> {
    let ids: HashSet<i64> = posts.iter().map(|p| p.id).collect();
    let mut children: HashMap<Option<i64>, Vec<&Post>> = HashMap::new();
    for post in posts {
        let parent = post.parent.filter(|id| ids.contains(id) && *id != post.id);
        children.entry(parent).or_default().push(post);
    }

    let mut ordered = Vec::with_capacity(posts.len());
    let mut visited = HashSet::new();
    let mut stack: Vec<(&Post, usize)> = Vec::new();

    let roots = children.get(&None).cloned().unwrap_or_default();
    // Posts caught in a parent cycle have no root; they are appended last.
    let orphans = posts.iter().filter(|p| p.parent.is_some());
    for root in roots.into_iter().chain(orphans) {
        if visited.contains(&root.id) {
            continue;
        }
        stack.push((root, 0));
        while let Some((post, depth)) = stack.pop() {
            if !visited.insert(post.id) {
                continue;
            }
            ordered.push(ThreadEntry {
                post: post.clone(),
                depth,
            });
            if let Some(replies) = children.get(&Some(post.id)) {
                stack.extend(replies.iter().rev().map(|reply| (*reply, depth + 1)));
            }
        }
    }
    ordered
}
