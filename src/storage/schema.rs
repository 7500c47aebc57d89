// src/storage/schema.rs

//! Table layout of a capture.
//!
//! One table per entity plus the interned name tables. Relations are plain
//! integer columns; a capture is written once and never repaired, so there
//! are no foreign key constraints to order inserts around.

use std::fmt;

/// Every table of the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Pages,
    Revisions,
    Votes,
    Users,
    Tags,
    PageTags,
    ForumCategories,
    ForumThreads,
    ForumPosts,
    OverrideKinds,
    Overrides,
    ImageStatuses,
    Images,
    Titles,
}

impl Table {
    pub const ALL: [Table; 14] = [
        Table::Pages,
        Table::Revisions,
        Table::Votes,
        Table::Users,
        Table::Tags,
        Table::PageTags,
        Table::ForumCategories,
        Table::ForumThreads,
        Table::ForumPosts,
        Table::OverrideKinds,
        Table::Overrides,
        Table::ImageStatuses,
        Table::Images,
        Table::Titles,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Table::Pages => "pages",
            Table::Revisions => "revisions",
            Table::Votes => "votes",
            Table::Users => "users",
            Table::Tags => "tags",
            Table::PageTags => "page_tags",
            Table::ForumCategories => "forum_categories",
            Table::ForumThreads => "forum_threads",
            Table::ForumPosts => "forum_posts",
            Table::OverrideKinds => "override_kinds",
            Table::Overrides => "overrides",
            Table::ImageStatuses => "image_statuses",
            Table::Images => "images",
            Table::Titles => "titles",
        }
    }

    /// Whether the table maps interned names to ids.
    pub fn is_name_table(&self) -> bool {
        matches!(
            self,
            Table::Users | Table::Tags | Table::OverrideKinds | Table::ImageStatuses
        )
    }

    /// Statements creating the table and its indexes.
    pub fn ddl(&self) -> &'static [&'static str] {
        match self {
            Table::Pages => &[
                "CREATE TABLE IF NOT EXISTS pages (
                    id INTEGER PRIMARY KEY,
                    url TEXT NOT NULL UNIQUE,
                    title TEXT,
                    thread_id INTEGER,
                    html TEXT NOT NULL,
                    source TEXT
                )",
            ],
            Table::Revisions => &[
                "CREATE TABLE IF NOT EXISTS revisions (
                    id INTEGER PRIMARY KEY,
                    page_id INTEGER NOT NULL,
                    number INTEGER NOT NULL,
                    user_id INTEGER NOT NULL,
                    time TEXT NOT NULL,
                    comment TEXT,
                    UNIQUE (page_id, number)
                )",
                "CREATE INDEX IF NOT EXISTS idx_revisions_user ON revisions (user_id, number)",
            ],
            Table::Votes => &[
                "CREATE TABLE IF NOT EXISTS votes (
                    page_id INTEGER NOT NULL,
                    user_id INTEGER NOT NULL,
                    value INTEGER NOT NULL,
                    UNIQUE (page_id, user_id)
                )",
            ],
            Table::Users => &[
                "CREATE TABLE IF NOT EXISTS users (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)",
            ],
            Table::Tags => &[
                "CREATE TABLE IF NOT EXISTS tags (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)",
            ],
            Table::OverrideKinds => &[
                "CREATE TABLE IF NOT EXISTS override_kinds (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)",
            ],
            Table::ImageStatuses => &[
                "CREATE TABLE IF NOT EXISTS image_statuses (id INTEGER PRIMARY KEY, name TEXT NOT NULL UNIQUE)",
            ],
            Table::PageTags => &[
                "CREATE TABLE IF NOT EXISTS page_tags (
                    page_id INTEGER NOT NULL,
                    tag_id INTEGER NOT NULL,
                    UNIQUE (page_id, tag_id)
                )",
                "CREATE INDEX IF NOT EXISTS idx_page_tags_tag ON page_tags (tag_id)",
            ],
            Table::ForumCategories => &[
                "CREATE TABLE IF NOT EXISTS forum_categories (
                    id INTEGER PRIMARY KEY,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL,
                    size INTEGER NOT NULL
                )",
            ],
            Table::ForumThreads => &[
                "CREATE TABLE IF NOT EXISTS forum_threads (
                    id INTEGER PRIMARY KEY,
                    title TEXT,
                    description TEXT,
                    category_id INTEGER
                )",
            ],
            Table::ForumPosts => &[
                "CREATE TABLE IF NOT EXISTS forum_posts (
                    id INTEGER PRIMARY KEY,
                    thread_id INTEGER NOT NULL,
                    parent_id INTEGER,
                    title TEXT,
                    user_id INTEGER NOT NULL,
                    time TEXT NOT NULL,
                    content TEXT NOT NULL
                )",
                "CREATE INDEX IF NOT EXISTS idx_forum_posts_thread ON forum_posts (thread_id)",
            ],
            Table::Overrides => &[
                "CREATE TABLE IF NOT EXISTS overrides (
                    url TEXT NOT NULL,
                    user_id INTEGER NOT NULL,
                    kind_id INTEGER NOT NULL
                )",
            ],
            Table::Images => &[
                "CREATE TABLE IF NOT EXISTS images (
                    url TEXT PRIMARY KEY,
                    source TEXT,
                    data BLOB,
                    status_id INTEGER NOT NULL,
                    notes TEXT
                )",
            ],
            Table::Titles => &[
                "CREATE TABLE IF NOT EXISTS titles (url TEXT PRIMARY KEY, title TEXT NOT NULL)",
            ],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
