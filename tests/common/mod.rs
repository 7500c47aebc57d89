//! In-memory source shared by the integration tests.

#![allow(dead_code)]

use std::collections::{BTreeSet, HashMap, HashSet};

use async_trait::async_trait;
use wikimirror::error::{AppError, Result};
use wikimirror::models::{
    Category, Image, ImageStatus, Override, OverrideKind, PageFile, PageFilter, Post, Revision,
    ThreadInfo, Vote, parse_time,
};
use wikimirror::source::Source;

pub const SITE: &str = "http://test.wikidot.com";

/// Everything the source knows about one page.
#[derive(Debug, Clone)]
pub struct MemoryPage {
    pub url: String,
    pub id: i64,
    pub title: String,
    pub thread_id: Option<i64>,
    pub source: String,
    pub history: Vec<Revision>,
    pub votes: Vec<Vote>,
    pub tags: BTreeSet<String>,
}

impl MemoryPage {
    pub fn markup(&self) -> String {
        let tags: String = self
            .tags
            .iter()
            .map(|tag| format!(r#"<a href="/system:page-tags/tag/{tag}">{tag}</a>"#))
            .collect();
        format!(
            r#"<div id="main-content"><div id="page-title">{}</div><div id="page-content"><p>{}</p></div><div class="page-tags"><span>{tags}</span></div></div>"#,
            self.title, self.source
        )
    }
}

#[derive(Debug, Default)]
pub struct MemorySource {
    pub pages: Vec<MemoryPage>,
    /// URLs listed but failing on every fetch
    pub broken: HashSet<String>,
    pub posts: HashMap<i64, Vec<Post>>,
    pub categories: Vec<Category>,
    pub threads: HashMap<i64, Vec<ThreadInfo>>,
    pub overrides: Vec<Override>,
    pub images: Vec<Image>,
    pub titles: HashMap<String, String>,
}

impl MemorySource {
    fn by_url(&self, url: &str) -> Result<&MemoryPage> {
        if self.broken.contains(url) {
            return Err(AppError::TransportExhausted {
                url: url.to_string(),
                attempts: 10,
            });
        }
        self.pages
            .iter()
            .find(|page| page.url == url)
            .ok_or_else(|| AppError::not_found(url))
    }

    fn by_id(&self, id: i64) -> Result<&MemoryPage> {
        self.pages
            .iter()
            .find(|page| page.id == id)
            .ok_or_else(|| AppError::not_found(format!("page {id}")))
    }
}

pub fn url(name: &str) -> String {
    format!("{SITE}/{name}")
}

pub fn revision(page_id: i64, number: u32, user: &str, time: &str) -> Revision {
    Revision {
        id: page_id * 100 + i64::from(number),
        number,
        user: user.to_string(),
        time: parse_time(time).unwrap(),
        comment: (number > 0).then(|| format!("edit {number}")),
    }
}

pub fn vote(user: &str, value: i32) -> Vote {
    Vote {
        user: user.to_string(),
        value,
    }
}

pub fn post(id: i64, time: &str, user: &str, parent: Option<i64>) -> Post {
    Post {
        id,
        title: (parent.is_none()).then(|| format!("post {id}")),
        content: format!("<p>content of {id}</p>"),
        user: user.to_string(),
        time: parse_time(time).unwrap(),
        parent,
    }
}

fn tags(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|name| name.to_string()).collect()
}

/// Three healthy pages, one broken page, two forum categories and a bit of
/// metadata.
pub fn fixture() -> MemorySource {
    let pages = vec![
        MemoryPage {
            url: url("alpha"),
            id: 1,
            title: "Alpha".into(),
            thread_id: Some(100),
            source: "alpha text".into(),
            history: vec![
                revision(1, 0, "alice", "2014-03-01 10:00:00"),
                revision(1, 1, "bob", "2014-03-02 11:30:00"),
            ],
            votes: vec![vote("bob", 1), vote("carol", 1), vote("(account deleted)", -1)],
            tags: tags(&["euclid", "scp"]),
        },
        MemoryPage {
            url: url("beta"),
            id: 2,
            title: "Beta".into(),
            thread_id: None,
            source: "beta text".into(),
            history: vec![revision(2, 0, "bob", "2015-07-15 08:00:00")],
            votes: vec![vote("alice", -1)],
            tags: tags(&["scp"]),
        },
        MemoryPage {
            url: url("gamma"),
            id: 3,
            title: "Gamma".into(),
            thread_id: Some(101),
            source: "gamma text".into(),
            history: vec![revision(3, 0, "alice", "2016-01-20 20:00:00")],
            votes: vec![vote("alice", 1), vote("bob", 1), vote("carol", 1)],
            tags: tags(&["tale"]),
        },
    ];

    let mut posts = HashMap::new();
    posts.insert(
        100,
        vec![
            post(1001, "2014-03-01 12:00:00", "bob", None),
            post(1002, "2014-03-01 12:05:00", "alice", Some(1001)),
        ],
    );
    posts.insert(101, vec![post(1011, "2016-01-21 09:00:00", "carol", None)]);
    posts.insert(200, vec![post(2001, "2016-02-01 09:00:00", "dave", None)]);
    posts.insert(201, vec![post(2011, "2016-02-02 09:00:00", "erin", None)]);

    let mut threads = HashMap::new();
    threads.insert(
        1,
        vec![ThreadInfo {
            id: 200,
            title: Some("Welcome".into()),
            description: Some("Say hi".into()),
            category_id: Some(1),
        }],
    );
    threads.insert(
        2,
        vec![ThreadInfo {
            id: 201,
            title: Some("Discussion of alpha".into()),
            description: None,
            category_id: Some(2),
        }],
    );

    let mut titles = HashMap::new();
    titles.insert(url("alpha"), "The First".to_string());

    MemorySource {
        pages,
        broken: HashSet::from([url("broken")]),
        posts,
        categories: vec![
            Category {
                id: 1,
                title: "General".into(),
                description: "Anything goes".into(),
                size: 1,
            },
            Category {
                id: 2,
                title: "Per page discussions".into(),
                description: "Comments".into(),
                size: 1,
            },
        ],
        threads,
        overrides: vec![
            Override {
                url: url("gamma"),
                user: "carol".into(),
                kind: OverrideKind::Author,
            },
            Override {
                url: url("beta"),
                user: "alice".into(),
                kind: OverrideKind::Rewrite,
            },
        ],
        images: vec![
            Image {
                url: "http://files.test/cat.png".into(),
                source: Some("http://photos.test/cat".into()),
                status: ImageStatus::BySaCc,
                notes: Some("own work".into()),
                data: Some(vec![0x89, b'P', b'N', b'G']),
            },
            Image {
                url: "http://files.test/dog.png".into(),
                source: None,
                status: ImageStatus::PublicDomain,
                notes: None,
                data: Some(vec![1, 2, 3]),
            },
            Image {
                url: "http://files.test/bird.png".into(),
                source: Some("http://photos.test/bird".into()),
                status: ImageStatus::Replaced,
                notes: None,
                data: Some(vec![4, 5, 6]),
            },
        ],
        titles,
    }
}

#[async_trait]
impl Source for MemorySource {
    fn site(&self) -> &str {
        SITE
    }

    async fn page_id(&self, url: &str, _markup: &str) -> Result<i64> {
        Ok(self.by_url(url)?.id)
    }

    async fn thread_id(&self, page_id: i64, _markup: &str) -> Result<Option<i64>> {
        Ok(self.by_id(page_id)?.thread_id)
    }

    async fn markup(&self, url: &str) -> Result<String> {
        Ok(self.by_url(url)?.markup())
    }

    async fn source_text(&self, page_id: i64) -> Result<String> {
        Ok(self.by_id(page_id)?.source.clone())
    }

    async fn history(&self, page_id: i64) -> Result<Vec<Revision>> {
        Ok(self.by_id(page_id)?.history.clone())
    }

    async fn votes(&self, page_id: i64) -> Result<Vec<Vote>> {
        Ok(self.by_id(page_id)?.votes.clone())
    }

    async fn tags(&self, page_id: i64, _markup: &str) -> Result<BTreeSet<String>> {
        Ok(self.by_id(page_id)?.tags.clone())
    }

    async fn files(&self, page_id: i64) -> Result<Vec<PageFile>> {
        self.by_id(page_id)?;
        Ok(Vec::new())
    }

    async fn posts(&self, thread_id: i64) -> Result<Vec<Post>> {
        let mut posts = self.posts.get(&thread_id).cloned().unwrap_or_default();
        posts.sort_by(|a, b| a.time.cmp(&b.time).then(a.id.cmp(&b.id)));
        Ok(posts)
    }

    async fn list_pages(&self, filter: &PageFilter) -> Result<Vec<String>> {
        let mut urls: Vec<String> = self
            .pages
            .iter()
            .filter(|page| filter.tag.as_ref().is_none_or(|tag| page.tags.contains(tag)))
            .map(|page| page.url.clone())
            .chain(self.broken.iter().cloned())
            .collect();
        urls.sort();
        if let Some(limit) = filter.limit {
            urls.truncate(limit);
        }
        Ok(urls)
    }

    async fn categories(&self) -> Result<Vec<Category>> {
        Ok(self.categories.clone())
    }

    async fn threads(&self, category_id: i64) -> Result<Vec<ThreadInfo>> {
        Ok(self.threads.get(&category_id).cloned().unwrap_or_default())
    }

    async fn overrides(&self) -> Result<Vec<Override>> {
        Ok(self.overrides.clone())
    }

    async fn images(&self) -> Result<Vec<Image>> {
        Ok(self
            .images
            .iter()
            .map(|image| Image {
                data: None,
                ..image.clone()
            })
            .collect())
    }

    async fn image_data(&self, url: &str) -> Result<Vec<u8>> {
        self.images
            .iter()
            .find(|image| image.url == url)
            .and_then(|image| image.data.clone())
            .ok_or_else(|| AppError::not_found(url))
    }

    async fn titles(&self) -> Result<HashMap<String, String>> {
        Ok(self.titles.clone())
    }

    async fn edit(&self, _: i64, _: &str, _: &str, _: &str, _: &str) -> Result<()> {
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
