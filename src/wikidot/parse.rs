// src/wikidot/parse.rs

//! Extraction of records from wiki HTML.
//!
//! All functions take markup as text and return owned values, so parsed
//! documents never live across an await point.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, NaiveDateTime};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{
    Category, Image, ImageStatus, Override, OverrideKind, PageFile, Post, Revision, ThreadInfo,
    Vote, dedupe_votes,
};
use crate::utils::{page_url, parse_element_id, resolve_url};

const ACCESS_DENIED: &str = "[ACCESS DENIED]";
const IMAGE_SUFFIXES: [&str; 3] = [".png", ".jpg", ".gif"];

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AppError::selector(css, format!("{e:?}")))
}

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(scope: ElementRef<'_>, sel: &Selector) -> Option<String> {
    scope.select(sel).next().map(text_of)
}

fn non_empty(text: String) -> Option<String> {
    if text.is_empty() { None } else { Some(text) }
}

/// Timestamp carried by the `time_<unix>` class of an `.odate` element.
fn odate(scope: ElementRef<'_>) -> Result<Option<NaiveDateTime>> {
    let odate = selector(".odate")?;
    let time = scope
        .select(&odate)
        .next()
        .and_then(|el| {
            el.value()
                .classes()
                .find_map(|class| class.strip_prefix("time_"))
                .and_then(|secs| secs.parse::<i64>().ok())
        })
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.naive_utc());
    Ok(time)
}

/// Last page index from a `page 1 of N` pager marker.
pub fn page_count(body: &str) -> Result<Option<usize>> {
    let document = Html::parse_fragment(body);
    let pager = selector(".pager-no")?;
    Ok(document
        .select(&pager)
        .next()
        .map(text_of)
        .and_then(|text| text.split_whitespace().last().and_then(|n| n.parse().ok())))
}

/// Numeric page id embedded in a full page document.
pub fn page_id(document: &str) -> Option<i64> {
    let pattern = Regex::new(r"pageId = ([0-9]+);").ok()?;
    pattern.captures(document)?.get(1)?.as_str().parse().ok()
}

/// Outer HTML of `#main-content`, the part of a page worth keeping.
pub fn main_content(document: &str) -> Result<String> {
    let html = Html::parse_document(document);
    let main = selector("#main-content")?;
    html.select(&main)
        .next()
        .map(|el| el.html())
        .ok_or_else(|| AppError::malformed("page has no #main-content"))
}

/// Discussion thread id from the page's discuss button, if it has one.
pub fn thread_id(markup: &str) -> Result<Option<i64>> {
    let html = Html::parse_fragment(markup);
    let button = selector("#discuss-button")?;
    Ok(html
        .select(&button)
        .next()
        .and_then(|el| el.value().attr("href"))
        .and_then(parse_element_id))
}

/// Tags listed on the page.
pub fn tags(markup: &str) -> Result<BTreeSet<String>> {
    let html = Html::parse_fragment(markup);
    let links = selector(".page-tags a")?;
    Ok(html
        .select(&links)
        .map(text_of)
        .filter(|tag| !tag.is_empty())
        .collect())
}

/// Title as displayed on the page.
pub fn raw_title(markup: &str) -> Result<String> {
    let html = Html::parse_fragment(markup);
    let title = selector("#page-title")?;
    Ok(html.select(&title).next().map(text_of).unwrap_or_default())
}

/// Plain text of `#page-content`.
pub fn page_text(markup: &str) -> Result<String> {
    let html = Html::parse_fragment(markup);
    let content = selector("#page-content")?;
    html.select(&content)
        .next()
        .map(|el| el.text().collect())
        .ok_or_else(|| AppError::malformed("page has no #page-content"))
}

/// Sources of the images shown on the page.
pub fn image_sources(markup: &str) -> Result<Vec<String>> {
    let html = Html::parse_fragment(markup);
    let img = selector("img")?;
    Ok(html
        .select(&img)
        .filter_map(|el| el.value().attr("src"))
        .map(str::to_string)
        .collect())
}

/// Other pages linked from the content.
///
/// Only root-relative links count. Image links are skipped, a trailing `|`
/// is stripped, and each URL appears once, in document order.
pub fn links(markup: &str, site: &str) -> Result<Vec<String>> {
    let html = Html::parse_fragment(markup);
    let anchors = selector("#page-content a")?;
    let mut seen = BTreeSet::new();
    let mut urls = Vec::new();
    for href in html.select(&anchors).filter_map(|el| el.value().attr("href")) {
        if !href.starts_with('/') || IMAGE_SUFFIXES.iter().any(|ext| href.ends_with(ext)) {
            continue;
        }
        let url = format!("{}{}", site, href.trim_end_matches('|'));
        if seen.insert(url.clone()) {
            urls.push(url);
        }
    }
    Ok(urls)
}

/// Target of the last breadcrumb link.
pub fn parent(markup: &str, site: &str) -> Result<Option<String>> {
    let html = Html::parse_fragment(markup);
    let crumbs = selector("#breadcrumbs a")?;
    Ok(html
        .select(&crumbs)
        .filter_map(|el| el.value().attr("href"))
        .last()
        .map(|href| format!("{site}{href}")))
}

/// Revision rows of `history/PageRevisionListModule`, sorted by number.
pub fn history(body: &str) -> Result<Vec<Revision>> {
    let html = Html::parse_fragment(body);
    let rows = selector("tr")?;
    let cells = selector("td")?;

    let mut revisions = Vec::new();
    for row in html.select(&rows).skip(1) {
        let id = row
            .value()
            .id()
            .and_then(|id| id.rsplit('-').next())
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| AppError::malformed("revision row without id"))?;
        let tds: Vec<ElementRef<'_>> = row.select(&cells).collect();
        if tds.len() < 7 {
            return Err(AppError::malformed(format!("revision row {id} has {} cells", tds.len())));
        }
        let number = text_of(tds[0])
            .trim_end_matches('.')
            .parse()
            .map_err(|e| AppError::malformed(format!("revision {id} number: {e}")))?;
        let time = odate(tds[5])?
            .ok_or_else(|| AppError::malformed(format!("revision {id} has no time")))?;

        revisions.push(Revision {
            id,
            number,
            user: text_of(tds[4]),
            time,
            comment: non_empty(text_of(tds[6])),
        });
    }
    revisions.sort_by_key(|r| r.number);
    Ok(revisions)
}

/// Votes of `pagerate/WhoRatedPageModule`, one per user.
pub fn votes(body: &str) -> Result<Vec<Vote>> {
    let html = Html::parse_fragment(body);
    let users = selector("span.printuser")?;
    let votes = html
        .select(&users)
        .filter_map(|user| {
            let sign = user
                .next_siblings()
                .filter_map(ElementRef::wrap)
                .next()
                .map(text_of)?;
            Some(Vote {
                user: text_of(user),
                value: if sign == "+" { 1 } else { -1 },
            })
        })
        .collect();
    Ok(dedupe_votes(votes))
}

/// Posts of one `forum/ForumViewThreadPostsModule` page.
///
/// Replies are nested `.post-container` elements; a post's parent is the
/// post of the nearest enclosing container above its own.
pub fn posts(body: &str) -> Result<Vec<Post>> {
    let html = Html::parse_fragment(body);
    let post_sel = selector("div.post")?;
    let title_sel = selector(".title")?;
    let content_sel = selector(".content")?;
    let user_sel = selector(".printuser")?;

    let mut posts = Vec::new();
    for post in html.select(&post_sel) {
        let id = post
            .value()
            .id()
            .and_then(|id| id.strip_prefix("post-"))
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| AppError::malformed("forum post without id"))?;

        let parent = post
            .ancestors()
            .filter_map(ElementRef::wrap)
            .filter(|el| el.value().classes().any(|c| c == "post-container"))
            .nth(1)
            .and_then(|el| el.value().id())
            .and_then(|id| id.strip_prefix("fpc-"))
            .and_then(|id| id.parse().ok());

        let time = odate(post)?
            .ok_or_else(|| AppError::malformed(format!("post {id} has no time")))?;

        posts.push(Post {
            id,
            title: first_text(post, &title_sel).and_then(non_empty),
            content: post
                .select(&content_sel)
                .next()
                .map(|el| el.inner_html().trim().to_string())
                .unwrap_or_default(),
            user: first_text(post, &user_sel).unwrap_or_default(),
            time,
            parent,
        });
    }
    Ok(posts)
}

/// Key/value rows of each `div.list-pages-item`.
pub fn list_items(body: &str) -> Result<Vec<HashMap<String, String>>> {
    let html = Html::parse_fragment(body);
    let items = selector("div.list-pages-item")?;
    let rows = selector("tr")?;
    let cells = selector("td")?;

    Ok(html
        .select(&items)
        .map(|item| {
            item.select(&rows)
                .filter_map(|row| {
                    let mut tds = row.select(&cells);
                    let key = text_of(tds.next()?);
                    let value = text_of(tds.next()?);
                    Some((key, value))
                })
                .collect()
        })
        .collect())
}

/// Rows of `table.page-files` in `files/PageFilesModule`: `name | type | size`.
pub fn files(body: &str, site: &str) -> Result<Vec<PageFile>> {
    let html = Html::parse_fragment(body);
    let table = selector("table.page-files")?;
    let rows = selector("tr")?;
    let cells = selector("td")?;
    let link = selector("a")?;

    let Some(table) = html.select(&table).next() else {
        return Ok(Vec::new());
    };
    Ok(table
        .select(&rows)
        .skip(1)
        .filter_map(|row| {
            let tds: Vec<ElementRef<'_>> = row.select(&cells).collect();
            if tds.len() < 3 {
                return None;
            }
            let anchor = tds[0].select(&link).next()?;
            let href = anchor.value().attr("href")?;
            Some(PageFile {
                url: format!("{site}{href}"),
                name: text_of(anchor),
                filetype: text_of(tds[1]),
                size: text_of(tds[2]),
            })
        })
        .collect())
}

/// Categories on `forum/ForumStartModule`.
pub fn categories(body: &str) -> Result<Vec<Category>> {
    let html = Html::parse_fragment(body);
    let names = selector(".name")?;
    let link = selector(".title a")?;
    let title = selector(".title")?;
    let description = selector(".description")?;
    let threads = selector(".threads")?;

    let mut categories = Vec::new();
    for name in html.select(&names) {
        let Some(row) = name.parent().and_then(ElementRef::wrap) else {
            continue;
        };
        let Some(id) = name
            .select(&link)
            .next()
            .and_then(|a| a.value().attr("href"))
            .and_then(parse_element_id)
        else {
            continue;
        };
        categories.push(Category {
            id,
            title: first_text(name, &title).unwrap_or_default(),
            description: first_text(name, &description).unwrap_or_default(),
            size: first_text(row, &threads)
                .and_then(|n| n.parse().ok())
                .unwrap_or(0),
        });
    }
    Ok(categories)
}

/// Threads on one page of `forum/ForumViewCategoryModule`.
pub fn threads(body: &str, category_id: i64) -> Result<Vec<ThreadInfo>> {
    let html = Html::parse_fragment(body);
    let names = selector(".name")?;
    let link = selector(".title a")?;
    let title = selector(".title")?;
    let description = selector(".description")?;

    Ok(html
        .select(&names)
        .filter_map(|name| {
            let id = name
                .select(&link)
                .next()
                .and_then(|a| a.value().attr("href"))
                .and_then(parse_element_id)?;
            Some(ThreadInfo {
                id,
                title: first_text(name, &title).and_then(non_empty),
                description: first_text(name, &description).and_then(non_empty),
                category_id: Some(category_id),
            })
        })
        .collect())
}

/// Text of `viewsource/ViewSourceModule`.
pub fn source_text(body: &str) -> Result<String> {
    let html = Html::parse_fragment(body);
    let source = selector(".page-source")?;
    let text = match html.select(&source).next() {
        Some(el) => el.text().collect::<String>(),
        None => {
            let all: String = html.root_element().text().collect();
            all.trim_start()
                .strip_prefix("Page source")
                .map(str::to_string)
                .unwrap_or(all)
        }
    };
    Ok(text.replace('\u{a0}', " ").trim().to_string())
}

/// Rows of the attribution table: `name | user | type | date`.
///
/// Only `author` and `rewrite` rows are kept.
pub fn overrides(markup: &str, site: &str) -> Result<Vec<Override>> {
    let html = Html::parse_fragment(markup);
    let rows = selector("tr")?;
    let cells = selector("td")?;

    Ok(html
        .select(&rows)
        .skip(1)
        .filter_map(|row| {
            let tds: Vec<String> = row.select(&cells).map(text_of).collect();
            if tds.len() < 3 {
                return None;
            }
            let kind: OverrideKind = tds[2].parse().ok()?;
            Some(Override {
                url: page_url(site, &tds[0]),
                user: tds[1].clone(),
                kind,
            })
        })
        .collect())
}

/// Rows of one image review page: `image | _ | source | status | notes`.
///
/// Rows with an unknown status are dropped.
pub fn image_reviews(document: &str, page_url: &str) -> Result<Vec<Image>> {
    let base = Url::parse(page_url)?;
    let html = Html::parse_document(document);
    let rows = selector("tr")?;
    let cells = selector("td")?;
    let img = selector("img")?;
    let link = selector("a")?;

    Ok(html
        .select(&rows)
        .filter_map(|row| {
            let tds: Vec<ElementRef<'_>> = row.select(&cells).collect();
            if tds.len() < 5 {
                return None;
            }
            let src = tds[0].select(&img).next()?.value().attr("src")?;
            let status = ImageStatus::from_label(&text_of(tds[3]))?;
            Some(Image {
                url: resolve_url(&base, src),
                source: tds[2]
                    .select(&link)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .map(str::to_string),
                status,
                notes: non_empty(text_of(tds[4])),
                data: None,
            })
        })
        .collect())
}

/// `url -> title` entries from a series index page.
///
/// Items read `SCP-XXX - Title` (or `SCP-XXX, Title`); both the linked URL
/// and the URL named by the item number map to the title.
pub fn title_entries(markup: &str, site: &str) -> Result<Vec<(String, String)>> {
    let html = Html::parse_fragment(markup);
    let items = selector("ul > li")?;
    let anchor = selector("a")?;

    let mut entries = Vec::new();
    for item in html.select(&items) {
        let text: String = item.text().collect();
        let separator = if text.contains(" - ") { " - " } else { ", " };
        let Some((number, title)) = text.split_once(separator) else {
            continue;
        };
        let Some(href) = item.select(&anchor).next().and_then(|a| a.value().attr("href")) else {
            continue;
        };
        let title = title.trim();
        if title == ACCESS_DENIED || !href.starts_with('/') {
            continue;
        }
        entries.push((format!("{site}{href}"), title.to_string()));
        entries.push((page_url(site, number.trim()), title.to_string()));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SITE: &str = "http://www.scp-wiki.net";

    #[test]
    fn test_page_count() {
        let body = r#"<div class="pager"><span class="pager-no">page 1 of 12</span></div>"#;
        assert_eq!(page_count(body).unwrap(), Some(12));
        assert_eq!(page_count("<p>nothing</p>").unwrap(), None);
    }

    #[test]
    fn test_page_ids() {
        let document = r#"<html><head><script>WIKIREQUEST.info.pageId = 18578010;</script></head>
            <body><div id="main-content"><div id="page-title"> SCP-1511 </div>
            <div id="page-content"><p>Hello <a href="/scp-001">x</a></p></div>
            <div class="page-tags"><span><a href="/system:page-tags/tag/scp">scp</a><a href="/system:page-tags/tag/crystalline">crystalline</a></span></div>
            <a id="discuss-button" href="/forum/t-666715/scp-1511">Discuss</a></div></body></html>"#;
        assert_eq!(page_id(document), Some(18578010));

        let markup = main_content(document).unwrap();
        assert!(markup.starts_with("<div id=\"main-content\">"));
        assert_eq!(thread_id(&markup).unwrap(), Some(666715));
        assert_eq!(raw_title(&markup).unwrap(), "SCP-1511");
        let tags = tags(&markup).unwrap();
        assert!(tags.contains("scp") && tags.contains("crystalline"));
        assert_eq!(page_text(&markup).unwrap().trim(), "Hello x");
    }

    #[test]
    fn test_main_content_missing() {
        assert!(matches!(
            main_content("<html><body></body></html>"),
            Err(AppError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_history_sorted_oldest_first() {
        let body = r#"<table>
            <tr><td>rev.</td><td></td><td></td><td></td><td>by</td><td>date</td><td>comments</td></tr>
            <tr id="revision-row-39167300"><td>1.</td><td></td><td></td><td></td>
                <td><span class="printuser">Dr Gears</span></td>
                <td><span class="odate time_1372611000 format_x">x</span></td><td>fix typo</td></tr>
            <tr id="revision-row-39167223"><td>0.</td><td></td><td></td><td></td>
                <td><span class="printuser">anqxyr</span></td>
                <td><span class="odate time_1372610077 format_x">x</span></td><td>INITIATE HEAVEN SUBROUTINE</td></tr>
            </table>"#;
        let revisions = history(body).unwrap();
        assert_eq!(revisions.len(), 2);
        assert_eq!(revisions[0].number, 0);
        assert_eq!(revisions[0].id, 39167223);
        assert_eq!(revisions[0].user, "anqxyr");
        assert_eq!(
            crate::models::format_time(&revisions[0].time),
            "2013-06-30 16:34:37"
        );
        assert_eq!(revisions[1].comment.as_deref(), Some("fix typo"));
    }

    #[test]
    fn test_votes() {
        let body = r#"<div>
            <span class="printuser"><a>Alpha</a></span>&nbsp;<span style="color:#777">+</span><br/>
            <span class="printuser"><a>Beta</a></span>&nbsp;<span style="color:#777">-</span><br/>
            <span class="printuser"><a>Alpha</a></span>&nbsp;<span style="color:#777">-</span><br/>
            </div>"#;
        let votes = votes(body).unwrap();
        assert_eq!(
            votes,
            vec![
                Vote { user: "Beta".into(), value: -1 },
                Vote { user: "Alpha".into(), value: -1 },
            ]
        );
    }

    #[test]
    fn test_posts_tree() {
        let body = r#"
            <div class="post-container" id="fpc-100">
              <div class="post" id="post-100">
                <div class="head"><div class="title">First</div>
                  <span class="printuser">FlameShirt</span>
                  <span class="odate time_1372610842">x</span></div>
                <div class="content"><p>hello</p></div>
              </div>
              <div class="post-container" id="fpc-101">
                <div class="post" id="post-101">
                  <div class="head"><div class="title"></div>
                    <span class="printuser">anqxyr</span>
                    <span class="odate time_1372611842">x</span></div>
                  <div class="content"><p>reply</p></div>
                </div>
              </div>
            </div>"#;
        let posts = posts(body).unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].id, 100);
        assert_eq!(posts[0].parent, None);
        assert_eq!(posts[0].title.as_deref(), Some("First"));
        assert_eq!(posts[0].content, "<p>hello</p>");
        assert_eq!(posts[1].parent, Some(100));
        assert_eq!(posts[1].title, None);
        assert_eq!(posts[1].user, "anqxyr");
    }

    #[test]
    fn test_list_items() {
        let body = r#"<div class="list-pages-item"><table>
            <tr><td>fullname</td><td>scp-173 </td></tr>
            <tr><td>rating</td><td>+1500</td></tr></table></div>"#;
        let items = list_items(body).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0]["fullname"], "scp-173");
        assert_eq!(items[0]["rating"], "+1500");
    }

    #[test]
    fn test_files() {
        let body = r#"<table class="page-files">
            <tr><th>name</th><th>type</th><th>size</th></tr>
            <tr><td><a href="/local--files/scp-173/173.jpg">173.jpg</a></td>
                <td><span title="image/jpeg">JPG image</span></td><td>25 kB</td></tr>
            </table>"#;
        let files = files(body, SITE).unwrap();
        assert_eq!(
            files,
            vec![PageFile {
                url: "http://www.scp-wiki.net/local--files/scp-173/173.jpg".into(),
                name: "173.jpg".into(),
                filetype: "JPG image".into(),
                size: "25 kB".into(),
            }]
        );
        assert!(super::files("<p>No files attached.</p>", SITE).unwrap().is_empty());
    }

    #[test]
    fn test_categories_and_threads() {
        let start = r#"<table>
            <tr><td class="name"><div class="title"><a href="/forum/c-12/general">General</a></div>
            <div class="description">Talk</div></td><td class="threads">3</td></tr></table>"#;
        let cats = categories(start).unwrap();
        assert_eq!(
            cats,
            vec![Category {
                id: 12,
                title: "General".into(),
                description: "Talk".into(),
                size: 3
            }]
        );

        let listing = r#"<table><tr><td class="name"><div class="title"><a href="/forum/t-99/hi">Hi</a></div>
            <div class="description"></div></td></tr></table>"#;
        let threads = threads(listing, 12).unwrap();
        assert_eq!(threads[0].id, 99);
        assert_eq!(threads[0].title.as_deref(), Some("Hi"));
        assert_eq!(threads[0].description, None);
        assert_eq!(threads[0].category_id, Some(12));
    }

    #[test]
    fn test_links() {
        let markup = r#"<div id="page-content">
            <a href="/scp-002">a</a><a href="/scp-002|">b</a>
            <a href="http://elsewhere.com/x">c</a><a href="/local--files/x.png">d</a>
            <a>no href</a><a href="/scp-003">e</a></div>"#;
        assert_eq!(
            links(markup, SITE).unwrap(),
            vec!["http://www.scp-wiki.net/scp-002", "http://www.scp-wiki.net/scp-003"]
        );
    }

    #[test]
    fn test_source_text() {
        let body = "<h1>Page source</h1><div class=\"page-source\">**bold**\u{a0}text</div>";
        assert_eq!(source_text(body).unwrap(), "**bold** text");
    }

    #[test]
    fn test_overrides() {
        let markup = r#"<table>
            <tr><th>page</th><th>user</th><th>type</th><th>date</th></tr>
            <tr><td>SCP-003</td><td>TheDeadlyMoose</td><td>rewrite</td><td>2014-01-01</td></tr>
            <tr><td>scp-010</td><td>Someone</td><td>author</td><td></td></tr>
            <tr><td>scp-020</td><td>Other</td><td>translator</td><td></td></tr></table>"#;
        let items = overrides(markup, SITE).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].url, "http://www.scp-wiki.net/scp-003");
        assert_eq!(items[0].kind, OverrideKind::Rewrite);
        assert_eq!(items[1].kind, OverrideKind::Author);
    }

    #[test]
    fn test_image_reviews() {
        let document = r#"<html><body><table>
            <tr><th>img</th></tr>
            <tr><td><img src="/local--files/a.jpg"/></td><td>x</td>
                <td><a href="http://flickr.com/a">src</a></td><td>BY-SA CC</td><td></td></tr>
            <tr><td><img src="http://x/b.jpg"/></td><td>x</td><td></td><td>WHO KNOWS</td><td>n</td></tr>
            </table></body></html>"#;
        let images = image_reviews(document, "http://scpsandbox2.wikidot.com/image-review-1").unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].url, "http://scpsandbox2.wikidot.com/local--files/a.jpg");
        assert_eq!(images[0].source.as_deref(), Some("http://flickr.com/a"));
        assert_eq!(images[0].status, ImageStatus::BySaCc);
        assert_eq!(images[0].notes, None);
    }

    #[test]
    fn test_title_entries() {
        let markup = r#"<ul>
            <li><a href="/scp-173">SCP-173</a> - The Sculpture</li>
            <li><a href="/scp-1000">SCP-1000</a>, Bigfoot</li>
            <li><a href="/scp-2000">SCP-2000</a> - [ACCESS DENIED]</li></ul>"#;
        let entries: HashMap<String, String> = title_entries(markup, SITE).unwrap().into_iter().collect();
        assert_eq!(entries["http://www.scp-wiki.net/scp-173"], "The Sculpture");
        assert_eq!(entries["http://www.scp-wiki.net/scp-1000"], "Bigfoot");
        assert!(!entries.contains_key("http://www.scp-wiki.net/scp-2000"));
    }
}
