//! Record shapes returned by every source backend.
//!
//! The live and local backends both produce exactly these values, so code
//! built on top of them cannot tell where the data came from.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Timestamp format used on the wire and in the store.
pub const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// User name the wiki shows for removed accounts.
pub const DELETED_ACCOUNT: &str = "(account deleted)";

/// One entry of a page's revision history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Revision {
    pub id: i64,
    /// Sequential revision number, 0 for page creation
    pub number: u32,
    pub user: String,
    pub time: NaiveDateTime,
    pub comment: Option<String>,
}

/// A single rating vote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub user: String,
    /// +1 or -1
    pub value: i32,
}

/// A file attached to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageFile {
    pub url: String,
    pub name: String,
    /// Type as the wiki describes it, e.g. `image/png`
    pub filetype: String,
    /// Human-readable size, e.g. `25 kB`
    pub size: String,
}

/// A forum post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub title: Option<String>,
    pub content: String,
    pub user: String,
    pub time: NaiveDateTime,
    /// Post this one replies to, within the same thread
    pub parent: Option<i64>,
}

/// A forum category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub title: String,
    pub description: String,
    /// Number of threads in the category
    pub size: u32,
}

/// Header data of a forum thread.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreadInfo {
    pub id: i64,
    pub title: Option<String>,
    pub description: Option<String>,
    /// None for per-page discussion threads
    pub category_id: Option<i64>,
}

/// Kind of an author override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverrideKind {
    /// Replaces the revision-0 user as the page's original author
    Author,
    /// Credits a rewrite on top of the original author
    Rewrite,
}

impl OverrideKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OverrideKind::Author => "author",
            OverrideKind::Rewrite => "rewrite",
        }
    }
}

impl FromStr for OverrideKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "author" => Ok(OverrideKind::Author),
            "rewrite" => Ok(OverrideKind::Rewrite),
            other => Err(format!("unknown override kind '{other}'")),
        }
    }
}

impl fmt::Display for OverrideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Manual correction of a page's authorship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    /// Canonical page URL
    pub url: String,
    pub user: String,
    pub kind: OverrideKind,
}

/// License review outcome of an image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ImageStatus {
    PermissionGranted,
    ByNcSaCc,
    BySaCc,
    PublicDomain,
    SourceUnknown,
    AwaitingReplacement,
    Replaced,
    PermanentlyRemoved,
}

impl ImageStatus {
    pub const ALL: [ImageStatus; 8] = [
        ImageStatus::PermissionGranted,
        ImageStatus::ByNcSaCc,
        ImageStatus::BySaCc,
        ImageStatus::PublicDomain,
        ImageStatus::SourceUnknown,
        ImageStatus::AwaitingReplacement,
        ImageStatus::Replaced,
        ImageStatus::PermanentlyRemoved,
    ];

    /// Label used on the review pages and in the store.
    pub fn label(&self) -> &'static str {
        match self {
            ImageStatus::PermissionGranted => "PERMISSION GRANTED",
            ImageStatus::ByNcSaCc => "BY-NC-SA CC",
            ImageStatus::BySaCc => "BY-SA CC",
            ImageStatus::PublicDomain => "PUBLIC DOMAIN",
            ImageStatus::SourceUnknown => "SOURCE UNKNOWN",
            ImageStatus::AwaitingReplacement => "AWAITING REPLACEMENT",
            ImageStatus::Replaced => "REPLACED",
            ImageStatus::PermanentlyRemoved => "PERMANENTLY REMOVED",
        }
    }

    /// Whether the image may be redistributed.
    pub fn is_licensed(&self) -> bool {
        matches!(
            self,
            ImageStatus::PermissionGranted
                | ImageStatus::ByNcSaCc
                | ImageStatus::BySaCc
                | ImageStatus::PublicDomain
        )
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for ImageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// An image with its provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub url: String,
    /// Where the license was confirmed
    pub source: Option<String>,
    pub status: ImageStatus,
    pub notes: Option<String>,
    /// Image bytes, absent until downloaded
    #[serde(skip)]
    pub data: Option<Vec<u8>>,
}

/// Parse a stored timestamp.
pub fn parse_time(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text.trim(), TIME_FORMAT).ok()
}

/// Format a timestamp the way the store keeps it.
pub fn format_time(time: &NaiveDateTime) -> String {
    time.format(TIME_FORMAT).to_string()
}

/// Drop repeated votes by the same user, keeping the last one cast.
pub fn dedupe_votes(votes: Vec<Vote>) -> Vec<Vote> {
    let mut kept: Vec<Vote> = Vec::with_capacity(votes.len());
    for vote in votes {
        kept.retain(|v| v.user != vote.user);
        kept.push(vote);
    }
    kept
}
