//! `list_pages` filter grammar.
//!
//! Filters arrive as `key=value` pairs:
//!
//! ```text
//! tag=<name>  author=<name>  rating=<op><int>  created=<op><yyyy[-mm[-dd]]>
//! order=random|title  limit=<int>
//! ```
//!
//! where `<op>` is one of `>`, `<`, `>=`, `<=`, `=` or empty (equality).

use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use regex::Regex;

use crate::error::{AppError, Result};
use crate::models::{Override, OverrideKind};

/// Comparison operator of a filter expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
}

impl Operator {
    /// Split a leading operator off an expression.
    fn split(expression: &str) -> Result<(Operator, &str)> {
        let expression = expression.trim();
        let digits = expression
            .find(|c: char| c.is_ascii_digit() || c == '-')
            .unwrap_or(expression.len());
        let (symbol, rest) = expression.split_at(digits);
        let op = match symbol.trim() {
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Ge,
            "<=" => Operator::Le,
            "=" | "" => Operator::Eq,
            other => {
                return Err(AppError::invalid_filter(
                    expression,
                    format!("unknown operator '{other}'"),
                ));
            }
        };
        Ok((op, rest.trim()))
    }

    /// Whether `ordering` (of left against right) satisfies the operator.
    pub fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Operator::Gt => ordering == Ordering::Greater,
            Operator::Lt => ordering == Ordering::Less,
            Operator::Ge => ordering != Ordering::Less,
            Operator::Le => ordering != Ordering::Greater,
            Operator::Eq => ordering == Ordering::Equal,
        }
    }

    /// SQL spelling of the operator.
    pub fn sql(&self) -> &'static str {
        match self {
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Ge => ">=",
            Operator::Le => "<=",
            Operator::Eq => "=",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql())
    }
}

/// `rating=<op><int>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RatingFilter {
    pub op: Operator,
    pub value: i64,
}

impl RatingFilter {
    pub fn matches(&self, rating: i64) -> bool {
        self.op.accepts(rating.cmp(&self.value))
    }
}

impl FromStr for RatingFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let (op, rest) = Operator::split(s)?;
        let value = rest
            .parse()
            .map_err(|e| AppError::invalid_filter(s, format!("bad rating: {e}")))?;
        Ok(Self { op, value })
    }
}

/// A date with year, month or day granularity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartialDate {
    pub year: i32,
    pub month: Option<u32>,
    pub day: Option<u32>,
}

impl PartialDate {
    /// Zero-padded `YYYY[-MM[-DD]]` form, comparable against timestamp prefixes.
    pub fn prefix(&self) -> String {
        match (self.month, self.day) {
            (Some(m), Some(d)) => format!("{:04}-{:02}-{:02}", self.year, m, d),
            (Some(m), None) => format!("{:04}-{:02}", self.year, m),
            _ => format!("{:04}", self.year),
        }
    }
}

/// `created=<op><partial date>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedFilter {
    pub op: Operator,
    pub date: PartialDate,
}

impl CreatedFilter {
    /// Compare only as many leading date components as the filter names.
    pub fn matches(&self, created: &NaiveDateTime) -> bool {
        let prefix = self.date.prefix();
        let stamp = created.format("%Y-%m-%d").to_string();
        let head = &stamp[..prefix.len().min(stamp.len())];
        self.op.accepts(head.cmp(prefix.as_str()))
    }
}

impl FromStr for CreatedFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let (op, rest) = Operator::split(s)?;
        let pattern = Regex::new(r"^(\d{4})(?:[-./](\d{1,2}))?(?:[-./](\d{1,2}))?$")
            .map_err(|e| AppError::invalid_filter(s, e))?;
        let caps = pattern
            .captures(rest)
            .ok_or_else(|| AppError::invalid_filter(s, "expected YYYY[-MM[-DD]]"))?;
        let number = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());

        let year = caps[1]
            .parse()
            .map_err(|e| AppError::invalid_filter(s, format!("bad year: {e}")))?;
        let month = number(2);
        let day = number(3);
        if month.is_some_and(|m| !(1..=12).contains(&m)) {
            return Err(AppError::invalid_filter(s, "month out of range"));
        }
        if day.is_some_and(|d| !(1..=31).contains(&d)) {
            return Err(AppError::invalid_filter(s, "day out of range"));
        }

        Ok(Self {
            op,
            date: PartialDate { year, month, day },
        })
    }
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Order {
    Random,
    Title,
}

impl FromStr for Order {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "random" => Ok(Order::Random),
            "title" => Ok(Order::Title),
            other => Err(AppError::invalid_filter(other, "order must be random or title")),
        }
    }
}

/// Criteria for `list_pages`. Every present criterion must hold.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageFilter {
    pub tag: Option<String>,
    pub author: Option<String>,
    pub rating: Option<RatingFilter>,
    pub created: Option<CreatedFilter>,
    pub order: Option<Order>,
    pub limit: Option<usize>,
}

impl PageFilter {
    /// Parse a sequence of `key=value` pairs.
    pub fn parse<'a>(pairs: impl IntoIterator<Item = &'a str>) -> Result<Self> {
        let mut filter = PageFilter::default();
        for pair in pairs {
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| AppError::invalid_filter(pair, "expected key=value"))?;
            match key.trim() {
                "tag" => filter.tag = Some(value.trim().to_string()),
                "author" => filter.author = Some(value.trim().to_string()),
                "rating" => filter.rating = Some(value.parse()?),
                "created" => filter.created = Some(value.parse()?),
                "order" => filter.order = Some(value.parse()?),
                "limit" => {
                    filter.limit = Some(value.trim().parse().map_err(|e| {
                        AppError::invalid_filter(pair, format!("bad limit: {e}"))
                    })?)
                }
                other => {
                    return Err(AppError::invalid_filter(
                        pair,
                        format!("unknown key '{other}'"),
                    ));
                }
            }
        }
        Ok(filter)
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_rating(mut self, op: Operator, value: i64) -> Self {
        self.rating = Some(RatingFilter { op, value });
        self
    }

    /// Whether anything narrows the result besides the author.
    pub fn has_non_author_criteria(&self) -> bool {
        self.tag.is_some() || self.rating.is_some() || self.created.is_some()
    }
}

/// Pages credited to `author` once overrides are applied.
///
/// `authored` holds the pages whose revision 0 was made by the author. Pages
/// with an override naming the author are added; pages whose original
/// authorship was overridden to someone else are removed.
pub fn credited_urls(
    authored: impl IntoIterator<Item = String>,
    overrides: &[Override],
    author: &str,
) -> HashSet<String> {
    let mut include = HashSet::new();
    let mut exclude = HashSet::new();
    for item in overrides {
        if item.user == author {
            include.insert(item.url.clone());
        } else if item.kind == OverrideKind::Author {
            exclude.insert(item.url.clone());
        }
    }
    authored
        .into_iter()
        .filter(|url| !exclude.contains(url))
        .chain(include)
        .collect()
}
