// src/models/mod.rs

//! Domain models for the mirror.
//!
//! This module contains the configuration, the record shapes shared by both
//! source backends, and the `list_pages` filter grammar.

mod config;
mod filter;
mod records;

// Re-export all public types
pub use config::{
    CaptureConfig, Config, CrawlerConfig, ImageReviewConfig, LoggingConfig, StoreConfig,
};
pub use filter::{
    CreatedFilter, Operator, Order, PageFilter, PartialDate, RatingFilter, credited_urls,
};
pub use records::{
    Category, DELETED_ACCOUNT, Image, ImageStatus, Override, OverrideKind, PageFile, Post,
    Revision, TIME_FORMAT, ThreadInfo, Vote, dedupe_votes, format_time, parse_time,
};
