// src/lib.rs

//! wikimirror library
//!
//! Mirrors a Wikidot-hosted wiki into a local SQLite capture and exposes the
//! same page and forum model over either the live site or the capture.

pub mod error;
pub mod models;
pub mod orm;
pub mod pipeline;
pub mod source;
pub mod storage;
pub mod utils;
pub mod wikidot;

pub use error::{AppError, Result};
pub use orm::{ForumThread, Page, Wiki};
pub use source::{LiveSource, LocalSource, Source};
