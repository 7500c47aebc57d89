// src/orm/cache.rs

//! Per-entity property cache with named invalidation sets.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::error::Result;

/// Cached properties of a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Id,
    ThreadId,
    Markup,
    Source,
    History,
    Votes,
    Tags,
    Files,
}

/// Fields stale after an edit.
pub const EDIT: &[Field] = &[Field::Markup, Field::History, Field::Source];

/// Fields stale after a revert.
pub const REVERT: &[Field] = &[Field::Markup, Field::History, Field::Source, Field::Tags];

/// Fields stale after the tags change.
pub const SET_TAGS: &[Field] = &[Field::Markup, Field::History, Field::Tags];

/// Fields stale after a vote.
pub const VOTE: &[Field] = &[Field::Votes];

type Value = Arc<dyn Any + Send + Sync>;

/// Values computed once and kept until a mutation invalidates them.
#[derive(Default)]
pub struct PropertyCache {
    values: Mutex<HashMap<Field, Value>>,
}

impl std::fmt::Debug for PropertyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut fields: Vec<Field> = self.lock().keys().copied().collect();
        fields.sort_by_key(|field| *field as u8);
        f.debug_struct("PropertyCache").field("cached", &fields).finish()
    }
}

impl PropertyCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Field, Value>> {
        self.values.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The cached value of `field`, if present and of type `T`.
    pub fn get<T: Any + Send + Sync>(&self, field: Field) -> Option<Arc<T>> {
        let value = self.lock().get(&field).cloned()?;
        value.downcast::<T>().ok()
    }

    pub fn insert<T: Any + Send + Sync>(&self, field: Field, value: T) -> Arc<T> {
        let value = Arc::new(value);
        self.lock().insert(field, value.clone());
        value
    }

    pub fn contains(&self, field: Field) -> bool {
        self.lock().contains_key(&field)
    }

    /// Drop every field of `fields`.
    pub fn invalidate(&self, fields: &[Field]) {
        let mut values = self.lock();
        for field in fields {
            values.remove(field);
        }
    }

    /// The cached value of `field`, computing it with `fetch` on a miss.
    ///
    /// A failed fetch caches nothing.
    pub async fn get_or_fetch<T, F, Fut>(&self, field: Field, fetch: F) -> Result<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.get::<T>(field) {
            return Ok(value);
        }
        let value = fetch().await?;
        Ok(self.insert(field, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    #[tokio::test]
    async fn test_fetch_once() {
        let cache = PropertyCache::new();
        let mut calls = 0;
        for _ in 0..3 {
            let value = cache
                .get_or_fetch(Field::Markup, || {
                    calls += 1;
                    async { Ok("<p>hi</p>".to_string()) }
                })
                .await
                .unwrap();
            assert_eq!(value.as_str(), "<p>hi</p>");
        }
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_failed_fetch_is_not_cached() {
        let cache = PropertyCache::new();
        let result: Result<Arc<i64>> = cache
            .get_or_fetch(Field::Id, || async { Err(AppError::not_found("page")) })
            .await;
        assert!(result.is_err());
        assert!(!cache.contains(Field::Id));
    }

    #[test]
    fn test_edit_keeps_votes_and_tags() {
        let cache = PropertyCache::new();
        for field in [Field::Markup, Field::History, Field::Source, Field::Votes, Field::Tags] {
            cache.insert(field, 0u8);
        }
        cache.invalidate(EDIT);
        assert!(!cache.contains(Field::Markup));
        assert!(!cache.contains(Field::History));
        assert!(!cache.contains(Field::Source));
        assert!(cache.contains(Field::Votes));
        assert!(cache.contains(Field::Tags));
    }

    #[test]
    fn test_vote_only_drops_votes() {
        let cache = PropertyCache::new();
        cache.insert(Field::Votes, 0u8);
        cache.insert(Field::Markup, 0u8);
        cache.invalidate(VOTE);
        assert!(!cache.contains(Field::Votes));
        assert!(cache.contains(Field::Markup));
    }

    #[test]
    fn test_wrong_type_is_a_miss() {
        let cache = PropertyCache::new();
        cache.insert(Field::Id, 7i64);
        assert_eq!(cache.get::<i64>(Field::Id).as_deref(), Some(&7));
        assert!(cache.get::<String>(Field::Id).is_none());
    }
}
