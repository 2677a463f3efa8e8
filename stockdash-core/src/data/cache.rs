//! Session-scoped memoization of fetches.
//!
//! Owned by the caller's session and passed into [`PriceFeed::fetch`](super::PriceFeed::fetch),
//! so every test can start from a fresh, isolated cache. Entries live until the
//! cache is dropped or cleared; there is no expiry.

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

use super::feed::FetchOutcome;
use crate::domain::Symbol;

/// Exact-equality key for a fetch: the requested symbol set and date range.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchKey {
    pub symbols: BTreeSet<Symbol>,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FetchKey {
    pub fn new<'a>(
        symbols: impl IntoIterator<Item = &'a Symbol>,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Self {
        Self {
            symbols: symbols.into_iter().cloned().collect(),
            start,
            end,
        }
    }
}

#[derive(Debug, Default)]
pub struct FetchCache {
    entries: HashMap<FetchKey, FetchOutcome>,
    hits: u64,
    misses: u64,
}

impl FetchCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a previous outcome, counting the hit or miss.
    pub fn get(&mut self, key: &FetchKey) -> Option<&FetchOutcome> {
        match self.entries.get(key) {
            Some(outcome) => {
                self.hits += 1;
                Some(outcome)
            }
            None => {
                self.misses += 1;
                None
            }
        }
    }

    pub fn insert(&mut self, key: FetchKey, outcome: FetchOutcome) {
        self.entries.insert(key, outcome);
    }

    pub fn contains(&self, key: &FetchKey) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
