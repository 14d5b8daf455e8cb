//! Filtered and sorted projections of an item collection.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString};
use tracing::debug;
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

use crate::errors::ServiceError;
use crate::models::item::{Category, ItemRecord, StockStatus};

/// Either every value or one specific value of a vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection<T> {
    All,
    Only(T),
}

impl<T> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: PartialEq> Selection<T> {
    pub fn admits(&self, value: &T) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}

impl<T: FromStr> FromStr for Selection<T> {
    type Err = ServiceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        trimmed
            .parse::<T>()
            .map(Self::Only)
            .map_err(|_| ServiceError::InvalidInput(format!("unknown filter value '{}'", s)))
    }
}

impl<T: fmt::Display> fmt::Display for Selection<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::Only(value) => value.fmt(f),
        }
    }
}

/// Ordering applied after filtering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortKey {
    /// Ascending, accent- and case-insensitive.
    #[default]
    Name,
    /// Largest stock first.
    Quantity,
    /// Most expensive first.
    Price,
    /// Out of stock first, then low, then normal.
    Status,
}

/// The four independent criteria of an inventory view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InventoryQuery {
    pub text: String,
    pub category: Selection<Category>,
    pub status: Selection<StockStatus>,
    pub sort: SortKey,
}

impl InventoryQuery {
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    pub fn with_category(mut self, category: Selection<Category>) -> Self {
        self.category = category;
        self
    }

    pub fn with_status(mut self, status: Selection<StockStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }
}

/// Derives the displayed list from `items`. The source is never modified;
/// items with equal sort keys keep their input order.
pub fn filter_and_sort<'a>(items: &'a [ItemRecord], query: &InventoryQuery) -> Vec<&'a ItemRecord> {
    let needle = query.text.to_lowercase();

    let mut visible: Vec<&ItemRecord> = items
        .iter()
        .filter(|record| needle.is_empty() || matches_text(record, &needle))
        .filter(|record| query.category.admits(&record.item.category))
        .filter(|record| query.status.admits(&record.item.status()))
        .collect();

    // sort_by is stable
    match query.sort {
        SortKey::Name => visible.sort_by(|a, b| collate(&a.item.name, &b.item.name)),
        SortKey::Quantity => visible.sort_by(|a, b| b.item.quantity().cmp(&a.item.quantity())),
        SortKey::Price => visible.sort_by(|a, b| b.item.price().cmp(&a.item.price())),
        SortKey::Status => visible.sort_by_key(|record| record.item.status().severity()),
    }

    debug!(
        total = items.len(),
        shown = visible.len(),
        sort = %query.sort,
        "inventory view recomputed"
    );
    visible
}

fn matches_text(record: &ItemRecord, needle: &str) -> bool {
    let item = &record.item;
    item.name.to_lowercase().contains(needle)
        || item.category.label().to_lowercase().contains(needle)
        || item.location.label().to_lowercase().contains(needle)
}

/// Dictionary-style comparison: letters first compare without accents or
/// case, then accents break ties, then case with lowercase first.
pub fn collate(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| secondary_key(a).cmp(&secondary_key(b)))
        .then_with(|| tertiary_key(a).cmp(&tertiary_key(b)))
        .then_with(|| a.cmp(b))
}

fn primary_key(s: &str) -> String {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

fn secondary_key(s: &str) -> String {
    s.nfd().flat_map(char::to_lowercase).collect()
}

/// Case-inverted, so lowercase sorts ahead of uppercase.
fn tertiary_key(s: &str) -> String {
    s.nfd()
        .flat_map(|c| {
            if c.is_uppercase() {
                c.to_lowercase().collect::<Vec<_>>()
            } else {
                c.to_uppercase().collect::<Vec<_>>()
            }
        })
        .collect()
}
