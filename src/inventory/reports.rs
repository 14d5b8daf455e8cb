//! Aggregates shown on the dashboard and report pages.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashMap;

use crate::inventory::filter::collate;
use crate::models::item::{Category, ItemId, ItemRecord, StockStatus};

/// Headline numbers for a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventorySummary {
    pub total_items: usize,
    pub low_stock: usize,
    pub out_of_stock: usize,
    pub total_value: Decimal,
}

pub fn summarize(items: &[ItemRecord]) -> InventorySummary {
    let mut summary = InventorySummary {
        total_items: items.len(),
        low_stock: 0,
        out_of_stock: 0,
        total_value: Decimal::ZERO,
    };

    for record in items {
        match record.item.status() {
            StockStatus::Low => summary.low_stock += 1,
            StockStatus::Out => summary.out_of_stock += 1,
            StockStatus::Normal => {}
        }
        summary.total_value = summary.total_value.saturating_add(record.item.stock_value());
    }

    summary
}

/// One slice of the category breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryShare {
    pub category: Category,
    pub items: usize,
    pub units: u64,
    /// Share of items in the collection, in percent, two decimals.
    pub percent: Decimal,
}

/// Item counts per category present in the collection, largest first.
pub fn category_distribution(items: &[ItemRecord]) -> Vec<CategoryShare> {
    if items.is_empty() {
        return Vec::new();
    }

    let mut counts: HashMap<Category, (usize, u64)> = HashMap::new();
    for record in items {
        let entry = counts.entry(record.item.category).or_default();
        entry.0 += 1;
        entry.1 += u64::from(record.item.quantity());
    }

    let total = Decimal::from(items.len());
    let mut shares: Vec<CategoryShare> = counts
        .into_iter()
        .map(|(category, (count, units))| CategoryShare {
            category,
            items: count,
            units,
            percent: (Decimal::from(count) * Decimal::ONE_HUNDRED / total)
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        })
        .collect();

    shares.sort_by(|a, b| {
        b.items
            .cmp(&a.items)
            .then_with(|| collate(a.category.label(), b.category.label()))
    });
    shares
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Critical,
    Warning,
}

/// An item that needs restocking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockAlert {
    pub id: ItemId,
    pub item: String,
    pub current: u32,
    pub min: u32,
    pub severity: AlertSeverity,
}

/// Items that are out of stock or at/below their threshold, out of stock first.
pub fn stock_alerts(items: &[ItemRecord]) -> Vec<StockAlert> {
    let mut flagged: Vec<&ItemRecord> = items
        .iter()
        .filter(|record| record.item.status() != StockStatus::Normal)
        .collect();
    flagged.sort_by_key(|record| record.item.status().severity());

    flagged
        .into_iter()
        .map(|record| StockAlert {
            id: record.id.clone(),
            item: record.item.name.clone(),
            current: record.item.quantity(),
            min: record.item.min_stock(),
            severity: match record.item.status() {
                StockStatus::Out => AlertSeverity::Critical,
                _ => AlertSeverity::Warning,
            },
        })
        .collect()
}
