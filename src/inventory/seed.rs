//! Fixed catalogue the inventory view shows when no live store is read.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::models::item::{Category, ItemRecord, Location, StockItem};

const JAN_1_2024: i64 = 1_704_067_200;
const DAY: i64 = 86_400;

fn january_2024(day: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(JAN_1_2024 + (day - 1) * DAY, 0).unwrap_or_default()
}

/// (id, name, category, quantity, min stock, price in cents, location, day of Jan 2024)
const SEED: [(&str, &str, Category, u32, u32, i64, Location, i64); 6] = [
    ("1", "Toalhas de Banho Premium", Category::Towels, 150, 50, 4590, Location::RoomA1, 15),
    ("2", "Lençóis Queen Size", Category::BedLinens, 25, 30, 8990, Location::RoomB2, 14),
    ("3", "Sabonete Líquido", Category::HygieneProducts, 0, 20, 1250, Location::RoomC1, 13),
    ("4", "Shampoo Condicionador", Category::HygieneProducts, 8, 15, 1890, Location::RoomC1, 12),
    ("5", "Travesseiros Ortopédicos", Category::BedLinens, 80, 20, 6500, Location::RoomB1, 11),
    ("6", "Kit Amenities Luxo", Category::Amenities, 200, 50, 2590, Location::RoomD1, 10),
];

/// The six demo items, statuses derived from their stock levels.
pub fn seed_items() -> Vec<ItemRecord> {
    SEED.iter()
        .map(|&(id, name, category, quantity, min_stock, cents, location, day)| {
            let item = StockItem::assemble(
                name.to_string(),
                category,
                location,
                quantity,
                min_stock,
                Decimal::new(cents, 2),
                january_2024(day),
            );
            ItemRecord::new(id, item)
        })
        .collect()
}
