pub mod filter;
pub mod reports;
pub mod seed;

pub use filter::{filter_and_sort, InventoryQuery, Selection, SortKey};
pub use reports::{category_distribution, stock_alerts, summarize};
pub use seed::seed_items;
