pub mod item;

pub use item::{
    derive_status, Category, ItemId, ItemImage, ItemRecord, ItemUpdate, Location, StockItem,
    StockStatus,
};
