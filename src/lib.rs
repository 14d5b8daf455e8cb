//! Stockroom library
//!
//! Item records with derived stock status, filtered inventory views, summary
//! reports and the item submission workflow, persisted through an
//! [`store::ItemStore`].
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod errors;
pub mod inventory;
pub mod models;
pub mod shell;
pub mod store;
pub mod submission;

pub use errors::ServiceError;
pub use models::item::{ItemId, ItemRecord, StockItem, StockStatus};
