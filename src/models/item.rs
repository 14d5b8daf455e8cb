//! Stock-keeping unit records and their derived stock status.
//!
//! A [`StockItem`] is the document stored under a collection in the item
//! store; an [`ItemRecord`] pairs it with the key the store assigned. The
//! stock status is never stored independently: it is recomputed through
//! [`derive_status`] whenever quantity or threshold change, and again when a
//! document is read back.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::errors::ServiceError;

/// Opaque key assigned by the item store on creation.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Product categories. Labels are the ones staff see and search on.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Category {
    #[serde(rename = "Roupas de Cama")]
    #[strum(to_string = "Roupas de Cama", serialize = "bed-linens")]
    BedLinens,
    #[serde(rename = "Toalhas")]
    #[strum(to_string = "Toalhas", serialize = "towels")]
    Towels,
    #[serde(rename = "Produtos de Higiene")]
    #[strum(to_string = "Produtos de Higiene", serialize = "hygiene")]
    HygieneProducts,
    #[serde(rename = "Amenities")]
    #[strum(to_string = "Amenities", serialize = "amenities")]
    Amenities,
    #[serde(rename = "Limpeza")]
    #[strum(to_string = "Limpeza", serialize = "cleaning")]
    Cleaning,
    #[serde(rename = "Decoração")]
    #[strum(to_string = "Decoração", serialize = "decoration")]
    Decoration,
    #[serde(rename = "Eletrônicos")]
    #[strum(to_string = "Eletrônicos", serialize = "electronics")]
    Electronics,
    #[serde(rename = "Outros")]
    #[strum(to_string = "Outros", serialize = "other")]
    Other,
}

impl Category {
    pub fn label(&self) -> &'static str {
        match self {
            Self::BedLinens => "Roupas de Cama",
            Self::Towels => "Toalhas",
            Self::HygieneProducts => "Produtos de Higiene",
            Self::Amenities => "Amenities",
            Self::Cleaning => "Limpeza",
            Self::Decoration => "Decoração",
            Self::Electronics => "Eletrônicos",
            Self::Other => "Outros",
        }
    }

    pub fn all() -> impl Iterator<Item = Category> {
        Category::iter()
    }
}

/// Storage areas items can be shelved in.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
pub enum Location {
    #[serde(rename = "Sala A1")]
    #[strum(to_string = "Sala A1", serialize = "a1")]
    RoomA1,
    #[serde(rename = "Sala A2")]
    #[strum(to_string = "Sala A2", serialize = "a2")]
    RoomA2,
    #[serde(rename = "Sala B1")]
    #[strum(to_string = "Sala B1", serialize = "b1")]
    RoomB1,
    #[serde(rename = "Sala B2")]
    #[strum(to_string = "Sala B2", serialize = "b2")]
    RoomB2,
    #[serde(rename = "Sala C1")]
    #[strum(to_string = "Sala C1", serialize = "c1")]
    RoomC1,
    #[serde(rename = "Sala C2")]
    #[strum(to_string = "Sala C2", serialize = "c2")]
    RoomC2,
    #[serde(rename = "Sala D1")]
    #[strum(to_string = "Sala D1", serialize = "d1")]
    RoomD1,
    #[serde(rename = "Sala D2")]
    #[strum(to_string = "Sala D2", serialize = "d2")]
    RoomD2,
    #[serde(rename = "Depósito Principal")]
    #[strum(to_string = "Depósito Principal", serialize = "main-depot")]
    MainDepot,
    #[serde(rename = "Depósito Secundário")]
    #[strum(to_string = "Depósito Secundário", serialize = "secondary-depot")]
    SecondaryDepot,
}

impl Location {
    pub fn label(&self) -> &'static str {
        match self {
            Self::RoomA1 => "Sala A1",
            Self::RoomA2 => "Sala A2",
            Self::RoomB1 => "Sala B1",
            Self::RoomB2 => "Sala B2",
            Self::RoomC1 => "Sala C1",
            Self::RoomC2 => "Sala C2",
            Self::RoomD1 => "Sala D1",
            Self::RoomD2 => "Sala D2",
            Self::MainDepot => "Depósito Principal",
            Self::SecondaryDepot => "Depósito Secundário",
        }
    }

    pub fn all() -> impl Iterator<Item = Location> {
        Location::iter()
    }
}

/// Stock health of an item.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StockStatus {
    Out,
    Low,
    Normal,
}

impl StockStatus {
    /// Sort rank: most urgent first.
    pub fn severity(&self) -> u8 {
        match self {
            Self::Out => 0,
            Self::Low => 1,
            Self::Normal => 2,
        }
    }
}

/// The single rule that decides stock health.
pub fn derive_status(quantity: u32, min_stock: u32) -> StockStatus {
    if quantity == 0 {
        StockStatus::Out
    } else if quantity <= min_stock {
        StockStatus::Low
    } else {
        StockStatus::Normal
    }
}

/// Item picture, either inlined as a `data:` URL or referenced remotely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum ItemImage {
    Inline { mime: String, base64: String },
    Url(String),
}

impl ItemImage {
    /// Encodes raw image bytes as an inline payload.
    pub fn inline(mime: &str, bytes: &[u8]) -> Self {
        Self::Inline {
            mime: mime.to_string(),
            base64: STANDARD.encode(bytes),
        }
    }

    /// Decoded bytes of an inline image; `None` for remote references.
    pub fn bytes(&self) -> Option<Result<Vec<u8>, ServiceError>> {
        match self {
            Self::Inline { base64, .. } => Some(
                STANDARD
                    .decode(base64)
                    .map_err(|e| ServiceError::InvalidInput(format!("bad image payload: {}", e))),
            ),
            Self::Url(_) => None,
        }
    }

    pub fn to_url(&self) -> String {
        match self {
            Self::Inline { mime, base64 } => format!("data:{};base64,{}", mime, base64),
            Self::Url(url) => url.clone(),
        }
    }
}

impl From<ItemImage> for String {
    fn from(image: ItemImage) -> Self {
        image.to_url()
    }
}

impl From<String> for ItemImage {
    fn from(value: String) -> Self {
        if let Some(rest) = value.strip_prefix("data:") {
            if let Some((mime, payload)) = rest.split_once(";base64,") {
                return Self::Inline {
                    mime: mime.to_string(),
                    base64: payload.to_string(),
                };
            }
        }
        Self::Url(value)
    }
}

/// One stock-keeping unit as stored in the item store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredItem")]
pub struct StockItem {
    pub name: String,
    pub category: Category,
    pub description: Option<String>,
    quantity: u32,
    min_stock: u32,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    pub location: Location,
    pub supplier: Option<String>,
    pub barcode: Option<String>,
    status: StockStatus,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub image: Option<ItemImage>,
}

/// Wire shape accepted when reading documents back. A stored `status` is
/// not read; it is rederived.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredItem {
    name: String,
    category: Category,
    #[serde(default)]
    description: Option<String>,
    quantity: u32,
    min_stock: u32,
    #[serde(with = "rust_decimal::serde::float")]
    price: Decimal,
    location: Location,
    #[serde(default)]
    supplier: Option<String>,
    #[serde(default)]
    barcode: Option<String>,
    created_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    #[serde(default)]
    image: Option<ItemImage>,
}

impl TryFrom<StoredItem> for StockItem {
    type Error = ServiceError;

    fn try_from(raw: StoredItem) -> Result<Self, Self::Error> {
        let mut item = StockItem::new(
            raw.name,
            raw.category,
            raw.location,
            raw.quantity,
            raw.min_stock,
            raw.price,
            raw.created_at,
        )?;
        item.description = non_blank(raw.description);
        item.supplier = non_blank(raw.supplier);
        item.barcode = non_blank(raw.barcode);
        item.image = raw.image;
        item.last_updated = raw.last_updated;
        Ok(item)
    }
}

/// Highest unit price an item may carry.
pub const MAX_PRICE: Decimal = dec!(1000000000);

fn check_price(price: Decimal) -> Result<(), ServiceError> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(ServiceError::ValidationError(format!(
            "price must not be negative, got {}",
            price
        )));
    }
    if price > MAX_PRICE {
        return Err(ServiceError::ValidationError(format!(
            "price must be at most {}, got {}",
            MAX_PRICE, price
        )));
    }
    Ok(())
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl StockItem {
    /// Builds a new item stamped with `now` as both creation and update time.
    pub fn new(
        name: impl Into<String>,
        category: Category,
        location: Location,
        quantity: u32,
        min_stock: u32,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Result<Self, ServiceError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ServiceError::ValidationError("name must not be empty".into()));
        }
        check_price(price)?;

        Ok(Self::assemble(name, category, location, quantity, min_stock, price, now))
    }

    /// Builds an item from values already known to be valid.
    pub(crate) fn assemble(
        name: String,
        category: Category,
        location: Location,
        quantity: u32,
        min_stock: u32,
        price: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            name,
            category,
            description: None,
            quantity,
            min_stock,
            price,
            location,
            supplier: None,
            barcode: None,
            status: derive_status(quantity, min_stock),
            created_at: now,
            last_updated: now,
            image: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = non_blank(Some(description.into()));
        self
    }

    pub fn with_supplier(mut self, supplier: impl Into<String>) -> Self {
        self.supplier = non_blank(Some(supplier.into()));
        self
    }

    pub fn with_barcode(mut self, barcode: impl Into<String>) -> Self {
        self.barcode = non_blank(Some(barcode.into()));
        self
    }

    pub fn with_image(mut self, image: ItemImage) -> Self {
        self.image = Some(image);
        self
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn min_stock(&self) -> u32 {
        self.min_stock
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    pub fn status(&self) -> StockStatus {
        self.status
    }

    /// Value of the units on hand, saturating at `Decimal::MAX`.
    pub fn stock_value(&self) -> Decimal {
        self.price.saturating_mul(Decimal::from(self.quantity))
    }

    /// Gauge shown next to each item: quantity against twice the reorder
    /// threshold, clamped to 0..=100. Display only.
    pub fn fill_percentage(&self) -> u8 {
        if self.min_stock == 0 {
            return if self.quantity > 0 { 100 } else { 0 };
        }
        let ratio = Decimal::from(self.quantity) / Decimal::from(u64::from(self.min_stock) * 2);
        let pct = (ratio * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
            .min(Decimal::ONE_HUNDRED);
        pct.to_u8().unwrap_or(100)
    }

    /// Applies an edit and recomputes the derived status. Returns the status
    /// the item had before the edit.
    pub fn apply_update(
        &mut self,
        update: ItemUpdate,
        now: DateTime<Utc>,
    ) -> Result<StockStatus, ServiceError> {
        if let Some(name) = &update.name {
            if name.trim().is_empty() {
                return Err(ServiceError::ValidationError("name must not be empty".into()));
            }
        }
        if let Some(price) = update.price {
            check_price(price)?;
        }

        let previous = self.status;
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(location) = update.location {
            self.location = location;
        }
        if let Some(price) = update.price {
            self.price = price;
        }
        if let Some(description) = update.description {
            self.description = non_blank(Some(description));
        }
        if let Some(supplier) = update.supplier {
            self.supplier = non_blank(Some(supplier));
        }
        if let Some(barcode) = update.barcode {
            self.barcode = non_blank(Some(barcode));
        }
        self.set_stock_levels(
            update.quantity.unwrap_or(self.quantity),
            update.min_stock.unwrap_or(self.min_stock),
        );
        self.last_updated = now;
        Ok(previous)
    }

    fn set_stock_levels(&mut self, quantity: u32, min_stock: u32) {
        self.quantity = quantity;
        self.min_stock = min_stock;
        self.status = derive_status(quantity, min_stock);
    }
}

/// Partial edit of an item. Blank optional text clears the field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemUpdate {
    pub name: Option<String>,
    pub category: Option<Category>,
    pub description: Option<String>,
    pub quantity: Option<u32>,
    pub min_stock: Option<u32>,
    pub price: Option<Decimal>,
    pub location: Option<Location>,
    pub supplier: Option<String>,
    pub barcode: Option<String>,
}

/// A stored item together with its key.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemRecord {
    pub id: ItemId,
    #[serde(flatten)]
    pub item: StockItem,
}

impl ItemRecord {
    pub fn new(id: impl Into<ItemId>, item: StockItem) -> Self {
        Self {
            id: id.into(),
            item,
        }
    }

    pub fn apply_update(
        &mut self,
        update: ItemUpdate,
        now: DateTime<Utc>,
    ) -> Result<StockStatus, ServiceError> {
        self.item.apply_update(update, now)
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}
