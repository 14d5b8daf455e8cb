//! Raw values of the "add item" form and their validation.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use strum::{Display, EnumString};
use validator::Validate;

use crate::models::item::{Category, ItemImage, Location, StockItem, MAX_PRICE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FormField {
    Name,
    Category,
    Description,
    Quantity,
    MinStock,
    Price,
    Location,
    Supplier,
    Barcode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldProblem {
    Missing,
    NotANumber { input: String },
    Negative,
    TooLarge { max: Decimal },
    TooLong { max: u64 },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: FormField,
    pub problem: FieldProblem,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            FieldProblem::Missing => write!(f, "{} is required", self.field),
            FieldProblem::NotANumber { input } => {
                write!(f, "{} is not a valid number: '{}'", self.field, input)
            }
            FieldProblem::Negative => write!(f, "{} must not be negative", self.field),
            FieldProblem::TooLarge { max } => write!(f, "{} must be at most {}", self.field, max),
            FieldProblem::TooLong { max } => {
                write!(f, "{} must be at most {} characters", self.field, max)
            }
        }
    }
}

/// Every problem found in a form.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct FormErrors(pub Vec<FieldError>);

impl FormErrors {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: FormField) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    pub fn problem(&self, field: FormField) -> Option<&FieldProblem> {
        self.0.iter().find(|e| e.field == field).map(|e| &e.problem)
    }

    fn push(&mut self, field: FormField, problem: FieldProblem) {
        self.0.push(FieldError { field, problem });
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        f.write_str(&messages.join("; "))
    }
}

impl std::error::Error for FormErrors {}

/// What staff typed. Numbers stay as text until validation.
#[derive(Debug, Clone, Default, PartialEq, Validate, Serialize, Deserialize)]
pub struct ItemForm {
    #[validate(length(max = 200))]
    pub name: String,
    pub category: Option<Category>,
    #[validate(length(max = 2000))]
    pub description: String,
    pub quantity: String,
    pub min_stock: String,
    pub price: String,
    pub location: Option<Location>,
    #[validate(length(max = 200))]
    pub supplier: String,
    #[validate(length(max = 64))]
    pub barcode: String,
    #[serde(skip)]
    pub image: Option<ItemImage>,
}

/// A form that passed validation, with numbers parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidForm {
    name: String,
    category: Category,
    location: Location,
    quantity: u32,
    min_stock: u32,
    price: Decimal,
    description: String,
    supplier: String,
    barcode: String,
    image: Option<ItemImage>,
}

impl ValidForm {
    /// The record to submit, status derived and both timestamps set to `now`.
    pub fn to_stock_item(&self, now: DateTime<Utc>) -> StockItem {
        let mut item = StockItem::assemble(
            self.name.clone(),
            self.category,
            self.location,
            self.quantity,
            self.min_stock,
            self.price,
            now,
        )
        .with_description(self.description.clone())
        .with_supplier(self.supplier.clone())
        .with_barcode(self.barcode.clone());
        if let Some(image) = &self.image {
            item = item.with_image(image.clone());
        }
        item
    }
}

impl ItemForm {
    pub fn attach_image(&mut self, mime: &str, bytes: &[u8]) {
        self.image = Some(ItemImage::inline(mime, bytes));
    }

    pub fn attach_image_url(&mut self, url: impl Into<String>) {
        self.image = Some(ItemImage::Url(url.into()));
    }

    /// Resets every field to empty.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// True when every required field is filled in and parses.
    pub fn is_complete(&self) -> bool {
        self.check().is_ok()
    }

    /// Checks required fields, parses numbers and applies length limits.
    pub fn check(&self) -> Result<ValidForm, FormErrors> {
        let mut errors = FormErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FormField::Name, FieldProblem::Missing);
        }
        if self.category.is_none() {
            errors.push(FormField::Category, FieldProblem::Missing);
        }
        let quantity = parse_count(&self.quantity, FormField::Quantity, &mut errors);
        let min_stock = parse_count(&self.min_stock, FormField::MinStock, &mut errors);
        let price = parse_price(&self.price, &mut errors);
        if self.location.is_none() {
            errors.push(FormField::Location, FieldProblem::Missing);
        }

        if let Err(length_errors) = self.validate() {
            for (field, problems) in length_errors.field_errors() {
                let max = problems
                    .iter()
                    .find_map(|p| p.params.get("max").and_then(|v| v.as_u64()))
                    .unwrap_or_default();
                if let Ok(field) = FormField::from_str(field) {
                    errors.push(field, FieldProblem::TooLong { max });
                }
            }
        }

        match (self.category, self.location, quantity, min_stock, price) {
            (Some(category), Some(location), Some(quantity), Some(min_stock), Some(price))
                if errors.is_empty() =>
            {
                Ok(ValidForm {
                    name: name.to_string(),
                    category,
                    location,
                    quantity,
                    min_stock,
                    price,
                    description: self.description.clone(),
                    supplier: self.supplier.clone(),
                    barcode: self.barcode.clone(),
                    image: self.image.clone(),
                })
            }
            _ => Err(errors),
        }
    }
}

fn parse_count(input: &str, field: FormField, errors: &mut FormErrors) -> Option<u32> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        errors.push(field, FieldProblem::Missing);
        return None;
    }
    match trimmed.parse::<i64>() {
        Ok(value) if value < 0 => {
            errors.push(field, FieldProblem::Negative);
            None
        }
        Ok(value) => match u32::try_from(value) {
            Ok(count) => Some(count),
            Err(_) => {
                errors.push(
                    field,
                    FieldProblem::NotANumber {
                        input: trimmed.to_string(),
                    },
                );
                None
            }
        },
        Err(_) => {
            errors.push(
                field,
                FieldProblem::NotANumber {
                    input: trimmed.to_string(),
                },
            );
            None
        }
    }
}

fn parse_price(input: &str, errors: &mut FormErrors) -> Option<Decimal> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        errors.push(FormField::Price, FieldProblem::Missing);
        return None;
    }
    match Decimal::from_str(trimmed) {
        Ok(price) if price.is_sign_negative() && !price.is_zero() => {
            errors.push(FormField::Price, FieldProblem::Negative);
            None
        }
        Ok(price) if price > MAX_PRICE => {
            errors.push(FormField::Price, FieldProblem::TooLarge { max: MAX_PRICE });
            None
        }
        Ok(price) => Some(price),
        Err(_) => {
            errors.push(
                FormField::Price,
                FieldProblem::NotANumber {
                    input: trimmed.to_string(),
                },
            );
            None
        }
    }
}
