use crate::error::ValidationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog item with a derived discount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Server-assigned identifier
    pub id: Uuid,

    pub name: String,

    /// Current selling price
    pub price: f64,

    /// Price before discount (0 when the item was never discounted)
    pub original_price: f64,

    /// Whole-number percentage `price` is reduced from `original_price`
    pub discount_percent: i64,

    /// When the item was created (never changes afterwards)
    pub created_at: DateTime<Utc>,
}

/// Request body for creating an item
///
/// Every field is optional at the wire level so that presence can be checked
/// by `Item::new` instead of failing deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewItem {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub original_price: Option<f64>,
}

impl Item {
    /// Validate a create request and derive the stored record
    pub fn new(input: NewItem) -> Result<Self, ValidationError> {
        let (name, price) = match (input.name, input.price) {
            (Some(name), Some(price)) if !name.is_empty() => (name, price),
            _ => return Err(ValidationError::new("name and price required")),
        };
        let original_price = input.original_price.unwrap_or(0.0);

        Ok(Self {
            id: Uuid::new_v4(),
            name,
            price,
            original_price,
            discount_percent: discount_percent(price, original_price),
            created_at: Utc::now(),
        })
    }
}

/// Percentage `price` is reduced from `original_price`, rounded half-up
///
/// Returns 0 unless `original_price` is positive. A price above the original
/// yields a negative percentage.
pub fn discount_percent(price: f64, original_price: f64) -> i64 {
    if original_price > 0.0 {
        round_half_up((1.0 - price / original_price) * 100.0) as i64
    } else {
        0
    }
}

/// Nearest integer, ties towards positive infinity (`-2.5` becomes `-2`)
///
/// Compares the fractional part instead of computing `floor(x + 0.5)`, which
/// rounds `0.49999999999999994` up because the addition itself rounds.
fn round_half_up(x: f64) -> f64 {
    let floor = x.floor();
    if x - floor >= 0.5 {
        floor + 1.0
    } else {
        floor
    }
}
