//! Domain models shared across the engine
//!
//! Identity is structural throughout: a cart line is identified by its
//! `(name, price, size)` triple and a variant selection by its
//! `(size, price, product_id)` triple. Both are explicit key types so the
//! uniqueness invariants can be enforced (and tested) in one place.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A priced size option of a product (e.g. small / medium / large)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Variant {
    pub size: String,
    pub price: Decimal,
}

/// Product entity as served by the catalog
///
/// Immutable once cached for the duration of a session; the whole list is
/// replaced on a successful remote refresh.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    /// Missing category on the wire collapses to "Others"
    #[serde(default = "default_category")]
    pub category: String,
    /// Base price; variant-only products have none
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub variants: Vec<Variant>,
}

fn default_category() -> String {
    "Others".to_string()
}

impl Product {
    pub fn has_variants(&self) -> bool {
        !self.variants.is_empty()
    }

    /// Display price: base price, else the first variant's price
    pub fn display_price(&self) -> Option<Decimal> {
        self.price.or_else(|| self.variants.first().map(|v| v.price))
    }
}

/// Fulfillment channel; tickets are partitioned per channel
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum OrderType {
    Delivery,
    DineIn,
    Takeaway,
}

impl OrderType {
    pub const ALL: [OrderType; 3] = [OrderType::Delivery, OrderType::DineIn, OrderType::Takeaway];

    /// Per-queue persistence key
    pub fn storage_key(&self) -> &'static str {
        match self {
            OrderType::Delivery => "deliveryKotData",
            OrderType::DineIn => "dineInKotData",
            OrderType::Takeaway => "takeawayKotData",
        }
    }

    /// Printed channel label
    pub fn label(&self) -> &'static str {
        match self {
            OrderType::Delivery => "Delivery",
            OrderType::DineIn => "Dine-In",
            OrderType::Takeaway => "Takeaway",
        }
    }
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Identity of a cart line: no two lines with the same key may coexist
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub name: String,
    pub price: Decimal,
    pub size: Option<String>,
}

/// One consolidated cart line
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LineItem {
    pub name: String,
    pub price: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    pub product_id: String,
    pub category: String,
    pub quantity: u32,
}

impl LineItem {
    pub fn key(&self) -> LineKey {
        LineKey {
            name: self.name.clone(),
            price: self.price,
            size: self.size.clone(),
        }
    }

    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Identity of a variant selection entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct SelectionKey {
    pub size: String,
    pub price: Decimal,
    pub product_id: String,
}

/// One entry of the transient variant-selection set
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SelectionEntry {
    #[serde(flatten)]
    pub key: SelectionKey,
    pub quantity: u32,
}

/// A committed Kitchen Order Ticket
///
/// Immutable after creation; an edit removes it and re-commits under the
/// same (or, for a plain commit, a fresh) bill number.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ticket {
    /// 4-digit zero-padded; simply grows past "9999"
    pub bill_no: String,
    /// Creation instant (unix millis)
    pub timestamp: i64,
    /// Human-readable local creation time
    pub date: String,
    /// Deep copy of the cart at commit time
    pub items: Vec<LineItem>,
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instruction: Option<String>,
}

impl Ticket {
    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }
}

/// Per-calendar-day bill number sequence
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayCounter {
    /// Local day key, "%Y-%m-%d"
    pub date: String,
    pub last_no: u32,
}

/// Payload handed to the external order-detail screen
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderHandoff {
    pub order_type: OrderType,
    pub bill_no: String,
    pub items: Vec<LineItem>,
}
