//! # Domain Types
//!
//! Core domain types used throughout Harvest Link.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Document store                           Account store                 │
//! │  ┌─────────────────┐ ┌─────────────────┐  ┌─────────────────┐          │
//! │  │    Product      │ │     Order       │  │    Account      │          │
//! │  │  ─────────────  │ │  ─────────────  │  │  ─────────────  │          │
//! │  │  _id (UUID)     │ │  _id (UUID)     │  │  uid            │          │
//! │  │  farmer_id ─────┼─┼──────────────── ┼─►│  role           │          │
//! │  │  price (paise)  │ │  order_id       │  │  settings       │          │
//! │  │  traceability   │ │  items[]        │  └─────────────────┘          │
//! │  └─────────────────┘ │  payment_status │                                │
//! │                      │  order_status   │                                │
//! │                      └─────────────────┘                                │
//! │                                                                         │
//! │  farmer_id / customer_id are opaque: no foreign key spans the stores.   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Document ids serialize as `_id` because the SPA was written against a
//! document database and reads `product._id`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::{DiscountRate, Money};

// =============================================================================
// Traceability
// =============================================================================

/// Provenance metadata a farmer attaches to a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Traceability {
    pub farm_location: Option<String>,
    #[ts(as = "Option<String>")]
    pub harvest_date: Option<NaiveDate>,
    /// e.g. Organic, Hydroponic
    pub harvest_method: Option<String>,
    /// Certification authority.
    pub certified_by: Option<String>,
}

impl Traceability {
    pub fn is_empty(&self) -> bool {
        self.farm_location.is_none()
            && self.harvest_date.is_none()
            && self.harvest_method.is_none()
            && self.certified_by.is_none()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A produce listing published by one farmer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,

    /// Account id in the account store.
    pub farmer_id: String,
    pub farmer_mobile: Option<String>,
    pub farmer_location: Option<String>,

    pub name: String,
    pub description: String,
    pub category: String,

    /// Unit price in paise.
    pub price: Money,

    /// Listing discount in basis points (1500 = 15%).
    #[serde(rename = "discount_bps")]
    pub discount: DiscountRate,

    pub available_quantity: i64,

    /// Selling unit, e.g. "kg", "dozen".
    pub unit: String,

    /// Public URL of the listing image.
    pub image_url: String,
    /// Blob-store filename behind `image_url`.
    pub image_id: Option<String>,

    pub traceability: Traceability,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product Update
// =============================================================================

/// A partial edit of a listing. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProductUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub price: Option<Money>,
    pub discount: Option<DiscountRate>,
    pub available_quantity: Option<i64>,
    pub unit: Option<String>,
    pub farmer_mobile: Option<String>,
    pub farmer_location: Option<String>,
    /// Replaces the whole block when present.
    pub traceability: Option<Traceability>,
}

impl ProductUpdate {
    pub fn is_empty(&self) -> bool {
        *self == ProductUpdate::default()
    }

    /// Applies every present field to `product`.
    pub fn apply_to(self, product: &mut Product) {
        if let Some(name) = self.name {
            product.name = name;
        }
        if let Some(description) = self.description {
            product.description = description;
        }
        if let Some(category) = self.category {
            product.category = category;
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(discount) = self.discount {
            product.discount = discount;
        }
        if let Some(quantity) = self.available_quantity {
            product.available_quantity = quantity;
        }
        if let Some(unit) = self.unit {
            product.unit = unit;
        }
        if let Some(mobile) = self.farmer_mobile {
            product.farmer_mobile = Some(mobile);
        }
        if let Some(location) = self.farmer_location {
            product.farmer_location = Some(location);
        }
        if let Some(traceability) = self.traceability {
            product.traceability = traceability;
        }
    }
}

// =============================================================================
// Enum helpers
// =============================================================================

/// Implements `as_str`, `Display` and `FromStr` over the snake_case wire names.
macro_rules! wire_enum {
    ($ty:ident, $field:literal, { $($variant:ident => $name:literal $(| $alias:literal)*),+ $(,)? }) => {
        impl $ty {
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $name,)+
                }
            }

            pub fn allowed() -> Vec<String> {
                vec![$($name.to_string()),+]
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($name $(| $alias)* => Ok($ty::$variant),)+
                    _ => Err(ValidationError::NotAllowed {
                        field: $field.to_string(),
                        allowed: $ty::allowed(),
                    }),
                }
            }
        }
    };
}

// =============================================================================
// Payment Method
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid online through the gateway checkout.
    Razorpay,
    #[serde(alias = "cod")]
    CashOnDelivery,
    CreditCard,
    DebitCard,
    Upi,
}

wire_enum!(PaymentMethod, "payment_method", {
    Razorpay => "razorpay",
    CashOnDelivery => "cash_on_delivery" | "cod",
    CreditCard => "credit_card",
    DebitCard => "debit_card",
    Upi => "upi",
});

impl PaymentMethod {
    /// Whether checkout must carry gateway order/payment/signature ids.
    #[inline]
    pub const fn requires_gateway(&self) -> bool {
        matches!(self, PaymentMethod::Razorpay)
    }
}

// =============================================================================
// Payment Status
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Completed,
    Failed,
    Refunded,
}

wire_enum!(PaymentStatus, "payment_status", {
    Pending => "pending",
    Completed => "completed",
    Failed => "failed",
    Refunded => "refunded",
});

// =============================================================================
// Order Status
// =============================================================================

/// Fulfilment status of an order.
///
/// ```text
/// Placed ──► Processing ──► Shipped ──► Delivered
///    │            │            │
///    └────────────┴────────────┴──────► Cancelled
/// ```
/// `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    Placed,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

wire_enum!(OrderStatus, "status", {
    Placed => "placed",
    Processing => "processing",
    Shipped => "shipped",
    Delivered => "delivered",
    Cancelled => "cancelled",
});

impl OrderStatus {
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Cancelled)
    }

    /// A terminal order never changes; everything else may move freely.
    #[inline]
    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        !self.is_terminal() || *self == next
    }
}

// =============================================================================
// Order
// =============================================================================

/// A line item, frozen at checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    /// Unit price in paise at checkout time.
    pub price: Money,
    pub quantity: i64,
    pub farmer_id: Option<String>,
}

impl OrderItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        self.price.multiply_quantity(self.quantity)
    }
}

/// Where and to whom an order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DeliveryDetails {
    pub address: String,
    pub mobile: String,
    pub email: String,
    pub name: Option<String>,
}

/// Gateway references recorded for online payments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GatewayPayment {
    #[serde(rename = "razorpay_order_id")]
    pub gateway_order_id: String,
    #[serde(rename = "razorpay_payment_id")]
    pub gateway_payment_id: String,
    #[serde(rename = "razorpay_signature")]
    pub gateway_signature: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Order {
    #[serde(rename = "_id")]
    pub id: String,
    /// Human-readable business id, e.g. `ORD-20261019-1A2B3C4D`.
    pub order_id: String,
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    /// Amount charged, in paise, as submitted at checkout.
    pub total_amount: Money,
    pub delivery_details: DeliveryDetails,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub gateway: Option<GatewayPayment>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of line totals; may differ from `total_amount`.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// A validated checkout, ready to persist.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: Money,
    pub delivery_details: DeliveryDetails,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub gateway: Option<GatewayPayment>,
}

// =============================================================================
// Accounts
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Farmer,
    Consumer,
    Admin,
}

wire_enum!(AccountRole, "role", {
    Farmer => "farmer",
    Consumer => "consumer",
    Admin => "admin",
});

/// Per-user preferences.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AccountSettings {
    pub email_notifications: bool,
    pub public_profile: bool,
    pub show_location: bool,
}

/// A user of the marketplace, as held by the account store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Account {
    pub uid: String,
    pub name: String,
    pub email: String,
    pub role: AccountRole,
    pub mobile: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub profile_image: Option<String>,
    pub settings: AccountSettings,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// Partial profile edit; only non-empty fields are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub mobile: Option<String>,
    pub profile_image: Option<String>,
}

impl ProfileUpdate {
    pub fn apply_to(self, account: &mut Account) {
        if let Some(name) = non_blank(self.name) {
            account.name = name;
        }
        if let Some(bio) = non_blank(self.bio) {
            account.bio = Some(bio);
        }
        if let Some(location) = non_blank(self.location) {
            account.location = Some(location);
        }
        if let Some(mobile) = non_blank(self.mobile) {
            account.mobile = Some(mobile);
        }
        if let Some(image) = non_blank(self.profile_image) {
            account.profile_image = Some(image);
        }
    }
}

/// Partial settings edit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub email_notifications: Option<bool>,
    pub public_profile: Option<bool>,
    pub show_location: Option<bool>,
}

impl SettingsUpdate {
    pub fn apply_to(self, settings: &mut AccountSettings) {
        if let Some(v) = self.email_notifications {
            settings.email_notifications = v;
        }
        if let Some(v) = self.public_profile {
            settings.public_profile = v;
        }
        if let Some(v) = self.show_location {
            settings.show_location = v;
        }
    }
}

/// The public slice of a farmer account shown next to listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct FarmerDetails {
    pub uid: String,
    pub name: String,
    pub email: String,
    #[ts(as = "String")]
    pub member_since: DateTime<Utc>,
}

impl FarmerDetails {
    /// Only farmer accounts expose seller details.
    pub fn from_account(account: &Account) -> Option<Self> {
        (account.role == AccountRole::Farmer).then(|| FarmerDetails {
            uid: account.uid.clone(),
            name: account.name.clone(),
            email: account.email.clone(),
            member_since: account.created_at,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

// =============================================================================
// Unit Tests
// =============================================================================
