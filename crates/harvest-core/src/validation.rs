//! # Validation Module
//!
//! Input validation for product forms, checkout payloads and status edits.
//!
//! ## Validation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Checkout Validation Pipeline                       │
//! │                                                                         │
//! │  CheckoutRequest (raw JSON)                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. required top-level fields ──► "Missing required fields" + map       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  2. items is a non-empty array                                          │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  3. every item has product_id/name/price/quantity ──► invalidItem       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  4. delivery address/mobile/email ──► "Missing delivery details" + map  │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  5. payment_method is known                                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  6. razorpay carries order/payment/signature ids                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  NewOrder                                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first failing stage wins; later stages never run.
//!
//! "Missing" follows the storefront's notion of presence: absent, `null`,
//! `false`, `0` and `""` all count as missing.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;

use crate::error::ValidationError;
use crate::money::{parse_hundredths, DiscountRate, Money};
use crate::types::{
    DeliveryDetails, GatewayPayment, NewOrder, OrderItem, OrderStatus, PaymentMethod,
    PaymentStatus, Product, ProductUpdate, Traceability,
};
use crate::{
    DEFAULT_CURRENCY, DEFAULT_UNIT, MAX_ITEM_QUANTITY, MAX_ORDER_ITEMS, PRODUCT_IMAGE_PATH,
};

/// Maximum length of a product name.
pub const MAX_NAME_LENGTH: usize = 120;

/// Maximum length of a product description.
pub const MAX_DESCRIPTION_LENGTH: usize = 2000;

/// Text fields of a multipart form, keyed by part name.
pub type FormFields = BTreeMap<String, String>;

// =============================================================================
// Product Forms
// =============================================================================

/// A validated new listing, minus the image and generated ids.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDraft {
    pub farmer_id: String,
    pub farmer_mobile: Option<String>,
    pub farmer_location: Option<String>,
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: Money,
    pub discount: DiscountRate,
    pub available_quantity: i64,
    pub unit: String,
    pub traceability: Traceability,
}

impl ProductDraft {
    /// Completes the draft with its id, stored image and timestamps.
    pub fn into_product(self, id: String, image_filename: String, now: DateTime<Utc>) -> Product {
        Product {
            id,
            farmer_id: self.farmer_id,
            farmer_mobile: self.farmer_mobile,
            farmer_location: self.farmer_location,
            name: self.name,
            description: self.description,
            category: self.category,
            price: self.price,
            discount: self.discount,
            available_quantity: self.available_quantity,
            unit: self.unit,
            image_url: format!("{PRODUCT_IMAGE_PATH}/{image_filename}"),
            image_id: Some(image_filename),
            traceability: self.traceability,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Validates the text parts of the add-product form.
///
/// `has_image` reports whether an `image` file part was sent; the image is
/// required alongside the text fields.
///
/// ## Example
/// ```rust
/// use harvest_core::validation::{validate_new_product, FormFields};
///
/// let mut form = FormFields::new();
/// for (k, v) in [
///     ("name", "Tomato"),
///     ("category", "Vegetables"),
///     ("price", "40.50"),
///     ("description", "Vine ripened"),
///     ("farmer_id", "farmer-1"),
///     ("available_quantity", "25"),
/// ] {
///     form.insert(k.to_string(), v.to_string());
/// }
///
/// let draft = validate_new_product(&form, true).unwrap();
/// assert_eq!(draft.price.paise(), 4050);
/// assert_eq!(draft.unit, "kg");
/// ```
pub fn validate_new_product(
    form: &FormFields,
    has_image: bool,
) -> Result<ProductDraft, ValidationError> {
    let text = |key: &str| non_blank(form.get(key).map(String::as_str));

    if let Some(err) = ValidationError::missing_fields(
        "Missing required product information",
        [
            ("name", text("name").is_none()),
            ("category", text("category").is_none()),
            ("price", text("price").is_none()),
            ("description", text("description").is_none()),
            ("farmer_id", text("farmer_id").is_none()),
            ("image", !has_image),
        ],
    ) {
        return Err(err);
    }

    let quantity = text("available_quantity").ok_or_else(quantity_error)?;

    Ok(ProductDraft {
        farmer_id: text("farmer_id").unwrap_or_default().to_string(),
        farmer_mobile: text("farmer_mobile").map(str::to_string),
        farmer_location: text("farmer_location").map(str::to_string),
        name: validate_name(text("name").unwrap_or_default())?,
        description: validate_description(text("description").unwrap_or_default())?,
        category: text("category").unwrap_or_default().to_string(),
        price: validate_price(text("price").unwrap_or_default())?,
        discount: validate_discount(text("discount"))?,
        available_quantity: validate_stock(quantity)?,
        unit: text("unit").unwrap_or(DEFAULT_UNIT).to_string(),
        traceability: collect_traceability(form)?.unwrap_or_default(),
    })
}

/// Validates the edit-product form. Absent or blank parts are left unchanged.
///
/// The owning farmer cannot be reassigned through an edit.
pub fn validate_product_update(form: &FormFields) -> Result<ProductUpdate, ValidationError> {
    let text = |key: &str| non_blank(form.get(key).map(String::as_str));

    Ok(ProductUpdate {
        name: text("name").map(validate_name).transpose()?,
        description: text("description").map(validate_description).transpose()?,
        category: text("category").map(str::to_string),
        price: text("price").map(validate_price).transpose()?,
        discount: match text("discount") {
            Some(raw) => Some(validate_discount(Some(raw))?),
            None => None,
        },
        available_quantity: text("available_quantity").map(validate_stock).transpose()?,
        unit: text("unit").map(str::to_string),
        farmer_mobile: text("farmer_mobile").map(str::to_string),
        farmer_location: text("farmer_location").map(str::to_string),
        traceability: collect_traceability(form)?,
    })
}

fn validate_name(raw: &str) -> Result<String, ValidationError> {
    if raw.chars().count() > MAX_NAME_LENGTH {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: MAX_NAME_LENGTH,
        });
    }
    Ok(raw.to_string())
}

fn validate_description(raw: &str) -> Result<String, ValidationError> {
    if raw.chars().count() > MAX_DESCRIPTION_LENGTH {
        return Err(ValidationError::TooLong {
            field: "description".to_string(),
            max: MAX_DESCRIPTION_LENGTH,
        });
    }
    Ok(raw.to_string())
}

/// Parses a rupee price typed into a form ("45", "45.5", "45.50").
pub fn validate_price(raw: &str) -> Result<Money, ValidationError> {
    let price = Money::parse_decimal(raw)
        .ok_or_else(|| ValidationError::invalid_format("price", "expected a rupee amount like 45.50"))?;

    if !price.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    Ok(price)
}

/// Parses a percentage discount. Blank means no discount.
///
/// ## Example
/// ```rust
/// use harvest_core::validation::validate_discount;
///
/// assert_eq!(validate_discount(Some("12.5")).unwrap().bps(), 1250);
/// assert!(validate_discount(None).unwrap().is_zero());
/// assert!(validate_discount(Some("101")).is_err());
/// ```
pub fn validate_discount(raw: Option<&str>) -> Result<DiscountRate, ValidationError> {
    let Some(raw) = non_blank(raw) else {
        return Ok(DiscountRate::zero());
    };

    // hundredths of a percent are basis points
    let bps = parse_hundredths(raw).ok_or_else(|| {
        ValidationError::invalid_format("discount", "expected a percentage such as 12.5")
    })?;
    if !(0..=DiscountRate::MAX_BPS as i64).contains(&bps) {
        return Err(ValidationError::Rule(
            "Discount must be between 0 and 100 percent".to_string(),
        ));
    }
    Ok(DiscountRate::from_bps(bps as u32))
}

fn validate_stock(raw: &str) -> Result<i64, ValidationError> {
    let quantity: i64 = raw.trim().parse().map_err(|_| quantity_error())?;
    if quantity < 0 {
        return Err(ValidationError::invalid_format(
            "available_quantity",
            "must not be negative",
        ));
    }
    Ok(quantity)
}

fn quantity_error() -> ValidationError {
    ValidationError::Rule("Available quantity is required and must be a number".to_string())
}

// =============================================================================
// Traceability Parts
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct RawTraceability {
    farm_location: Option<String>,
    harvest_date: Option<String>,
    harvest_method: Option<String>,
    certified_by: Option<String>,
}

/// Collects the traceability block from a form.
///
/// Three encodings are accepted and merged in this order:
/// ```text
/// traceability               = {"farm_location":"Nashik", ...}   (JSON text)
/// traceability[farm_location] = Nashik                            (add form)
/// traceability.farm_location  = Nashik                            (edit form)
/// ```
/// Returns `None` when the form carries no traceability at all.
pub fn collect_traceability(form: &FormFields) -> Result<Option<Traceability>, ValidationError> {
    let mut raw = match non_blank(form.get("traceability").map(String::as_str)) {
        Some(json) => serde_json::from_str::<RawTraceability>(json)
            .map_err(|e| ValidationError::invalid_format("traceability", e.to_string()))?,
        None => RawTraceability::default(),
    };
    let mut present = form.contains_key("traceability");

    for (key, value) in form {
        let field = key
            .strip_prefix("traceability[")
            .and_then(|rest| rest.strip_suffix(']'))
            .or_else(|| key.strip_prefix("traceability."));

        let Some(field) = field else { continue };
        present = true;

        let value = non_blank(Some(value.as_str())).map(str::to_string);
        match field {
            "farm_location" => raw.farm_location = value,
            "harvest_date" => raw.harvest_date = value,
            "harvest_method" => raw.harvest_method = value,
            "certified_by" => raw.certified_by = value,
            _ => {}
        }
    }

    if !present {
        return Ok(None);
    }

    let harvest_date = match non_blank(raw.harvest_date.as_deref()) {
        Some(date) => Some(parse_harvest_date(date)?),
        None => None,
    };

    Ok(Some(Traceability {
        farm_location: non_blank_owned(raw.farm_location),
        harvest_date,
        harvest_method: non_blank_owned(raw.harvest_method),
        certified_by: non_blank_owned(raw.certified_by),
    }))
}

/// Accepts `YYYY-MM-DD`, or a full ISO timestamp whose date part is used.
fn parse_harvest_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    let date_part = raw.get(..10).unwrap_or(raw);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d")
        .map_err(|_| ValidationError::invalid_format("traceability.harvest_date", "expected YYYY-MM-DD"))
}

// =============================================================================
// Checkout
// =============================================================================

/// Raw checkout payload as posted by the storefront.
///
/// Every field is optional here so that validation, not deserialization,
/// decides which error the client sees.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(alias = "consumer_id")]
    pub customer_id: Option<Value>,
    pub items: Option<Value>,
    pub total_amount: Option<Value>,
    pub delivery_details: Option<Value>,
    pub payment_method: Option<Value>,
    /// Initial payment status.
    pub status: Option<String>,
    pub razorpay_order_id: Option<String>,
    pub razorpay_payment_id: Option<String>,
    pub razorpay_signature: Option<String>,
}

/// Runs the checkout pipeline and produces an order ready to persist.
pub fn validate_checkout(req: CheckoutRequest) -> Result<NewOrder, ValidationError> {
    let present = |v: &Option<Value>| v.as_ref().is_some_and(is_truthy);

    // 1. top-level presence
    if let Some(err) = ValidationError::missing_fields(
        "Missing required fields",
        [
            ("customer_id", !present(&req.customer_id)),
            ("items", !present(&req.items)),
            ("total_amount", !present(&req.total_amount)),
            ("delivery_details", !present(&req.delivery_details)),
            ("payment_method", !present(&req.payment_method)),
        ],
    ) {
        return Err(err);
    }

    let customer_id = json_text(req.customer_id.as_ref())
        .ok_or_else(|| ValidationError::invalid_format("customer_id", "expected a string"))?;

    // 2. items shape
    let raw_items = match req.items {
        Some(Value::Array(items)) if !items.is_empty() => items,
        _ => {
            return Err(ValidationError::Rule(
                "Items must be a non-empty array".to_string(),
            ))
        }
    };
    if raw_items.len() > MAX_ORDER_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "items".to_string(),
            min: 1,
            max: MAX_ORDER_ITEMS as i64,
        });
    }

    // 3. per-item fields
    let items = raw_items
        .into_iter()
        .map(validate_item)
        .collect::<Result<Vec<_>, _>>()?;

    // 4. delivery details
    let delivery_details = validate_delivery(req.delivery_details.unwrap_or(Value::Null))?;

    // 5. payment method
    let payment_method: PaymentMethod = json_text(req.payment_method.as_ref())
        .unwrap_or_default()
        .parse()?;

    // 6. gateway references
    let gateway = if payment_method.requires_gateway() {
        match (
            non_blank_owned(req.razorpay_order_id),
            non_blank_owned(req.razorpay_payment_id),
            non_blank_owned(req.razorpay_signature),
        ) {
            (Some(order_id), Some(payment_id), Some(signature)) => Some(GatewayPayment {
                gateway_order_id: order_id,
                gateway_payment_id: payment_id,
                gateway_signature: signature,
            }),
            _ => {
                return Err(ValidationError::Rule(
                    "Missing Razorpay payment details".to_string(),
                ))
            }
        }
    } else {
        None
    };

    let total_amount = req
        .total_amount
        .as_ref()
        .and_then(json_integer)
        .map(Money::from_paise)
        .ok_or_else(|| ValidationError::invalid_format("total_amount", "expected an amount in paise"))?;
    if !total_amount.is_positive() {
        return Err(ValidationError::MustBePositive {
            field: "total_amount".to_string(),
        });
    }

    let payment_status = match non_blank(req.status.as_deref()) {
        Some(status) => status.parse()?,
        None => PaymentStatus::default(),
    };

    Ok(NewOrder {
        customer_id,
        items,
        total_amount,
        delivery_details,
        payment_method,
        payment_status,
        gateway,
    })
}

fn validate_item(item: Value) -> Result<OrderItem, ValidationError> {
    let field = |key: &str| item.get(key).filter(|v| is_truthy(v));

    let invalid = |item: &Value| ValidationError::InvalidItem {
        message: "Each item must have product_id, name, price, and quantity".to_string(),
        item: item.clone(),
    };

    let (Some(product_id), Some(name), Some(price), Some(quantity)) = (
        field("product_id").and_then(|v| json_text(Some(v))),
        field("name").and_then(|v| json_text(Some(v))),
        field("price").and_then(json_integer),
        field("quantity").and_then(json_integer),
    ) else {
        return Err(invalid(&item));
    };

    if price <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "price".to_string(),
        });
    }
    let quantity = validate_quantity(quantity)?;
    let farmer_id = item.get("farmer_id").and_then(|v| json_text(Some(v)));

    Ok(OrderItem {
        product_id,
        name,
        price: Money::from_paise(price),
        quantity,
        farmer_id,
    })
}

fn validate_delivery(raw: Value) -> Result<DeliveryDetails, ValidationError> {
    let text = |key: &str| raw.get(key).and_then(|v| json_text(Some(v)));

    let (address, mobile, email) = (text("address"), text("mobile"), text("email"));

    if let Some(err) = ValidationError::missing_fields(
        "Missing delivery details",
        [
            ("address", address.is_none()),
            ("mobile", mobile.is_none()),
            ("email", email.is_none()),
        ],
    ) {
        return Err(err);
    }

    Ok(DeliveryDetails {
        address: address.unwrap_or_default(),
        mobile: mobile.unwrap_or_default(),
        email: email.unwrap_or_default(),
        name: text("name"),
    })
}

/// Validates a line item quantity.
///
/// ## Rules
/// - Must be at least 1
/// - Must not exceed [`MAX_ITEM_QUANTITY`]
pub fn validate_quantity(quantity: i64) -> Result<i64, ValidationError> {
    if !(1..=MAX_ITEM_QUANTITY).contains(&quantity) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }
    Ok(quantity)
}

// =============================================================================
// Gateway Orders
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentIntentRequest {
    pub amount: Option<Value>,
    pub currency: Option<String>,
}

/// A validated request to open a gateway order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub amount: Money,
    pub currency: String,
}

pub fn validate_payment_intent(req: PaymentIntentRequest) -> Result<PaymentIntent, ValidationError> {
    let amount = req
        .amount
        .as_ref()
        .and_then(json_integer)
        .ok_or_else(|| ValidationError::required("amount"))?;
    if amount <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "amount".to_string(),
        });
    }

    let currency = match non_blank(req.currency.as_deref()) {
        Some(c) if c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()) => {
            c.to_ascii_uppercase()
        }
        Some(_) => {
            return Err(ValidationError::invalid_format(
                "currency",
                "expected a three-letter code",
            ))
        }
        None => DEFAULT_CURRENCY.to_string(),
    };

    Ok(PaymentIntent {
        amount: Money::from_paise(amount),
        currency,
    })
}

// =============================================================================
// Status Updates
// =============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

/// Parses a status edit into its typed parts.
pub fn validate_status_update(
    req: StatusUpdateRequest,
) -> Result<(OrderStatus, Option<PaymentStatus>), ValidationError> {
    let status = non_blank(req.status.as_deref())
        .ok_or_else(|| ValidationError::required("status"))?
        .parse()?;

    let payment_status = non_blank(req.payment_status.as_deref())
        .map(str::parse)
        .transpose()?;

    Ok((status, payment_status))
}

// =============================================================================
// JSON helpers
// =============================================================================

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Integers, integral floats (`40.0`) and numeric strings.
fn json_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Strings, plus numbers rendered as text (ids are sometimes numeric).
fn json_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => non_blank(Some(s)).map(str::to_string),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn non_blank_owned(value: Option<String>) -> Option<String> {
    non_blank(value.as_deref()).map(str::to_string)
}

// =============================================================================
// Unit Tests
// =============================================================================
