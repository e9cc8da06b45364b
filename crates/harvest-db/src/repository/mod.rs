//! # Repository Module
//!
//! Repository implementations for the document and account stores.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  axum handler                                                           │
//! │       │                                                                 │
//! │       │  state.documents.products().list_by_farmer("farmer-7")          │
//! │       ▼                                                                 │
//! │  ProductRepository                                                      │
//! │  ├── ProductRow  (#[derive(FromRow)], flat columns + JSON text)         │
//! │  └── TryFrom<ProductRow> for harvest_core::Product                      │
//! │       │                                                                 │
//! │       │  SQL                                                            │
//! │       ▼                                                                 │
//! │  SQLite                                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Row structs stay private to each repository; callers only ever see
//! harvest-core domain types.
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Listing CRUD and lookups
//! - [`OrderRepository`](order::OrderRepository) - Checkout persistence and status edits
//! - [`ImageRepository`](image::ImageRepository) - Uploaded image blobs
//! - [`AccountRepository`](account::AccountRepository) - User profiles and settings

pub mod account;
pub mod image;
pub mod order;
pub mod product;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use harvest_core::{
        Account, AccountRole, AccountSettings, DeliveryDetails, DiscountRate, Money, NewOrder,
        OrderItem, PaymentMethod, PaymentStatus, Product, Traceability,
    };

    pub fn at(minutes: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 1, 6, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    pub fn product(id: &str, name: &str, farmer_id: &str, minutes: i64) -> Product {
        Product {
            id: id.to_string(),
            farmer_id: farmer_id.to_string(),
            farmer_mobile: Some("9822000000".to_string()),
            farmer_location: Some("Nashik".to_string()),
            name: name.to_string(),
            description: format!("{name} grown by {farmer_id}"),
            category: "Vegetables".to_string(),
            price: Money::from_paise(4000),
            discount: DiscountRate::from_bps(500),
            available_quantity: 25,
            unit: "kg".to_string(),
            image_url: format!("/api/products/image/{id}.jpg"),
            image_id: Some(format!("{id}.jpg")),
            traceability: Traceability {
                farm_location: Some("Nashik".to_string()),
                harvest_date: chrono::NaiveDate::from_ymd_opt(2026, 9, 28),
                harvest_method: Some("Organic".to_string()),
                certified_by: None,
            },
            created_at: at(minutes),
            updated_at: at(minutes),
        }
    }

    pub fn new_order(customer_id: &str) -> NewOrder {
        NewOrder {
            customer_id: customer_id.to_string(),
            items: vec![OrderItem {
                product_id: "p1".to_string(),
                name: "Tomato".to_string(),
                price: Money::from_paise(4000),
                quantity: 3,
                farmer_id: Some("farmer-1".to_string()),
            }],
            total_amount: Money::from_paise(12000),
            delivery_details: DeliveryDetails {
                address: "12 MG Road, Pune".to_string(),
                mobile: "9876543210".to_string(),
                email: "ravi@example.com".to_string(),
                name: Some("Ravi".to_string()),
            },
            payment_method: PaymentMethod::CashOnDelivery,
            payment_status: PaymentStatus::Pending,
            gateway: None,
        }
    }

    pub fn account(uid: &str, role: AccountRole) -> Account {
        Account {
            uid: uid.to_string(),
            name: format!("User {uid}"),
            email: format!("{uid}@example.com"),
            role,
            mobile: None,
            bio: None,
            location: None,
            profile_image: None,
            settings: AccountSettings::default(),
            created_at: at(0),
            updated_at: at(0),
        }
    }
}
