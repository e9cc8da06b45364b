//! # Catalog Aggregation
//!
//! Several farmers may list the same produce under the same name. The shop
//! shows one card per name, and the detail page lists every farmer selling
//! it. There is no variant table; grouping happens here, at query time.
//!
//! ```text
//! products (newest first)            unique_products()
//! ┌──────────────────────────┐       ┌───────────────────────────────┐
//! │ Tomato   farmer-3  ₹42   │──┐    │ Tomato  ₹42  count: 2         │
//! │ Onion    farmer-1  ₹30   │──┼───►│ Onion   ₹30  count: 1         │
//! │ Tomato   farmer-1  ₹40   │──┘    └───────────────────────────────┘
//! └──────────────────────────┘         first (newest) listing wins
//! ```

use std::collections::{HashMap, HashSet};

use serde::Serialize;
use ts_rs::TS;

use crate::money::Money;
use crate::types::{FarmerDetails, Product, Traceability};

/// One shop card per distinct product name.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct UniqueProduct {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    pub image_url: String,
    pub price: Money,
    /// Number of listings sharing this name.
    pub count: usize,
}

/// Groups listings by exact name, keeping first-seen order.
///
/// Callers pass products newest first, so each card shows the newest
/// listing's details.
pub fn unique_products(products: &[Product]) -> Vec<UniqueProduct> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut unique: Vec<UniqueProduct> = Vec::new();

    for product in products {
        match index.get(product.name.as_str()) {
            Some(&slot) => unique[slot].count += 1,
            None => {
                index.insert(product.name.as_str(), unique.len());
                unique.push(UniqueProduct {
                    id: product.id.clone(),
                    name: product.name.clone(),
                    description: product.description.clone(),
                    category: product.category.clone(),
                    image_url: product.image_url.clone(),
                    price: product.price,
                    count: 1,
                });
            }
        }
    }

    unique
}

/// Shared description of the produce on the "who sells this" page.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct ProductOverview {
    pub name: String,
    pub description: String,
    pub category: String,
    pub image_url: String,
}

/// One farmer's offer for a given product name.
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export)]
pub struct FarmerListing {
    pub farmer_id: String,
    pub farmer_mobile: Option<String>,
    pub farmer_location: Option<String>,
    pub price: Money,
    pub available_quantity: i64,
    pub product_id: String,
    pub traceability: Traceability,
    /// Seller account details; `None` when the account store has no farmer
    /// under `farmer_id`.
    pub farmer_details: Option<FarmerDetails>,
}

/// Builds the overview from the first match plus one listing per product.
///
/// Returns `None` for an empty slice.
pub fn farmer_listings(products: &[Product]) -> Option<(ProductOverview, Vec<FarmerListing>)> {
    let first = products.first()?;

    let overview = ProductOverview {
        name: first.name.clone(),
        description: first.description.clone(),
        category: first.category.clone(),
        image_url: first.image_url.clone(),
    };

    let listings = products
        .iter()
        .map(|p| FarmerListing {
            farmer_id: p.farmer_id.clone(),
            farmer_mobile: p.farmer_mobile.clone(),
            farmer_location: p.farmer_location.clone(),
            price: p.price,
            available_quantity: p.available_quantity,
            product_id: p.id.clone(),
            traceability: p.traceability.clone(),
            farmer_details: None,
        })
        .collect();

    Some((overview, listings))
}

/// Distinct farmer ids, in listing order, for the account-store lookup.
pub fn farmer_ids(listings: &[FarmerListing]) -> Vec<String> {
    let mut seen = HashSet::new();
    listings
        .iter()
        .filter(|l| seen.insert(l.farmer_id.as_str()))
        .map(|l| l.farmer_id.clone())
        .collect()
}

/// Fills `farmer_details` from an account lookup keyed by uid.
pub fn attach_farmer_details(
    listings: &mut [FarmerListing],
    farmers: &HashMap<String, FarmerDetails>,
) {
    for listing in listings {
        listing.farmer_details = farmers.get(&listing.farmer_id).cloned();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::DiscountRate;
    use chrono::{TimeZone, Utc};

    fn product(id: &str, name: &str, farmer: &str, price: i64) -> Product {
        let at = Utc.with_ymd_and_hms(2026, 10, 1, 8, 0, 0).unwrap();
        Product {
            id: id.to_string(),
            farmer_id: farmer.to_string(),
            farmer_mobile: Some("9000000000".to_string()),
            farmer_location: Some("Nashik".to_string()),
            name: name.to_string(),
            description: format!("{name} from {farmer}"),
            category: "Vegetables".to_string(),
            price: Money::from_paise(price),
            discount: DiscountRate::zero(),
            available_quantity: 10,
            unit: "kg".to_string(),
            image_url: format!("/api/products/image/{id}.jpg"),
            image_id: None,
            traceability: Traceability::default(),
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_unique_counts_and_keeps_first_instance() {
        let products = vec![
            product("p3", "Tomato", "farmer-3", 4200),
            product("p2", "Onion", "farmer-1", 3000),
            product("p1", "Tomato", "farmer-1", 4000),
        ];

        let unique = unique_products(&products);
        assert_eq!(unique.len(), 2);

        assert_eq!(unique[0].name, "Tomato");
        assert_eq!(unique[0].id, "p3");
        assert_eq!(unique[0].price.paise(), 4200);
        assert_eq!(unique[0].count, 2);

        assert_eq!(unique[1].name, "Onion");
        assert_eq!(unique[1].count, 1);
    }

    #[test]
    fn test_unique_is_case_sensitive() {
        let products = vec![
            product("p1", "tomato", "farmer-1", 4000),
            product("p2", "Tomato", "farmer-2", 4000),
        ];
        assert_eq!(unique_products(&products).len(), 2);
    }

    #[test]
    fn test_farmer_listings_overview_from_first_match() {
        let products = vec![
            product("p1", "Tomato", "farmer-1", 4000),
            product("p2", "tomato", "farmer-2", 3800),
        ];

        let (overview, listings) = farmer_listings(&products).unwrap();
        assert_eq!(overview.name, "Tomato");
        assert_eq!(listings.len(), 2);
        assert_eq!(listings[1].product_id, "p2");
        assert_eq!(listings[1].price.paise(), 3800);

        assert!(farmer_listings(&[]).is_none());
    }

    #[test]
    fn test_missing_accounts_leave_details_empty() {
        let products = vec![
            product("p1", "Tomato", "farmer-1", 4000),
            product("p2", "Tomato", "farmer-2", 3800),
            product("p3", "Tomato", "farmer-1", 3900),
        ];
        let (_, mut listings) = farmer_listings(&products).unwrap();
        assert_eq!(farmer_ids(&listings), vec!["farmer-1", "farmer-2"]);

        let mut known = HashMap::new();
        known.insert(
            "farmer-1".to_string(),
            FarmerDetails {
                uid: "farmer-1".to_string(),
                name: "Suresh".to_string(),
                email: "suresh@example.com".to_string(),
                member_since: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            },
        );
        attach_farmer_details(&mut listings, &known);

        assert_eq!(listings[0].farmer_details.as_ref().unwrap().name, "Suresh");
        assert!(listings[1].farmer_details.is_none());
        assert!(listings[2].farmer_details.is_some());
    }
}
