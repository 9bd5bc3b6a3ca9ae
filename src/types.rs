//! Core types used throughout bargain

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Side of the negotiation this process plays
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Buyer,
    Seller,
}

impl Role {
    /// The other party
    pub fn counterpart(self) -> Self {
        match self {
            Role::Buyer => Role::Seller,
            Role::Seller => Role::Buyer,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Seller => "seller",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Product under negotiation. Fixed for the lifetime of a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub category: String,
    pub quantity: u32,
    pub quality_grade: String,
    pub origin: String,
    /// Market reference price in whole currency units
    pub base_market_price: u64,
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Product {
    /// Scale the base market price, truncating toward zero
    pub fn price_at(&self, ratio: f64) -> u64 {
        scale(self.base_market_price, ratio)
    }
}

impl Default for Product {
    fn default() -> Self {
        let mut attributes = BTreeMap::new();
        attributes.insert("ripeness".to_string(), serde_json::json!("optimal"));
        attributes.insert("export_grade".to_string(), serde_json::json!(true));

        Self {
            name: "Alphonso Mangoes".to_string(),
            category: "Mangoes".to_string(),
            quantity: 100,
            quality_grade: "A".to_string(),
            origin: "Ratnagiri".to_string(),
            base_market_price: 180_000,
            attributes,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} x{} (grade {}, {})",
            self.name, self.quantity, self.quality_grade, self.origin
        )
    }
}

/// Tolerance for binary representation error in ratios like 1.4
const SCALE_EPSILON: f64 = 1e-6;

/// Multiply a price by a ratio and truncate, the way every pricing rule rounds.
///
/// `180_000 * 1.4` is `251999.99999999997` in binary floating point; the
/// epsilon keeps such products on the intended whole unit.
pub fn scale(price: u64, ratio: f64) -> u64 {
    let scaled = price as f64 * ratio;
    if scaled <= 0.0 {
        0
    } else {
        (scaled + SCALE_EPSILON).floor() as u64
    }
}

/// Format a price with thousands separators for log and message text
pub fn format_price(price: u64) -> String {
    let digits = price.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    format!("₹{}", out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_counterpart() {
        assert_eq!(Role::Buyer.counterpart(), Role::Seller);
        assert_eq!(Role::Seller.counterpart(), Role::Buyer);
        assert_eq!(Role::Seller.to_string(), "seller");
    }

    #[test]
    fn test_scale_truncates() {
        assert_eq!(scale(144_000, 1.1), 158_400);
        assert_eq!(scale(200_000, 0.8), 160_000);
        assert_eq!(scale(180_000, 0.65), 117_000);
        assert_eq!(scale(117_000, 1.07), 125_190);
        assert_eq!(scale(180_000, 1.4), 252_000);
        assert_eq!(scale(125_190, 1.07), 133_953);
        assert_eq!(scale(0, 1.5), 0);
    }

    #[test]
    fn test_default_product() {
        let product = Product::default();
        assert_eq!(product.base_market_price, 180_000);
        assert_eq!(product.price_at(1.4), 252_000);
        assert!(product.attributes.contains_key("ripeness"));
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(0), "₹0");
        assert_eq!(format_price(999), "₹999");
        assert_eq!(format_price(158_400), "₹158,400");
        assert_eq!(format_price(1_250_000), "₹1,250,000");
    }

    #[test]
    fn test_product_serialization() {
        let product = Product::default();
        let serialized = serde_json::to_string(&product).unwrap();
        let deserialized: Product = serde_json::from_str(&serialized).unwrap();
        assert_eq!(product, deserialized);
    }
}
