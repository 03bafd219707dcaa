use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::market::MarketId;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProductId(pub String);

impl ProductId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A featured listing: one product sold at one market.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub market_id: MarketId,
    pub unit_price: Decimal,
    pub unit: String,
    pub keywords: Vec<String>,
}

impl Product {
    pub fn mentioned_in(&self, normalized_message: &str) -> bool {
        self.keywords.iter().any(|keyword| normalized_message.contains(keyword.as_str()))
    }

    pub fn shares_keyword_with(&self, other: &Product) -> bool {
        self.keywords.iter().any(|keyword| other.keywords.contains(keyword))
    }

    /// Price rendered for display, e.g. "20 TL/kg".
    pub fn price_label(&self) -> String {
        format!("{} TL/{}", self.unit_price.normalize(), self.unit)
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::market::MarketId;

    use super::{Product, ProductId};

    fn listing(id: &str, keyword: &str, price: Decimal) -> Product {
        Product {
            id: ProductId::from(id),
            name: format!("Test {keyword}"),
            market_id: MarketId::from("market_1"),
            unit_price: price,
            unit: "kg".to_string(),
            keywords: vec![keyword.to_string()],
        }
    }

    #[test]
    fn price_label_drops_trailing_zeros() {
        assert_eq!(listing("p1", "domates", Decimal::new(2000, 2)).price_label(), "20 TL/kg");
        assert_eq!(listing("p2", "domates", Decimal::new(2250, 2)).price_label(), "22.5 TL/kg");
    }

    #[test]
    fn keyword_sharing_detects_same_produce() {
        let a = listing("p1", "domates", Decimal::new(20, 0));
        let b = listing("p2", "domates", Decimal::new(22, 0));
        let c = listing("p3", "elma", Decimal::new(25, 0));

        assert!(a.shares_keyword_with(&b));
        assert!(!a.shares_keyword_with(&c));
    }
}
