//! Static catalog of markets and their featured products.
//!
//! The knowledge base is built once at startup and shared read-only between
//! requests. Lookups never fail: a missing id or keyword is an empty result.

use std::collections::BTreeMap;
use std::fmt::Write as _;

use rust_decimal::Decimal;

use crate::domain::market::{Market, MarketId};
use crate::domain::product::{Product, ProductId};
use crate::errors::CatalogError;

#[derive(Clone, Debug)]
pub struct KnowledgeBase {
    markets: Vec<Market>,
    products: Vec<Product>,
    market_index: BTreeMap<MarketId, usize>,
    product_index: BTreeMap<ProductId, usize>,
}

impl KnowledgeBase {
    pub fn new(markets: Vec<Market>, products: Vec<Product>) -> Result<Self, CatalogError> {
        let mut market_index = BTreeMap::new();
        for (position, market) in markets.iter().enumerate() {
            if market.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(market.id.0.clone()));
            }
            if !keywords_valid(&market.keywords) {
                return Err(CatalogError::InvalidKeywords(market.id.0.clone()));
            }
            if market_index.insert(market.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateMarket(market.id.0.clone()));
            }
        }

        let mut product_index = BTreeMap::new();
        for (position, product) in products.iter().enumerate() {
            if product.name.trim().is_empty() {
                return Err(CatalogError::EmptyName(product.id.0.clone()));
            }
            if !keywords_valid(&product.keywords) {
                return Err(CatalogError::InvalidKeywords(product.id.0.clone()));
            }
            if product.unit_price <= Decimal::ZERO {
                return Err(CatalogError::NonPositivePrice(product.id.0.clone()));
            }
            if !market_index.contains_key(&product.market_id) {
                return Err(CatalogError::UnknownMarket {
                    product_id: product.id.0.clone(),
                    market_id: product.market_id.0.clone(),
                });
            }
            if product_index.insert(product.id.clone(), position).is_some() {
                return Err(CatalogError::DuplicateProduct(product.id.0.clone()));
            }
        }

        Ok(Self { markets, products, market_index, product_index })
    }

    /// The fixed Istanbul catalog the assistant ships with.
    pub fn builtin() -> Self {
        let markets = vec![
            market(
                "market_1",
                "Beşiktaş Cumartesi Pazarı",
                "Beşiktaş, İstanbul",
                true,
                "Cumartesi günleri kurulur",
                "beşiktaş",
            ),
            market(
                "market_2",
                "Kadıköy Salı Pazarı",
                "Kadıköy, İstanbul",
                false,
                "Salı günleri hizmet vermektedir",
                "kadıköy",
            ),
            market(
                "market_3",
                "Feriköy Organik Pazarı",
                "Şişli, İstanbul",
                true,
                "Pazar günleri 09:00 - 18:00 arası kurulur",
                "feriköy",
            ),
        ];
        let products = vec![
            product("p_tom", "Salkım Domates", "market_1", Decimal::new(20, 0), "kg", "domates"),
            product("p_app", "Amasya Elması", "market_1", Decimal::new(25, 0), "kg", "elma"),
            product(
                "p_cuc",
                "Çengelköy Salatalık",
                "market_1",
                Decimal::new(30, 0),
                "kg",
                "salatalık",
            ),
            product("p_egg", "Organik Yumurta", "market_3", Decimal::new(45, 0), "10lu", "yumurta"),
        ];

        let market_index =
            markets.iter().enumerate().map(|(position, m)| (m.id.clone(), position)).collect();
        let product_index =
            products.iter().enumerate().map(|(position, p)| (p.id.clone(), position)).collect();

        Self { markets, products, market_index, product_index }
    }

    pub fn markets(&self) -> &[Market] {
        &self.markets
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn market(&self, id: &MarketId) -> Option<&Market> {
        self.market_index.get(id).map(|position| &self.markets[*position])
    }

    pub fn product(&self, id: &ProductId) -> Option<&Product> {
        self.product_index.get(id).map(|position| &self.products[*position])
    }

    /// Products whose keywords occur in the (already case-folded) message, in catalog order.
    pub fn find_products(&self, normalized_message: &str) -> Vec<&Product> {
        self.products.iter().filter(|product| product.mentioned_in(normalized_message)).collect()
    }

    /// Markets whose keywords occur in the (already case-folded) message, in catalog order.
    pub fn find_markets(&self, normalized_message: &str) -> Vec<&Market> {
        self.markets.iter().filter(|market| market.mentioned_in(normalized_message)).collect()
    }

    /// Cheapest listing of the same produce as `product`. Equal prices keep catalog order.
    pub fn cheapest_listing<'a>(&'a self, product: &'a Product) -> &'a Product {
        self.products
            .iter()
            .filter(|candidate| candidate.shares_keyword_with(product))
            .min_by(|left, right| left.unit_price.cmp(&right.unit_price))
            .unwrap_or(product)
    }

    /// True when the market exists and, if given, the product exists and is sold there.
    pub fn contains_reference(&self, market_id: &MarketId, product_id: Option<&ProductId>) -> bool {
        if self.market(market_id).is_none() {
            return false;
        }
        match product_id {
            None => true,
            Some(product_id) => {
                self.product(product_id).is_some_and(|product| &product.market_id == market_id)
            }
        }
    }

    /// Prompt-ready listing of every market with its status and featured products.
    pub fn render_context(&self) -> String {
        let mut out = String::new();
        for (position, market) in self.markets.iter().enumerate() {
            let _ = writeln!(out, "{}. {} (ID: {})", position + 1, market.name, market.id.0);
            let _ = writeln!(out, "   - Konum: {}", market.location);
            let _ = writeln!(out, "   - Durum: Bugün {}", market.status_label());
            let _ = writeln!(out, "   - Takvim: {}", market.opening_rule);

            let featured =
                self.products.iter().filter(|product| product.market_id == market.id).collect::<Vec<_>>();
            if featured.is_empty() {
                let _ = writeln!(out, "   - Öne Çıkan Ürünler: kayıtlı ürün yok");
                continue;
            }
            let _ = writeln!(out, "   - Öne Çıkan Ürünler:");
            for product in featured {
                let _ = writeln!(
                    out,
                    "     * {} (ID: {}) {}",
                    product.name,
                    product.id.0,
                    product.price_label()
                );
            }
        }
        out
    }
}

impl Default for KnowledgeBase {
    fn default() -> Self {
        Self::builtin()
    }
}

fn keywords_valid(keywords: &[String]) -> bool {
    !keywords.is_empty()
        && keywords
            .iter()
            .all(|keyword| !keyword.trim().is_empty() && keyword.to_lowercase() == *keyword)
}

fn market(
    id: &str,
    name: &str,
    location: &str,
    is_open_today: bool,
    opening_rule: &str,
    keyword: &str,
) -> Market {
    Market {
        id: MarketId::from(id),
        name: name.to_string(),
        location: location.to_string(),
        is_open_today,
        opening_rule: opening_rule.to_string(),
        keywords: vec![keyword.to_string()],
    }
}

fn product(
    id: &str,
    name: &str,
    market_id: &str,
    unit_price: Decimal,
    unit: &str,
    keyword: &str,
) -> Product {
    Product {
        id: ProductId::from(id),
        name: name.to_string(),
        market_id: MarketId::from(market_id),
        unit_price,
        unit: unit.to_string(),
        keywords: vec![keyword.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use crate::domain::market::MarketId;
    use crate::domain::product::ProductId;
    use crate::errors::CatalogError;

    use super::{market, product, KnowledgeBase};

    #[test]
    fn builtin_catalog_passes_validation() {
        let builtin = KnowledgeBase::builtin();
        let rebuilt = KnowledgeBase::new(builtin.markets().to_vec(), builtin.products().to_vec());
        assert!(rebuilt.is_ok());
        assert_eq!(builtin.markets().len(), 3);
        assert_eq!(builtin.products().len(), 4);
    }

    #[test]
    fn lookups_by_id_return_none_for_unknown_ids() {
        let kb = KnowledgeBase::builtin();
        assert_eq!(
            kb.market(&MarketId::from("market_3")).map(|m| m.name.as_str()),
            Some("Feriköy Organik Pazarı")
        );
        assert!(kb.market(&MarketId::from("market_9")).is_none());
        assert!(kb.product(&ProductId::from("p_none")).is_none());
    }

    #[test]
    fn keyword_scans_keep_catalog_order() {
        let kb = KnowledgeBase::builtin();
        let ids = kb
            .find_products("elma ve domates")
            .into_iter()
            .map(|p| p.id.0.as_str())
            .collect::<Vec<_>>();
        assert_eq!(ids, vec!["p_tom", "p_app"]);
        assert!(kb.find_markets("nerede").is_empty());
    }

    #[test]
    fn cheapest_listing_prefers_lowest_price_then_catalog_order() {
        let kb = KnowledgeBase::new(
            vec![
                market("m1", "Birinci Pazar", "A", true, "her gün", "birinci"),
                market("m2", "İkinci Pazar", "B", true, "her gün", "ikinci"),
                market("m3", "Üçüncü Pazar", "C", false, "salı", "üçüncü"),
            ],
            vec![
                product("t1", "Domates", "m1", Decimal::new(24, 0), "kg", "domates"),
                product("t2", "Domates", "m2", Decimal::new(18, 0), "kg", "domates"),
                product("t3", "Domates", "m3", Decimal::new(18, 0), "kg", "domates"),
                product("e1", "Elma", "m1", Decimal::new(5, 0), "kg", "elma"),
            ],
        )
        .expect("valid catalog");

        let first = kb.product(&ProductId::from("t1")).expect("t1");
        assert_eq!(kb.cheapest_listing(first).id, ProductId::from("t2"));
    }

    #[test]
    fn reference_check_requires_product_to_belong_to_market() {
        let kb = KnowledgeBase::builtin();
        let besiktas = MarketId::from("market_1");
        let ferikoy = MarketId::from("market_3");
        let tomato = ProductId::from("p_tom");

        assert!(kb.contains_reference(&besiktas, None));
        assert!(kb.contains_reference(&besiktas, Some(&tomato)));
        assert!(!kb.contains_reference(&ferikoy, Some(&tomato)));
        assert!(!kb.contains_reference(&MarketId::from("market_7"), None));
    }

    #[test]
    fn construction_rejects_dangling_market_reference() {
        let result = KnowledgeBase::new(
            vec![market("m1", "Pazar", "A", true, "her gün", "pazar")],
            vec![product("p1", "Domates", "m2", Decimal::new(20, 0), "kg", "domates")],
        );
        assert_eq!(
            result.err(),
            Some(CatalogError::UnknownMarket {
                product_id: "p1".to_string(),
                market_id: "m2".to_string()
            })
        );
    }

    #[test]
    fn construction_rejects_duplicates_and_bad_keywords() {
        let duplicate = KnowledgeBase::new(
            vec![
                market("m1", "Pazar", "A", true, "her gün", "pazar"),
                market("m1", "Pazar", "A", true, "her gün", "pazar"),
            ],
            Vec::new(),
        );
        assert_eq!(duplicate.err(), Some(CatalogError::DuplicateMarket("m1".to_string())));

        let upper = KnowledgeBase::new(
            vec![market("m1", "Pazar", "A", true, "her gün", "Beşiktaş")],
            Vec::new(),
        );
        assert_eq!(upper.err(), Some(CatalogError::InvalidKeywords("m1".to_string())));

        let free = KnowledgeBase::new(
            vec![market("m1", "Pazar", "A", true, "her gün", "pazar")],
            vec![product("p1", "Domates", "m1", Decimal::ZERO, "kg", "domates")],
        );
        assert_eq!(free.err(), Some(CatalogError::NonPositivePrice("p1".to_string())));
    }

    #[test]
    fn rendered_context_lists_ids_status_and_prices() {
        let context = KnowledgeBase::builtin().render_context();
        assert!(context.contains("Beşiktaş Cumartesi Pazarı (ID: market_1)"));
        assert!(context.contains("Durum: Bugün KAPALI"));
        assert!(context.contains("Salkım Domates (ID: p_tom) 20 TL/kg"));
        assert!(context.contains("Organik Yumurta (ID: p_egg) 45 TL/10lu"));
        assert!(context.contains("kayıtlı ürün yok"));
    }
}
