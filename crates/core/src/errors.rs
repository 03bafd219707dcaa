use thiserror::Error;

/// Problems found while assembling a knowledge base from raw market and product definitions.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("duplicate market id `{0}`")]
    DuplicateMarket(String),
    #[error("duplicate product id `{0}`")]
    DuplicateProduct(String),
    #[error("product `{product_id}` references unknown market `{market_id}`")]
    UnknownMarket { product_id: String, market_id: String },
    #[error("`{0}` has an empty name")]
    EmptyName(String),
    #[error("`{0}` needs at least one non-empty lower-case keyword")]
    InvalidKeywords(String),
    #[error("product `{0}` must have a positive unit price")]
    NonPositivePrice(String),
}

#[cfg(test)]
mod tests {
    use super::CatalogError;

    #[test]
    fn unknown_market_message_names_both_ids() {
        let message = CatalogError::UnknownMarket {
            product_id: "p_tom".to_owned(),
            market_id: "market_9".to_owned(),
        }
        .to_string();

        assert!(message.contains("p_tom"));
        assert!(message.contains("market_9"));
    }
}
