use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarketId(pub String);

impl MarketId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for MarketId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Market {
    pub id: MarketId,
    pub name: String,
    pub location: String,
    pub is_open_today: bool,
    /// Human-readable schedule, e.g. "Cumartesi günleri kurulur".
    pub opening_rule: String,
    /// Lower-case match terms. Diacritics are kept as written.
    pub keywords: Vec<String>,
}

impl Market {
    pub fn status_label(&self) -> &'static str {
        if self.is_open_today {
            "AÇIK"
        } else {
            "KAPALI"
        }
    }

    pub fn mentioned_in(&self, normalized_message: &str) -> bool {
        self.keywords.iter().any(|keyword| normalized_message.contains(keyword.as_str()))
    }
}
