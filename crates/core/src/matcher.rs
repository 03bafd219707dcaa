//! Deterministic keyword responder used whenever the model path cannot answer.
//!
//! Rules are checked in the fixed order of [`RULES`] and the first rule that
//! matches produces the reply. A product mention therefore beats a market
//! mention, which beats small talk. Messages matching nothing get the default
//! reply, so the matcher answers every input.

use crate::domain::chat::ChatReply;
use crate::knowledge::KnowledgeBase;

pub const STATUS_INQUIRY_KEYWORDS: &[&str] = &["açık", "ne zaman"];
pub const GREETING_KEYWORDS: &[&str] = &["merhaba", "selam"];
pub const WELLBEING_KEYWORDS: &[&str] = &["nasılsın"];

const GREETING_REPLY: &str =
    "Merhaba! Size en ucuz pazar ürünlerini bulmanızda yardımcı olabilirim.";
const WELLBEING_REPLY: &str = "Sanal bir asistan olduğum için duygularım yok ama sistemlerim gayet iyi çalışıyor! Size nasıl yardım edebilirim?";
const UNKNOWN_REPLY: &str =
    "Bu konuda şu an bilgim yok ama pazardaki diğer ürünleri sorabilirsiniz.";
const DEFAULT_EXAMPLE_COUNT: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchRule {
    ProductLookup,
    MarketStatusInquiry,
    MarketStatus,
    SmallTalk,
}

/// Evaluation order. Earlier rules win.
pub const RULES: [MatchRule; 4] = [
    MatchRule::ProductLookup,
    MatchRule::MarketStatusInquiry,
    MatchRule::MarketStatus,
    MatchRule::SmallTalk,
];

impl MatchRule {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ProductLookup => "product_lookup",
            Self::MarketStatusInquiry => "market_status_inquiry",
            Self::MarketStatus => "market_status",
            Self::SmallTalk => "small_talk",
        }
    }

    /// Returns a reply when this rule's predicate holds for the normalized message.
    fn apply(&self, message: &str, knowledge: &KnowledgeBase) -> Option<ChatReply> {
        match self {
            Self::ProductLookup => {
                let mentioned = knowledge.find_products(message).into_iter().next()?;
                let cheapest = knowledge.cheapest_listing(mentioned);
                let market = knowledge.market(&cheapest.market_id)?;

                let mut text = format!(
                    "En ucuz {}: {}, {}.",
                    cheapest.name,
                    market.name,
                    cheapest.price_label()
                );
                if !market.is_open_today {
                    text.push_str(&format!(" (Pazar bugün {}.)", market.status_label()));
                }
                Some(ChatReply::navigate(text, market.id.clone(), Some(cheapest.id.clone())))
            }
            Self::MarketStatusInquiry => {
                if !contains_any(message, STATUS_INQUIRY_KEYWORDS) {
                    return None;
                }
                let market = knowledge.find_markets(message).into_iter().next()?;
                Some(ChatReply::text(format!(
                    "{} bugün {}. ({})",
                    market.name,
                    market.status_label(),
                    market.opening_rule
                )))
            }
            Self::MarketStatus => {
                let market = knowledge.find_markets(message).into_iter().next()?;
                Some(ChatReply::text(format!("{} bugün {}.", market.name, market.status_label())))
            }
            Self::SmallTalk => {
                if contains_any(message, GREETING_KEYWORDS) {
                    Some(ChatReply::text(GREETING_REPLY))
                } else if contains_any(message, WELLBEING_KEYWORDS) {
                    Some(ChatReply::text(WELLBEING_REPLY))
                } else {
                    None
                }
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleMatch {
    /// `None` when no rule matched and the default reply was used.
    pub rule: Option<MatchRule>,
    pub reply: ChatReply,
}

#[derive(Clone, Copy, Debug)]
pub struct RuleBasedMatcher<'a> {
    knowledge: &'a KnowledgeBase,
}

impl<'a> RuleBasedMatcher<'a> {
    pub fn new(knowledge: &'a KnowledgeBase) -> Self {
        Self { knowledge }
    }

    pub fn evaluate(&self, message: &str) -> RuleMatch {
        let normalized = normalize_message(message);

        RULES
            .iter()
            .find_map(|rule| {
                rule.apply(&normalized, self.knowledge)
                    .map(|reply| RuleMatch { rule: Some(*rule), reply })
            })
            .unwrap_or_else(|| RuleMatch { rule: None, reply: self.default_reply() })
    }

    pub fn respond(&self, message: &str) -> ChatReply {
        self.evaluate(message).reply
    }

    fn default_reply(&self) -> ChatReply {
        let examples = self
            .knowledge
            .products()
            .iter()
            .take(DEFAULT_EXAMPLE_COUNT)
            .map(|product| product.name.as_str())
            .collect::<Vec<_>>();

        if examples.is_empty() {
            return ChatReply::text(UNKNOWN_REPLY);
        }
        ChatReply::text(format!("{UNKNOWN_REPLY} (Örn: {})", examples.join(", ")))
    }
}

/// Case-folds only. Diacritics stay, so "beşiktaş" and "besiktas" are different terms.
pub fn normalize_message(message: &str) -> String {
    message.to_lowercase()
}

fn contains_any(message: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|keyword| message.contains(keyword))
}
