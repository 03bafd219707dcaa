//! Pazar core: the market catalog, reply types, keyword fallback responder and
//! configuration shared by the agent, server and cli crates.

pub mod config;
pub mod domain;
pub mod errors;
pub mod knowledge;
pub mod matcher;

pub use domain::chat::{ActionType, ChatReply, ChatRequest, ReplyAction, ReplyParseError};
pub use domain::market::{Market, MarketId};
pub use domain::product::{Product, ProductId};
pub use errors::CatalogError;
pub use knowledge::KnowledgeBase;
pub use matcher::{MatchRule, RuleBasedMatcher, RuleMatch, RULES};
