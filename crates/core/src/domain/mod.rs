pub mod chat;
pub mod market;
pub mod product;
