//! Core business logic abstractions

pub mod allocation;
pub mod cache;
pub mod config;
pub mod currency;
pub mod log;
pub mod news;
pub mod price;
pub mod screening;
pub mod tables;
pub mod valuation;

// Re-export main types for cleaner imports
pub use currency::CurrencyNormalizer;
pub use news::{NewsSource, Summarizer};
pub use price::{Quote, QuoteSource};
