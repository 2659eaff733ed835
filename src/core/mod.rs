//! Core business logic abstractions

pub mod analytics;
pub mod cache;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod log;
pub mod market;
pub mod portfolio;
pub mod refresh;

// Re-export main types for cleaner imports
pub use error::{CycleError, FetchError};
pub use market::{Fundamentals, FundamentalsSource, PriceQuote, PriceSource};
pub use portfolio::{Exchange, Holding, LiveField};
