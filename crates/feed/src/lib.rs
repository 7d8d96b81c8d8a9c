mod client;
mod error;
pub mod models;
mod parser;

pub use client::{FeedClient, FeedFetcher};
pub use error::FeedError;
pub use models::{FeedEntry, ParsedFeed};
pub use parser::parse_feed;

pub type Result<T> = std::result::Result<T, FeedError>;
