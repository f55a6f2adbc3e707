pub mod activity;
pub mod client;
pub mod collector;
pub mod error;
pub mod rest;

// Re-exports
pub use activity::{ActivitySource, GitHubActivitySource};
pub use client::GitHubClient;
pub use collector::ActivityCollector;
pub use error::{Error, Result};
pub use rest::RestClient;
