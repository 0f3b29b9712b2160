//! Adscout Search - Search providers
//!
//! Implementations of [`SearchProvider`](adscout_core::SearchProvider):
//! - `MockProvider`: deterministic fake results with simulated latency
//!
//! # Example
//!
//! ```no_run
//! use adscout_core::SearchProvider;
//! use adscout_search::{MockProvider, MockProviderConfig};
//!
//! # async fn example() -> Result<(), adscout_core::ProviderError> {
//! let provider = MockProvider::new(MockProviderConfig::default());
//! provider.start().await?;
//!
//! let items = provider.search("shoes", "US").await?;
//! assert_eq!(items[0].domain, "shoes.example.com");
//! provider.stop().await;
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod mock;

pub use mock::{MockProvider, MockProviderConfig};
