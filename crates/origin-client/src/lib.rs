//! Upstream HTTP capability for the edgepix interceptor
//!
//! The interceptor fetches each original image exactly once. This crate
//! provides that single GET:
//!
//! - **Bounded**: one overall deadline covers connect, headers and body
//! - **No retries**: a slow edge path must not get slower
//! - **Byte-exact**: no redirect following, no transparent decompression
//! - **Swappable**: callers depend on [`OriginFetcher`], so tests can
//!   substitute a spy
//!
//! # Example
//!
//! ```rust,no_run
//! use edgepix_origin_client::{FetchRequest, HttpOriginClient, OriginFetcher};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = HttpOriginClient::new()?;
//!     let resource = client
//!         .fetch(&FetchRequest::new("https://bucket.s3.amazonaws.com:443/cat.png"))
//!         .await?;
//!     println!("{} {} ({} bytes)", resource.status, resource.reason, resource.body.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod config;
pub mod error;

pub use client::{FetchRequest, FetchedResource, HttpOriginClient, OriginFetcher};
pub use config::OriginClientConfig;
pub use error::{FetchError, FetchResult};
