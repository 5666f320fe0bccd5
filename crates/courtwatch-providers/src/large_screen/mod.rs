//! Large-screen reservation API source.
//!
//! The campus reservation system exposes one read-only endpoint,
//! `GET {base_url}/resource/large-screen?id={resource}`, serving either the
//! aggregate board or a single court's calendar depending on the id. No
//! authentication is needed.
//!
//! # Example
//!
//! ```ignore
//! use courtwatch_providers::large_screen::{LargeScreenClient, LargeScreenConfig};
//!
//! let client = LargeScreenClient::new(LargeScreenConfig::default())?;
//! let payload = client.fetch(FetchRequest::aggregate(ResourceId(1293))).await?;
//! ```

mod client;
mod config;

pub use client::LargeScreenClient;
pub use config::LargeScreenConfig;
