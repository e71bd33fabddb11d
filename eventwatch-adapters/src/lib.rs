//! # eventwatch-adapters
//!
//! Ready-made [`StatusSource`](eventwatch_cache::StatusSource)
//! implementations for the eventwatch poller.
//!
//! ## Supported Services
//!
//! - **Media services status API** (`msam` feature) - Reads grouped alarm
//!   events and channel idle/running status over HTTPS with an API key
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use eventwatch_adapters::msam::MsamClient;
//! use eventwatch_cache::PollerService;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MsamClient::builder()
//!         .endpoint("https://abc123.execute-api.us-west-2.amazonaws.com/msam")
//!         .api_key("secret")
//!         .build()?;
//!
//!     let poller = PollerService::builder(Arc::new(client)).build();
//!     let outcome = poller.poll_once().await?;
//!
//!     println!("changed: {}", outcome.is_changed());
//!     Ok(())
//! }
//! ```

pub mod error;

#[cfg(feature = "msam")]
pub mod msam;

pub use error::AdapterError;
