//! Page sessions for skybook
//!
//! This crate provides the page abstraction the checkout flow drives, plus
//! two implementations of it.
//!
//! # Features
//!
//! - **Page Session trait**: navigation, bounded waits, fill, click and query
//!   operations behind [`PageSession`]
//! - **Chrome backend**: [`BrowserSession`] over the Chrome DevTools Protocol
//! - **Mock page**: [`MockPage`] records every call, for tests
//!
//! # Example
//!
//! ```no_run
//! use skybook_browser::{BrowserConfig, BrowserSession, PageSession, Selector};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = BrowserSession::launch_with_config(BrowserConfig::default()).await?;
//!     session.goto("https://www.ryanair.com/").await?;
//!     session.wait_for_network_idle(Duration::from_secs(30)).await?;
//!
//!     let agree = Selector::with_text("button", "Agree");
//!     if session.wait_for(&agree, Duration::from_secs(5)).await.is_ok() {
//!         session.click(&agree).await?;
//!     }
//!
//!     session.close().await?;
//!     Ok(())
//! }
//! ```
//!
//! # Requirements
//!
//! - Chrome or Chromium browser installed

pub mod browser;
pub mod error;
pub mod mock;
pub mod page;

// Re-export commonly used types
pub use browser::{BrowserConfig, BrowserSession};
pub use error::{BrowserError, Result};
pub use mock::{MockPage, PageCall};
pub use page::{PageSession, Selector};
