//! Fail-open utilities for tolerated interactions
//!
//! Some page affordances (consent banners, login nags, upsell takeovers, the
//! calendar month tab) may or may not be shown. Interactions with them fail
//! open: the error is logged and the caller continues with `None`.
//!
//! DO NOT use fail-open for:
//! - Mandatory steps (their failure must abort the run)
//! - Assertions (a violated invariant is never swallowed)

use std::future::Future;
use tracing::warn;

use crate::Result;

/// Execute an interaction that is allowed to fail
///
/// Logs the error via `tracing::warn!` on failure and returns `None`.
/// There is exactly one attempt; nothing is retried.
///
/// # Usage
///
/// ```no_run
/// use skybook_core::fail_open::fail_open;
/// use skybook_core::Result;
///
/// async fn dismiss_banner() -> Result<()> {
///     Ok(())
/// }
///
/// async fn example() {
///     let dismissed = fail_open("cookie consent", || dismiss_banner()).await;
///     // dismissed is None if the banner never showed up
/// }
/// ```
pub async fn fail_open<F, Fut, T>(operation_name: &str, f: F) -> Option<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    match f().await {
        Ok(val) => Some(val),
        Err(e) => {
            warn!("{} skipped (fail-open): {}", operation_name, e);
            None
        }
    }
}
