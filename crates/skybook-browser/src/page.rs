//! Page session abstraction
//!
//! Every interaction the checkout flow performs goes through [`PageSession`],
//! so the flow can run against Chrome or against [`crate::MockPage`].

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use crate::error::Result;

/// Element locator
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector
    Css(String),
    /// XPath expression, used where matching depends on visible text
    XPath(String),
}

impl Selector {
    pub fn css(selector: impl Into<String>) -> Self {
        Selector::Css(selector.into())
    }

    /// `<tag>` anywhere in the document whose text contains `text`
    pub fn with_text(tag: &str, text: &str) -> Self {
        Selector::XPath(format!(
            "//{}[contains(normalize-space(.), {})]",
            tag,
            xpath_literal(text)
        ))
    }

    /// `<tag>` whose whole text, whitespace-normalized, is `text`
    pub fn with_exact_text(tag: &str, text: &str) -> Self {
        Selector::XPath(format!(
            "//{}[normalize-space(.) = {}]",
            tag,
            xpath_literal(text.trim())
        ))
    }

    /// `<tag>` containing `text`, nested under the element matched by `scope`
    pub fn with_text_under(scope: &str, tag: &str, text: &str) -> Self {
        Selector::XPath(format!(
            "{}//{}[contains(normalize-space(.), {})]",
            scope,
            tag,
            xpath_literal(text)
        ))
    }

    /// Raw selector text
    pub fn as_str(&self) -> &str {
        match self {
            Selector::Css(s) | Selector::XPath(s) => s,
        }
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Quote a string for use inside an XPath expression
fn xpath_literal(text: &str) -> String {
    if !text.contains('"') {
        format!("\"{}\"", text)
    } else if !text.contains('\'') {
        format!("'{}'", text)
    } else {
        let parts: Vec<String> = text.split('"').map(|p| format!("\"{}\"", p)).collect();
        format!("concat({})", parts.join(", '\"', "))
    }
}

/// Operations the checkout flow needs from a browser page
///
/// Waits are bounded by the caller-supplied duration and fail with
/// `SkybookError::Timeout`; actions on absent elements fail with
/// `SkybookError::ElementNotFound`.
#[async_trait]
pub trait PageSession: Send + Sync {
    /// Navigate to a URL
    async fn goto(&self, url: &str) -> Result<()>;

    /// Wait until the document is loaded and resource activity has settled
    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()>;

    /// Wait until an element matching `selector` is present
    async fn wait_for(&self, selector: &Selector, timeout: Duration) -> Result<()>;

    /// Replace the value of an input
    async fn fill(&self, selector: &Selector, value: &str) -> Result<()>;

    /// Click the first element matching `selector`
    async fn click(&self, selector: &Selector) -> Result<()>;

    /// Click the `index`-th element matching `selector`
    async fn click_nth(&self, selector: &Selector, index: usize) -> Result<()>;

    /// Scroll every match into view and click it even if covered; returns how many were clicked
    async fn force_click_all(&self, selector: &Selector) -> Result<usize>;

    /// Number of elements currently matching `selector`
    async fn count(&self, selector: &Selector) -> Result<usize>;

    /// Rendered text of the first match
    async fn inner_text(&self, selector: &Selector) -> Result<String>;

    /// Rendered text of every match, in document order
    async fn inner_texts(&self, selector: &Selector) -> Result<Vec<String>>;

    /// Fixed delay
    async fn pause(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }

    /// Tear down the page and its browser
    async fn close(&self) -> Result<()>;
}
