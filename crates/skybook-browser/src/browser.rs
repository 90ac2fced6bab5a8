//! Browser lifecycle management using Chrome DevTools Protocol

use crate::error::{BrowserError, Result};
use crate::page::{PageSession, Selector};
use async_trait::async_trait;
use headless_chrome::{Browser, Element, LaunchOptions, Tab};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use skybook_core::BrowserSettings;
use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Interval between network-idle probes
const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Configuration for browser launch
#[derive(Debug, Clone)]
pub struct BrowserConfig {
    /// Run in headless mode (default: true)
    pub headless: bool,
    /// Browser window width
    pub window_width: u32,
    /// Browser window height
    pub window_height: u32,
    /// Accept self-signed and otherwise invalid certificates
    pub ignore_certificate_errors: bool,
    /// Lookup timeout for elements targeted by fill/click
    pub element_timeout: Duration,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            window_width: 1920,
            window_height: 1080,
            ignore_certificate_errors: true,
            element_timeout: Duration::from_secs(30),
        }
    }
}

impl From<&BrowserSettings> for BrowserConfig {
    fn from(settings: &BrowserSettings) -> Self {
        Self {
            headless: settings.headless,
            element_timeout: Duration::from_millis(settings.navigation_timeout),
            ..Self::default()
        }
    }
}

/// Active browser session with Chrome DevTools Protocol
pub struct BrowserSession {
    /// Underlying browser instance; taken and dropped on close
    browser: Mutex<Option<Browser>>,
    /// Current active tab
    tab: Arc<Tab>,
}

#[derive(Debug, Deserialize)]
struct LoadProbe {
    ready: String,
    resources: u64,
}

/// Successive load probes, settled once the document is complete and its
/// resource count holds between two probes
#[derive(Debug, Default)]
struct IdleTracker {
    last_resources: Option<u64>,
}

impl IdleTracker {
    fn observe(&mut self, probe: &LoadProbe) -> bool {
        let settled = probe.ready == "complete" && self.last_resources == Some(probe.resources);
        self.last_resources = Some(probe.resources);
        settled
    }

    /// A failed probe means the document is being replaced
    fn reset(&mut self) {
        self.last_resources = None;
    }
}

fn idle_timeout(timeout: Duration, last_error: Option<&str>) -> BrowserError {
    if let Some(e) = last_error {
        warn!("Last load probe before network-idle timeout failed: {}", e);
    }
    BrowserError::Timeout {
        target: "network idle".to_string(),
        timeout_ms: timeout.as_millis() as u64,
    }
}

impl BrowserSession {
    /// Launch browser with custom configuration
    pub async fn launch_with_config(config: BrowserConfig) -> Result<Self> {
        info!(
            "Launching browser (headless: {}, size: {}x{})",
            config.headless, config.window_width, config.window_height
        );

        let mut launch_options = LaunchOptions::default_builder()
            .headless(config.headless)
            .window_size(Some((config.window_width, config.window_height)))
            .build()
            .map_err(|e| BrowserError::Browser(format!("Failed to launch browser: {}", e)))?;

        if config.ignore_certificate_errors {
            launch_options
                .args
                .push(OsStr::new("--ignore-certificate-errors"));
        }

        let browser = Browser::new(launch_options)
            .map_err(|e| BrowserError::Browser(format!("Failed to launch browser: {}", e)))?;

        let tab = browser
            .new_tab()
            .map_err(|e| BrowserError::Browser(format!("Failed to create tab: {}", e)))?;
        tab.set_default_timeout(config.element_timeout);

        info!("Browser launched successfully");

        Ok(Self {
            browser: Mutex::new(Some(browser)),
            tab,
        })
    }

    /// Execute JavaScript in the page context
    pub async fn evaluate_script(&self, script: &str) -> Result<serde_json::Value> {
        debug!("Evaluating JavaScript: {}", script);

        let result = self
            .tab
            .evaluate(script, false)
            .map_err(|e| BrowserError::Browser(format!("JavaScript evaluation failed: {}", e)))?;

        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    /// Evaluate an expression and decode its JSON-serialized result
    async fn evaluate_json<T: DeserializeOwned>(&self, expression: &str) -> Result<T> {
        let script = format!("JSON.stringify({})", expression);
        let value = self.evaluate_script(&script).await?;
        let text = value.as_str().ok_or_else(|| {
            BrowserError::Browser(format!("Script returned no value: {}", expression))
        })?;
        Ok(serde_json::from_str(text)?)
    }

    /// First element matching `selector`, within the tab's default timeout
    fn first_element(&self, selector: &Selector) -> Result<Element<'_>> {
        let found = match selector {
            Selector::Css(css) => self.tab.find_element(css),
            Selector::XPath(xpath) => self.tab.find_element_by_xpath(xpath),
        };
        found.map_err(|_e| BrowserError::ElementNotFound {
            selector: selector.to_string(),
        })
    }
}

/// JS expression evaluating to an array of the nodes matched by `selector`
fn nodes_expression(selector: &Selector) -> String {
    let literal = js_string(selector.as_str());
    match selector {
        Selector::Css(_) => format!("Array.from(document.querySelectorAll({}))", literal),
        Selector::XPath(_) => format!(
            "(() => {{ const r = document.evaluate({}, document, null, \
             XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
             for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
             return out; }})()",
            literal
        ),
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[async_trait]
impl PageSession for BrowserSession {
    async fn goto(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);

        self.tab
            .navigate_to(url)
            .map_err(|e| BrowserError::Browser(format!("Failed to navigate to {}: {}", url, e)))?;

        self.tab
            .wait_until_navigated()
            .map_err(|e| BrowserError::Browser(format!("Navigation failed for {}: {}", url, e)))?;

        info!("Successfully navigated to {}", url);
        Ok(())
    }

    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        let expression = "{ ready: document.readyState, \
                          resources: performance.getEntriesByType('resource').length }";
        let mut tracker = IdleTracker::default();
        let mut last_error: Option<String> = None;

        loop {
            match self.evaluate_json::<LoadProbe>(expression).await {
                Ok(probe) => {
                    if tracker.observe(&probe) {
                        debug!("Network idle after {} resources", probe.resources);
                        return Ok(());
                    }
                }
                Err(e) => {
                    debug!("Load probe failed while page settles: {}", e);
                    tracker.reset();
                    last_error = Some(e.to_string());
                }
            }

            if Instant::now() >= deadline {
                return Err(idle_timeout(timeout, last_error.as_deref()));
            }
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }
    }

    async fn wait_for(&self, selector: &Selector, timeout: Duration) -> Result<()> {
        debug!("Waiting for element: {} (timeout: {:?})", selector, timeout);

        let found = match selector {
            Selector::Css(css) => self
                .tab
                .wait_for_element_with_custom_timeout(css, timeout)
                .map(|_| ()),
            Selector::XPath(xpath) => self
                .tab
                .wait_for_xpath_with_custom_timeout(xpath, timeout)
                .map(|_| ()),
        };

        found.map_err(|_e| BrowserError::Timeout {
            target: selector.to_string(),
            timeout_ms: timeout.as_millis() as u64,
        })?;

        debug!("Element found: {}", selector);
        Ok(())
    }

    async fn fill(&self, selector: &Selector, value: &str) -> Result<()> {
        debug!("Filling {} with '{}'", selector, value);

        let element = self.first_element(selector)?;
        element
            .click()
            .map_err(|e| BrowserError::Browser(format!("Failed to focus {}: {}", selector, e)))?;
        element
            .call_js_fn("function() { this.value = ''; }", vec![], false)
            .map_err(|e| BrowserError::Browser(format!("Failed to clear {}: {}", selector, e)))?;
        element
            .type_into(value)
            .map_err(|e| BrowserError::Browser(format!("Failed to type into {}: {}", selector, e)))?;
        Ok(())
    }

    async fn click(&self, selector: &Selector) -> Result<()> {
        debug!("Clicking {}", selector);

        self.first_element(selector)?
            .click()
            .map_err(|e| BrowserError::Browser(format!("Failed to click {}: {}", selector, e)))?;
        Ok(())
    }

    async fn click_nth(&self, selector: &Selector, index: usize) -> Result<()> {
        debug!("Clicking match {} of {}", index, selector);

        let found = match selector {
            Selector::Css(css) => self.tab.find_elements(css),
            Selector::XPath(xpath) => self.tab.find_elements_by_xpath(xpath),
        };
        let elements = found.map_err(|_e| BrowserError::ElementNotFound {
            selector: selector.to_string(),
        })?;
        let element = elements.get(index).ok_or_else(|| BrowserError::ElementNotFound {
            selector: format!("{} (match {})", selector, index),
        })?;

        element
            .click()
            .map_err(|e| BrowserError::Browser(format!("Failed to click {}: {}", selector, e)))?;
        Ok(())
    }

    async fn force_click_all(&self, selector: &Selector) -> Result<usize> {
        let expression = format!(
            "{}.map(el => {{ el.scrollIntoView({{ block: 'center' }}); el.click(); return true; }}).length",
            nodes_expression(selector)
        );
        let clicked: usize = self.evaluate_json(&expression).await?;
        debug!("Force-clicked {} matches of {}", clicked, selector);
        Ok(clicked)
    }

    async fn count(&self, selector: &Selector) -> Result<usize> {
        let expression = format!("{}.length", nodes_expression(selector));
        self.evaluate_json(&expression).await
    }

    async fn inner_text(&self, selector: &Selector) -> Result<String> {
        self.inner_texts(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| BrowserError::ElementNotFound {
                selector: selector.to_string(),
            })
    }

    async fn inner_texts(&self, selector: &Selector) -> Result<Vec<String>> {
        let expression = format!(
            "{}.map(el => el.innerText || el.textContent || '')",
            nodes_expression(selector)
        );
        self.evaluate_json(&expression).await
    }

    async fn close(&self) -> Result<()> {
        info!("Closing browser session");

        let browser = self
            .browser
            .lock()
            .map_err(|e| BrowserError::Browser(format!("Browser lock poisoned: {}", e)))?
            .take();

        match browser {
            Some(browser) => {
                if let Err(e) = self.tab.close(false) {
                    debug!("Tab close reported: {}", e);
                }
                drop(browser);
                Ok(())
            }
            None => Err(BrowserError::Browser("Browser already closed".to_string())),
        }
    }
}
