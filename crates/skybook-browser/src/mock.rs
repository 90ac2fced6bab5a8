//! In-memory page for exercising flows without a browser

use crate::error::{BrowserError, Result};
use crate::page::{PageSession, Selector};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A recorded page interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageCall {
    Goto(String),
    WaitForNetworkIdle,
    WaitFor(String),
    Fill(String, String),
    Click(String),
    ClickNth(String, usize),
    ForceClickAll(String),
    Count(String),
    InnerText(String),
    InnerTexts(String),
    Pause(Duration),
}

impl PageCall {
    /// Selector the call targeted, if any
    pub fn selector(&self) -> Option<&str> {
        match self {
            PageCall::WaitFor(s)
            | PageCall::Fill(s, _)
            | PageCall::Click(s)
            | PageCall::ClickNth(s, _)
            | PageCall::ForceClickAll(s)
            | PageCall::Count(s)
            | PageCall::InnerText(s)
            | PageCall::InnerTexts(s) => Some(s),
            PageCall::Goto(_) | PageCall::WaitForNetworkIdle | PageCall::Pause(_) => None,
        }
    }
}

/// Mock page session for testing
///
/// Elements are keyed by raw selector text. A permissive page treats every
/// selector as present unless explicitly removed; a strict page only knows
/// the selectors it was given. Pauses are recorded, not slept.
#[derive(Debug, Default)]
pub struct MockPage {
    everything_present: bool,
    present: HashSet<String>,
    missing: HashSet<String>,
    texts: HashMap<String, Vec<String>>,
    counts: HashMap<String, usize>,
    network_stalled: bool,
    calls: Mutex<Vec<PageCall>>,
    closes: AtomicUsize,
}

impl MockPage {
    /// Page where nothing is present
    pub fn new() -> Self {
        Self::default()
    }

    /// Page where every selector is present
    pub fn permissive() -> Self {
        Self {
            everything_present: true,
            ..Self::default()
        }
    }

    pub fn with_element(mut self, selector: &Selector) -> Self {
        self.present.insert(selector.to_string());
        self
    }

    pub fn without_element(mut self, selector: &Selector) -> Self {
        self.missing.insert(selector.to_string());
        self
    }

    pub fn with_text(self, selector: &Selector, text: &str) -> Self {
        self.with_texts(selector, &[text])
    }

    pub fn with_texts(mut self, selector: &Selector, texts: &[&str]) -> Self {
        self.texts.insert(
            selector.to_string(),
            texts.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn with_count(mut self, selector: &Selector, count: usize) -> Self {
        self.counts.insert(selector.to_string(), count);
        self
    }

    /// Make every network-idle wait time out
    pub fn with_stalled_network(mut self) -> Self {
        self.network_stalled = true;
        self
    }

    /// Every call made so far, in order
    pub fn calls(&self) -> Vec<PageCall> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Whether any call targeted `selector`
    pub fn touched(&self, selector: &Selector) -> bool {
        let key = selector.to_string();
        self.calls()
            .iter()
            .any(|call| call.selector() == Some(key.as_str()))
    }

    /// Whether `selector` was clicked, directly or by index
    pub fn clicked(&self, selector: &Selector) -> bool {
        let key = selector.to_string();
        self.calls().iter().any(|call| match call {
            PageCall::Click(s) | PageCall::ClickNth(s, _) | PageCall::ForceClickAll(s) => *s == key,
            _ => false,
        })
    }

    /// Last value filled into `selector`
    pub fn filled(&self, selector: &Selector) -> Option<String> {
        let key = selector.to_string();
        self.calls().iter().rev().find_map(|call| match call {
            PageCall::Fill(s, value) if *s == key => Some(value.clone()),
            _ => None,
        })
    }

    /// How many times `close` was called
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    fn record(&self, call: PageCall) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(call);
        }
    }

    fn is_present(&self, key: &str) -> bool {
        if self.missing.contains(key) {
            return false;
        }
        self.everything_present
            || self.present.contains(key)
            || self.counts.get(key).is_some_and(|n| *n > 0)
            || self.texts.get(key).is_some_and(|t| !t.is_empty())
    }

    fn count_of(&self, key: &str) -> usize {
        if self.missing.contains(key) {
            return 0;
        }
        if let Some(count) = self.counts.get(key) {
            return *count;
        }
        if let Some(texts) = self.texts.get(key) {
            return texts.len();
        }
        usize::from(self.is_present(key))
    }

    fn not_found(selector: &Selector) -> BrowserError {
        BrowserError::ElementNotFound {
            selector: selector.to_string(),
        }
    }
}

#[async_trait]
impl PageSession for MockPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.record(PageCall::Goto(url.to_string()));
        Ok(())
    }

    async fn wait_for_network_idle(&self, timeout: Duration) -> Result<()> {
        self.record(PageCall::WaitForNetworkIdle);
        if self.network_stalled {
            return Err(BrowserError::Timeout {
                target: "network idle".to_string(),
                timeout_ms: timeout.as_millis() as u64,
            });
        }
        Ok(())
    }

    async fn wait_for(&self, selector: &Selector, timeout: Duration) -> Result<()> {
        let key = selector.to_string();
        self.record(PageCall::WaitFor(key.clone()));
        if self.is_present(&key) {
            Ok(())
        } else {
            Err(BrowserError::Timeout {
                target: key,
                timeout_ms: timeout.as_millis() as u64,
            })
        }
    }

    async fn fill(&self, selector: &Selector, value: &str) -> Result<()> {
        let key = selector.to_string();
        self.record(PageCall::Fill(key.clone(), value.to_string()));
        if self.is_present(&key) {
            Ok(())
        } else {
            Err(Self::not_found(selector))
        }
    }

    async fn click(&self, selector: &Selector) -> Result<()> {
        let key = selector.to_string();
        self.record(PageCall::Click(key.clone()));
        if self.is_present(&key) {
            Ok(())
        } else {
            Err(Self::not_found(selector))
        }
    }

    async fn click_nth(&self, selector: &Selector, index: usize) -> Result<()> {
        let key = selector.to_string();
        self.record(PageCall::ClickNth(key.clone(), index));
        if index < self.count_of(&key) {
            Ok(())
        } else {
            Err(Self::not_found(selector))
        }
    }

    async fn force_click_all(&self, selector: &Selector) -> Result<usize> {
        let key = selector.to_string();
        self.record(PageCall::ForceClickAll(key.clone()));
        Ok(self.count_of(&key))
    }

    async fn count(&self, selector: &Selector) -> Result<usize> {
        let key = selector.to_string();
        self.record(PageCall::Count(key.clone()));
        Ok(self.count_of(&key))
    }

    async fn inner_text(&self, selector: &Selector) -> Result<String> {
        let key = selector.to_string();
        self.record(PageCall::InnerText(key.clone()));
        if !self.is_present(&key) {
            return Err(Self::not_found(selector));
        }
        Ok(self
            .texts
            .get(&key)
            .and_then(|t| t.first().cloned())
            .unwrap_or_default())
    }

    async fn inner_texts(&self, selector: &Selector) -> Result<Vec<String>> {
        let key = selector.to_string();
        self.record(PageCall::InnerTexts(key.clone()));
        Ok(match self.texts.get(&key) {
            Some(texts) if !self.missing.contains(&key) => texts.clone(),
            _ => vec![String::new(); self.count_of(&key)],
        })
    }

    async fn pause(&self, duration: Duration) {
        self.record(PageCall::Pause(duration));
    }

    async fn close(&self) -> Result<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
