//! Browser error types - re-exports the unified SkybookError from skybook-core
//!
//! Page operations report through three variants:
//! - Timeout { target, timeout_ms } - a bounded wait ran out of time
//! - ElementNotFound { selector } - an action targeted something absent
//! - Browser(String) - CDP, launch and script failures
//!
//! Error messages should name the selector or URL involved.

pub use skybook_core::{Result, SkybookError};

pub type BrowserError = SkybookError;
