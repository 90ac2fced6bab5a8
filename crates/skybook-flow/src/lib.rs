//! # skybook-flow
//!
//! The checkout flow engine: steps are declarative values, executed one at a
//! time by [`StepSequencer`] against any [`skybook_browser::PageSession`].
//!
//! - [`step`]: `Step`, `Action`, `Assertion`, outcomes and run results
//! - [`assertion`]: page-state invariant checks
//! - [`sequencer`]: ordered execution with per-step failure policy
//! - [`catalog`]: the 19-step booking run built from a `BookingConfig`
//!
//! ```no_run
//! use skybook_browser::MockPage;
//! use skybook_core::BookingConfig;
//! use skybook_flow::{checkout_steps, StepSequencer, TimeoutBudget};
//! use std::path::Path;
//!
//! # async fn example() -> skybook_core::Result<()> {
//! let config = BookingConfig::load(Path::new("config.json"))?;
//! let steps = checkout_steps(&config);
//! let sequencer = StepSequencer::new(TimeoutBudget::from(&config.browser_settings));
//! let result = sequencer.run(&steps, &MockPage::permissive()).await;
//! println!("succeeded: {}", result.succeeded());
//! # Ok(())
//! # }
//! ```

pub mod assertion;
pub mod catalog;
pub mod sequencer;
pub mod step;

pub use assertion::AssertionChecker;
pub use catalog::{checkout_steps, selectors};
pub use sequencer::StepSequencer;
pub use step::{
    Action, Assertion, FailurePolicy, RunResult, Step, StepOutcome, StepRecord, TimeoutBudget,
    Wait,
};
