//! Declarative step model
//!
//! A [`Step`] is plain data: an optional wait condition, the actions to
//! perform once it holds, the assertions that must pass, and the actions
//! that only run after every assertion passed. Steps are built once and
//! never mutated; the sequencer only borrows them.

use serde::{Deserialize, Serialize};
use skybook_browser::Selector;
use skybook_core::{BrowserSettings, TimeoutClass};
use std::time::Duration;

/// What happens to the run when a step cannot complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the run
    Mandatory,
    /// Log and continue with the next step
    Optional,
}

/// Condition a step waits for before acting
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Wait {
    Element {
        selector: Selector,
        timeout: TimeoutClass,
    },
    NetworkIdle(TimeoutClass),
}

/// A single page interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Navigate(String),
    WaitFor {
        selector: Selector,
        timeout: TimeoutClass,
    },
    WaitForNetworkIdle(TimeoutClass),
    Fill {
        selector: Selector,
        value: String,
    },
    Click(Selector),
    /// Click the first match; fails with `missing` when there is none
    ClickFirst {
        selector: Selector,
        missing: String,
    },
    /// Scroll to and force-click every match
    ForceClickAll(Selector),
    /// Wait for and click an element that may legitimately be absent
    ClickIfPresent {
        selector: Selector,
        timeout: TimeoutClass,
        /// Names the interaction in the log line written on a miss
        label: String,
    },
    Pause(Duration),
    /// Always fails; used for configuration values the flow cannot act on
    Fail(String),
}

/// Post-condition on observed page state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    /// Trimmed text of the first match equals `expected`
    TextEquals {
        label: String,
        selector: Selector,
        expected: String,
    },
    /// Number of matches equals `expected`
    CountEquals {
        label: String,
        selector: Selector,
        expected: usize,
        /// Log each match's text, one line per passenger
        report_each: bool,
    },
}

impl Assertion {
    pub fn label(&self) -> &str {
        match self {
            Assertion::TextEquals { label, .. } | Assertion::CountEquals { label, .. } => label,
        }
    }
}

/// A named unit of interaction with a fixed failure policy
#[derive(Debug, Clone)]
pub struct Step {
    name: String,
    policy: FailurePolicy,
    wait: Option<Wait>,
    actions: Vec<Action>,
    assertions: Vec<Assertion>,
    after_checks: Vec<Action>,
    narration: Option<String>,
}

impl Step {
    fn new(name: impl Into<String>, policy: FailurePolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            wait: None,
            actions: Vec::new(),
            assertions: Vec::new(),
            after_checks: Vec::new(),
            narration: None,
        }
    }

    /// Step whose failure aborts the run
    pub fn mandatory(name: impl Into<String>) -> Self {
        Self::new(name, FailurePolicy::Mandatory)
    }

    /// Step whose failure is logged and skipped
    pub fn optional(name: impl Into<String>) -> Self {
        Self::new(name, FailurePolicy::Optional)
    }

    pub fn wait_for(mut self, selector: Selector, timeout: TimeoutClass) -> Self {
        self.wait = Some(Wait::Element { selector, timeout });
        self
    }

    pub fn wait_for_network_idle(mut self, timeout: TimeoutClass) -> Self {
        self.wait = Some(Wait::NetworkIdle(timeout));
        self
    }

    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    pub fn check(mut self, assertion: Assertion) -> Self {
        self.assertions.push(assertion);
        self
    }

    /// Action that runs only after every assertion passed
    pub fn after_checks(mut self, action: Action) -> Self {
        self.after_checks.push(action);
        self
    }

    /// Message logged when the step succeeds
    pub fn narrate(mut self, message: impl Into<String>) -> Self {
        self.narration = Some(message.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    pub fn wait(&self) -> Option<&Wait> {
        self.wait.as_ref()
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn assertions(&self) -> &[Assertion] {
        &self.assertions
    }

    pub fn after_check_actions(&self) -> &[Action] {
        &self.after_checks
    }

    pub fn narration(&self) -> &str {
        self.narration.as_deref().unwrap_or(&self.name)
    }
}

/// Result of executing one step
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    Succeeded,
    /// Optional step whose condition was not met
    SkippedOptional { reason: String },
    /// Mandatory failure; the run stops here
    Failed { diagnostic: String },
}

impl StepOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, StepOutcome::Failed { .. })
    }
}

/// Outcome of a step, tagged with its position and policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepRecord {
    /// 1-based position in the run
    pub number: usize,
    pub name: String,
    pub policy: FailurePolicy,
    pub outcome: StepOutcome,
}

/// Result of a complete run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Steps that executed, in order
    pub steps: Vec<StepRecord>,
    /// Steps the run was given
    pub planned: usize,
}

impl RunResult {
    /// Every planned step executed and none failed
    pub fn succeeded(&self) -> bool {
        self.steps.len() == self.planned && self.failure().is_none()
    }

    /// The mandatory failure that ended the run, if any
    pub fn failure(&self) -> Option<&StepRecord> {
        self.steps.iter().find(|record| record.outcome.is_failed())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &StepRecord> {
        self.steps
            .iter()
            .filter(|record| matches!(record.outcome, StepOutcome::SkippedOptional { .. }))
    }

    /// Whether a step with this name was executed (in any outcome)
    pub fn reached(&self, name: &str) -> bool {
        self.steps.iter().any(|record| record.name == name)
    }
}

/// Concrete durations for each timeout class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutBudget {
    pub ui: Duration,
    pub page_load: Duration,
    pub navigation: Duration,
}

impl TimeoutBudget {
    /// Same duration for every class
    pub fn uniform(duration: Duration) -> Self {
        Self {
            ui: duration,
            page_load: duration,
            navigation: duration,
        }
    }

    pub fn resolve(&self, class: TimeoutClass) -> Duration {
        match class {
            TimeoutClass::Ui => self.ui,
            TimeoutClass::PageLoad => self.page_load,
            TimeoutClass::Navigation => self.navigation,
        }
    }
}

impl From<&BrowserSettings> for TimeoutBudget {
    fn from(settings: &BrowserSettings) -> Self {
        Self {
            ui: Duration::from_millis(settings.timeout),
            page_load: Duration::from_millis(settings.page_load_timeout),
            navigation: Duration::from_millis(settings.navigation_timeout),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_keeps_policy_and_order() {
        let step = Step::optional("Accept cookie consent")
            .wait_for(Selector::with_text("button", "Agree"), TimeoutClass::Ui)
            .then(Action::Click(Selector::with_text("button", "Agree")))
            .narrate("Accepted privacy settings.");

        assert_eq!(step.policy(), FailurePolicy::Optional);
        assert_eq!(step.actions().len(), 1);
        assert!(step.assertions().is_empty());
        assert_eq!(step.narration(), "Accepted privacy settings.");
        assert!(matches!(
            step.wait(),
            Some(Wait::Element { timeout: TimeoutClass::Ui, .. })
        ));
    }

    #[test]
    fn test_narration_defaults_to_name() {
        let step = Step::mandatory("Continue");
        assert_eq!(step.narration(), "Continue");
    }

    #[test]
    fn test_run_result_failure() {
        let result = RunResult {
            steps: vec![
                StepRecord {
                    number: 1,
                    name: "a".to_string(),
                    policy: FailurePolicy::Optional,
                    outcome: StepOutcome::SkippedOptional {
                        reason: "absent".to_string(),
                    },
                },
                StepRecord {
                    number: 2,
                    name: "b".to_string(),
                    policy: FailurePolicy::Mandatory,
                    outcome: StepOutcome::Failed {
                        diagnostic: "boom".to_string(),
                    },
                },
            ],
            planned: 3,
        };

        assert!(!result.succeeded());
        assert_eq!(result.failure().map(|r| r.number), Some(2));
        assert_eq!(result.skipped().count(), 1);
        assert!(result.reached("b"));
        assert!(!result.reached("c"));
    }

    #[test]
    fn test_outcome_serialization() {
        let json = serde_json::to_value(StepOutcome::Failed {
            diagnostic: "boom".to_string(),
        })
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["diagnostic"], "boom");
    }

    #[test]
    fn test_budget_resolve() {
        let budget = TimeoutBudget {
            ui: Duration::from_millis(1),
            page_load: Duration::from_millis(2),
            navigation: Duration::from_millis(3),
        };
        assert_eq!(budget.resolve(TimeoutClass::PageLoad), Duration::from_millis(2));
        assert_eq!(
            TimeoutBudget::uniform(Duration::from_secs(1)).resolve(TimeoutClass::Navigation),
            Duration::from_secs(1)
        );
    }

    #[test]
    fn test_budget_from_settings() {
        let settings = BrowserSettings {
            headless: true,
            timeout: 5_000,
            page_load_timeout: 20_000,
            navigation_timeout: 30_000,
            base_url: "https://www.ryanair.com/".to_string(),
        };
        let budget = TimeoutBudget::from(&settings);
        assert_eq!(budget.resolve(TimeoutClass::Ui), Duration::from_millis(5_000));
        assert_eq!(budget.resolve(TimeoutClass::PageLoad), Duration::from_millis(20_000));
        assert_eq!(budget.resolve(TimeoutClass::Navigation), Duration::from_millis(30_000));
    }
}
