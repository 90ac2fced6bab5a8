//! Ordered step execution with failure containment
//!
//! The sequencer runs one step at a time against a single page session:
//!
//! 1. wait for the step's condition, bounded by its timeout class
//! 2. perform its actions
//! 3. run its assertions (a failed assertion is always a mandatory failure)
//! 4. perform the actions gated on those assertions
//!
//! A miss in steps 1, 2 or 4 is skipped for optional steps and ends the run
//! for mandatory ones. The session is closed exactly once when the run ends,
//! whichever way it ends.

use crate::assertion::AssertionChecker;
use crate::step::{Action, FailurePolicy, RunResult, Step, StepOutcome, StepRecord, TimeoutBudget, Wait};
use skybook_browser::PageSession;
use skybook_core::fail_open::fail_open;
use skybook_core::{Result, SkybookError};
use tracing::{error, info, instrument, warn};

/// Executes a fixed list of steps in order
#[derive(Debug, Clone)]
pub struct StepSequencer {
    budget: TimeoutBudget,
    checker: AssertionChecker,
}

impl StepSequencer {
    pub fn new(budget: TimeoutBudget) -> Self {
        Self {
            budget,
            checker: AssertionChecker::new(budget),
        }
    }

    /// Run `steps` against `session`, stopping at the first mandatory failure
    pub async fn run<S>(&self, steps: &[Step], session: &S) -> RunResult
    where
        S: PageSession + ?Sized,
    {
        let mut records = Vec::with_capacity(steps.len());

        for (index, step) in steps.iter().enumerate() {
            let number = index + 1;
            let outcome = self.execute(number, step, session).await;
            let stop = outcome.is_failed();

            records.push(StepRecord {
                number,
                name: step.name().to_string(),
                policy: step.policy(),
                outcome,
            });

            if stop {
                break;
            }
        }

        if let Err(e) = session.close().await {
            warn!("Failed to close page session: {}", e);
        }

        let result = RunResult {
            steps: records,
            planned: steps.len(),
        };
        match result.failure() {
            Some(record) => error!(
                "Run aborted at step {} of {} ({})",
                record.number, result.planned, record.name
            ),
            None => info!("Run completed: {} steps", result.steps.len()),
        }
        result
    }

    #[instrument(skip_all, fields(step = number, name = %step.name()))]
    async fn execute<S>(&self, number: usize, step: &Step, session: &S) -> StepOutcome
    where
        S: PageSession + ?Sized,
    {
        if let Err(e) = self.interact(step, session).await {
            return self.miss(step, e);
        }

        for assertion in step.assertions() {
            if let Err(e) = self.checker.check(assertion, session).await {
                error!("{}: {}", step.name(), e);
                return StepOutcome::Failed {
                    diagnostic: format!("{}: {}", step.name(), e),
                };
            }
        }

        if let Err(e) = self.perform_all(step.after_check_actions(), session).await {
            return self.miss(step, e);
        }

        info!("{}", step.narration());
        StepOutcome::Succeeded
    }

    /// Wait condition followed by the step's actions
    async fn interact<S>(&self, step: &Step, session: &S) -> Result<()>
    where
        S: PageSession + ?Sized,
    {
        match step.wait() {
            Some(Wait::Element { selector, timeout }) => {
                session
                    .wait_for(selector, self.budget.resolve(*timeout))
                    .await?
            }
            Some(Wait::NetworkIdle(timeout)) => {
                session
                    .wait_for_network_idle(self.budget.resolve(*timeout))
                    .await?
            }
            None => {}
        }
        self.perform_all(step.actions(), session).await
    }

    /// Apply the step's failure policy to an error
    fn miss(&self, step: &Step, e: SkybookError) -> StepOutcome {
        match step.policy() {
            FailurePolicy::Optional => {
                warn!("{} skipped: {}", step.name(), e);
                StepOutcome::SkippedOptional {
                    reason: e.to_string(),
                }
            }
            FailurePolicy::Mandatory => {
                error!("Could not complete '{}': {}", step.name(), e);
                StepOutcome::Failed {
                    diagnostic: format!("{}: {}", step.name(), e),
                }
            }
        }
    }

    async fn perform_all<S>(&self, actions: &[Action], session: &S) -> Result<()>
    where
        S: PageSession + ?Sized,
    {
        for action in actions {
            self.perform(action, session).await?;
        }
        Ok(())
    }

    async fn perform<S>(&self, action: &Action, session: &S) -> Result<()>
    where
        S: PageSession + ?Sized,
    {
        match action {
            Action::Navigate(url) => session.goto(url).await,
            Action::WaitFor { selector, timeout } => {
                session
                    .wait_for(selector, self.budget.resolve(*timeout))
                    .await
            }
            Action::WaitForNetworkIdle(timeout) => {
                session
                    .wait_for_network_idle(self.budget.resolve(*timeout))
                    .await
            }
            Action::Fill { selector, value } => session.fill(selector, value).await,
            Action::Click(selector) => session.click(selector).await,
            Action::ClickFirst { selector, missing } => {
                if session.count(selector).await? == 0 {
                    return Err(SkybookError::Other(missing.clone()));
                }
                session.click_nth(selector, 0).await
            }
            Action::ForceClickAll(selector) => {
                let clicked = session.force_click_all(selector).await?;
                info!("Clicked {} matches of {}", clicked, selector);
                Ok(())
            }
            Action::ClickIfPresent {
                selector,
                timeout,
                label,
            } => {
                let timeout = self.budget.resolve(*timeout);
                fail_open(label, || async move {
                    session.wait_for(selector, timeout).await?;
                    session.click(selector).await
                })
                .await;
                Ok(())
            }
            Action::Pause(duration) => {
                session.pause(*duration).await;
                Ok(())
            }
            Action::Fail(reason) => Err(SkybookError::Unsupported(reason.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::step::Assertion;
    use skybook_browser::{MockPage, PageCall, Selector};
    use skybook_core::TimeoutClass;
    use std::time::Duration;

    fn sequencer() -> StepSequencer {
        StepSequencer::new(TimeoutBudget::uniform(Duration::from_millis(10)))
    }

    fn click_step(name: &str, selector: &Selector, optional: bool) -> Step {
        let step = if optional {
            Step::optional(name)
        } else {
            Step::mandatory(name)
        };
        step.wait_for(selector.clone(), TimeoutClass::Ui)
            .then(Action::Click(selector.clone()))
    }

    #[tokio::test]
    async fn test_all_steps_succeed() {
        let a = Selector::css("#a");
        let b = Selector::css("#b");
        let page = MockPage::new().with_element(&a).with_element(&b);
        let steps = vec![click_step("a", &a, false), click_step("b", &b, false)];

        let result = sequencer().run(&steps, &page).await;

        assert!(result.succeeded());
        assert_eq!(result.steps.len(), 2);
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test]
    async fn test_optional_miss_continues() {
        let banner = Selector::css("#banner");
        let next = Selector::css("#next");
        let page = MockPage::new().with_element(&next);
        let steps = vec![
            click_step("banner", &banner, true),
            click_step("next", &next, false),
        ];

        let result = sequencer().run(&steps, &page).await;

        assert!(result.succeeded());
        assert!(matches!(
            result.steps[0].outcome,
            StepOutcome::SkippedOptional { .. }
        ));
        assert!(page.clicked(&next));
        assert!(!page.clicked(&banner));
    }

    #[tokio::test]
    async fn test_mandatory_miss_stops_and_closes() {
        let missing = Selector::css("#missing");
        let later = Selector::css("#later");
        let page = MockPage::new().with_element(&later);
        let steps = vec![
            click_step("missing", &missing, false),
            click_step("later", &later, false),
        ];

        let result = sequencer().run(&steps, &page).await;

        assert!(!result.succeeded());
        assert_eq!(result.steps.len(), 1);
        assert!(!page.touched(&later));
        assert_eq!(page.close_count(), 1);
        match &result.steps[0].outcome {
            StepOutcome::Failed { diagnostic } => assert!(diagnostic.contains("Timed out")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_assertion_failure_overrides_optional_policy() {
        let counter = Selector::css("#counter");
        let after = Selector::css("#done");
        let page = MockPage::new().with_text(&counter, "1").with_element(&after);
        let steps = vec![
            Step::optional("count")
                .check(Assertion::TextEquals {
                    label: "adults".to_string(),
                    selector: counter,
                    expected: "2".to_string(),
                })
                .after_checks(Action::Click(after.clone())),
            click_step("next", &after, false),
        ];

        let result = sequencer().run(&steps, &page).await;

        assert_eq!(result.steps.len(), 1);
        assert!(result.steps[0].outcome.is_failed());
        assert!(!page.clicked(&after));
        assert_eq!(page.close_count(), 1);
    }

    #[tokio::test]
    async fn test_click_first_without_matches() {
        let select = Selector::with_text("button", "Select");
        let page = MockPage::new();
        let steps = vec![Step::mandatory("pick").then(Action::ClickFirst {
            selector: select,
            missing: "No Select button found".to_string(),
        })];

        let result = sequencer().run(&steps, &page).await;

        match &result.steps[0].outcome {
            StepOutcome::Failed { diagnostic } => {
                assert!(diagnostic.contains("No Select button found"))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_click_if_present_tolerates_miss() {
        let month = Selector::css("div[data-id=\"2025-06-01\"]");
        let day = Selector::css("div[data-id=\"2025-06-14\"]");
        let page = MockPage::new().with_element(&day);
        let steps = vec![Step::mandatory("date")
            .then(Action::ClickIfPresent {
                selector: month.clone(),
                timeout: TimeoutClass::Ui,
                label: "2025-06-01 month tab".to_string(),
            })
            .then(Action::Click(day.clone()))];

        let result = sequencer().run(&steps, &page).await;

        assert!(result.succeeded());
        assert_eq!(result.steps[0].outcome, StepOutcome::Succeeded);
        assert_eq!(
            page.calls(),
            vec![
                PageCall::WaitFor(month.to_string()),
                PageCall::Click(day.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_fail_action_is_unsupported() {
        let page = MockPage::permissive();
        let steps = vec![
            Step::mandatory("fare").then(Action::Fail("fare type 'premium'".to_string())),
            Step::optional("login").then(Action::Click(Selector::css("#login"))),
        ];

        let result = sequencer().run(&steps, &page).await;

        assert!(!result.reached("login"));
        match &result.steps[0].outcome {
            StepOutcome::Failed { diagnostic } => {
                assert!(diagnostic.contains("Not implemented: fare type 'premium'"))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_run_still_closes() {
        let page = MockPage::new();
        let result = sequencer().run(&[], &page).await;
        assert!(result.succeeded());
        assert_eq!(page.close_count(), 1);
        assert!(page.calls().iter().all(|c| !matches!(c, PageCall::Goto(_))));
    }

    #[tokio::test]
    async fn test_runs_against_trait_object() {
        let page = MockPage::permissive();
        let session: &dyn PageSession = &page;
        let steps = vec![Step::mandatory("pause").then(Action::Pause(Duration::from_secs(3)))];

        let result = sequencer().run(&steps, session).await;

        assert!(result.succeeded());
        assert_eq!(
            page.calls(),
            vec![PageCall::Pause(Duration::from_secs(3))]
        );
    }
}
