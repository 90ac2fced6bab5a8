//! Page-state invariant checks

use crate::step::{Assertion, TimeoutBudget};
use skybook_browser::PageSession;
use skybook_core::{Result, SkybookError, TimeoutClass};
use tracing::{debug, info};

/// Evaluates [`Assertion`]s against a page
///
/// Every failure, including a counter element that never appears, is
/// reported as `SkybookError::Assertion` so the sequencer can treat it as a
/// mandatory failure.
#[derive(Debug, Clone)]
pub struct AssertionChecker {
    budget: TimeoutBudget,
}

impl AssertionChecker {
    pub fn new(budget: TimeoutBudget) -> Self {
        Self { budget }
    }

    pub async fn check<S>(&self, assertion: &Assertion, session: &S) -> Result<()>
    where
        S: PageSession + ?Sized,
    {
        match assertion {
            Assertion::TextEquals {
                label,
                selector,
                expected,
            } => {
                let timeout = self.budget.resolve(TimeoutClass::Ui);
                let observed = async {
                    session.wait_for(selector, timeout).await?;
                    session.inner_text(selector).await
                }
                .await
                .map_err(|e| SkybookError::Assertion(format!("could not read {}: {}", label, e)))?;

                let observed = observed.trim();
                if observed != expected {
                    return Err(SkybookError::Assertion(format!(
                        "Expected {} {}, but found {}",
                        expected, label, observed
                    )));
                }
                info!("Assertion passed: {} {}", expected, label);
                Ok(())
            }

            Assertion::CountEquals {
                label,
                selector,
                expected,
                report_each,
            } => {
                let observed = session
                    .count(selector)
                    .await
                    .map_err(|e| SkybookError::Assertion(format!("could not count {}: {}", label, e)))?;
                debug!("Found {} {}", observed, label);

                if observed != *expected {
                    return Err(SkybookError::Assertion(format!(
                        "Expected {} {}, but found {}",
                        expected, label, observed
                    )));
                }
                info!("Assertion passed: {} {}", expected, label);

                if *report_each {
                    // Labels are informational only
                    if let Ok(texts) = session.inner_texts(selector).await {
                        for (i, text) in texts.iter().enumerate() {
                            info!("  Passenger {} {}: {}", i + 1, label, text.trim());
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skybook_browser::{MockPage, PageCall, Selector};
    use std::time::Duration;

    fn checker() -> AssertionChecker {
        AssertionChecker::new(TimeoutBudget::uniform(Duration::from_millis(10)))
    }

    fn counter_assertion(selector: &Selector, expected: &str) -> Assertion {
        Assertion::TextEquals {
            label: "adults".to_string(),
            selector: selector.clone(),
            expected: expected.to_string(),
        }
    }

    #[tokio::test]
    async fn test_text_equals_trims() {
        let counter = Selector::css("[data-ref=\"counter.counter__value\"]");
        let page = MockPage::new().with_text(&counter, " 2\n");

        checker()
            .check(&counter_assertion(&counter, "2"), &page)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_text_mismatch() {
        let counter = Selector::css("[data-ref=\"counter.counter__value\"]");
        let page = MockPage::new().with_text(&counter, "1");

        let err = checker()
            .check(&counter_assertion(&counter, "2"), &page)
            .await
            .unwrap_err();
        assert!(matches!(err, SkybookError::Assertion(_)));
        assert!(err.to_string().contains("Expected 2 adults, but found 1"));
    }

    #[tokio::test]
    async fn test_missing_counter_is_assertion_failure() {
        let counter = Selector::css("#counter");
        let page = MockPage::new();

        let err = checker()
            .check(&counter_assertion(&counter, "2"), &page)
            .await
            .unwrap_err();
        assert!(matches!(err, SkybookError::Assertion(_)));
    }

    #[tokio::test]
    async fn test_count_equals_reports_labels() {
        let seats = Selector::css(".seat__seat--occupied");
        let page = MockPage::new().with_texts(&seats, &["12A", "12B"]);
        let assertion = Assertion::CountEquals {
            label: "outbound seats".to_string(),
            selector: seats.clone(),
            expected: 2,
            report_each: true,
        };

        checker().check(&assertion, &page).await.unwrap();
        assert!(page
            .calls()
            .contains(&PageCall::InnerTexts(seats.to_string())));
    }

    #[tokio::test]
    async fn test_count_mismatch() {
        let seats = Selector::css(".seat__seat--occupied");
        let page = MockPage::new().with_count(&seats, 1);
        let assertion = Assertion::CountEquals {
            label: "inbound seats".to_string(),
            selector: seats,
            expected: 2,
            report_each: true,
        };

        let err = checker().check(&assertion, &page).await.unwrap_err();
        assert!(err
            .to_string()
            .contains("Expected 2 inbound seats, but found 1"));
    }
}
