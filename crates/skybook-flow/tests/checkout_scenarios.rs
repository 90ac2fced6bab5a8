//! End-to-end runs of the booking flow against a mock page

use skybook_browser::{MockPage, PageCall, Selector};
use skybook_core::BookingConfig;
use skybook_flow::{
    checkout_steps, selectors, FailurePolicy, RunResult, StepOutcome, StepSequencer, TimeoutBudget,
    Wait,
};
use std::time::Duration;

const CONFIG: &str = r#"{
    "flight_details": {
        "departure_airport": "Dublin",
        "departure_code": "DUB",
        "destination_airport": "London Stansted",
        "destination_code": "STN",
        "departure_month": "2025-06-01",
        "departure_date": "2025-06-14",
        "return_date": "2025-06-21"
    },
    "passengers": {
        "adults": [
            { "title": "Mr", "first_name": "Sean", "surname": "Byrne" },
            { "title": "Ms", "first_name": "Aoife", "surname": "Byrne" }
        ]
    },
    "booking_preferences": { "fare_type": "basic" },
    "browser_settings": { "headless": true, "timeout": 5000, "page_load_timeout": 20000 }
}"#;

fn config_with_fare(fare: &str) -> BookingConfig {
    let json = CONFIG.replace("\"basic\"", &format!("\"{}\"", fare));
    BookingConfig::from_json(&json).unwrap()
}

/// A page on which every element of the flow shows up with consistent state
fn healthy_page() -> MockPage {
    MockPage::permissive()
        .with_text(&selectors::adults_counter(), "2")
        .with_text(&selectors::children_counter(), "0")
        .with_texts(&selectors::outbound_occupied_seats(), &["17A", "17B"])
        .with_texts(&selectors::inbound_occupied_seats(), &["21E", "21F"])
        .with_count(&selectors::small_bag_radios(), 2)
}

async fn run(config: &BookingConfig, page: &MockPage) -> RunResult {
    let sequencer = StepSequencer::new(TimeoutBudget::uniform(Duration::from_millis(10)));
    sequencer.run(&checkout_steps(config), page).await
}

fn diagnostic(result: &RunResult) -> String {
    match result.failure().map(|r| &r.outcome) {
        Some(StepOutcome::Failed { diagnostic }) => diagnostic.clone(),
        other => panic!("expected a failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_complete_booking_runs_all_steps() {
    let config = config_with_fare("basic");
    let page = healthy_page();

    let result = run(&config, &page).await;

    assert!(result.succeeded(), "run failed: {:?}", result.failure());
    assert_eq!(result.steps.len(), 19);
    assert!(result
        .steps
        .iter()
        .all(|r| r.outcome == StepOutcome::Succeeded));
    assert_eq!(page.close_count(), 1);

    assert_eq!(
        page.filled(&selectors::first_name_input(1)),
        Some("Aoife".to_string())
    );
    assert!(page.clicked(&selectors::title_option("Mr")));
    assert!(page.clicked(&selectors::add_recommended_seats()));
    assert_eq!(
        page.calls().last(),
        Some(&PageCall::Pause(Duration::from_secs(3)))
    );
}

#[tokio::test]
async fn test_missing_affordances_do_not_abort() {
    let config = config_with_fare("basic");
    let page = healthy_page()
        .without_element(&selectors::consent_agree())
        .without_element(&selectors::login_prompt())
        .without_element(&selectors::upsell_takeover())
        .without_element(&selectors::calendar_cell("2025-06-01"));

    let result = run(&config, &page).await;

    assert!(result.succeeded(), "run failed: {:?}", result.failure());
    let skipped: Vec<&str> = result.skipped().map(|r| r.name.as_str()).collect();
    assert_eq!(
        skipped,
        vec![
            "Accept cookie consent",
            "Dismiss login prompt",
            "Dismiss upsell takeover"
        ]
    );
    assert!(page.clicked(&selectors::calendar_cell("2025-06-14")));
    assert_eq!(page.close_count(), 1);
}

#[tokio::test]
async fn test_destination_suggestion_timeout_aborts_before_dates() {
    let config = config_with_fare("basic");
    let page = healthy_page().without_element(&selectors::airport_suggestion("STN"));

    let result = run(&config, &page).await;

    let failure = result.failure().unwrap();
    assert_eq!(failure.name, "Fill destination airport");
    assert_eq!(result.steps.len(), 4);
    assert!(diagnostic(&result).contains("Timed out"));
    assert!(!page.touched(&selectors::departure_date_picker()));
    assert!(!page.touched(&selectors::calendar_cell("2025-06-14")));
    assert_eq!(page.close_count(), 1);
}

#[tokio::test]
async fn test_unsupported_fare_stops_before_login_prompt() {
    let config = config_with_fare("premium");
    let page = healthy_page();

    let result = run(&config, &page).await;

    assert_eq!(result.failure().unwrap().name, "Select fare");
    assert!(diagnostic(&result).contains("Not implemented: fare type 'premium'"));
    assert!(!result.reached("Dismiss login prompt"));
    assert!(!page.touched(&selectors::login_prompt()));
    assert_eq!(page.close_count(), 1);
}

#[tokio::test]
async fn test_seat_mismatch_aborts_before_recommended_seats() {
    let config = config_with_fare("basic");
    let page = healthy_page()
        .with_texts(&selectors::outbound_occupied_seats(), &["17A"])
        .with_texts(&selectors::inbound_occupied_seats(), &["21E"]);

    let result = run(&config, &page).await;

    assert_eq!(result.failure().unwrap().name, "Select seats");
    assert!(diagnostic(&result).contains("Expected 2 outbound seats, but found 1"));
    assert!(!page.clicked(&selectors::add_recommended_seats()));
    assert!(!result.reached("Select baggage option"));
    assert_eq!(page.close_count(), 1);
}

#[tokio::test]
async fn test_inbound_seat_mismatch_alone_aborts() {
    let config = config_with_fare("basic");
    let page = healthy_page().with_count(&selectors::inbound_occupied_seats(), 3);

    let result = run(&config, &page).await;

    assert!(diagnostic(&result).contains("Expected 2 inbound seats, but found 3"));
    assert!(!page.clicked(&selectors::add_recommended_seats()));
}

#[tokio::test]
async fn test_passenger_counter_mismatch_aborts() {
    let config = config_with_fare("basic");
    let page = healthy_page().with_text(&selectors::children_counter(), "1");

    let result = run(&config, &page).await;

    assert_eq!(result.failure().unwrap().name, "Set passenger count");
    assert!(diagnostic(&result).contains("Expected 0 children, but found 1"));
    assert!(!page.clicked(&selectors::passengers_done()));
    assert!(!page.clicked(&selectors::search()));
}

#[tokio::test]
async fn test_no_outbound_flights_aborts() {
    let config = config_with_fare("basic");
    let page = healthy_page().without_element(&selectors::flight_select("outbound"));

    let result = run(&config, &page).await;

    assert_eq!(result.failure().unwrap().name, "Select outbound flight");
    assert!(!page.touched(&selectors::flight_select("inbound")));
}

#[tokio::test]
async fn test_stalled_homepage_aborts_first_step() {
    let config = config_with_fare("basic");
    let page = healthy_page().with_stalled_network();

    let result = run(&config, &page).await;

    assert_eq!(result.steps.len(), 1);
    assert_eq!(result.failure().unwrap().number, 1);
    assert!(!page.touched(&selectors::consent_agree()));
    assert_eq!(page.close_count(), 1);
}

#[tokio::test]
async fn test_steps_issue_calls_in_order() {
    let config = config_with_fare("basic");
    let page = healthy_page();

    run(&config, &page).await;

    let calls = page.calls();
    let position = |selector: &Selector| {
        calls
            .iter()
            .position(|c| c.selector() == Some(selector.as_str()))
            .unwrap()
    };
    assert!(position(&selectors::departure_input()) < position(&selectors::destination_input()));
    assert!(position(&selectors::destination_input()) < position(&selectors::departure_date_picker()));
    assert!(position(&selectors::outbound_occupied_seats()) < position(&selectors::add_recommended_seats()));
    assert!(position(&selectors::small_bag_radios()) < calls.len() - 1);
}

#[tokio::test]
async fn test_every_mandatory_wait_timeout_aborts_at_its_step() {
    let config = config_with_fare("basic");
    let steps = checkout_steps(&config);
    let mut covered = Vec::new();

    for (index, step) in steps.iter().enumerate() {
        let selector = match (step.policy(), step.wait()) {
            (FailurePolicy::Mandatory, Some(Wait::Element { selector, .. })) => selector,
            _ => continue,
        };
        let number = index + 1;
        let page = healthy_page().without_element(selector);

        let result = run(&config, &page).await;

        let failure = result
            .failure()
            .unwrap_or_else(|| panic!("step {} ({}) did not fail", number, step.name()));
        assert_eq!(failure.number, number, "wrong abort point for {}", step.name());
        assert_eq!(result.steps.len(), number);
        assert!(diagnostic(&result).contains("Timed out"));
        assert_eq!(page.close_count(), 1);
        covered.push(number);
    }

    assert_eq!(covered, vec![3, 4, 5, 6, 7, 9, 10, 11, 13, 14, 16, 18]);
}
