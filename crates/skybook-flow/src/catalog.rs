//! The checkout flow as an ordered list of steps
//!
//! [`checkout_steps`] turns a validated [`BookingConfig`] into the 19 steps
//! of the booking run. Selectors live in [`selectors`] so tests can target
//! the same elements the steps do.

use crate::step::{Action, Assertion, Step};
use skybook_browser::Selector;
use skybook_core::{BookingConfig, FareType, Passenger, TimeoutClass};
use std::time::Duration;

/// Delay after ticking the bag options, so the page registers them
const BAG_SETTLE: Duration = Duration::from_secs(2);

/// Final pause before teardown, so the last page can be viewed
const FINAL_PAUSE: Duration = Duration::from_secs(3);

pub mod selectors {
    use skybook_browser::Selector;

    pub fn consent_agree() -> Selector {
        Selector::with_text("button", "Agree")
    }

    pub fn departure_input() -> Selector {
        Selector::css("input[id=\"input-button__departure\"]")
    }

    pub fn destination_input() -> Selector {
        Selector::css("input[id=\"input-button__destination\"]")
    }

    /// Airport suggestion in the search dropdown
    pub fn airport_suggestion(code: &str) -> Selector {
        Selector::css(format!("span[data-id=\"{}\"]", code))
    }

    pub fn departure_date_picker() -> Selector {
        Selector::css(
            "div[data-ref=\"input-button__dates-from\"] div[data-ref=\"input-button__display-value\"]",
        )
    }

    /// Calendar month tab or day cell
    pub fn calendar_cell(id: &str) -> Selector {
        Selector::css(format!("div[data-id=\"{}\"]", id))
    }

    pub fn adults_picker() -> Selector {
        Selector::css("[data-ref=\"passengers-picker__adults\"]")
    }

    pub fn adults_increment() -> Selector {
        Selector::css(
            "[data-ref=\"passengers-picker__adults\"] div[class=\"counter__button-wrapper--enabled\"]",
        )
    }

    pub fn adults_counter() -> Selector {
        Selector::css("[data-ref=\"passengers-picker__adults\"] [data-ref=\"counter.counter__value\"]")
    }

    pub fn children_counter() -> Selector {
        Selector::css(
            "[data-ref=\"passengers-picker__children\"] [data-ref=\"counter.counter__value\"]",
        )
    }

    pub fn passengers_done() -> Selector {
        Selector::with_text("button", "Done")
    }

    pub fn search() -> Selector {
        Selector::with_text("button", "Search")
    }

    /// "Select" buttons inside the outbound or inbound flight cards
    pub fn flight_select(leg: &str) -> Selector {
        Selector::with_text_under(
            &format!("//*[@data-e2e=\"flight-card--{}\"]", leg),
            "button",
            "Select",
        )
    }

    pub fn standard_fare_card() -> Selector {
        Selector::css("[data-e2e=\"fare-card-standard\"]")
    }

    pub fn continue_with_basic() -> Selector {
        Selector::with_text("button", "Continue with Basic")
    }

    pub fn login_prompt() -> Selector {
        Selector::css("div[class=\"login-touchpoint\"]")
    }

    pub fn login_later() -> Selector {
        Selector::with_text_under("//div[@class=\"login-touchpoint\"]", "span", "Log in later")
    }

    /// Title dropdown toggle of the `index`-th adult's form
    pub fn title_dropdown(index: usize) -> Selector {
        Selector::css(format!(
            "[data-ref=\"pax-details__ADT-{}\"] button[class=\"dropdown__toggle body-l-lg body-l-sm\"]",
            index
        ))
    }

    pub fn title_option(title: &str) -> Selector {
        Selector::with_exact_text("button", title)
    }

    pub fn first_name_input(index: usize) -> Selector {
        Selector::css(format!("input[id=\"form.passengers.ADT-{}.name\"]", index))
    }

    pub fn surname_input(index: usize) -> Selector {
        Selector::css(format!("input[id=\"form.passengers.ADT-{}.surname\"]", index))
    }

    pub fn continue_button() -> Selector {
        Selector::with_text("button", "Continue")
    }

    pub fn seat_map() -> Selector {
        Selector::css("div[class=\"seats-container__content\"]")
    }

    pub fn outbound_occupied_seats() -> Selector {
        Selector::css(
            "td.passenger-carousel__table-cell-seat--active-column seat .seat__seat--occupied",
        )
    }

    pub fn inbound_occupied_seats() -> Selector {
        Selector::css(
            "td.passenger-carousel__table-cell-seat:not(.passenger-carousel__table-cell-seat--active-column) seat .seat__seat--occupied",
        )
    }

    pub fn add_recommended_seats() -> Selector {
        Selector::with_text("button", "Add recommended seats")
    }

    pub fn upsell_takeover() -> Selector {
        Selector::css(
            "div[data-ref=\"enhanced-takeover-beta-desktop__FAST_VISUAL_TAKEOVER_2\"]",
        )
    }

    pub fn decline_upsell() -> Selector {
        Selector::with_text("button", "No, thanks")
    }

    pub fn small_bag_radios() -> Selector {
        Selector::css("input[type=\"radio\"][value=\"small-bag\"]")
    }
}

/// Build the booking run for `config`
pub fn checkout_steps(config: &BookingConfig) -> Vec<Step> {
    let flight = &config.flight_details;
    let adults = &config.passengers.adults;

    let mut steps = vec![
        Step::mandatory("Navigate home")
            .then(Action::Navigate(config.browser_settings.base_url.clone()))
            .then(Action::WaitForNetworkIdle(TimeoutClass::Navigation))
            .narrate("Navigated to homepage."),
        Step::optional("Accept cookie consent")
            .wait_for(selectors::consent_agree(), TimeoutClass::Ui)
            .then(Action::Click(selectors::consent_agree()))
            .narrate("Accepted privacy settings."),
        airport_step(
            "Fill departure airport",
            "departure airport",
            selectors::departure_input(),
            &flight.departure_airport,
            &flight.departure_code,
        ),
        airport_step(
            "Fill destination airport",
            "destination airport",
            selectors::destination_input(),
            &flight.destination_airport,
            &flight.destination_code,
        ),
        Step::mandatory("Select departure date")
            .wait_for(selectors::departure_date_picker(), TimeoutClass::Ui)
            .then(Action::Click(selectors::departure_date_picker()))
            .then(Action::ClickIfPresent {
                selector: selectors::calendar_cell(&flight.departure_month),
                timeout: TimeoutClass::Ui,
                label: format!("{} month tab", flight.departure_month),
            })
            .then(Action::WaitFor {
                selector: selectors::calendar_cell(&flight.departure_date),
                timeout: TimeoutClass::Ui,
            })
            .then(Action::Click(selectors::calendar_cell(&flight.departure_date)))
            .narrate(format!("Selected departure date as {}.", flight.departure_date)),
        Step::mandatory("Select return date")
            .wait_for(selectors::calendar_cell(&flight.return_date), TimeoutClass::Ui)
            .then(Action::Click(selectors::calendar_cell(&flight.return_date)))
            .narrate(format!("Selected return date as {}.", flight.return_date)),
        passenger_count_step(adults.len()),
        Step::mandatory("Search")
            .then(Action::Click(selectors::search()))
            .then(Action::WaitForNetworkIdle(TimeoutClass::Navigation))
            .narrate("Clicked on Search button to find flights."),
        flight_step("Select outbound flight", "outbound"),
        flight_step("Select inbound flight", "inbound"),
        fare_step(&config.booking_preferences.fare_type),
        Step::optional("Dismiss login prompt")
            .wait_for(selectors::login_prompt(), TimeoutClass::Ui)
            .then(Action::Click(selectors::login_later()))
            .narrate("Chose to log in later."),
    ];

    steps.extend(
        adults
            .iter()
            .enumerate()
            .map(|(index, passenger)| passenger_details_step(index, passenger)),
    );

    steps.extend([
        Step::mandatory("Continue")
            .then(Action::Click(selectors::continue_button()))
            .narrate("Clicked to continue."),
        seat_step(adults.len()),
        Step::optional("Dismiss upsell takeover")
            .wait_for(selectors::upsell_takeover(), TimeoutClass::Ui)
            .then(Action::Click(selectors::decline_upsell()))
            .narrate("Declined the upsell offer."),
        Step::mandatory("Select baggage option")
            .wait_for(selectors::small_bag_radios(), TimeoutClass::PageLoad)
            .then(Action::ForceClickAll(selectors::small_bag_radios()))
            .then(Action::Pause(BAG_SETTLE))
            .then(Action::WaitFor {
                selector: selectors::continue_button(),
                timeout: TimeoutClass::Ui,
            })
            .then(Action::Click(selectors::continue_button()))
            .narrate("Clicked to continue with bag selection."),
        Step::mandatory("Final settle pause")
            .then(Action::Pause(FINAL_PAUSE))
            .narrate("Finally, paused for 3 seconds so you can view."),
    ]);

    steps
}

fn airport_step(name: &str, label: &str, input: Selector, airport: &str, code: &str) -> Step {
    Step::mandatory(name)
        .wait_for(input.clone(), TimeoutClass::Ui)
        .then(Action::Fill {
            selector: input,
            value: airport.to_string(),
        })
        .then(Action::WaitFor {
            selector: selectors::airport_suggestion(code),
            timeout: TimeoutClass::Ui,
        })
        .then(Action::Click(selectors::airport_suggestion(code)))
        .narrate(format!("Filled in {} as {} ({}).", label, airport, code))
}

/// The picker starts at one adult; click up to `adults` and verify the counters
fn passenger_count_step(adults: usize) -> Step {
    let mut step = Step::mandatory("Set passenger count")
        .wait_for(selectors::adults_picker(), TimeoutClass::Ui);
    for _ in 1..adults {
        step = step.then(Action::Click(selectors::adults_increment()));
    }
    step.check(Assertion::TextEquals {
        label: "adults".to_string(),
        selector: selectors::adults_counter(),
        expected: adults.to_string(),
    })
    .check(Assertion::TextEquals {
        label: "children".to_string(),
        selector: selectors::children_counter(),
        expected: "0".to_string(),
    })
    .after_checks(Action::Click(selectors::passengers_done()))
    .narrate(format!("Passenger picker set to {} adults.", adults))
}

fn flight_step(name: &str, leg: &str) -> Step {
    Step::mandatory(name)
        .wait_for(selectors::flight_select(leg), TimeoutClass::PageLoad)
        .then(Action::ClickFirst {
            selector: selectors::flight_select(leg),
            missing: format!("No Select button found in {} flights section.", leg),
        })
        .narrate(format!("Selected the first available {} flight.", leg))
}

fn fare_step(fare: &FareType) -> Step {
    match fare {
        FareType::Basic => Step::mandatory("Select fare")
            .wait_for(selectors::standard_fare_card(), TimeoutClass::PageLoad)
            .then(Action::Click(selectors::standard_fare_card()))
            .then(Action::Click(selectors::continue_with_basic()))
            .narrate("Selected the Basic fare."),
        FareType::Unsupported(name) => Step::mandatory("Select fare")
            .then(Action::Fail(format!("fare type '{}'", name))),
    }
}

fn passenger_details_step(index: usize, passenger: &Passenger) -> Step {
    Step::mandatory(format!("Fill passenger {} details", index + 1))
        .wait_for(selectors::title_dropdown(index), TimeoutClass::PageLoad)
        .then(Action::Click(selectors::title_dropdown(index)))
        .then(Action::Click(selectors::title_option(&passenger.title)))
        .then(Action::Fill {
            selector: selectors::first_name_input(index),
            value: passenger.first_name.clone(),
        })
        .then(Action::Fill {
            selector: selectors::surname_input(index),
            value: passenger.surname.clone(),
        })
        .narrate(format!("Filled in Passenger {} details.", index + 1))
}

fn seat_step(adults: usize) -> Step {
    Step::mandatory("Select seats")
        .wait_for(selectors::seat_map(), TimeoutClass::PageLoad)
        .then(Action::WaitForNetworkIdle(TimeoutClass::Navigation))
        .check(Assertion::CountEquals {
            label: "outbound seats".to_string(),
            selector: selectors::outbound_occupied_seats(),
            expected: adults,
            report_each: true,
        })
        .check(Assertion::CountEquals {
            label: "inbound seats".to_string(),
            selector: selectors::inbound_occupied_seats(),
            expected: adults,
            report_each: true,
        })
        .after_checks(Action::Click(selectors::add_recommended_seats()))
        .narrate("Selected recommended seats.")
}
