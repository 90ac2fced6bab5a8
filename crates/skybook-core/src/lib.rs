//! # skybook-core
//!
//! Core types for skybook, a config-driven flight checkout automation.
//!
//! - [`config`]: the booking configuration (itinerary, passengers, fare,
//!   browser settings), its validation and file discovery
//! - [`fail_open`]: helpers for interactions that are allowed to miss
//! - [`SkybookError`]: the error type shared by every skybook crate

pub mod config;
mod error;
pub mod fail_open;

pub use config::{
    BookingConfig, BookingPreferences, BrowserSettings, FareType, Itinerary, Passenger,
    PassengerList, TimeoutClass, REQUIRED_ADULTS,
};
pub use error::{Result, SkybookError};
