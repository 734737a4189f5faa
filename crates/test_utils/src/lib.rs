//! Shared test utilities for the claim indemnification workspace
//!
//! Provides aggregate builders with sensible defaults, money assertions,
//! and scripted in-memory implementations of the domain ports so that
//! integration tests can drive the calculator without a rule engine or a
//! database.

pub mod assertions;
pub mod builders;
pub mod stubs;

pub use assertions::{assert_money_eq, assert_rolled_up};
pub use builders::{
    benefit, claim_with_service, daily_benefit, date, entry, loss_descriptor, schedule_of,
    service_of,
};
pub use stubs::{DocumentsComplete, DocumentsPending, FixedRates, RecordingStore, ScriptedRules};
