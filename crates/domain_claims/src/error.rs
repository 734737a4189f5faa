//! Claim domain errors

use chrono::NaiveDate;
use thiserror::Error;

use core_kernel::{Currency, PortError};

/// Errors raised by state-machine and structural operations
#[derive(Debug, Error)]
pub enum ClaimError {
    #[error("Invalid status transition from {from} to {to}")]
    InvalidStatusTransition { from: String, to: String },

    #[error("Loss descriptor {descriptor} requires an end date")]
    EndDateRequired { descriptor: String },

    #[error("A relapse must reference a loss of the same claim")]
    RelapseOutsideClaim,

    #[error("Indemnification not found: {0}")]
    IndemnificationNotFound(String),

    #[error(transparent)]
    Port(#[from] PortError),
}

/// Business failures of one calculation pass
///
/// These are carried as values inside a [`CalculationOutcome`], never
/// panicked, so an orchestrator calculating many services can aggregate
/// partial results without aborting siblings.
///
/// [`CalculationOutcome`]: crate::service::CalculationOutcome
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalculationError {
    /// Surfaced verbatim from the external rule invoker
    #[error("rule evaluation failed: {0}")]
    Rule(String),

    /// The eligibility rule rejected the service; a business outcome, not a
    /// failure
    #[error("not eligible: {0}")]
    Ineligible(String),

    /// A rule call produced no detail lines for the requested period
    #[error("no detail lines for {currency} period starting {start}")]
    MissingDetails { start: NaiveDate, currency: Currency },

    /// Conversion of a local-currency result to the main currency failed
    #[error("currency conversion failed: {0}")]
    Conversion(String),
}
