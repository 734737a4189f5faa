//! Claim Indemnification Domain
//!
//! This crate implements the computation of the compensation owed for an
//! insured loss, its reconciliation against amounts already disbursed, and
//! the per-claim status indicators that drive downstream workflow.
//!
//! # Indemnification lifecycle
//!
//! ```text
//! calculated -> validated -> paid
//!            -> rejected
//! ```
//!
//! Records in `calculated` status are transient: every calculation run of a
//! delivered service replaces them wholesale. Validated, rejected and paid
//! records are durable and only explicit user or batch actions move them.

pub mod batch;
pub mod claim;
pub mod error;
pub mod indemnification;
pub mod loss;
pub mod ports;
pub mod rules;
pub mod selector;
pub mod service;

pub use batch::{
    apply_decisions, build_working_set, ReviewDecision, ReviewItem, ReviewOutcome,
    DEFAULT_SEARCH_SIZE,
};
pub use claim::{Claim, ClaimStatus, ReopenedReason, SubStatus};
pub use error::{CalculationError, ClaimError};
pub use indemnification::{
    DetailKind, DetailLine, Indemnification, IndemnificationKind, IndemnificationStatus,
};
pub use loss::{EventDescriptor, Loss, LossDescriptor};
pub use ports::{CurrencyConverter, DocumentRequests, IndemnificationStore};
pub use rules::{
    CalculationContext, DetailEntry, DetailSchedule, EligibilityOutcome, RuleChain,
    RuleEvaluation, RuleInvoker, RuleKind, RuleProvider,
};
pub use selector::{Selector, SelectorError};
pub use service::{
    Benefit, CalculationInputs, CalculationOutcome, DeliveredService, Expense, ReplacementDiff,
    ServiceStatus,
};
