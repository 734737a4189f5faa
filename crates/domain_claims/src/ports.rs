//! Domain ports for external collaborators
//!
//! Adapters implement these against the real systems; the domain only sees
//! the traits.

use core_kernel::{ClaimId, Currency, DomainPort, Money, PortError, ServiceId};

use crate::service::ReplacementDiff;

/// Currency conversion, external to this crate; rounding lives on
/// [`Money::round_to_currency`]
pub trait CurrencyConverter: Send + Sync {
    fn convert(&self, amount: Money, to: Currency) -> Result<Money, PortError>;
}

/// Read-only view of document-request completeness for a claim
///
/// The engine only consumes the boolean; chasing the documents is someone
/// else's workflow.
pub trait DocumentRequests: Send + Sync {
    fn is_complete(&self, claim: ClaimId) -> bool;
}

/// Persistence boundary for indemnification collections
///
/// The diff of one calculation run must be applied atomically: a failure
/// partway through must not leave a mix of stale and fresh `calculated`
/// records visible. Callers also serialize `calculate` runs per service.
pub trait IndemnificationStore: DomainPort {
    fn apply(&mut self, service: ServiceId, diff: &ReplacementDiff) -> Result<(), PortError>;
}
