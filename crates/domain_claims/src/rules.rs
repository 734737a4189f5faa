//! Rule invocation ports
//!
//! Benefit rules are configured declaratively outside this crate; the
//! calculator only sees them through the [`RuleInvoker`] port. Which level
//! of the product hierarchy defines a given rule kind is resolved by a
//! [`RuleChain`], a priority-ordered list of providers supplied explicitly
//! at the call site (option first, then coverage, then product).

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{BenefitId, Currency, OptionId, PartyId};

use crate::error::CalculationError;
use crate::indemnification::DetailKind;

/// The rule kinds the calculator invokes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleKind {
    Eligibility,
    Indemnification,
}

/// Evaluation context handed to every rule call
///
/// The evaluation date is pinned to the loss start date so that the rule
/// version in force when the loss occurred is the one applied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationContext {
    pub evaluation_date: NaiveDate,
    pub period_start: NaiveDate,
    pub period_end: Option<NaiveDate>,
    pub currency: Currency,
    pub claimant: PartyId,
    pub policy_owner: PartyId,
    pub option: OptionId,
    pub benefit: BenefitId,
    /// Reference key of the covered element the service applies to
    pub covered_data: Option<String>,
    pub complementary: BTreeMap<String, String>,
}

/// Eligibility verdict with operator-facing messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityOutcome {
    pub eligible: bool,
    pub messages: Vec<String>,
}

impl EligibilityOutcome {
    pub fn eligible() -> Self {
        Self {
            eligible: true,
            messages: Vec::new(),
        }
    }

    pub fn ineligible(message: impl Into<String>) -> Self {
        Self {
            eligible: false,
            messages: vec![message.into()],
        }
    }
}

/// One detail entry returned by an indemnification rule
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailEntry {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub amount_per_unit: Decimal,
    pub unit_count: Decimal,
}

/// Detail entries grouped by kind, as returned by an indemnification rule
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailSchedule {
    groups: BTreeMap<DetailKind, Vec<DetailEntry>>,
}

impl DetailSchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry to the given kind group
    pub fn push(&mut self, kind: DetailKind, entry: DetailEntry) {
        self.groups.entry(kind).or_default().push(entry);
    }

    /// Entries of one kind, empty when the rule returned none
    pub fn entries(&self, kind: DetailKind) -> &[DetailEntry] {
        self.groups.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// True when no kind group holds any entry
    pub fn is_empty(&self) -> bool {
        self.groups.values().all(Vec::is_empty)
    }
}

/// The (result, errors) pair every rule call returns
///
/// `result` is `None` when evaluation failed outright; errors may also
/// accompany a usable result.
#[derive(Debug, Clone)]
pub struct RuleEvaluation<T> {
    pub result: Option<T>,
    pub errors: Vec<CalculationError>,
}

impl<T> RuleEvaluation<T> {
    pub fn ok(result: T) -> Self {
        Self {
            result: Some(result),
            errors: Vec::new(),
        }
    }

    pub fn failed(errors: Vec<CalculationError>) -> Self {
        Self {
            result: None,
            errors,
        }
    }
}

/// Opaque evaluation of externally configured rules
pub trait RuleInvoker: Send + Sync {
    fn eligibility(&self, ctx: &CalculationContext) -> RuleEvaluation<EligibilityOutcome>;

    fn indemnification(&self, ctx: &CalculationContext) -> RuleEvaluation<DetailSchedule>;
}

/// One level of the product hierarchy that may define rules
pub trait RuleProvider: Send + Sync {
    fn has_rule(&self, kind: RuleKind) -> bool;

    fn rule(&self, kind: RuleKind) -> Option<&dyn RuleInvoker>;
}

/// Priority-ordered provider chain
///
/// The first provider declaring a rule of the requested kind wins.
pub struct RuleChain {
    providers: Vec<Arc<dyn RuleProvider>>,
}

impl RuleChain {
    pub fn new(providers: Vec<Arc<dyn RuleProvider>>) -> Self {
        Self { providers }
    }

    /// Resolves the invoker defining the given rule kind, if any
    pub fn resolve(&self, kind: RuleKind) -> Option<&dyn RuleInvoker> {
        self.providers
            .iter()
            .find(|provider| provider.has_rule(kind))
            .and_then(|provider| provider.rule(kind))
    }

    /// Evaluates the eligibility rule; a benefit with no eligibility rule
    /// anywhere in the chain is eligible by default
    pub fn eligibility(&self, ctx: &CalculationContext) -> RuleEvaluation<EligibilityOutcome> {
        match self.resolve(RuleKind::Eligibility) {
            Some(rule) => rule.eligibility(ctx),
            None => RuleEvaluation::ok(EligibilityOutcome::eligible()),
        }
    }

    /// Evaluates the indemnification rule; having none is an error
    pub fn indemnification(&self, ctx: &CalculationContext) -> RuleEvaluation<DetailSchedule> {
        match self.resolve(RuleKind::Indemnification) {
            Some(rule) => rule.indemnification(ctx),
            None => RuleEvaluation::failed(vec![CalculationError::Rule(format!(
                "no provider defines an indemnification rule for benefit {}",
                ctx.benefit
            ))]),
        }
    }
}
