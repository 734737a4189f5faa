//! Delivered service and the indemnification calculator
//!
//! A delivered service binds a loss to a contractual option and a benefit.
//! Its calculator invokes the externally configured rules, splits the
//! requested period into sub-periods when a rule only resolves part of it,
//! and replaces the service's `calculated` indemnifications with fresh
//! results without ever double-counting amounts already paid.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use core_kernel::{
    day_after, BenefitId, Currency, IndemnificationId, LossId, Money, OptionId, PartyId, ServiceId,
};

use crate::claim::SubStatus;
use crate::error::CalculationError;
use crate::indemnification::{
    DetailKind, Indemnification, IndemnificationKind, IndemnificationStatus,
};
use crate::ports::CurrencyConverter;
use crate::rules::{CalculationContext, DetailEntry, RuleChain};

/// Delivered service lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceStatus {
    /// Benefit attached, nothing computed yet
    Applicable,
    /// The eligibility rule rejected the benefit
    NotEligible,
    /// Indemnifications reflect the last calculation run
    Calculated,
    /// Everything owed has been settled
    Delivered,
}

/// Benefit descriptor attached to a delivered service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Benefit {
    pub id: BenefitId,
    pub name: String,
    pub kind: IndemnificationKind,
}

/// An expense linked to a service; its currency widens the set of
/// currencies a calculation has to cover
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub label: String,
    pub amount: Money,
}

/// The pairing of a loss with a contractual benefit being evaluated or paid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveredService {
    pub id: ServiceId,
    pub loss_id: LossId,
    pub option: OptionId,
    pub benefit: Benefit,
    pub status: ServiceStatus,
    /// Main currency, taken from the subscribed option
    pub currency: Currency,
    pub complementary: BTreeMap<String, String>,
    pub expenses: Vec<Expense>,
    /// Ordered by start date
    pub indemnifications: Vec<Indemnification>,
}

/// Loss-level context and external collaborators for one calculation run
pub struct CalculationInputs<'a> {
    pub loss_start: NaiveDate,
    pub loss_end: Option<NaiveDate>,
    pub claimant: PartyId,
    pub policy_owner: PartyId,
    /// Reference key of the covered element
    pub covered_data: Option<String>,
    pub rules: &'a RuleChain,
    pub fx: &'a dyn CurrencyConverter,
}

/// Identifier sets describing one purge-and-recreate replacement, applied
/// atomically by the persistence layer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplacementDiff {
    pub created: Vec<IndemnificationId>,
    pub deleted: Vec<IndemnificationId>,
    pub kept: Vec<IndemnificationId>,
}

/// What one `calculate` call did, as a (success, errors) pair plus the
/// replacement diff for the persistence layer
#[derive(Debug)]
pub struct CalculationOutcome {
    pub success: bool,
    pub errors: Vec<CalculationError>,
    pub diff: ReplacementDiff,
}

impl CalculationOutcome {
    fn failed(errors: Vec<CalculationError>) -> Self {
        Self {
            success: false,
            errors,
            diff: ReplacementDiff::default(),
        }
    }
}

impl DeliveredService {
    /// Creates a service for a benefit attached to a loss
    pub fn new(loss_id: LossId, option: OptionId, benefit: Benefit, currency: Currency) -> Self {
        Self {
            id: ServiceId::new_v7(),
            loss_id,
            option,
            benefit,
            status: ServiceStatus::Applicable,
            currency,
            complementary: BTreeMap::new(),
            expenses: Vec::new(),
            indemnifications: Vec::new(),
        }
    }

    /// Distinct currencies in play: the main currency plus every expense
    /// currency, first occurrence first
    fn currencies_in_play(&self) -> Vec<Currency> {
        let mut currencies = vec![self.currency];
        for expense in &self.expenses {
            let currency = expense.amount.currency();
            if !currencies.contains(&currency) {
                currencies.push(currency);
            }
        }
        currencies
    }

    fn base_context(&self, inputs: &CalculationInputs<'_>) -> CalculationContext {
        CalculationContext {
            evaluation_date: inputs.loss_start,
            period_start: inputs.loss_start,
            period_end: inputs.loss_end,
            currency: self.currency,
            claimant: inputs.claimant,
            policy_owner: inputs.policy_owner,
            option: self.option,
            benefit: self.benefit.id,
            covered_data: inputs.covered_data.clone(),
            complementary: self.complementary.clone(),
        }
    }

    /// Runs the full calculation for this service.
    ///
    /// Checks eligibility first, then replaces the stale `calculated`
    /// indemnifications of every currency in play with freshly computed
    /// ones. A failed currency does not roll back results already produced
    /// for sibling currencies within the same call.
    ///
    /// At most one `calculate` invocation may run against a given service
    /// at a time; the caller must serialize runs (row lock or version
    /// check) and apply the returned diff atomically together with the
    /// in-memory replacement.
    pub fn calculate(&mut self, inputs: &CalculationInputs<'_>) -> CalculationOutcome {
        let mut ctx = self.base_context(inputs);

        let evaluation = inputs.rules.eligibility(&ctx);
        let mut errors = evaluation.errors;
        match evaluation.result {
            Some(outcome) if !outcome.eligible => {
                self.status = ServiceStatus::NotEligible;
                errors.extend(outcome.messages.into_iter().map(CalculationError::Ineligible));
                debug!(service = %self.id, "benefit not eligible, keeping existing indemnifications");
                return CalculationOutcome::failed(errors);
            }
            Some(_) => {}
            None => return CalculationOutcome::failed(errors),
        }

        let mut success = true;
        let mut diff = ReplacementDiff::default();
        for currency in self.currencies_in_play() {
            ctx.currency = currency;
            let ok = self.replace_for_currency(&mut ctx, inputs, &mut diff, &mut errors);
            if !ok {
                warn!(service = %self.id, %currency, "calculation failed for currency");
            }
            success &= ok;
        }

        diff.kept = self
            .indemnifications
            .iter()
            .map(|indemnification| indemnification.id)
            .filter(|id| !diff.created.contains(id))
            .collect();
        self.indemnifications
            .sort_by_key(|indemnification| indemnification.start_date);
        self.status = ServiceStatus::Calculated;
        debug!(
            service = %self.id,
            created = diff.created.len(),
            deleted = diff.deleted.len(),
            "calculation finished"
        );
        CalculationOutcome {
            success,
            errors,
            diff,
        }
    }

    /// Replaces this currency's stale results with fresh ones, invoking the
    /// rule repeatedly until the requested window is covered
    fn replace_for_currency(
        &mut self,
        ctx: &mut CalculationContext,
        inputs: &CalculationInputs<'_>,
        diff: &mut ReplacementDiff,
        errors: &mut Vec<CalculationError>,
    ) -> bool {
        // Identified up front, removed only once every continuation call for
        // this currency has run. Manual entries are never discarded.
        let stale: Vec<IndemnificationId> = self
            .indemnifications
            .iter()
            .filter(|indemnification| {
                indemnification.status == IndemnificationStatus::Calculated
                    && !indemnification.manual
                    && indemnification.computation_currency(self.currency) == ctx.currency
            })
            .map(|indemnification| indemnification.id)
            .collect();

        ctx.period_start = inputs.loss_start;
        let (mut latest, mut spawn_errors) = self.spawn_indemnification(ctx, inputs, diff);
        errors.append(&mut spawn_errors);
        let mut ok = latest.is_some();

        if let Some(target_end) = ctx.period_end {
            // The rule resolved only part of the window: resume the day
            // after the produced end date until the window is covered.
            loop {
                let Some(index) = latest else { break };
                let Some(last_end) = self.indemnifications[index].end_date else {
                    break;
                };
                if last_end >= target_end {
                    break;
                }
                ctx.period_start = day_after(last_end);
                let (next, mut continuation_errors) =
                    self.spawn_indemnification(ctx, inputs, diff);
                errors.append(&mut continuation_errors);
                if next.is_none() {
                    ok = false;
                    break;
                }
                latest = next;
            }
        }

        self.indemnifications
            .retain(|indemnification| !stale.contains(&indemnification.id));
        diff.deleted.extend(stale);
        ok
    }

    /// One rule invocation producing one indemnification, regularized
    /// against amounts already paid in this currency
    fn spawn_indemnification(
        &mut self,
        ctx: &CalculationContext,
        inputs: &CalculationInputs<'_>,
        diff: &mut ReplacementDiff,
    ) -> (Option<usize>, Vec<CalculationError>) {
        let evaluation = inputs.rules.indemnification(ctx);
        if !evaluation.errors.is_empty() {
            return (None, evaluation.errors);
        }
        let Some(mut schedule) = evaluation.result else {
            return (
                None,
                vec![CalculationError::Rule(
                    "indemnification rule returned no result".into(),
                )],
            );
        };
        if schedule.is_empty() {
            return (
                None,
                vec![CalculationError::MissingDetails {
                    start: ctx.period_start,
                    currency: ctx.currency,
                }],
            );
        }

        let mut indemnification = Indemnification::draft(
            self.id,
            self.benefit.kind,
            ctx.claimant,
            self.currency,
        );

        // Offset what was already paid in this currency so cumulative
        // paid-plus-due reflects only the increment still owed.
        let paid = self.paid_total_in(ctx.currency);
        if !paid.is_zero() {
            schedule.push(
                DetailKind::Regularization,
                DetailEntry {
                    start_date: None,
                    end_date: None,
                    amount_per_unit: paid,
                    unit_count: Decimal::NEGATIVE_ONE,
                },
            );
        }

        if let Err(error) =
            indemnification.assemble(&schedule, self.currency, ctx.currency, inputs.fx)
        {
            return (None, vec![error]);
        }

        diff.created.push(indemnification.id);
        self.indemnifications.push(indemnification);
        (Some(self.indemnifications.len() - 1), Vec::new())
    }

    /// Total already paid for this service in the given computation currency
    fn paid_total_in(&self, currency: Currency) -> Decimal {
        self.indemnifications
            .iter()
            .filter(|indemnification| {
                indemnification.status == IndemnificationStatus::Paid
                    && indemnification.computation_currency(self.currency) == currency
            })
            .map(|indemnification| match indemnification.local_amount {
                Some(local) => local.amount(),
                None => indemnification.amount.amount(),
            })
            .sum()
    }

    /// Completes validated indemnifications and marks the service delivered
    /// once nothing is pending anymore
    pub fn settle(&mut self) {
        for indemnification in &mut self.indemnifications {
            indemnification.complete();
        }
        let any_settled = self
            .indemnifications
            .iter()
            .any(|indemnification| !indemnification.is_pending());
        let any_pending = self
            .indemnifications
            .iter()
            .any(Indemnification::is_pending);
        if any_settled && !any_pending {
            self.status = ServiceStatus::Delivered;
        }
    }

    /// Contribution of this service to the claim-level sub-status
    pub fn claim_sub_status(&self) -> Vec<SubStatus> {
        if !self.indemnifications.is_empty() {
            self.indemnifications
                .iter()
                .map(Indemnification::claim_sub_status)
                .collect()
        } else if self.status == ServiceStatus::NotEligible {
            vec![SubStatus::Rejected]
        } else {
            vec![SubStatus::Instruction]
        }
    }
}
