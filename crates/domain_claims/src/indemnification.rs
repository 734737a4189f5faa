//! Indemnification and detail line model
//!
//! An indemnification is one computed (or manually entered) compensation
//! record owned by a delivered service. While in `calculated` status it is a
//! transient result the calculator may replace wholesale; once validated it
//! becomes durable and only explicit validate/reject/pay actions move it.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, DetailLineId, IndemnificationId, Money, PartyId, ServiceId};

use crate::claim::SubStatus;
use crate::error::{CalculationError, ClaimError};
use crate::ports::CurrencyConverter;
use crate::rules::{DetailEntry, DetailSchedule};

/// How a benefit pays out, derived from the benefit definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndemnificationKind {
    /// One-off lump sum
    Capital,
    /// Recurring payment over a date range
    Period,
    /// Lifetime or fixed-term annuity
    Annuity,
}

/// Indemnification lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndemnificationStatus {
    /// Replaceable result of the last calculation run
    Calculated,
    /// Approved by an operator, durable
    Validated,
    /// Refused by an operator
    Rejected,
    /// Disbursed
    Paid,
}

/// Detail line kinds, in the fixed order used to assemble an indemnification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailKind {
    WaitingPeriod,
    Deductible,
    Benefit,
    Limit,
    Regularization,
}

impl DetailKind {
    /// Assembly order. The last end date encountered in this order becomes
    /// the indemnification end date.
    pub const ORDER: [DetailKind; 5] = [
        DetailKind::WaitingPeriod,
        DetailKind::Deductible,
        DetailKind::Benefit,
        DetailKind::Limit,
        DetailKind::Regularization,
    ];
}

/// One itemized component of an indemnification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailLine {
    pub id: DetailLineId,
    pub indemnification_id: IndemnificationId,
    pub kind: DetailKind,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub amount_per_unit: Decimal,
    pub unit_count: Decimal,
    amount: Decimal,
}

impl DetailLine {
    pub(crate) fn new(
        indemnification_id: IndemnificationId,
        kind: DetailKind,
        entry: &DetailEntry,
    ) -> Self {
        Self {
            id: DetailLineId::new_v7(),
            indemnification_id,
            kind,
            start_date: entry.start_date,
            end_date: entry.end_date,
            amount_per_unit: entry.amount_per_unit,
            unit_count: entry.unit_count,
            amount: entry.amount_per_unit * entry.unit_count,
        }
    }

    /// Always the product of amount-per-unit and unit count
    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

/// A computed or manually entered compensation record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Indemnification {
    pub id: IndemnificationId,
    pub service_id: ServiceId,
    pub kind: IndemnificationKind,
    pub status: IndemnificationStatus,
    /// Meaningful for period-kind benefits only
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Currency-rounded amount in the service's main currency
    pub amount: Money,
    /// Set only when the rule computed in a currency other than the main one
    pub local_amount: Option<Money>,
    pub beneficiary: PartyId,
    pub customer: PartyId,
    /// User-entered overrides are never silently replaced by the calculator
    pub manual: bool,
    pub details: Vec<DetailLine>,
}

impl Indemnification {
    /// Drafts a calculated indemnification for a service; beneficiary and
    /// customer both default to the claimant.
    pub(crate) fn draft(
        service_id: ServiceId,
        kind: IndemnificationKind,
        claimant: PartyId,
        main_currency: Currency,
    ) -> Self {
        Self {
            id: IndemnificationId::new_v7(),
            service_id,
            kind,
            status: IndemnificationStatus::Calculated,
            start_date: None,
            end_date: None,
            amount: Money::zero(main_currency),
            local_amount: None,
            beneficiary: claimant,
            customer: claimant,
            manual: false,
            details: Vec::new(),
        }
    }

    /// Creates a user-entered record the calculator must leave alone
    pub fn manual_entry(
        service_id: ServiceId,
        kind: IndemnificationKind,
        claimant: PartyId,
        amount: Money,
    ) -> Self {
        Self {
            amount,
            manual: true,
            ..Self::draft(service_id, kind, claimant, amount.currency())
        }
    }

    /// Builds the detail lines from a rule schedule and rolls up amount and
    /// dates.
    ///
    /// Detail construction is all-or-nothing: on error the record is left
    /// without details and is not kept by the calculator. The start date is
    /// the minimum of all detail start dates; the end date is the last one
    /// encountered in kind-enumeration order.
    pub(crate) fn assemble(
        &mut self,
        schedule: &DetailSchedule,
        main_currency: Currency,
        currency: Currency,
        fx: &dyn CurrencyConverter,
    ) -> Result<(), CalculationError> {
        self.details.clear();
        let mut start: Option<NaiveDate> = None;
        let mut end: Option<NaiveDate> = None;
        let mut total = Decimal::ZERO;

        for kind in DetailKind::ORDER {
            for entry in schedule.entries(kind) {
                let line = DetailLine::new(self.id, kind, entry);
                if let Some(line_start) = line.start_date {
                    start = Some(match start {
                        Some(current) if current <= line_start => current,
                        _ => line_start,
                    });
                }
                if let Some(line_end) = line.end_date {
                    end = Some(line_end);
                }
                total += line.amount();
                self.details.push(line);
            }
        }

        if currency == main_currency {
            self.local_amount = None;
            self.amount = Money::new(total, main_currency).round_to_currency();
        } else {
            let local = Money::new(total, currency);
            self.local_amount = Some(local.round_to_currency());
            let converted = fx
                .convert(local, main_currency)
                .map_err(|error| CalculationError::Conversion(error.to_string()))?;
            self.amount = converted.round_to_currency();
        }
        self.start_date = start;
        self.end_date = end;
        Ok(())
    }

    /// The currency this record was computed in
    pub fn computation_currency(&self, main_currency: Currency) -> Currency {
        self.local_amount
            .map(|local| local.currency())
            .unwrap_or(main_currency)
    }

    /// Approves a calculated indemnification
    pub fn validate(&mut self) -> Result<(), ClaimError> {
        self.transition_from_calculated(IndemnificationStatus::Validated)
    }

    /// Refuses a calculated indemnification
    pub fn reject(&mut self) -> Result<(), ClaimError> {
        self.transition_from_calculated(IndemnificationStatus::Rejected)
    }

    fn transition_from_calculated(
        &mut self,
        target: IndemnificationStatus,
    ) -> Result<(), ClaimError> {
        if self.status != IndemnificationStatus::Calculated {
            return Err(ClaimError::InvalidStatusTransition {
                from: format!("{:?}", self.status),
                to: format!("{:?}", target),
            });
        }
        self.status = target;
        Ok(())
    }

    /// Moves a validated indemnification with a positive amount to paid;
    /// anything else is left untouched.
    pub fn complete(&mut self) {
        if self.status == IndemnificationStatus::Validated && self.amount.is_positive() {
            self.status = IndemnificationStatus::Paid;
        }
    }

    /// True while money is still owed on this record
    pub fn is_pending(&self) -> bool {
        self.amount.is_positive()
            && !matches!(
                self.status,
                IndemnificationStatus::Paid | IndemnificationStatus::Rejected
            )
    }

    /// Contribution of this record to the claim-level sub-status
    pub fn claim_sub_status(&self) -> SubStatus {
        match self.status {
            IndemnificationStatus::Calculated => SubStatus::WaitingValidation,
            IndemnificationStatus::Validated => SubStatus::Validated,
            IndemnificationStatus::Paid => SubStatus::Paid,
            IndemnificationStatus::Rejected => SubStatus::Instruction,
        }
    }
}
