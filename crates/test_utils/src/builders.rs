//! Test data builders
//!
//! Construct claim aggregates and rule schedules with sensible defaults so
//! tests only specify the fields they care about.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use core_kernel::{Currency, OptionId, PartyId};
use domain_claims::{
    Benefit, Claim, DeliveredService, DetailEntry, DetailKind, DetailSchedule,
    IndemnificationKind, LossDescriptor,
};

/// Shorthand for building a calendar date in tests
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
}

/// A loss descriptor with the given end-date requirement
pub fn loss_descriptor(code: &str, with_end_date: bool) -> LossDescriptor {
    LossDescriptor {
        code: code.to_string(),
        label: code.to_string(),
        with_end_date,
    }
}

/// A benefit of the given payout kind
pub fn benefit(kind: IndemnificationKind) -> Benefit {
    Benefit {
        id: core_kernel::BenefitId::new_v7(),
        name: format!("{:?} benefit", kind),
        kind,
    }
}

/// A claim with one loss and one delivered service for the given benefit
/// kind, ready for calculation
pub fn claim_with_service(
    kind: IndemnificationKind,
    currency: Currency,
    loss_start: NaiveDate,
    loss_end: Option<NaiveDate>,
) -> Claim {
    let mut claim = Claim::declare(PartyId::new_v7(), loss_start);
    let descriptor = loss_descriptor("incapacity", loss_end.is_some());
    claim
        .declare_loss(descriptor, loss_start, loss_end)
        .expect("loss declaration");
    claim.losses[0].attach_benefits(OptionId::new_v7(), currency, vec![benefit(kind)]);
    claim
}

/// The single service of a claim built by [`claim_with_service`]
pub fn service_of(claim: &mut Claim) -> &mut DeliveredService {
    &mut claim.losses[0].services[0]
}

/// A schedule entry with explicit dates and amounts
pub fn entry(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    amount_per_unit: Decimal,
    unit_count: Decimal,
) -> DetailEntry {
    DetailEntry {
        start_date: start,
        end_date: end,
        amount_per_unit,
        unit_count,
    }
}

/// A benefit entry paying a daily amount over an inclusive date range; the
/// unit count is the number of covered days
pub fn daily_benefit(start: NaiveDate, end: NaiveDate, per_day: Decimal) -> DetailEntry {
    let days = end.signed_duration_since(start).num_days() + 1;
    entry(Some(start), Some(end), per_day, Decimal::from(days))
}

/// A schedule holding the given entries under one kind
pub fn schedule_of(kind: DetailKind, entries: Vec<DetailEntry>) -> DetailSchedule {
    let mut schedule = DetailSchedule::new();
    for item in entries {
        schedule.push(kind, item);
    }
    schedule
}
