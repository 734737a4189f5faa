//! Tests for the batch selector grammar and the bulk review operation

use chrono::NaiveDate;

use core_kernel::{Currency, IndemnificationId, Money};
use domain_claims::{
    apply_decisions, build_working_set, Claim, ClaimError, Indemnification, IndemnificationKind,
    IndemnificationStatus, ReviewDecision, Selector, SelectorError, SubStatus,
    DEFAULT_SEARCH_SIZE,
};
use test_utils::{claim_with_service, date, service_of, DocumentsComplete};

/// Adds a calculated indemnification with the given amount and start date to
/// the claim's single service, returning its id
fn add_entry(claim: &mut Claim, amount: i64, start: Option<NaiveDate>) -> IndemnificationId {
    let claimant = claim.claimant;
    let service = service_of(claim);
    let mut indemnification = Indemnification::manual_entry(
        service.id,
        IndemnificationKind::Period,
        claimant,
        Money::new(rust_decimal::Decimal::from(amount), Currency::EUR),
    );
    indemnification.start_date = start;
    let id = indemnification.id;
    service.indemnifications.push(indemnification);
    id
}

fn review_claim() -> Claim {
    claim_with_service(
        IndemnificationKind::Period,
        Currency::EUR,
        date(2023, 12, 1),
        Some(date(2023, 12, 31)),
    )
}

// ============================================================================
// Filter semantics
// ============================================================================

mod filter_tests {
    use super::*;

    #[test]
    fn test_status_and_date_filter() {
        let mut claim = review_claim();
        let a = add_entry(&mut claim, 100, Some(date(2023, 12, 1)));
        let b = add_entry(&mut claim, 200, Some(date(2023, 12, 1)));
        {
            let service = service_of(&mut claim);
            let paid = service
                .indemnifications
                .iter_mut()
                .find(|indemnification| indemnification.id == b)
                .unwrap();
            paid.validate().unwrap();
            paid.complete();
        }

        let selector = Selector::parse("status: = calculated, start_date: <= 2024-01-01").unwrap();
        let items = build_working_set(&[claim], &selector, DEFAULT_SEARCH_SIZE);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].indemnification_id, a);
    }

    #[test]
    fn test_missing_field_passes_the_clause() {
        let mut claim = review_claim();
        let id = add_entry(&mut claim, 100, None);

        let selector = Selector::parse("start_date: <= 2024-01-01").unwrap();
        let items = build_working_set(&[claim], &selector, DEFAULT_SEARCH_SIZE);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].indemnification_id, id);
    }

    #[test]
    fn test_amount_filter() {
        let mut claim = review_claim();
        add_entry(&mut claim, 50, Some(date(2023, 12, 1)));
        let big = add_entry(&mut claim, 500, Some(date(2023, 12, 2)));

        let selector = Selector::parse("amount >= 100").unwrap();
        let items = build_working_set(&[claim], &selector, DEFAULT_SEARCH_SIZE);

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].indemnification_id, big);
    }

    #[test]
    fn test_empty_selector_matches_everything() {
        let mut claim = review_claim();
        add_entry(&mut claim, 100, Some(date(2023, 12, 1)));
        add_entry(&mut claim, 200, Some(date(2023, 12, 2)));

        let selector = Selector::parse("").unwrap();
        let items = build_working_set(&[claim], &selector, DEFAULT_SEARCH_SIZE);

        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_working_set_is_ordered_and_bounded() {
        let mut claim = review_claim();
        let third = add_entry(&mut claim, 100, Some(date(2023, 12, 3)));
        let first = add_entry(&mut claim, 100, Some(date(2023, 12, 1)));
        let second = add_entry(&mut claim, 100, Some(date(2023, 12, 2)));

        let selector = Selector::parse("").unwrap();
        let items = build_working_set(&[claim], &selector, 2);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].indemnification_id, first);
        assert_eq!(items[1].indemnification_id, second);
        assert!(items
            .iter()
            .all(|item| item.indemnification_id != third));
    }

    #[test]
    fn test_quoted_value_reaches_the_parser_verbatim() {
        // embedded separators survive inside quotes and then fail date
        // parsing, proving they were not split away
        let result = Selector::parse("start_date <= \"2024 01 01\"");
        assert_eq!(
            result,
            Err(SelectorError::InvalidDate("2024 01 01".to_string()))
        );
    }
}

// ============================================================================
// Bulk review
// ============================================================================

mod bulk_review_tests {
    use super::*;

    #[test]
    fn test_validate_and_reject_in_one_pass() {
        let mut claim = review_claim();
        let to_validate = add_entry(&mut claim, 100, Some(date(2023, 12, 1)));
        let to_reject = add_entry(&mut claim, 200, Some(date(2023, 12, 2)));

        let mut claims = vec![claim];
        let outcome = apply_decisions(
            &mut claims,
            &[
                (to_validate, ReviewDecision::Validate),
                (to_reject, ReviewDecision::Reject),
            ],
            &DocumentsComplete,
        );

        assert_eq!(outcome.validated, vec![to_validate]);
        assert_eq!(outcome.rejected, vec![to_reject]);
        assert!(outcome.errors.is_empty());

        // validated entries were completed, the claim sub-status follows
        let service = service_of(&mut claims[0]);
        assert!(service
            .indemnifications
            .iter()
            .any(|indemnification| indemnification.id == to_validate
                && indemnification.status == IndemnificationStatus::Paid));
        assert_eq!(claims[0].sub_status, Some(SubStatus::Paid));
    }

    #[test]
    fn test_nothing_decision_is_a_noop() {
        let mut claim = review_claim();
        let id = add_entry(&mut claim, 100, Some(date(2023, 12, 1)));

        let mut claims = vec![claim];
        let outcome = apply_decisions(&mut claims, &[(id, ReviewDecision::Nothing)], &DocumentsComplete);

        assert!(outcome.validated.is_empty());
        assert!(outcome.rejected.is_empty());
        let service = service_of(&mut claims[0]);
        assert_eq!(
            service.indemnifications[0].status,
            IndemnificationStatus::Calculated
        );
    }

    #[test]
    fn test_errors_are_accumulated_not_fatal() {
        let mut claim = review_claim();
        let already_paid = add_entry(&mut claim, 100, Some(date(2023, 12, 1)));
        {
            let service = service_of(&mut claim);
            service.indemnifications[0].validate().unwrap();
            service.indemnifications[0].complete();
        }
        let reviewable = add_entry(&mut claim, 200, Some(date(2023, 12, 2)));

        let mut claims = vec![claim];
        let outcome = apply_decisions(
            &mut claims,
            &[
                (already_paid, ReviewDecision::Validate),
                (reviewable, ReviewDecision::Validate),
            ],
            &DocumentsComplete,
        );

        // the bad entry is reported, the sibling still went through
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(
            outcome.errors[0],
            ClaimError::InvalidStatusTransition { .. }
        ));
        assert_eq!(outcome.validated, vec![reviewable]);
    }

    #[test]
    fn test_unknown_indemnification_is_reported() {
        let claim = review_claim();
        let mut claims = vec![claim];

        let ghost = IndemnificationId::new_v7();
        let outcome = apply_decisions(&mut claims, &[(ghost, ReviewDecision::Validate)], &DocumentsComplete);

        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(
            outcome.errors[0],
            ClaimError::IndemnificationNotFound(_)
        ));
    }

    #[test]
    fn test_review_flow_from_selector_to_settlement() {
        let mut claim = review_claim();
        add_entry(&mut claim, 310, Some(date(2023, 12, 1)));

        let mut claims = vec![claim];
        let selector = Selector::parse("status: = calculated").unwrap();
        let items = build_working_set(&claims, &selector, DEFAULT_SEARCH_SIZE);
        assert_eq!(items.len(), 1);

        let decisions: Vec<_> = items
            .iter()
            .map(|item| (item.indemnification_id, ReviewDecision::Validate))
            .collect();
        let outcome = apply_decisions(&mut claims, &decisions, &DocumentsComplete);

        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.validated.len(), 1);

        // nothing left for the next review pass
        let leftover = build_working_set(&claims, &selector, DEFAULT_SEARCH_SIZE);
        assert!(leftover.is_empty());
        assert_eq!(claims[0].sub_status, Some(SubStatus::Paid));
    }
}
