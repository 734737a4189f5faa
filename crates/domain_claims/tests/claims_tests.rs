//! Tests for the claim aggregate, the indemnification state machine, and
//! bottom-up sub-status derivation

use rust_decimal_macros::dec;

use core_kernel::{Currency, Money, PartyId, ServiceId};
use domain_claims::{
    Claim, ClaimError, ClaimStatus, Indemnification, IndemnificationKind, IndemnificationStatus,
    ReopenedReason, ServiceStatus, SubStatus,
};
use test_utils::{
    claim_with_service, date, loss_descriptor, service_of, DocumentsComplete, DocumentsPending,
};

fn entry(amount: i64) -> Indemnification {
    Indemnification::manual_entry(
        ServiceId::new_v7(),
        IndemnificationKind::Period,
        PartyId::new_v7(),
        Money::new(rust_decimal::Decimal::from(amount), Currency::EUR),
    )
}

// ============================================================================
// Indemnification state machine
// ============================================================================

mod state_machine_tests {
    use super::*;

    #[test]
    fn test_validate_from_calculated() {
        let mut indemnification = entry(100);
        assert_eq!(indemnification.status, IndemnificationStatus::Calculated);

        indemnification.validate().unwrap();
        assert_eq!(indemnification.status, IndemnificationStatus::Validated);
    }

    #[test]
    fn test_reject_from_calculated() {
        let mut indemnification = entry(100);
        indemnification.reject().unwrap();
        assert_eq!(indemnification.status, IndemnificationStatus::Rejected);
    }

    #[test]
    fn test_validate_twice_is_an_error() {
        let mut indemnification = entry(100);
        indemnification.validate().unwrap();

        let result = indemnification.validate();
        assert!(matches!(
            result,
            Err(ClaimError::InvalidStatusTransition { .. })
        ));
    }

    #[test]
    fn test_reject_after_validate_is_an_error() {
        let mut indemnification = entry(100);
        indemnification.validate().unwrap();
        assert!(indemnification.reject().is_err());
    }

    #[test]
    fn test_complete_moves_validated_to_paid() {
        let mut indemnification = entry(100);
        indemnification.validate().unwrap();
        indemnification.complete();
        assert_eq!(indemnification.status, IndemnificationStatus::Paid);
    }

    #[test]
    fn test_complete_is_a_noop_for_zero_amount() {
        let mut indemnification = entry(0);
        indemnification.validate().unwrap();
        indemnification.complete();
        assert_eq!(indemnification.status, IndemnificationStatus::Validated);
    }

    #[test]
    fn test_complete_is_a_noop_before_validation() {
        let mut indemnification = entry(100);
        indemnification.complete();
        assert_eq!(indemnification.status, IndemnificationStatus::Calculated);
    }

    #[test]
    fn test_is_pending() {
        let mut pending = entry(100);
        assert!(pending.is_pending());

        pending.validate().unwrap();
        assert!(pending.is_pending());

        pending.complete();
        assert!(!pending.is_pending());

        let mut rejected = entry(100);
        rejected.reject().unwrap();
        assert!(!rejected.is_pending());

        let zero = entry(0);
        assert!(!zero.is_pending());
    }
}

// ============================================================================
// Claim lifecycle
// ============================================================================

mod claim_lifecycle_tests {
    use super::*;

    #[test]
    fn test_declared_claim_defaults() {
        let claim = Claim::declare(PartyId::new_v7(), date(2024, 1, 15));

        assert_eq!(claim.status, ClaimStatus::Open);
        assert_eq!(claim.sub_status, Some(SubStatus::Instruction));
        assert!(claim.number.starts_with("CLM-"));
        assert!(claim.is_open());
        assert!(claim.losses.is_empty());
        assert!(claim.end_date.is_none());
    }

    #[test]
    fn test_close_stamps_end_date() {
        let mut claim = Claim::declare(PartyId::new_v7(), date(2024, 1, 15));
        claim.close(date(2024, 6, 30));

        assert_eq!(claim.status, ClaimStatus::Closed);
        assert_eq!(claim.end_date, Some(date(2024, 6, 30)));
        assert!(!claim.is_open());
    }

    #[test]
    fn test_reopen_clears_sub_status_and_end_date() {
        let mut claim = Claim::declare(PartyId::new_v7(), date(2024, 1, 15));
        claim.close(date(2024, 6, 30));
        claim.reopen(ReopenedReason::Relapse);

        assert_eq!(claim.status, ClaimStatus::Reopened);
        assert_eq!(claim.reopened_reason, Some(ReopenedReason::Relapse));
        assert_eq!(claim.sub_status, None);
        assert_eq!(claim.end_date, None);
        assert!(claim.is_open());
    }

    #[test]
    fn test_reopen_requires_closed_status() {
        let mut claim = Claim::declare(PartyId::new_v7(), date(2024, 1, 15));
        claim.reopen(ReopenedReason::Reclamation);

        assert_eq!(claim.status, ClaimStatus::Open);
        assert_eq!(claim.reopened_reason, None);
    }

    #[test]
    fn test_loss_end_date_required_by_descriptor() {
        let mut claim = Claim::declare(PartyId::new_v7(), date(2024, 1, 15));
        let result = claim.declare_loss(loss_descriptor("incapacity", true), date(2024, 1, 1), None);

        assert!(matches!(result, Err(ClaimError::EndDateRequired { .. })));
    }

    #[test]
    fn test_relapse_must_reference_loss_of_same_claim() {
        let mut claim = Claim::declare(PartyId::new_v7(), date(2024, 1, 15));
        let foreign_loss = core_kernel::LossId::new_v7();

        let result = claim.declare_relapse(foreign_loss, date(2024, 3, 1), None);
        assert!(matches!(result, Err(ClaimError::RelapseOutsideClaim)));
    }

    #[test]
    fn test_relapse_inherits_descriptor_of_main_loss() {
        let mut claim = Claim::declare(PartyId::new_v7(), date(2024, 1, 15));
        let main = claim
            .declare_loss(loss_descriptor("incapacity", false), date(2024, 1, 1), None)
            .unwrap();

        let relapse = claim.declare_relapse(main, date(2024, 3, 1), None).unwrap();

        let relapse_loss = claim.losses.iter().find(|loss| loss.id == relapse).unwrap();
        assert!(relapse_loss.is_relapse());
        assert_eq!(relapse_loss.main_loss, Some(main));
        assert_eq!(relapse_loss.descriptor.code, "incapacity");
        assert_eq!(claim.sub_losses(main).len(), 1);
    }

    #[test]
    fn test_pending_relapse_loss_found_while_under_instruction() {
        let mut claim = Claim::declare(PartyId::new_v7(), date(2024, 1, 15));
        let main = claim
            .declare_loss(loss_descriptor("incapacity", false), date(2024, 1, 1), None)
            .unwrap();
        assert!(claim.pending_relapse_loss().is_none());

        claim.declare_relapse(main, date(2024, 3, 1), None).unwrap();
        assert!(claim.pending_relapse_loss().is_some());
    }

    #[test]
    fn test_attach_benefits_skips_existing_pairs() {
        let mut claim = Claim::declare(PartyId::new_v7(), date(2024, 1, 15));
        claim
            .declare_loss(loss_descriptor("incapacity", false), date(2024, 1, 1), None)
            .unwrap();

        let option = core_kernel::OptionId::new_v7();
        let benefit = test_utils::benefit(IndemnificationKind::Period);
        claim.losses[0].attach_benefits(option, Currency::EUR, vec![benefit.clone()]);
        claim.losses[0].attach_benefits(option, Currency::EUR, vec![benefit]);

        assert_eq!(claim.losses[0].services.len(), 1);
    }

    #[test]
    fn test_claim_serde_round_trip() {
        let claim = claim_with_service(
            IndemnificationKind::Period,
            Currency::EUR,
            date(2023, 12, 1),
            Some(date(2023, 12, 31)),
        );

        let json = serde_json::to_string(&claim).unwrap();
        let back: Claim = serde_json::from_str(&json).unwrap();

        assert_eq!(back.id, claim.id);
        assert_eq!(back.losses.len(), 1);
        assert_eq!(back.losses[0].services.len(), 1);
    }
}

// ============================================================================
// Sub-status derivation
// ============================================================================

mod sub_status_tests {
    use super::*;

    fn claim_with_indemnification_statuses(statuses: &[IndemnificationStatus]) -> Claim {
        let mut claim = claim_with_service(
            IndemnificationKind::Period,
            Currency::EUR,
            date(2023, 12, 1),
            Some(date(2023, 12, 31)),
        );
        let claimant = claim.claimant;
        let service = service_of(&mut claim);
        for status in statuses {
            let mut indemnification = Indemnification::manual_entry(
                service.id,
                IndemnificationKind::Period,
                claimant,
                Money::new(dec!(100), Currency::EUR),
            );
            match status {
                IndemnificationStatus::Calculated => {}
                IndemnificationStatus::Validated => indemnification.validate().unwrap(),
                IndemnificationStatus::Rejected => indemnification.reject().unwrap(),
                IndemnificationStatus::Paid => {
                    indemnification.validate().unwrap();
                    indemnification.complete();
                }
            }
            service.indemnifications.push(indemnification);
        }
        claim
    }

    #[test]
    fn test_waiting_validation_outranks_paid() {
        let claim = claim_with_indemnification_statuses(&[
            IndemnificationStatus::Paid,
            IndemnificationStatus::Calculated,
        ]);

        assert_eq!(
            claim.derive_sub_status(&DocumentsComplete),
            SubStatus::WaitingValidation
        );
    }

    #[test]
    fn test_validated_outranks_paid_and_rejected() {
        let claim = claim_with_indemnification_statuses(&[
            IndemnificationStatus::Rejected,
            IndemnificationStatus::Paid,
            IndemnificationStatus::Validated,
        ]);

        assert_eq!(
            claim.derive_sub_status(&DocumentsComplete),
            SubStatus::Validated
        );
    }

    #[test]
    fn test_outstanding_documents_outrank_everything() {
        let claim = claim_with_indemnification_statuses(&[IndemnificationStatus::Calculated]);

        assert_eq!(
            claim.derive_sub_status(&DocumentsPending),
            SubStatus::WaitingDoc
        );
    }

    #[test]
    fn test_claim_without_losses_is_under_instruction() {
        let claim = Claim::declare(PartyId::new_v7(), date(2024, 1, 15));
        assert_eq!(
            claim.derive_sub_status(&DocumentsComplete),
            SubStatus::Instruction
        );
    }

    #[test]
    fn test_service_without_indemnifications_is_under_instruction() {
        let claim = claim_with_indemnification_statuses(&[]);
        assert_eq!(
            claim.derive_sub_status(&DocumentsComplete),
            SubStatus::Instruction
        );
    }

    #[test]
    fn test_not_eligible_service_reads_as_rejected() {
        let mut claim = claim_with_indemnification_statuses(&[]);
        service_of(&mut claim).status = ServiceStatus::NotEligible;

        assert_eq!(
            claim.derive_sub_status(&DocumentsComplete),
            SubStatus::Rejected
        );
    }

    #[test]
    fn test_rejected_indemnification_alone_reads_as_instruction() {
        let claim = claim_with_indemnification_statuses(&[IndemnificationStatus::Rejected]);
        assert_eq!(
            claim.derive_sub_status(&DocumentsComplete),
            SubStatus::Instruction
        );
    }

    #[test]
    fn test_illegal_combination_is_cleared_on_closed_claim() {
        let mut claim = claim_with_indemnification_statuses(&[IndemnificationStatus::Calculated]);
        claim.close(date(2024, 6, 30));
        claim.refresh_sub_status(&DocumentsComplete);

        // waiting_validation is not legal for a closed claim
        assert_eq!(claim.sub_status, None);
    }

    #[test]
    fn test_paid_is_legal_on_closed_claim() {
        let mut claim = claim_with_indemnification_statuses(&[IndemnificationStatus::Paid]);
        claim.close(date(2024, 6, 30));
        claim.refresh_sub_status(&DocumentsComplete);

        assert_eq!(claim.sub_status, Some(SubStatus::Paid));
    }

    #[test]
    fn test_refresh_stores_derivation_on_open_claim() {
        let mut claim = claim_with_indemnification_statuses(&[IndemnificationStatus::Calculated]);
        claim.refresh_sub_status(&DocumentsComplete);

        assert_eq!(claim.sub_status, Some(SubStatus::WaitingValidation));
    }
}

// ============================================================================
// Settlement
// ============================================================================

mod settlement_tests {
    use super::*;

    #[test]
    fn test_settled_service_is_marked_delivered() {
        let mut claim = claim_with_service(
            IndemnificationKind::Period,
            Currency::EUR,
            date(2023, 12, 1),
            Some(date(2023, 12, 31)),
        );
        let claimant = claim.claimant;
        let service = service_of(&mut claim);
        let mut indemnification = Indemnification::manual_entry(
            service.id,
            IndemnificationKind::Period,
            claimant,
            Money::new(dec!(300), Currency::EUR),
        );
        indemnification.validate().unwrap();
        service.indemnifications.push(indemnification);

        claim.complete_indemnifications();

        let service = service_of(&mut claim);
        assert_eq!(
            service.indemnifications[0].status,
            IndemnificationStatus::Paid
        );
        assert_eq!(service.status, ServiceStatus::Delivered);
    }

    #[test]
    fn test_service_with_pending_indemnification_is_not_delivered() {
        let mut claim = claim_with_service(
            IndemnificationKind::Period,
            Currency::EUR,
            date(2023, 12, 1),
            Some(date(2023, 12, 31)),
        );
        let claimant = claim.claimant;
        let service = service_of(&mut claim);
        let service_id = service.id;

        let mut paid = Indemnification::manual_entry(
            service_id,
            IndemnificationKind::Period,
            claimant,
            Money::new(dec!(300), Currency::EUR),
        );
        paid.validate().unwrap();
        service.indemnifications.push(paid);

        // still awaiting review
        let pending = Indemnification::manual_entry(
            service_id,
            IndemnificationKind::Period,
            claimant,
            Money::new(dec!(100), Currency::EUR),
        );
        service.indemnifications.push(pending);

        claim.complete_indemnifications();

        let service = service_of(&mut claim);
        assert_ne!(service.status, ServiceStatus::Delivered);
        assert!(service
            .indemnifications
            .iter()
            .any(Indemnification::is_pending));
    }
}
