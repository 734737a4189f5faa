//! Bulk validate/reject review over calculated indemnifications
//!
//! An operator filters the outstanding calculated indemnifications with a
//! [`Selector`], reviews the bounded working set, and validates or rejects
//! entries in bulk. Applying the decisions settles the touched claims and
//! re-derives their sub-status; all errors are accumulated and surfaced
//! rather than aborting the batch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use core_kernel::{ClaimId, IndemnificationId, Money};

use crate::claim::Claim;
use crate::error::ClaimError;
use crate::indemnification::Indemnification;
use crate::ports::DocumentRequests;
use crate::selector::Selector;

/// Bound on the review working set, keeping transaction scope predictable
pub const DEFAULT_SEARCH_SIZE: usize = 20;

/// Operator decision for one working-set entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Nothing,
    Validate,
    Reject,
}

/// One row of the review working set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewItem {
    pub indemnification_id: IndemnificationId,
    pub claim_id: ClaimId,
    pub claim_number: String,
    pub amount: Money,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Builds the bounded working set: matching indemnifications across the
/// given claims, ordered by start date
pub fn build_working_set(claims: &[Claim], selector: &Selector, limit: usize) -> Vec<ReviewItem> {
    let mut items = Vec::new();
    for claim in claims {
        for loss in &claim.losses {
            for service in &loss.services {
                for indemnification in &service.indemnifications {
                    if selector.matches(indemnification) {
                        items.push(ReviewItem {
                            indemnification_id: indemnification.id,
                            claim_id: claim.id,
                            claim_number: claim.number.clone(),
                            amount: indemnification.amount,
                            start_date: indemnification.start_date,
                            end_date: indemnification.end_date,
                        });
                    }
                }
            }
        }
    }
    items.sort_by_key(|item| item.start_date);
    items.truncate(limit);
    items
}

/// What a bulk review pass did
#[derive(Debug, Default)]
pub struct ReviewOutcome {
    pub validated: Vec<IndemnificationId>,
    pub rejected: Vec<IndemnificationId>,
    /// Surfaced to the operator; a failed entry never aborts its siblings
    pub errors: Vec<ClaimError>,
}

/// Applies operator decisions, settles the touched claims and re-derives
/// their sub-status
pub fn apply_decisions(
    claims: &mut [Claim],
    decisions: &[(IndemnificationId, ReviewDecision)],
    documents: &dyn DocumentRequests,
) -> ReviewOutcome {
    let mut outcome = ReviewOutcome::default();
    let mut touched: Vec<ClaimId> = Vec::new();

    for (id, decision) in decisions {
        if matches!(decision, ReviewDecision::Nothing) {
            continue;
        }
        let Some((claim_id, indemnification)) = find_indemnification(claims, *id) else {
            outcome
                .errors
                .push(ClaimError::IndemnificationNotFound(id.to_string()));
            continue;
        };
        let applied = match decision {
            ReviewDecision::Validate => indemnification
                .validate()
                .map(|_| outcome.validated.push(*id)),
            ReviewDecision::Reject => indemnification
                .reject()
                .map(|_| outcome.rejected.push(*id)),
            ReviewDecision::Nothing => Ok(()),
        };
        match applied {
            Ok(()) => {
                if !touched.contains(&claim_id) {
                    touched.push(claim_id);
                }
            }
            Err(error) => outcome.errors.push(error),
        }
    }

    for claim in claims
        .iter_mut()
        .filter(|claim| touched.contains(&claim.id))
    {
        claim.complete_indemnifications();
        claim.refresh_sub_status(documents);
    }

    info!(
        validated = outcome.validated.len(),
        rejected = outcome.rejected.len(),
        errors = outcome.errors.len(),
        "bulk review applied"
    );
    outcome
}

fn find_indemnification(
    claims: &mut [Claim],
    id: IndemnificationId,
) -> Option<(ClaimId, &mut Indemnification)> {
    for claim in claims.iter_mut() {
        let claim_id = claim.id;
        for loss in &mut claim.losses {
            for service in &mut loss.services {
                if let Some(indemnification) = service
                    .indemnifications
                    .iter_mut()
                    .find(|indemnification| indemnification.id == id)
                {
                    return Some((claim_id, indemnification));
                }
            }
        }
    }
    None
}
