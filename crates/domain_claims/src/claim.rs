//! Claim aggregate and bottom-up sub-status derivation
//!
//! The displayed sub-status is never authoritative on its own: it is
//! re-derived from the underlying loss/service/indemnification state on
//! every write, with outstanding document requests taking precedence over
//! everything else.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, LossId, PartyId};

use crate::error::ClaimError;
use crate::loss::{Loss, LossDescriptor};
use crate::ports::DocumentRequests;

/// Claim lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClaimStatus {
    Open,
    Closed,
    Reopened,
}

/// Why a closed claim was reopened
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReopenedReason {
    Relapse,
    Reclamation,
    Regularization,
}

/// Workflow-facing sub-status, derived bottom-up from the losses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubStatus {
    WaitingDoc,
    Instruction,
    Rejected,
    WaitingValidation,
    Validated,
    Paid,
}

impl SubStatus {
    /// Resolves a flattened multiset by first-match precedence; an empty
    /// multiset resolves to instruction
    fn resolve(flattened: &[SubStatus]) -> SubStatus {
        if flattened.is_empty() {
            return SubStatus::Instruction;
        }
        for candidate in [
            SubStatus::WaitingValidation,
            SubStatus::Validated,
            SubStatus::Paid,
            SubStatus::Rejected,
        ] {
            if flattened.contains(&candidate) {
                return candidate;
            }
        }
        SubStatus::Instruction
    }
}

/// Sub-statuses an open or reopened claim may display
const OPEN_SUB_STATUSES: [SubStatus; 6] = [
    SubStatus::WaitingDoc,
    SubStatus::Instruction,
    SubStatus::Rejected,
    SubStatus::WaitingValidation,
    SubStatus::Validated,
    SubStatus::Paid,
];

/// Sub-statuses a closed claim may display
const CLOSED_SUB_STATUSES: [SubStatus; 2] = [SubStatus::Rejected, SubStatus::Paid];

/// A declared claim owning its losses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub number: String,
    pub status: ClaimStatus,
    /// Derived; `None` when the derivation is illegal for the current status
    pub sub_status: Option<SubStatus>,
    pub reopened_reason: Option<ReopenedReason>,
    pub declaration_date: NaiveDate,
    /// Set when the claim is closed
    pub end_date: Option<NaiveDate>,
    pub claimant: PartyId,
    pub losses: Vec<Loss>,
}

impl Claim {
    /// Declares a new claim for a claimant
    pub fn declare(claimant: PartyId, declaration_date: NaiveDate) -> Self {
        Self {
            id: ClaimId::new_v7(),
            number: generate_claim_number(),
            status: ClaimStatus::Open,
            sub_status: Some(SubStatus::Instruction),
            reopened_reason: None,
            declaration_date,
            end_date: None,
            claimant,
            losses: Vec::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        matches!(self.status, ClaimStatus::Open | ClaimStatus::Reopened)
    }

    /// Declares a loss on this claim
    pub fn declare_loss(
        &mut self,
        descriptor: LossDescriptor,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<LossId, ClaimError> {
        let loss = Loss::declare(self.id, descriptor, start_date, end_date)?;
        let id = loss.id;
        self.losses.push(loss);
        Ok(id)
    }

    /// Declares a relapse of an earlier loss of this claim; the relapse
    /// inherits the descriptor of the loss it extends
    pub fn declare_relapse(
        &mut self,
        main_loss: LossId,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<LossId, ClaimError> {
        let Some(main) = self.losses.iter().find(|loss| loss.id == main_loss) else {
            return Err(ClaimError::RelapseOutsideClaim);
        };
        let descriptor = main.descriptor.clone();
        let mut loss = Loss::declare(self.id, descriptor, start_date, end_date)?;
        loss.main_loss = Some(main_loss);
        let id = loss.id;
        self.losses.push(loss);
        Ok(id)
    }

    /// Relapses of the given loss
    pub fn sub_losses(&self, main_loss: LossId) -> Vec<&Loss> {
        self.losses
            .iter()
            .filter(|loss| loss.main_loss == Some(main_loss))
            .collect()
    }

    /// A relapse loss still under instruction, if any
    pub fn pending_relapse_loss(&self) -> Option<&Loss> {
        self.losses.iter().find(|loss| {
            loss.is_relapse() && loss.claim_sub_status().contains(&SubStatus::Instruction)
        })
    }

    /// Closes the claim, stamping its end date
    pub fn close(&mut self, on: NaiveDate) {
        self.status = ClaimStatus::Closed;
        self.end_date = Some(on);
    }

    /// Reopens a closed claim, clearing sub-status and end date
    pub fn reopen(&mut self, reason: ReopenedReason) {
        if self.status == ClaimStatus::Closed {
            self.status = ClaimStatus::Reopened;
            self.reopened_reason = Some(reason);
            self.sub_status = None;
            self.end_date = None;
        }
    }

    /// Legal sub-status values for the current status
    pub fn allowed_sub_statuses(&self) -> &'static [SubStatus] {
        match self.status {
            ClaimStatus::Closed => &CLOSED_SUB_STATUSES,
            ClaimStatus::Open | ClaimStatus::Reopened => &OPEN_SUB_STATUSES,
        }
    }

    /// Derives the sub-status bottom-up from the losses; an outstanding
    /// document request outranks everything below
    pub fn derive_sub_status(&self, documents: &dyn DocumentRequests) -> SubStatus {
        if !documents.is_complete(self.id) {
            return SubStatus::WaitingDoc;
        }
        let flattened: Vec<SubStatus> = self
            .losses
            .iter()
            .flat_map(Loss::claim_sub_status)
            .collect();
        SubStatus::resolve(&flattened)
    }

    /// Re-derives the sub-status; an illegal combination is cleared rather
    /// than stored. Run on every write to the claim.
    pub fn refresh_sub_status(&mut self, documents: &dyn DocumentRequests) {
        let derived = self.derive_sub_status(documents);
        self.sub_status = self
            .allowed_sub_statuses()
            .contains(&derived)
            .then_some(derived);
    }

    /// Completes validated indemnifications across all services and marks
    /// settled services as delivered
    pub fn complete_indemnifications(&mut self) {
        for loss in &mut self.losses {
            for service in &mut loss.services {
                service.settle();
            }
        }
    }
}

fn generate_claim_number() -> String {
    use std::time::{SystemTime, UNIX_EPOCH};
    let duration = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    format!("CLM-{}", duration.as_millis() % 10_000_000_000)
}
