//! Loss model
//!
//! A loss is a single declared insured event within a claim. Attaching
//! benefits to a loss creates the delivered services the calculator runs
//! against.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use core_kernel::{ClaimId, Currency, DateSpan, LossId, OptionId};

use crate::claim::SubStatus;
use crate::error::ClaimError;
use crate::service::{Benefit, DeliveredService};

/// Describes a category of loss (incapacity, disability, death, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LossDescriptor {
    pub code: String,
    pub label: String,
    /// When set, a loss of this category must carry an end date
    pub with_end_date: bool,
}

/// Describes the event that triggered a loss (illness, accident, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDescriptor {
    pub code: String,
    pub label: String,
}

/// A single declared insured event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loss {
    pub id: LossId,
    pub claim_id: ClaimId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub descriptor: LossDescriptor,
    pub event: Option<EventDescriptor>,
    /// Set on relapse losses; always references a loss of the same claim
    pub main_loss: Option<LossId>,
    pub complementary: BTreeMap<String, String>,
    pub services: Vec<DeliveredService>,
}

impl Loss {
    /// Declares a loss; the descriptor decides whether an end date is
    /// required
    pub fn declare(
        claim_id: ClaimId,
        descriptor: LossDescriptor,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Result<Self, ClaimError> {
        if descriptor.with_end_date && end_date.is_none() {
            return Err(ClaimError::EndDateRequired {
                descriptor: descriptor.code.clone(),
            });
        }
        Ok(Self {
            id: LossId::new_v7(),
            claim_id,
            start_date,
            end_date,
            descriptor,
            event: None,
            main_loss: None,
            complementary: BTreeMap::new(),
            services: Vec::new(),
        })
    }

    /// Creates one delivered service per benefit, skipping (option, benefit)
    /// pairs that already exist
    pub fn attach_benefits(&mut self, option: OptionId, currency: Currency, benefits: Vec<Benefit>) {
        for benefit in benefits {
            let exists = self
                .services
                .iter()
                .any(|service| service.option == option && service.benefit.id == benefit.id);
            if exists {
                continue;
            }
            self.services
                .push(DeliveredService::new(self.id, option, benefit, currency));
        }
    }

    /// The business-effective period of this loss
    pub fn span(&self) -> DateSpan {
        DateSpan {
            start: self.start_date,
            end: self.end_date,
        }
    }

    /// True for a relapse of an earlier loss
    pub fn is_relapse(&self) -> bool {
        self.main_loss.is_some()
    }

    /// Contribution of this loss to the claim-level sub-status
    pub fn claim_sub_status(&self) -> Vec<SubStatus> {
        if self.services.is_empty() {
            return vec![SubStatus::Instruction];
        }
        self.services
            .iter()
            .flat_map(DeliveredService::claim_sub_status)
            .collect()
    }
}
