//! Core Kernel - Foundational types for the claim indemnification engine
//!
//! This crate provides the building blocks used across the domain modules:
//! - Money types with precise decimal arithmetic
//! - Date spans for business-effective periods
//! - Strongly-typed identifiers and common error types
//! - Port infrastructure for external adapters

pub mod error;
pub mod identifiers;
pub mod money;
pub mod ports;
pub mod temporal;

pub use error::CoreError;
pub use identifiers::{
    BenefitId, ClaimId, DetailLineId, IndemnificationId, LossId, OptionId, PartyId, ServiceId,
};
pub use money::{Currency, Money, MoneyError};
pub use ports::{DomainPort, PortError};
pub use temporal::{day_after, DateSpan, TemporalError};
