//! Scripted in-memory implementations of the domain ports
//!
//! `ScriptedRules` plays back pre-programmed rule responses in call order,
//! which is enough to drive the calculator through eligibility checks,
//! period splitting and multi-currency passes without a rule engine.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;

use core_kernel::{ClaimId, Currency, DomainPort, Money, PortError, ServiceId};
use domain_claims::{
    CalculationContext, CalculationError, CurrencyConverter, DetailSchedule, DocumentRequests,
    EligibilityOutcome, IndemnificationStore, ReplacementDiff, RuleChain, RuleEvaluation,
    RuleInvoker, RuleKind, RuleProvider,
};

/// Rule invoker replaying scripted responses
///
/// Eligibility defaults to eligible when nothing is scripted; an
/// indemnification call with no scripted response is a rule error.
pub struct ScriptedRules {
    eligibility: Mutex<VecDeque<RuleEvaluation<EligibilityOutcome>>>,
    schedules: Mutex<VecDeque<RuleEvaluation<DetailSchedule>>>,
}

impl ScriptedRules {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            eligibility: Mutex::new(VecDeque::new()),
            schedules: Mutex::new(VecDeque::new()),
        })
    }

    /// Scripts an ineligible verdict for the next eligibility call
    pub fn push_ineligible(&self, message: &str) {
        self.eligibility
            .lock()
            .unwrap()
            .push_back(RuleEvaluation::ok(EligibilityOutcome::ineligible(message)));
    }

    /// Scripts the next indemnification response
    pub fn push_schedule(&self, schedule: DetailSchedule) {
        self.schedules
            .lock()
            .unwrap()
            .push_back(RuleEvaluation::ok(schedule));
    }

    /// Scripts an empty indemnification response (no detail lines at all)
    pub fn push_empty_schedule(&self) {
        self.push_schedule(DetailSchedule::new());
    }

    /// Scripts a failing indemnification call
    pub fn push_rule_error(&self, message: &str) {
        self.schedules
            .lock()
            .unwrap()
            .push_back(RuleEvaluation::failed(vec![CalculationError::Rule(
                message.to_string(),
            )]));
    }

    /// A single-provider chain around these scripted rules
    pub fn chain(self: &Arc<Self>) -> RuleChain {
        let provider: Arc<dyn RuleProvider> = self.clone();
        RuleChain::new(vec![provider])
    }
}

impl RuleInvoker for ScriptedRules {
    fn eligibility(&self, _ctx: &CalculationContext) -> RuleEvaluation<EligibilityOutcome> {
        self.eligibility
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| RuleEvaluation::ok(EligibilityOutcome::eligible()))
    }

    fn indemnification(&self, _ctx: &CalculationContext) -> RuleEvaluation<DetailSchedule> {
        self.schedules.lock().unwrap().pop_front().unwrap_or_else(|| {
            RuleEvaluation::failed(vec![CalculationError::Rule(
                "no scripted indemnification response".to_string(),
            )])
        })
    }
}

impl RuleProvider for ScriptedRules {
    fn has_rule(&self, _kind: RuleKind) -> bool {
        true
    }

    fn rule(&self, _kind: RuleKind) -> Option<&dyn RuleInvoker> {
        Some(self)
    }
}

/// Currency converter with a fixed rate table
#[derive(Default)]
pub struct FixedRates {
    rates: HashMap<(Currency, Currency), Decimal>,
}

impl FixedRates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate(mut self, from: Currency, to: Currency, rate: Decimal) -> Self {
        self.rates.insert((from, to), rate);
        self
    }
}

impl CurrencyConverter for FixedRates {
    fn convert(&self, amount: Money, to: Currency) -> Result<Money, PortError> {
        if amount.currency() == to {
            return Ok(amount);
        }
        let rate = self
            .rates
            .get(&(amount.currency(), to))
            .copied()
            .ok_or_else(|| {
                PortError::not_found("ExchangeRate", format!("{}->{}", amount.currency(), to))
            })?;
        Ok(Money::new(amount.amount() * rate, to))
    }
}

/// Document tracker reporting every claim as complete
pub struct DocumentsComplete;

impl DocumentRequests for DocumentsComplete {
    fn is_complete(&self, _claim: ClaimId) -> bool {
        true
    }
}

/// Document tracker reporting an outstanding request on every claim
pub struct DocumentsPending;

impl DocumentRequests for DocumentsPending {
    fn is_complete(&self, _claim: ClaimId) -> bool {
        false
    }
}

/// Store recording applied replacement diffs for assertions
#[derive(Default)]
pub struct RecordingStore {
    pub applied: Vec<(ServiceId, ReplacementDiff)>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DomainPort for RecordingStore {}

impl IndemnificationStore for RecordingStore {
    fn apply(&mut self, service: ServiceId, diff: &ReplacementDiff) -> Result<(), PortError> {
        self.applied.push((service, diff.clone()));
        Ok(())
    }
}
