//! Settlement Orchestrator
//!
//! Applies one outcome to every open bet on an event. Best-effort batch:
//! a failing bet never stops the rest, and bets already settled stay settled.

use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::ledger::LedgerStore;
use crate::models::{Bet, SettlementOutcome};

// ============================================================================
// SETTLEMENT REPORT
// ============================================================================

#[derive(Debug, Clone)]
pub struct SettlementFailure {
    pub bet_id: String,
    pub error: LedgerError,
}

/// Outcome of one batch: what settled, what did not
#[derive(Debug, Clone)]
pub struct SettlementReport {
    pub event_id: String,
    pub outcome: SettlementOutcome,
    pub settled: Vec<Bet>,
    pub failures: Vec<SettlementFailure>,
}

impl SettlementReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn total_payout(&self) -> Decimal {
        match self.outcome {
            SettlementOutcome::Win => self
                .settled
                .iter()
                .filter_map(Bet::payout)
                .fold(Decimal::ZERO, |acc, p| acc.saturating_add(p)),
            SettlementOutcome::Lose => Decimal::ZERO,
        }
    }

    /// `Ok(self)` when every bet settled; otherwise a `PartialSettlement`
    /// carrying the first failure.
    pub fn into_result(self) -> LedgerResult<Self> {
        match self.failures.first() {
            None => Ok(self),
            Some(first) => Err(LedgerError::PartialSettlement {
                event_id: self.event_id.clone(),
                settled: self.settled.len(),
                failed: self.failures.len(),
                first: Box::new(first.error.clone()),
            }),
        }
    }
}

// ============================================================================
// ORCHESTRATOR
// ============================================================================

#[derive(Debug, Clone)]
pub struct SettlementOrchestrator {
    store: Arc<LedgerStore>,
}

impl SettlementOrchestrator {
    pub fn new(store: Arc<LedgerStore>) -> Self {
        Self { store }
    }

    /// Settle every open bet on `event_id`. Fails with `NotFound` when there
    /// is nothing to settle, with `PartialSettlement` when any bet failed.
    pub fn settle_event(&self, event_id: &str, outcome: SettlementOutcome) -> LedgerResult<SettlementReport> {
        self.settle_event_report(event_id, outcome)?.into_result()
    }

    /// Like `settle_event` but hands back the full report even when some bets failed.
    pub fn settle_event_report(&self, event_id: &str, outcome: SettlementOutcome) -> LedgerResult<SettlementReport> {
        let open_bets = self.store.find_bets_by_event(event_id)?;
        if open_bets.is_empty() {
            warn!("No placed bets found for event {} to settle", event_id);
            return Err(LedgerError::not_found("Placed Bets for Event", event_id));
        }

        let target = outcome.target_status();
        let mut report = SettlementReport {
            event_id: event_id.to_string(),
            outcome,
            settled: Vec::with_capacity(open_bets.len()),
            failures: Vec::new(),
        };

        for bet in open_bets {
            match self.store.settle_bet(&bet.id, target) {
                Ok(settled) => report.settled.push(settled),
                Err(e) => {
                    warn!("⚠️  Failed to settle bet {} for event {}: {}", bet.id, event_id, e);
                    report.failures.push(SettlementFailure { bet_id: bet.id, error: e });
                }
            }
        }

        if report.is_complete() {
            info!(
                "✅ Settled {} bets for event {} as {} (payout {})",
                report.settled.len(),
                event_id,
                target,
                report.total_payout()
            );
        } else {
            warn!(
                "Finished settling event {} with errors: {} settled, {} failed",
                event_id,
                report.settled.len(),
                report.failures.len()
            );
        }

        Ok(report)
    }
}
