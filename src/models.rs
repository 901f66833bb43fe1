// Data models for the bet settlement ledger

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use crate::error::{LedgerError, LedgerResult};

// ============================================================================
// USER
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: &str, balance: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            balance,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

// ============================================================================
// BET
// ============================================================================

/// Lifecycle of a bet. Only `Placed -> Won` and `Placed -> Lost` are legal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Placed,
    Won,
    Lost,
}

impl BetStatus {
    pub fn is_settled(&self) -> bool {
        !matches!(self, BetStatus::Placed)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Placed => "placed",
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
        }
    }
}

impl std::fmt::Display for BetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bet {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub odds: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub stake: Decimal,
    pub status: BetStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settled_at: Option<DateTime<Utc>>,
}

impl Bet {
    pub fn new(user_id: &str, event_id: &str, odds: Decimal, stake: Decimal) -> Self {
        Self {
            id: format!("bet_{}", uuid::Uuid::new_v4().simple()),
            user_id: user_id.to_string(),
            event_id: event_id.to_string(),
            odds,
            stake,
            status: BetStatus::Placed,
            created_at: Utc::now(),
            settled_at: None,
        }
    }

    /// Amount credited to the owner when the bet wins; `None` on overflow
    pub fn payout(&self) -> Option<Decimal> {
        self.stake.checked_mul(self.odds)
    }
}

// ============================================================================
// SETTLEMENT OUTCOME
// ============================================================================

/// Event result applied uniformly to every open bet on the event
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SettlementOutcome {
    Win,
    Lose,
}

impl SettlementOutcome {
    pub fn parse(raw: &str) -> LedgerResult<Self> {
        match raw {
            "win" => Ok(SettlementOutcome::Win),
            "lose" => Ok(SettlementOutcome::Lose),
            other => Err(LedgerError::BadRequest(format!(
                "invalid settlement result '{}', must be 'win' or 'lose'",
                other
            ))),
        }
    }

    pub fn target_status(&self) -> BetStatus {
        match self {
            SettlementOutcome::Win => BetStatus::Won,
            SettlementOutcome::Lose => BetStatus::Lost,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementOutcome::Win => "win",
            SettlementOutcome::Lose => "lose",
        }
    }
}

// ============================================================================
// REQUEST / RESPONSE BODIES
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceBetRequest {
    pub user_id: String,
    pub event_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub odds: Decimal,
    /// Also accepts "amount"
    #[serde(alias = "amount", with = "rust_decimal::serde::float")]
    pub stake: Decimal,
}

impl PlaceBetRequest {
    pub fn validate(&self) -> LedgerResult<()> {
        if self.user_id.trim().is_empty() {
            return Err(LedgerError::BadRequest("user_id is required".into()));
        }
        if self.event_id.trim().is_empty() {
            return Err(LedgerError::BadRequest("event_id is required".into()));
        }
        validate_wager(self.odds, self.stake)
    }
}

/// Odds must exceed 1.0 and the stake must be positive
pub fn validate_wager(odds: Decimal, stake: Decimal) -> LedgerResult<()> {
    if odds <= Decimal::ONE {
        return Err(LedgerError::BadRequest(format!("odds must be greater than 1, got {}", odds)));
    }
    if stake <= Decimal::ZERO {
        return Err(LedgerError::BadRequest(format!("stake must be greater than 0, got {}", stake)));
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize)]
pub struct SettleEventRequest {
    pub result: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub user_id: String,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub initial_balance: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BalanceResponse {
    pub user_id: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub balance: Decimal,
}

#[derive(Debug, Clone, Serialize)]
pub struct SettlementResponse {
    pub event_id: String,
    pub outcome: SettlementOutcome,
    pub settled: usize,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_payout: Decimal,
    pub bet_ids: Vec<String>,
}
