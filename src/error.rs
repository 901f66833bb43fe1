//! Error taxonomy shared by the ledger store, the settlement orchestrator
//! and the HTTP layer.

use serde::Serialize;

// ============================================================================
// ERROR KIND
// ============================================================================

/// Coarse classification used by callers to pick a transport status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Conflict,
    Internal,
}

// ============================================================================
// LEDGER ERROR
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum LedgerError {
    /// A user, bet or event (with no open bets) does not exist
    NotFound { entity: String, id: String },
    /// Validation failure, malformed outcome or insufficient funds
    BadRequest(String),
    /// Duplicate user, double settlement, deleting a user with open bets
    Conflict(String),
    /// Batch settlement finished but at least one bet failed.
    /// Bets counted in `settled` stay settled.
    PartialSettlement {
        event_id: String,
        settled: usize,
        failed: usize,
        first: Box<LedgerError>,
    },
    /// Broken invariant inside the ledger; never a caller mistake
    Internal(String),
}

impl LedgerError {
    pub fn not_found(entity: &str, id: &str) -> Self {
        LedgerError::NotFound { entity: entity.to_string(), id: id.to_string() }
    }

    pub fn insufficient_funds(available: impl std::fmt::Display, required: impl std::fmt::Display) -> Self {
        LedgerError::BadRequest(format!(
            "insufficient balance: current {}, required {}",
            available, required
        ))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            LedgerError::NotFound { .. } => ErrorKind::NotFound,
            LedgerError::BadRequest(_) => ErrorKind::BadRequest,
            LedgerError::Conflict(_) => ErrorKind::Conflict,
            LedgerError::PartialSettlement { first, .. } => first.kind(),
            LedgerError::Internal(_) => ErrorKind::Internal,
        }
    }

    pub fn is_partial(&self) -> bool {
        matches!(self, LedgerError::PartialSettlement { .. })
    }
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::NotFound { entity, id } => write!(f, "{} with ID '{}' not found", entity, id),
            LedgerError::BadRequest(msg) => write!(f, "bad request: {}", msg),
            LedgerError::Conflict(msg) => write!(f, "conflict: {}", msg),
            LedgerError::PartialSettlement { event_id, settled, failed, first } => write!(
                f,
                "settlement of event '{}' incomplete, some bets may be unsettled ({} settled, {} failed): {}",
                event_id, settled, failed, first
            ),
            LedgerError::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for LedgerError {}

impl<T> From<std::sync::PoisonError<T>> for LedgerError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        LedgerError::Internal("ledger lock poisoned".to_string())
    }
}

pub type LedgerResult<T> = Result<T, LedgerError>;
