use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// unique identifier for a loan
pub type LoanId = Uuid;

/// unique identifier for a scheduled installment
pub type InstallmentId = Uuid;

/// identifier of the applicant / borrower, issued by the auth layer
pub type OwnerId = String;

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoanStatus {
    /// submitted, awaiting a decision
    Pending,
    /// approved, repayment schedule generated
    Approved,
    /// rejected with a reason
    Rejected,
}

impl LoanStatus {
    pub fn is_terminal(self) -> bool {
        match self {
            LoanStatus::Pending => false,
            LoanStatus::Approved | LoanStatus::Rejected => true,
        }
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LoanStatus::Pending => "pending",
            LoanStatus::Approved => "approved",
            LoanStatus::Rejected => "rejected",
        };
        f.write_str(s)
    }
}

/// the decision recorded on a loan
///
/// Approval time and rejection reason live inside the variant that owns them,
/// so a pending loan carries neither and a decided loan carries exactly one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum LoanDecision {
    Pending,
    Approved {
        approved_at: DateTime<Utc>,
    },
    Rejected {
        reason: String,
        rejected_at: DateTime<Utc>,
    },
}

impl LoanDecision {
    pub fn status(&self) -> LoanStatus {
        match self {
            LoanDecision::Pending => LoanStatus::Pending,
            LoanDecision::Approved { .. } => LoanStatus::Approved,
            LoanDecision::Rejected { .. } => LoanStatus::Rejected,
        }
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        match self {
            LoanDecision::Approved { approved_at } => Some(*approved_at),
            _ => None,
        }
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            LoanDecision::Rejected { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

/// installment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstallmentStatus {
    Pending,
    Paid,
    /// informational only, nothing in the engine moves an installment here
    Overdue,
}

impl fmt::Display for InstallmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InstallmentStatus::Pending => "pending",
            InstallmentStatus::Paid => "paid",
            InstallmentStatus::Overdue => "overdue",
        };
        f.write_str(s)
    }
}

/// midpoint rule used when rounding installment amounts to cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RoundingPolicy {
    /// 0.005 rounds to 0.01
    #[default]
    HalfAwayFromZero,
    /// banker's rounding, 0.005 rounds to 0.00 and 0.015 to 0.02
    HalfEven,
}

/// kind of record named in lookup failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Loan,
    Installment,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Loan => f.write_str("loan"),
            EntityKind::Installment => f.write_str("installment"),
        }
    }
}
