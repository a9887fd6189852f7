use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::types::{LoanDecision, LoanId, LoanStatus, OwnerId};

/// loan application as submitted by a borrower
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub owner_id: OwnerId,
    pub principal: Money,
    pub term_months: u32,
    pub category: String,
    #[serde(default)]
    pub borrower_name: Option<String>,
    #[serde(default)]
    pub purpose: Option<String>,
}

impl LoanApplication {
    pub fn new(
        owner_id: impl Into<OwnerId>,
        principal: Money,
        term_months: u32,
        category: impl Into<String>,
    ) -> Self {
        Self {
            owner_id: owner_id.into(),
            principal,
            term_months,
            category: category.into(),
            borrower_name: None,
            purpose: None,
        }
    }

    pub fn borrower_name(mut self, name: impl Into<String>) -> Self {
        self.borrower_name = Some(name.into());
        self
    }

    pub fn purpose(mut self, purpose: impl Into<String>) -> Self {
        self.purpose = Some(purpose.into());
        self
    }
}

/// loan record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub owner_id: OwnerId,
    pub borrower_name: Option<String>,
    pub purpose: Option<String>,
    pub principal: Money,
    pub term_months: u32,
    pub category: String,
    /// locked when the application is taken
    pub interest_rate: Rate,
    pub applied_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub decision: LoanDecision,
}

impl Loan {
    pub fn status(&self) -> LoanStatus {
        self.decision.status()
    }

    pub fn is_pending(&self) -> bool {
        self.status() == LoanStatus::Pending
    }

    pub fn is_owned_by(&self, owner_id: &str) -> bool {
        self.owner_id == owner_id
    }

    pub fn approved_at(&self) -> Option<DateTime<Utc>> {
        self.decision.approved_at()
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        self.decision.rejection_reason()
    }
}

/// loan awaiting an identifier from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLoan {
    pub owner_id: OwnerId,
    pub borrower_name: Option<String>,
    pub purpose: Option<String>,
    pub principal: Money,
    pub term_months: u32,
    pub category: String,
    pub interest_rate: Rate,
    pub applied_at: DateTime<Utc>,
}

impl NewLoan {
    pub fn from_application(application: LoanApplication, rate: Rate, at: DateTime<Utc>) -> Self {
        Self {
            owner_id: application.owner_id,
            borrower_name: application.borrower_name,
            purpose: application.purpose,
            principal: application.principal,
            term_months: application.term_months,
            category: application.category,
            interest_rate: rate,
            applied_at: at,
        }
    }

    /// assign an identifier, new loans always start pending
    pub fn into_loan(self, id: LoanId) -> Loan {
        Loan {
            id,
            owner_id: self.owner_id,
            borrower_name: self.borrower_name,
            purpose: self.purpose,
            principal: self.principal,
            term_months: self.term_months,
            category: self.category,
            interest_rate: self.interest_rate,
            applied_at: self.applied_at,
            updated_at: self.applied_at,
            decision: LoanDecision::Pending,
        }
    }
}
