pub mod amortization;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{InstallmentId, InstallmentStatus, LoanId};

pub use amortization::{AmortizationCalculator, AmortizationSchedule, ScheduledInstallment};

/// persisted repayment installment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    pub id: InstallmentId,
    pub loan_id: LoanId,
    pub sequence: u32,
    pub due_date: DateTime<Utc>,
    pub amount: Money,
    pub status: InstallmentStatus,
    pub paid_at: Option<DateTime<Utc>>,
}

impl Installment {
    pub fn is_paid(&self) -> bool {
        self.status == InstallmentStatus::Paid
    }

    /// settle the installment, status and timestamp move together
    pub fn mark_paid(&mut self, at: DateTime<Utc>) {
        self.status = InstallmentStatus::Paid;
        self.paid_at = Some(at);
    }

    /// unpaid and past its due date
    pub fn is_past_due(&self, now: DateTime<Utc>) -> bool {
        !self.is_paid() && self.due_date < now
    }
}

/// installment awaiting an identifier from the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewInstallment {
    pub loan_id: LoanId,
    pub sequence: u32,
    pub due_date: DateTime<Utc>,
    pub amount: Money,
}

impl NewInstallment {
    pub fn from_scheduled(loan_id: LoanId, row: &ScheduledInstallment) -> Self {
        Self {
            loan_id,
            sequence: row.sequence,
            due_date: row.due_date,
            amount: row.amount,
        }
    }

    /// assign an identifier, new installments always start pending
    pub fn into_installment(self, id: InstallmentId) -> Installment {
        Installment {
            id,
            loan_id: self.loan_id,
            sequence: self.sequence,
            due_date: self.due_date,
            amount: self.amount,
            status: InstallmentStatus::Pending,
            paid_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    #[test]
    fn test_new_installment_starts_pending() {
        let loan_id = Uuid::new_v4();
        let due = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let row = ScheduledInstallment {
            sequence: 1,
            due_date: due,
            amount: Money::from_cents(108_000),
        };

        let id = Uuid::new_v4();
        let installment = NewInstallment::from_scheduled(loan_id, &row).into_installment(id);

        assert_eq!(installment.id, id);
        assert_eq!(installment.loan_id, loan_id);
        assert_eq!(installment.status, InstallmentStatus::Pending);
        assert!(installment.paid_at.is_none());
    }

    #[test]
    fn test_mark_paid_and_past_due() {
        let due = Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap();
        let mut installment = NewInstallment {
            loan_id: Uuid::new_v4(),
            sequence: 1,
            due_date: due,
            amount: Money::from_major(50),
        }
        .into_installment(Uuid::new_v4());

        let later = Utc.with_ymd_and_hms(2024, 2, 10, 0, 0, 0).unwrap();
        assert!(installment.is_past_due(later));

        installment.mark_paid(later);
        assert!(installment.is_paid());
        assert_eq!(installment.paid_at, Some(later));
        assert!(!installment.is_past_due(later));
    }
}
