//! serializable read models

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::loan::Loan;
use crate::payments::{AmortizationSchedule, Installment};
use crate::types::LoanStatus;

/// a loan together with its repayment schedule
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanView {
    pub loan: Loan,
    pub installments: Vec<Installment>,
    pub repayment: RepaymentView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepaymentView {
    pub installment_count: u32,
    pub paid_count: u32,
    pub total_scheduled: Money,
    pub total_paid: Money,
    pub outstanding: Money,
    pub next_due: Option<DateTime<Utc>>,
}

impl LoanView {
    /// derive repayment progress from the stored rows
    pub fn new(loan: Loan, installments: Vec<Installment>) -> Self {
        let total_scheduled: Money = installments.iter().map(|i| i.amount).sum();
        let total_paid: Money = installments
            .iter()
            .filter(|i| i.is_paid())
            .map(|i| i.amount)
            .sum();
        let next_due = installments
            .iter()
            .filter(|i| !i.is_paid())
            .map(|i| i.due_date)
            .min();

        let repayment = RepaymentView {
            installment_count: installments.len() as u32,
            paid_count: installments.iter().filter(|i| i.is_paid()).count() as u32,
            total_scheduled,
            total_paid,
            outstanding: total_scheduled - total_paid,
            next_due,
        };

        Self {
            loan,
            installments,
            repayment,
        }
    }

    pub fn is_fully_repaid(&self) -> bool {
        self.loan.status() == LoanStatus::Approved
            && self.repayment.installment_count > 0
            && self.repayment.paid_count == self.repayment.installment_count
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// terms a borrower would get, nothing persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanQuote {
    pub category: String,
    pub interest_rate: Rate,
    pub principal: Money,
    pub term_months: u32,
    pub installment_amount: Money,
    pub total_interest: Money,
    pub total_repayable: Money,
}

impl LoanQuote {
    pub fn from_schedule(category: &str, schedule: &AmortizationSchedule) -> Self {
        Self {
            category: category.to_string(),
            interest_rate: schedule.annual_rate,
            principal: schedule.principal,
            term_months: schedule.term_months,
            installment_amount: schedule.installment_amount,
            total_interest: schedule.total_interest,
            total_repayable: schedule.total_repayable,
        }
    }
}

/// book-level statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PortfolioSummary {
    pub total_loans: u64,
    pub pending_loans: u64,
    pub approved_loans: u64,
    pub rejected_loans: u64,
    pub total_principal: Money,
    pub average_principal: Money,
}

impl PortfolioSummary {
    /// tally a set of loans, fails only if the principal total overflows
    pub fn from_loans<'a>(loans: impl IntoIterator<Item = &'a Loan>) -> Result<Self> {
        let mut summary = PortfolioSummary::default();
        for loan in loans {
            summary.total_loans += 1;
            summary.total_principal = summary
                .total_principal
                .checked_add(loan.principal)
                .ok_or_else(LoanError::out_of_range)?;
            match loan.status() {
                LoanStatus::Pending => summary.pending_loans += 1,
                LoanStatus::Approved => summary.approved_loans += 1,
                LoanStatus::Rejected => summary.rejected_loans += 1,
            }
        }
        if summary.total_loans > 0 {
            summary.average_principal = summary
                .total_principal
                .checked_div(Decimal::from(summary.total_loans))
                .ok_or_else(LoanError::out_of_range)?;
        }
        Ok(summary)
    }
}
