use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::types::RoundingPolicy;

/// one row of a repayment schedule, before it is persisted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledInstallment {
    pub sequence: u32,
    pub due_date: DateTime<Utc>,
    pub amount: Money,
}

/// equal-installment schedule with its totals
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmortizationSchedule {
    pub principal: Money,
    pub annual_rate: Rate,
    pub term_months: u32,
    pub start_date: DateTime<Utc>,
    pub installment_amount: Money,
    pub total_interest: Money,
    pub total_repayable: Money,
    pub installments: Vec<ScheduledInstallment>,
}

impl AmortizationSchedule {
    /// generate the schedule and its totals
    pub fn generate(
        principal: Money,
        annual_rate: Rate,
        term_months: u32,
        start_date: DateTime<Utc>,
        rounding: RoundingPolicy,
    ) -> Result<Self> {
        let calculator = AmortizationCalculator::new(rounding);
        let installments = calculator.schedule(principal, annual_rate, term_months, start_date)?;
        let total_interest = simple_interest(principal, annual_rate, term_months)?;
        let total_repayable = principal
            .checked_add(total_interest)
            .ok_or_else(LoanError::out_of_range)?;

        Ok(Self {
            principal,
            annual_rate,
            term_months,
            start_date,
            installment_amount: installments
                .first()
                .map(|i| i.amount)
                .unwrap_or(Money::ZERO),
            total_interest,
            total_repayable,
            installments,
        })
    }

    /// what the borrower actually pays across all installments
    pub fn total_scheduled(&self) -> Money {
        self.installments.iter().map(|i| i.amount).sum()
    }

    /// scheduled total minus exact total repayable, a few cents at most
    pub fn rounding_drift(&self) -> Money {
        self.total_scheduled() - self.total_repayable
    }

    pub fn get(&self, sequence: u32) -> Option<&ScheduledInstallment> {
        sequence
            .checked_sub(1)
            .and_then(|idx| self.installments.get(idx as usize))
    }

    pub fn final_due_date(&self) -> Option<DateTime<Utc>> {
        self.installments.last().map(|i| i.due_date)
    }
}

/// simple-interest, equal-installment calculator
///
/// Interest is charged flat over the whole term (`P * r * n / 12`), never
/// compounded. Every installment carries the same cent-rounded amount; the
/// rounding remainder is left in place rather than pushed into the last row.
#[derive(Debug, Clone, Copy, Default)]
pub struct AmortizationCalculator {
    rounding: RoundingPolicy,
}

impl AmortizationCalculator {
    pub fn new(rounding: RoundingPolicy) -> Self {
        Self { rounding }
    }

    pub fn rounding(&self) -> RoundingPolicy {
        self.rounding
    }

    /// installment amount for the given terms
    pub fn installment_amount(
        &self,
        principal: Money,
        annual_rate: Rate,
        term_months: u32,
    ) -> Result<Money> {
        if term_months == 0 {
            return Err(LoanError::validation("term_months must be at least 1"));
        }
        let n = Decimal::from(term_months);
        let amount = principal
            .checked_add(simple_interest(principal, annual_rate, term_months)?)
            .and_then(|total| total.checked_div(n))
            .ok_or_else(LoanError::out_of_range)?
            .round_cents(self.rounding);
        // the rows must also sum without overflow
        amount.checked_mul(n).ok_or_else(LoanError::out_of_range)?;
        Ok(amount)
    }

    /// full schedule, due dates one calendar month apart from `start_date`
    pub fn schedule(
        &self,
        principal: Money,
        annual_rate: Rate,
        term_months: u32,
        start_date: DateTime<Utc>,
    ) -> Result<Vec<ScheduledInstallment>> {
        let amount = self.installment_amount(principal, annual_rate, term_months)?;

        let mut installments = Vec::with_capacity(term_months as usize);
        for sequence in 1..=term_months {
            installments.push(ScheduledInstallment {
                sequence,
                due_date: add_months(start_date, sequence)?,
                amount,
            });
        }
        Ok(installments)
    }
}

/// flat interest over the term
fn simple_interest(principal: Money, annual_rate: Rate, term_months: u32) -> Result<Money> {
    principal
        .checked_mul(annual_rate.as_decimal())
        .and_then(|m| m.checked_mul(Decimal::from(term_months)))
        .and_then(|m| m.checked_div(Decimal::from(12)))
        .ok_or_else(LoanError::out_of_range)
}

/// calendar month offset from the anchor, clamped to the month's last day
fn add_months(date: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| LoanError::validation(format!("due date out of range: {} + {} months", date, months)))
}
