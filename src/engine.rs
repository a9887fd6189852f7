use std::sync::Mutex;

use hourglass_rs::SafeTimeProvider;

use crate::clock::Clock;
use crate::config::LendingConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::events::{Event, EventStore};
use crate::loan::{Loan, LoanApplication, NewLoan};
use crate::locks::LoanLocks;
use crate::payments::{AmortizationCalculator, AmortizationSchedule, Installment, NewInstallment};
use crate::store::{LoanStore, RepaymentStore, StoreError, TransactionalStore};
use crate::types::{InstallmentId, LoanDecision, LoanId};
use crate::views::{LoanQuote, LoanView, PortfolioSummary};

/// loan lifecycle engine
///
/// Drives a loan from application through a single decision and then tracks
/// installment payments. State lives only in the store: every operation
/// re-reads what it needs, and the mutating ones do so under a per-loan lock.
pub struct LoanEngine<S, C = SafeTimeProvider> {
    store: S,
    config: LendingConfig,
    clock: C,
    locks: LoanLocks,
    events: Mutex<EventStore>,
}

impl<S: TransactionalStore, C: Clock> LoanEngine<S, C> {
    /// build an engine, rejecting an invalid configuration
    pub fn new(store: S, config: LendingConfig, clock: C) -> Result<Self> {
        config.validate()?;
        let events = Mutex::new(EventStore::with_capacity(config.event_capacity));
        Ok(Self {
            store,
            config,
            clock,
            locks: LoanLocks::new(),
            events,
        })
    }

    /// backing store
    pub fn store(&self) -> &S {
        &self.store
    }

    /// active lending configuration
    pub fn config(&self) -> &LendingConfig {
        &self.config
    }

    /// time source for decisions and payments
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// take a new application, rate locked now
    pub fn apply(&self, application: LoanApplication) -> Result<Loan> {
        self.validate_terms(application.principal, application.term_months)?;

        let rate = self.config.rate_table.rate_for(&application.category);
        self.ensure_payable(application.principal, rate, application.term_months)?;

        let now = self.clock.now();
        let loan = self
            .store
            .create_loan(NewLoan::from_application(application, rate, now))
            .map_err(storage_failure)?;

        tracing::info!(
            loan_id = %loan.id,
            owner_id = %loan.owner_id,
            principal = %loan.principal,
            term_months = loan.term_months,
            rate = %loan.interest_rate,
            "loan application received"
        );
        self.emit(Event::LoanApplied {
            loan_id: loan.id,
            owner_id: loan.owner_id.clone(),
            principal: loan.principal,
            term_months: loan.term_months,
            interest_rate: loan.interest_rate,
            timestamp: now,
        });

        Ok(loan)
    }

    /// approve a pending loan and persist its repayment schedule
    ///
    /// A loan that already carries a decision is returned unchanged. The loan
    /// update and every installment are written in one store transaction, so
    /// a failed write leaves the loan pending with no schedule.
    pub fn approve(&self, loan_id: LoanId) -> Result<Loan> {
        self.locks.with_loan(loan_id, || {
            let mut loan = self.store.find_loan(loan_id)?;
            if !loan.is_pending() {
                tracing::debug!(loan_id = %loan_id, status = %loan.status(), "approve ignored, loan already decided");
                return Ok(loan);
            }

            let now = self.clock.now();
            if loan.interest_rate.is_zero() {
                loan.interest_rate = self.config.rate_table.rate_for(&loan.category);
            }
            loan.decision = LoanDecision::Approved { approved_at: now };
            loan.updated_at = now;

            let schedule = AmortizationSchedule::generate(
                loan.principal,
                loan.interest_rate,
                loan.term_months,
                now,
                self.config.rounding,
            )?;

            self.commit_approval(&loan, &schedule)?;

            tracing::info!(
                loan_id = %loan.id,
                installments = schedule.installments.len(),
                installment_amount = %schedule.installment_amount,
                rate = %loan.interest_rate,
                "loan approved"
            );
            self.emit(Event::LoanApproved {
                loan_id: loan.id,
                interest_rate: loan.interest_rate,
                timestamp: now,
            });
            if let (Some(first), Some(last)) =
                (schedule.installments.first(), schedule.installments.last())
            {
                self.emit(Event::ScheduleGenerated {
                    loan_id: loan.id,
                    installments: schedule.term_months,
                    installment_amount: schedule.installment_amount,
                    first_due: first.due_date,
                    final_due: last.due_date,
                });
            }

            Ok(loan)
        })
    }

    /// reject a pending loan, the reason is mandatory
    pub fn reject(&self, loan_id: LoanId, reason: &str) -> Result<Loan> {
        let reason = reason.trim();
        if reason.is_empty() {
            tracing::warn!(loan_id = %loan_id, "rejection without a reason refused");
            return Err(LoanError::validation("rejection reason is required"));
        }

        self.locks.with_loan(loan_id, || {
            let mut loan = self.store.find_loan(loan_id)?;
            if !loan.is_pending() {
                tracing::debug!(loan_id = %loan_id, status = %loan.status(), "reject ignored, loan already decided");
                return Ok(loan);
            }

            let now = self.clock.now();
            loan.decision = LoanDecision::Rejected {
                reason: reason.to_string(),
                rejected_at: now,
            };
            loan.updated_at = now;
            self.store.update_loan(&loan).map_err(storage_failure)?;

            tracing::info!(loan_id = %loan.id, reason, "loan rejected");
            self.emit(Event::LoanRejected {
                loan_id: loan.id,
                reason: reason.to_string(),
                timestamp: now,
            });

            Ok(loan)
        })
    }

    /// settle one installment on behalf of the loan owner
    pub fn pay_installment(&self, installment_id: InstallmentId, payer_id: &str) -> Result<Installment> {
        let loan_id = self.store.find_installment(installment_id)?.loan_id;

        self.locks.with_loan(loan_id, || {
            let mut installment = self.store.find_installment(installment_id)?;
            let loan = self.store.find_loan(installment.loan_id)?;

            if !loan.is_owned_by(payer_id) {
                tracing::warn!(
                    installment_id = %installment_id,
                    loan_id = %loan.id,
                    payer_id,
                    "payment refused, payer does not own the loan"
                );
                return Err(LoanError::Unauthorized {
                    actor: payer_id.to_string(),
                    loan_id: loan.id,
                });
            }
            if installment.is_paid() {
                tracing::warn!(installment_id = %installment_id, "installment already paid");
                return Err(LoanError::Conflict {
                    message: format!("installment {} is already paid", installment_id),
                });
            }

            let now = self.clock.now();
            installment.mark_paid(now);
            self.store
                .update_installment(&installment)
                .map_err(storage_failure)?;

            tracing::info!(
                installment_id = %installment.id,
                loan_id = %loan.id,
                amount = %installment.amount,
                sequence = installment.sequence,
                "installment paid"
            );
            self.emit(Event::InstallmentPaid {
                loan_id: loan.id,
                installment_id: installment.id,
                amount: installment.amount,
                timestamp: now,
            });

            Ok(installment)
        })
    }

    /// get a loan by id
    pub fn loan(&self, loan_id: LoanId) -> Result<Loan> {
        Ok(self.store.find_loan(loan_id)?)
    }

    /// loans of one owner, oldest application first
    pub fn loans_for_owner(&self, owner_id: &str) -> Result<Vec<Loan>> {
        Ok(self.store.loans_for_owner(owner_id)?)
    }

    /// every loan in the book, oldest application first
    pub fn all_loans(&self) -> Result<Vec<Loan>> {
        Ok(self.store.all_loans()?)
    }

    /// schedule of a loan, empty when the loan has none or does not exist
    pub fn installments_for_loan(&self, loan_id: LoanId) -> Result<Vec<Installment>> {
        Ok(self.store.installments_for_loan(loan_id)?)
    }

    /// loan with its schedule and repayment progress
    pub fn loan_view(&self, loan_id: LoanId) -> Result<LoanView> {
        let loan = self.store.find_loan(loan_id)?;
        let installments = self.store.installments_for_loan(loan_id)?;
        Ok(LoanView::new(loan, installments))
    }

    /// price an application without recording it
    pub fn quote(&self, principal: Money, term_months: u32, category: &str) -> Result<LoanQuote> {
        self.validate_terms(principal, term_months)?;
        let rate = self.config.rate_table.rate_for(category);
        let schedule = AmortizationSchedule::generate(
            principal,
            rate,
            term_months,
            self.clock.now(),
            self.config.rounding,
        )?;
        if !schedule.installment_amount.is_positive() {
            return Err(too_small(principal, term_months));
        }
        Ok(LoanQuote::from_schedule(category, &schedule))
    }

    /// counts by status and principal totals across the book
    pub fn portfolio_summary(&self) -> Result<PortfolioSummary> {
        let loans = self.store.all_loans()?;
        PortfolioSummary::from_loans(&loans)
    }

    /// events still buffered, oldest first
    ///
    /// The buffer holds at most `event_capacity` events; callers that need
    /// every event should drain it with [`take_events`](Self::take_events).
    pub fn events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(events) => events.events().cloned().collect(),
            Err(_) => {
                tracing::error!("event buffer poisoned, no events returned");
                Vec::new()
            }
        }
    }

    /// drain emitted events
    pub fn take_events(&self) -> Vec<Event> {
        match self.events.lock() {
            Ok(mut events) => events.take_events(),
            Err(_) => {
                tracing::error!("event buffer poisoned, no events returned");
                Vec::new()
            }
        }
    }

    fn validate_terms(&self, principal: Money, term_months: u32) -> Result<()> {
        if !principal.is_positive() {
            tracing::warn!(principal = %principal, "principal must be positive");
            return Err(LoanError::validation(format!(
                "principal must be greater than zero, got {}",
                principal
            )));
        }
        if term_months == 0 {
            tracing::warn!("term must be at least one month");
            return Err(LoanError::validation("term_months must be at least 1"));
        }
        if term_months > self.config.max_term_months {
            tracing::warn!(term_months, max = self.config.max_term_months, "term too long");
            return Err(LoanError::validation(format!(
                "term_months {} exceeds maximum of {}",
                term_months, self.config.max_term_months
            )));
        }
        Ok(())
    }

    /// an application whose installment rounds to zero cents can never be repaid
    fn ensure_payable(&self, principal: Money, rate: Rate, term_months: u32) -> Result<()> {
        let amount = AmortizationCalculator::new(self.config.rounding)
            .installment_amount(principal, rate, term_months)?;
        if amount.is_positive() {
            Ok(())
        } else {
            Err(too_small(principal, term_months))
        }
    }

    fn commit_approval(&self, loan: &Loan, schedule: &AmortizationSchedule) -> Result<()> {
        let mut tx = self.store.begin().map_err(storage_failure)?;

        let staged = tx.update_loan(loan).and_then(|()| {
            schedule.installments.iter().try_for_each(|row| {
                tx.create_installment(NewInstallment::from_scheduled(loan.id, row))
                    .map(|_| ())
            })
        });

        match staged {
            Ok(()) => tx.commit().map_err(|e| {
                tracing::error!(loan_id = %loan.id, error = %e, "approval commit failed");
                LoanError::from(e)
            }),
            Err(e) => {
                tracing::error!(loan_id = %loan.id, error = %e, "approval rolled back");
                tx.rollback();
                Err(e.into())
            }
        }
    }

    fn emit(&self, event: Event) {
        match self.events.lock() {
            Ok(mut events) => events.emit(event),
            Err(_) => {
                tracing::error!(loan_id = %event.loan_id(), "event buffer poisoned, event lost");
            }
        }
    }
}

fn too_small(principal: Money, term_months: u32) -> LoanError {
    LoanError::validation(format!(
        "principal {} over {} months rounds to a zero installment",
        principal, term_months
    ))
}

fn storage_failure(err: StoreError) -> LoanError {
    tracing::error!(error = %err, "store write failed");
    LoanError::from(err)
}
