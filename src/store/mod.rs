//! Persistence contracts for loans and installments.
//!
//! The engine talks to storage only through these traits. Single-record
//! writes go straight to the store; approval writes the loan and its whole
//! schedule through a [`StoreTransaction`] so they land together or not at all.

pub mod memory;

use thiserror::Error;
use uuid::Uuid;

use crate::loan::{Loan, NewLoan};
use crate::payments::{Installment, NewInstallment};
use crate::types::{EntityKind, InstallmentId, LoanId};

pub use memory::MemoryStore;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{entity} {id} does not exist")]
    NotFound {
        entity: EntityKind,
        id: Uuid,
    },

    #[error("constraint violation: {message}")]
    Constraint {
        message: String,
    },

    #[error("backend error: {message}")]
    Backend {
        message: String,
    },

    #[error("store lock poisoned")]
    Poisoned,
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

pub trait LoanStore {
    /// persist a new loan, the store assigns its identifier
    fn create_loan(&self, loan: NewLoan) -> StoreResult<Loan>;

    fn find_loan(&self, id: LoanId) -> StoreResult<Loan>;

    /// loans of one owner, oldest application first
    fn loans_for_owner(&self, owner_id: &str) -> StoreResult<Vec<Loan>>;

    /// every loan, oldest application first
    fn all_loans(&self) -> StoreResult<Vec<Loan>>;

    /// replace the stored record with `loan`
    fn update_loan(&self, loan: &Loan) -> StoreResult<()>;
}

pub trait RepaymentStore {
    fn create_installment(&self, installment: NewInstallment) -> StoreResult<Installment>;

    /// installments of one loan, earliest due date first
    fn installments_for_loan(&self, loan_id: LoanId) -> StoreResult<Vec<Installment>>;

    fn find_installment(&self, id: InstallmentId) -> StoreResult<Installment>;

    fn update_installment(&self, installment: &Installment) -> StoreResult<()>;
}

/// unit of work spanning loans and installments
///
/// Nothing staged is visible to readers until `commit` succeeds. Dropping a
/// transaction without committing discards it.
pub trait StoreTransaction {
    fn update_loan(&mut self, loan: &Loan) -> StoreResult<()>;

    fn create_installment(&mut self, installment: NewInstallment) -> StoreResult<Installment>;

    fn commit(self: Box<Self>) -> StoreResult<()>;

    fn rollback(self: Box<Self>);
}

pub trait TransactionalStore: LoanStore + RepaymentStore {
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>>;
}
