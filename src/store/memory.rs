use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use uuid::Uuid;

use crate::loan::{Loan, NewLoan};
use crate::payments::{Installment, NewInstallment};
use crate::types::{EntityKind, InstallmentId, LoanId};

use super::{
    LoanStore, RepaymentStore, StoreError, StoreResult, StoreTransaction, TransactionalStore,
};

/// thread-safe in-process store
///
/// Lock order is always loans before installments.
#[derive(Debug, Default)]
pub struct MemoryStore {
    loans: RwLock<HashMap<LoanId, Loan>>,
    installments: RwLock<HashMap<InstallmentId, Installment>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loan_count(&self) -> StoreResult<usize> {
        Ok(self.read_loans()?.len())
    }

    pub fn installment_count(&self) -> StoreResult<usize> {
        Ok(self.read_installments()?.len())
    }

    fn read_loans(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<LoanId, Loan>>> {
        self.loans.read().map_err(|_| StoreError::Poisoned)
    }

    fn write_loans(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<LoanId, Loan>>> {
        self.loans.write().map_err(|_| StoreError::Poisoned)
    }

    fn read_installments(
        &self,
    ) -> StoreResult<RwLockReadGuard<'_, HashMap<InstallmentId, Installment>>> {
        self.installments.read().map_err(|_| StoreError::Poisoned)
    }

    fn write_installments(
        &self,
    ) -> StoreResult<RwLockWriteGuard<'_, HashMap<InstallmentId, Installment>>> {
        self.installments.write().map_err(|_| StoreError::Poisoned)
    }
}

fn check_new_loan(loan: &NewLoan) -> StoreResult<()> {
    if !loan.principal.is_positive() {
        return Err(StoreError::Constraint {
            message: format!("loan principal must be positive, got {}", loan.principal),
        });
    }
    if loan.term_months == 0 {
        return Err(StoreError::Constraint {
            message: "loan term must be at least one month".to_string(),
        });
    }
    Ok(())
}

fn check_new_installment(installment: &NewInstallment) -> StoreResult<()> {
    if !installment.amount.is_positive() {
        return Err(StoreError::Constraint {
            message: format!("installment amount must be positive, got {}", installment.amount),
        });
    }
    Ok(())
}

fn unknown_loan(loan_id: LoanId) -> StoreError {
    StoreError::Constraint {
        message: format!("installment references unknown loan {}", loan_id),
    }
}

fn sort_loans(loans: &mut [Loan]) {
    loans.sort_by(|a, b| a.applied_at.cmp(&b.applied_at).then(a.id.cmp(&b.id)));
}

impl LoanStore for MemoryStore {
    fn create_loan(&self, loan: NewLoan) -> StoreResult<Loan> {
        check_new_loan(&loan)?;
        let loan = loan.into_loan(Uuid::new_v4());
        self.write_loans()?.insert(loan.id, loan.clone());
        Ok(loan)
    }

    fn find_loan(&self, id: LoanId) -> StoreResult<Loan> {
        self.read_loans()?
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: EntityKind::Loan,
                id,
            })
    }

    fn loans_for_owner(&self, owner_id: &str) -> StoreResult<Vec<Loan>> {
        let mut loans: Vec<Loan> = self
            .read_loans()?
            .values()
            .filter(|l| l.is_owned_by(owner_id))
            .cloned()
            .collect();
        sort_loans(&mut loans);
        Ok(loans)
    }

    fn all_loans(&self) -> StoreResult<Vec<Loan>> {
        let mut loans: Vec<Loan> = self.read_loans()?.values().cloned().collect();
        sort_loans(&mut loans);
        Ok(loans)
    }

    fn update_loan(&self, loan: &Loan) -> StoreResult<()> {
        let mut loans = self.write_loans()?;
        match loans.get_mut(&loan.id) {
            Some(slot) => {
                *slot = loan.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: EntityKind::Loan,
                id: loan.id,
            }),
        }
    }
}

impl RepaymentStore for MemoryStore {
    fn create_installment(&self, installment: NewInstallment) -> StoreResult<Installment> {
        check_new_installment(&installment)?;
        let loans = self.read_loans()?;
        if !loans.contains_key(&installment.loan_id) {
            return Err(unknown_loan(installment.loan_id));
        }

        let installment = installment.into_installment(Uuid::new_v4());
        self.write_installments()?
            .insert(installment.id, installment.clone());
        Ok(installment)
    }

    fn installments_for_loan(&self, loan_id: LoanId) -> StoreResult<Vec<Installment>> {
        let mut rows: Vec<Installment> = self
            .read_installments()?
            .values()
            .filter(|i| i.loan_id == loan_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.sequence.cmp(&b.sequence)));
        Ok(rows)
    }

    fn find_installment(&self, id: InstallmentId) -> StoreResult<Installment> {
        self.read_installments()?
            .get(&id)
            .cloned()
            .ok_or(StoreError::NotFound {
                entity: EntityKind::Installment,
                id,
            })
    }

    fn update_installment(&self, installment: &Installment) -> StoreResult<()> {
        let mut rows = self.write_installments()?;
        match rows.get_mut(&installment.id) {
            Some(slot) => {
                *slot = installment.clone();
                Ok(())
            }
            None => Err(StoreError::NotFound {
                entity: EntityKind::Installment,
                id: installment.id,
            }),
        }
    }
}

impl TransactionalStore for MemoryStore {
    fn begin(&self) -> StoreResult<Box<dyn StoreTransaction + '_>> {
        Ok(Box::new(MemoryTransaction {
            store: self,
            loans: Vec::new(),
            installments: Vec::new(),
        }))
    }
}

/// writes staged against a [`MemoryStore`], applied under both locks on commit
struct MemoryTransaction<'a> {
    store: &'a MemoryStore,
    loans: Vec<Loan>,
    installments: Vec<Installment>,
}

impl StoreTransaction for MemoryTransaction<'_> {
    fn update_loan(&mut self, loan: &Loan) -> StoreResult<()> {
        self.loans.retain(|l| l.id != loan.id);
        self.loans.push(loan.clone());
        Ok(())
    }

    fn create_installment(&mut self, installment: NewInstallment) -> StoreResult<Installment> {
        check_new_installment(&installment)?;
        let installment = installment.into_installment(Uuid::new_v4());
        self.installments.push(installment.clone());
        Ok(installment)
    }

    fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryTransaction {
            store,
            loans: staged_loans,
            installments: staged_rows,
        } = *self;
        let mut loans = store.write_loans()?;
        let mut rows = store.write_installments()?;

        // validate everything before touching anything
        for loan in &staged_loans {
            if !loans.contains_key(&loan.id) {
                return Err(StoreError::NotFound {
                    entity: EntityKind::Loan,
                    id: loan.id,
                });
            }
        }
        for installment in &staged_rows {
            if !loans.contains_key(&installment.loan_id) {
                return Err(unknown_loan(installment.loan_id));
            }
        }

        tracing::debug!(
            loans = staged_loans.len(),
            installments = staged_rows.len(),
            "memory transaction committed"
        );
        for loan in staged_loans {
            loans.insert(loan.id, loan);
        }
        for installment in staged_rows {
            rows.insert(installment.id, installment);
        }
        Ok(())
    }

    fn rollback(self: Box<Self>) {
        tracing::debug!(
            loans = self.loans.len(),
            installments = self.installments.len(),
            "memory transaction rolled back"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::{Money, Rate};
    use crate::types::{InstallmentStatus, LoanDecision, LoanStatus};
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
    }

    fn new_loan(owner: &str, applied_at: DateTime<Utc>) -> NewLoan {
        NewLoan {
            owner_id: owner.to_string(),
            borrower_name: None,
            purpose: None,
            principal: Money::from_major(1_000),
            term_months: 3,
            category: "car".to_string(),
            interest_rate: Rate::from_percentage(9),
            applied_at,
        }
    }

    fn new_installment(loan_id: LoanId, sequence: u32) -> NewInstallment {
        NewInstallment {
            loan_id,
            sequence,
            due_date: day(1) + Duration::days(30 * sequence as i64),
            amount: Money::from_major(100),
        }
    }

    #[test]
    fn test_create_and_find_loan() {
        let store = MemoryStore::new();
        let loan = store.create_loan(new_loan("u1", day(1))).unwrap();

        assert_eq!(loan.status(), LoanStatus::Pending);
        assert_eq!(store.find_loan(loan.id).unwrap(), loan);

        let missing = Uuid::new_v4();
        assert_eq!(
            store.find_loan(missing).unwrap_err(),
            StoreError::NotFound {
                entity: EntityKind::Loan,
                id: missing
            }
        );
    }

    #[test]
    fn test_identifiers_are_unique() {
        let store = MemoryStore::new();
        let a = store.create_loan(new_loan("u1", day(1))).unwrap();
        let b = store.create_loan(new_loan("u1", day(1))).unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(store.loan_count().unwrap(), 2);
    }

    #[test]
    fn test_create_loan_constraints() {
        let store = MemoryStore::new();
        let mut bad = new_loan("u1", day(1));
        bad.principal = Money::ZERO;
        assert!(matches!(
            store.create_loan(bad).unwrap_err(),
            StoreError::Constraint { .. }
        ));

        let mut bad = new_loan("u1", day(1));
        bad.term_months = 0;
        assert!(store.create_loan(bad).is_err());
        assert_eq!(store.loan_count().unwrap(), 0);
    }

    #[test]
    fn test_owner_listing_is_ordered() {
        let store = MemoryStore::new();
        let later = store.create_loan(new_loan("u1", day(9))).unwrap();
        let earlier = store.create_loan(new_loan("u1", day(2))).unwrap();
        store.create_loan(new_loan("u2", day(5))).unwrap();

        let mine: Vec<LoanId> = store
            .loans_for_owner("u1")
            .unwrap()
            .iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(mine, vec![earlier.id, later.id]);

        assert!(store.loans_for_owner("nobody").unwrap().is_empty());
        assert_eq!(store.all_loans().unwrap().len(), 3);
    }

    #[test]
    fn test_update_loan() {
        let store = MemoryStore::new();
        let mut loan = store.create_loan(new_loan("u1", day(1))).unwrap();
        loan.decision = LoanDecision::Approved { approved_at: day(3) };
        store.update_loan(&loan).unwrap();
        assert_eq!(store.find_loan(loan.id).unwrap().status(), LoanStatus::Approved);

        let ghost = new_loan("u1", day(1)).into_loan(Uuid::new_v4());
        assert!(matches!(
            store.update_loan(&ghost).unwrap_err(),
            StoreError::NotFound { .. }
        ));
    }

    #[test]
    fn test_installments_require_known_loan() {
        let store = MemoryStore::new();
        let err = store
            .create_installment(new_installment(Uuid::new_v4(), 1))
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint { .. }));
        assert_eq!(store.installment_count().unwrap(), 0);
    }

    #[test]
    fn test_installments_sorted_by_due_date() {
        let store = MemoryStore::new();
        let loan = store.create_loan(new_loan("u1", day(1))).unwrap();
        for seq in [3, 1, 2] {
            store.create_installment(new_installment(loan.id, seq)).unwrap();
        }

        let rows = store.installments_for_loan(loan.id).unwrap();
        let order: Vec<u32> = rows.iter().map(|r| r.sequence).collect();
        assert_eq!(order, vec![1, 2, 3]);
        assert!(rows.iter().all(|r| r.status == InstallmentStatus::Pending));

        assert!(store.installments_for_loan(Uuid::new_v4()).unwrap().is_empty());
    }

    #[test]
    fn test_update_installment() {
        let store = MemoryStore::new();
        let loan = store.create_loan(new_loan("u1", day(1))).unwrap();
        let mut row = store.create_installment(new_installment(loan.id, 1)).unwrap();

        row.mark_paid(day(20));
        store.update_installment(&row).unwrap();
        assert!(store.find_installment(row.id).unwrap().is_paid());

        let missing = Uuid::new_v4();
        assert!(matches!(
            store.find_installment(missing).unwrap_err(),
            StoreError::NotFound { entity: EntityKind::Installment, .. }
        ));
    }

    #[test]
    fn test_transaction_invisible_until_commit() {
        let store = MemoryStore::new();
        let mut loan = store.create_loan(new_loan("u1", day(1))).unwrap();
        loan.decision = LoanDecision::Approved { approved_at: day(4) };

        let mut tx = store.begin().unwrap();
        tx.update_loan(&loan).unwrap();
        tx.create_installment(new_installment(loan.id, 1)).unwrap();
        tx.create_installment(new_installment(loan.id, 2)).unwrap();

        assert!(store.find_loan(loan.id).unwrap().is_pending());
        assert_eq!(store.installment_count().unwrap(), 0);

        tx.commit().unwrap();
        assert_eq!(store.find_loan(loan.id).unwrap().status(), LoanStatus::Approved);
        assert_eq!(store.installments_for_loan(loan.id).unwrap().len(), 2);
    }

    #[test]
    fn test_transaction_rollback_discards() {
        let store = MemoryStore::new();
        let mut loan = store.create_loan(new_loan("u1", day(1))).unwrap();
        loan.decision = LoanDecision::Approved { approved_at: day(4) };

        let mut tx = store.begin().unwrap();
        tx.update_loan(&loan).unwrap();
        tx.create_installment(new_installment(loan.id, 1)).unwrap();
        tx.rollback();

        assert!(store.find_loan(loan.id).unwrap().is_pending());
        assert_eq!(store.installment_count().unwrap(), 0);
    }

    #[test]
    fn test_commit_is_all_or_nothing() {
        let store = MemoryStore::new();
        let mut loan = store.create_loan(new_loan("u1", day(1))).unwrap();
        loan.decision = LoanDecision::Approved { approved_at: day(4) };

        let mut tx = store.begin().unwrap();
        tx.update_loan(&loan).unwrap();
        tx.create_installment(new_installment(loan.id, 1)).unwrap();
        tx.create_installment(new_installment(Uuid::new_v4(), 2)).unwrap();

        assert!(matches!(tx.commit().unwrap_err(), StoreError::Constraint { .. }));
        assert!(store.find_loan(loan.id).unwrap().is_pending());
        assert_eq!(store.installment_count().unwrap(), 0);
    }
}
