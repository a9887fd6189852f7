use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::errors::{LoanError, Result};
use crate::store::StoreError;
use crate::types::LoanId;

/// one writer per loan at a time
///
/// Approve, reject and pay all read a record, check its state and write it
/// back. Running that sequence inside `with_loan` keeps two requests for the
/// same loan from interleaving. Requests for different loans only share the
/// short registry lookup. An entry lives only while some caller holds or
/// waits on it, so the registry stays as small as the set of busy loans.
#[derive(Debug, Default)]
pub struct LoanLocks {
    registry: Mutex<HashMap<LoanId, Arc<Mutex<()>>>>,
}

impl LoanLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// run `f` while holding the loan's lock
    pub fn with_loan<T>(&self, loan_id: LoanId, f: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = {
            let mut registry = self.registry.lock().map_err(|_| poisoned())?;
            Arc::clone(registry.entry(loan_id).or_default())
        };
        let result = match lock.lock() {
            Ok(_guard) => f(),
            Err(_) => Err(poisoned()),
        };
        self.release(loan_id, lock);
        result
    }

    /// drop the registry entry once no other caller shares it
    fn release(&self, loan_id: LoanId, lock: Arc<Mutex<()>>) {
        let Ok(mut registry) = self.registry.lock() else {
            tracing::error!(loan_id = %loan_id, "loan lock registry poisoned, entry kept");
            return;
        };
        // clones are only handed out under the registry lock, so two means
        // the map and this caller
        if Arc::strong_count(&lock) == 2 {
            registry.remove(&loan_id);
        }
    }

    /// number of loans currently locked or waited on
    pub fn tracked(&self) -> usize {
        self.registry.lock().map(|r| r.len()).unwrap_or(0)
    }
}

fn poisoned() -> LoanError {
    LoanError::Storage(StoreError::Poisoned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn test_same_loan_is_serialized() {
        let locks = LoanLocks::new();
        let loan_id = Uuid::new_v4();
        let inside = AtomicUsize::new(0);
        let max_inside = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    locks
                        .with_loan(loan_id, || {
                            let now = inside.fetch_add(1, Ordering::SeqCst) + 1;
                            max_inside.fetch_max(now, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(2));
                            inside.fetch_sub(1, Ordering::SeqCst);
                            Ok(())
                        })
                        .unwrap();
                });
            }
        });

        assert_eq!(max_inside.load(Ordering::SeqCst), 1);
        assert_eq!(locks.tracked(), 0);
    }

    #[test]
    fn test_result_passes_through() {
        let locks = LoanLocks::new();
        let loan_id = Uuid::new_v4();

        let value = locks.with_loan(loan_id, || Ok(42)).unwrap();
        assert_eq!(value, 42);

        let err = locks
            .with_loan(loan_id, || -> Result<()> {
                Err(LoanError::Conflict {
                    message: "busy".to_string(),
                })
            })
            .unwrap_err();
        assert!(matches!(err, LoanError::Conflict { .. }));

        // lock released after an error
        assert!(locks.with_loan(loan_id, || Ok(())).is_ok());
    }

    #[test]
    fn test_nested_different_loans() {
        let locks = LoanLocks::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        let held = locks
            .with_loan(a, || locks.with_loan(b, || Ok(locks.tracked())))
            .unwrap();
        assert_eq!(held, 2);
        assert_eq!(locks.tracked(), 0);
    }

    #[test]
    fn test_registry_empties_after_use() {
        let locks = LoanLocks::new();
        for _ in 0..1_000 {
            locks.with_loan(Uuid::new_v4(), || Ok(())).unwrap();
        }
        assert_eq!(locks.tracked(), 0);

        let loan_id = Uuid::new_v4();
        let _ = locks.with_loan(loan_id, || -> Result<()> {
            Err(LoanError::validation("nope"))
        });
        assert_eq!(locks.tracked(), 0);
    }
}
