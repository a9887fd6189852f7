use thiserror::Error;
use uuid::Uuid;

use crate::store::StoreError;
use crate::types::{EntityKind, LoanId, OwnerId};

#[derive(Error, Debug)]
pub enum LoanError {
    #[error("validation failed: {message}")]
    Validation {
        message: String,
    },

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: EntityKind,
        id: Uuid,
    },

    #[error("unauthorized: {actor} does not own loan {loan_id}")]
    Unauthorized {
        actor: OwnerId,
        loan_id: LoanId,
    },

    #[error("conflict: {message}")]
    Conflict {
        message: String,
    },

    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl LoanError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        LoanError::Validation {
            message: message.into(),
        }
    }

    /// arithmetic left the representable decimal range
    pub(crate) fn out_of_range() -> Self {
        LoanError::validation("amount out of range")
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, LoanError::Validation { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, LoanError::NotFound { .. })
    }
}

impl From<StoreError> for LoanError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => LoanError::NotFound { entity, id },
            other => LoanError::Storage(other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LoanError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let id = Uuid::new_v4();
        let err: LoanError = StoreError::NotFound {
            entity: EntityKind::Installment,
            id,
        }
        .into();

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), format!("installment not found: {}", id));
    }

    #[test]
    fn test_other_store_errors_stay_storage() {
        let err: LoanError = StoreError::Backend {
            message: "connection reset".to_string(),
        }
        .into();

        assert!(matches!(err, LoanError::Storage(StoreError::Backend { .. })));
        assert_eq!(
            err.to_string(),
            "storage failure: backend error: connection reset"
        );
    }
}
