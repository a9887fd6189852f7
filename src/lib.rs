pub mod clock;
pub mod config;
pub mod decimal;
pub mod engine;
pub mod errors;
pub mod events;
pub mod loan;
pub mod locks;
pub mod payments;
pub mod rates;
pub mod store;
pub mod types;
pub mod views;

// re-export key types
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::LendingConfig;
pub use decimal::{Money, Rate};
pub use engine::LoanEngine;
pub use errors::{LoanError, Result};
pub use events::{Event, EventStore};
pub use loan::{Loan, LoanApplication, NewLoan};
pub use payments::{
    AmortizationCalculator, AmortizationSchedule, Installment, NewInstallment,
    ScheduledInstallment,
};
pub use rates::RateTable;
pub use store::{
    LoanStore, MemoryStore, RepaymentStore, StoreError, StoreResult, StoreTransaction,
    TransactionalStore,
};
pub use types::{
    EntityKind, InstallmentId, InstallmentStatus, LoanDecision, LoanId, LoanStatus, OwnerId,
    RoundingPolicy,
};
pub use views::{LoanQuote, LoanView, PortfolioSummary};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
