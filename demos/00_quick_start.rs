/// quick start - apply, approve, pay the first installment
use loan_origination_rs::{
    LendingConfig, LoanApplication, LoanEngine, MemoryStore, Money, SafeTimeProvider, TimeSource,
};
use chrono::{TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    ));
    let engine = LoanEngine::new(MemoryStore::new(), LendingConfig::standard(), time)?;

    let loan = engine.apply(LoanApplication::new("u1", Money::from_major(12_000), 12, "home"))?;
    println!("applied: {} at {}", loan.id, loan.interest_rate);

    engine.approve(loan.id)?;
    let schedule = engine.installments_for_loan(loan.id)?;
    println!("{} installments of ${}", schedule.len(), schedule[0].amount);

    let paid = engine.pay_installment(schedule[0].id, "u1")?;
    println!("paid installment {} due {}", paid.sequence, paid.due_date.format("%Y-%m-%d"));

    Ok(())
}
