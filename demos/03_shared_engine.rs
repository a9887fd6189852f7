/// shared engine - many threads deciding and paying through one engine
use std::sync::Arc;
use std::thread;

use loan_origination_rs::{
    LendingConfig, LoanApplication, LoanEngine, LoanStatus, MemoryStore, Money, SystemClock,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=== shared engine ===\n");

    let engine = Arc::new(LoanEngine::new(MemoryStore::new(), LendingConfig::standard(), SystemClock)?);
    let loan = engine.apply(LoanApplication::new("dave", Money::from_major(24_000), 24, "home"))?;

    // every thread races to approve the same loan
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.approve(loan.id))
        })
        .collect();
    for handle in handles {
        let decided = handle.join().map_err(|_| "approval thread panicked")??;
        assert_eq!(decided.status(), LoanStatus::Approved);
    }

    let installments = engine.installments_for_loan(loan.id)?;
    println!("installments after 8 approvals: {}", installments.len());

    // pay them from several threads at once
    let handles: Vec<_> = installments
        .into_iter()
        .map(|installment| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || engine.pay_installment(installment.id, "dave"))
        })
        .collect();
    for handle in handles {
        handle.join().map_err(|_| "payment thread panicked")??;
    }

    let view = engine.loan_view(loan.id)?;
    println!("paid: {}/{}", view.repayment.paid_count, view.repayment.installment_count);
    println!("fully repaid: {}", view.is_fully_repaid());

    let summary = engine.portfolio_summary()?;
    println!("portfolio: {} loans, ${} principal", summary.total_loans, summary.total_principal);
    Ok(())
}
