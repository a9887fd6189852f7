/// lifecycle - quote, application, decision and full repayment
use loan_origination_rs::{
    LendingConfig, LoanApplication, LoanEngine, LoanError, MemoryStore, Money, SafeTimeProvider,
    TimeSource,
};
use chrono::{Duration, TimeZone, Utc};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    println!("=== loan lifecycle ===\n");

    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap()
    ));
    let controller = time.test_control().unwrap();
    let engine = LoanEngine::new(MemoryStore::new(), LendingConfig::standard(), time)?;

    // 1. quote
    println!("1. quote");
    println!("--------");
    let quote = engine.quote(Money::from_major(6_000), 6, "car")?;
    println!("  rate: {}", quote.interest_rate);
    println!("  installment: ${}", quote.installment_amount);
    println!("  total interest: ${}", quote.total_interest);

    // 2. application
    println!("\n2. application");
    println!("--------------");
    let application = LoanApplication::new("alice", Money::from_major(6_000), 6, "car")
        .borrower_name("Alice Example")
        .purpose("used hatchback");
    let loan = engine.apply(application)?;
    println!("  id: {}", loan.id);
    println!("  status: {}", loan.status());

    // 3. approval
    println!("\n3. approval");
    println!("-----------");
    let loan = engine.approve(loan.id)?;
    println!("  status: {}", loan.status());
    for installment in engine.installments_for_loan(loan.id)? {
        println!(
            "  #{} due {} ${}",
            installment.sequence,
            installment.due_date.format("%Y-%m-%d"),
            installment.amount
        );
    }

    // 4. servicing
    println!("\n4. servicing");
    println!("------------");
    match engine.pay_installment(engine.installments_for_loan(loan.id)?[0].id, "mallory") {
        Err(LoanError::Unauthorized { .. }) => println!("  ✓ payment by a stranger refused"),
        other => println!("  unexpected: {:?}", other),
    }

    for installment in engine.installments_for_loan(loan.id)? {
        controller.advance(Duration::days(30));
        let paid = engine.pay_installment(installment.id, "alice")?;
        println!("  ✓ paid #{} on {}", paid.sequence, engine.clock().now().format("%Y-%m-%d"));
    }

    // 5. settlement
    println!("\n5. settlement");
    println!("-------------");
    let view = engine.loan_view(loan.id)?;
    println!("  paid: {}/{}", view.repayment.paid_count, view.repayment.installment_count);
    println!("  outstanding: ${}", view.repayment.outstanding);
    println!("  fully repaid: {}", view.is_fully_repaid());

    // 6. a rejected application for comparison
    println!("\n6. rejection");
    println!("------------");
    let other = engine.apply(LoanApplication::new("bob", Money::from_major(900), 3, "gold"))?;
    let other = engine.reject(other.id, "insufficient income")?;
    println!("  status: {} ({})", other.status(), other.rejection_reason().unwrap_or("-"));

    println!("\nevents recorded: {}", engine.events().len());
    Ok(())
}
