/// config - load a lending policy from json and round-trip a loan view
use loan_origination_rs::{
    LendingConfig, LoanApplication, LoanEngine, MemoryStore, Money, RoundingPolicy, SystemClock,
};

const POLICY: &str = r#"{
    "rate_table": {
        "rates": { "home": "0.065", "car": "0.11" },
        "default_rate": "0.12"
    },
    "rounding": "half_even",
    "max_term_months": 120
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== json configuration ===\n");

    let config = LendingConfig::from_json(POLICY)?;
    println!("rounding: {:?}", config.rounding);
    println!("max term: {} months", config.max_term_months);
    for (category, rate) in config.rate_table.categories() {
        println!("  {:<6} {}", category, rate);
    }
    assert_eq!(config.rounding, RoundingPolicy::HalfEven);

    let engine = LoanEngine::new(MemoryStore::new(), config, SystemClock)?;
    let application = LoanApplication::new("carol", Money::from_str_exact("100.10")?, 4, "boat")
        .purpose("dinghy");
    let loan = engine.apply(application)?;
    engine.approve(loan.id)?;

    println!("\n{}", engine.loan_view(loan.id)?.to_json_pretty()?);

    match engine.apply(LoanApplication::new("carol", Money::from_major(1_000), 240, "home")) {
        Err(e) => println!("\nrefused: {}", e),
        Ok(loan) => println!("\nunexpectedly accepted {}", loan.id),
    }

    println!("\ncurrent policy:\n{}", engine.config().to_json_pretty()?);
    Ok(())
}
