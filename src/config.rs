use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::errors::{LoanError, Result};
use crate::rates::RateTable;
use crate::types::RoundingPolicy;

/// longest term accepted at intake, 40 years
pub const DEFAULT_MAX_TERM_MONTHS: u32 = 480;

/// events kept in memory before the oldest are discarded
pub const DEFAULT_EVENT_CAPACITY: usize = 10_000;

/// engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingConfig {
    pub rate_table: RateTable,
    #[serde(default)]
    pub rounding: RoundingPolicy,
    #[serde(default = "default_max_term")]
    pub max_term_months: u32,
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_max_term() -> u32 {
    DEFAULT_MAX_TERM_MONTHS
}

fn default_event_capacity() -> usize {
    DEFAULT_EVENT_CAPACITY
}

impl LendingConfig {
    /// standard retail book: home/car/gold categories, 10% fallback
    pub fn standard() -> Self {
        Self {
            rate_table: RateTable::standard(),
            rounding: RoundingPolicy::HalfAwayFromZero,
            max_term_months: DEFAULT_MAX_TERM_MONTHS,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// every category at 0%, short terms only
    pub fn zero_interest_promotion() -> Self {
        Self {
            rate_table: RateTable::new(Rate::ZERO),
            rounding: RoundingPolicy::HalfAwayFromZero,
            max_term_months: 24,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    pub fn with_rate_table(mut self, rate_table: RateTable) -> Self {
        self.rate_table = rate_table;
        self
    }

    pub fn with_rounding(mut self, rounding: RoundingPolicy) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn with_max_term_months(mut self, months: u32) -> Self {
        self.max_term_months = months;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_term_months == 0 {
            return Err(LoanError::validation("max_term_months must be at least 1"));
        }
        if self.event_capacity == 0 {
            return Err(LoanError::validation("event_capacity must be at least 1"));
        }
        if self.rate_table.has_negative_rate() {
            return Err(LoanError::validation("rate table contains a negative rate"));
        }
        Ok(())
    }

    /// parse and validate a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LendingConfig = serde_json::from_str(json)
            .map_err(|e| LoanError::validation(format!("invalid lending config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self::standard()
    }
}
