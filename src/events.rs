use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::config::DEFAULT_EVENT_CAPACITY;
use crate::decimal::{Money, Rate};
use crate::types::{InstallmentId, LoanId, OwnerId};

/// everything the engine reports about effective state changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    LoanApplied {
        loan_id: LoanId,
        owner_id: OwnerId,
        principal: Money,
        term_months: u32,
        interest_rate: Rate,
        timestamp: DateTime<Utc>,
    },
    LoanApproved {
        loan_id: LoanId,
        interest_rate: Rate,
        timestamp: DateTime<Utc>,
    },
    ScheduleGenerated {
        loan_id: LoanId,
        installments: u32,
        installment_amount: Money,
        first_due: DateTime<Utc>,
        final_due: DateTime<Utc>,
    },
    LoanRejected {
        loan_id: LoanId,
        reason: String,
        timestamp: DateTime<Utc>,
    },
    InstallmentPaid {
        loan_id: LoanId,
        installment_id: InstallmentId,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
}

impl Event {
    pub fn loan_id(&self) -> LoanId {
        match self {
            Event::LoanApplied { loan_id, .. }
            | Event::LoanApproved { loan_id, .. }
            | Event::ScheduleGenerated { loan_id, .. }
            | Event::LoanRejected { loan_id, .. }
            | Event::InstallmentPaid { loan_id, .. } => *loan_id,
        }
    }
}

/// bounded event buffer, oldest events are discarded once full
#[derive(Debug)]
pub struct EventStore {
    events: VecDeque<Event>,
    capacity: usize,
    dropped: u64,
}

impl EventStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_CAPACITY)
    }

    /// buffer holding at most `capacity` events, never less than one
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    pub fn emit(&mut self, event: Event) {
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped += 1;
            if self.dropped == 1 || self.dropped % 1_000 == 0 {
                tracing::warn!(
                    capacity = self.capacity,
                    dropped = self.dropped,
                    "event buffer full, discarding oldest events"
                );
            }
        }
        self.events.push_back(event);
    }

    /// drain everything buffered so far
    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events).into()
    }

    pub fn events(&self) -> impl Iterator<Item = &Event> {
        self.events.iter()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// events discarded because the buffer was full
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

impl Default for EventStore {
    fn default() -> Self {
        Self::new()
    }
}
