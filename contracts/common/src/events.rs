//! Pool Events
//!
//! Events are emitted during execution and can be indexed off-chain for
//! building UIs, analytics and notifications. Each mutating pool operation
//! emits exactly one pool event.

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::types::{Address, U256};

/// Event types for indexing and filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
#[borsh(use_discriminant = true)]
#[repr(u8)]
pub enum EventType {
    // Pool Events (0x01 - 0x1F)
    Supply = 0x01,
    Withdraw = 0x02,
    TeamAddedEth = 0x03,
    TeamUpdated = 0x04,

    // Token Events (0x40 - 0x5F)
    Transfer = 0x40,
    Approval = 0x41,
    SharesMinted = 0x42,
    SharesBurned = 0x43,

    // Feed Events (0x60 - 0x7F)
    RateUpdated = 0x60,
    FeedOperatorChanged = 0x61,
}

/// Main event enum containing all pool, token and feed events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BorshSerialize, BorshDeserialize)]
pub enum ExaEvent {
    // ============ Pool Events ============

    /// Emitted on any successful deposit, direct or converted
    Supply {
        depositor: Address,
        base_amount: U256,
        shares_minted: U256,
        block_height: u64,
    },

    /// Emitted on successful withdrawal
    Withdraw {
        holder: Address,
        base_amount: U256,
        shares_burned: U256,
        block_height: u64,
    },

    /// Emitted when the team folds value into the pool
    TeamAddedEth {
        team: Address,
        amount: U256,
        block_height: u64,
    },

    /// Emitted when the team hands over to a new address
    TeamUpdated {
        old_team: Address,
        new_team: Address,
        block_height: u64,
    },

    // ============ Token Events ============

    Transfer {
        from: Address,
        to: Address,
        amount: U256,
        block_height: u64,
    },

    Approval {
        owner: Address,
        spender: Address,
        amount: U256,
        block_height: u64,
    },

    SharesMinted {
        to: Address,
        amount: U256,
        new_total_supply: U256,
        block_height: u64,
    },

    SharesBurned {
        from: Address,
        amount: U256,
        new_total_supply: U256,
        block_height: u64,
    },

    // ============ Feed Events ============

    /// Emitted when the operator posts a new rate
    RateUpdated {
        old_rate: U256,
        new_rate: U256,
        block_height: u64,
    },

    /// Emitted when the admin rotates the feed operator
    FeedOperatorChanged {
        old_operator: Address,
        new_operator: Address,
        block_height: u64,
    },
}

impl ExaEvent {
    /// Get the event type for filtering
    pub fn event_type(&self) -> EventType {
        match self {
            Self::Supply { .. } => EventType::Supply,
            Self::Withdraw { .. } => EventType::Withdraw,
            Self::TeamAddedEth { .. } => EventType::TeamAddedEth,
            Self::TeamUpdated { .. } => EventType::TeamUpdated,
            Self::Transfer { .. } => EventType::Transfer,
            Self::Approval { .. } => EventType::Approval,
            Self::SharesMinted { .. } => EventType::SharesMinted,
            Self::SharesBurned { .. } => EventType::SharesBurned,
            Self::RateUpdated { .. } => EventType::RateUpdated,
            Self::FeedOperatorChanged { .. } => EventType::FeedOperatorChanged,
        }
    }

    /// Get the block height when event occurred
    pub fn block_height(&self) -> u64 {
        match self {
            Self::Supply { block_height, .. }
            | Self::Withdraw { block_height, .. }
            | Self::TeamAddedEth { block_height, .. }
            | Self::TeamUpdated { block_height, .. }
            | Self::Transfer { block_height, .. }
            | Self::Approval { block_height, .. }
            | Self::SharesMinted { block_height, .. }
            | Self::SharesBurned { block_height, .. }
            | Self::RateUpdated { block_height, .. }
            | Self::FeedOperatorChanged { block_height, .. } => *block_height,
        }
    }

    /// Serialize event to bytes for storage/transmission
    pub fn to_bytes(&self) -> Vec<u8> {
        borsh::to_vec(self).unwrap_or_default()
    }

    /// Deserialize event from bytes
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        borsh::from_slice(bytes).ok()
    }
}

/// Event log for collecting events during execution
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventLog {
    events: Vec<ExaEvent>,
}

impl EventLog {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    /// Emit an event (add to log)
    pub fn emit(&mut self, event: ExaEvent) {
        self.events.push(event);
    }

    pub fn events(&self) -> &[ExaEvent] {
        &self.events
    }

    /// Take ownership of all events
    pub fn into_events(self) -> Vec<ExaEvent> {
        self.events
    }

    /// Most recent event, if any
    pub fn last(&self) -> Option<&ExaEvent> {
        self.events.last()
    }

    /// Filter events by type
    pub fn filter_by_type(&self, event_type: EventType) -> Vec<&ExaEvent> {
        self.events
            .iter()
            .filter(|e| e.event_type() == event_type)
            .collect()
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
