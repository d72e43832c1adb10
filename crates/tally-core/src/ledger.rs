//! # Balance Ledger
//!
//! Running Dr/Cr balance for a customer or supplier, derived on demand.
//!
//! ## Sign Convention
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  debit  = positive  ("to receive")                                      │
//! │  credit = negative  ("to pay")                                          │
//! │                                                                         │
//! │  Party      Event              Side                                     │
//! │  ────────   ────────────────   ──────                                   │
//! │  customer   sale               debit                                    │
//! │  customer   payment received   credit                                   │
//! │  supplier   purchase           credit                                   │
//! │  supplier   payment made       debit                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! Events are sorted by `(occurred_at, sequence)`, with the reference id as a
//! last resort. The sequence is the row's insertion order within its table, so
//! two events with the same timestamp always fold in the same order.
//!
//! There is no stored balance anywhere. [`compute_running_balance`] is a pure
//! function of the opening balance and the event list.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{BalanceType, PartyType};

// =============================================================================
// Events
// =============================================================================

/// Kind of ledger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Opening,
    Sale,
    Purchase,
    Payment,
}

impl EventKind {
    /// Which side of the ledger this event lands on for `party`.
    pub fn side(&self, party: PartyType) -> BalanceType {
        match (party, self) {
            (PartyType::Customer, EventKind::Payment) => BalanceType::Credit,
            (PartyType::Customer, _) => BalanceType::Debit,
            (PartyType::Supplier, EventKind::Purchase) => BalanceType::Credit,
            (PartyType::Supplier, _) => BalanceType::Debit,
        }
    }
}

/// One stored event affecting a party's balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEvent {
    pub kind: EventKind,
    pub reference_id: String,
    pub description: String,
    /// Unsigned amount; the side comes from [`EventKind::side`].
    pub amount: Money,
    pub occurred_at: DateTime<Utc>,
    /// Insertion order (SQLite rowid).
    pub sequence: i64,
}

// =============================================================================
// Statement
// =============================================================================

/// A statement row with the balance after applying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LedgerEntry {
    #[ts(as = "String")]
    pub date: DateTime<Utc>,
    pub kind: EventKind,
    pub reference_id: String,
    pub description: String,
    pub debit_cents: i64,
    pub credit_cents: i64,
    pub running_balance_cents: i64,
}

/// Full statement for one party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Statement {
    pub party_type: PartyType,
    pub party_id: String,
    pub opening_balance_cents: i64,
    pub entries: Vec<LedgerEntry>,
    pub total_debit_cents: i64,
    pub total_credit_cents: i64,
    pub closing_balance_cents: i64,
    /// "Dr" or "Cr" for the closing balance.
    pub closing_label: String,
}

impl Statement {
    #[inline]
    pub fn closing_balance(&self) -> Money {
        Money::from_cents(self.closing_balance_cents)
    }
}

/// Opening position of a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opening {
    /// Signed opening balance (debit positive).
    pub balance: Money,
    /// Date shown on the opening row (party creation time).
    pub at: DateTime<Utc>,
}

// =============================================================================
// Fold
// =============================================================================

/// Folds the opening balance and events into a statement.
///
/// The first entry is always the opening row. Calling this twice with the
/// same input yields the same statement.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use tally_core::ledger::{compute_running_balance, EventKind, LedgerEvent, Opening};
/// use tally_core::money::Money;
/// use tally_core::types::PartyType;
///
/// let now = Utc::now();
/// let opening = Opening { balance: Money::from_cents(1000), at: now };
/// let events = vec![LedgerEvent {
///     kind: EventKind::Sale,
///     reference_id: "s-1".into(),
///     description: "Sale".into(),
///     amount: Money::from_cents(18000),
///     occurred_at: now,
///     sequence: 1,
/// }];
///
/// let statement = compute_running_balance(PartyType::Customer, "c-1", opening, events);
/// assert_eq!(statement.closing_balance_cents, 19000);
/// assert_eq!(statement.closing_label, "Dr");
/// ```
pub fn compute_running_balance(
    party_type: PartyType,
    party_id: &str,
    opening: Opening,
    mut events: Vec<LedgerEvent>,
) -> Statement {
    events.sort_by(|a, b| {
        a.occurred_at
            .cmp(&b.occurred_at)
            .then_with(|| a.sequence.cmp(&b.sequence))
            .then_with(|| a.reference_id.cmp(&b.reference_id))
    });

    let mut running = opening.balance;
    let mut total_debit = Money::zero();
    let mut total_credit = Money::zero();
    let mut entries = Vec::with_capacity(events.len() + 1);

    entries.push(LedgerEntry {
        date: opening.at,
        kind: EventKind::Opening,
        reference_id: party_id.to_string(),
        description: "Opening balance".to_string(),
        debit_cents: if opening.balance.is_negative() { 0 } else { opening.balance.cents() },
        credit_cents: if opening.balance.is_negative() { opening.balance.abs().cents() } else { 0 },
        running_balance_cents: running.cents(),
    });

    for event in events {
        let amount = event.amount.abs();
        let (debit, credit) = match event.kind.side(party_type) {
            BalanceType::Debit => (amount, Money::zero()),
            BalanceType::Credit => (Money::zero(), amount),
        };

        running += debit;
        running -= credit;
        total_debit += debit;
        total_credit += credit;

        entries.push(LedgerEntry {
            date: event.occurred_at,
            kind: event.kind,
            reference_id: event.reference_id,
            description: event.description,
            debit_cents: debit.cents(),
            credit_cents: credit.cents(),
            running_balance_cents: running.cents(),
        });
    }

    Statement {
        party_type,
        party_id: party_id.to_string(),
        opening_balance_cents: opening.balance.cents(),
        entries,
        total_debit_cents: total_debit.cents(),
        total_credit_cents: total_credit.cents(),
        closing_balance_cents: running.cents(),
        closing_label: BalanceType::label_for(running).to_string(),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
