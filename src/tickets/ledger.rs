//! TicketLedger - ticket queues, numbering and lifecycle
//!
//! One process-wide service object owning the three per-channel ticket
//! queues, the day counter and the pending-edit number, with persistence
//! injected as a [`StateStore`]. Passing the ledger around explicitly
//! replaces the capture screen's ambient keyed globals.
//!
//! # Commit flow
//!
//! ```text
//! commit(order_type, instruction)
//!     ├─ 1. Reject an empty cart
//!     ├─ 2. Acquire a bill number (pending edit reuse, or day counter)
//!     ├─ 3. Snapshot (deep copy) the cart lines
//!     ├─ 4. Append to the addressed queue and persist it
//!     ├─ 5. Clear the cart
//!     └─ 6. Return the ticket
//! ```
//!
//! # Numbering
//!
//! Bill numbers are unique and monotonically increasing per local calendar
//! day, except for the single reuse granted to an edited ticket. The
//! counter's read-modify-write is guarded by the ledger's in-process lock
//! only: one terminal per store. Concurrent terminals sharing a counter
//! would race and remain unsupported.

use crate::cart::Cart;
use crate::models::{DayCounter, OrderHandoff, OrderType, Ticket};
use crate::tickets::storage::{StateStore, StorageError};
use crate::utils::time;
use chrono_tz::Tz;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

/// State key for the day counter
const COUNTER_KEY: &str = "kotCounter";

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Cannot commit an empty cart")]
    EmptyCart,

    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Process-wide ticket ledger
pub struct TicketLedger {
    store: StateStore,
    cart: Arc<Cart>,
    tz: Tz,
    ttl_ms: i64,
    queues: RwLock<HashMap<OrderType, Vec<Ticket>>>,
    /// Bill number reserved by an edit, consumed by exactly one commit
    pending_edit: Mutex<Option<String>>,
}

impl TicketLedger {
    /// Create a ledger, restoring all three queues from the state store
    ///
    /// Missing or corrupt queues load as empty.
    pub fn new(store: StateStore, cart: Arc<Cart>, tz: Tz, ttl_ms: i64) -> Self {
        let mut queues = HashMap::new();
        for order_type in OrderType::ALL {
            let tickets: Vec<Ticket> = match store.get_json(order_type.storage_key()) {
                Ok(tickets) => tickets.unwrap_or_default(),
                Err(e) => {
                    tracing::warn!(
                        queue = order_type.storage_key(),
                        error = %e,
                        "Failed to load ticket queue, starting empty"
                    );
                    Vec::new()
                }
            };
            queues.insert(order_type, tickets);
        }

        Self {
            store,
            cart,
            tz,
            ttl_ms,
            queues: RwLock::new(queues),
            pending_edit: Mutex::new(None),
        }
    }

    // ========== Numbering ==========

    /// Acquire the next bill number for a commit at `now`
    ///
    /// A pending edit number is returned unchanged and cleared, with no
    /// counter mutation. Otherwise the day counter bumps, or resets to 1
    /// when its stored date no longer matches today's key. The rendered
    /// string is zero-padded to 4 digits and simply grows past "9999".
    fn next_bill_no(&self, now_millis: i64) -> LedgerResult<String> {
        if let Some(reused) = self.pending_edit.lock().take() {
            return Ok(reused);
        }

        let today = time::day_key(now_millis, self.tz);
        let counter: Option<DayCounter> = self.store.get_json(COUNTER_KEY)?;

        let next_no = match counter {
            Some(c) if c.date == today => c.last_no + 1,
            _ => 1,
        };
        self.store.put_json(
            COUNTER_KEY,
            &DayCounter {
                date: today,
                last_no: next_no,
            },
        )?;

        Ok(format!("{:04}", next_no))
    }

    /// Whether an edit is waiting to reuse its bill number
    pub fn has_pending_edit(&self) -> bool {
        self.pending_edit.lock().is_some()
    }

    // ========== Lifecycle ==========

    /// Commit the cart as a new ticket on the addressed queue
    ///
    /// The items are deep-copied so later cart mutation cannot alter the
    /// committed ticket. The cart is cleared only after the queue persists.
    pub fn commit(
        &self,
        order_type: OrderType,
        instruction: Option<String>,
    ) -> LedgerResult<Ticket> {
        self.commit_at(order_type, instruction, time::now_millis())
    }

    fn commit_at(
        &self,
        order_type: OrderType,
        instruction: Option<String>,
        now_millis: i64,
    ) -> LedgerResult<Ticket> {
        let items = self.cart.items();
        if items.is_empty() {
            return Err(LedgerError::EmptyCart);
        }

        let bill_no = self.next_bill_no(now_millis)?;
        let ticket = Ticket {
            bill_no,
            timestamp: now_millis,
            date: time::human_date(now_millis, self.tz),
            items,
            order_type,
            instruction: instruction.filter(|s| !s.is_empty()),
        };

        {
            let mut queues = self.queues.write();
            let queue = queues.entry(order_type).or_default();
            queue.push(ticket.clone());
            self.store.put_json(order_type.storage_key(), queue)?;
        }

        self.cart.clear();
        tracing::info!(
            bill_no = %ticket.bill_no,
            channel = %order_type,
            items = ticket.items.len(),
            "Ticket committed"
        );
        Ok(ticket)
    }

    /// Remove a ticket by position; out-of-range is a no-op
    pub fn delete(&self, order_type: OrderType, index: usize) -> LedgerResult<()> {
        let mut queues = self.queues.write();
        let queue = queues.entry(order_type).or_default();
        if index >= queue.len() {
            return Ok(());
        }
        queue.remove(index);
        self.store.put_json(order_type.storage_key(), queue)?;
        Ok(())
    }

    /// Pull a ticket back into the cart for editing
    ///
    /// The ticket leaves its queue, its bill number is reserved for the
    /// next commit, and its item snapshot replaces the cart contents.
    pub fn edit(&self, order_type: OrderType, index: usize) -> LedgerResult<Option<Ticket>> {
        let ticket = {
            let mut queues = self.queues.write();
            let queue = queues.entry(order_type).or_default();
            if index >= queue.len() {
                return Ok(None);
            }
            let ticket = queue.remove(index);
            self.store.put_json(order_type.storage_key(), queue)?;
            ticket
        };

        *self.pending_edit.lock() = Some(ticket.bill_no.clone());
        self.cart.replace(ticket.items.clone());
        tracing::info!(bill_no = %ticket.bill_no, channel = %order_type, "Ticket pulled back for edit");
        Ok(Some(ticket))
    }

    /// Build the order-detail hand-off for a ticket without mutating anything
    pub fn convert_to_order(&self, order_type: OrderType, index: usize) -> Option<OrderHandoff> {
        let queues = self.queues.read();
        let ticket = queues.get(&order_type)?.get(index)?;
        Some(OrderHandoff {
            order_type: ticket.order_type,
            bill_no: ticket.bill_no.clone(),
            items: ticket.items.clone(),
        })
    }

    /// Cloned view of one queue
    pub fn tickets(&self, order_type: OrderType) -> Vec<Ticket> {
        self.queues
            .read()
            .get(&order_type)
            .cloned()
            .unwrap_or_default()
    }

    pub fn queue_len(&self, order_type: OrderType) -> usize {
        self.queues
            .read()
            .get(&order_type)
            .map(Vec::len)
            .unwrap_or(0)
    }

    // ========== Expiry sweep ==========

    /// Evict tickets whose age has reached the TTL; returns the evicted count
    ///
    /// Pure and idempotent: a sweep with nothing expired changes nothing,
    /// and only queues that actually changed are re-persisted. Persistence
    /// failures are logged and do not stop the sweep.
    pub fn sweep_expired(&self, now_millis: i64) -> usize {
        let mut evicted = 0;

        let mut queues = self.queues.write();
        for order_type in OrderType::ALL {
            let queue = queues.entry(order_type).or_default();
            let before = queue.len();
            queue.retain(|t| now_millis - t.timestamp < self.ttl_ms);
            let removed = before - queue.len();
            if removed > 0 {
                evicted += removed;
                tracing::debug!(
                    channel = %order_type,
                    removed,
                    remaining = queue.len(),
                    "Evicted expired tickets"
                );
                if let Err(e) = self.store.put_json(order_type.storage_key(), queue) {
                    tracing::error!(channel = %order_type, error = %e, "Failed to persist swept queue");
                }
            }
        }

        evicted
    }
}
