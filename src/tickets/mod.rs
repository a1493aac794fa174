//! Ticket lifecycle: queues, numbering, persistence and expiry

pub mod ledger;
pub mod storage;
pub mod sweeper;

pub use ledger::{LedgerError, LedgerResult, TicketLedger};
pub use storage::{StateStore, StorageError, StorageResult};
pub use sweeper::TicketSweeper;
