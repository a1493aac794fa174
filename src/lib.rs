//! KOT Engine - order capture and kitchen ticket lifecycle
//!
//! Embeddable engine behind a restaurant POS terminal: it consolidates
//! picked products into a cart, commits the cart as numbered Kitchen
//! Order Tickets on per-channel queues, and expires tickets after their
//! TTL. All state survives restarts through an embedded redb store.
//!
//! # Module structure
//!
//! ```text
//! src/
//! ├── core/      # configuration
//! ├── models/    # domain types (products, lines, tickets)
//! ├── catalog/   # cached product list + remote source port
//! ├── cart/      # line consolidation, variant selection
//! ├── tickets/   # queues, numbering, persistence, expiry sweep
//! ├── printing/  # ticket rendering + print sink port
//! └── utils/     # logging, time helpers
//! ```
//!
//! # Startup
//!
//! ```ignore
//! kot_engine::init_logger();
//! let engine = Engine::start(Config::from_env())?;
//! engine.spawn_background_tasks();
//! ```
//!
//! `Engine::start` restores the cart snapshot, wipes stale variant
//! selections and hydrates the catalog from the local copy;
//! `spawn_background_tasks` runs one catalog refresh and the ticket
//! sweeper until `engine.shutdown().await`.

pub mod cart;
pub mod catalog;
pub mod core;
pub mod models;
pub mod printing;
pub mod tickets;
pub mod utils;

pub use cart::{Cart, VariantSelector};
pub use catalog::{CatalogError, CatalogService, CatalogSource, HttpCatalogSource};
pub use core::{Config, Engine};
pub use models::{LineItem, OrderHandoff, OrderType, Product, Ticket, Variant};
pub use printing::{LogPrintSink, PrintSink, RenderedTicket, TicketRenderer};
pub use tickets::{LedgerError, StateStore, StorageError, TicketLedger, TicketSweeper};

pub use utils::logger::{init_logger, init_logger_with_file};
