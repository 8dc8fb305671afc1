//! spate-store — the shared work counter and everything that mutates it.
//!
//! # Architecture
//!
//! ```text
//! Producer (1 task, fixed period)
//!   └── reads ProductionParameters → WorkloadStore::produce(delta)
//!                                        │ notify_waiters()
//!                                        ▼
//! consume request ──────────────► WorkloadStore::consume()
//!                                   wait until value > 0, re-check,
//!                                   remove min(draw, value)
//!
//! stats stream ─────────────────► WorkloadStore::snapshot()
//! ```
//!
//! All mutations of the counter happen under one lock. Blocked consumers
//! are woken by broadcast and re-check the counter themselves, so a single
//! production that satisfies several consumers wakes all of them.

pub mod dice;
pub mod error;
pub mod params;
pub mod producer;
pub mod store;

pub use dice::{Dice, SeededDice, ThreadDice};
pub use error::{StoreError, StoreResult};
pub use params::{ProductionParameters, ProductionSettings};
pub use producer::Producer;
pub use store::WorkloadStore;
