//! Storage layer for docmap
//!
//! This crate implements the in-process document store with:
//! - MemoryStore: table-per-`Vec` storage behind a RwLock
//! - QueryStats: per-operation round-trip counters
//! - FaultInjector: scripted one-shot backend failures
//! - JsonCodec: serde_json codec for contained objects

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
pub mod fault;
pub mod memory;
pub mod stats;

pub use codec::JsonCodec;
pub use fault::{FaultInjector, StoreOp};
pub use memory::MemoryStore;
pub use stats::{QueryStats, StatsSnapshot};
