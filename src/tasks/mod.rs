//! Background Tasks Module
//!
//! Contains background tasks that run periodically during server operation.
//!
//! # Tasks
//! - Sweeper: Removes expired counters at a fixed interval

mod sweeper;

pub use sweeper::{Sweeper, SweeperHandle};

/// Default interval between sweeps (1 minute)
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 60_000;
