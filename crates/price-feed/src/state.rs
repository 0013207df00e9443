//! Shared board state
//!
//! Snapshots and previous prices live behind one exclusive lock. Writers and
//! the renderer both take it, so a render never sees a half-applied update.

use parking_lot::{Mutex, MutexGuard};
use std::collections::HashMap;

use tickerboard_core::{Instrument, TickerSnapshot};

/// Everything guarded by the board lock
#[derive(Debug, Default)]
pub struct BoardState {
    /// Latest snapshot per instrument
    snapshots: HashMap<Instrument, TickerSnapshot>,

    /// Last price seen by the previous render, for trend colouring
    previous: HashMap<Instrument, f64>,

    /// Instruments whose worker gave up connecting
    unavailable: HashMap<Instrument, String>,

    update_count: u64,
}

impl BoardState {
    pub fn snapshot(&self, instrument: Instrument) -> Option<&TickerSnapshot> {
        self.snapshots.get(&instrument)
    }

    pub fn previous_price(&self, instrument: Instrument) -> Option<f64> {
        self.previous.get(&instrument).copied()
    }

    /// Record `price` as the new previous price, returning the old one
    pub fn swap_previous_price(&mut self, instrument: Instrument, price: f64) -> Option<f64> {
        self.previous.insert(instrument, price)
    }

    pub fn unavailable_reason(&self, instrument: Instrument) -> Option<&str> {
        self.unavailable.get(&instrument).map(String::as_str)
    }
}

/// Shared state handle, cloned into tasks behind an `Arc`
#[derive(Debug, Default)]
pub struct SharedState {
    inner: Mutex<BoardState>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot for its instrument, returning the one it replaced
    pub fn apply(&self, snapshot: TickerSnapshot) -> Option<TickerSnapshot> {
        let mut state = self.inner.lock();
        let instrument = snapshot.instrument;

        state.unavailable.remove(&instrument);
        state.update_count += 1;
        state.snapshots.insert(instrument, snapshot)
    }

    pub fn mark_unavailable(&self, instrument: Instrument, reason: impl Into<String>) {
        self.inner.lock().unavailable.insert(instrument, reason.into());
    }

    /// Exclusive access for the duration of a render
    pub fn lock(&self) -> MutexGuard<'_, BoardState> {
        self.inner.lock()
    }

    pub fn snapshot(&self, instrument: Instrument) -> Option<TickerSnapshot> {
        self.inner.lock().snapshots.get(&instrument).cloned()
    }

    pub fn stats(&self) -> BoardStateStats {
        let state = self.inner.lock();
        BoardStateStats {
            instrument_count: state.snapshots.len(),
            unavailable_count: state.unavailable.len(),
            update_count: state.update_count,
        }
    }
}

/// Statistics about board state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardStateStats {
    pub instrument_count: usize,
    pub unavailable_count: usize,
    pub update_count: u64,
}
