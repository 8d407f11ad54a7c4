//! Time source for deadline checks.

use ledger_types::current_timestamp;
use std::sync::atomic::{AtomicU64, Ordering};

/// Supplies the current unix time in seconds.
pub trait Clock: Send + Sync {
	fn now(&self) -> u64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn now(&self) -> u64 {
		current_timestamp()
	}
}

/// A clock that only moves when told to. Used by tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock(AtomicU64);

impl ManualClock {
	pub fn new(now: u64) -> Self {
		Self(AtomicU64::new(now))
	}

	pub fn set(&self, now: u64) {
		self.0.store(now, Ordering::SeqCst);
	}

	pub fn advance(&self, seconds: u64) {
		self.0.fetch_add(seconds, Ordering::SeqCst);
	}
}

impl Clock for ManualClock {
	fn now(&self) -> u64 {
		self.0.load(Ordering::SeqCst)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_manual_clock() {
		let clock = ManualClock::new(1_000);
		assert_eq!(clock.now(), 1_000);
		clock.advance(500);
		assert_eq!(clock.now(), 1_500);
		clock.set(10);
		assert_eq!(clock.now(), 10);
	}

	#[test]
	fn test_system_clock_is_recent() {
		// 2023-11-14, well before any test run.
		assert!(SystemClock.now() > 1_700_000_000);
	}
}
