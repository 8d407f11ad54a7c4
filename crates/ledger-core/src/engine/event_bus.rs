//! Broadcast channel for ledger events.
//!
//! Publishing never blocks and succeeds whether or not anyone is listening.
//! Slow subscribers lag and lose the oldest events.

use ledger_types::LedgerEvent;
use tokio::sync::broadcast;

#[derive(Clone)]
pub struct EventBus {
	sender: broadcast::Sender<LedgerEvent>,
}

impl EventBus {
	pub fn new(capacity: usize) -> Self {
		let (sender, _) = broadcast::channel(capacity);
		Self { sender }
	}

	pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
		self.sender.subscribe()
	}

	/// Publishes `event`, returning the number of subscribers that received it.
	pub fn publish(&self, event: LedgerEvent) -> usize {
		self.sender.send(event).unwrap_or(0)
	}
}
