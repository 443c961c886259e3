//! Subscription handles: [`Connection`] and its scope guard [`ScopedConnection`].

use std::{
	fmt::{self, Debug, Formatter},
	sync::{Arc, Weak},
};

/// A deferred handler invocation, handed to a [`Dispatcher`].
pub type Thunk = Box<dyn FnOnce() + Send>;

/// A caller-supplied execution context.
///
/// Accepts a [`Thunk`] and runs it, eventually, on some thread. The signal
/// never waits for the thunk to run and never hands the same thunk out twice;
/// everything else (timing, queueing, thread identity) is the dispatcher's
/// business.
pub type Dispatcher = Arc<dyn Fn(Thunk) + Send + Sync>;

/// Type-erased view of a signal's control block, so that [`Connection`] does
/// not need to be generic over the payload type.
pub(crate) trait SlotHost: Send + Sync {
	fn disconnect(&self, id: u64);
	fn dispatch_via(&self, id: u64, dispatcher: Dispatcher);
}

/// A lightweight handle to one slot of a [`Signal`](`crate::Signal`).
///
/// Holds only a weak reference to the signal's control block: it keeps
/// neither the signal nor the handler alive. Once the slot is disconnected or
/// the signal is dropped, every operation on the handle is a safe no-op.
///
/// Two `Connection`s compare equal iff they refer to the same slot of the
/// same signal.
#[derive(Clone)]
pub struct Connection {
	id: u64,
	host: Weak<dyn SlotHost>,
}

impl Connection {
	pub(crate) fn new(id: u64, host: Weak<dyn SlotHost>) -> Self {
		Self { id, host }
	}

	/// Removes the slot from its signal.
	///
	/// Idempotent, and safe to call after the signal is gone. Once this
	/// returns, synchronous delivery no longer invokes the handler; a thunk
	/// already handed to a dispatcher may still run.
	pub fn disconnect(&self) {
		if let Some(host) = self.host.upgrade() {
			host.disconnect(self.id);
		}
	}

	/// Routes future deliveries for this slot through `dispatcher` instead of
	/// calling the handler on the emitting thread.
	///
	/// Replaces any previously installed dispatcher. A no-op once the slot or
	/// the signal is gone.
	pub fn dispatch_via(&self, dispatcher: impl Fn(Thunk) + Send + Sync + 'static) {
		if let Some(host) = self.host.upgrade() {
			host.dispatch_via(self.id, Arc::new(dispatcher));
		}
	}
}

impl PartialEq for Connection {
	fn eq(&self, other: &Self) -> bool {
		self.id == other.id && Weak::ptr_eq(&self.host, &other.host)
	}
}

impl Eq for Connection {}

impl Debug for Connection {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Connection")
			.field("id", &self.id)
			.field("signal_alive", &(self.host.strong_count() > 0))
			.finish()
	}
}

/// Move-only guard that owns one [`Connection`] and disconnects it exactly
/// once, at the end of its scope at the latest.
#[must_use = "dropping a ScopedConnection disconnects it immediately"]
pub struct ScopedConnection {
	connection: Option<Connection>,
}

impl ScopedConnection {
	pub fn new(connection: Connection) -> Self {
		Self {
			connection: Some(connection),
		}
	}

	/// The guarded connection, e.g. for [`Connection::dispatch_via`].
	///
	/// [`None`] after an early [`disconnect`](`ScopedConnection::disconnect`)
	/// or [`release`](`ScopedConnection::release`).
	#[must_use]
	pub fn connection(&self) -> Option<&Connection> {
		self.connection.as_ref()
	}

	/// Disconnects now instead of at the end of the scope. Idempotent; the
	/// eventual drop becomes a no-op.
	pub fn disconnect(&mut self) {
		if let Some(connection) = self.connection.take() {
			connection.disconnect();
		}
	}

	/// Hands the connection back without disconnecting it, relieving the
	/// guard of its obligation.
	#[must_use]
	pub fn release(mut self) -> Option<Connection> {
		self.connection.take()
	}
}

impl From<Connection> for ScopedConnection {
	fn from(connection: Connection) -> Self {
		Self::new(connection)
	}
}

impl Drop for ScopedConnection {
	fn drop(&mut self) {
		self.disconnect();
	}
}

impl Debug for ScopedConnection {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("ScopedConnection")
			.field("connection", &self.connection)
			.finish()
	}
}
