//! [`Signal`]: the emitter, its shared control block and the slot registry.

use std::sync::{
	atomic::{AtomicBool, AtomicU64, Ordering},
	Arc, Weak,
};

use parking_lot::Mutex;

use crate::connection::{Connection, Dispatcher, SlotHost};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Slot<T> {
	id: u64,
	/// Shared with emission snapshots; cleared by `disconnect` so that an
	/// in-flight emission observes the removal before invoking the handler.
	alive: Arc<AtomicBool>,
	handler: Handler<T>,
	dispatcher: Option<Dispatcher>,
}

/// The control block. Owned strongly by the [`Signal`] alone; every
/// [`Connection`] holds it weakly, so dropping the signal makes all
/// outstanding connections inert without freeing the allocation out from
/// under them.
struct Registry<T> {
	/// Insertion-ordered. Locked only for registry access, never across a
	/// handler invocation.
	slots: Mutex<Vec<Slot<T>>>,
	next_id: AtomicU64,
}

impl<T> Registry<T> {
	fn new() -> Self {
		Self {
			slots: Mutex::new(Vec::new()),
			next_id: AtomicU64::new(0),
		}
	}
}

impl<T> SlotHost for Registry<T> {
	fn disconnect(&self, id: u64) {
		let mut slots = self.slots.lock();
		if let Some(index) = slots.iter().position(|slot| slot.id == id) {
			slots[index].alive.store(false, Ordering::Release);
			slots.remove(index);
		}
	}

	fn dispatch_via(&self, id: u64, dispatcher: Dispatcher) {
		let mut slots = self.slots.lock();
		if let Some(slot) = slots.iter_mut().find(|slot| slot.id == id) {
			slot.dispatcher = Some(dispatcher);
		}
	}
}

/// A typed multi-subscriber event emitter.
///
/// `T` is the emission payload; multi-argument signals use a tuple payload,
/// e.g. `Signal<(u32, f64)>`. Handlers receive the payload by reference and
/// run on the emitting thread unless their connection installs a dispatcher.
///
/// All operations take `&self` and may be called concurrently from any number
/// of threads, including re-entrantly from inside a handler.
pub struct Signal<T: 'static> {
	registry: Arc<Registry<T>>,
}

impl<T: 'static> Signal<T> {
	#[must_use]
	pub fn new() -> Self {
		Self {
			registry: Arc::new(Registry::new()),
		}
	}

	/// Registers `handler` under a fresh slot id, with synchronous direct
	/// delivery until a dispatcher is installed on the returned connection.
	///
	/// A handler connected from inside another handler of the same signal is
	/// not invoked by the emission already in progress.
	pub fn connect(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Connection {
		let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
		self.registry.slots.lock().push(Slot {
			id,
			alive: Arc::new(AtomicBool::new(true)),
			handler: Arc::new(handler),
			dispatcher: None,
		});
		let host = Arc::downgrade(&self.registry) as Weak<dyn SlotHost>;
		Connection::new(id, host)
	}

	/// Number of currently registered slots.
	#[must_use]
	pub fn connected(&self) -> usize {
		self.registry.slots.lock().len()
	}
}

impl<T: Clone + Send + 'static> Signal<T> {
	/// Delivers `value` to every slot in a snapshot taken at emission start,
	/// in insertion order.
	///
	/// Slots without a dispatcher are invoked directly on this thread; for
	/// the rest, a thunk binding (handler, value) is handed to the slot's
	/// dispatcher, fire and forget. The registry lock is released before any
	/// handler or dispatcher runs, so handlers may connect, disconnect and
	/// emit on this same signal.
	pub fn emit(&self, value: T) {
		let snapshot: Vec<(Arc<AtomicBool>, Handler<T>, Option<Dispatcher>)> = {
			let slots = self.registry.slots.lock();
			slots
				.iter()
				.map(|slot| (slot.alive.clone(), slot.handler.clone(), slot.dispatcher.clone()))
				.collect()
		};
		for (alive, handler, dispatcher) in snapshot {
			if !alive.load(Ordering::Acquire) {
				continue;
			}
			match dispatcher {
				None => handler(&value),
				Some(dispatch) => {
					let value = value.clone();
					dispatch(Box::new(move || handler(&value)));
				}
			}
		}
	}
}

impl<T: 'static> Default for Signal<T> {
	fn default() -> Self {
		Self::new()
	}
}

impl<T: 'static> std::fmt::Debug for Signal<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Signal")
			.field("connected", &self.connected())
			.finish()
	}
}
