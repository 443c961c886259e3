//! [`Property`]: an observable value cell over one [`Signal`].

use std::{
	any::{Any, TypeId},
	collections::HashMap,
	fmt::{self, Debug, Formatter},
	sync::{Arc, LazyLock},
};

use parking_lot::Mutex;

use crate::{Connection, Signal};

type Getter<T> = Arc<dyn Fn() -> T + Send + Sync>;
type Setter<T> = Arc<dyn Fn(T) + Send + Sync>;

/// Process-wide per-type defaults for [`Property::default`], keyed by
/// [`TypeId`]. Read only at construction time.
static DEFAULTS: LazyLock<Mutex<HashMap<TypeId, Box<dyn Any + Send + Sync>>>> =
	LazyLock::new(|| Mutex::new(HashMap::new()));

/// Configures the process-wide default value used by default-constructed
/// [`Property`]s of type `T`.
///
/// Independent per `T`; affects only properties constructed afterwards, and
/// is never reset automatically. Before the first call for a given `T`,
/// [`Property::default`] falls back to [`T::default()`](`Default`).
pub fn set_default<T: Clone + Send + Sync + 'static>(value: T) {
	DEFAULTS.lock().insert(TypeId::of::<T>(), Box::new(value));
}

fn configured_default<T: Clone + 'static>() -> Option<T> {
	DEFAULTS
		.lock()
		.get(&TypeId::of::<T>())
		.and_then(|any| any.downcast_ref::<T>())
		.cloned()
}

struct Storage<T> {
	value: T,
	getter: Option<Getter<T>>,
	setter: Option<Setter<T>>,
}

/// An observable value cell.
///
/// Reads and writes go through in-place storage by default, or through
/// caller-installed [getter](`Property::install_getter`)/
/// [setter](`Property::install_setter`) callables. A write that changes the
/// value emits the [`changed`](`Property::changed`) signal with the new
/// value; writing the current value again is suppressed (change detection is
/// why `T: PartialEq` is required).
///
/// All operations take `&self`; share a property across threads via `Arc`.
pub struct Property<T: Clone + PartialEq + Send + 'static> {
	storage: Mutex<Storage<T>>,
	changed: Signal<T>,
}

impl<T: Clone + PartialEq + Send + 'static> Property<T> {
	/// A property holding `value`, regardless of any configured per-type
	/// default.
	#[must_use]
	pub fn new(value: T) -> Self {
		Self {
			storage: Mutex::new(Storage {
				value,
				getter: None,
				setter: None,
			}),
			changed: Signal::new(),
		}
	}

	/// The current value: the installed getter's result, or the stored value.
	#[must_use]
	pub fn get(&self) -> T {
		let storage = self.storage.lock();
		let getter = storage.getter.clone();
		match getter {
			Some(getter) => {
				drop(storage);
				getter()
			}
			None => storage.value.clone(),
		}
	}

	/// Writes `value` and emits [`changed`](`Property::changed`) if it
	/// differs from the stored value.
	///
	/// With an installed setter the write goes through the setter alone (no
	/// read-back through the getter), so change suppression does not apply
	/// and every call emits.
	pub fn set(&self, value: T) {
		let mut storage = self.storage.lock();
		if let Some(setter) = storage.setter.clone() {
			drop(storage);
			setter(value.clone());
			self.changed.emit(value);
			return;
		}
		if storage.value == value {
			return;
		}
		storage.value = value.clone();
		drop(storage);
		self.changed.emit(value);
	}

	/// Applies `mutator` to the current value in place and emits
	/// [`changed`](`Property::changed`) iff the mutator reports a change.
	///
	/// The mutator's verdict is authoritative; no equality re-check is
	/// performed. Returns that verdict.
	pub fn update(&self, mutator: impl FnOnce(&mut T) -> bool) -> bool {
		let mut storage = self.storage.lock();
		if storage.getter.is_none() && storage.setter.is_none() {
			let changed = mutator(&mut storage.value);
			if changed {
				let value = storage.value.clone();
				drop(storage);
				self.changed.emit(value);
			}
			return changed;
		}

		// Redirected storage: read-modify-write through the installed
		// callables, falling back to the in-place cell for the missing side.
		let getter = storage.getter.clone();
		let setter = storage.setter.clone();
		let mut value = match &getter {
			Some(getter) => {
				drop(storage);
				getter()
			}
			None => {
				let value = storage.value.clone();
				drop(storage);
				value
			}
		};
		let changed = mutator(&mut value);
		if changed {
			match &setter {
				Some(setter) => setter(value.clone()),
				None => self.storage.lock().value = value.clone(),
			}
			self.changed.emit(value);
		}
		changed
	}

	/// Copies `source`'s current value into this property through the normal
	/// [`set`](`Property::set`) path. A one-shot copy, not a chain.
	pub fn assign_from(&self, source: &Property<T>) {
		self.set(source.get());
	}

	/// Redirects reads through `getter`, replacing the in-place read path.
	pub fn install_getter(&self, getter: impl Fn() -> T + Send + Sync + 'static) {
		self.storage.lock().getter = Some(Arc::new(getter));
	}

	/// Redirects writes through `setter`, replacing the in-place write path.
	pub fn install_setter(&self, setter: impl Fn(T) + Send + Sync + 'static) {
		self.storage.lock().setter = Some(Arc::new(setter));
	}

	/// The notification signal, for direct subscription or dispatcher
	/// routing.
	#[must_use]
	pub fn changed(&self) -> &Signal<T> {
		&self.changed
	}
}

impl<T: Clone + PartialEq + Default + Send + Sync + 'static> Default for Property<T> {
	/// A property holding the configured per-type default (see
	/// [`set_default`]), or `T::default()` if none was configured.
	fn default() -> Self {
		Self::new(configured_default::<T>().unwrap_or_default())
	}
}

/// Copy construction: a new property holding `source`'s current value. No
/// sharing, no chaining.
impl<T: Clone + PartialEq + Send + 'static> From<&Property<T>> for Property<T> {
	fn from(source: &Property<T>) -> Self {
		Self::new(source.get())
	}
}

impl<T: Clone + PartialEq + Send + 'static> PartialEq for Property<T> {
	fn eq(&self, other: &Self) -> bool {
		self.get() == other.get()
	}
}

impl<T: Clone + PartialEq + Send + 'static> PartialEq<T> for Property<T> {
	fn eq(&self, other: &T) -> bool {
		self.get() == *other
	}
}

impl<T: Clone + PartialEq + Debug + Send + 'static> Debug for Property<T> {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("Property")
			.field("value", &self.get())
			.finish()
	}
}

/// One-way chaining: forwards every future change of `source` into
/// `target.set`.
///
/// The link holds `target` only weakly (dropping the target's last `Arc`
/// makes the link inert) and does not synchronize `target` to `source`'s
/// current value at chain time. Disconnect the returned [`Connection`] (or
/// guard it with a [`ScopedConnection`](`crate::ScopedConnection`)) to sever
/// the link.
pub fn chain<T: Clone + PartialEq + Send + 'static>(
	source: &Property<T>,
	target: &Arc<Property<T>>,
) -> Connection {
	let target = Arc::downgrade(target);
	source.changed().connect(move |value: &T| {
		if let Some(target) = target.upgrade() {
			target.set(value.clone());
		}
	})
}
