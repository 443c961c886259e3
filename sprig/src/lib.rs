#![warn(clippy::pedantic)]

//! Typed in-process signals and observable properties.
//!
//! [`Signal`] is a multi-subscriber event emitter. Each subscription yields a
//! [`Connection`] that can be disconnected at any time, from any thread, and
//! that can reroute delivery of future emissions onto a caller-supplied
//! execution context via [`Connection::dispatch_via`]. Dropping the signal
//! turns every outstanding connection into a safe no-op handle.
//!
//! [`Property`] is an observable value cell built on one [`Signal`]: writes
//! that change the value notify subscribers of its `changed` signal, storage
//! can be redirected through caller-supplied getter/setter callables, and
//! [`chain`] forwards one property's changes into another.
//!
//! ```
//! use std::sync::Arc;
//!
//! use sprig::{chain, Property};
//!
//! let temperature = Property::new(20);
//! let display = Arc::new(Property::new(0));
//! let _link = chain(&temperature, &display);
//!
//! temperature.set(23);
//! assert_eq!(display.get(), 23);
//! ```

mod connection;
pub use connection::{Connection, Dispatcher, ScopedConnection, Thunk};

mod signal;
pub use signal::Signal;

mod property;
pub use property::{chain, set_default, Property};
