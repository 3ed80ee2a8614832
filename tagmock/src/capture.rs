// vim: tw=80
//! Shared cells for test state that must outlive a handoff.
//!
//! Callables are stored inside a stub by value, and the stub is usually
//! moved into the system under test, so a test cannot rely on the address
//! of "the closure as originally constructed" staying stable.  These cells
//! resolve that: the closure holds one handle, the test holds another, and
//! both alias the same state no matter how often the stub is moved.
//!
//! The cells are `Rc`-based and deliberately `!Send`, matching the
//! single-threaded dispatch model.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

/// A shared cell holding one piece of captured test state.
///
/// # Examples
/// ```
/// use tagmock::Capture;
///
/// let seen = Capture::new(Vec::new());
/// let sink = seen.handle();
/// let mut callable = move |x: u32| sink.update(|v| v.push(x));
/// callable(1);
/// callable(2);
/// assert_eq!(vec![1, 2], seen.get());
/// ```
pub struct Capture<T>(Rc<RefCell<T>>);

impl<T> Capture<T> {
    pub fn new(value: T) -> Self {
        Capture(Rc::new(RefCell::new(value)))
    }

    /// Create another handle to the same cell.
    pub fn handle(&self) -> Self {
        Capture(Rc::clone(&self.0))
    }

    /// Overwrite the captured value.
    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    /// Overwrite the captured value, returning the old one.
    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }

    /// Read through the captured value without cloning it.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.0.borrow())
    }

    /// Mutate the captured value in place.
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        f(&mut self.0.borrow_mut())
    }

    /// Clone the captured value out.
    pub fn get(&self) -> T
        where T: Clone
    {
        self.0.borrow().clone()
    }
}

impl<T> Clone for Capture<T> {
    fn clone(&self) -> Self {
        self.handle()
    }
}

impl<T: Default> Default for Capture<T> {
    fn default() -> Self {
        Capture::new(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Capture<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Capture").field(&self.0.borrow()).finish()
    }
}

/// A shared call counter, the spy half of most stubs.
///
/// # Examples
/// ```
/// use tagmock::CallCount;
///
/// let hits = CallCount::new();
/// let spy = hits.handle();
/// let mut callable = move || spy.bump();
/// callable();
/// callable();
/// assert_eq!(2, hits.get());
/// ```
#[derive(Clone, Default)]
pub struct CallCount(Rc<Cell<usize>>);

impl CallCount {
    pub fn new() -> Self {
        CallCount::default()
    }

    /// Create another handle to the same counter.
    pub fn handle(&self) -> Self {
        self.clone()
    }

    /// Record one call.
    pub fn bump(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

impl fmt::Debug for CallCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CallCount").field(&self.0.get()).finish()
    }
}
