// vim: tw=80
//! Compile-time checked, tag-dispatched test doubles.
//!
//! Tagmock builds a stand-in for a collaborator out of a set of
//! caller-supplied closures, one per operation, each addressed by a
//! compile-time tag.  Dispatch is resolved during monomorphization: there is
//! no registry lookup, no boxing, no virtual call, and no runtime error path
//! for a missing or mis-typed callable.  Every shape mistake is a build
//! failure, never a test failure.
//!
//! # Usage
//!
//! There are two ways to use Tagmock.  If the collaborator is already
//! described by a trait, [`#[autostub]`](macro@autostub) generates the stub
//! from the trait definition.  Otherwise [`facade!`] declares the stubbed
//! interface directly.  Either way, the basic idea is the same.
//!
//! * Declare the stubbed interface.  For each operation the macro generates
//!   a *tag*: a unit type named by CamelCasing the operation (`fn read_dir`
//!   gets the tag `ReadDir`).  The stub struct's name is the interface's
//!   with "Stub" prepended.
//! * In your test, construct the stub with its builder, registering one
//!   closure per tag with [`Register::on`].  Registration is by tag, never
//!   by position, so the order is free; `build()` only compiles once every
//!   slot is filled.
//! * Supply the stub to the code you're testing, as the value of its
//!   collaborator type parameter.  Every method call runs the closure
//!   registered for that method's tag and returns whatever it returns.
//!
//! The stub records nothing itself.  Call counts, seen arguments, and canned
//! return values all live in the closures you supply, which keeps a stub's
//! state strictly private to the test that built it.
//!
//! ## Getting started
//! ```
//! use tagmock::{facade, Register};
//!
//! facade! {
//!     pub Filesystem {
//!         fn read(&self, path: &str) -> String;
//!         fn remove(&self, path: &str) -> bool;
//!     }
//! }
//!
//! let fs = StubFilesystem::builder()
//!     .on(Read, |path: &str| format!("contents of {}", path))
//!     .on(Remove, |_path: &str| true)
//!     .build();
//! assert_eq!("contents of a.txt", fs.read("a.txt"));
//! assert!(fs.remove("a.txt"));
//! ```
//!
//! ## Stateful stubs
//!
//! A registered closure may be any `FnMut`, so canned behavior can evolve
//! across calls:
//!
//! ```
//! use tagmock::{facade, Register};
//!
//! facade! {
//!     Sequencer {
//!         fn next_id(&self) -> u32;
//!     }
//! }
//!
//! let mut n = 0;
//! let seq = StubSequencer::builder()
//!     .on(NextId, move || { n += 1; n })
//!     .build();
//! assert_eq!(1, seq.next_id());
//! assert_eq!(2, seq.next_id());
//! ```
//!
//! ## Keeping a handle on captured state
//!
//! Closures are stored inside the stub by value, and the stub itself is
//! typically moved into the system under test.  To inspect what a stub saw
//! *after* handing it off, close over a [`Capture`] or [`CallCount`] cell
//! and keep a second handle to it; every handle aliases the same state, so
//! moving the stub never invalidates yours:
//!
//! ```
//! use tagmock::{facade, Capture, Register};
//!
//! facade! {
//!     Journal {
//!         fn record(&self, line: &str);
//!     }
//! }
//!
//! fn exercise(journal: StubJournal<impl FnMut(&str)>) {
//!     journal.record("first");
//!     journal.record("second");
//! }
//!
//! let seen = Capture::new(Vec::new());
//! let sink = seen.handle();
//! let journal = StubJournal::builder()
//!     .on(Record, move |line: &str| sink.update(|v| v.push(line.to_owned())))
//!     .build();
//! exercise(journal);
//! assert_eq!(2, seen.with(|v| v.len()));
//! ```
//!
//! ## Standing in for the real collaborator
//!
//! The system under test should hold its collaborator through a type
//! parameter, owned by value.  With [`#[autostub]`](macro@autostub) the stub
//! implements the stubbed trait, so it satisfies the same bound as the real
//! implementation:
//!
//! ```
//! use tagmock::{autostub, Register};
//!
//! #[autostub]
//! trait KeyStore {
//!     fn fetch(&self, key: &str) -> Option<String>;
//! }
//!
//! struct Service<S: KeyStore> {
//!     keys: S,
//! }
//!
//! impl<S: KeyStore> Service<S> {
//!     fn greeting(&self) -> String {
//!         self.keys.fetch("greeting").unwrap_or_default()
//!     }
//! }
//!
//! let keys = StubKeyStore::builder()
//!     .on(Fetch, |key: &str| Some(key.to_uppercase()))
//!     .build();
//! let service = Service { keys };
//! assert_eq!("GREETING", service.greeting());
//! ```
//!
//! With [`facade!`] the generated methods are inherent, so the substitution
//! is structural: any system under test generic over its collaborator type
//! will accept the stub as long as it only calls methods the stub declares.
//!
//! ## Shape mistakes are compile errors
//!
//! Leaving a slot vacant fails to build, because `build()` is only defined
//! when every slot holds a callable:
//!
//! ```compile_fail
//! use tagmock::{facade, Register};
//!
//! facade! {
//!     pub Filesystem {
//!         fn read(&self, path: &str) -> String;
//!         fn remove(&self, path: &str) -> bool;
//!     }
//! }
//!
//! let fs = StubFilesystem::builder()
//!     .on(Read, |path: &str| path.to_owned())
//!     .build();    // the `remove` slot was never filled
//! ```
//!
//! Registering the same tag twice fails to build, because `on` is only
//! defined while the tag's slot is vacant:
//!
//! ```compile_fail
//! use tagmock::{facade, Register};
//!
//! facade! {
//!     pub Filesystem {
//!         fn read(&self, path: &str) -> String;
//!         fn remove(&self, path: &str) -> bool;
//!     }
//! }
//!
//! let fs = StubFilesystem::builder()
//!     .on(Read, |path: &str| path.to_owned())
//!     .on(Read, |path: &str| path.to_owned())    // already filled
//!     .on(Remove, |_path: &str| true)
//!     .build();
//! ```
//!
//! Registering a callable with the wrong signature fails to build:
//!
//! ```compile_fail
//! use tagmock::{facade, Register};
//!
//! facade! {
//!     pub Filesystem {
//!         fn read(&self, path: &str) -> String;
//!         fn remove(&self, path: &str) -> bool;
//!     }
//! }
//!
//! let fs = StubFilesystem::builder()
//!     .on(Read, |path: &str| path.to_owned())
//!     .on(Remove, |attempts: u32| attempts > 0)    // wrong signature
//!     .build();
//! ```
//!
//! So does declaring two operations with the same name:
//!
//! ```compile_fail
//! use tagmock::facade;
//!
//! facade! {
//!     pub Degenerate {
//!         fn poke(&self);
//!         fn poke(&self);
//!     }
//! }
//! ```
//!
//! And so does invoking the store with another interface's tag:
//!
//! ```compile_fail
//! use tagmock::{facade, Invoke, Register};
//!
//! facade! {
//!     pub Alpha {
//!         fn go(&self) -> u32;
//!     }
//! }
//!
//! facade! {
//!     pub Beta {
//!         fn halt(&self) -> u32;
//!     }
//! }
//!
//! let alpha = StubAlpha::builder().on(Go, || 1).build();
//! alpha.calls().invoke(Halt, ());    // `Halt` is not one of Alpha's tags
//! ```
//!
//! ## Threading and reentrancy
//!
//! Stubs are single-threaded by design: slots live in `RefCell`s so that
//! `&self` interface methods can drive `FnMut` closures, and captured state
//! cells are `Rc`-based.  A closure that calls back into its own slot will
//! panic on the nested borrow.  Build one stub per test case; nothing is
//! shared between instances.
//!
//! ## Crate features
//!
//! * **nightly**: better diagnostics from the macros on the nightly
//!   compiler.

mod capture;

pub use capture::{CallCount, Capture};
pub use tagmock_derive::{autostub, facade};

/// A compile-time identifier for one stubbed operation.
///
/// Tags are unit types generated by [`facade!`] and
/// [`#[autostub]`](macro@autostub), one per operation, named by CamelCasing
/// the operation's name.  A tag has no runtime state; it exists so that the
/// operation's callable can be addressed by type identity instead of by a
/// runtime key, which is what removes the "unknown key" error path from
/// dispatch altogether.
pub trait Tag {
    /// The operation's name as declared in the stubbed interface.
    const NAME: &'static str;
}

/// The state of a builder slot that has not received its callable yet.
///
/// `Vacant` implements no `FnMut` signature, so a builder whose slots are
/// not all filled has no `build()` method.
#[derive(Clone, Copy, Debug)]
pub struct Vacant;

/// Tag-addressed registration of a callable into a stub builder.
///
/// Generated builders implement `Register<T, F>` for each of their tags `T`,
/// but only while `T`'s slot is still [`Vacant`]; the impl's `F` bound is
/// the operation's exact signature.  Both halves are deliberate: they turn
/// double registration and wrong-shaped callables into missing-impl compile
/// errors at the registration call site.
pub trait Register<T: Tag, F>: Sized {
    /// The builder with `T`'s slot filled.
    type Output;

    /// Register `stub` as the callable behind `tag`.
    fn on(self, tag: T, stub: F) -> Self::Output;
}

/// Tag-addressed invocation on a callable store.
///
/// Generated stores implement `Invoke<T, Args>` once per tag, with `Args`
/// the operation's argument tuple.  `invoke` runs the registered callable
/// with the forwarded arguments and returns its result unchanged; the store
/// adds nothing of its own.  Invoking with a tag the store does not declare,
/// or with arguments that don't match the tag's signature, is a compile
/// error, not a runtime one.
pub trait Invoke<T: Tag, Args> {
    /// The operation's return type.
    type Output;

    /// Run the callable registered for `tag` with `args`.
    fn invoke(&self, tag: T, args: Args) -> Self::Output;
}
