//! Positional invocation of functions with tuple argument records
//!
//! Rust has no variadic generics, so the record/function bridge is generated
//! per arity by `impl_argument_record!` for tuples of up to twelve elements.
//! A panic raised by the invoked function plays the role of an exception: the
//! plain [`invoke`] lets it unwind, and [`catch_invocation`] turns it into an
//! [`InvocationFailure`] at the tester boundary.

use std::any::{type_name, Any};
use std::cell::Cell;
use std::error::Error as StdError;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;
use std::time::{Duration, Instant};

/// A fixed-size heterogeneous argument record for one invocation
pub trait ArgumentRecord {
    /// Number of positional arguments in the record
    const ARITY: usize;
}

/// A callable that accepts the record `Args` unpacked into positional arguments
pub trait Invocable<Args, R> {
    /// Call with the elements of `args` as positional arguments
    fn call_with(&self, args: Args) -> R;
}

macro_rules! count_idents {
    () => { 0usize };
    ($head:ident $($tail:ident)*) => { 1usize + count_idents!($($tail)*) };
}

macro_rules! impl_argument_record {
    ($($arg:ident),*) => {
        impl<$($arg),*> ArgumentRecord for ($($arg,)*) {
            const ARITY: usize = count_idents!($($arg)*);
        }

        impl<Func, Ret, $($arg),*> Invocable<($($arg,)*), Ret> for Func
        where
            Func: Fn($($arg),*) -> Ret,
        {
            #[allow(non_snake_case)]
            fn call_with(&self, ($($arg,)*): ($($arg,)*)) -> Ret {
                self($($arg),*)
            }
        }
    };
}

impl_argument_record!();
impl_argument_record!(A);
impl_argument_record!(A, B);
impl_argument_record!(A, B, C);
impl_argument_record!(A, B, C, D);
impl_argument_record!(A, B, C, D, E);
impl_argument_record!(A, B, C, D, E, F);
impl_argument_record!(A, B, C, D, E, F, G);
impl_argument_record!(A, B, C, D, E, F, G, H);
impl_argument_record!(A, B, C, D, E, F, G, H, I);
impl_argument_record!(A, B, C, D, E, F, G, H, I, J);
impl_argument_record!(A, B, C, D, E, F, G, H, I, J, K);
impl_argument_record!(A, B, C, D, E, F, G, H, I, J, K, L);

/// Boxed function under test or reference function
pub type BoxedFunction<Args, R> = Box<dyn Invocable<Args, R>>;

/// Call `function` with `args` and measure how long the call took.
///
/// Panics raised by `function` propagate to the caller.
pub fn invoke<Args, R, F>(function: &F, args: Args) -> (R, Duration)
where
    F: Invocable<Args, R> + ?Sized,
{
    let clock_start = Instant::now();
    let result = function.call_with(args);
    (result, clock_start.elapsed())
}

/// Why an invocation did not produce a result
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvocationFailure {
    /// Panic with a recognised payload type
    #[error("{type_name}:\n{message}")]
    Typed { type_name: &'static str, message: String },

    /// Panic with a payload of unknown type
    #[error("unknown")]
    Unknown,
}

impl InvocationFailure {
    /// Classify a panic payload
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        if let Some(message) = payload.downcast_ref::<&str>() {
            return Self::Typed { type_name: type_name::<&str>(), message: (*message).to_string() };
        }
        if let Some(message) = payload.downcast_ref::<String>() {
            return Self::Typed { type_name: type_name::<String>(), message: message.clone() };
        }
        if let Some(error) = payload.downcast_ref::<Box<dyn StdError + Send + Sync>>() {
            return Self::Typed {
                type_name: type_name::<Box<dyn StdError + Send + Sync>>(),
                message: error.to_string(),
            };
        }

        Self::Unknown
    }

    /// The panic message, if the payload carried one
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Typed { message, .. } => Some(message),
            Self::Unknown => None,
        }
    }
}

thread_local! {
    static QUIET_PANICS: Cell<bool> = const { Cell::new(false) };
}

static QUIET_HOOK: Once = Once::new();

/// Wrap the process panic hook once so that it skips panics raised on a
/// thread that is inside [`catch_invocation`]. Other threads still reach the
/// previous hook.
fn install_quiet_hook() {
    QUIET_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !QUIET_PANICS.with(Cell::get) {
                previous(info);
            }
        }));
    });
}

/// Marks the current thread as catching invocation panics until dropped
struct QuietPanics {
    outer: bool,
}

impl QuietPanics {
    fn enter() -> Self {
        install_quiet_hook();
        Self { outer: QUIET_PANICS.with(|quiet| quiet.replace(true)) }
    }
}

impl Drop for QuietPanics {
    fn drop(&mut self) {
        QUIET_PANICS.with(|quiet| quiet.set(self.outer));
    }
}

/// Run `body`, catching a panic and classifying it as an [`InvocationFailure`].
///
/// While `body` runs, the panic hook prints nothing for panics on this
/// thread; the failure is returned instead of being written to stderr.
pub fn catch_invocation<T, F>(body: F) -> Result<T, InvocationFailure>
where
    F: FnOnce() -> T,
{
    let quiet = QuietPanics::enter();
    let caught = panic::catch_unwind(AssertUnwindSafe(body));
    drop(quiet);

    caught.map_err(|payload| {
        let failure = InvocationFailure::from_panic(payload);
        log::warn!("Invocation panicked: {}", failure);
        failure
    })
}
