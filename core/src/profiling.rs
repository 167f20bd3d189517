//! Profiling support via Tracy.
//!
//! Optional instrumentation using the [Tracy profiler](https://github.com/wolfpld/tracy),
//! enabled via the `profiling` Cargo feature:
//!
//! ```toml
//! [dependencies]
//! chroma-core = { version = "0.1", features = ["profiling"] }
//! ```
//!
//! Shader composition and program linking are the expensive steps of a
//! material's life, so the graphics crate wraps them in spans:
//!
//! ```ignore
//! use chroma_core::profiling::{profile_scope, profile_function};
//!
//! fn compose() {
//!     profile_function!();
//!
//!     {
//!         profile_scope!("fragment_stage");
//!         // ...
//!     }
//! }
//! ```
//!
//! When profiling is disabled (the default), all macros compile to no-ops.

#[cfg(feature = "profiling")]
pub use tracy_client::{self, Client, Span, span};

/// Create a profiling span for the current scope.
///
/// The span ends when the scope exits.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope {
    ($name:expr) => {
        let _profile_span = $crate::profiling::span!($name);
    };
}

/// Create a profiling span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope {
    ($name:expr) => {};
}

/// Create a profiling span for the entire function.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_function {
    () => {
        let _profile_span = $crate::profiling::span!();
    };
}

/// Create a profiling span for function (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_function {
    () => {};
}

/// Create a span whose name is only known at runtime, e.g. a material label.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_scope_dynamic {
    ($name:expr) => {
        let _profile_span = $crate::profiling::Client::running()
            .map(|c| c.span_alloc(Some($name), "", file!(), line!(), 0));
    };
}

/// Create a dynamic span (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_scope_dynamic {
    ($name:expr) => {
        let _ = &$name;
    };
}

/// Send a text message to the Tracy timeline.
#[macro_export]
#[cfg(feature = "profiling")]
macro_rules! profile_message {
    ($msg:expr) => {
        if let Some(client) = $crate::profiling::Client::running() {
            client.message($msg, 0);
        }
    };
}

/// Send a message (no-op when profiling disabled).
#[macro_export]
#[cfg(not(feature = "profiling"))]
macro_rules! profile_message {
    ($msg:expr) => {};
}

pub use profile_function;
pub use profile_message;
pub use profile_scope;
pub use profile_scope_dynamic;

#[cfg(test)]
mod tests {
    #[test]
    fn test_macros_compile() {
        profile_scope!("test_scope");
        profile_function!();
        let label = String::from("material");
        profile_scope_dynamic!(&label);
        profile_message!("test message");
    }
}
