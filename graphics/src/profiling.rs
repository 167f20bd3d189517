//! Profiling support via Tracy.
//!
//! Re-exports the CPU profiling macros from [`chroma_core::profiling`]. They
//! compile to nothing unless the `profiling` feature is enabled:
//!
//! ```bash
//! cargo run -p chroma-demos --features chroma-graphics/profiling
//! ```
//!
//! Composition, program builds and texture binding are instrumented.
//!
//! ```ignore
//! use chroma_graphics::profiling::profile_scope;
//!
//! fn upload_frame() {
//!     profile_scope!("upload_frame");
//!     // ...
//! }
//! ```

pub use chroma_core::profiling::*;
