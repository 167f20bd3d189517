//! # Chroma Core
//!
//! Basic utilities shared by the Chroma crates: f32 math aliases, packed
//! color conversion and optional Tracy instrumentation.

pub mod color;
pub mod math;
pub mod profiling;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
