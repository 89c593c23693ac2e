//! JPEG derivatives of uploaded images.

pub mod derivatives;

pub use derivatives::{bounded_dimensions, DerivativeBuilder, DerivativeError, RawDerivatives};
