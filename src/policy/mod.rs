//! Compile policy definitions.

pub mod v1;
pub mod exceptions;

pub use v1::{UpdateGraphPolicyV1, DEFAULT_SKIP_WINDOW_MINORS};
pub use exceptions::{ExceptionTable, RHACS_EXCEPTIONS_REVISION};
