// This module is the hub for the infrastructure shared by the framework and jit
// modules: the crate-wide error type (thiserror based JitError with its JitResult
// alias) and the OpExecutionContext trait through which the single-op argument builder
// reads a live op execution. Neither piece depends on the other modules of the crate
// beyond the proto value types.

//! Core infrastructure.
//!
//! # Key Components
//!
//! ## Errors (`error`)
//! - One crate-wide error enum with contextual variants
//!
//! ## Execution context (`context`)
//! - Read-only accessors over a bound op kernel

pub mod context;
pub mod error;

pub use context::OpExecutionContext;
pub use error::{JitError, JitResult};
