//! xla-compile-util - bridging single-op execution to ahead-of-time XLA compilation.
//!
//! When the JIT compiles one op on its own, it needs two things from the
//! state it already has: a compile argument describing the op, and the build
//! options the backend uses to turn the compiled computation into an
//! executable. This crate derives both, as pure functions over read-only
//! inputs.
//!
//! # Primary Usage
//!
//! ```ignore
//! use xla_compile_util::jit::{build_argument, resolve_build_options};
//!
//! // After the kernel has run:
//! let arg = build_argument(ctx);
//!
//! // After the argument has been compiled:
//! let build_options = resolve_build_options(&options, &result, default_device_ordinal);
//! ```
//!
//! # Architecture
//!
//! - [`core`] - Error type and the execution-context adaptor trait
//! - [`protos`] - Protocol-buffer shaped values shared with TensorFlow and XLA
//! - [`framework`] - Minimal op-execution framework (registry, kernels, graphs)
//! - [`jit`] - Compile argument, build options and single-op graph construction

pub mod core;
pub mod framework;
pub mod jit;
pub mod protos;

// Re-export common types from organized modules
pub use self::core::{JitError, JitResult, OpExecutionContext};
pub use jit::{
    build_argument, create_single_op_graph, resolve_build_options, CompilationArgument,
    CompilationResult, CompilerOptions, ExecutableBuildOptions,
};
