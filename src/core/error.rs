// This module defines the error type for xla-compile-util using the thiserror crate for
// idiomatic Rust error handling. JitError covers the failure modes of the pieces around
// the two core transforms: building node defs against the op registry (unknown ops,
// wrong input counts, missing or conflicting attributes), initialising and running op
// kernels (missing kernels, input dtype and shape mismatches, invalid shapes), building
// the single-op wrapper graph (argument, result and slot counts), and parsing
// configuration strings. Each variant carries the node, op or attribute it concerns.
// JitResult<T> is the matching Result alias. The core transforms themselves are total
// and never produce a JitError.

//! Error types for xla-compile-util.

use thiserror::Error;

use crate::protos::DataType;

/// Main error type for building and running single ops.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum JitError {
    #[error("Op type not registered '{op}'")]
    OpNotRegistered {
        op: String,
    },

    #[error("NodeDef '{node}' for op '{op}' expects {expected} inputs, got {actual}")]
    InputCountMismatch {
        node: String,
        op: String,
        expected: usize,
        actual: usize,
    },

    #[error("NodeDef '{node}' missing attr '{attr}'")]
    MissingAttr {
        node: String,
        attr: String,
    },

    #[error("Inconsistent values for attr '{attr}' {first} vs. {second} while building NodeDef '{node}'")]
    InconsistentAttr {
        node: String,
        attr: String,
        first: DataType,
        second: DataType,
    },

    #[error("Attr '{attr}' of NodeDef '{node}' has kind {actual}, expected {expected}")]
    AttrKind {
        node: String,
        attr: String,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("No kernel registered for op '{op}'")]
    NoKernel {
        op: String,
    },

    #[error("Kernel has not been initialized, call init_op first")]
    KernelNotInitialized,

    #[error("Input {index} of '{node}' has type {actual}, expected {expected}")]
    InputTypeMismatch {
        node: String,
        index: usize,
        expected: DataType,
        actual: DataType,
    },

    #[error("Tensor shape {dims:?} holds {expected} elements, got {actual}")]
    ShapeMismatch {
        dims: Vec<i64>,
        expected: usize,
        actual: usize,
    },

    #[error("Tensor shape {dims:?} has a negative dimension or too many elements")]
    InvalidShape {
        dims: Vec<i64>,
    },

    #[error("Shape output type is 32-bit but dim {index} is {dim}")]
    ShapeOutputOverflow {
        index: usize,
        dim: i64,
    },

    #[error("Single-op graph for '{node}' given {actual} arguments, op takes {expected}")]
    ArgumentCountMismatch {
        node: String,
        expected: usize,
        actual: usize,
    },

    #[error("Single-op graph for '{node}' asks for {actual} results, op produces {expected}")]
    ResultCountMismatch {
        node: String,
        expected: usize,
        actual: usize,
    },

    #[error("Node '{node}' has {available} {direction}s, slot {slot} is out of range")]
    SlotOutOfRange {
        node: String,
        direction: &'static str,
        slot: i32,
        available: usize,
    },

    #[error("Graph has no node with id {id}")]
    NodeNotFound {
        id: usize,
    },

    #[error("Invalid device list '{list}': empty device type")]
    InvalidDeviceList {
        list: String,
    },

    #[error("Unknown primitive type '{name}'")]
    UnknownPrimitiveType {
        name: String,
    },
}

/// Result type alias for framework operations.
pub type JitResult<T> = Result<T, JitError>;
