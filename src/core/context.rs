// This module defines the OpExecutionContext trait, the read-only view of a live op
// execution that the single-op argument builder consumes. A context is bound to one op
// kernel that has already been initialised (and normally already run) against concrete
// input tensors. The trait exposes the kernel's own copy of its node def, the dtypes the
// kernel declared for its outputs and the dtypes of the bound inputs. Output dtypes are
// the declared ones from the op definition and never inferred from the inputs. Keeping
// this behind a trait lets the argument builder work with the framework's
// OpKernelContext as well as with any other execution layer that can answer these
// queries.

//! Execution-context adaptor.
//!
//! The context is the glue between the op-execution layer and the compile
//! utilities. The builder only ever reads from it:
//! - The node def held by the kernel.
//! - The number and declared dtypes of the outputs, in declaration order.
//! - The number and dtypes of the bound inputs.

use crate::protos::{DataType, NodeDef};

/// Read-only view of an op execution.
///
/// Implementations must return output dtypes in declaration order and must keep
/// every answer stable for as long as the context is borrowed.
pub trait OpExecutionContext {
    /// The kernel's own copy of its defining node def.
    fn op_kernel_def(&self) -> &NodeDef;

    /// Number of outputs declared by the op.
    fn num_outputs(&self) -> usize;

    /// Declared dtype of output `index`.
    fn expected_output_dtype(&self, index: usize) -> DataType;

    /// Number of inputs bound to the context.
    fn num_inputs(&self) -> usize;

    /// Dtype of bound input `index`.
    fn input_dtype(&self, index: usize) -> DataType;

    /// All declared output dtypes, in declaration order.
    fn expected_output_dtypes(&self) -> Vec<DataType> {
        (0..self.num_outputs())
            .map(|i| self.expected_output_dtype(i))
            .collect()
    }
}
