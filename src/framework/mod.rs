// This module groups the minimal op-execution framework the compile utilities sit on:
// tensors, the op registry, node-def construction, host kernels with their execution
// context, dataflow graphs and a harness that drives a single kernel end to end. It is
// deliberately small and only covers the ops the single-op JIT path needs; the compile
// utilities read from it through the OpExecutionContext trait and the Graph type.

//! Op-execution framework.

pub mod graph;
pub mod kernel;
pub mod node_def_builder;
pub mod op_registry;
pub mod testutil;
pub mod types;

pub use graph::{Edge, Graph, Node, CONTROL_SLOT};
pub use kernel::{OpKernel, OpKernelContext};
pub use node_def_builder::{FakeInput, NodeDefBuilder};
pub use op_registry::{ArgDef, ArgType, AttrDef, AttrKind, OpDef, OpRegistry, ARG_OP, RETVAL_OP};
pub use testutil::OpsTestHarness;
pub use types::{Tensor, TensorData, TensorElement, TensorShape};
