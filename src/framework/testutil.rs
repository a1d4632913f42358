//! Fixture for running a single op kernel.
//!
//! [`OpsTestHarness`] walks through the same steps the JIT's single-op path
//! takes before it asks for a compile argument: describe the node, create the
//! kernel, bind input tensors and run it. The resulting [`OpKernelContext`] is a
//! live execution context suitable for
//! [`build_argument`](crate::jit::build_argument).

use std::sync::Arc;

use crate::core::error::{JitError, JitResult};
use crate::framework::kernel::{OpKernel, OpKernelContext};
use crate::framework::types::{Tensor, TensorElement, TensorShape};
use crate::protos::NodeDef;

/// Test context that owns the node def, kernel, inputs and execution context.
#[derive(Debug, Default)]
pub struct OpsTestHarness {
    node_def: NodeDef,
    kernel: Option<Arc<OpKernel>>,
    inputs: Vec<Tensor>,
    context: Option<OpKernelContext>,
}

impl OpsTestHarness {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the node def the kernel will be created from.
    pub fn set_node_def(&mut self, node_def: NodeDef) {
        self.node_def = node_def;
    }

    pub fn node_def(&self) -> &NodeDef {
        &self.node_def
    }

    /// Create the kernel for the current node def and drop any previous inputs.
    pub fn init_op(&mut self) -> JitResult<()> {
        self.kernel = Some(Arc::new(OpKernel::new(self.node_def.clone())?));
        self.inputs.clear();
        self.context = None;
        Ok(())
    }

    pub fn add_input_from_array<T: TensorElement>(
        &mut self,
        shape: TensorShape,
        values: &[T],
    ) -> JitResult<()> {
        self.inputs.push(Tensor::from_array(shape, values)?);
        Ok(())
    }

    /// Bind the inputs added so far and run the kernel.
    pub fn run_op_kernel(&mut self) -> JitResult<()> {
        let kernel = self.kernel.clone().ok_or(JitError::KernelNotInitialized)?;
        let mut context = OpKernelContext::new(kernel, self.inputs.clone())?;
        context.compute()?;
        self.context = Some(context);
        Ok(())
    }

    /// Execution context of the last successful run.
    pub fn context(&self) -> Option<&OpKernelContext> {
        self.context.as_ref()
    }

    pub fn get_output(&self, index: usize) -> Option<&Tensor> {
        self.context.as_ref().and_then(|ctx| ctx.output(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::node_def_builder::{FakeInput, NodeDefBuilder};
    use crate::protos::DataType;

    #[test]
    fn test_run_requires_init() {
        let mut harness = OpsTestHarness::new();
        assert_eq!(harness.run_op_kernel().unwrap_err(), JitError::KernelNotInitialized);
        assert!(harness.context().is_none());
    }

    #[test]
    fn test_identity_round() {
        let mut harness = OpsTestHarness::new();
        harness.set_node_def(
            NodeDefBuilder::new("identity_op", "Identity")
                .input(FakeInput(DataType::DtFloat))
                .finalize()
                .unwrap(),
        );
        harness.init_op().unwrap();
        harness.add_input_from_array(TensorShape::new(&[1, 2]), &[0.0f32, 1.0]).unwrap();
        harness.run_op_kernel().unwrap();

        let output = harness.get_output(0).unwrap();
        assert_eq!(output.shape().dims(), &[1, 2]);
        assert_eq!(output.as_slice::<f32>(), Some(&[0.0f32, 1.0][..]));
    }
}
