// This module provides host op kernels and the execution context they run in. OpKernel
// is created from a NodeDef: it resolves the op in the registry and records the
// declared input and output dtypes. OpKernelContext binds a kernel to concrete input
// tensors (checking count and dtypes), runs the kernel and holds its outputs. The
// context implements OpExecutionContext, which is what the single-op compile argument
// builder reads. Only the kernels the single-op JIT path exercises exist: Identity and
// IdentityN forward their inputs, Shape emits the input's dimensions, NoOp does nothing.

//! Op kernels and their execution context.

use std::sync::Arc;

use crate::core::context::OpExecutionContext;
use crate::core::error::{JitError, JitResult};
use crate::framework::op_registry::OpRegistry;
use crate::framework::types::{Tensor, TensorShape};
use crate::protos::{DataType, NodeDef};

/// Kernel instance for one node.
#[derive(Debug, Clone, PartialEq)]
pub struct OpKernel {
    def: NodeDef,
    input_types: Vec<DataType>,
    output_types: Vec<DataType>,
}

impl OpKernel {
    pub fn new(def: NodeDef) -> JitResult<Self> {
        Self::new_in(def, OpRegistry::global())
    }

    pub fn new_in(def: NodeDef, registry: &OpRegistry) -> JitResult<Self> {
        let op_def = registry.lookup(&def.op)?;
        if !op_def.has_kernel {
            return Err(JitError::NoKernel { op: def.op });
        }
        let input_types = op_def.input_types(&def.name, &def.attr)?;
        let output_types = op_def.output_types(&def.name, &def.attr)?;
        log::debug!(
            "Created kernel {} ({}): {} inputs, {} outputs",
            def.name,
            def.op,
            input_types.len(),
            output_types.len()
        );
        Ok(Self { def, input_types, output_types })
    }

    pub fn def(&self) -> &NodeDef {
        &self.def
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn type_string(&self) -> &str {
        &self.def.op
    }

    pub fn input_types(&self) -> &[DataType] {
        &self.input_types
    }

    pub fn output_types(&self) -> &[DataType] {
        &self.output_types
    }
}

/// A kernel bound to its input tensors.
#[derive(Debug, Clone)]
pub struct OpKernelContext {
    kernel: Arc<OpKernel>,
    inputs: Vec<Tensor>,
    outputs: Vec<Option<Tensor>>,
}

impl OpKernelContext {
    pub fn new(kernel: Arc<OpKernel>, inputs: Vec<Tensor>) -> JitResult<Self> {
        if inputs.len() != kernel.input_types().len() {
            return Err(JitError::InputCountMismatch {
                node: kernel.name().to_string(),
                op: kernel.type_string().to_string(),
                expected: kernel.input_types().len(),
                actual: inputs.len(),
            });
        }
        for (index, (tensor, &expected)) in inputs.iter().zip(kernel.input_types()).enumerate() {
            if tensor.dtype() != expected {
                return Err(JitError::InputTypeMismatch {
                    node: kernel.name().to_string(),
                    index,
                    expected,
                    actual: tensor.dtype(),
                });
            }
        }
        let outputs = vec![None; kernel.output_types().len()];
        Ok(Self { kernel, inputs, outputs })
    }

    pub fn op_kernel(&self) -> &OpKernel {
        &self.kernel
    }

    pub fn input(&self, index: usize) -> Option<&Tensor> {
        self.inputs.get(index)
    }

    /// Output `index`, if the kernel has produced it.
    pub fn output(&self, index: usize) -> Option<&Tensor> {
        self.outputs.get(index).and_then(Option::as_ref)
    }

    /// Run the kernel over the bound inputs.
    pub fn compute(&mut self) -> JitResult<()> {
        log::trace!("Running kernel {} ({})", self.kernel.name(), self.kernel.type_string());
        match self.kernel.type_string() {
            "Identity" | "IdentityN" => {
                for (slot, input) in self.outputs.iter_mut().zip(&self.inputs) {
                    *slot = Some(input.clone());
                }
            }
            "Shape" => {
                let dims = self.inputs[0].shape().dims();
                let shape = TensorShape::new(&[dims.len() as i64]);
                let output = match self.kernel.output_types()[0] {
                    DataType::DtInt64 => Tensor::from_array(shape, dims)?,
                    _ => {
                        let narrowed = dims
                            .iter()
                            .enumerate()
                            .map(|(index, &dim)| {
                                i32::try_from(dim)
                                    .map_err(|_| JitError::ShapeOutputOverflow { index, dim })
                            })
                            .collect::<JitResult<Vec<i32>>>()?;
                        Tensor::from_array(shape, &narrowed)?
                    }
                };
                self.outputs[0] = Some(output);
            }
            "NoOp" => {}
            op => return Err(JitError::NoKernel { op: op.to_string() }),
        }
        Ok(())
    }
}

impl OpExecutionContext for OpKernelContext {
    fn op_kernel_def(&self) -> &NodeDef {
        self.kernel.def()
    }

    fn num_outputs(&self) -> usize {
        self.kernel.output_types().len()
    }

    fn expected_output_dtype(&self, index: usize) -> DataType {
        self.kernel.output_types()[index]
    }

    fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    fn input_dtype(&self, index: usize) -> DataType {
        self.inputs[index].dtype()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framework::node_def_builder::{FakeInput, NodeDefBuilder};

    fn kernel(op: &str, inputs: &[DataType]) -> Arc<OpKernel> {
        let mut builder = NodeDefBuilder::new("node", op);
        for &dtype in inputs {
            builder = builder.input(FakeInput(dtype));
        }
        Arc::new(OpKernel::new(builder.finalize().unwrap()).unwrap())
    }

    #[test]
    fn test_identity_forwards_input() {
        let input = Tensor::from_array(TensorShape::new(&[1, 2]), &[0.0f32, 1.0]).unwrap();
        let mut ctx =
            OpKernelContext::new(kernel("Identity", &[DataType::DtFloat]), vec![input.clone()])
                .unwrap();
        assert!(ctx.output(0).is_none());

        ctx.compute().unwrap();
        assert_eq!(ctx.output(0), Some(&input));
        assert_eq!(ctx.expected_output_dtypes(), vec![DataType::DtFloat]);
    }

    #[test]
    fn test_shape_declares_int_output() {
        let input = Tensor::from_array(TensorShape::new(&[2, 3]), &[0.0f32; 6]).unwrap();
        let mut ctx =
            OpKernelContext::new(kernel("Shape", &[DataType::DtFloat]), vec![input]).unwrap();
        ctx.compute().unwrap();

        assert_eq!(ctx.input_dtype(0), DataType::DtFloat);
        assert_eq!(ctx.expected_output_dtype(0), DataType::DtInt32);
        assert_eq!(ctx.output(0).unwrap().as_slice::<i32>(), Some(&[2, 3][..]));
    }

    #[test]
    fn test_shape_int32_rejects_large_dims() {
        let input = Tensor::from_array(TensorShape::new(&[3_000_000_000, 0]), &[] as &[f32]).unwrap();
        let mut ctx =
            OpKernelContext::new(kernel("Shape", &[DataType::DtFloat]), vec![input.clone()]).unwrap();
        assert_eq!(
            ctx.compute().unwrap_err(),
            JitError::ShapeOutputOverflow { index: 0, dim: 3_000_000_000 }
        );
        assert!(ctx.output(0).is_none());

        let def = NodeDefBuilder::new("node", "Shape")
            .input(FakeInput(DataType::DtFloat))
            .attr("out_type", DataType::DtInt64)
            .finalize()
            .unwrap();
        let mut wide = OpKernelContext::new(Arc::new(OpKernel::new(def).unwrap()), vec![input]).unwrap();
        wide.compute().unwrap();
        assert_eq!(wide.output(0).unwrap().as_slice::<i64>(), Some(&[3_000_000_000, 0][..]));
    }

    #[test]
    fn test_context_rejects_wrong_inputs() {
        let k = kernel("Identity", &[DataType::DtFloat]);
        let wrong = Tensor::from_array(TensorShape::scalar(), &[1i32]).unwrap();

        assert!(matches!(
            OpKernelContext::new(k.clone(), vec![]),
            Err(JitError::InputCountMismatch { expected: 1, actual: 0, .. })
        ));
        assert!(matches!(
            OpKernelContext::new(k, vec![wrong]),
            Err(JitError::InputTypeMismatch { index: 0, .. })
        ));
    }

    #[test]
    fn test_placeholder_ops_have_no_kernel() {
        let def = NodeDefBuilder::new("_arg0", "_Arg")
            .attr("T", DataType::DtFloat)
            .attr("index", 0i64)
            .finalize()
            .unwrap();
        assert_eq!(OpKernel::new(def).unwrap_err(), JitError::NoKernel { op: "_Arg".into() });
    }
}
