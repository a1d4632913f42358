// This module provides NodeDefBuilder, the checked way to produce a NodeDef for a
// registered op. Inputs are added one tensor at a time, either as FakeInput (a
// placeholder producer of a given dtype, for tests and single-op execution) or as an
// explicit node:output reference. On finalize the builder looks the op up in the
// registry, checks the input count, derives type attributes from the input dtypes
// (rejecting explicitly set attributes that disagree), fills attribute defaults and
// fails on required attributes that are still missing. Control inputs are appended
// after all data inputs using the ^node convention.

//! Checked construction of node defs.

use std::collections::BTreeMap;

use crate::core::error::{JitError, JitResult};
use crate::framework::op_registry::{ArgType, OpDef, OpRegistry};
use crate::protos::{AttrValue, DataType, NodeDef};

/// Placeholder producer for one input of the given dtype.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FakeInput(pub DataType);

/// Builds a [`NodeDef`] and validates it against the op registry.
///
/// ```ignore
/// let node_def = NodeDefBuilder::new("identity_op", "Identity")
///     .input(FakeInput(DataType::DtFloat))
///     .attr("T", DataType::DtFloat)
///     .finalize()?;
/// ```
#[derive(Debug, Clone)]
pub struct NodeDefBuilder {
    name: String,
    op: String,
    device: String,
    inputs: Vec<(String, DataType)>,
    control_inputs: Vec<String>,
    attrs: BTreeMap<String, AttrValue>,
}

impl NodeDefBuilder {
    pub fn new(name: impl Into<String>, op: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            op: op.into(),
            device: String::new(),
            inputs: Vec::new(),
            control_inputs: Vec::new(),
            attrs: BTreeMap::new(),
        }
    }

    /// Add a placeholder input. Fake inputs are named `a`, `a:1`, `a:2`, ...
    pub fn input(self, fake: FakeInput) -> Self {
        let index = self.inputs.len();
        self.input_from("a", index, fake.0)
    }

    /// Add output `output` of `node` as the next input.
    pub fn input_from(mut self, node: &str, output: usize, dtype: DataType) -> Self {
        let name = if output == 0 {
            node.to_string()
        } else {
            format!("{node}:{output}")
        };
        self.inputs.push((name, dtype));
        self
    }

    pub fn control_input(mut self, node: &str) -> Self {
        self.control_inputs.push(format!("^{node}"));
        self
    }

    pub fn attr(mut self, name: &str, value: impl Into<AttrValue>) -> Self {
        self.attrs.insert(name.to_string(), value.into());
        self
    }

    pub fn device(mut self, device: &str) -> Self {
        self.device = device.to_string();
        self
    }

    /// Validate against the global registry and produce the node def.
    pub fn finalize(self) -> JitResult<NodeDef> {
        self.finalize_in(OpRegistry::global())
    }

    pub fn finalize_in(mut self, registry: &OpRegistry) -> JitResult<NodeDef> {
        let op_def = registry.lookup(&self.op)?;
        self.bind_input_types(op_def)?;

        for attr_def in &op_def.attrs {
            if self.attrs.contains_key(attr_def.name) {
                continue;
            }
            match &attr_def.default {
                Some(default) => {
                    self.attrs.insert(attr_def.name.to_string(), default.clone());
                }
                None => {
                    return Err(JitError::MissingAttr {
                        node: self.name,
                        attr: attr_def.name.to_string(),
                    })
                }
            }
        }

        let mut input: Vec<String> = self.inputs.into_iter().map(|(name, _)| name).collect();
        input.extend(self.control_inputs);

        log::debug!("Finalized NodeDef {} ({}) with {} inputs", self.name, self.op, input.len());
        Ok(NodeDef {
            name: self.name,
            op: self.op,
            input,
            device: self.device,
            attr: self.attrs,
        })
    }

    /// Match input dtypes against the op's input args, recording type attrs.
    ///
    /// At most one `list(type)` input argument is supported; it takes every input
    /// not claimed by a single-tensor argument.
    fn bind_input_types(&mut self, op_def: &OpDef) -> JitResult<()> {
        let singles = op_def
            .inputs
            .iter()
            .filter(|arg| !matches!(arg.ty, ArgType::TypeListAttr(_)))
            .count();
        let has_list = singles < op_def.inputs.len();
        let total = self.inputs.len();
        if total < singles || (!has_list && total != singles) {
            return Err(JitError::InputCountMismatch {
                node: self.name.clone(),
                op: self.op.clone(),
                expected: singles,
                actual: total,
            });
        }

        let dtypes: Vec<DataType> = self.inputs.iter().map(|(_, dtype)| *dtype).collect();
        let mut next = 0;
        for arg in &op_def.inputs {
            match arg.ty {
                ArgType::Fixed(expected) => {
                    if dtypes[next] != expected {
                        return Err(JitError::InputTypeMismatch {
                            node: self.name.clone(),
                            index: next,
                            expected,
                            actual: dtypes[next],
                        });
                    }
                    next += 1;
                }
                ArgType::TypeAttr(attr) => {
                    self.unify_type_attr(attr, dtypes[next])?;
                    next += 1;
                }
                ArgType::TypeListAttr(attr) => {
                    let len = total - singles;
                    self.unify_type_list_attr(attr, &dtypes[next..next + len])?;
                    next += len;
                }
            }
        }
        Ok(())
    }

    fn unify_type_attr(&mut self, attr: &str, dtype: DataType) -> JitResult<()> {
        match self.attrs.get(attr).map(AttrValue::as_type) {
            None => {
                self.attrs.insert(attr.to_string(), dtype.into());
                Ok(())
            }
            Some(Some(existing)) if existing == dtype => Ok(()),
            Some(Some(existing)) => Err(JitError::InconsistentAttr {
                node: self.name.clone(),
                attr: attr.to_string(),
                first: existing,
                second: dtype,
            }),
            Some(None) => Err(self.attr_kind_error(attr, "type")),
        }
    }

    fn unify_type_list_attr(&mut self, attr: &str, dtypes: &[DataType]) -> JitResult<()> {
        match self.attrs.get(attr).map(AttrValue::as_type_list) {
            None => {
                self.attrs.insert(attr.to_string(), dtypes.to_vec().into());
                Ok(())
            }
            Some(Some(existing)) => {
                if let Some((&first, &second)) = existing
                    .iter()
                    .zip(dtypes)
                    .find(|(first, second)| first != second)
                {
                    return Err(JitError::InconsistentAttr {
                        node: self.name.clone(),
                        attr: attr.to_string(),
                        first,
                        second,
                    });
                }
                if existing.len() != dtypes.len() {
                    return Err(JitError::InputCountMismatch {
                        node: self.name.clone(),
                        op: self.op.clone(),
                        expected: existing.len(),
                        actual: dtypes.len(),
                    });
                }
                Ok(())
            }
            Some(None) => Err(self.attr_kind_error(attr, "list")),
        }
    }

    fn attr_kind_error(&self, attr: &str, expected: &'static str) -> JitError {
        JitError::AttrKind {
            node: self.name.clone(),
            attr: attr.to_string(),
            expected,
            actual: self.attrs.get(attr).map_or("unset", AttrValue::kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_node_def() {
        let node_def = NodeDefBuilder::new("identity_op", "Identity")
            .input(FakeInput(DataType::DtFloat))
            .attr("T", DataType::DtFloat)
            .finalize()
            .unwrap();

        assert_eq!(node_def.name, "identity_op");
        assert_eq!(node_def.op, "Identity");
        assert_eq!(node_def.input, vec!["a".to_string()]);
        assert_eq!(node_def.attr["T"].as_type(), Some(DataType::DtFloat));
    }

    #[test]
    fn test_type_attr_inferred_from_input() {
        let node_def = NodeDefBuilder::new("id", "Identity")
            .input(FakeInput(DataType::DtInt64))
            .finalize()
            .unwrap();
        assert_eq!(node_def.attr["T"].as_type(), Some(DataType::DtInt64));
    }

    #[test]
    fn test_inconsistent_type_attr() {
        let err = NodeDefBuilder::new("id", "Identity")
            .input(FakeInput(DataType::DtFloat))
            .attr("T", DataType::DtInt32)
            .finalize()
            .unwrap_err();
        assert_eq!(
            err,
            JitError::InconsistentAttr {
                node: "id".into(),
                attr: "T".into(),
                first: DataType::DtInt32,
                second: DataType::DtFloat,
            }
        );
    }

    #[test]
    fn test_defaults_filled() {
        let node_def = NodeDefBuilder::new("shape", "Shape")
            .input(FakeInput(DataType::DtFloat))
            .finalize()
            .unwrap();
        assert_eq!(node_def.attr["out_type"].as_type(), Some(DataType::DtInt32));
    }

    #[test]
    fn test_missing_required_attr() {
        let err = NodeDefBuilder::new("arg", "_Arg")
            .attr("T", DataType::DtFloat)
            .finalize()
            .unwrap_err();
        assert_eq!(err, JitError::MissingAttr { node: "arg".into(), attr: "index".into() });
    }

    #[test]
    fn test_input_count_mismatch() {
        let err = NodeDefBuilder::new("id", "Identity").finalize().unwrap_err();
        assert!(matches!(err, JitError::InputCountMismatch { expected: 1, actual: 0, .. }));

        let err = NodeDefBuilder::new("noop", "NoOp")
            .input(FakeInput(DataType::DtFloat))
            .finalize()
            .unwrap_err();
        assert!(matches!(err, JitError::InputCountMismatch { expected: 0, actual: 1, .. }));
    }

    #[test]
    fn test_list_inputs_and_control_inputs() {
        let node_def = NodeDefBuilder::new("idn", "IdentityN")
            .input(FakeInput(DataType::DtInt32))
            .input(FakeInput(DataType::DtBool))
            .control_input("init")
            .device("/device:CPU:0")
            .finalize()
            .unwrap();

        assert_eq!(node_def.input, vec!["a", "a:1", "^init"]);
        assert_eq!(node_def.device, "/device:CPU:0");
        assert_eq!(
            node_def.attr["T"].as_type_list(),
            Some(vec![DataType::DtInt32, DataType::DtBool])
        );
    }

    #[test]
    fn test_unregistered_op() {
        let err = NodeDefBuilder::new("x", "NotAnOp").finalize().unwrap_err();
        assert_eq!(err, JitError::OpNotRegistered { op: "NotAnOp".into() });
    }
}
