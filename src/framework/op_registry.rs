// This module provides the op registry: for each registered op type the OpDef lists its
// input and output arguments and its attributes. An argument's dtype is either fixed,
// bound to a type attribute, or bound to a list-of-types attribute (one argument
// expanding into several tensors). OpDef::input_types / output_types resolve those
// bindings against a node's attributes, which is how kernels learn their declared
// output dtypes. The global registry holds the handful of ops the single-op JIT path
// needs: Identity, IdentityN, Shape, NoOp and the _Arg/_Retval placeholders used when
// wrapping an op into a graph.

//! Op definitions and the global registry.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use hashbrown::HashMap;

use crate::core::error::{JitError, JitResult};
use crate::protos::{AttrValue, DataType};

/// Name of the op that feeds a function argument into a graph.
pub const ARG_OP: &str = "_Arg";

/// Name of the op that collects a function result from a graph.
pub const RETVAL_OP: &str = "_Retval";

/// How an argument's dtype is determined.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgType {
    Fixed(DataType),
    TypeAttr(&'static str),
    /// Expands into one tensor per entry of a `list(type)` attribute.
    TypeListAttr(&'static str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArgDef {
    pub name: &'static str,
    pub ty: ArgType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Type,
    TypeList,
    Int,
}

impl AttrKind {
    pub fn name(self) -> &'static str {
        match self {
            AttrKind::Type => "type",
            AttrKind::TypeList => "list",
            AttrKind::Int => "int",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttrDef {
    pub name: &'static str,
    pub kind: AttrKind,
    pub default: Option<AttrValue>,
}

/// Definition of an op type.
#[derive(Debug, Clone, PartialEq)]
pub struct OpDef {
    pub name: &'static str,
    pub inputs: Vec<ArgDef>,
    pub outputs: Vec<ArgDef>,
    pub attrs: Vec<AttrDef>,
    /// Whether a host kernel exists for this op.
    pub has_kernel: bool,
}

impl OpDef {
    pub fn attr(&self, name: &str) -> Option<&AttrDef> {
        self.attrs.iter().find(|attr| attr.name == name)
    }

    /// Declared input dtypes of a node with the given attributes, flattened.
    pub fn input_types(
        &self,
        node: &str,
        attrs: &BTreeMap<String, AttrValue>,
    ) -> JitResult<Vec<DataType>> {
        resolve_arg_types(node, &self.inputs, attrs)
    }

    /// Declared output dtypes of a node with the given attributes, flattened.
    pub fn output_types(
        &self,
        node: &str,
        attrs: &BTreeMap<String, AttrValue>,
    ) -> JitResult<Vec<DataType>> {
        resolve_arg_types(node, &self.outputs, attrs)
    }
}

fn resolve_arg_types(
    node: &str,
    args: &[ArgDef],
    attrs: &BTreeMap<String, AttrValue>,
) -> JitResult<Vec<DataType>> {
    let lookup = |name: &str| {
        attrs.get(name).ok_or_else(|| JitError::MissingAttr {
            node: node.to_string(),
            attr: name.to_string(),
        })
    };
    let kind_error = |name: &str, value: &AttrValue, expected: AttrKind| JitError::AttrKind {
        node: node.to_string(),
        attr: name.to_string(),
        expected: expected.name(),
        actual: value.kind(),
    };

    let mut types = Vec::new();
    for arg in args {
        match arg.ty {
            ArgType::Fixed(dtype) => types.push(dtype),
            ArgType::TypeAttr(name) => {
                let value = lookup(name)?;
                let dtype = value
                    .as_type()
                    .ok_or_else(|| kind_error(name, value, AttrKind::Type))?;
                types.push(dtype);
            }
            ArgType::TypeListAttr(name) => {
                let value = lookup(name)?;
                let dtypes = value
                    .as_type_list()
                    .ok_or_else(|| kind_error(name, value, AttrKind::TypeList))?;
                types.extend(dtypes);
            }
        }
    }
    Ok(types)
}

/// Registry of op definitions keyed by op type.
#[derive(Debug, Default)]
pub struct OpRegistry {
    ops: HashMap<&'static str, OpDef>,
}

impl OpRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the ops used by the single-op JIT path.
    pub fn global() -> &'static OpRegistry {
        static GLOBAL: OnceLock<OpRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let mut registry = OpRegistry::new();
            for op in builtin_ops() {
                registry.register(op);
            }
            registry
        })
    }

    pub fn register(&mut self, op: OpDef) {
        log::trace!("Registering op {}", op.name);
        self.ops.insert(op.name, op);
    }

    pub fn lookup(&self, op: &str) -> JitResult<&OpDef> {
        self.ops
            .get(op)
            .ok_or_else(|| JitError::OpNotRegistered { op: op.to_string() })
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

fn type_attr(name: &'static str) -> AttrDef {
    AttrDef { name, kind: AttrKind::Type, default: None }
}

fn builtin_ops() -> Vec<OpDef> {
    vec![
        OpDef {
            name: "Identity",
            inputs: vec![ArgDef { name: "input", ty: ArgType::TypeAttr("T") }],
            outputs: vec![ArgDef { name: "output", ty: ArgType::TypeAttr("T") }],
            attrs: vec![type_attr("T")],
            has_kernel: true,
        },
        OpDef {
            name: "IdentityN",
            inputs: vec![ArgDef { name: "input", ty: ArgType::TypeListAttr("T") }],
            outputs: vec![ArgDef { name: "output", ty: ArgType::TypeListAttr("T") }],
            attrs: vec![AttrDef { name: "T", kind: AttrKind::TypeList, default: None }],
            has_kernel: true,
        },
        OpDef {
            name: "Shape",
            inputs: vec![ArgDef { name: "input", ty: ArgType::TypeAttr("T") }],
            outputs: vec![ArgDef { name: "output", ty: ArgType::TypeAttr("out_type") }],
            attrs: vec![
                type_attr("T"),
                AttrDef {
                    name: "out_type",
                    kind: AttrKind::Type,
                    default: Some(DataType::DtInt32.into()),
                },
            ],
            has_kernel: true,
        },
        OpDef {
            name: "NoOp",
            inputs: Vec::new(),
            outputs: Vec::new(),
            attrs: Vec::new(),
            has_kernel: true,
        },
        OpDef {
            name: ARG_OP,
            inputs: Vec::new(),
            outputs: vec![ArgDef { name: "output", ty: ArgType::TypeAttr("T") }],
            attrs: vec![type_attr("T"), AttrDef { name: "index", kind: AttrKind::Int, default: None }],
            has_kernel: false,
        },
        OpDef {
            name: RETVAL_OP,
            inputs: vec![ArgDef { name: "input", ty: ArgType::TypeAttr("T") }],
            outputs: Vec::new(),
            attrs: vec![type_attr("T"), AttrDef { name: "index", kind: AttrKind::Int, default: None }],
            has_kernel: false,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_registry_lookup() {
        let registry = OpRegistry::global();
        assert!(registry.lookup("Identity").is_ok());
        assert!(registry.lookup(ARG_OP).is_ok());
        assert_eq!(
            registry.lookup("MatMul").unwrap_err(),
            JitError::OpNotRegistered { op: "MatMul".into() }
        );
    }

    #[test]
    fn test_output_types_follow_attrs() {
        let shape = OpRegistry::global().lookup("Shape").unwrap();
        let mut attrs = BTreeMap::new();
        attrs.insert("T".to_string(), AttrValue::from(DataType::DtFloat));
        attrs.insert("out_type".to_string(), AttrValue::from(DataType::DtInt64));

        assert_eq!(shape.input_types("s", &attrs).unwrap(), vec![DataType::DtFloat]);
        assert_eq!(shape.output_types("s", &attrs).unwrap(), vec![DataType::DtInt64]);
    }

    #[test]
    fn test_type_list_expands() {
        let identity_n = OpRegistry::global().lookup("IdentityN").unwrap();
        let mut attrs = BTreeMap::new();
        attrs.insert(
            "T".to_string(),
            AttrValue::from(vec![DataType::DtInt32, DataType::DtFloat]),
        );

        assert_eq!(
            identity_n.output_types("n", &attrs).unwrap(),
            vec![DataType::DtInt32, DataType::DtFloat]
        );
    }

    #[test]
    fn test_missing_and_mistyped_attrs() {
        let identity = OpRegistry::global().lookup("Identity").unwrap();
        let mut attrs = BTreeMap::new();
        assert_eq!(
            identity.output_types("id", &attrs).unwrap_err(),
            JitError::MissingAttr { node: "id".into(), attr: "T".into() }
        );

        attrs.insert("T".to_string(), AttrValue::from(1i64));
        assert_eq!(
            identity.output_types("id", &attrs).unwrap_err(),
            JitError::AttrKind {
                node: "id".into(),
                attr: "T".into(),
                expected: "type",
                actual: "int",
            }
        );
    }

    #[test]
    fn test_local_registry() {
        let mut registry = OpRegistry::new();
        assert!(registry.is_empty());
        registry.register(OpDef {
            name: "Custom",
            inputs: Vec::new(),
            outputs: vec![ArgDef { name: "out", ty: ArgType::Fixed(DataType::DtBool) }],
            attrs: Vec::new(),
            has_kernel: false,
        });
        assert_eq!(registry.len(), 1);
        let op = registry.lookup("Custom").unwrap();
        assert_eq!(op.output_types("c", &BTreeMap::new()).unwrap(), vec![DataType::DtBool]);
    }
}
