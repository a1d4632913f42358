// This module holds the value types exchanged with the ahead-of-time XLA compiler:
// CompilerOptions (compiler-wide settings including the device ordinal and the
// alias/logging flags), CompilationResult (what a previous compilation produced, most
// importantly the output shape), XlaArgument (one compiled-graph input) and
// CompilationArgument (the per-op argument used when a single op is compiled on its
// own). DeviceType names a device class such as CPU or GPU. The types are plain values
// with public fields; the compile utilities only read from them.

//! Compiler-facing value types.

use std::fmt;

use crate::framework::types::TensorShape;
use crate::protos::{ConfigProto, DataType, NodeDef, Shape};

/// Device ordinal value meaning "not chosen".
pub const UNSET_DEVICE_ORDINAL: i32 = -1;

/// Device class, e.g. `CPU` or `GPU`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct DeviceType(String);

impl DeviceType {
    pub fn new(type_string: impl Into<String>) -> Self {
        Self(type_string.into())
    }

    pub fn type_string(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DeviceType {
    fn from(type_string: &str) -> Self {
        Self::new(type_string)
    }
}

impl fmt::Display for DeviceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compiler configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct CompilerOptions {
    /// Device to compile for, or [`UNSET_DEVICE_ORDINAL`].
    pub device_ordinal: i32,

    /// Alias input and output buffers of parameters passed through unchanged.
    pub alias_passthrough_params: bool,

    /// Detailed logging and dumping of the compiled module.
    pub detailed_logging: bool,

    /// Ask the backend for deterministic kernels.
    pub op_determinism_required: bool,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            device_ordinal: UNSET_DEVICE_ORDINAL,
            alias_passthrough_params: false,
            detailed_logging: true,
            op_determinism_required: false,
        }
    }
}

/// Collective operations found during compilation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CollectiveInfo {
    pub group_key: i32,
    pub group_size: i32,
    pub next_id: i32,
}

/// Output of a compilation.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilationResult {
    /// Shape of the computation's result, including its layout.
    pub xla_output_shape: Shape,

    pub collective_info: Option<CollectiveInfo>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ArgumentKind {
    #[default]
    Invalid,
    Resource,
    Parameter,
}

/// One input of a graph being compiled.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct XlaArgument {
    pub kind: ArgumentKind,
    pub dtype: DataType,
    pub shape: TensorShape,
}

impl XlaArgument {
    pub fn parameter(dtype: DataType, shape: TensorShape) -> Self {
        Self { kind: ArgumentKind::Parameter, dtype, shape }
    }

    pub fn resource(dtype: DataType, shape: TensorShape) -> Self {
        Self { kind: ArgumentKind::Resource, dtype, shape }
    }

    /// Dtype this argument has when fed into a graph.
    pub fn graph_type(&self) -> DataType {
        match self.kind {
            ArgumentKind::Resource => DataType::DtResource,
            _ => self.dtype,
        }
    }
}

/// Argument for compiling one op on its own rather than a whole graph.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompilationArgument {
    /// Declared output dtypes of the op, in declaration order.
    pub output_dtypes: Vec<DataType>,

    pub node_def: NodeDef,

    pub config_proto: ConfigProto,
}
