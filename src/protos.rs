// This module holds the protocol-buffer shaped values exchanged between the JIT and the
// XLA compiler: TensorFlow's DataType, AttrValue, NodeDef and ConfigProto on the graph
// side, and XLA's PrimitiveType, Shape, Layout, DebugOptions and ExecutableBuildOptions
// on the compiler side. All of them derive prost::Message so that equality checks can be
// done on the encoded bytes, the way TensorFlow compares SerializeAsString() output.
// Attribute maps use BTreeMap so that the encoding of a message is deterministic.
// Only the fields this crate reads or writes are modelled; tags match the upstream
// .proto files so the encodings line up with what TensorFlow and XLA produce.

//! Protocol-buffer messages shared with TensorFlow and XLA.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use prost::{Enumeration, Message};

use crate::core::error::JitError;

/// Element type of a TensorFlow tensor.
///
/// This type corresponds to `DataType` in `tensorflow/core/framework/types.proto`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum DataType {
    DtInvalid = 0,
    DtFloat = 1,
    DtDouble = 2,
    DtInt32 = 3,
    DtUint8 = 4,
    DtInt16 = 5,
    DtInt8 = 6,
    DtString = 7,
    DtComplex64 = 8,
    DtInt64 = 9,
    DtBool = 10,
    DtBfloat16 = 14,
    DtHalf = 19,
    DtResource = 20,
    DtVariant = 21,
    DtUint32 = 22,
    DtUint64 = 23,
}

impl DataType {
    /// Name used by TensorFlow when printing types (`DataTypeString`).
    pub fn name(self) -> &'static str {
        match self {
            DataType::DtInvalid => "INVALID",
            DataType::DtFloat => "float",
            DataType::DtDouble => "double",
            DataType::DtInt32 => "int32",
            DataType::DtUint8 => "uint8",
            DataType::DtInt16 => "int16",
            DataType::DtInt8 => "int8",
            DataType::DtString => "string",
            DataType::DtComplex64 => "complex64",
            DataType::DtInt64 => "int64",
            DataType::DtBool => "bool",
            DataType::DtBfloat16 => "bfloat16",
            DataType::DtHalf => "half",
            DataType::DtResource => "resource",
            DataType::DtVariant => "variant",
            DataType::DtUint32 => "uint32",
            DataType::DtUint64 => "uint64",
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// List payload of an [`AttrValue`].
#[derive(Clone, PartialEq, Message)]
pub struct ListValue {
    #[prost(int64, repeated, tag = "3")]
    pub i: Vec<i64>,

    #[prost(enumeration = "DataType", repeated, tag = "6")]
    pub dtypes: Vec<i32>,
}

/// Value of a node attribute.
///
/// This type corresponds to `AttrValue` in `tensorflow/core/framework/attr_value.proto`.
#[derive(Clone, PartialEq, Message)]
pub struct AttrValue {
    #[prost(oneof = "attr_value::Value", tags = "1, 2, 3, 4, 5, 6")]
    pub value: Option<attr_value::Value>,
}

pub mod attr_value {
    use prost::Oneof;

    #[derive(Clone, PartialEq, Oneof)]
    pub enum Value {
        #[prost(message, tag = "1")]
        List(super::ListValue),

        #[prost(bytes = "vec", tag = "2")]
        S(Vec<u8>),

        #[prost(int64, tag = "3")]
        I(i64),

        #[prost(float, tag = "4")]
        F(f32),

        #[prost(bool, tag = "5")]
        B(bool),

        #[prost(enumeration = "super::DataType", tag = "6")]
        Type(i32),
    }
}

impl AttrValue {
    /// Returns the contained type, if this attribute holds a single type.
    pub fn as_type(&self) -> Option<DataType> {
        match self.value {
            Some(attr_value::Value::Type(raw)) => DataType::try_from(raw).ok(),
            _ => None,
        }
    }

    /// Returns the contained types, if this attribute holds a list of types.
    pub fn as_type_list(&self) -> Option<Vec<DataType>> {
        match &self.value {
            Some(attr_value::Value::List(list)) => list
                .dtypes
                .iter()
                .map(|&raw| DataType::try_from(raw).ok())
                .collect(),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.value {
            Some(attr_value::Value::I(value)) => Some(value),
            _ => None,
        }
    }

    /// Short description of the payload kind, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self.value {
            None => "unset",
            Some(attr_value::Value::List(_)) => "list",
            Some(attr_value::Value::S(_)) => "string",
            Some(attr_value::Value::I(_)) => "int",
            Some(attr_value::Value::F(_)) => "float",
            Some(attr_value::Value::B(_)) => "bool",
            Some(attr_value::Value::Type(_)) => "type",
        }
    }
}

impl From<DataType> for AttrValue {
    fn from(dtype: DataType) -> Self {
        Self { value: Some(attr_value::Value::Type(dtype as i32)) }
    }
}

impl From<Vec<DataType>> for AttrValue {
    fn from(dtypes: Vec<DataType>) -> Self {
        let list = ListValue {
            i: Vec::new(),
            dtypes: dtypes.into_iter().map(|dt| dt as i32).collect(),
        };
        Self { value: Some(attr_value::Value::List(list)) }
    }
}

impl From<i64> for AttrValue {
    fn from(value: i64) -> Self {
        Self { value: Some(attr_value::Value::I(value)) }
    }
}

impl From<bool> for AttrValue {
    fn from(value: bool) -> Self {
        Self { value: Some(attr_value::Value::B(value)) }
    }
}

impl From<f32> for AttrValue {
    fn from(value: f32) -> Self {
        Self { value: Some(attr_value::Value::F(value)) }
    }
}

impl From<&str> for AttrValue {
    fn from(value: &str) -> Self {
        Self { value: Some(attr_value::Value::S(value.as_bytes().to_vec())) }
    }
}

/// Serializable description of a single graph node.
///
/// This type corresponds to `NodeDef` in `tensorflow/core/framework/node_def.proto`.
#[derive(Clone, PartialEq, Message)]
pub struct NodeDef {
    #[prost(string, tag = "1")]
    pub name: String,

    #[prost(string, tag = "2")]
    pub op: String,

    /// Data inputs as `node:output` (`:0` omitted) followed by `^node` control inputs.
    #[prost(string, repeated, tag = "3")]
    pub input: Vec<String>,

    #[prost(string, tag = "4")]
    pub device: String,

    #[prost(btree_map = "string, message", tag = "5")]
    pub attr: BTreeMap<String, AttrValue>,
}

/// Session configuration.
///
/// This type corresponds to a subset of `ConfigProto` in
/// `tensorflow/core/protobuf/config.proto`. A default value encodes to zero bytes.
#[derive(Clone, PartialEq, Message)]
pub struct ConfigProto {
    #[prost(btree_map = "string, int32", tag = "1")]
    pub device_count: BTreeMap<String, i32>,

    #[prost(int32, tag = "2")]
    pub intra_op_parallelism_threads: i32,

    #[prost(int32, tag = "5")]
    pub inter_op_parallelism_threads: i32,

    #[prost(bool, tag = "7")]
    pub allow_soft_placement: bool,

    #[prost(bool, tag = "8")]
    pub log_device_placement: bool,

    #[prost(int64, tag = "11")]
    pub operation_timeout_in_ms: i64,
}

/// Element type of an XLA array.
///
/// This type corresponds to `PrimitiveType` in `xla/xla_data.proto`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Enumeration)]
#[repr(i32)]
pub enum PrimitiveType {
    PrimitiveTypeInvalid = 0,
    Pred = 1,
    S8 = 2,
    S16 = 3,
    S32 = 4,
    S64 = 5,
    U8 = 6,
    U16 = 7,
    U32 = 8,
    U64 = 9,
    F16 = 10,
    F32 = 11,
    F64 = 12,
    Tuple = 13,
    OpaqueType = 14,
    C64 = 15,
    Bf16 = 16,
    Token = 17,
    C128 = 18,
}

impl PrimitiveType {
    /// Lowercase name as printed in XLA shape strings.
    pub fn lowercase_name(self) -> &'static str {
        match self {
            PrimitiveType::PrimitiveTypeInvalid => "invalid",
            PrimitiveType::Pred => "pred",
            PrimitiveType::S8 => "s8",
            PrimitiveType::S16 => "s16",
            PrimitiveType::S32 => "s32",
            PrimitiveType::S64 => "s64",
            PrimitiveType::U8 => "u8",
            PrimitiveType::U16 => "u16",
            PrimitiveType::U32 => "u32",
            PrimitiveType::U64 => "u64",
            PrimitiveType::F16 => "f16",
            PrimitiveType::F32 => "f32",
            PrimitiveType::F64 => "f64",
            PrimitiveType::Tuple => "tuple",
            PrimitiveType::OpaqueType => "opaque",
            PrimitiveType::C64 => "c64",
            PrimitiveType::Bf16 => "bf16",
            PrimitiveType::Token => "token",
            PrimitiveType::C128 => "c128",
        }
    }
}

impl FromStr for PrimitiveType {
    type Err = JitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        const ALL: [PrimitiveType; 18] = [
            PrimitiveType::Pred,
            PrimitiveType::S8,
            PrimitiveType::S16,
            PrimitiveType::S32,
            PrimitiveType::S64,
            PrimitiveType::U8,
            PrimitiveType::U16,
            PrimitiveType::U32,
            PrimitiveType::U64,
            PrimitiveType::F16,
            PrimitiveType::F32,
            PrimitiveType::F64,
            PrimitiveType::Tuple,
            PrimitiveType::OpaqueType,
            PrimitiveType::C64,
            PrimitiveType::Bf16,
            PrimitiveType::Token,
            PrimitiveType::C128,
        ];
        ALL.into_iter()
            .find(|ty| ty.lowercase_name() == s)
            .ok_or_else(|| JitError::UnknownPrimitiveType { name: s.to_string() })
    }
}

/// Physical layout of an XLA array.
///
/// This type corresponds to `LayoutProto` in `xla/xla_data.proto`.
#[derive(Clone, PartialEq, Eq, Hash, Message)]
pub struct Layout {
    /// Dimension numbers ordered from most minor to most major.
    #[prost(int64, repeated, tag = "1")]
    pub minor_to_major: Vec<i64>,
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        write_joined(f, &self.minor_to_major)?;
        f.write_str("}")
    }
}

/// Shape of an XLA value: an array with an element type and dimensions, or a tuple.
///
/// This type corresponds to `ShapeProto` in `xla/xla_data.proto`. The default value
/// is the invalid shape, which is what a freshly constructed `xla::Shape` holds.
#[derive(Clone, PartialEq, Message)]
pub struct Shape {
    #[prost(enumeration = "PrimitiveType", tag = "2")]
    pub element_type: i32,

    #[prost(int64, repeated, tag = "3")]
    pub dimensions: Vec<i64>,

    #[prost(message, repeated, tag = "4")]
    pub tuple_shapes: Vec<Shape>,

    #[prost(message, optional, tag = "5")]
    pub layout: Option<Layout>,

    #[prost(bool, repeated, tag = "6")]
    pub is_dynamic_dimension: Vec<bool>,
}

impl Shape {
    /// Array shape with the default descending (row-major) layout.
    pub fn array(element_type: PrimitiveType, dimensions: &[i64]) -> Self {
        let rank = dimensions.len() as i64;
        Self {
            element_type: element_type as i32,
            dimensions: dimensions.to_vec(),
            tuple_shapes: Vec::new(),
            layout: Some(Layout { minor_to_major: (0..rank).rev().collect() }),
            is_dynamic_dimension: vec![false; dimensions.len()],
        }
    }

    pub fn scalar(element_type: PrimitiveType) -> Self {
        Self::array(element_type, &[])
    }

    pub fn tuple(elements: Vec<Shape>) -> Self {
        Self {
            element_type: PrimitiveType::Tuple as i32,
            tuple_shapes: elements,
            ..Self::default()
        }
    }

    pub fn is_tuple(&self) -> bool {
        self.element_type() == PrimitiveType::Tuple
    }

    pub fn rank(&self) -> usize {
        self.dimensions.len()
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_tuple() {
            f.write_str("(")?;
            for (i, element) in self.tuple_shapes.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{element}")?;
            }
            return f.write_str(")");
        }

        write!(f, "{}[", self.element_type().lowercase_name())?;
        write_joined(f, &self.dimensions)?;
        f.write_str("]")?;
        match &self.layout {
            Some(layout) if self.rank() > 0 => write!(f, "{layout}"),
            _ => Ok(()),
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, values: &[i64]) -> fmt::Result {
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{value}")?;
    }
    Ok(())
}

/// Compiler debug flags.
///
/// This type corresponds to a subset of `DebugOptions` in `xla/xla.proto`.
#[derive(Clone, PartialEq, Message)]
pub struct DebugOptions {
    #[prost(string, tag = "109")]
    pub xla_dump_to: String,

    #[prost(bool, tag = "148")]
    pub xla_gpu_deterministic_ops: bool,

    /// Enables detailed logging and dumping of the compiled module.
    #[prost(bool, tag = "252")]
    pub xla_detailed_logging_and_dumping: bool,
}

/// Serialized form of [`ExecutableBuildOptions`](crate::jit::ExecutableBuildOptions).
///
/// This type corresponds to a subset of `ExecutableBuildOptionsProto` in
/// `xla/pjrt/compile_options.proto`.
#[derive(Clone, PartialEq, Message)]
pub struct ExecutableBuildOptionsProto {
    #[prost(int64, tag = "1")]
    pub device_ordinal: i64,

    #[prost(message, optional, tag = "2")]
    pub result_layout: Option<Shape>,

    #[prost(message, optional, tag = "3")]
    pub debug_options: Option<DebugOptions>,

    #[prost(int64, tag = "4")]
    pub num_replicas: i64,

    #[prost(int64, tag = "5")]
    pub num_partitions: i64,

    #[prost(bool, tag = "10")]
    pub alias_passthrough_params: bool,

    #[prost(bool, tag = "11")]
    pub run_backend_only: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_empty() {
        assert_eq!(ConfigProto::default().encoded_len(), 0);

        let config = ConfigProto { allow_soft_placement: true, ..Default::default() };
        assert!(config.encoded_len() > 0);
    }

    #[test]
    fn test_attr_value_accessors() {
        assert_eq!(AttrValue::from(DataType::DtFloat).as_type(), Some(DataType::DtFloat));
        assert_eq!(AttrValue::from(3i64).as_int(), Some(3));
        assert_eq!(AttrValue::from(3i64).as_type(), None);
        assert_eq!(
            AttrValue::from(vec![DataType::DtInt32, DataType::DtBool]).as_type_list(),
            Some(vec![DataType::DtInt32, DataType::DtBool])
        );
        assert_eq!(AttrValue::from(true).kind(), "bool");
    }

    #[test]
    fn test_node_def_encoding_is_deterministic() {
        let mut a = NodeDef { name: "n".into(), op: "Identity".into(), ..Default::default() };
        a.attr.insert("T".into(), DataType::DtFloat.into());
        a.attr.insert("U".into(), DataType::DtInt32.into());

        let mut b = NodeDef { name: "n".into(), op: "Identity".into(), ..Default::default() };
        b.attr.insert("U".into(), DataType::DtInt32.into());
        b.attr.insert("T".into(), DataType::DtFloat.into());

        assert_eq!(a.encode_to_vec(), b.encode_to_vec());
    }

    #[test]
    fn test_shape_display() {
        assert_eq!(Shape::array(PrimitiveType::F32, &[1, 2]).to_string(), "f32[1,2]{1,0}");
        assert_eq!(Shape::scalar(PrimitiveType::S32).to_string(), "s32[]");
        assert_eq!(Shape::default().to_string(), "invalid[]");

        let tuple = Shape::tuple(vec![
            Shape::array(PrimitiveType::F32, &[3]),
            Shape::scalar(PrimitiveType::Pred),
        ]);
        assert_eq!(tuple.to_string(), "(f32[3]{0}, pred[])");
    }

    #[test]
    fn test_primitive_type_from_str() {
        assert_eq!("f32".parse::<PrimitiveType>().unwrap(), PrimitiveType::F32);
        assert_eq!("bf16".parse::<PrimitiveType>().unwrap(), PrimitiveType::Bf16);
        assert!("float".parse::<PrimitiveType>().is_err());
    }
}
