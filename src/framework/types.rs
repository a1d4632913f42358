// This module provides the minimal tensor representation the op-execution framework
// needs: TensorShape (dimension sizes), TensorData (a typed buffer per supported element
// type) and Tensor (shape plus data). TensorElement ties Rust scalar types to their
// TensorFlow DataType so that tests can build inputs from plain arrays and read outputs
// back as slices. Construction checks that the element count matches the shape and
// rejects negative dimensions or counts that overflow.

//! Tensors bound to op kernels.

use crate::core::error::{JitError, JitResult};
use crate::protos::DataType;

/// Dimension sizes of a tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct TensorShape {
    dims: Vec<i64>,
}

impl TensorShape {
    pub fn new(dims: &[i64]) -> Self {
        Self { dims: dims.to_vec() }
    }

    pub fn scalar() -> Self {
        Self::default()
    }

    pub fn dims(&self) -> &[i64] {
        &self.dims
    }

    pub fn rank(&self) -> usize {
        self.dims.len()
    }

    /// Element count, or `None` if a dimension is negative or the count overflows.
    pub fn num_elements(&self) -> Option<usize> {
        self.dims.iter().try_fold(1usize, |count, &dim| {
            usize::try_from(dim).ok().and_then(|dim| count.checked_mul(dim))
        })
    }
}

/// Typed element buffer.
#[derive(Debug, Clone, PartialEq)]
pub enum TensorData {
    Float(Vec<f32>),
    Double(Vec<f64>),
    Int32(Vec<i32>),
    Int64(Vec<i64>),
    Bool(Vec<bool>),
}

impl TensorData {
    pub fn dtype(&self) -> DataType {
        match self {
            TensorData::Float(_) => DataType::DtFloat,
            TensorData::Double(_) => DataType::DtDouble,
            TensorData::Int32(_) => DataType::DtInt32,
            TensorData::Int64(_) => DataType::DtInt64,
            TensorData::Bool(_) => DataType::DtBool,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TensorData::Float(v) => v.len(),
            TensorData::Double(v) => v.len(),
            TensorData::Int32(v) => v.len(),
            TensorData::Int64(v) => v.len(),
            TensorData::Bool(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Rust scalar type that can back a [`Tensor`].
pub trait TensorElement: Copy + Sized {
    const DTYPE: DataType;

    fn into_data(values: Vec<Self>) -> TensorData;

    fn view(data: &TensorData) -> Option<&[Self]>;
}

macro_rules! tensor_element {
    ($ty:ty, $variant:ident, $dtype:expr) => {
        impl TensorElement for $ty {
            const DTYPE: DataType = $dtype;

            fn into_data(values: Vec<Self>) -> TensorData {
                TensorData::$variant(values)
            }

            fn view(data: &TensorData) -> Option<&[Self]> {
                match data {
                    TensorData::$variant(values) => Some(values),
                    _ => None,
                }
            }
        }
    };
}

tensor_element!(f32, Float, DataType::DtFloat);
tensor_element!(f64, Double, DataType::DtDouble);
tensor_element!(i32, Int32, DataType::DtInt32);
tensor_element!(i64, Int64, DataType::DtInt64);
tensor_element!(bool, Bool, DataType::DtBool);

/// Dense host tensor.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    shape: TensorShape,
    data: TensorData,
}

impl Tensor {
    /// Build a tensor from row-major values, checking the element count against `shape`.
    pub fn from_array<T: TensorElement>(shape: TensorShape, values: &[T]) -> JitResult<Self> {
        let expected = shape
            .num_elements()
            .ok_or_else(|| JitError::InvalidShape { dims: shape.dims().to_vec() })?;
        if expected != values.len() {
            return Err(JitError::ShapeMismatch {
                dims: shape.dims().to_vec(),
                expected,
                actual: values.len(),
            });
        }
        Ok(Self { shape, data: T::into_data(values.to_vec()) })
    }

    pub fn dtype(&self) -> DataType {
        self.data.dtype()
    }

    pub fn shape(&self) -> &TensorShape {
        &self.shape
    }

    pub fn data(&self) -> &TensorData {
        &self.data
    }

    /// Elements as `T`, or `None` if the tensor holds another dtype.
    pub fn as_slice<T: TensorElement>(&self) -> Option<&[T]> {
        T::view(&self.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_array() {
        let tensor = Tensor::from_array(TensorShape::new(&[1, 2]), &[0.0f32, 1.0]).unwrap();
        assert_eq!(tensor.dtype(), DataType::DtFloat);
        assert_eq!(tensor.shape().dims(), &[1, 2]);
        assert_eq!(tensor.as_slice::<f32>(), Some(&[0.0f32, 1.0][..]));
        assert_eq!(tensor.as_slice::<i32>(), None);
    }

    #[test]
    fn test_from_array_count_mismatch() {
        let err = Tensor::from_array(TensorShape::new(&[2, 2]), &[1i32, 2, 3]).unwrap_err();
        assert_eq!(
            err,
            JitError::ShapeMismatch { dims: vec![2, 2], expected: 4, actual: 3 }
        );
    }

    #[test]
    fn test_invalid_shapes_rejected() {
        for dims in [vec![2, -1], vec![i64::MAX, i64::MAX]] {
            let shape = TensorShape::new(&dims);
            assert_eq!(shape.num_elements(), None);
            assert_eq!(
                Tensor::from_array(shape, &[0.0f32]).unwrap_err(),
                JitError::InvalidShape { dims }
            );
        }
        assert_eq!(TensorShape::new(&[3_000_000_000, 0]).num_elements(), Some(0));
    }

    #[test]
    fn test_scalar_shape() {
        let shape = TensorShape::scalar();
        assert_eq!(shape.rank(), 0);
        assert_eq!(shape.num_elements(), Some(1));
        assert!(Tensor::from_array(shape, &[true]).is_ok());
    }
}
