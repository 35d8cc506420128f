//! Serde support: tensors serialize as `{data, shape, strides}`.
//!
//! Data is emitted in C order regardless of the source layout, so a
//! deserialized tensor is always dense and row-major.

use serde::ser::SerializeStruct;
use serde::Deserialize;

use crate::dtype::Element;
use crate::engine::Engine;
use crate::order::Order;
use crate::shape::Shape;
use crate::tensor::Tensor;

impl<T> serde::Serialize for Tensor<T>
where
    T: Element + serde::Serialize,
{
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let data = self.to_vec(Order::C);
        let dense = crate::layout::StrideLayout::dense(self.shape().clone(), Order::C);
        let mut state = serializer.serialize_struct("Tensor", 3)?;
        state.serialize_field("data", &data)?;
        state.serialize_field("shape", &self.shape().dims().to_vec())?;
        state.serialize_field("strides", &dense.strides().to_vec())?;
        state.end()
    }
}

impl<'de, T> serde::Deserialize<'de> for Tensor<T>
where
    T: Element + serde::Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct TensorData<T> {
            data: Vec<T>,
            shape: Vec<usize>,
            #[allow(dead_code)]
            strides: Vec<usize>,
        }

        let TensorData { data, shape, .. } = TensorData::deserialize(deserializer)?;
        let engine = Engine::new().map_err(serde::de::Error::custom)?;
        engine
            .from_vec(Shape::from(shape), Order::C, data)
            .map_err(serde::de::Error::custom)
    }
}
