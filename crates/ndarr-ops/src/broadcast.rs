//! Shape broadcasting: virtual expansion of operands via stride-0 axes.

use ndarr_tensor::{Element, Shape, Tensor};

use crate::error::OpsError;

/// The outcome of pairing shapes for an elementwise operation.
#[derive(Debug, Clone)]
pub struct ElementWise {
    valid: bool,
    shape: Shape,
}

impl ElementWise {
    /// True if the shapes can be combined elementwise.
    #[inline]
    pub fn valid(&self) -> bool {
        self.valid
    }

    /// The broadcast result shape; meaningful only when valid.
    #[inline]
    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

/// Pairs shapes with trailing-axis alignment.
///
/// Axes are compared from the right; paired sizes must be equal or one of
/// them 1, the latter broadcasting to the other.
pub fn element_wise(shapes: &[&Shape]) -> ElementWise {
    let rank = shapes.iter().map(|s| s.rank()).max().unwrap_or(0);
    let mut dims = vec![1usize; rank];
    for shape in shapes {
        let pad = rank - shape.rank();
        for axis in 0..shape.rank() {
            let d = shape.dim(axis);
            let slot = &mut dims[pad + axis];
            if *slot == 1 {
                *slot = d;
            } else if d != 1 && d != *slot {
                return ElementWise {
                    valid: false,
                    shape: Shape::scalar(),
                };
            }
        }
    }
    ElementWise {
        valid: true,
        shape: Shape::from(dims),
    }
}

/// Virtually expands `t` to `target` with stride-0 axes; no data is copied.
///
/// # Errors
///
/// Returns an error if `t` does not broadcast to `target`.
pub fn transform<T: Element>(t: &Tensor<T>, target: &Shape) -> Result<Tensor<T>, OpsError> {
    if t.shape() == target {
        return Ok(t.clone());
    }
    if t.rank() > target.rank() {
        return Err(OpsError::ShapeMismatch(
            t.shape().dims().to_vec(),
            target.dims().to_vec(),
        ));
    }
    let pad = target.rank() - t.rank();
    let lead: Vec<usize> = (0..pad).collect();
    let mut result = t.stretch(&lead)?;
    for axis in 0..target.rank() {
        if result.dim(axis) == target.dim(axis) {
            continue;
        }
        if result.dim(axis) != 1 {
            return Err(OpsError::ShapeMismatch(
                t.shape().dims().to_vec(),
                target.dims().to_vec(),
            ));
        }
        result = result.expand(axis, target.dim(axis))?;
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_trailing_axes() {
        let a = Shape::of(&[3, 1]);
        let b = Shape::of(&[1, 4]);
        let bc = element_wise(&[&a, &b]);
        assert!(bc.valid());
        assert_eq!(bc.shape().dims(), &[3, 4]);

        let a = Shape::of(&[2, 3]);
        let b = Shape::of(&[3]);
        let bc = element_wise(&[&a, &b]);
        assert!(bc.valid());
        assert_eq!(bc.shape().dims(), &[2, 3]);
    }

    #[test]
    fn rejects_incompatible() {
        let a = Shape::of(&[2, 3]);
        let b = Shape::of(&[2, 4]);
        assert!(!element_wise(&[&a, &b]).valid());
    }

    #[test]
    fn transform_expands_without_copying() -> Result<(), OpsError> {
        let engine = ndarr_tensor::Engine::new().unwrap();
        let t = engine.seq::<f64>(Shape::of(&[3]), ndarr_tensor::Order::C);
        let e = transform(&t, &Shape::of(&[2, 3]))?;
        assert!(e.storage().ptr_eq(t.storage()));
        assert_eq!(e.get(&[0, 1]).unwrap(), 1.0);
        assert_eq!(e.get(&[1, 1]).unwrap(), 1.0);
        Ok(())
    }
}
