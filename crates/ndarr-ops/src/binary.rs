//! Binary operation execution: tensor and scalar right-hand sides.

use ndarr_tensor::{Element, Order, Tensor};

use crate::broadcast;
use crate::error::OpsError;
use crate::kernels::{BinaryKind, Kernels};

fn lockstep_order<T: Element>(t: &Tensor<T>) -> Order {
    match t.layout().storage_fast_order() {
        Order::S => Order::default_order(),
        order => order,
    }
}

/// Combines `t` with `other` elementwise in place.
///
/// A scalar `other` specializes to the scalar path. Otherwise the shapes
/// must be equal or `other` must broadcast to `t`'s shape; the smaller
/// operand is virtually expanded via stride-0 axes and both position
/// sequences are walked in lockstep.
pub(crate) fn apply_binary<T: Kernels>(
    t: &Tensor<T>,
    other: &Tensor<T>,
    kind: BinaryKind,
) -> Result<(), OpsError> {
    if other.is_scalar() {
        return apply_binary_scalar(t, other.item()?, kind);
    }
    let pairing = broadcast::element_wise(&[t.shape(), other.shape()]);
    if !pairing.valid() {
        return Err(OpsError::ShapeMismatch(
            t.shape().dims().to_vec(),
            other.shape().dims().to_vec(),
        ));
    }
    if pairing.shape() != t.shape() {
        // broadcasting may not change the shape of the mutated operand
        return Err(OpsError::ShapeMismatch(
            t.shape().dims().to_vec(),
            other.shape().dims().to_vec(),
        ));
    }
    let other = broadcast::transform(other, t.shape())?;

    let order = lockstep_order(t);
    let storage = t.storage();
    let other_storage = other.storage();
    for (p, q) in t.ptr_iter(order).zip(other.ptr_iter(order)) {
        storage.set(p, kind.apply(storage.get(p), other_storage.get(q)));
    }
    Ok(())
}

/// Combines every element of `t` with the scalar `v` in place.
///
/// Unit-stride runs of SIMD-capable types are processed in whole-lane
/// groups; the remainder and strided runs walk scalar-wise.
pub(crate) fn apply_binary_scalar<T: Kernels>(
    t: &Tensor<T>,
    v: T,
    kind: BinaryKind,
) -> Result<(), OpsError> {
    let plan = t.loop_descriptor(Order::S);
    let storage = t.storage();
    for &offset in &plan.offsets {
        if plan.step == 1 && storage.supports_simd() {
            // SAFETY: in-place binary execution is single threaded and runs
            // of one descriptor are disjoint.
            let run = unsafe { storage.run_mut(offset, plan.bound) };
            T::binary_scalar_run(run, v, kind);
            continue;
        }
        let mut p = offset;
        for _ in 0..plan.bound {
            storage.set(p, kind.apply(storage.get(p), v));
            p += plan.step;
        }
    }
    Ok(())
}

/// Fused multiply-add in place: `t[i] += a * other[i]`.
///
/// A scalar `other` folds into a scalar addition; otherwise the shapes must
/// match exactly.
pub(crate) fn apply_fma<T: Kernels>(t: &Tensor<T>, a: T, other: &Tensor<T>) -> Result<(), OpsError> {
    if other.is_scalar() {
        return apply_binary_scalar(t, a * other.item()?, BinaryKind::Add);
    }
    if t.shape() != other.shape() {
        return Err(OpsError::ShapeMismatch(
            t.shape().dims().to_vec(),
            other.shape().dims().to_vec(),
        ));
    }
    let order = lockstep_order(t);
    let storage = t.storage();
    let other_storage = other.storage();
    for (p, q) in t.ptr_iter(order).zip(other.ptr_iter(order)) {
        storage.set(p, other_storage.get(q).mul_add(a, storage.get(p)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarr_tensor::{Engine, Shape};

    fn engine() -> Engine {
        Engine::new().unwrap()
    }

    #[test]
    fn equal_shapes_combine_lockstep() -> Result<(), OpsError> {
        let engine = engine();
        let a = engine.seq::<f64>(Shape::of(&[2, 3]), Order::C);
        let b = engine.full::<f64>(Shape::of(&[2, 3]), Order::F, 10.0);
        apply_binary(&a, &b, BinaryKind::Add)?;
        assert_eq!(
            a.to_vec(Order::C),
            vec![10.0, 11.0, 12.0, 13.0, 14.0, 15.0]
        );
        Ok(())
    }

    #[test]
    fn broadcast_expands_smaller_operand() -> Result<(), OpsError> {
        let engine = engine();
        let a = engine.seq::<f64>(Shape::of(&[2, 3]), Order::C);
        let row = engine.from_vec(Shape::of(&[3]), Order::C, vec![1.0, 2.0, 3.0])?;
        apply_binary(&a, &row, BinaryKind::Add)?;
        assert_eq!(a.to_vec(Order::C), vec![1.0, 3.0, 5.0, 4.0, 6.0, 8.0]);
        Ok(())
    }

    #[test]
    fn broadcast_may_not_grow_destination() {
        let engine = engine();
        let a = engine.seq::<f64>(Shape::of(&[3]), Order::C);
        let b = engine.zeros::<f64>(Shape::of(&[2, 3]), Order::C);
        assert!(apply_binary(&a, &b, BinaryKind::Add).is_err());
    }

    #[test]
    fn incompatible_shapes_rejected() {
        let engine = engine();
        let a = engine.zeros::<f64>(Shape::of(&[2, 3]), Order::C);
        let b = engine.zeros::<f64>(Shape::of(&[2, 4]), Order::C);
        assert!(apply_binary(&a, &b, BinaryKind::Add).is_err());
    }

    #[test]
    fn scalar_rhs_specializes() -> Result<(), OpsError> {
        let engine = engine();
        let a = engine.seq::<f32>(Shape::of(&[11]), Order::C);
        let s = engine.scalar(2.0f32);
        apply_binary(&a, &s, BinaryKind::Mul)?;
        let expected: Vec<f32> = (0..11).map(|i| (i * 2) as f32).collect();
        assert_eq!(a.to_vec(Order::C), expected);
        Ok(())
    }

    #[test]
    fn fma_accumulates() -> Result<(), OpsError> {
        let engine = engine();
        let acc = engine.full::<f64>(Shape::of(&[4]), Order::C, 1.0);
        let x = engine.seq::<f64>(Shape::of(&[4]), Order::C);
        apply_fma(&acc, 2.0, &x)?;
        assert_eq!(acc.to_vec(Order::C), vec![1.0, 3.0, 5.0, 7.0]);
        Ok(())
    }

    #[test]
    fn integer_binary_works_scalar_path() -> Result<(), OpsError> {
        let engine = engine();
        let a = engine.seq::<i32>(Shape::of(&[5]), Order::C);
        let b = engine.full::<i32>(Shape::of(&[5]), Order::C, 3);
        apply_binary(&a, &b, BinaryKind::Max)?;
        assert_eq!(a.to_vec(Order::C), vec![3, 3, 3, 3, 4]);
        Ok(())
    }
}
