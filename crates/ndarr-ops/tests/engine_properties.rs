//! End-to-end properties of the engine: ordering round-trips, aliasing,
//! reductions, broadcasting and parallel-execution equivalence.

use approx::assert_relative_eq;
use ndarr_ops::{OpsError, TensorOps};
use ndarr_tensor::{Engine, EngineOptions, Order, Shape};

fn engine() -> Engine {
    Engine::new().unwrap()
}

#[test]
fn copy_order_roundtrip() -> Result<(), OpsError> {
    let engine = engine();
    let base = engine.random::<f64>(Shape::of(&[3, 4, 5]), Order::C, 3);
    let views = vec![
        base.clone(),
        base.permute(&[2, 0, 1])?,
        base.narrow(1, true, 1, 3)?,
        base.t(),
    ];
    for view in views {
        for order in [Order::C, Order::F] {
            let copy = view.copy(order);
            assert_eq!(copy.to_vec(Order::C), view.to_vec(Order::C));
            assert_eq!(copy.to_vec(Order::F), view.to_vec(Order::F));
        }
    }
    Ok(())
}

#[test]
fn view_inverse_idempotence() -> Result<(), OpsError> {
    let engine = engine();
    let t = engine.seq::<f64>(Shape::of(&[3, 4, 5]), Order::C);

    let round = t.permute(&[1, 2, 0])?.permute(&[2, 0, 1])?;
    assert_eq!(round.layout(), t.layout());

    let round = t.stretch(&[2])?.squeeze_axes(&[2])?;
    assert_eq!(round.layout(), t.layout());

    let narrowed = t.narrow(0, true, 0, 3)?;
    assert_eq!(narrowed.layout(), t.layout());
    Ok(())
}

#[test]
fn aliasing_is_visible_through_source() -> Result<(), OpsError> {
    let engine = engine();
    let t = engine.zeros::<f64>(Shape::of(&[4, 4]), Order::C);
    let mut quadrant = t.narrow_all(&[2, 2], &[4, 4])?;
    quadrant.fill_(5.0);
    assert_eq!(t.get(&[3, 3])?, 5.0);
    assert_eq!(t.get(&[1, 1])?, 0.0);
    assert_eq!(t.sum(), 20.0);

    // mutation through an elementwise op on a view as well
    let mut diag = t.diag(0)?;
    diag.add_scalar_(1.0)?;
    assert_eq!(t.get(&[0, 0])?, 1.0);
    assert_eq!(t.get(&[3, 3])?, 6.0);
    Ok(())
}

#[test]
fn ramp_reductions() -> Result<(), OpsError> {
    let engine = engine();
    let n = 10_000usize;
    let t = engine.seq::<f64>(Shape::of(&[n]), Order::C);
    assert_relative_eq!(t.sum(), (n * (n - 1) / 2) as f64);
    assert_relative_eq!(t.mean()?, (n - 1) as f64 / 2.0);
    Ok(())
}

#[test]
fn nan_reductions_exclude_exactly_the_nans() -> Result<(), OpsError> {
    let engine = engine();
    let n = 100usize;
    let nan_at = [7usize, 33, 34, 90];
    let mut data: Vec<f64> = (0..n).map(|i| i as f64).collect();
    for &i in &nan_at {
        data[i] = f64::NAN;
    }
    let t = engine.from_vec(Shape::of(&[n]), Order::C, data)?;

    let clean_sum = (0..n)
        .filter(|i| !nan_at.contains(i))
        .map(|i| i as f64)
        .sum::<f64>();
    assert_eq!(t.nan_count(), nan_at.len());
    assert_relative_eq!(t.nan_sum()?, clean_sum);
    assert_relative_eq!(t.nan_mean()?, clean_sum / (n - nan_at.len()) as f64);
    assert!(t.sum().is_nan());
    Ok(())
}

#[test]
fn variance_properties() -> Result<(), OpsError> {
    let engine = engine();
    let constant = engine.full::<f64>(Shape::of(&[64]), Order::C, 3.5);
    assert_relative_eq!(constant.var(0)?, 0.0);

    let t = engine.from_vec(
        Shape::of(&[5]),
        Order::C,
        vec![1.0f64, 2.0, 3.0, 4.0, 5.0],
    )?;
    assert_relative_eq!(t.mean()?, 3.0);
    assert_relative_eq!(t.var(0)?, 2.0);
    assert_relative_eq!(t.var(1)?, 2.5);
    Ok(())
}

#[test]
fn matmul_matches_reference_and_is_deterministic() -> Result<(), OpsError> {
    let engine = engine();
    let a = engine.from_vec(
        Shape::of(&[2, 3]),
        Order::C,
        vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0],
    )?;
    let b = engine.from_vec(
        Shape::of(&[3, 2]),
        Order::C,
        vec![7.0f64, 8.0, 9.0, 10.0, 11.0, 12.0],
    )?;

    // reference triple-loop product
    let mut reference = [[0.0f64; 2]; 2];
    for i in 0..2 {
        for j in 0..2 {
            for k in 0..3 {
                reference[i][j] += a.get(&[i, k])? * b.get(&[k, j])?;
            }
        }
    }
    let c = a.mm(&b)?;
    for i in 0..2 {
        for j in 0..2 {
            assert_eq!(c.get(&[i, j])?, reference[i][j]);
        }
    }

    // blocked, threaded execution must not change the numeric result
    let wide = engine.random::<f64>(Shape::of(&[50, 70]), Order::C, 21);
    let tall = engine.random::<f64>(Shape::of(&[70, 40]), Order::C, 22);
    let first = wide.mm(&tall)?;
    let second = wide.mm(&tall)?;
    assert_eq!(first.to_vec(Order::C), second.to_vec(Order::C));
    Ok(())
}

#[test]
fn parallel_copy_equals_direct_copy() -> Result<(), OpsError> {
    let tiled = Engine::with_options(EngineOptions {
        cpu_threads: Some(4),
        l2_cache_bytes: Some(8 * 1024),
    })
    .unwrap();
    let direct = Engine::with_options(EngineOptions {
        cpu_threads: Some(4),
        l2_cache_bytes: Some(1 << 30),
    })
    .unwrap();

    let shape = Shape::of(&[37, 23, 11]);
    let src = tiled.random::<f32>(shape.clone(), Order::C, 99);
    assert!(tiled.copy_limit::<f32>() < src.size());
    assert!(direct.copy_limit::<f32>() > src.size());

    let mut out_tiled = tiled.zeros::<f32>(shape.clone(), Order::F);
    src.copy_to(&mut out_tiled)?;

    let src2 = direct.from_vec(shape.clone(), Order::C, src.to_vec(Order::C))?;
    let mut out_direct = direct.zeros::<f32>(shape, Order::F);
    src2.copy_to(&mut out_direct)?;

    assert_eq!(out_tiled.to_vec(Order::C), out_direct.to_vec(Order::C));
    Ok(())
}

#[test]
fn broadcast_addition() -> Result<(), OpsError> {
    let engine = engine();
    let a = engine.from_vec(Shape::of(&[3, 1]), Order::C, vec![0.0f64, 10.0, 20.0])?;
    let b = engine.from_vec(Shape::of(&[1, 4]), Order::C, vec![1.0f64, 2.0, 3.0, 4.0])?;

    // a (3,1) plus b (1,4) broadcast to (3,4)
    let expanded = a.expand(1, 4)?;
    let result = expanded.add(&b)?;
    assert_eq!(result.shape().dims(), &[3, 4]);
    for i in 0..3 {
        for j in 0..4 {
            assert_eq!(result.get(&[i, j])?, a.get(&[i, 0])? + b.get(&[0, j])?);
        }
    }
    Ok(())
}

#[test]
fn float_only_ops_reject_integers_before_mutation() -> Result<(), OpsError> {
    let engine = engine();
    let mut t = engine.seq::<i32>(Shape::of(&[4]), Order::C);
    assert!(t.exp_().is_err());
    assert!(t.mean().is_err());
    assert!(t.nan_sum().is_err());
    // operand untouched by the failed attempts
    assert_eq!(t.to_vec(Order::C), vec![0, 1, 2, 3]);
    Ok(())
}

#[test]
fn take_and_reductions_compose() -> Result<(), OpsError> {
    let engine = engine();
    let t = engine.seq::<f64>(Shape::of(&[4, 4]), Order::C);
    let evens = t.take(0, &[0, 2])?;
    assert_eq!(evens.sum1d(1)?.to_vec(Order::C), vec![6.0, 38.0]);
    Ok(())
}
