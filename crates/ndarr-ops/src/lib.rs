#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `ndarr-ops` implements the numeric surface of the ndarr engine on top of
//! the `ndarr-tensor` core: elementwise operations, broadcasting,
//! reductions and the linear-algebra primitives, all exposed through the
//! [`TensorOps`] extension trait.
//!
//! Execution follows loop descriptors from the core crate: unit-stride runs
//! of floating point tensors are processed in SIMD lane groups (`wide`),
//! everything else falls back to scalar walks with identical semantics.
//! Per-axis reductions, bulk copies and the blocked matrix product dispatch
//! onto the engine's shared worker pool and join before returning.
//!
//! ```rust
//! use ndarr_ops::TensorOps;
//! use ndarr_tensor::{Engine, Order, Shape};
//!
//! let engine = Engine::new().unwrap();
//! let a = engine.seq::<f64>(Shape::of(&[2, 3]), Order::C);
//! let b = engine.full::<f64>(Shape::of(&[2, 3]), Order::C, 2.0);
//! let c = a.add(&b).unwrap();
//! assert_eq!(c.sum(), 27.0);
//! ```

/// Binary operation execution (tensor and scalar right-hand sides).
pub mod binary;

/// Shape broadcasting via stride-0 virtual expansion.
pub mod broadcast;

/// Error types for tensor operations.
pub mod error;

/// Per-type kernel table: scalar defaults with SIMD lane overrides.
pub mod kernels;

/// Linear-algebra primitives, including the blocked parallel matmul.
pub mod linalg;

/// The [`TensorOps`] extension trait.
pub mod ops;

/// Reductions, compensated moments and per-axis dispatch.
pub mod reduce;

/// Unary operation table and execution.
pub mod unary;

pub use crate::error::OpsError;
pub use crate::kernels::{BinaryKind, Kernels, UnaryKind};
pub use crate::ops::TensorOps;
pub use crate::unary::UnaryOp;
