#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! # Overview
//!
//! `ndarr-tensor` is the core of the ndarr compute engine: a dynamic-rank,
//! strided tensor over shared storage, with the layout algebra and execution
//! plans the operation kernels build on.
//!
//! # Architecture
//!
//! - **[`Shape`]** — ordered dimension sizes; rank 0 is a scalar
//! - **[`StrideLayout`]** — offset + per-axis strides; all view transforms
//!   (permute, narrow, squeeze, expand, reshape-as-view) are layout algebra
//! - **[`Storage`]** — flat reference-counted buffer; several layouts may
//!   alias one storage and mutation through any alias is visible to all
//! - **[`LoopDescriptor`]** — decomposition of a traversal into contiguous
//!   runs, with SIMD lane annotations for unit-stride runs
//! - **[`Tensor`]** — storage + layout + engine handle; the numeric surface
//!   lives in the companion `ndarr-ops` crate
//! - **[`Engine`]** — tensor factory owning the long-lived worker pool
//!
//! # Quick start
//!
//! ```rust
//! use ndarr_tensor::{Engine, Order, Shape};
//!
//! let engine = Engine::new().unwrap();
//! let t = engine.seq::<f64>(Shape::of(&[2, 3]), Order::C);
//!
//! // views share storage
//! let col = t.select(1, 1).unwrap();
//! assert_eq!(col.to_vec(Order::C), vec![1.0, 4.0]);
//!
//! // reshape is zero-copy when the layout is dense
//! let r = t.reshape(Shape::of(&[3, 2]), Order::C).unwrap();
//! assert!(r.storage().ptr_eq(t.storage()));
//! ```

/// Element types and the per-type operator table.
pub mod dtype;

/// Engine: tensor factories and the shared worker pool.
pub mod engine;

/// Error types for tensor creation, layout and access.
pub mod error;

/// Hardware capacity defaults (core count, L2 cache size).
pub mod hardware;

/// Strided layouts and the view transform algebra.
pub mod layout;

/// Execution plans: contiguous-run decomposition and pointer iterators.
pub mod loops;

/// Traversal and storage ordering.
pub mod order;

/// Serde serialization support, enabled with the `serde` feature.
#[cfg(feature = "serde")]
pub mod serde;

/// Shapes: ordered dimension sizes.
pub mod shape;

/// Reference-counted flat buffers with explicit aliasing support.
pub mod storage;

/// The tensor type itself.
pub mod tensor;

pub use crate::dtype::{DType, Element};
pub use crate::engine::{Engine, EngineOptions};
pub use crate::error::TensorError;
pub use crate::layout::StrideLayout;
pub use crate::loops::{LoopDescriptor, PointerIterator};
pub use crate::order::Order;
pub use crate::shape::Shape;
pub use crate::storage::Storage;
pub use crate::tensor::Tensor;
