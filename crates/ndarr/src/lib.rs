#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]
//!
//! This meta crate re-exports the ndarr workspace: the strided tensor core
//! (`ndarr-tensor`) and the operation kernels (`ndarr-ops`).
//!
//! ```rust
//! use ndarr::{Engine, Order, Shape, TensorOps};
//!
//! let engine = Engine::new().unwrap();
//! let a = engine.seq::<f64>(Shape::of(&[3, 3]), Order::C);
//! assert_eq!(a.trace().unwrap(), 12.0);
//! ```

pub use ndarr_ops::{BinaryKind, Kernels, OpsError, TensorOps, UnaryKind, UnaryOp};
pub use ndarr_tensor::{
    DType, Element, Engine, EngineOptions, LoopDescriptor, Order, PointerIterator, Shape, Storage,
    StrideLayout, Tensor, TensorError,
};

/// Elementwise, reduction and linear-algebra kernels.
pub use ndarr_ops as ops;
/// The strided tensor core.
pub use ndarr_tensor as tensor;
