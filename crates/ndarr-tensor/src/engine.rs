//! The engine: tensor factory and owner of the shared worker pool.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::dtype::Element;
use crate::error::TensorError;
use crate::hardware;
use crate::layout::StrideLayout;
use crate::order::Order;
use crate::shape::Shape;
use crate::storage::Storage;
use crate::tensor::Tensor;

/// Configuration for [`Engine`] construction.
///
/// Unset fields fall back to detected hardware values. Tests use the
/// `l2_cache_bytes` override to force or suppress the tiled parallel paths.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineOptions {
    /// Number of worker threads; defaults to the available parallelism.
    pub cpu_threads: Option<usize>,
    /// Assumed per-core L2 cache capacity in bytes; defaults to
    /// [`hardware::L2_CACHE_SIZE`].
    pub l2_cache_bytes: Option<usize>,
}

struct EngineInner {
    cpu_threads: usize,
    l2_cache_bytes: usize,
    pool: rayon::ThreadPool,
}

/// Factory for tensors and owner of the worker pool they compute on.
///
/// The engine is a cheap handle (`Clone` is an `Arc` bump); every tensor
/// carries one so that parallel kernels always dispatch onto the same
/// long-lived pool. The pool is built once at engine construction and lives
/// until the last handle is dropped.
///
/// # Examples
///
/// ```
/// use ndarr_tensor::{Engine, Order, Shape};
///
/// let engine = Engine::new().unwrap();
/// let t = engine.seq::<f64>(Shape::of(&[2, 3]), Order::C);
/// assert_eq!(t.get(&[1, 2]).unwrap(), 5.0);
/// ```
#[derive(Clone)]
pub struct Engine {
    inner: Arc<EngineInner>,
}

impl Engine {
    /// Creates an engine sized from the detected hardware.
    ///
    /// # Errors
    ///
    /// Returns an error if the worker pool cannot be built.
    pub fn new() -> Result<Engine, TensorError> {
        Self::with_options(EngineOptions::default())
    }

    /// Creates an engine with explicit sizing options.
    ///
    /// # Errors
    ///
    /// Returns an error if the thread count is zero or the worker pool
    /// cannot be built.
    pub fn with_options(options: EngineOptions) -> Result<Engine, TensorError> {
        let cpu_threads = options.cpu_threads.unwrap_or_else(hardware::cores);
        if cpu_threads == 0 {
            return Err(TensorError::invalid_argument("Thread count must be > 0."));
        }
        let l2_cache_bytes = options.l2_cache_bytes.unwrap_or(hardware::L2_CACHE_SIZE);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(cpu_threads)
            .build()
            .map_err(|e| TensorError::ThreadPoolBuild(e.to_string()))?;
        log::debug!("engine pool ready: {cpu_threads} threads, l2 {l2_cache_bytes} bytes");
        Ok(Engine {
            inner: Arc::new(EngineInner {
                cpu_threads,
                l2_cache_bytes,
                pool,
            }),
        })
    }

    /// Returns the configured worker thread count.
    #[inline]
    pub fn cpu_threads(&self) -> usize {
        self.inner.cpu_threads
    }

    /// Returns the assumed L2 cache capacity in bytes.
    #[inline]
    pub fn l2_cache_bytes(&self) -> usize {
        self.inner.l2_cache_bytes
    }

    /// Returns the shared worker pool.
    #[inline]
    pub fn pool(&self) -> &rayon::ThreadPool {
        &self.inner.pool
    }

    /// Element count above which bulk copies are tiled across workers.
    pub fn copy_limit<T: Element>(&self) -> usize {
        (self.l2_cache_bytes() / (T::DTYPE.byte_count() * 2 * self.cpu_threads() * 8)).max(1)
    }

    /// Creates a zero-filled tensor of `shape` laid out in `order`.
    pub fn zeros<T: Element>(&self, shape: Shape, order: Order) -> Tensor<T> {
        let storage = Storage::zeros(shape.size());
        self.dense(shape, order, storage)
    }

    /// Creates a tensor of `shape` with every element equal to `value`.
    pub fn full<T: Element>(&self, shape: Shape, order: Order, value: T) -> Tensor<T> {
        let storage = Storage::filled(shape.size(), value);
        self.dense(shape, order, storage)
    }

    /// Creates the `n`×`n` identity matrix.
    pub fn eye<T: Element>(&self, n: usize, order: Order) -> Tensor<T> {
        let mut eye = self.zeros::<T>(Shape::of(&[n, n]), order);
        for i in 0..n {
            // indices are in range by construction
            eye.set(&[i, i], T::one()).expect("diagonal index in range");
        }
        eye
    }

    /// Creates a rank-0 tensor holding `value`.
    pub fn scalar<T: Element>(&self, value: T) -> Tensor<T> {
        let storage = Storage::from_vec(vec![value]);
        Tensor::from_parts(self.clone(), StrideLayout::scalar(0), storage)
    }

    /// Creates a tensor of `shape` filled with the ramp `0, 1, 2, ...` in
    /// the given order.
    pub fn seq<T: Element>(&self, shape: Shape, order: Order) -> Tensor<T> {
        let data: Vec<T> = (0..shape.size()).map(|i| T::from_f64(i as f64)).collect();
        self.dense(shape, order, Storage::from_vec(data))
    }

    /// Creates a tensor of `shape` from `data` laid out in `order`.
    ///
    /// # Errors
    ///
    /// Returns an error if the data length does not match the shape size.
    pub fn from_vec<T: Element>(
        &self,
        shape: Shape,
        order: Order,
        data: Vec<T>,
    ) -> Result<Tensor<T>, TensorError> {
        if shape.size() != data.len() {
            return Err(TensorError::invalid_shape(shape.size(), data.len()));
        }
        Ok(self.dense(shape, order, Storage::from_vec(data)))
    }

    /// Creates a randomly initialized tensor from a seeded source.
    ///
    /// Floating dtypes sample the standard normal distribution; integral
    /// dtypes sample uniformly over their full range.
    pub fn random<T: Element>(&self, shape: Shape, order: Order, seed: u64) -> Tensor<T> {
        let mut rng = StdRng::seed_from_u64(seed);
        let data: Vec<T> = (0..shape.size()).map(|_| T::sample(&mut rng)).collect();
        self.dense(shape, order, Storage::from_vec(data))
    }

    /// Creates a tensor over existing storage with an explicit layout.
    ///
    /// The result aliases `storage`; this is how view transforms hand out
    /// tensors sharing one buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the layout can reach a pointer outside the
    /// storage.
    pub fn stride<T: Element>(
        &self,
        layout: StrideLayout,
        storage: Storage<T>,
    ) -> Result<Tensor<T>, TensorError> {
        if layout.size() > 0 {
            let mut max_ptr = layout.offset();
            for axis in 0..layout.rank() {
                max_ptr += (layout.dim(axis) - 1) * layout.stride(axis);
            }
            if max_ptr >= storage.len() {
                return Err(TensorError::index_out_of_bounds(max_ptr, storage.len()));
            }
        }
        Ok(Tensor::from_parts(self.clone(), layout, storage))
    }

    fn dense<T: Element>(&self, shape: Shape, order: Order, storage: Storage<T>) -> Tensor<T> {
        let layout = StrideLayout::dense(shape, order);
        Tensor::from_parts(self.clone(), layout, storage)
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("cpu_threads", &self.cpu_threads())
            .field("l2_cache_bytes", &self.l2_cache_bytes())
            .finish()
    }
}
