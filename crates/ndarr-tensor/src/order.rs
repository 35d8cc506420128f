/// Traversal and storage ordering for tensor elements.
///
/// The order controls how a flat position maps to an N-dimensional index and
/// how loop descriptors walk memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Order {
    /// Row-major (C) order: the rightmost dimension varies fastest.
    #[default]
    C,
    /// Column-major (Fortran) order: the leftmost dimension varies fastest.
    F,
    /// Automatic: preserve the operand's ordering, defaulting to [`Order::C`].
    A,
    /// Storage order: whatever order walks the underlying buffer fastest.
    ///
    /// Only meaningful as a traversal request; never a concrete layout order.
    S,
}

impl Order {
    /// The library default for newly materialized tensors.
    pub fn default_order() -> Order {
        Order::C
    }

    /// Resolves `A` and `S` to a concrete C/F order, defaulting to C.
    pub fn auto_fc(self) -> Order {
        match self {
            Order::C => Order::C,
            Order::F => Order::F,
            Order::A | Order::S => Order::default_order(),
        }
    }

    /// Returns true if this is a concrete (C or F) order.
    pub fn is_concrete(self) -> bool {
        matches!(self, Order::C | Order::F)
    }
}
