/// A growable sequence container that can be probed and timed.
///
/// Elements are opaque placeholders: only the container's length and the storage it allocates
/// matter to the measurements.
pub trait Container {
    /// The element type stored by the container.
    type Element;

    /// Creates an empty container.
    fn empty() -> Self;

    /// Creates a container holding exactly `len` placeholder elements.
    ///
    /// The container is grown through [`Container::grow_by_one`], so its capacity is whatever the
    /// growth strategy produces for `len` elements rather than an exact-fit allocation.
    fn filled(len: usize) -> Self
    where
        Self: Sized,
    {
        let mut container = Self::empty();
        for _ in 0..len {
            container.grow_by_one();
        }
        container
    }

    /// Appends one placeholder element.
    fn grow_by_one(&mut self);

    /// Number of elements currently held.
    fn len(&self) -> usize;

    /// Number of elements the container can hold without reallocating.
    fn capacity(&self) -> usize;

    /// Whether the container holds no elements.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T: Default> Container for Vec<T> {
    type Element = T;

    fn empty() -> Self {
        Vec::new()
    }

    fn grow_by_one(&mut self) {
        self.push(T::default());
    }

    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn capacity(&self) -> usize {
        Vec::capacity(self)
    }
}
