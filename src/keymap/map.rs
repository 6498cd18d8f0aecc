use std::collections::hash_map;
use std::collections::HashMap;
use std::fmt;

use super::key::{CompositeKey, KeyFlag};

/// Hash map keyed by full structural equality over [`CompositeKey`].
///
/// Single-writer. Wrap it in a mutex before sharing across tasks.
#[derive(Clone)]
pub struct StructuralKeyMap<const N: usize, F: KeyFlag = ()> {
    entries: HashMap<CompositeKey<N, F>, i64>,
    capacity_hint: usize,
}

impl<const N: usize, F: KeyFlag> StructuralKeyMap<N, F> {
    pub fn new() -> Self {
        Self::with_capacity_hint(0)
    }

    /// The hint only pre-sizes the table. Inserting past it is always fine.
    pub fn with_capacity_hint(hint: usize) -> Self {
        Self {
            entries: HashMap::with_capacity(hint),
            capacity_hint: hint,
        }
    }

    /// Insert or overwrite. Returns the value that was replaced, if any.
    pub fn put(&mut self, key: CompositeKey<N, F>, value: i64) -> Option<i64> {
        self.entries.insert(key, value)
    }

    pub fn get(&self, key: &CompositeKey<N, F>) -> Option<i64> {
        self.entries.get(key).copied()
    }

    pub fn size(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity_hint(&self) -> usize {
        self.capacity_hint
    }

    /// Lazy pass over the current entries. Order is unspecified.
    pub fn snapshot_entries(&self) -> Entries<'_, N, F> {
        Entries {
            inner: self.entries.iter(),
        }
    }
}

impl<const N: usize, F: KeyFlag> Default for StructuralKeyMap<N, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize, F: KeyFlag> Extend<(CompositeKey<N, F>, i64)> for StructuralKeyMap<N, F> {
    fn extend<I: IntoIterator<Item = (CompositeKey<N, F>, i64)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.put(key, value);
        }
    }
}

/// Iterator returned by [`StructuralKeyMap::snapshot_entries`].
pub struct Entries<'a, const N: usize, F: KeyFlag> {
    inner: hash_map::Iter<'a, CompositeKey<N, F>, i64>,
}

impl<'a, const N: usize, F: KeyFlag> Iterator for Entries<'a, N, F> {
    type Item = (CompositeKey<N, F>, i64);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (*k, *v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a, const N: usize, F: KeyFlag> ExactSizeIterator for Entries<'a, N, F> {}

// Go-style `map[k:v k:v]`. Entries are sorted here so the rendering is
// stable; the iteration contract stays unordered.
impl<const N: usize, F: KeyFlag + Ord> fmt::Display for StructuralKeyMap<N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sorted: Vec<_> = self.snapshot_entries().collect();
        sorted.sort_by(|(a, _), (b, _)| a.coordinates.cmp(&b.coordinates).then(a.flag.cmp(&b.flag)));

        f.write_str("map[")?;
        for (i, (key, value)) in sorted.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{:?}:{}", key, value)?;
        }
        f.write_str("]")
    }
}

impl<const N: usize, F: KeyFlag> fmt::Debug for StructuralKeyMap<N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuralKeyMap")
            .field("size", &self.size())
            .field("capacity_hint", &self.capacity_hint)
            .finish()
    }
}
