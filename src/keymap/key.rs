use std::fmt;
use std::hash::Hash;

/// Fixed-size composite key.
///
/// Equality and hashing are derived over every coordinate plus the flag, so two
/// keys are the same entry only when all `N` coordinates match, including the
/// ones the caller never touched. Keys are zero-filled by construction.
///
/// `F` is the optional scalar flag. The unflagged shape uses `()`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompositeKey<const N: usize, F = ()> {
    pub coordinates: [i64; N],
    pub flag: F,
}

/// Bound for anything usable as the flag of a key.
pub trait KeyFlag: Copy + Eq + Hash + Default + fmt::Debug {}

impl<T: Copy + Eq + Hash + Default + fmt::Debug> KeyFlag for T {}

impl<const N: usize, F: KeyFlag> CompositeKey<N, F> {
    /// All coordinates zero, flag at its default.
    pub fn zeroed() -> Self {
        Self {
            coordinates: [0; N],
            flag: F::default(),
        }
    }

    pub fn new(coordinates: [i64; N], flag: F) -> Self {
        Self { coordinates, flag }
    }

    /// Zeroed key with a single coordinate set.
    ///
    /// Panics if `index >= N`, like indexing the array directly would.
    pub fn with_coordinate(index: usize, value: i64) -> Self {
        let mut key = Self::zeroed();
        key.coordinates[index] = value;
        key
    }

    pub fn set(mut self, index: usize, value: i64) -> Self {
        self.coordinates[index] = value;
        self
    }

    pub fn flagged(mut self, flag: F) -> Self {
        self.flag = flag;
        self
    }

    pub fn coordinate(&self, index: usize) -> Option<i64> {
        self.coordinates.get(index).copied()
    }

    pub const fn len(&self) -> usize {
        N
    }

    pub const fn is_empty(&self) -> bool {
        N == 0
    }
}

impl<const N: usize, F: KeyFlag> Default for CompositeKey<N, F> {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl<const N: usize> From<[i64; N]> for CompositeKey<N, ()> {
    fn from(coordinates: [i64; N]) -> Self {
        Self { coordinates, flag: () }
    }
}

// Renders as `{[0 0 0] 0}`, or `{[0 0 0]}` for the unflagged shape.
impl<const N: usize, F: KeyFlag> fmt::Debug for CompositeKey<N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{[")?;
        for (i, c) in self.coordinates.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", c)?;
        }
        f.write_str("]")?;
        let flag = format!("{:?}", self.flag);
        if flag != "()" {
            write!(f, " {}", flag)?;
        }
        f.write_str("}")
    }
}

impl<const N: usize, F: KeyFlag> fmt::Display for CompositeKey<N, F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Record shape used by the map probe: a 16-slot age array and a one-byte flag.
pub type ProbeRecord = CompositeKey<16, u8>;
