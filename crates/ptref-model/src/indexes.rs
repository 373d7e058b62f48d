//! Ordered dense index sets.
//!
//! [`Indexes`] is the currency of the query engine: every filter
//! evaluation produces one, and intersection / difference / union over
//! them implement the query algebra. The set is backed by a sorted,
//! deduplicated `Vec<u32>`, which keeps iteration order deterministic
//! and the merge operations linear.

/// A dense index into one kind's collection.
pub type Idx = u32;

/// An ordered set of dense indices, ascending and duplicate-free.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Indexes {
    inner: Vec<Idx>,
}

impl Indexes {
    /// The empty set.
    pub fn new() -> Self {
        Indexes { inner: Vec::new() }
    }

    /// A set holding a single index.
    pub fn single(idx: Idx) -> Self {
        Indexes { inner: vec![idx] }
    }

    /// Build a set from indices in any order, deduplicating.
    pub fn from_unsorted(mut indices: Vec<Idx>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Indexes { inner: indices }
    }

    /// Insert one index, keeping the set sorted.
    pub fn insert(&mut self, idx: Idx) {
        if let Err(pos) = self.inner.binary_search(&idx) {
            self.inner.insert(pos, idx);
        }
    }

    /// Insert every index of an iterator.
    pub fn extend(&mut self, indices: impl IntoIterator<Item = Idx>) {
        self.inner.extend(indices);
        self.inner.sort_unstable();
        self.inner.dedup();
    }

    /// Whether `idx` is in the set.
    pub fn contains(&self, idx: Idx) -> bool {
        self.inner.binary_search(&idx).is_ok()
    }

    /// Number of indices in the set.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Iterate the indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = Idx> + '_ {
        self.inner.iter().copied()
    }

    /// The indices as a sorted slice.
    pub fn as_slice(&self) -> &[Idx] {
        &self.inner
    }

    /// Consume the set into its sorted vector.
    pub fn into_vec(self) -> Vec<Idx> {
        self.inner
    }

    /// Indices present in both sets.
    pub fn intersection(&self, other: &Indexes) -> Indexes {
        let mut out = Vec::new();
        let (mut i, mut j) = (0, 0);
        while i < self.inner.len() && j < other.inner.len() {
            match self.inner[i].cmp(&other.inner[j]) {
                std::cmp::Ordering::Less => i += 1,
                std::cmp::Ordering::Greater => j += 1,
                std::cmp::Ordering::Equal => {
                    out.push(self.inner[i]);
                    i += 1;
                    j += 1;
                }
            }
        }
        Indexes { inner: out }
    }

    /// Indices of `self` not present in `other`.
    pub fn difference(&self, other: &Indexes) -> Indexes {
        let mut out = Vec::new();
        let mut j = 0;
        for &idx in &self.inner {
            while j < other.inner.len() && other.inner[j] < idx {
                j += 1;
            }
            if j >= other.inner.len() || other.inner[j] != idx {
                out.push(idx);
            }
        }
        Indexes { inner: out }
    }

    /// Indices present in either set.
    pub fn union(&self, other: &Indexes) -> Indexes {
        let mut out = Vec::with_capacity(self.inner.len() + other.inner.len());
        out.extend_from_slice(&self.inner);
        out.extend_from_slice(&other.inner);
        Indexes::from_unsorted(out)
    }
}

impl FromIterator<Idx> for Indexes {
    fn from_iter<T: IntoIterator<Item = Idx>>(iter: T) -> Self {
        Indexes::from_unsorted(iter.into_iter().collect())
    }
}

impl IntoIterator for Indexes {
    type Item = Idx;
    type IntoIter = std::vec::IntoIter<Idx>;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(v: &[Idx]) -> Indexes {
        Indexes::from_unsorted(v.to_vec())
    }

    #[test]
    fn from_unsorted_sorts_and_dedups() {
        assert_eq!(set(&[3, 1, 2, 1, 3]).as_slice(), &[1, 2, 3]);
    }

    #[test]
    fn insert_keeps_order() {
        let mut s = set(&[1, 5]);
        s.insert(3);
        s.insert(3);
        s.insert(0);
        assert_eq!(s.as_slice(), &[0, 1, 3, 5]);
    }

    #[test]
    fn intersection_difference_union() {
        let a = set(&[1, 2, 3, 5, 8]);
        let b = set(&[2, 3, 4, 8, 9]);
        assert_eq!(a.intersection(&b).as_slice(), &[2, 3, 8]);
        assert_eq!(a.difference(&b).as_slice(), &[1, 5]);
        assert_eq!(a.union(&b).as_slice(), &[1, 2, 3, 4, 5, 8, 9]);
    }

    #[test]
    fn difference_with_empty_is_identity() {
        let a = set(&[1, 2]);
        assert_eq!(a.difference(&Indexes::new()), a);
        assert_eq!(Indexes::new().difference(&a), Indexes::new());
    }

    #[test]
    fn contains_uses_binary_search() {
        let a = set(&[2, 4, 6]);
        assert!(a.contains(4));
        assert!(!a.contains(5));
    }
}
