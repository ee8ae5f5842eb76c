//! Variable-cardinality ("jagged") per-event storage
//!
//! Every event owns a contiguous run of objects inside one flat arena, and a
//! per-event offset table (CSR-style index) tells where each run starts and
//! ends. Operations that combine two jagged quantities, or a per-event value
//! with its variable-length children, check that the offset tables agree
//! before touching the data.

use std::ops::Range;

/// Per-event boundaries of a jagged quantity
///
/// Holds `num_events + 1` monotonically increasing indices into a flat arena,
/// starting at zero. Event `i` owns arena slots `offsets[i]..offsets[i+1]`.
///
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Offsets(Vec<usize>);
//
impl Offsets {
    /// Build the offset table of events holding no object at all
    pub fn empty(num_events: usize) -> Self {
        Self(vec![0; num_events + 1])
    }

    /// Build the offset table from per-event object counts
    pub fn from_counts(counts: impl IntoIterator<Item = usize>) -> Self {
        let mut offsets = vec![0];
        let mut total = 0;
        for count in counts {
            total += count;
            offsets.push(total);
        }
        Self(offsets)
    }

    /// Build the offset table from raw boundaries, checking its invariants
    pub fn from_raw(offsets: Vec<usize>) -> Self {
        assert_eq!(offsets.first(), Some(&0), "Offsets must start at zero");
        assert!(
            offsets.windows(2).all(|w| w[0] <= w[1]),
            "Offsets must be monotonically increasing"
        );
        Self(offsets)
    }

    /// Number of events
    pub fn num_events(&self) -> usize {
        self.0.len() - 1
    }

    /// Total number of objects across all events
    pub fn num_objects(&self) -> usize {
        *self.0.last().expect("Offsets always hold at least one entry")
    }

    /// Arena slots owned by one event
    pub fn range(&self, event: usize) -> Range<usize> {
        self.0[event]..self.0[event + 1]
    }

    /// Number of objects owned by one event
    pub fn count(&self, event: usize) -> usize {
        self.0[event + 1] - self.0[event]
    }

    /// Number of objects owned by each event
    pub fn counts(&self) -> Vec<usize> {
        self.0.windows(2).map(|w| w[1] - w[0]).collect()
    }

    /// Iterate over the arena ranges of all events
    pub fn ranges(&self) -> impl Iterator<Item = Range<usize>> + '_ {
        self.0.windows(2).map(|w| w[0]..w[1])
    }

    /// Raw boundaries
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Select a subset of events (in the given order)
    ///
    /// Returns the offset table of the subset, along with the arena indices
    /// of the objects which it retains in the parent arena.
    ///
    pub fn take(&self, events: &[usize]) -> (Offsets, Vec<usize>) {
        let mut flat = Vec::new();
        let offsets = Self::from_counts(events.iter().map(|&event| {
            let range = self.range(event);
            let count = range.len();
            flat.extend(range);
            count
        }));
        (offsets, flat)
    }

    /// Concatenate the offset tables of consecutive event chunks
    pub fn concat<'a>(parts: impl IntoIterator<Item = &'a Offsets>) -> Self {
        Self::from_counts(parts.into_iter().flat_map(Offsets::counts))
    }
}

/// Jagged per-event sequence of values of type T
#[derive(Clone, Debug, PartialEq)]
pub struct Jagged<T> {
    offsets: Offsets,
    values: Vec<T>,
}
//
impl<T> Jagged<T> {
    /// Assemble a jagged sequence from its offset table and flat arena
    pub fn new(offsets: Offsets, values: Vec<T>) -> Self {
        assert_eq!(
            offsets.num_objects(),
            values.len(),
            "Arena size must match the offset table"
        );
        Self { offsets, values }
    }

    /// Flatten nested per-event lists into a jagged sequence
    pub fn from_nested(nested: Vec<Vec<T>>) -> Self {
        let offsets = Offsets::from_counts(nested.iter().map(Vec::len));
        let values = nested.into_iter().flatten().collect();
        Self { offsets, values }
    }

    /// Offset table
    pub fn offsets(&self) -> &Offsets {
        &self.offsets
    }

    /// Flat arena of values
    pub fn values(&self) -> &[T] {
        &self.values
    }

    /// Decompose into offset table and flat arena
    pub fn into_parts(self) -> (Offsets, Vec<T>) {
        (self.offsets, self.values)
    }

    /// Number of events
    pub fn num_events(&self) -> usize {
        self.offsets.num_events()
    }

    /// Values owned by one event
    pub fn event(&self, event: usize) -> &[T] {
        &self.values[self.offsets.range(event)]
    }

    /// Iterate over the values of each event
    pub fn iter_events(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.offsets.ranges().map(move |range| &self.values[range])
    }

    /// Number of values owned by each event
    pub fn counts(&self) -> Vec<usize> {
        self.offsets.counts()
    }

    /// Apply a function to every value, preserving the jagged structure
    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Jagged<U> {
        Jagged {
            offsets: self.offsets.clone(),
            values: self.values.iter().map(f).collect(),
        }
    }

    /// Combine two jagged sequences of identical structure value by value
    pub fn zip_with<U, V>(&self, other: &Jagged<U>, mut f: impl FnMut(&T, &U) -> V) -> Jagged<V> {
        assert_eq!(
            self.offsets, other.offsets,
            "Jagged operands must share their event structure"
        );
        Jagged {
            offsets: self.offsets.clone(),
            values: self
                .values
                .iter()
                .zip(&other.values)
                .map(|(a, b)| f(a, b))
                .collect(),
        }
    }
}
//
impl<T: Clone> Jagged<T> {
    /// Broadcast one value per event against a given event structure
    pub fn broadcast(offsets: &Offsets, per_event: &[T]) -> Self {
        assert_eq!(
            offsets.num_events(),
            per_event.len(),
            "Broadcast source must hold one value per event"
        );
        let mut values = Vec::with_capacity(offsets.num_objects());
        for (range, value) in offsets.ranges().zip(per_event) {
            values.extend(std::iter::repeat(value.clone()).take(range.len()));
        }
        Self {
            offsets: offsets.clone(),
            values,
        }
    }

    /// Select a subset of events (in the given order)
    pub fn take_events(&self, events: &[usize]) -> Self {
        let (offsets, flat) = self.offsets.take(events);
        let values = flat.into_iter().map(|idx| self.values[idx].clone()).collect();
        Self { offsets, values }
    }
}

/// Per-object boolean decision, one boolean per object of a collection
pub type Mask = Jagged<bool>;
//
impl Mask {
    /// Mask where every object gets the same decision
    pub fn full(offsets: &Offsets, value: bool) -> Self {
        Self::new(offsets.clone(), vec![value; offsets.num_objects()])
    }

    /// Logical AND of two masks over the same collection
    pub fn and(&self, other: &Mask) -> Mask {
        self.zip_with(other, |&a, &b| a && b)
    }

    /// In-place logical AND with another mask over the same collection
    pub fn and_assign(&mut self, other: &Mask) {
        assert_eq!(
            self.offsets, other.offsets,
            "Masks must share their event structure"
        );
        for (a, &b) in self.values.iter_mut().zip(&other.values) {
            *a &= b;
        }
    }

    /// Number of selected objects in each event
    pub fn count_true(&self) -> Vec<usize> {
        self.iter_events()
            .map(|event| event.iter().filter(|&&keep| keep).count())
            .collect()
    }

    /// Arena indices of the selected objects, in arena order
    pub fn selected_indices(&self) -> Vec<usize> {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(idx, &keep)| keep.then_some(idx))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_from_counts() {
        let offsets = Offsets::from_counts([2, 0, 3]);
        assert_eq!(offsets.as_slice(), &[0, 2, 2, 5]);
        assert_eq!(offsets.num_events(), 3);
        assert_eq!(offsets.num_objects(), 5);
        assert_eq!(offsets.range(2), 2..5);
        assert_eq!(offsets.counts(), vec![2, 0, 3]);
    }

    #[test]
    fn empty_table_has_no_events() {
        let offsets = Offsets::from_counts(std::iter::empty());
        assert_eq!(offsets.num_events(), 0);
        assert_eq!(offsets.num_objects(), 0);
    }

    #[test]
    fn take_reorders_events() {
        let jagged = Jagged::from_nested(vec![vec![1, 2], vec![], vec![3, 4, 5]]);
        let subset = jagged.take_events(&[2, 0]);
        assert_eq!(subset.counts(), vec![3, 2]);
        assert_eq!(subset.values(), &[3, 4, 5, 1, 2]);
    }

    #[test]
    fn broadcast_matches_structure() {
        let offsets = Offsets::from_counts([1, 0, 2]);
        let broadcast = Jagged::broadcast(&offsets, &[7, 8, 9]);
        assert_eq!(broadcast.values(), &[7, 9, 9]);
    }

    #[test]
    fn mask_operations() {
        let a = Mask::from_nested(vec![vec![true, false], vec![], vec![true]]);
        let b = Mask::from_nested(vec![vec![true, true], vec![], vec![false]]);
        let both = a.and(&b);
        assert_eq!(both.values(), &[true, false, false]);
        assert_eq!(a.count_true(), vec![1, 0, 1]);
        assert_eq!(a.selected_indices(), vec![0, 2]);
    }

    #[test]
    #[should_panic]
    fn mismatched_masks_are_rejected() {
        let a = Mask::from_nested(vec![vec![true], vec![]]);
        let b = Mask::from_nested(vec![vec![], vec![true]]);
        a.and(&b);
    }

    #[test]
    fn concat_offsets() {
        let a = Offsets::from_counts([1, 2]);
        let b = Offsets::from_counts([0, 3]);
        assert_eq!(Offsets::concat([&a, &b]).counts(), vec![1, 2, 0, 3]);
    }
}
