use crate::time::range::TimeRange;

/// A set of disjoint time ranges, kept sorted and adjacency-merged.
///
/// This is the algebra underlying every invalidation and queueing decision:
/// the pending-invalidation set and the dispatchable queue are both
/// `TimeRangeList`s. Invariant: entries are sorted ascending by their in
/// point and no two entries overlap or touch (abutting entries are merged on
/// insert). All operations are single linear passes over the sorted
/// representation.
///
/// A list instance is owned by exactly one component and is not safe for
/// concurrent mutation.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct TimeRangeList {
    ranges: Vec<TimeRange>,
}

impl TimeRangeList {
    /// Create an empty list.
    pub fn new() -> TimeRangeList {
        TimeRangeList::default()
    }

    /// Union `range` into the set, merging any overlapping or touching
    /// entries. Inserting an empty range is a no-op.
    pub fn insert(&mut self, range: TimeRange) {
        if range.is_empty() {
            return;
        }

        let mut merged = range;
        let mut out = Vec::with_capacity(self.ranges.len() + 1);
        let mut placed = false;

        for &existing in &self.ranges {
            if existing.overlaps_or_touches(merged) {
                merged = merged.combined_with(existing);
            } else if existing.out_time() < merged.in_time() {
                out.push(existing);
            } else {
                if !placed {
                    out.push(merged);
                    placed = true;
                }
                out.push(existing);
            }
        }

        if !placed {
            out.push(merged);
        }

        self.ranges = out;
    }

    /// Subtract `range` from the set. Entries may be deleted, shrunk, or
    /// split in two; afterwards no remaining entry overlaps `range`.
    pub fn remove(&mut self, range: TimeRange) {
        if range.is_empty() {
            return;
        }

        let mut out = Vec::with_capacity(self.ranges.len() + 1);

        for &existing in &self.ranges {
            if !existing.overlaps(range) {
                out.push(existing);
                continue;
            }

            if existing.in_time() < range.in_time() {
                out.push(TimeRange::new(existing.in_time(), range.in_time()));
            }
            if existing.out_time() > range.out_time() {
                out.push(TimeRange::new(range.out_time(), existing.out_time()));
            }
        }

        self.ranges = out;
    }

    /// The portion of the set overlapping `range`, each entry clipped to
    /// `range`'s bounds.
    pub fn intersects(&self, range: TimeRange) -> TimeRangeList {
        let mut clipped = Vec::new();

        for &existing in &self.ranges {
            if existing.overlaps(range) {
                clipped.push(TimeRange::new(
                    existing.in_time().max(range.in_time()),
                    existing.out_time().min(range.out_time()),
                ));
            }
        }

        TimeRangeList { ranges: clipped }
    }

    /// True iff some single entry contains `range` under the given
    /// inclusivity flags. Because entries are fully merged, a covered range
    /// is always covered by exactly one entry.
    pub fn contains_range(
        &self,
        range: TimeRange,
        in_inclusive: bool,
        out_inclusive: bool,
    ) -> bool {
        self.ranges
            .iter()
            .any(|r| r.contains_range(range, in_inclusive, out_inclusive))
    }

    /// True iff some entry overlaps `range` under the given inclusivity
    /// flags (the flags distinguish "touches" from "overlaps").
    pub fn overlaps_with(&self, range: TimeRange, in_inclusive: bool, out_inclusive: bool) -> bool {
        self.ranges
            .iter()
            .any(|r| r.overlaps_with(range, in_inclusive, out_inclusive))
    }

    /// Iterate entries in ascending order.
    pub fn iter(&self) -> std::slice::Iter<'_, TimeRange> {
        self.ranges.iter()
    }

    /// Number of disjoint entries.
    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    /// True iff the set covers nothing.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&mut self) {
        self.ranges.clear();
    }
}

impl<'a> IntoIterator for &'a TimeRangeList {
    type Item = &'a TimeRange;
    type IntoIter = std::slice::Iter<'a, TimeRange>;

    fn into_iter(self) -> Self::IntoIter {
        self.ranges.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/time/range_list.rs"]
mod tests;
