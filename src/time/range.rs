use crate::foundation::rational::Rational;

/// An immutable half-open interval `[in, out)` on the rational time axis.
///
/// The constructor normalizes a reversed pair by swapping, so `in <= out`
/// always holds. Equality and hashing are value-based, which lets a
/// `TimeRange` act as a map key for in-flight render jobs.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
pub struct TimeRange {
    in_time: Rational,
    out_time: Rational,
}

impl TimeRange {
    /// Construct a range, swapping the endpoints if `out < in`.
    pub fn new(in_time: Rational, out_time: Rational) -> TimeRange {
        if out_time < in_time {
            TimeRange {
                in_time: out_time,
                out_time: in_time,
            }
        } else {
            TimeRange { in_time, out_time }
        }
    }

    /// A zero-length range at `time`.
    pub fn at(time: Rational) -> TimeRange {
        TimeRange {
            in_time: time,
            out_time: time,
        }
    }

    /// Inclusive lower bound.
    pub fn in_time(self) -> Rational {
        self.in_time
    }

    /// Exclusive upper bound.
    pub fn out_time(self) -> Rational {
        self.out_time
    }

    /// `out - in`.
    pub fn length(self) -> Rational {
        self.out_time - self.in_time
    }

    /// True iff `in == out`.
    pub fn is_empty(self) -> bool {
        self.in_time == self.out_time
    }

    /// Boundary-sensitive overlap test.
    ///
    /// With both flags `false` this is the strict half-open overlap test:
    /// ranges that merely touch do not overlap. Setting a flag makes the
    /// corresponding bound inclusive, so touching at that bound counts.
    /// Callers use the inclusive variant when looking for abutting ranges to
    /// merge, and the strict variant when probing for actual shared time.
    pub fn overlaps_with(self, other: TimeRange, in_inclusive: bool, out_inclusive: bool) -> bool {
        let ends_before = if in_inclusive {
            other.out_time < self.in_time
        } else {
            other.out_time <= self.in_time
        };

        let starts_after = if out_inclusive {
            other.in_time > self.out_time
        } else {
            other.in_time >= self.out_time
        };

        !(ends_before || starts_after)
    }

    /// Strict half-open overlap: the ranges share at least one instant.
    pub fn overlaps(self, other: TimeRange) -> bool {
        self.overlaps_with(other, false, false)
    }

    /// Overlap or exact adjacency; used when unioning ranges.
    pub fn overlaps_or_touches(self, other: TimeRange) -> bool {
        self.overlaps_with(other, true, true)
    }

    /// Boundary-sensitive containment of `other` within `self`.
    pub fn contains_range(self, other: TimeRange, in_inclusive: bool, out_inclusive: bool) -> bool {
        let contains_in = if in_inclusive {
            other.in_time >= self.in_time
        } else {
            other.in_time > self.in_time
        };

        let contains_out = if out_inclusive {
            other.out_time <= self.out_time
        } else {
            other.out_time < self.out_time
        };

        contains_in && contains_out
    }

    /// Smallest range covering both `a` and `b`.
    pub fn combine(a: TimeRange, b: TimeRange) -> TimeRange {
        TimeRange {
            in_time: a.in_time.min(b.in_time),
            out_time: a.out_time.max(b.out_time),
        }
    }

    /// Smallest range covering `self` and `other`.
    pub fn combined_with(self, other: TimeRange) -> TimeRange {
        TimeRange::combine(self, other)
    }
}
