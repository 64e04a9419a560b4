//! Slice - Composable Range Expressions
//!
//! Provides `Slice`, an abstract `(start, stop, step)` range that is
//! independent of any buffer. Slices can be composed ("take `over` of
//! `base`") and regulated against a concrete dimension, which resolves
//! negative indices, clamps open ends and computes a definite length.
//!
//! Negative indices count from the end, Python style. An open stop runs to
//! the end of the dimension in the direction of the step. A slice that
//! cannot be made consistent is the NULL slice; callers check `is_null`.
//!
//! # Key Features
//! - Tagged endpoints instead of reserved sentinel integers
//! - Eager length computation when the endpoints allow it
//! - Idempotent regulation against a dimension
//! - Composition relative to the base's selected elements
//!
//! # Example
//! ```rust
//! use lamina_view::{Bound, Slice};
//!
//! let s = Slice::make(-3, Bound::At(-9), -1).regulate(9);
//! assert_eq!((s.start(), s.stop(), s.len()), (6, Bound::At(0), Some(6)));
//! ```
//!
//! @version 0.1.0
//! @author `AutomataNexus` Development Team

// =============================================================================
// Endpoints
// =============================================================================

/// Stop endpoint of a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bound {
    /// A definite index, possibly negative (counted from the end).
    At(isize),
    /// Open: runs past the last element in the direction of the step.
    Open,
}

/// Position of an index after mapping it through a slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mapped {
    At(isize),
    /// Past every element on the positive side.
    PlusInf,
    /// Past every element on the negative side.
    MinusInf,
    Undefined,
}

fn same_sign(x: isize, y: isize) -> bool {
    (x >= 0) == (y >= 0)
}

/// `stop - start` points the way `step` does (equal endpoints count as
/// forward).
fn same_diff_sign(stop: isize, start: isize, step: isize) -> bool {
    (stop >= start && step >= 0) || (stop < start && step < 0)
}

/// Endpoints on opposite sides of zero whose direction only a dimension can
/// settle.
fn ambiguous_dir(start: isize, stop: isize) -> bool {
    (start < -1 && stop > 0) || (start > 0 && stop < -1)
}

/// Number of steps from `start` up to (excluding) `stop`; `step` must point
/// from `start` towards `stop`.
fn steps_between(start: isize, stop: isize, step: isize) -> usize {
    let span = stop.abs_diff(start);
    let step = step.unsigned_abs();
    span / step + usize::from(span % step != 0)
}

/// `base + step * k`, or `None` when it leaves the `isize` range.
fn offset(base: isize, step: isize, k: isize) -> Option<isize> {
    step.checked_mul(k).and_then(|o| base.checked_add(o))
}

/// Canonical stop `start + step * len`, where `None` means it is not
/// representable.
fn canonical_stop(start: isize, step: isize, len: usize) -> Option<isize> {
    isize::try_from(len).ok().and_then(|len| offset(start, step, len))
}

/// Past every element in the direction of `step`.
fn beyond(step: isize) -> Mapped {
    if step >= 0 {
        Mapped::PlusInf
    } else {
        Mapped::MinusInf
    }
}

/// Before every element, against the direction of `step`.
fn before(step: isize) -> Mapped {
    if step >= 0 {
        Mapped::MinusInf
    } else {
        Mapped::PlusInf
    }
}

// =============================================================================
// Slice Struct
// =============================================================================

/// An abstract `(start, stop, step)` range expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slice {
    start: isize,
    stop: Bound,
    step: isize,
    len: Option<usize>,
}

impl Default for Slice {
    fn default() -> Self {
        Self::NONE
    }
}

impl Slice {
    /// The empty/invalid slice.
    pub const NULL: Self = Self {
        start: 0,
        stop: Bound::At(0),
        step: 0,
        len: Some(0),
    };

    /// The identity slice: everything, forward, length unresolved.
    pub const NONE: Self = Self {
        start: 0,
        stop: Bound::Open,
        step: 1,
        len: None,
    };

    /// Builds a slice, or the NULL slice if the triple is inconsistent.
    ///
    /// Equal endpoints and a zero step are inconsistent. Definite endpoints
    /// must agree with the step's direction unless they sit on opposite
    /// sides of zero (e.g. `(-3, 2, 1)`), which only a dimension can settle.
    /// The length is computed eagerly when the endpoints have the same sign
    /// or when an open stop makes the count inferable.
    ///
    /// # Arguments
    /// * `start` - First index, negative counts from the end
    /// * `stop` - Exclusive stop
    /// * `step` - Nonzero stride
    #[must_use]
    pub fn make(start: isize, stop: Bound, step: isize) -> Self {
        if step == 0 {
            return Self::NULL;
        }
        match stop {
            Bound::At(stop) => {
                if stop == start
                    || !(same_diff_sign(stop, start, step) || ambiguous_dir(start, stop))
                {
                    return Self::NULL;
                }
                if !same_sign(start, stop) {
                    return Self {
                        start,
                        stop: Bound::At(stop),
                        step,
                        len: None,
                    };
                }
                let len = steps_between(start, stop, step);
                // A canonical stop that crosses zero or overflows would
                // change meaning.
                let stop = match canonical_stop(start, step, len) {
                    Some(canonical) if same_sign(canonical, start) => Bound::At(canonical),
                    _ => Bound::Open,
                };
                Self {
                    start,
                    stop,
                    step,
                    len: Some(len),
                }
            }
            Bound::Open => {
                let len = if step > 0 && start < 0 {
                    Some(steps_between(start, 0, step))
                } else if step < 0 && start >= 0 {
                    Some(steps_between(start, -1, step))
                } else {
                    None
                };
                Self {
                    start,
                    stop: Bound::Open,
                    step,
                    len,
                }
            }
        }
    }

    /// Shorthand for `make(start, Bound::At(stop), step)`.
    #[must_use]
    pub fn range(start: isize, stop: isize, step: isize) -> Self {
        Self::make(start, Bound::At(stop), step)
    }

    /// Shorthand for `make(start, Bound::Open, step)`.
    #[must_use]
    pub fn from(start: isize, step: isize) -> Self {
        Self::make(start, Bound::Open, step)
    }

    /// Resolves a raw triple against a dimension without first validating
    /// it as a free-standing slice.
    ///
    /// Negative endpoints are offset by `dim` once, then clamped exactly as
    /// [`Slice::regulate`] does. This is the entry point for deriving views,
    /// where `(2, -1, 1)` means "from 2 up to the last element".
    #[must_use]
    pub fn resolve(start: isize, stop: Bound, step: isize, dim: usize) -> Self {
        if step == 0 {
            return Self::NULL;
        }
        Self::regulate_raw(start, stop, step, dim)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// First index.
    #[must_use]
    pub const fn start(&self) -> isize {
        self.start
    }

    /// Exclusive stop.
    #[must_use]
    pub const fn stop(&self) -> Bound {
        self.stop
    }

    /// Stride between selected indices.
    #[must_use]
    pub const fn step(&self) -> isize {
        self.step
    }

    /// Number of selected indices, if resolved.
    #[must_use]
    pub const fn len(&self) -> Option<usize> {
        self.len
    }

    /// Returns true if the slice selects nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == Some(0)
    }

    /// Returns true for the NULL slice.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        self.step == 0
    }

    /// Returns true for the identity slice.
    #[must_use]
    pub fn is_none(&self) -> bool {
        *self == Self::NONE
    }

    /// Returns true for the NULL slice or a consistent triple.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        if self.is_null() {
            return *self == Self::NULL;
        }
        match self.stop {
            Bound::Open => true,
            Bound::At(stop) => {
                stop != self.start
                    && (same_diff_sign(stop, self.start, self.step)
                        || ambiguous_dir(self.start, stop))
            }
        }
    }

    /// Returns true once a definite, nonnegative-start form with a known
    /// length has been computed.
    #[must_use]
    pub fn is_regulated(&self) -> bool {
        !self.is_null() && self.start >= 0 && self.len.is_some()
    }

    // =========================================================================
    // Regulation
    // =========================================================================

    /// Resolves the slice against a dimension of length `dim`.
    ///
    /// Negative indices are offset by `dim`, open stops become the
    /// dimension's end in the step's direction, forward slices clamp
    /// `start` up to 0 and `stop` down to `dim`, backward slices clamp
    /// `start` down to `dim - 1` and `stop` up to -1. Whatever is still out
    /// of range, points the wrong way or selects nothing becomes NULL.
    ///
    /// Afterwards `stop == start + step * len`. A backward slice that runs
    /// through index 0, or a stop beyond `isize::MAX`, is kept open, so that
    /// regulating again yields the same slice.
    #[must_use]
    pub fn regulate(&self, dim: usize) -> Self {
        if self.is_null() {
            return Self::NULL;
        }
        Self::regulate_raw(self.start, self.stop, self.step, dim)
    }

    fn regulate_raw(start: isize, stop: Bound, step: isize, dim: usize) -> Self {
        let Ok(d) = isize::try_from(dim) else {
            return Self::NULL;
        };
        if d == 0 {
            return Self::NULL;
        }

        let mut start = if start < 0 { start + d } else { start };
        let mut stop = match stop {
            Bound::At(s) if s < 0 => s + d,
            Bound::At(s) => s,
            Bound::Open if step > 0 => d,
            Bound::Open => -1,
        };

        if step > 0 {
            start = start.max(0);
            stop = stop.min(d);
        } else {
            start = start.min(d - 1);
            stop = stop.max(-1);
        }

        if start < 0 || start >= d || stop < -1 || stop > d || !same_diff_sign(stop, start, step)
        {
            return Self::NULL;
        }

        let len = steps_between(start, stop, step);
        if len == 0 {
            return Self::NULL;
        }
        Self {
            start,
            stop: match canonical_stop(start, step, len) {
                Some(canonical) if canonical >= 0 => Bound::At(canonical),
                _ => Bound::Open,
            },
            step,
            len: Some(len),
        }
    }

    // =========================================================================
    // Indexing
    // =========================================================================

    /// Maps an ordinal position within this slice to an index in the outer
    /// frame.
    ///
    /// Negative ordinals count from the end. Returns `None` when the length
    /// is unresolved or the ordinal is out of range.
    #[must_use]
    pub fn index_of(&self, ordinal: isize) -> Option<isize> {
        let len = isize::try_from(self.len?).ok()?;
        if self.is_null() || ordinal >= len || ordinal < -len {
            return None;
        }
        let ordinal = if ordinal < 0 { ordinal + len } else { ordinal };
        offset(self.start, self.step, ordinal)
    }

    /// Like [`Slice::index_of`], but also accepts an open ordinal, which
    /// maps to the slice's own stop.
    ///
    /// ```rust
    /// use lamina_view::{Bound, Slice};
    ///
    /// let s = Slice::range(1, 8, 2);
    /// assert_eq!(s.index_of_bound(Bound::Open), Some(Bound::At(9)));
    /// assert_eq!(s.index_of_bound(Bound::At(-1)), Some(Bound::At(7)));
    /// ```
    #[must_use]
    pub fn index_of_bound(&self, ordinal: Bound) -> Option<Bound> {
        match ordinal {
            _ if self.is_null() => None,
            Bound::Open => Some(self.stop),
            Bound::At(ordinal) => self.index_of(ordinal).map(Bound::At),
        }
    }

    /// Iterates over the outer-frame indices a resolved slice selects.
    ///
    /// Yields nothing while the length is unresolved.
    pub fn positions(&self) -> impl Iterator<Item = isize> {
        let (start, step) = (self.start, self.step);
        let len = isize::try_from(self.len.unwrap_or(0)).unwrap_or(isize::MAX);
        (0..len).map(move |k| start.wrapping_add(step.wrapping_mul(k)))
    }

    /// Maps a position (or an open end) of this slice's frame to the outer
    /// frame.
    fn map(&self, point: Mapped) -> Mapped {
        let (start, step) = (self.start, self.step);
        let len = self.len.map(|l| isize::try_from(l).unwrap_or(isize::MAX));

        let i = match point {
            Mapped::Undefined => return Mapped::Undefined,
            Mapped::PlusInf => return self.stop_point(),
            Mapped::MinusInf => {
                // One step before the first element.
                return match start.checked_sub(step) {
                    Some(index) if same_sign(index, start) => Mapped::At(index),
                    _ => before(step),
                };
            }
            Mapped::At(i) => i,
        };

        if i >= 0 {
            if len.is_some_and(|l| i >= l) {
                return beyond(step);
            }
            return match offset(start, step, i) {
                Some(index) if same_sign(index, start) => Mapped::At(index),
                Some(_) => Mapped::Undefined,
                None => beyond(step),
            };
        }

        let at_or_before = |index: Option<isize>| index.map_or(before(step), Mapped::At);
        match (len, self.stop) {
            (Some(l), _) if i >= -l => {
                offset(start, step, l + i).map_or(beyond(step), Mapped::At)
            }
            (Some(_), _) => before(step),
            (None, Bound::At(stop)) => match offset(stop, step, i) {
                Some(index) if same_sign(index, stop) => Mapped::At(index),
                Some(_) => Mapped::Undefined,
                None => before(step),
            },
            (None, Bound::Open) if step > 0 => at_or_before(step.checked_mul(i)),
            (None, Bound::Open) => at_or_before(offset(-1, step, i)),
        }
    }

    fn stop_point(&self) -> Mapped {
        match self.stop {
            Bound::At(stop) => Mapped::At(stop),
            Bound::Open if self.step > 0 => Mapped::PlusInf,
            Bound::Open => Mapped::MinusInf,
        }
    }

    // =========================================================================
    // Composition
    // =========================================================================

    /// Composes "take `over` of `base`" into one slice.
    ///
    /// `over`'s indices address `base`'s already-selected elements, so
    /// applying the result to an array selects the same elements as
    /// applying `base` and then `over`. When `base`'s length is known,
    /// `over` is regulated against it first. Open ends of `over` that map
    /// past `base`'s extent are cut back to `base`'s own bounds.
    #[must_use]
    pub fn combine(base: &Self, over: &Self) -> Self {
        if base.is_null() || over.is_null() {
            return Self::NULL;
        }
        let Some(step) = base.step.checked_mul(over.step) else {
            return Self::NULL;
        };

        let over = match base.len {
            Some(len) => over.regulate(len),
            None => *over,
        };
        if over.is_null() {
            return Self::NULL;
        }

        let mut start = base.map(Mapped::At(over.start));
        let mut stop = base.map(over.stop_point());

        let forward = base.step >= 0;
        if (stop == Mapped::PlusInf && forward) || (stop == Mapped::MinusInf && !forward) {
            stop = base.stop_point();
        }
        if (start == Mapped::MinusInf && forward) || (start == Mapped::PlusInf && !forward) {
            start = Mapped::At(base.start);
        }

        let Mapped::At(start) = start else {
            return Self::NULL;
        };
        let stop = match stop {
            Mapped::At(stop) => Bound::At(stop),
            Mapped::PlusInf if step > 0 => Bound::Open,
            Mapped::MinusInf if step < 0 => Bound::Open,
            _ => return Self::NULL,
        };
        Self::make(start, stop, step)
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn select(s: &Slice, items: &[isize]) -> Vec<isize> {
        let r = s.regulate(items.len());
        r.positions().map(|p| items[p as usize]).collect()
    }

    #[test]
    fn test_make_lengths() {
        let s = Slice::range(1, 8, 2);
        assert_eq!((s.start(), s.stop(), s.step(), s.len()), (1, Bound::At(9), 2, Some(4)));

        assert_eq!(Slice::from(-5, 2).len(), Some(3));
        assert_eq!(Slice::from(4, -1).len(), Some(5));
        assert_eq!(Slice::from(4, 1).len(), None);
        assert_eq!(Slice::range(-3, 2, 1).len(), None);
    }

    #[test]
    fn test_make_rejects_inconsistent() {
        assert!(Slice::range(3, 3, 1).is_null());
        assert!(Slice::range(1, 5, 0).is_null());
        assert!(Slice::range(5, 1, 1).is_null());
        assert!(Slice::range(1, 5, -1).is_null());
        assert!(Slice::range(2, -1, 1).is_null());
        assert!(!Slice::range(2, -2, 1).is_null());
        assert!(Slice::NULL.is_valid());
        assert!(Slice::NONE.is_valid());
    }

    #[test]
    fn test_make_crossing_canonical_stop() {
        let s = Slice::range(-5, -1, 3);
        assert_eq!(s.stop(), Bound::Open);
        assert_eq!(select(&s, &(0..10).collect::<Vec<_>>()), vec![5, 8]);

        let s = Slice::range(3, 0, -2);
        assert_eq!(s.stop(), Bound::Open);
        assert_eq!(s.len(), Some(2));
    }

    #[test]
    fn test_regulate_backward() {
        let s = Slice::range(-3, -9, -1).regulate(9);
        assert_eq!(s.start(), 6);
        assert_eq!(s.stop(), Bound::At(0));
        assert_eq!(s.len(), Some(6));
        assert_eq!(s.positions().collect::<Vec<_>>(), vec![6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_regulate_clamps_and_nulls() {
        let s = Slice::NONE.regulate(5);
        assert_eq!((s.start(), s.stop(), s.len()), (0, Bound::At(5), Some(5)));

        let s = Slice::from(-1, -1).regulate(4);
        assert_eq!((s.start(), s.stop(), s.len()), (3, Bound::Open, Some(4)));

        assert!(Slice::range(7, 9, 1).regulate(5).is_null());
        assert!(Slice::NONE.regulate(0).is_null());
        // (-3, 2) is forward on 4 elements and backward-inconsistent on 10.
        assert_eq!(Slice::range(-3, 2, 1).regulate(4).len(), Some(1));
        assert!(Slice::range(-3, 2, 1).regulate(10).is_null());
    }

    #[test]
    fn test_regulate_idempotent_examples() {
        for s in [
            Slice::range(-3, -9, -1),
            Slice::from(-1, -3),
            Slice::range(0, 7, 3),
            Slice::NONE,
        ] {
            let once = s.regulate(9);
            assert_eq!(once.regulate(9), once);
        }
    }

    #[test]
    fn test_resolve_allows_negative_stop() {
        let s = Slice::resolve(2, Bound::At(-1), 1, 6);
        assert_eq!(s.positions().collect::<Vec<_>>(), vec![2, 3, 4]);
        assert!(Slice::resolve(2, Bound::At(2), 1, 6).is_null());
        assert!(Slice::resolve(0, Bound::Open, 0, 6).is_null());
    }

    #[test]
    fn test_index_of() {
        let s = Slice::range(1, 8, 2);
        assert_eq!(s.index_of(0), Some(1));
        assert_eq!(s.index_of(3), Some(7));
        assert_eq!(s.index_of(-1), Some(7));
        assert_eq!(s.index_of(-4), Some(1));
        assert_eq!(s.index_of(4), None);
        assert_eq!(s.index_of(-5), None);
        assert_eq!(Slice::NONE.index_of(0), None);
    }

    #[test]
    fn test_index_of_bound() {
        let s = Slice::range(1, 8, 2);
        assert_eq!(s.index_of_bound(Bound::Open), Some(Bound::At(9)));
        assert_eq!(s.index_of_bound(Bound::At(2)), Some(Bound::At(5)));
        assert_eq!(s.index_of_bound(Bound::At(4)), None);

        let back = Slice::from(3, -1).regulate(4);
        assert_eq!(back.index_of_bound(Bound::Open), Some(Bound::Open));
        assert_eq!(back.index_of_bound(Bound::At(-1)), Some(Bound::At(0)));
        assert_eq!(Slice::NULL.index_of_bound(Bound::Open), None);
    }

    #[test]
    fn test_extreme_endpoints() {
        let s = Slice::range(0, isize::MAX, 2);
        assert_eq!(s.stop(), Bound::Open);
        assert_eq!(s.len(), Some((isize::MAX as usize).div_ceil(2)));
        assert_eq!(s.index_of(-1), Some(isize::MAX - 1));
        assert_eq!(s.regulate(10).positions().collect::<Vec<_>>(), vec![0, 2, 4, 6, 8]);

        let s = Slice::range(-1, isize::MIN, -3);
        assert_eq!(s.stop(), Bound::Open);
        assert_eq!(s.regulate(7).positions().collect::<Vec<_>>(), vec![6, 3, 0]);

        let s = Slice::from(isize::MIN, 1);
        assert_eq!(s.len(), Some(isize::MAX as usize + 1));
        assert_eq!(s.regulate(3).len(), Some(3));

        let s = Slice::resolve(0, Bound::At(isize::MAX), 2, 10);
        assert_eq!((s.start(), s.stop(), s.len()), (0, Bound::At(10), Some(5)));
        let s = Slice::resolve(5, Bound::Open, isize::MAX, 10);
        assert_eq!((s.stop(), s.len()), (Bound::Open, Some(1)));
        assert_eq!(s.regulate(10), s);

        assert!(Slice::combine(&Slice::from(0, isize::MAX), &Slice::from(0, 2)).is_null());
        let far = Slice::combine(&Slice::from(0, 2), &Slice::range(0, isize::MAX, 1));
        assert_eq!(far.regulate(7).positions().collect::<Vec<_>>(), vec![0, 2, 4, 6]);
    }

    #[test]
    fn test_combine_with_none_is_identity() {
        let base = Slice::range(1, 8, 2);
        assert_eq!(Slice::combine(&base, &Slice::NONE), base);
        assert_eq!(Slice::combine(&Slice::NONE, &base), base);
        assert!(Slice::combine(&Slice::NULL, &base).is_null());
    }

    #[test]
    fn test_combine_reverse() {
        let items: Vec<isize> = (0..10).collect();
        let base = Slice::range(1, 8, 2);
        let rev = Slice::from(-1, -1);

        let combined = Slice::combine(&base, &rev);
        assert_eq!(select(&combined, &items), vec![7, 5, 3, 1]);

        let twice = Slice::combine(&rev, &rev);
        assert_eq!(twice, Slice::NONE);
    }

    #[test]
    fn test_combine_matches_sequential() {
        let items: Vec<isize> = (0..12).collect();
        let base = Slice::range(-3, -12, -2).regulate(items.len());
        let over = Slice::range(1, 4, 1);

        let first = select(&base, &items);
        let expected = select(&over, &first);
        assert_eq!(select(&Slice::combine(&base, &over), &items), expected);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn slice_strategy() -> impl Strategy<Value = Slice> {
            (-12_isize..12, prop::option::of(-14_isize..14), -4_isize..=4)
                .prop_filter("nonzero step", |(_, _, step)| *step != 0)
                .prop_map(|(start, stop, step)| {
                    Slice::make(start, stop.map_or(Bound::Open, Bound::At), step)
                })
        }

        fn apply(s: &Slice, items: &[isize]) -> Vec<isize> {
            if items.is_empty() || s.is_null() {
                return Vec::new();
            }
            select(s, items)
        }

        proptest! {
            #[test]
            fn regulate_is_idempotent(s in slice_strategy(), dim in 0_usize..16) {
                let once = s.regulate(dim);
                prop_assert_eq!(once.regulate(dim), once);
            }

            #[test]
            fn combine_matches_sequential_application(
                a in slice_strategy(),
                b in slice_strategy(),
                dim in 1_usize..16,
            ) {
                let items: Vec<isize> = (0..dim as isize).collect();
                let base = a.regulate(dim);
                let expected = apply(&b, &apply(&base, &items));
                let combined = Slice::combine(&base, &b).regulate(dim);
                prop_assert_eq!(apply(&combined, &items), expected);
            }

            #[test]
            fn combine_is_associative(
                a in slice_strategy(),
                b in slice_strategy(),
                c in slice_strategy(),
                dim in 1_usize..16,
            ) {
                let items: Vec<isize> = (0..dim as isize).collect();
                let a = a.regulate(dim);
                let inner_dim = a.len().unwrap_or(0);

                let left = Slice::combine(&Slice::combine(&a, &b).regulate(dim), &c).regulate(dim);
                let bc = Slice::combine(&b.regulate(inner_dim), &c).regulate(inner_dim);
                let right = Slice::combine(&a, &bc).regulate(dim);

                let expected = apply(&c, &apply(&b, &apply(&a, &items)));
                prop_assert_eq!(apply(&left, &items), expected.clone());
                prop_assert_eq!(apply(&right, &items), expected);
            }
        }
    }
}
