//! Axis normalization and the shape-collapse rule shared by reductions.
use crate::internal::*;
use itertools::Itertools;

/// Normalize a possibly negative axis (-1 is the last axis) against `rank`.
pub fn resolve_axis(axis: i64, rank: usize) -> MilResult<usize> {
    if 0 <= axis && (axis as usize) < rank {
        Ok(axis as usize)
    } else if -(rank as i64) <= axis && axis < 0 {
        Ok((axis + rank as i64) as usize)
    } else {
        bail!("Illegal combination of values for rank and axis: {} and {}", rank, axis)
    }
}

/// Normalize a list of axes. Order is preserved, duplicates (after
/// normalization) are rejected.
pub fn resolve_axes(axes: &[i64], rank: usize) -> MilResult<TVec<usize>> {
    let resolved =
        axes.iter().map(|&axis| resolve_axis(axis, rank)).collect::<MilResult<TVec<usize>>>()?;
    if let Some(dup) = resolved.iter().duplicates().next() {
        bail!("Axis {} is reduced more than once in {:?} (rank {})", dup, axes, rank)
    }
    Ok(resolved)
}

/// Output shape of a reduction over normalized `axes`.
///
/// With `keep_dims` reduced axes become 1. Without, they are removed, highest
/// index first so that pending indices stay valid.
pub fn reduced_shape(shape: &[usize], axes: &[usize], keep_dims: bool) -> TVec<usize> {
    let mut reduced: TVec<usize> = shape.into();
    if keep_dims {
        for &axis in axes {
            reduced[axis] = 1;
        }
    } else {
        for &axis in axes.iter().sorted().rev() {
            reduced.remove(axis);
        }
    }
    reduced
}

#[cfg(test)]
mod test {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn negative_axes() {
        assert_eq!(resolve_axis(-1, 3).unwrap(), 2);
        assert_eq!(resolve_axis(-3, 3).unwrap(), 0);
        assert!(resolve_axis(-4, 3).is_err());
        assert!(resolve_axis(3, 3).is_err());
        assert!(resolve_axis(0, 0).is_err());
    }

    #[test]
    fn duplicates_after_normalization() {
        assert!(resolve_axes(&[1, -2], 3).is_err());
        assert_eq!(&*resolve_axes(&[2, 0], 3).unwrap(), &[2, 0]);
    }

    #[test]
    fn collapse() {
        assert_eq!(&*reduced_shape(&[2, 3, 4], &[0, 2], false), &[3]);
        assert_eq!(&*reduced_shape(&[2, 3, 4], &[2, 0], false), &[3]);
        assert_eq!(&*reduced_shape(&[2, 3, 4], &[0, 2], true), &[1, 3, 1]);
        assert!(reduced_shape(&[5], &[0], false).is_empty());
    }

    fn shape_and_axes() -> impl Strategy<Value = (Vec<usize>, Vec<usize>)> {
        proptest::collection::vec(0usize..5, 1..6).prop_flat_map(|shape| {
            let rank = shape.len();
            let axes = proptest::sample::subsequence((0..rank).collect::<Vec<_>>(), 0..=rank)
                .prop_shuffle();
            (Just(shape), axes)
        })
    }

    // removing ascending while compensating for the already removed axes
    fn reduced_shape_ascending(shape: &[usize], axes: &[usize]) -> Vec<usize> {
        let mut sorted = axes.to_vec();
        sorted.sort();
        let mut reduced = shape.to_vec();
        for (removed, axis) in sorted.into_iter().enumerate() {
            reduced.remove(axis - removed);
        }
        reduced
    }

    proptest! {
        #[test]
        fn removal_order_does_not_matter((shape, axes) in shape_and_axes()) {
            let found = reduced_shape(&shape, &axes, false);
            prop_assert_eq!(found.to_vec(), reduced_shape_ascending(&shape, &axes));
            prop_assert_eq!(found.len(), shape.len() - axes.len());
        }

        #[test]
        fn keep_dims_preserves_rank((shape, axes) in shape_and_axes()) {
            let found = reduced_shape(&shape, &axes, true);
            prop_assert_eq!(found.len(), shape.len());
            for (ix, d) in found.iter().enumerate() {
                if axes.contains(&ix) {
                    prop_assert_eq!(*d, 1);
                } else {
                    prop_assert_eq!(*d, shape[ix]);
                }
            }
        }

        #[test]
        fn negative_axis_is_last_minus_k(rank in 1usize..8, k in 1usize..8) {
            prop_assume!(k <= rank);
            prop_assert_eq!(resolve_axis(-(k as i64), rank).unwrap(), rank - k);
        }
    }
}
