/// Index and value of the largest element, the lowest index winning ties
///
/// A NaN never displaces an earlier number. **Returns** `None` for an empty slice.
pub(crate) fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (i, v)| match best {
            Some((_, b)) if !(v > b || b.is_nan()) => best,
            _ => Some((i, v)),
        })
}
