/*!
# Move-Selection Kernels

The numeric pieces of weighted random movement: the population imbalance
measure, the node weight function, and the bucket search over cumulative
weights.
*/

/// Base ideal load factor; the neighborhood imbalance shifts it by at most
/// plus or minus 0.5.
pub const BASE_ILF: f64 = 1.75;

const COEFF: f64 = 0.4;

/// Below this run length the bucket search switches from binary to linear.
const BINARY_THRESHOLD: usize = 4;

/// Imbalance between a local and a remote population count, in `[-1, 1]`.
///
/// Negative when the local count is larger, positive when the remote count
/// is larger, and 0 when both are empty.
pub fn imbalance(lcount: u32, rcount: u32) -> f64 {
    if lcount == 0 && rcount == 0 {
        return 0.0;
    }
    let sl = (lcount as f64).sqrt();
    let sr = (rcount as f64).sqrt();
    (sr - sl) / (sr + sl)
}

/// Weight of a node whose normalized population is `val` against the ideal
/// value `optval`. Positive and bounded; equals 1 exactly at the ideal.
pub fn mweight(val: f64, optval: f64) -> f64 {
    let arg = 1.0 + COEFF * (val - optval);
    let lg = arg.log2();
    1.0 / (1.0 + lg * lg)
}

/// Finds the least index whose cumulative weight exceeds `target`.
///
/// Binary search narrows the run until it is shorter than the linear cutoff,
/// then scans; the typical small-degree case never pays the branchy binary
/// phase. Returns `None` when no bucket holds the target, which callers must
/// treat as an internal error.
pub fn locate_value(target: f64, list: &[f64]) -> Option<usize> {
    if list.is_empty() {
        return None;
    }
    let mut left = 0;
    let mut right = list.len() - 1;
    while left < right {
        if right - left + 1 < BINARY_THRESHOLD {
            return list[left..=right]
                .iter()
                .position(|&w| target < w)
                .map(|i| left + i);
        }
        let mid = left + (right - left) / 2;
        if target < list[mid] {
            right = mid;
        } else {
            left = mid + 1;
        }
    }
    Some(right)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imbalance() {
        assert_eq!(imbalance(0, 0), 0.0);
        assert_eq!(imbalance(5, 5), 0.0);
        assert!((imbalance(1, 4) - 1.0 / 3.0).abs() < 1e-12);
        assert!((imbalance(4, 1) + 1.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_mweight_reference_values() {
        assert_eq!(mweight(1.5, 1.5), 1.0);
        assert!((mweight(2.0, 1.5) - 0.935_289_998_598_426_7).abs() < 1e-12);
        assert!((mweight(0.0, 2.25) - 0.083_089_560_558_005_32).abs() < 1e-12);
        assert!((mweight(10.0, 1.25) - 0.175_175_080_559_629_4).abs() < 1e-12);
    }

    #[test]
    fn test_mweight_positive_over_contract_range() {
        // Normalized counts from 0 upward against any ILF in [1.25, 2.25].
        for count in 0..200 {
            for ilf in [1.25, 1.75, 2.25] {
                let w = mweight(count as f64 / 10.0, ilf);
                assert!(w > 0.0 && w <= 1.0);
            }
        }
    }

    #[test]
    fn test_locate_value_linear_runs() {
        let cum = [0.25, 0.75, 1.0];
        assert_eq!(locate_value(0.0, &cum), Some(0));
        assert_eq!(locate_value(0.25, &cum), Some(1));
        assert_eq!(locate_value(0.9, &cum), Some(2));
        assert_eq!(locate_value(1.5, &cum), None);
        assert_eq!(locate_value(0.5, &[]), None);
    }

    #[test]
    fn test_locate_value_binary_runs() {
        let cum: Vec<f64> = (1..=64).map(|i| i as f64).collect();
        for i in 0..64 {
            assert_eq!(locate_value(i as f64 + 0.5, &cum), Some(i));
            assert_eq!(locate_value(i as f64, &cum), Some(i));
        }
    }
}
