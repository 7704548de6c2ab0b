/*!
# Small Statistics Helpers

Summary statistics over `f64` slices, used by the partitioner's weight-key
selection and the instrumentation report.
*/

/// Maximum of a set of elements, treating the empty set as 0.
pub fn data_max(data: &[f64]) -> f64 {
    data.iter().copied().fold(0.0, f64::max)
}

/// Sum of a set of elements.
pub fn data_sum(data: &[f64]) -> f64 {
    data.iter().sum()
}

/// Average of a set of elements, 0 for the empty set.
pub fn data_mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    data_sum(data) / data.len() as f64
}

/// Population standard deviation of a set of elements.
pub fn data_stddev(data: &[f64]) -> f64 {
    if data.is_empty() {
        return 0.0;
    }
    let mean = data_mean(data);
    let var = data.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>() / data.len() as f64;
    var.sqrt()
}
