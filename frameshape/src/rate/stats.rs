//! Per-bucket statistics.
//!
//! Every function takes the bucket's values, where `None` is a null cell, and
//! the zero-vector flag. A statistic that is undefined for the bucket comes
//! back as [`zero_or_null`].

/// `0.0` in zero-vector mode, null otherwise.
pub fn zero_or_null(zero_vector: bool) -> Option<f64> {
    if zero_vector {
        Some(0.0)
    } else {
        None
    }
}

/// `1.0` for an empty bucket, otherwise [`zero_or_null`].
pub fn absence(count: usize, zero_vector: bool) -> Option<f64> {
    if count == 0 {
        Some(1.0)
    } else {
        zero_or_null(zero_vector)
    }
}

/// Sum of the non-null values; a zero total is treated as no data.
pub fn sum(values: &[Option<f64>], zero_vector: bool) -> Option<f64> {
    if values.is_empty() {
        return zero_or_null(zero_vector);
    }

    let total: f64 = values.iter().flatten().sum();
    if total == 0.0 {
        zero_or_null(zero_vector)
    } else {
        Some(total)
    }
}

/// Sum divided by the number of cells, nulls included.
pub fn average(values: &[Option<f64>], zero_vector: bool) -> Option<f64> {
    match sum(values, zero_vector) {
        Some(total) if total != 0.0 => Some(total / values.len() as f64),
        _ => zero_or_null(zero_vector),
    }
}

/// Sample standard deviation around [`average`].
pub fn standard_deviation(values: &[Option<f64>], zero_vector: bool) -> Option<f64> {
    let mean = match average(values, zero_vector) {
        Some(mean) if mean != 0.0 => mean,
        _ => return zero_or_null(zero_vector),
    };

    let deviations: Vec<Option<f64>> = values
        .iter()
        .map(|value| value.map(|value| (value - mean).powi(2)))
        .collect();

    let spread = match sum(&deviations, zero_vector) {
        Some(spread) if spread != 0.0 => spread,
        _ => return zero_or_null(zero_vector),
    };

    if values.len() == 1 {
        return zero_or_null(zero_vector);
    }

    Some((spread / (values.len() - 1) as f64).sqrt())
}

/// Linearly interpolated quantile `q` of the sorted values.
///
/// A single null cell makes the quantile undefined.
pub fn quantile(q: f64, values: &[Option<f64>], zero_vector: bool) -> Option<f64> {
    if values.is_empty() {
        return zero_or_null(zero_vector);
    }

    let Some(mut sorted) = values.iter().copied().collect::<Option<Vec<f64>>>() else {
        return zero_or_null(zero_vector);
    };
    sorted.sort_by(f64::total_cmp);

    let position = sorted.len() as f64 * q;
    let base = (position.floor() as usize).min(sorted.len() - 1);
    let rest = position - base as f64;

    let mut result = sorted[base];
    if let Some(next) = sorted.get(base + 1) {
        result += rest * (next - sorted[base]);
    }
    Some(result)
}
