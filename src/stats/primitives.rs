use std::f64::consts::{PI, SQRT_2};

const LANCZOS_G: f64 = 7.0;
#[allow(clippy::excessive_precision)]
const LANCZOS_COEFFICIENTS: [f64; 9] = [
    0.99999999999980993,
    676.5203681218851,
    -1259.1392167224028,
    771.32342877765313,
    -176.61502916214059,
    12.507343278686905,
    -0.13857109526572012,
    9.9843695780195716e-6,
    1.5056327351493116e-7,
];

const INCOMPLETE_GAMMA_MAX_TERMS: usize = 100;
const INCOMPLETE_GAMMA_EPSILON: f64 = 1e-8;

/// Linearly interpolated percentile, `p` in `[0, 100]`. Empty input is 0.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|left, right| left.total_cmp(right));

    let position = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return sorted[lower];
    }

    let weight = position - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Pearson correlation. Returns 0 for empty or mismatched inputs and when
/// either side has zero variance.
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    if x.is_empty() || x.len() != y.len() {
        return 0.0;
    }

    let mean_x = mean(x);
    let mean_y = mean(y);
    let mut numerator = 0.0;
    let mut sum_sq_x = 0.0;
    let mut sum_sq_y = 0.0;
    for (left, right) in x.iter().zip(y) {
        let cx = left - mean_x;
        let cy = right - mean_y;
        numerator += cx * cy;
        sum_sq_x += cx * cx;
        sum_sq_y += cy * cy;
    }

    if sum_sq_x == 0.0 || sum_sq_y == 0.0 {
        return 0.0;
    }
    numerator / (sum_sq_x * sum_sq_y).sqrt()
}

/// Abramowitz and Stegun 7.1.26.
pub fn erf(x: f64) -> f64 {
    const A1: f64 = 0.254829592;
    const A2: f64 = -0.284496736;
    const A3: f64 = 1.421413741;
    const A4: f64 = -1.453152027;
    const A5: f64 = 1.061405429;
    const P: f64 = 0.3275911;

    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + P * x);
    let y = 1.0 - (((((A5 * t + A4) * t) + A3) * t + A2) * t + A1) * t * (-x * x).exp();
    sign * y
}

pub fn normal_cdf(z: f64) -> f64 {
    0.5 * (1.0 + erf(z / SQRT_2))
}

/// Lanczos approximation of Γ(z). Arguments below 0.5 go through the
/// reflection formula once.
pub fn gamma(z: f64) -> f64 {
    if z < 0.5 {
        return PI / ((PI * z).sin() * gamma(1.0 - z));
    }

    let z = z - 1.0;
    let mut acc = LANCZOS_COEFFICIENTS[0];
    for (i, coefficient) in LANCZOS_COEFFICIENTS.iter().enumerate().skip(1) {
        acc += coefficient / (z + i as f64);
    }

    let t = z + LANCZOS_G + 0.5;
    (2.0 * PI).sqrt() * t.powf(z + 0.5) * (-t).exp() * acc
}

/// Lower incomplete gamma γ(a, x) by its power series.
pub fn lower_incomplete_gamma(a: f64, x: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }

    let mut term = 1.0 / a;
    let mut sum = term;
    for n in 1..INCOMPLETE_GAMMA_MAX_TERMS {
        term *= x / (a + n as f64);
        sum += term;
        if term.abs() < INCOMPLETE_GAMMA_EPSILON {
            break;
        }
    }

    x.powf(a) * (-x).exp() * sum
}

/// Chi-square CDF with `k` degrees of freedom, clamped to `[0, 1]`.
pub fn chi_square_cdf(x: f64, k: usize) -> f64 {
    if x < 0.0 || k == 0 {
        return 0.0;
    }

    let half_k = k as f64 / 2.0;
    (lower_incomplete_gamma(half_k, x / 2.0) / gamma(half_k)).clamp(0.0, 1.0)
}
