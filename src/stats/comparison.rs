use serde::Serialize;

use super::primitives::{chi_square_cdf, normal_cdf};
use super::prng::Mulberry32;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct WilcoxonResult {
    pub p_value: f64,
    pub z: f64,
    /// Number of non-zero differences that entered the test.
    pub n: usize,
}

/// Wilcoxon signed-rank test on paired differences (challenger − baseline),
/// normal approximation, two-tailed.
///
/// Zero differences are dropped and the rest get plain ordinal ranks by
/// absolute value; ties are not averaged.
pub fn wilcoxon_signed_rank(diffs: &[f64]) -> WilcoxonResult {
    let mut non_zero = diffs
        .iter()
        .copied()
        .filter(|diff| *diff != 0.0)
        .collect::<Vec<f64>>();
    if non_zero.is_empty() {
        return WilcoxonResult {
            p_value: 1.0,
            z: 0.0,
            n: 0,
        };
    }

    non_zero.sort_by(|left, right| left.abs().total_cmp(&right.abs()));

    let mut positive_rank_sum = 0.0_f64;
    let mut negative_rank_sum = 0.0_f64;
    for (index, diff) in non_zero.iter().enumerate() {
        let rank = (index + 1) as f64;
        if *diff > 0.0 {
            positive_rank_sum += rank;
        } else {
            negative_rank_sum += rank;
        }
    }

    let n = non_zero.len();
    let n_f = n as f64;
    let w = positive_rank_sum.min(negative_rank_sum);
    let mean_w = n_f * (n_f + 1.0) / 4.0;
    let var_w = n_f * (n_f + 1.0) * (2.0 * n_f + 1.0) / 24.0;
    let z = (w - mean_w) / var_w.sqrt();
    let p_value = (2.0 * (1.0 - normal_cdf(z.abs()))).clamp(0.0, 1.0);

    WilcoxonResult { p_value, z, n }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FriedmanResult {
    pub chi_square: f64,
    pub df: usize,
    pub p_value: f64,
}

/// Friedman rank test over `groups`, each a query-aligned metric vector.
///
/// Rank 1 is the best (largest) value in a row. Equal values keep their
/// group order and receive distinct ranks. Returns `None` for fewer than three
/// groups, unequal lengths, or empty vectors.
pub fn friedman(groups: &[&[f64]]) -> Option<FriedmanResult> {
    if groups.len() < 3 {
        return None;
    }

    let n = groups[0].len();
    if n == 0 || groups.iter().any(|group| group.len() != n) {
        return None;
    }

    let k = groups.len();
    let mut rank_sums = vec![0.0_f64; k];
    let mut order = (0..k).collect::<Vec<usize>>();
    for row in 0..n {
        order.sort_by(|&left, &right| {
            groups[right][row]
                .total_cmp(&groups[left][row])
                .then(left.cmp(&right))
        });
        for (position, &group_index) in order.iter().enumerate() {
            rank_sums[group_index] += (position + 1) as f64;
        }
    }

    let n_f = n as f64;
    let k_f = k as f64;
    let sum_of_squares = rank_sums.iter().map(|sum| sum * sum).sum::<f64>();
    let chi_square =
        (12.0 / (n_f * k_f * (k_f + 1.0))) * sum_of_squares - 3.0 * n_f * (k_f + 1.0);
    let df = k - 1;
    let p_value = (1.0 - chi_square_cdf(chi_square, df)).clamp(0.0, 1.0);

    Some(FriedmanResult {
        chi_square,
        df,
        p_value,
    })
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BootstrapOptions {
    pub iterations: usize,
    pub alpha: f64,
    pub seed: u32,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            iterations: 400,
            alpha: 0.05,
            seed: 1234,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn width(&self) -> f64 {
        self.upper - self.lower
    }
}

/// Percentile bootstrap interval for the mean of `values`.
pub fn bootstrap_ci(values: &[f64], options: BootstrapOptions) -> Option<ConfidenceInterval> {
    if values.is_empty() || options.iterations == 0 {
        return None;
    }

    let mut rng = Mulberry32::new(options.seed);
    let n = values.len();
    let mut means = Vec::<f64>::with_capacity(options.iterations);
    for _ in 0..options.iterations {
        let mut total = 0.0_f64;
        for _ in 0..n {
            total += values[rng.next_index(n)];
        }
        means.push(total / n as f64);
    }
    means.sort_by(|left, right| left.total_cmp(right));

    let iterations = options.iterations as f64;
    let last = options.iterations - 1;
    let lower_index = ((options.alpha / 2.0) * iterations).floor() as usize;
    let upper_index =
        (((1.0 - options.alpha / 2.0) * iterations).ceil() as usize).saturating_sub(1);

    Some(ConfidenceInterval {
        lower: means[lower_index.min(last)],
        upper: means[upper_index.min(last)],
    })
}
