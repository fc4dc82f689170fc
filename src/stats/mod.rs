//! Deterministic randomness, descriptive statistics, and the nonparametric
//! tests used to compare retrieval modes.
//!
//! Everything here is synchronous and allocation-light; callers run it
//! between I/O phases.

mod comparison;
mod primitives;
mod prng;
#[cfg(test)]
mod tests;

pub use self::comparison::{
    BootstrapOptions, ConfidenceInterval, FriedmanResult, WilcoxonResult, bootstrap_ci, friedman,
    wilcoxon_signed_rank,
};
pub use self::primitives::{
    chi_square_cdf, erf, gamma, lower_incomplete_gamma, mean, normal_cdf, pearson, percentile,
};
pub use self::prng::{Mulberry32, batches, shuffle};
