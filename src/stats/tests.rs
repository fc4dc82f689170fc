use super::*;

fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected}, got {actual} (tolerance {tolerance})"
    );
}

#[test]
fn erf_matches_reference_values() {
    assert_close(erf(0.0), 0.0, 1e-9);
    assert_close(erf(1.0), 0.842_700_79, 1e-6);
    assert_close(erf(-1.0), -0.842_700_79, 1e-6);
    assert_close(normal_cdf(1.96), 0.975, 1e-4);
    assert_close(normal_cdf(0.0), 0.5, 1e-9);
}

#[test]
fn gamma_matches_factorials_and_half_integers() {
    assert_close(gamma(5.0), 24.0, 1e-9);
    assert_close(gamma(1.0), 1.0, 1e-12);
    assert_close(gamma(0.5), std::f64::consts::PI.sqrt(), 1e-9);
    assert_close(gamma(0.25), 3.625_609_908_2, 1e-8);
}

#[test]
fn chi_square_cdf_matches_closed_form_for_two_degrees() {
    // df = 2 reduces to 1 - exp(-x/2).
    assert_close(chi_square_cdf(2.0, 2), 1.0 - (-1.0_f64).exp(), 1e-7);
    assert_close(chi_square_cdf(8.0, 2), 1.0 - (-4.0_f64).exp(), 1e-7);
    assert_eq!(chi_square_cdf(-1.0, 3), 0.0);
    assert_eq!(chi_square_cdf(1.0, 0), 0.0);
}

#[test]
fn percentile_interpolates_between_ranks() {
    assert_close(percentile(&[1.0, 2.0, 3.0, 4.0], 50.0), 2.5, 1e-12);
    assert_close(percentile(&[4.0, 1.0, 3.0, 2.0], 0.0), 1.0, 1e-12);
    assert_close(percentile(&[4.0, 1.0, 3.0, 2.0], 100.0), 4.0, 1e-12);
    assert_close(percentile(&[10.0, 20.0, 30.0, 40.0, 50.0], 95.0), 48.0, 1e-9);
    assert_eq!(percentile(&[], 95.0), 0.0);
    assert_eq!(mean(&[]), 0.0);
}

#[test]
fn pearson_detects_linear_relationships() {
    let x = [1.0, 2.0, 3.0, 4.0];
    assert_close(pearson(&x, &[2.0, 4.0, 6.0, 8.0]), 1.0, 1e-12);
    assert_close(pearson(&x, &[8.0, 6.0, 4.0, 2.0]), -1.0, 1e-12);
    assert_eq!(pearson(&x, &[5.0, 5.0, 5.0, 5.0]), 0.0);
    assert_eq!(pearson(&x, &[1.0, 2.0]), 0.0);
    assert_eq!(pearson(&[], &[]), 0.0);
}

#[test]
fn shuffle_is_a_reproducible_permutation() {
    let items = (0..20).collect::<Vec<u32>>();

    let first = shuffle(&items, 42);
    let second = shuffle(&items, 42);
    assert_eq!(first, second);

    let mut sorted = first.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, items);

    let other = shuffle(&items, 43);
    assert_ne!(first, other);

    assert!(shuffle::<u32>(&[], 7).is_empty());
    assert_eq!(shuffle(&[9_u32], 7), vec![9]);
}

#[test]
fn mulberry32_feeds_the_mixed_word_back_as_state() {
    let mut rng = Mulberry32::new(47);
    let draws = (0..3).map(|_| rng.next_u32()).collect::<Vec<u32>>();
    assert_eq!(draws, vec![2_703_668_450, 1_801_382_995, 3_176_231_792]);

    let order = shuffle(&(0..10).collect::<Vec<u32>>(), 47);
    assert_eq!(order, vec![9, 0, 1, 4, 8, 7, 2, 5, 3, 6]);
}

#[test]
fn mulberry32_draws_stay_in_range() {
    let mut rng = Mulberry32::new(1);
    for _ in 0..1_000 {
        let value = rng.next_f64();
        assert!((0.0..1.0).contains(&value));
        assert!(rng.next_index(3) < 3);
    }
}

#[test]
fn wilcoxon_without_differences_is_not_significant() {
    let result = wilcoxon_signed_rank(&[0.0, 0.0, 0.0]);
    assert_eq!(result.n, 0);
    assert_eq!(result.z, 0.0);
    assert_eq!(result.p_value, 1.0);
}

#[test]
fn wilcoxon_flags_consistent_improvement() {
    let diffs = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];
    let result = wilcoxon_signed_rank(&diffs);
    assert_eq!(result.n, 8);
    assert!(result.z < 0.0);
    assert!(result.p_value < 0.05, "p = {}", result.p_value);
}

#[test]
fn wilcoxon_drops_zero_differences_before_ranking() {
    let with_zeros = wilcoxon_signed_rank(&[0.0, 0.5, -0.25, 0.0, 0.75]);
    let without = wilcoxon_signed_rank(&[0.5, -0.25, 0.75]);
    assert_eq!(with_zeros, without);
    assert_eq!(with_zeros.n, 3);
}

#[test]
fn friedman_needs_at_least_three_aligned_groups() {
    let a = [1.0, 2.0];
    let b = [2.0, 3.0];
    let short = [1.0];
    assert!(friedman(&[&a, &b]).is_none());
    assert!(friedman(&[&a, &b, &short]).is_none());
    assert!(friedman(&[&[], &[], &[]]).is_none());
}

#[test]
fn friedman_scores_a_consistent_ordering() {
    let best = [0.9, 0.8, 0.7, 0.95];
    let middle = [0.5, 0.4, 0.6, 0.55];
    let worst = [0.1, 0.2, 0.3, 0.15];

    let result = friedman(&[&best, &middle, &worst]).expect("three aligned groups");
    assert_eq!(result.df, 2);
    assert_close(result.chi_square, 8.0, 1e-9);
    assert_close(result.p_value, (-4.0_f64).exp(), 1e-6);
}

#[test]
fn bootstrap_interval_is_deterministic_and_brackets_the_mean() {
    assert!(bootstrap_ci(&[], BootstrapOptions::default()).is_none());

    let values = [0.2, 0.4, 0.1, 0.9, 0.5, 0.3, 0.7, 0.6];
    let first = bootstrap_ci(&values, BootstrapOptions::default()).expect("non-empty sample");
    let second = bootstrap_ci(&values, BootstrapOptions::default()).expect("non-empty sample");
    assert_eq!(first, second);

    let center = mean(&values);
    assert!(first.lower <= center && center <= first.upper);
    assert!(first.lower >= 0.1 && first.upper <= 0.9);
}

#[test]
fn bootstrap_interval_narrows_with_more_samples() {
    let small = (0..10).map(|i| (i % 2) as f64).collect::<Vec<f64>>();
    let large = (0..1_000).map(|i| (i % 2) as f64).collect::<Vec<f64>>();

    let small_ci = bootstrap_ci(&small, BootstrapOptions::default()).expect("small sample");
    let large_ci = bootstrap_ci(&large, BootstrapOptions::default()).expect("large sample");
    assert!(large_ci.width() < small_ci.width());
}

#[test]
fn batches_keep_order_and_remainder() {
    let items = [1, 2, 3, 4, 5, 6, 7];
    let grouped = batches(&items, 3);
    assert_eq!(grouped, vec![vec![1, 2, 3], vec![4, 5, 6], vec![7]]);
    assert_eq!(batches(&items, 0).len(), 7);
    assert!(batches::<u8>(&[], 5).is_empty());
}
