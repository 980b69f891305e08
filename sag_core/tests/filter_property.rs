use proptest::prelude::*;
use sag_core::SampleFilter;

/// Mean of the last `window` pushes, treating never-written slots as zero.
fn expected_mean(history: &[u16], window: usize) -> f32 {
    let start = history.len().saturating_sub(window);
    let sum: u64 = history[start..].iter().map(|&v| u64::from(v)).sum();
    (sum as f64 / window as f64) as f32
}

proptest! {
    #[test]
    fn average_is_mean_of_last_window(
        window in 1usize..64,
        samples in prop::collection::vec(0u16..4096, 1..400),
    ) {
        let mut f = SampleFilter::new(window).unwrap();
        for (i, &raw) in samples.iter().enumerate() {
            let got = f.push_and_average(raw);
            let want = expected_mean(&samples[..=i], window);
            prop_assert!((got - want).abs() < 1e-3, "push {}: got {} want {}", i, got, want);
            prop_assert_eq!(f.is_warm(), i + 1 >= window);
        }
    }

    #[test]
    fn constant_input_converges_after_one_window(
        window in 1usize..200,
        raw in 0u16..4096,
    ) {
        let mut f = SampleFilter::new(window).unwrap();
        let mut last = 0.0;
        for _ in 0..window {
            last = f.push_and_average(raw);
        }
        prop_assert!((last - f32::from(raw)).abs() < 1e-3);
    }
}

#[test]
fn reference_window_warm_up_bias() {
    // 128 slots, one real sample: the mean is pulled toward zero.
    let mut f = SampleFilter::new(128).unwrap();
    let avg = f.push_and_average(1280);
    assert!((avg - 10.0).abs() < 1e-6);
    assert!(!f.is_warm());
}
