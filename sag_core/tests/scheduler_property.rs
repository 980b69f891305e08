use proptest::prelude::*;
use rstest::rstest;
use sag_core::{ScheduleCfg, Scheduler, Task};

fn schedule(sample_ms: u32, display_ms: u32, broadcast_ms: u32) -> ScheduleCfg {
    ScheduleCfg {
        sample_ms,
        display_ms,
        broadcast_ms,
        ..ScheduleCfg::default()
    }
}

/// Tick from 0 to `total` inclusive in steps of `step`; return fire times per task.
fn simulate(cfg: &ScheduleCfg, total: u32, step: u32) -> [Vec<u32>; 3] {
    let mut s = Scheduler::new(cfg);
    let mut fired: [Vec<u32>; 3] = Default::default();
    let mut now = 0u32;
    while now <= total {
        let due = s.tick(now);
        for (i, task) in Task::ALL.iter().enumerate() {
            if due.is(*task) {
                fired[i].push(now);
            }
        }
        now += step;
    }
    fired
}

proptest! {
    #[test]
    fn never_runs_twice_within_a_period(
        periods in (1u32..300, 1u32..300, 1u32..300),
        step in 1u32..7,
        total in 0u32..20_000,
    ) {
        let cfg = schedule(periods.0, periods.1, periods.2);
        let fired = simulate(&cfg, total, step);
        for (times, period) in fired.iter().zip([periods.0, periods.1, periods.2]) {
            // first run only after a full period from the zero start
            if let Some(first) = times.first() {
                prop_assert!(*first > period);
            }
            for w in times.windows(2) {
                prop_assert!(w[1] - w[0] > period, "gap {} <= period {}", w[1] - w[0], period);
            }
        }
    }

    #[test]
    fn fire_count_bounded_by_period(
        period in 1u32..300,
        step in 1u32..7,
        total in 0u32..20_000,
    ) {
        let cfg = schedule(period, period, period);
        let fired = simulate(&cfg, total, step);
        let last_now = (total / step) * step;
        let count = fired[0].len() as u32;
        // at most one run per full period, at least one per period plus one tick
        prop_assert!(count <= last_now / period);
        prop_assert!(count >= last_now / (period + step));
    }
}

#[rstest]
#[case(100, 1, 1_000, 9)]
#[case(100, 1, 1_050, 10)]
#[case(50, 1, 1_000, 19)]
fn fire_counts_for_reference_rates(
    #[case] period: u32,
    #[case] step: u32,
    #[case] total: u32,
    #[case] expected: usize,
) {
    let fired = simulate(&schedule(period, period, period), total, step);
    assert_eq!(fired[0].len(), expected);
    // within one of floor(total / period)
    let ideal = (total / period) as i64;
    assert!((fired[0].len() as i64 - ideal).abs() <= 1);
}

#[test]
fn coarse_ticks_stretch_the_period() {
    // 5 ms loop, 10 ms period: first tick past 10 is 15, then every 15
    let fired = simulate(&schedule(10, 1_000, 1_000), 1_000, 5);
    assert_eq!(fired[0].len(), 66);
    assert_eq!(&fired[0][..3], &[15, 30, 45]);
}

#[test]
fn one_ms_sampling_runs_every_other_millisecond() {
    let fired = simulate(&schedule(1, 100, 100), 20, 1);
    assert_eq!(fired[0], vec![2, 4, 6, 8, 10, 12, 14, 16, 18, 20]);
    assert!(fired[1].is_empty());
    assert!(fired[2].is_empty());
}
