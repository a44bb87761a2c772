use std::{thread, time::Duration};

use growth_probe::{measure_append, measure_threshold, repeat, Summary, TimingError};

const SETUP_DELAY: Duration = Duration::from_millis(40);
const STMT_DELAY: Duration = Duration::from_millis(2);

#[test]
fn one_duration_per_trial() {
    let samples = measure_append::<Vec<u64>>("Size S to S+1", 32, 250);
    assert_eq!(samples.len(), 250);
    assert_eq!(samples.pre_size(), 32);
    assert_eq!(samples.label(), "Size S to S+1");
    assert!(samples.seconds().iter().all(|s| *s >= 0.0));
}

#[test]
fn threshold_sample_sets() {
    let timings = measure_threshold::<Vec<u64>>(32, 100).unwrap();

    assert_eq!(timings.at_threshold.len(), 100);
    assert_eq!(timings.at_threshold.pre_size(), 32);
    assert_eq!(timings.at_threshold.label(), "Size S to S+1");

    assert_eq!(timings.below_threshold.len(), 100);
    assert_eq!(timings.below_threshold.pre_size(), 31);
    assert_eq!(timings.below_threshold.label(), "Size S-1 to S");
}

#[test]
fn setup_is_not_timed() {
    let durations = repeat(
        5,
        || thread::sleep(SETUP_DELAY),
        |_| thread::sleep(STMT_DELAY),
    );

    assert_eq!(durations.len(), 5);
    for duration in durations {
        assert!(duration >= STMT_DELAY, "{:?}", duration);
        assert!(duration < SETUP_DELAY, "{:?}", duration);
    }
}

struct SlowDrop;

impl Drop for SlowDrop {
    fn drop(&mut self) {
        thread::sleep(SETUP_DELAY);
    }
}

#[test]
fn teardown_is_not_timed() {
    let durations = repeat(3, || SlowDrop, |_| {});
    for duration in durations {
        assert!(duration < SETUP_DELAY, "{:?}", duration);
    }
}

#[test]
fn statement_runs_once_per_trial() {
    let mut setups = 0;
    let mut runs = Vec::new();
    repeat(
        7,
        || {
            setups += 1;
            setups
        },
        |trial| runs.push(*trial),
    );

    assert_eq!(setups, 7);
    assert_eq!(runs, vec![1, 2, 3, 4, 5, 6, 7]);
}

#[test]
fn degenerate_requests() {
    assert_eq!(
        measure_threshold::<Vec<u64>>(0, 10).unwrap_err(),
        TimingError::ZeroThreshold
    );
    assert_eq!(
        measure_threshold::<Vec<u64>>(8, 0).unwrap_err(),
        TimingError::ZeroTrials
    );
}

#[test]
fn summary_statistics() {
    let summary = Summary::from_seconds(&[4.0, 1.0, 3.0, 2.0]).unwrap();
    assert_eq!(summary.count, 4);
    assert_eq!(summary.min, 1.0);
    assert_eq!(summary.max, 4.0);
    assert_eq!(summary.mean, 2.5);
    assert_eq!(summary.median, 2.5);

    let odd = Summary::from_seconds(&[5.0, 1.0, 9.0]).unwrap();
    assert_eq!(odd.median, 5.0);

    assert!(Summary::from_seconds(&[]).is_none());
}
