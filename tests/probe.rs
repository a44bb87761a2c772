mod common;

use common::{observed_transitions, OverallocatingList};
use growth_probe::{
    probe_capacity, CapacityLayout, CapacitySample, Container, LayoutError, ProbeConfig,
    ProbeError, ReportedFootprint, ThresholdPolicy,
};

type Words = Vec<u64>;

const LAYOUT: CapacityLayout = CapacityLayout::new(24, 8);

fn config(policy: ThresholdPolicy) -> ProbeConfig {
    ProbeConfig::for_container::<Words>()
        .with_layout(LAYOUT)
        .with_policy(policy)
}

// A synthetic footprint whose capacity is `capacity(i)` right after the append at element count
// `i`, regardless of what the vector actually allocated.
fn stepped(capacity: impl Fn(usize) -> usize) -> impl Fn(&Words) -> usize {
    move |words: &Words| LAYOUT.overhead + capacity(words.len() - 1) * LAYOUT.element_size
}

#[test]
fn single_jump_at_ten() {
    let footprint = stepped(|i| if i >= 10 { 20 } else { 12 });

    for policy in [ThresholdPolicy::First, ThresholdPolicy::Last] {
        let report = probe_capacity::<Words, _>(&config(policy), &footprint).unwrap();
        assert_eq!(report.threshold(), 10);
        assert_eq!(
            report.transitions(),
            &[
                CapacitySample {
                    element_count: 0,
                    capacity: 12
                },
                CapacitySample {
                    element_count: 10,
                    capacity: 20
                },
            ]
        );
    }
}

#[test]
fn steps_at_every_multiple_of_four() {
    let footprint = stepped(|i| 4 * (i / 4));

    let last = probe_capacity::<Words, _>(&config(ThresholdPolicy::Last), &footprint).unwrap();
    assert_eq!(last.threshold(), 60);
    assert_eq!(last.transitions().len(), 15);

    let first = probe_capacity::<Words, _>(&config(ThresholdPolicy::First), &footprint).unwrap();
    assert_eq!(first.threshold(), 4);
    assert_eq!(first.policy(), ThresholdPolicy::First);
}

#[test]
fn last_policy_picks_largest_changing_count() {
    let strategies: Vec<(&str, Box<dyn Fn(usize) -> usize>)> = vec![
        ("doubling", Box::new(|i: usize| (i + 1).next_power_of_two().max(4))),
        ("linear chunks", Box::new(|i: usize| 10 * (i / 10 + 1))),
        ("fixed", Box::new(|i: usize| if i < 40 { 40 } else { 80 })),
    ];

    for (name, capacity) in strategies {
        let expected = (1..64)
            .filter(|&i| capacity(i) != capacity(i - 1))
            .max()
            .unwrap();
        let report =
            probe_capacity::<Words, _>(&config(ThresholdPolicy::Last), &stepped(&capacity))
                .unwrap();
        assert_eq!(report.threshold(), expected, "strategy: {}", name);
    }
}

#[test]
fn vec_growth_matches_direct_observation() {
    let config = ProbeConfig::for_container::<Words>();
    let report = probe_capacity::<Words, _>(&config, &ReportedFootprint).unwrap();

    let observed = observed_transitions::<Words>(config.upper_bound);
    let probed: Vec<(usize, usize)> = report
        .transitions()
        .iter()
        .map(|t| (t.element_count, t.capacity))
        .collect();
    assert_eq!(probed, observed);
    assert_eq!(Some(&report.threshold()), observed.iter().map(|(i, _)| i).last());

    // Growing to `S` elements fills the storage exactly, so the next append reallocates; one
    // element short of that, it does not.
    let threshold = report.threshold();
    let mut full = Words::filled(threshold);
    assert_eq!(full.capacity(), threshold);
    full.grow_by_one();
    assert!(full.capacity() > threshold);

    let mut short = Words::filled(threshold - 1);
    let before = short.capacity();
    short.grow_by_one();
    assert_eq!(short.capacity(), before);
}

#[test]
fn overallocating_list_growth() {
    let config = ProbeConfig::for_container::<OverallocatingList>();
    let report = probe_capacity::<OverallocatingList, _>(&config, &ReportedFootprint).unwrap();

    let capacities: Vec<usize> = report.transitions().iter().map(|t| t.capacity).collect();
    assert_eq!(capacities, vec![4, 8, 16, 24, 32, 40, 52, 64]);
    assert_eq!(report.threshold(), 52);

    let first = probe_capacity::<OverallocatingList, _>(
        &config.with_policy(ThresholdPolicy::First),
        &ReportedFootprint,
    )
    .unwrap();
    assert_eq!(first.threshold(), 4);
}

#[test]
fn growth_factors_between_transitions() {
    let footprint = stepped(|i| (i + 1).next_power_of_two().max(4));
    let report = probe_capacity::<Words, _>(&config(ThresholdPolicy::Last), &footprint).unwrap();

    assert_eq!(report.growth_factors(), vec![2.0, 2.0, 2.0, 2.0]);
}

#[test]
fn repeated_probes_agree() {
    let footprint = stepped(|i| 4 * (i / 4));
    let config = config(ThresholdPolicy::Last);

    let first = probe_capacity::<Words, _>(&config, &footprint).unwrap();
    let second = probe_capacity::<Words, _>(&config, &footprint).unwrap();
    assert_eq!(first, second);
}

#[test]
fn no_transition_in_range() {
    let footprint = stepped(|_| 128);
    let err = probe_capacity::<Words, _>(&config(ThresholdPolicy::Last), &footprint).unwrap_err();
    assert_eq!(err, ProbeError::NoTransition { upper_bound: 64 });

    // Nothing but the initial allocation fits in a two-element scan.
    let footprint = stepped(|i| if i >= 8 { 16 } else { 8 });
    let short = config(ThresholdPolicy::Last).with_upper_bound(2);
    assert_eq!(
        probe_capacity::<Words, _>(&short, &footprint).unwrap_err(),
        ProbeError::NoTransition { upper_bound: 2 }
    );
}

#[test]
fn footprint_below_overhead() {
    let footprint = |_: &Words| 16usize;
    let err = probe_capacity::<Words, _>(&config(ThresholdPolicy::Last), &footprint).unwrap_err();
    assert_eq!(
        err,
        ProbeError::InconsistentFootprint {
            element_count: 0,
            footprint: 16,
            overhead: 24,
        }
    );
}

#[test]
fn shrinking_capacity_is_rejected() {
    let footprint = stepped(|i| if i == 5 { 4 } else { 8 });
    let err = probe_capacity::<Words, _>(&config(ThresholdPolicy::Last), &footprint).unwrap_err();
    assert_eq!(
        err,
        ProbeError::CapacityDecreased {
            element_count: 5,
            previous: 8,
            current: 4,
        }
    );
}

#[test]
fn unusable_configuration() {
    let zero_size = config(ThresholdPolicy::Last).with_layout(CapacityLayout::new(24, 0));
    assert_eq!(
        probe_capacity::<Words, _>(&zero_size, &ReportedFootprint).unwrap_err(),
        ProbeError::Layout(LayoutError::ZeroElementSize)
    );

    let empty = config(ThresholdPolicy::Last).with_upper_bound(0);
    assert_eq!(
        probe_capacity::<Words, _>(&empty, &ReportedFootprint).unwrap_err(),
        ProbeError::EmptyRange
    );
}

#[test]
fn layout_of_vec() {
    let layout = CapacityLayout::of::<Vec<u32>>();
    assert_eq!(layout.overhead, std::mem::size_of::<Vec<u32>>());
    assert_eq!(layout.element_size, 4);
    assert_eq!(layout.capacity(layout.overhead + 40), Some(10));
    assert_eq!(layout.capacity(layout.overhead - 1), None);
}

#[test]
fn vec_grows_by_one_default_element() {
    let mut words: Words = Container::empty();
    words.push(7);
    words.grow_by_one();
    assert_eq!(words, vec![7, 0]);
    assert_eq!(Container::len(&words), 2);

    let filled = Words::filled(5);
    assert_eq!(filled, vec![0; 5]);
}
