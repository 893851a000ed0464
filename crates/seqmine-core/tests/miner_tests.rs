//! End-to-end mining scenarios: gap, span, average and median bounds,
//! maximality of the emitted set, and determinism.

use seqmine_core::{mine, MiningParams};

fn unconstrained(items: Vec<Vec<u32>>, theta: usize) -> MiningParams {
    MiningParams {
        num_sequences: items.len(),
        max_seq_len: items.iter().map(Vec::len).max().unwrap_or(0),
        alphabet_size: items.iter().flatten().copied().max().unwrap_or(0) as usize,
        theta,
        items,
        ..Default::default()
    }
}

/// Attach a single attribute matrix with empty per-attribute metadata;
/// the caller fills in the constraint vectors.
fn with_attribute(mut params: MiningParams, values: Vec<Vec<i64>>) -> MiningParams {
    params.num_attributes = 1;
    params.max_attrs = vec![values.iter().flatten().copied().max().unwrap_or(0)];
    params.min_attrs = vec![values.iter().flatten().copied().min().unwrap_or(0)];
    params.attrs = vec![values];
    params.num_minmax = vec![0];
    params.num_avr = vec![0];
    params.num_med = vec![0];
    params
}

/// Number of sequences containing `pattern` as an ordered subsequence.
fn naive_support(items: &[Vec<u32>], pattern: &[u32]) -> usize {
    items
        .iter()
        .filter(|seq| {
            let mut next = 0;
            for &event in seq.iter() {
                if next < pattern.len() && event == pattern[next] {
                    next += 1;
                }
            }
            next == pattern.len()
        })
        .count()
}

#[test]
fn shared_patterns_across_three_sequences() {
    let params = unconstrained(vec![vec![1, 2, 3], vec![1, 2], vec![2, 3]], 2);
    let mut rows = mine(&params).expect("valid input");
    rows.sort();
    assert_eq!(rows, vec![vec![1, 2, 2], vec![2, 3, 2]]);
}

#[test]
fn upper_gap_prunes_distant_transitions() {
    let mut params = with_attribute(
        unconstrained(vec![vec![1, 2, 3, 4]], 1),
        vec![vec![10, 12, 15, 20]],
    );
    params.ugap = vec![3];
    params.ugapi = vec![0];
    params.tot_gap = vec![0];

    let mut rows = mine(&params).expect("valid input");
    rows.sort();
    // Arc 3 -> 4 has gap 5 and never exists, so nothing containing the
    // 3 -> 4 step can appear.
    assert_eq!(rows, vec![vec![1, 2, 3, 1], vec![2, 3, 1]]);
}

#[test]
fn upper_gap_of_one_keeps_only_contiguous_runs() {
    let items = vec![vec![1, 2, 1, 3]];
    let mut params = with_attribute(unconstrained(items.clone(), 1), vec![vec![1, 2, 3, 4]]);
    params.ugap = vec![1];
    params.ugapi = vec![0];
    params.tot_gap = vec![0];

    let rows = mine(&params).expect("valid input");
    assert!(!rows.is_empty());
    for row in &rows {
        let pattern: Vec<u32> = row[..row.len() - 1].iter().map(|&x| x as u32).collect();
        let contiguous = items[0]
            .windows(pattern.len())
            .any(|window| window == pattern.as_slice());
        assert!(contiguous, "{pattern:?} is not a contiguous run");
    }
}

#[test]
fn lower_gap_requires_events_in_between() {
    let mut params = with_attribute(
        unconstrained(vec![vec![1, 2, 3, 4]], 1),
        vec![vec![1, 2, 3, 4]],
    );
    params.lgap = vec![2];
    params.lgapi = vec![0];
    params.tot_gap = vec![0];

    let mut rows = mine(&params).expect("valid input");
    rows.sort();
    // Adjacent pattern events must sit at least two positions apart.
    assert_eq!(rows, vec![vec![1, 3, 1], vec![1, 4, 1], vec![2, 4, 1]]);
}

#[test]
fn trivial_lower_span_changes_nothing() {
    let items = vec![vec![1, 2, 3], vec![1, 2], vec![2, 3]];
    let values = vec![vec![4, 7, 2], vec![5, 5], vec![9, 1]];

    let plain = mine(&unconstrained(items.clone(), 2)).expect("valid input");

    let mut params = with_attribute(unconstrained(items, 2), values);
    // min - max - 1 is below every reachable span.
    params.lspn = vec![params.min_attrs[0] - params.max_attrs[0] - 1];
    params.lspni = vec![0];
    params.num_minmax = vec![2];
    params.tot_spn = vec![0];
    let spanned = mine(&params).expect("valid input");

    assert_eq!(plain, spanned);
}

#[test]
fn unreachable_lower_average_empties_the_result() {
    for theta in 1..=2 {
        let mut params = with_attribute(
            unconstrained(vec![vec![1, 2], vec![1, 2]], theta),
            vec![vec![3, 3], vec![3, 3]],
        );
        params.lavr = vec![5];
        params.lavri = vec![0];
        params.num_avr = vec![1];
        params.tot_avr = vec![0];
        assert_eq!(mine(&params).expect("valid input"), Vec::<Vec<i64>>::new());
    }
}

#[test]
fn upper_median_excludes_heavy_patterns() {
    let mut params = with_attribute(
        unconstrained(vec![vec![1, 10, 1], vec![1, 10, 1]], 2),
        vec![vec![1, 10, 1], vec![1, 10, 1]],
    );
    params.umed = vec![2];
    params.umedi = vec![0];
    params.num_med = vec![1];

    let mut rows = mine(&params).expect("valid input");
    rows.sort();
    // [1, 10] has median 5.5 and stays out; [1, 10, 1] has median 1 and
    // is emitted with both sequences as feasible witnesses.
    assert_eq!(rows, vec![vec![1, 1, 2], vec![1, 10, 1, 2]]);
}

#[test]
fn upper_average_bounds_feasible_witnesses() {
    // Item 2 carries value 9; any pattern containing it averages at
    // least 11/3 > 3, so nothing with item 2 can ever become feasible.
    let mut params = with_attribute(
        unconstrained(vec![vec![1, 2, 3], vec![1, 2, 3]], 2),
        vec![vec![1, 9, 1], vec![1, 9, 1]],
    );
    params.uavr = vec![3];
    params.uavri = vec![0];
    params.num_avr = vec![1];
    params.tot_avr = vec![0];

    let rows = mine(&params).expect("valid input");
    assert_eq!(rows, vec![vec![1, 3, 2]]);
}

#[test]
fn support_matches_naive_subsequence_count() {
    let items = vec![
        vec![1, 3, 2, 1, 4],
        vec![2, 1, 3, 4],
        vec![1, 2, 3],
        vec![4, 1, 2],
    ];
    let params = unconstrained(items.clone(), 2);
    let rows = mine(&params).expect("valid input");
    assert!(!rows.is_empty());
    for row in &rows {
        let pattern: Vec<u32> = row[..row.len() - 1].iter().map(|&x| x as u32).collect();
        assert_eq!(
            naive_support(&items, &pattern),
            *row.last().expect("support") as usize,
            "support mismatch for {pattern:?}"
        );
    }
}

#[test]
fn prefix_support_is_monotone() {
    let items = vec![
        vec![1, 3, 2, 1, 4],
        vec![2, 1, 3, 4],
        vec![1, 2, 3],
        vec![4, 1, 2],
    ];
    let rows = mine(&unconstrained(items.clone(), 2)).expect("valid input");
    for row in &rows {
        let pattern: Vec<u32> = row[..row.len() - 1].iter().map(|&x| x as u32).collect();
        let support = *row.last().expect("support") as usize;
        for cut in 1..pattern.len() {
            assert!(
                naive_support(&items, &pattern[..cut]) >= support,
                "prefix {:?} rarer than {pattern:?}",
                &pattern[..cut]
            );
        }
    }
}

#[test]
fn no_output_pattern_is_a_strict_prefix_of_another_at_same_support() {
    let items = vec![
        vec![1, 2, 3, 1, 2],
        vec![2, 3, 1],
        vec![1, 2, 2, 3],
        vec![3, 1, 2, 3],
    ];
    let rows = mine(&unconstrained(items, 2)).expect("valid input");
    for a in &rows {
        for b in &rows {
            if a.len() < b.len() {
                let (pa, pb) = (&a[..a.len() - 1], &b[..b.len() - 1]);
                assert!(
                    !(pb.starts_with(pa) && a.last() == b.last()),
                    "{a:?} is a strict prefix of {b:?}"
                );
            }
        }
    }
}

#[test]
fn identical_inputs_mine_identical_outputs() {
    let items = vec![vec![1, 2, 3, 1], vec![2, 1, 3], vec![3, 2, 1]];
    let params = unconstrained(items, 2);
    let first = mine(&params).expect("valid input");
    let second = mine(&params).expect("valid input");
    assert_eq!(first, second);
}

#[test]
fn empty_database_yields_empty_result() {
    let params = MiningParams {
        alphabet_size: 4,
        theta: 1,
        ..Default::default()
    };
    assert_eq!(mine(&params).expect("valid input"), Vec::<Vec<i64>>::new());
}
