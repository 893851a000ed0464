//! Pattern records.
//!
//! A pattern record tracks one candidate pattern through the depth-first
//! search: its item sequence, the sequences witnessing it, and for each
//! witnessing sequence the *cohort* of MDD end-pointer nodes marking
//! where each occurrence currently ends, with running constraint
//! aggregates parallel to the cohort.
//!
//! Aggregate arrays are indexed `[cohort][constraint row][pointer]`:
//! span rows follow `tot_spn` order, average rows `tot_avr` order, and
//! median rows the order of the respective bound vectors.

use crate::node::NodeId;
use crate::params::MiningParams;

/// One candidate pattern in the DFS queue.
#[derive(Debug)]
pub struct PatternRec {
    /// The item sequence defining the pattern.
    pub items: Vec<u32>,
    /// Number of sequences containing the pattern as a subsequence under
    /// the gap constraints (one count per cohort).
    pub freq: usize,
    /// Number of sequences with at least one occurrence that satisfies
    /// every constraint. Drives maximal-pattern emission.
    pub act_freq: usize,
    /// True while the newest cohort has not yet produced a feasible
    /// witness; cleared once `act_freq` was credited for it.
    pub cond: bool,
    /// Witnessing sequences, in insertion order.
    pub seq_ids: Vec<u32>,
    /// End-pointer cohorts, one per witnessing sequence.
    pub cohorts: Vec<Vec<NodeId>>,
    /// Running (min, max) per span-constrained attribute and pointer.
    pub spn: Vec<Vec<Vec<[i64; 2]>>>,
    /// Running numerator per average-constrained attribute and pointer.
    pub avr: Vec<Vec<Vec<i64>>>,
    /// Running (counter, low, high) per lower median bound and pointer.
    pub lmed: Vec<Vec<Vec<[i64; 3]>>>,
    /// Running (counter, low, high) per upper median bound and pointer.
    pub umed: Vec<Vec<Vec<[i64; 3]>>>,
}

impl PatternRec {
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            freq: 0,
            act_freq: 0,
            cond: true,
            seq_ids: Vec::new(),
            cohorts: Vec::new(),
            spn: Vec::new(),
            avr: Vec::new(),
            lmed: Vec::new(),
            umed: Vec::new(),
        }
    }

    /// Open a cohort for `seq`: one empty end-pointer list, one empty
    /// aggregate row per active constraint, a fresh feasibility flag,
    /// and one more witnessing sequence counted.
    pub fn open_cohort(&mut self, seq: u32, params: &MiningParams) {
        self.seq_ids.push(seq);
        self.cohorts.push(Vec::new());
        if !params.tot_spn.is_empty() {
            self.spn.push(vec![Vec::new(); params.tot_spn.len()]);
        }
        if !params.tot_avr.is_empty() {
            self.avr.push(vec![Vec::new(); params.tot_avr.len()]);
        }
        if !params.lmedi.is_empty() {
            self.lmed.push(vec![Vec::new(); params.lmedi.len()]);
        }
        if !params.umedi.is_empty() {
            self.umed.push(vec![Vec::new(); params.umedi.len()]);
        }
        self.cond = true;
        self.freq += 1;
    }

    /// True when `seq` already has an open cohort at the tail.
    #[inline]
    pub fn last_cohort_is(&self, seq: u32) -> bool {
        self.seq_ids.last() == Some(&seq)
    }
}

impl Default for PatternRec {
    fn default() -> Self {
        Self::new()
    }
}
