//! MDD construction.
//!
//! For every sequence the builder enumerates candidate (start, end)
//! position pairs end-first in descending order, cuts candidates with
//! the anti-monotone upper-gap retreat, checks the remaining gap bounds,
//! and installs arcs. Because ends are processed before starts, a
//! node's summary row already covers every feasible continuation beyond
//! it by the time an incoming arc folds it; that ordering is what makes
//! the one-pass summary construction sound.
//!
//! After each installed arc the start node is offered to the DFS queue
//! as a length-1 pattern, guarded by can-this-ever-become-feasible
//! checks against the node summaries.

use tracing::debug;

use crate::node::{NodeArena, NodeId};
use crate::params::MiningParams;
use crate::pattern::PatternRec;
use crate::summary::SummaryLayout;

/// Builds the MDD and the seeded DFS queue for one mining run.
pub struct MddBuilder<'a> {
    params: &'a MiningParams,
    layout: &'a SummaryLayout,
    arena: NodeArena,
    queue: Vec<Option<PatternRec>>,
}

impl<'a> MddBuilder<'a> {
    pub fn new(params: &'a MiningParams, layout: &'a SummaryLayout) -> Self {
        Self {
            params,
            layout,
            arena: NodeArena::new(params.max_seq_len, params.alphabet_size),
            queue: (0..params.alphabet_size).map(|_| None).collect(),
        }
    }

    /// Run construction and hand the MDD plus the seeded queue to the
    /// enumerator. The queue holds at most one length-1 pattern per
    /// item, in item order.
    pub fn build(mut self) -> (NodeArena, Vec<Option<PatternRec>>) {
        self.populate();
        debug!(
            nodes = self.arena.node_count(),
            seeds = self.queue.iter().filter(|s| s.is_some()).count(),
            "MDD construction finished"
        );
        (self.arena, self.queue)
    }

    /// Enumerate position pairs per sequence. The retreat flag is shared
    /// across sequences and only reset when an upper gap bound exists;
    /// `endp` is restored after every sweep so the next start position
    /// re-enters the retreat from where the previous one stopped.
    /// Changing this flow makes the enumeration quadratic on inputs
    /// where the retreat does the cutting.
    fn populate(&mut self) {
        let p = self.params;
        let upper0 = p.upper_gap_on_attr0();
        let lower0 = p.lower_gap_on_attr0();
        let oracle_redundant = p.gap_oracle_redundant();
        let has_ugap = !p.ugap.is_empty();

        let mut antmon = false;
        for seq in 0..p.num_sequences {
            let len = p.items[seq].len();
            if len < 2 {
                continue;
            }
            let mut endp = len;
            let mut strp = len - 1;
            while strp > 0 {
                while !antmon {
                    if upper0
                        && p.attrs[0][seq][endp - 1] - p.attrs[0][seq][strp - 1] > p.ugap[0]
                    {
                        endp -= 1;
                        if strp == endp {
                            strp -= 1;
                            if strp == 0 {
                                break;
                            }
                        }
                    } else {
                        antmon = true;
                    }
                }
                if antmon {
                    let last_p = endp;
                    while endp != strp {
                        if lower0
                            && p.attrs[0][seq][endp - 1] - p.attrs[0][seq][strp - 1] < p.lgap[0]
                        {
                            break;
                        }
                        if oracle_redundant || self.check_gap(seq, strp, endp) {
                            self.add_arc(seq, strp, endp);
                        }
                        endp -= 1;
                    }
                    strp -= 1;
                    if has_ugap {
                        antmon = false;
                    }
                    endp = last_p;
                }
            }
        }
    }

    /// The general gap oracle over every gap bound. Bounds with a zero
    /// limit are inert.
    fn check_gap(&self, seq: usize, strp: usize, endp: usize) -> bool {
        let p = self.params;
        for (k, &att) in p.lgapi.iter().enumerate() {
            if p.lgap[k] == 0 {
                continue;
            }
            if (p.attrs[att][seq][endp - 1] - p.attrs[att][seq][strp - 1]).abs() < p.lgap[k] {
                return false;
            }
        }
        for (k, &att) in p.ugapi.iter().enumerate() {
            if p.ugap[k] == 0 {
                continue;
            }
            if (p.attrs[att][seq][endp - 1] - p.attrs[att][seq][strp - 1]).abs() > p.ugap[k] {
                return false;
            }
        }
        true
    }

    /// Install one arc `strp -> endp` (1-based positions) for `seq`:
    /// materialize both endpoints, open their per-sequence state, record
    /// the child and fold its summaries into the source, then try to
    /// seed the source as a length-1 pattern.
    fn add_arc(&mut self, seq: usize, strp: usize, endp: usize) {
        let items = &self.params.items[seq];
        let from = self.arena.slot_of(items[strp - 1], strp);
        let to = self.arena.slot_of(items[endp - 1], endp);
        self.arena.ensure(from);
        self.arena.ensure(to);

        self.visit(to, seq, endp);
        self.visit(from, seq, strp);
        self.record_arc(from, to);
        self.seed_pattern(seq, from, to);
    }

    /// Open-sequence phase: on the first touch of a node for `seq`,
    /// append the sequence, start its child list, and initialize its
    /// summary row from the event at `lvl`.
    fn visit(&mut self, slot: usize, seq: usize, lvl: usize) {
        let params = self.params;
        let layout = self.layout;
        let needs_summaries = params.needs_summaries();
        let node = self.arena.get_mut(slot);
        if !node.last_visit_is(seq as u32) {
            node.seq_ids.push(seq as u32);
            node.children.push(Vec::new());
            node.item = params.items[seq][lvl - 1];
            if needs_summaries {
                node.summaries.push(layout.new_row(params, seq, lvl));
            }
        }
    }

    /// Arc-recording phase: append the child and fold every active
    /// bound's summary from the child into the source.
    fn record_arc(&mut self, from: usize, to: usize) {
        let params = self.params;
        let layout = self.layout;
        let (fnode, tnode) = self.arena.arc_pair_mut(from, to);
        fnode
            .children
            .last_mut()
            .expect("source visited before arc recording")
            .push(to as NodeId);

        if !params.needs_summaries() {
            return;
        }
        let child = tnode.summaries.last().expect("target visited");
        let parent = fnode.summaries.last_mut().expect("source visited");
        for &att in &params.lspni {
            layout.fold_minmax(att, parent, child);
        }
        for (k, &att) in params.uavri.iter().enumerate() {
            layout.fold_sum(att, params.uavr[k], true, parent, child);
        }
        for (k, &att) in params.lavri.iter().enumerate() {
            layout.fold_sum(att, params.lavr[k], false, parent, child);
        }
        for (k, &att) in params.umedi.iter().enumerate() {
            layout.fold_median(
                att,
                params.umed[k],
                true,
                params.min_attrs[att],
                params.max_attrs[att],
                parent,
                child,
            );
        }
        for (k, &att) in params.lmedi.iter().enumerate() {
            layout.fold_median(
                att,
                params.lmed[k],
                false,
                params.min_attrs[att],
                params.max_attrs[att],
                parent,
                child,
            );
        }
    }

    /// Try to seed the arc source as a length-1 pattern for `seq`, once
    /// per sequence. Seeding is refused while the node's summaries prove
    /// that no extension can ever satisfy a lower span, an average, or a
    /// median bound; a later arc from the same node retries with the
    /// then-updated summaries.
    fn seed_pattern(&mut self, seq: usize, from: usize, to: usize) {
        let params = self.params;
        let layout = self.layout;
        let seq_id = seq as u32;

        let fnode = self.arena.get(from);
        if fnode.last_seeded == Some(seq_id) {
            return;
        }

        if let Some(frow) = fnode.summaries.last() {
            let tnode = self.arena.get(to);
            let trow = tnode.summaries.last().expect("target visited");

            for (k, &att) in params.lspni.iter().enumerate() {
                if frow[layout.span_max(att)] - frow[layout.span_min(att)] < params.lspn[k] {
                    return;
                }
            }
            // Ratios compared by cross-multiplication; witness counts
            // keep the denominators positive.
            for (k, &att) in params.lavri.iter().enumerate() {
                if frow[layout.value(att)] + trow[layout.avr_sum_lower(att)]
                    < params.lavr[k] * (1 + trow[layout.avr_cnt_lower(att)])
                {
                    return;
                }
            }
            for (k, &att) in params.uavri.iter().enumerate() {
                if frow[layout.value(att)] + trow[layout.avr_sum_upper(att)]
                    > params.uavr[k] * (1 + trow[layout.avr_cnt_upper(att)])
                {
                    return;
                }
            }
            for (k, &att) in params.umedi.iter().enumerate() {
                let v = frow[layout.value(att)];
                if v > params.umed[k] {
                    let c = frow[layout.med_counter(att, true)] - 1;
                    if c < 0 {
                        return;
                    }
                    if c == 0 {
                        let hi = v.min(frow[layout.med_high(att, true)]);
                        if hi + frow[layout.med_low(att, true)] > 2 * params.umed[k] {
                            return;
                        }
                    }
                }
            }
            for (k, &att) in params.lmedi.iter().enumerate() {
                let v = frow[layout.value(att)];
                if v < params.lmed[k] {
                    let c = frow[layout.med_counter(att, false)] - 1;
                    if c < 0 {
                        return;
                    }
                    if c == 0 {
                        let lo = v.max(frow[layout.med_low(att, false)]);
                        if lo + frow[layout.med_high(att, false)] < 2 * params.lmed[k] {
                            return;
                        }
                    }
                }
            }
        }

        let item = fnode.item;
        let slot = &mut self.queue[item as usize - 1];
        if slot.is_none() {
            let mut patt = PatternRec::new();
            patt.items.push(item);
            patt.open_cohort(seq_id, params);
            *slot = Some(patt);
        }
        let patt = slot.as_mut().expect("slot just filled");
        if !patt.last_cohort_is(seq_id) {
            patt.open_cohort(seq_id, params);
        }
        patt.cohorts
            .last_mut()
            .expect("cohort open")
            .push(from as NodeId);

        if let Some(frow) = self.arena.get(from).summaries.last() {
            for (i, &att) in params.tot_spn.iter().enumerate() {
                let v = frow[layout.value(att)];
                patt.spn.last_mut().expect("cohort open")[i].push([v, v]);
            }
            for (i, &att) in params.tot_avr.iter().enumerate() {
                patt.avr.last_mut().expect("cohort open")[i].push(frow[layout.value(att)]);
            }
            for (i, &att) in params.lmedi.iter().enumerate() {
                let v = frow[layout.value(att)];
                let agg = if v < params.lmed[i] {
                    [-1, v, params.max_attrs[att] + 1]
                } else {
                    [1, params.min_attrs[att] - 1, v]
                };
                patt.lmed.last_mut().expect("cohort open")[i].push(agg);
            }
            for (i, &att) in params.umedi.iter().enumerate() {
                let v = frow[layout.value(att)];
                let agg = if v <= params.umed[i] {
                    [1, v, params.max_attrs[att] + 1]
                } else {
                    [-1, params.min_attrs[att] - 1, v]
                };
                patt.umed.last_mut().expect("cohort open")[i].push(agg);
            }
        }

        self.arena.get_mut(from).last_seeded = Some(seq_id);
    }
}
