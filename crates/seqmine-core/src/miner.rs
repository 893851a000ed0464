//! Depth-first pattern enumeration.
//!
//! The enumerator pops pattern records off a LIFO queue, walks the MDD
//! children of every end-pointer cohort, consults the arbiter for each
//! candidate child, and pushes the surviving one-item extensions back.
//! A popped pattern with no frequent extension, more than one item, and
//! enough feasible-witness sequences is a maximal pattern and goes into
//! the result.
//!
//! All run state lives in an explicit [`Miner`] context; the enumeration
//! order is fully determined by the input (queue LIFO, items ascending
//! within an extension, sequences in cohort insertion order), so two
//! runs over identical inputs produce identical output.

use tracing::info;

use crate::arbiter::{check_extension, AggRows, Verdict};
use crate::builder::MddBuilder;
use crate::error::MiningError;
use crate::node::NodeArena;
use crate::params::MiningParams;
use crate::pattern::PatternRec;
use crate::summary::SummaryLayout;

/// Mine every frequent maximal pattern under the given constraints.
///
/// Returns one integer row per pattern: the items followed by the
/// pattern's feasible-witness support. An empty result is a normal
/// outcome, not an error.
pub fn mine(params: &MiningParams) -> Result<Vec<Vec<i64>>, MiningError> {
    params.validate()?;
    info!(
        sequences = params.num_sequences,
        alphabet = params.alphabet_size,
        theta = params.theta,
        "mining started"
    );

    let layout = SummaryLayout::new(params);
    let (arena, queue) = MddBuilder::new(params, &layout).build();
    let mut miner = Miner {
        params,
        layout: &layout,
        rows: AggRows::new(params),
        arena: &arena,
        queue,
        results: Vec::new(),
    };
    miner.run();

    info!(patterns = miner.results.len(), "mining finished");
    Ok(miner.results)
}

/// Per-run state of the enumerator.
struct Miner<'a> {
    params: &'a MiningParams,
    layout: &'a SummaryLayout,
    rows: AggRows,
    arena: &'a NodeArena,
    queue: Vec<Option<PatternRec>>,
    results: Vec<Vec<i64>>,
}

impl<'a> Miner<'a> {
    fn run(&mut self) {
        while let Some(slot) = self.queue.pop() {
            match slot {
                Some(patt) if patt.freq >= self.params.theta => self.extend(patt),
                _ => {}
            }
        }
    }

    /// Grow `patt` by every item that stays frequent; emit `patt` itself
    /// when nothing grew out of it.
    fn extend(&mut self, patt: PatternRec) {
        let alphabet = self.params.alphabet_size;
        let mut indic = vec![true; alphabet];
        let mut item_count = vec![0usize; alphabet];
        let mut pot: Vec<Option<PatternRec>> = (0..alphabet).map(|_| None).collect();

        for cohort in 0..patt.seq_ids.len() {
            self.find_items(&patt, cohort, &mut indic, &mut item_count, &mut pot);
        }

        let mut extended = false;
        for (i, slot) in pot.into_iter().enumerate() {
            if item_count[i] >= self.params.theta {
                let mut child = slot.expect("counted item has a record");
                child.items = patt.items.clone();
                child.items.push(i as u32 + 1);
                child.freq = item_count[i];
                self.queue.push(Some(child));
                extended = true;
            }
        }

        // Maximal-pattern emission: nothing frequent grew out of it, it
        // is longer than one item, and enough sequences witnessed a
        // fully feasible occurrence.
        if !extended && patt.items.len() > 1 && patt.act_freq >= self.params.theta {
            let mut row: Vec<i64> = patt.items.iter().map(|&x| x as i64).collect();
            row.push(patt.act_freq as i64);
            self.results.push(row);
        }
    }

    /// Walk one cohort's end-pointers (newest first) and their children
    /// (largest end position first), offering every surviving child to
    /// the per-item potential patterns.
    fn find_items(
        &self,
        patt: &PatternRec,
        cohort: usize,
        indic: &mut [bool],
        item_count: &mut [usize],
        pot: &mut [Option<PatternRec>],
    ) {
        let params = self.params;
        let layout = self.layout;
        let seq = patt.seq_ids[cohort];
        let expensive = params.needs_summaries();

        for (par_pos, &node_id) in patt.cohorts[cohort].iter().enumerate().rev() {
            let node = self.arena.get(node_id as usize);
            let Some(visit) = node.visit_index(seq) else {
                continue;
            };

            for &child_id in node.children[visit].iter().rev() {
                let child = self.arena.get(child_id as usize);
                let item_ix = child.item as usize - 1;
                if !indic[item_ix] {
                    continue;
                }

                let mut verdict = Verdict::Feasible;
                let mut child_row: &[i64] = &[];
                if expensive {
                    let child_visit = child.visit_index(seq).expect("child visited for sequence");
                    child_row = &child.summaries[child_visit];
                    verdict =
                        check_extension(params, layout, &self.rows, patt, cohort, par_pos, child_row);
                    match verdict {
                        Verdict::Prune => break,
                        Verdict::Infeasible => continue,
                        _ => {}
                    }
                }

                // Even if every remaining sequence contributed, this
                // item could no longer reach theta.
                if cohort as i64 - item_count[item_ix] as i64
                    > (patt.freq - params.theta) as i64
                {
                    indic[item_ix] = false;
                    continue;
                }

                let slot = &mut pot[item_ix];
                if slot.is_none() {
                    let mut fresh = PatternRec::new();
                    fresh.open_cohort(seq, params);
                    *slot = Some(fresh);
                    item_count[item_ix] += 1;
                }
                let p = slot.as_mut().expect("slot just filled");
                if !p.last_cohort_is(seq) {
                    p.open_cohort(seq, params);
                    item_count[item_ix] += 1;
                }

                if verdict == Verdict::Feasible && p.cond {
                    p.cond = false;
                    p.act_freq += 1;
                }

                p.cohorts.last_mut().expect("cohort open").push(child_id);

                for (i, &att) in params.tot_spn.iter().enumerate() {
                    let v = child_row[layout.value(att)];
                    let parent = patt.spn[cohort][i][par_pos];
                    p.spn.last_mut().expect("cohort open")[i]
                        .push([parent[0].min(v), parent[1].max(v)]);
                }
                for (i, &att) in params.tot_avr.iter().enumerate() {
                    let v = child_row[layout.value(att)];
                    p.avr.last_mut().expect("cohort open")[i]
                        .push(patt.avr[cohort][i][par_pos] + v);
                }
                for (i, &att) in params.lmedi.iter().enumerate() {
                    let v = child_row[layout.value(att)];
                    let parent = patt.lmed[cohort][i][par_pos];
                    let agg = if v < params.lmed[i] {
                        [parent[0] - 1, parent[1].max(v), parent[2]]
                    } else {
                        [parent[0] + 1, parent[1], parent[2].min(v)]
                    };
                    p.lmed.last_mut().expect("cohort open")[i].push(agg);
                }
                for (i, &att) in params.umedi.iter().enumerate() {
                    let v = child_row[layout.value(att)];
                    let parent = patt.umed[cohort][i][par_pos];
                    let agg = if v <= params.umed[i] {
                        [parent[0] + 1, parent[1].max(v), parent[2]]
                    } else {
                        [parent[0] - 1, parent[1], parent[2].min(v)]
                    };
                    p.umed.last_mut().expect("cohort open")[i].push(agg);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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

    #[test]
    fn shared_two_item_patterns() {
        let params = unconstrained(vec![vec![1, 2, 3], vec![1, 2], vec![2, 3]], 2);
        let mut rows = mine(&params).expect("valid input");
        rows.sort();
        assert_eq!(rows, vec![vec![1, 2, 2], vec![2, 3, 2]]);
    }

    #[test]
    fn repeated_items_keep_maximal_forms() {
        let params = unconstrained(vec![vec![1, 1, 2], vec![1, 1, 2]], 2);
        let mut rows = mine(&params).expect("valid input");
        rows.sort();
        assert_eq!(rows, vec![vec![1, 1, 2, 2], vec![1, 2, 2]]);
    }

    #[test]
    fn empty_database_mines_empty() {
        let params = MiningParams {
            alphabet_size: 3,
            theta: 1,
            ..Default::default()
        };
        assert_eq!(mine(&params).expect("valid input"), Vec::<Vec<i64>>::new());
    }

    #[test]
    fn prefixes_of_extendable_patterns_are_not_emitted() {
        let params = unconstrained(vec![vec![1, 2, 3]], 1);
        let rows = mine(&params).expect("valid input");
        // [1, 2] grows into [1, 2, 3] and must not be emitted itself;
        // the suffix subsequences [1, 3] and [2, 3] have no extension
        // and are maximal in their own right.
        assert!(rows.contains(&vec![1, 2, 3, 1]));
        assert!(!rows.iter().any(|r| r[..r.len() - 1] == [1, 2]));
        let mut sorted = rows.clone();
        sorted.sort();
        assert_eq!(sorted, vec![vec![1, 2, 3, 1], vec![1, 3, 1], vec![2, 3, 1]]);
    }
}
