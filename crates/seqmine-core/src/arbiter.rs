//! Constraint arbiter.
//!
//! One oracle decides the fate of a candidate extension: a pattern's
//! running aggregates at a given end-pointer column, combined with the
//! child node's summary row, against every active span/average/median
//! bound. The verdict space is deliberately four-valued so the caller
//! gets prune/skip/accept/defer out of a single fast call.
//!
//! Checks run in a fixed order (upper span, lower span, upper average,
//! lower average, lower median, upper median) and return eagerly:
//! a [`Verdict::Prune`] stops the whole child sweep (anti-monotone
//! violation on the time-like attribute), a [`Verdict::Infeasible`]
//! skips just this child.

use crate::params::MiningParams;
use crate::pattern::PatternRec;
use crate::summary::SummaryLayout;

/// Outcome of one extension check, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Anti-monotone violation: no later child of this end-pointer can
    /// recover. Abort the child sweep.
    Prune,
    /// This occurrence is infeasible and cannot become feasible through
    /// any continuation of this child. Skip the child.
    Infeasible,
    /// Every bound holds right now: a feasible witness.
    Feasible,
    /// Some bound is violated now but a continuation can still fix it:
    /// keep the occurrence, do not credit feasibility.
    Candidate,
}

/// Row lookup from a bound's position in its limit vector to the
/// pattern-aggregate row it reads. Span rows follow `tot_spn` order and
/// average rows `tot_avr` order, so a bound finds its row through the
/// position of its attribute in the family vector.
#[derive(Debug, Clone)]
pub struct AggRows {
    uspn: Vec<usize>,
    lspn: Vec<usize>,
    uavr: Vec<usize>,
    lavr: Vec<usize>,
}

impl AggRows {
    /// Precompute the row of every span/average bound. `validate()`
    /// guarantees each bound's attribute appears in its family vector.
    pub fn new(params: &MiningParams) -> Self {
        let position = |family: &[usize], att: usize| {
            family
                .iter()
                .position(|&a| a == att)
                .expect("bound attribute missing from family vector")
        };
        Self {
            uspn: params.uspni.iter().map(|&a| position(&params.tot_spn, a)).collect(),
            lspn: params.lspni.iter().map(|&a| position(&params.tot_spn, a)).collect(),
            uavr: params.uavri.iter().map(|&a| position(&params.tot_avr, a)).collect(),
            lavr: params.lavri.iter().map(|&a| position(&params.tot_avr, a)).collect(),
        }
    }
}

/// Judge extending the occurrence at `patt.cohorts[cohort][par_pos]`
/// with the child whose summary row (for the same sequence) is
/// `child_row`.
///
/// All ratio and midpoint comparisons are exact: averages compare by
/// cross-multiplication against always-positive denominators, midpoints
/// compare doubled.
pub fn check_extension(
    params: &MiningParams,
    layout: &SummaryLayout,
    rows: &AggRows,
    patt: &PatternRec,
    cohort: usize,
    par_pos: usize,
    child_row: &[i64],
) -> Verdict {
    let mut candidate = false;

    // Upper span. On the time-like attribute the running minimum only
    // grows away from later children, so a violation prunes the sweep.
    for (k, &att) in params.uspni.iter().enumerate() {
        let agg = patt.spn[cohort][rows.uspn[k]][par_pos];
        let v = child_row[layout.value(att)];
        if att == 0 {
            if v - agg[0] > params.uspn[k] {
                return Verdict::Prune;
            }
        } else {
            let act = if v < agg[0] {
                agg[1] - v
            } else if v > agg[1] {
                v - agg[0]
            } else {
                agg[1] - agg[0]
            };
            if act > params.uspn[k] {
                return Verdict::Infeasible;
            }
        }
    }

    // Lower span: a shortfall is only fatal when even the widest
    // extensible range cannot reach the bound.
    for (k, &att) in params.lspni.iter().enumerate() {
        let agg = patt.spn[cohort][rows.lspn[k]][par_pos];
        let v = child_row[layout.value(att)];
        if att == 0 {
            if v - agg[0] < params.lspn[k] {
                if child_row[layout.span_max(att)] - agg[0] < params.lspn[k] {
                    return Verdict::Infeasible;
                }
                candidate = true;
            }
        } else {
            let act = if v < agg[0] {
                agg[1] - v
            } else if v > agg[1] {
                v - agg[0]
            } else {
                agg[1] - agg[0]
            };
            if act < params.lspn[k] {
                let high = child_row[layout.span_max(att)].max(agg[1]);
                let low = child_row[layout.span_min(att)].min(agg[0]);
                if high - low < params.lspn[k] {
                    return Verdict::Infeasible;
                }
                candidate = true;
            }
        }
    }

    let len = patt.items.len() as i64;

    // Upper average: actual extended average, then the child's most
    // pessimistic witness as the last word.
    for (k, &att) in params.uavri.iter().enumerate() {
        let num = patt.avr[cohort][rows.uavr[k]][par_pos];
        let v = child_row[layout.value(att)];
        if num + v <= params.uavr[k] * (len + 1) {
            continue;
        }
        candidate = true;
        if num + child_row[layout.avr_sum_upper(att)]
            > params.uavr[k] * (len + child_row[layout.avr_cnt_upper(att)])
        {
            return Verdict::Infeasible;
        }
    }

    // Lower average, symmetric.
    for (k, &att) in params.lavri.iter().enumerate() {
        let num = patt.avr[cohort][rows.lavr[k]][par_pos];
        let v = child_row[layout.value(att)];
        if num + v >= params.lavr[k] * (len + 1) {
            continue;
        }
        candidate = true;
        if num + child_row[layout.avr_sum_lower(att)]
            < params.lavr[k] * (len + child_row[layout.avr_cnt_lower(att)])
        {
            return Verdict::Infeasible;
        }
    }

    // Lower median: combine the running counter with the child's value,
    // break a zero tie on the central pair, and fall back to the
    // child's best-case continuation before giving up.
    for (k, &att) in params.lmedi.iter().enumerate() {
        let lim = params.lmed[k];
        let agg = patt.lmed[cohort][k][par_pos];
        let v = child_row[layout.value(att)];
        let c_ix = layout.med_counter(att, false);
        let lo_ix = layout.med_low(att, false);
        let hi_ix = layout.med_high(att, false);
        if v < lim {
            let c = agg[0] - 1;
            if c > 0 {
                continue;
            }
            if c == 0 {
                let lo = agg[1].max(v);
                if agg[2] + lo >= 2 * lim {
                    continue;
                }
            }
            if c + child_row[c_ix] < 0 {
                return Verdict::Infeasible;
            }
            if c + child_row[c_ix] == 0 {
                let lo = agg[1].max(v).max(child_row[lo_ix]);
                let hi = agg[2].min(child_row[hi_ix]);
                if hi + lo < 2 * lim {
                    return Verdict::Infeasible;
                }
            }
            candidate = true;
        } else {
            let c = agg[0] + 1;
            if c > 0 {
                continue;
            }
            if c == 0 {
                let hi = agg[2].min(v);
                if hi + agg[1] >= 2 * lim {
                    continue;
                }
            }
            if c + child_row[c_ix] < 0 {
                return Verdict::Infeasible;
            }
            if c + child_row[c_ix] == 0 {
                let lo = agg[1].max(child_row[lo_ix]);
                let hi = agg[2].min(v).min(child_row[hi_ix]);
                if hi + lo < 2 * lim {
                    return Verdict::Infeasible;
                }
            }
            candidate = true;
        }
    }

    // Upper median, mirrored.
    for (k, &att) in params.umedi.iter().enumerate() {
        let lim = params.umed[k];
        let agg = patt.umed[cohort][k][par_pos];
        let v = child_row[layout.value(att)];
        let c_ix = layout.med_counter(att, true);
        let lo_ix = layout.med_low(att, true);
        let hi_ix = layout.med_high(att, true);
        if v > lim {
            let c = agg[0] - 1;
            if c > 0 {
                continue;
            }
            if c == 0 {
                let hi = agg[2].min(v);
                if hi + agg[1] <= 2 * lim {
                    continue;
                }
            }
            if c + child_row[c_ix] < 0 {
                return Verdict::Infeasible;
            }
            if c + child_row[c_ix] == 0 {
                let lo = agg[1].max(child_row[lo_ix]);
                let hi = agg[2].min(v).min(child_row[hi_ix]);
                if hi + lo > 2 * lim {
                    return Verdict::Infeasible;
                }
            }
            candidate = true;
        } else {
            let c = agg[0] + 1;
            if c > 0 {
                continue;
            }
            if c == 0 {
                let lo = agg[1].max(v);
                if agg[2] + lo <= 2 * lim {
                    continue;
                }
            }
            if c + child_row[c_ix] < 0 {
                return Verdict::Infeasible;
            }
            if c + child_row[c_ix] == 0 {
                let lo = agg[1].max(v).max(child_row[lo_ix]);
                let hi = agg[2].min(child_row[hi_ix]);
                if hi + lo > 2 * lim {
                    return Verdict::Infeasible;
                }
            }
            candidate = true;
        }
    }

    if candidate {
        Verdict::Candidate
    } else {
        Verdict::Feasible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// One attribute with upper span 4 and upper median 5; the pattern
    /// has a single cohort with one end-pointer column.
    fn fixture() -> (MiningParams, SummaryLayout, AggRows, PatternRec) {
        let params = MiningParams {
            num_sequences: 1,
            max_seq_len: 4,
            alphabet_size: 2,
            num_attributes: 1,
            theta: 1,
            items: vec![vec![1, 2, 1, 2]],
            attrs: vec![vec![vec![1, 3, 6, 9]]],
            max_attrs: vec![9],
            min_attrs: vec![1],
            uspn: vec![4],
            uspni: vec![0],
            umed: vec![5],
            umedi: vec![0],
            num_minmax: vec![0],
            num_avr: vec![0],
            num_med: vec![1],
            tot_spn: vec![0],
            ..Default::default()
        };
        let layout = SummaryLayout::new(&params);
        let rows = AggRows::new(&params);
        let mut patt = PatternRec::new();
        patt.items = vec![1];
        patt.open_cohort(0, &params);
        patt.spn[0][0].push([1, 1]);
        patt.umed[0][0].push([1, 1, 10]);
        (params, layout, rows, patt)
    }

    #[test]
    fn upper_span_violation_on_attr0_prunes() {
        let (params, layout, rows, patt) = fixture();
        // Child value 9: span 9 - 1 = 8 > 4 on the time-like attribute.
        let child = layout.new_row(&params, 0, 4);
        let v = check_extension(&params, &layout, &rows, &patt, 0, 0, &child);
        assert_eq!(v, Verdict::Prune);
    }

    #[test]
    fn feasible_when_all_bounds_hold() {
        let (params, layout, rows, patt) = fixture();
        // Child value 3: span 2, median counter 1 + 1 = 2 > 0.
        let child = layout.new_row(&params, 0, 2);
        let v = check_extension(&params, &layout, &rows, &patt, 0, 0, &child);
        assert_eq!(v, Verdict::Feasible);
    }

    #[test]
    fn median_tie_breaks_on_central_pair() {
        let (params, layout, rows, mut patt) = fixture();
        // Running counter 0 with central pair (1, 6): child value 6 > 5
        // drops the counter to -1; the child's own summary decides.
        patt.umed[0][0][0] = [0, 1, 6];
        patt.spn[0][0][0] = [2, 4];
        let child = layout.new_row(&params, 0, 3);
        let v = check_extension(&params, &layout, &rows, &patt, 0, 0, &child);
        // Child at position 3 is a leaf-like visit here: counter 0, so
        // -1 + 0 < 0 and the occurrence is dead.
        assert_eq!(v, Verdict::Infeasible);
    }

    #[test]
    fn candidate_when_extension_can_recover() {
        let (params, layout, rows, mut patt) = fixture();
        // Counter 1, child value 6 > 5: counter drops to 0 and the
        // midpoint of (1, 6) is 3.5 <= 5, still feasible... choose a
        // central pair whose midpoint fails instead, with a child whose
        // continuation counter rescues it.
        patt.umed[0][0][0] = [1, 6, 7];
        patt.spn[0][0][0] = [3, 6];
        let mut child = layout.new_row(&params, 0, 3);
        child[layout.med_counter(0, true)] = 1;
        let v = check_extension(&params, &layout, &rows, &patt, 0, 0, &child);
        assert_eq!(v, Verdict::Candidate);
    }

    #[test]
    fn agg_rows_map_bounds_to_family_positions() {
        let params = MiningParams {
            num_attributes: 3,
            uspni: vec![2],
            uspn: vec![10],
            lspni: vec![1],
            lspn: vec![1],
            lavri: vec![2],
            lavr: vec![0],
            tot_spn: vec![1, 2],
            tot_avr: vec![2],
            num_minmax: vec![0, 2, 0],
            num_avr: vec![0, 0, 1],
            num_med: vec![0, 0, 0],
            ..Default::default()
        };
        let rows = AggRows::new(&params);
        assert_eq!(rows.uspn, vec![1]);
        assert_eq!(rows.lspn, vec![0]);
        assert_eq!(rows.lavr, vec![0]);
    }
}
