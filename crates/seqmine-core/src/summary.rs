//! Attribute summary kernel.
//!
//! Every MDD node carries, per visiting sequence and per attribute, a
//! fixed-width integer summary block describing the best feasible
//! continuation from that node:
//!
//! ```text
//! [ v, min, max, sum_u, sum_l, cnt_u, cnt_l, (c, lo, hi) x num_med ]
//! ```
//!
//! - `v` is the event's attribute value (always present),
//! - `min`/`max` exist when a lower span bound applies (2 slots),
//! - `sum`/`cnt` pairs exist per average bound and hold the extremal
//!   witness-sum/witness-count pair for that bound,
//! - `(c, lo, hi)` triples exist per median bound: a signed counter of
//!   good-side minus bad-side values over the best continuation, and the
//!   tie-breaking central pair used when the counter lands on zero.
//!
//! Blocks for all attributes of one (node, sequence) visit are packed
//! into a single flat row; [`SummaryLayout`] owns the offset arithmetic,
//! which is shared contract between the builder, the seeder and the
//! arbiter. The three fold combinators are pure on integers, never fail,
//! and run in O(1).

use smallvec::SmallVec;

use crate::params::MiningParams;

/// One packed summary row covering every attribute of a (node, sequence)
/// visit. Small inline capacity: a single constrained attribute needs at
/// most 8 slots.
pub type SummaryRow = SmallVec<[i64; 8]>;

/// Offset arithmetic for packed summary rows.
#[derive(Debug, Clone)]
pub struct SummaryLayout {
    /// Base offset of each attribute's block within a row.
    offsets: Vec<usize>,
    /// Total row width.
    width: usize,
    num_minmax: Vec<usize>,
    num_avr: Vec<usize>,
    num_med: Vec<usize>,
}

impl SummaryLayout {
    pub fn new(params: &MiningParams) -> Self {
        let mut offsets = Vec::with_capacity(params.num_attributes);
        let mut width = 0;
        for att in 0..params.num_attributes {
            offsets.push(width);
            width += 1
                + params.num_minmax[att]
                + 2 * params.num_avr[att]
                + 3 * params.num_med[att];
        }
        Self {
            offsets,
            width,
            num_minmax: params.num_minmax.clone(),
            num_avr: params.num_avr.clone(),
            num_med: params.num_med.clone(),
        }
    }

    /// Total slots per row.
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Slot holding the event's own attribute value.
    #[inline]
    pub fn value(&self, att: usize) -> usize {
        self.offsets[att]
    }

    /// Minimum over all feasible continuations (lower span bounds only).
    #[inline]
    pub fn span_min(&self, att: usize) -> usize {
        self.offsets[att] + 1
    }

    /// Maximum over all feasible continuations (lower span bounds only).
    #[inline]
    pub fn span_max(&self, att: usize) -> usize {
        self.offsets[att] + 2
    }

    /// Witness sum for the upper average bound.
    #[inline]
    pub fn avr_sum_upper(&self, att: usize) -> usize {
        self.offsets[att] + self.num_minmax[att] + 1
    }

    /// Witness sum for the lower average bound. Coincides with the upper
    /// slot when only one average bound applies.
    #[inline]
    pub fn avr_sum_lower(&self, att: usize) -> usize {
        self.offsets[att] + self.num_minmax[att] + self.num_avr[att]
    }

    /// Witness count for the upper average bound.
    #[inline]
    pub fn avr_cnt_upper(&self, att: usize) -> usize {
        self.offsets[att] + self.num_minmax[att] + self.num_avr[att] + 1
    }

    /// Witness count for the lower average bound.
    #[inline]
    pub fn avr_cnt_lower(&self, att: usize) -> usize {
        self.offsets[att] + self.num_minmax[att] + 2 * self.num_avr[att]
    }

    /// Base of the median triple for the given bound direction. The
    /// lower-median triple comes first; with a single median bound both
    /// directions share one triple.
    #[inline]
    fn med_base(&self, att: usize, upper: bool) -> usize {
        let base = self.offsets[att] + self.num_minmax[att] + 2 * self.num_avr[att];
        if upper {
            base + 3 * (self.num_med[att] - 1)
        } else {
            base
        }
    }

    /// Signed good-minus-bad counter of the best continuation.
    #[inline]
    pub fn med_counter(&self, att: usize, upper: bool) -> usize {
        self.med_base(att, upper) + 1
    }

    /// Lower central value of the tie-breaking pair.
    #[inline]
    pub fn med_low(&self, att: usize, upper: bool) -> usize {
        self.med_base(att, upper) + 2
    }

    /// Upper central value of the tie-breaking pair.
    #[inline]
    pub fn med_high(&self, att: usize, upper: bool) -> usize {
        self.med_base(att, upper) + 3
    }

    /// Build the initial row for the event at `pos` (1-based) of `seq`.
    ///
    /// Every slot of an attribute block starts at the event's value, the
    /// average witness counts start at 1 (the continuation consisting of
    /// this event alone), and the median triples start with a zero
    /// counter and a sentinel on the side the event does not occupy.
    pub fn new_row(&self, params: &MiningParams, seq: usize, pos: usize) -> SummaryRow {
        let mut row = SummaryRow::with_capacity(self.width);
        for att in 0..params.num_attributes {
            let v = params.attrs[att][seq][pos - 1];
            let slots = 1 + self.num_minmax[att] + 2 * self.num_avr[att] + 3 * self.num_med[att];
            for _ in 0..slots {
                row.push(v);
            }
            for k in 0..self.num_avr[att] {
                row[self.offsets[att] + 1 + self.num_minmax[att] + self.num_avr[att] + k] = 1;
            }
        }
        for (k, &att) in params.lmedi.iter().enumerate() {
            let v = params.attrs[att][seq][pos - 1];
            row[self.med_counter(att, false)] = 0;
            if v < params.lmed[k] {
                row[self.med_high(att, false)] = params.max_attrs[att] + 1;
            } else {
                row[self.med_low(att, false)] = params.min_attrs[att] - 1;
            }
        }
        for (k, &att) in params.umedi.iter().enumerate() {
            let v = params.attrs[att][seq][pos - 1];
            row[self.med_counter(att, true)] = 0;
            if v > params.umed[k] {
                row[self.med_low(att, true)] = params.min_attrs[att] - 1;
            } else {
                row[self.med_high(att, true)] = params.max_attrs[att] + 1;
            }
        }
        row
    }

    /// Fold a child's continuation min/max into the parent. Used for
    /// lower span bounds.
    pub fn fold_minmax(&self, att: usize, parent: &mut [i64], child: &[i64]) {
        if child[self.span_min(att)] < parent[self.span_min(att)] {
            parent[self.span_min(att)] = child[self.span_min(att)];
        }
        if child[self.span_max(att)] > parent[self.span_max(att)] {
            parent[self.span_max(att)] = child[self.span_max(att)];
        }
    }

    /// Fold a child's witness-sum/count pair into the parent, keeping
    /// whichever continuation is most favorable for the average bound:
    /// for an upper bound the pair maximizing `limit·count − sum`, for a
    /// lower bound the pair minimizing it.
    pub fn fold_sum(&self, att: usize, limit: i64, upper: bool, parent: &mut [i64], child: &[i64]) {
        let v = parent[self.value(att)];
        if upper {
            let (sum, cnt) = (self.avr_sum_upper(att), self.avr_cnt_upper(att));
            if limit * (1 + child[cnt]) - (v + child[sum]) > limit * parent[cnt] - parent[sum] {
                parent[sum] = v + child[sum];
                parent[cnt] = 1 + child[cnt];
            }
        } else {
            let (sum, cnt) = (self.avr_sum_lower(att), self.avr_cnt_lower(att));
            if limit * (1 + child[cnt]) - (v + child[sum]) < limit * parent[cnt] - parent[sum] {
                parent[sum] = v + child[sum];
                parent[cnt] = 1 + child[cnt];
            }
        }
    }

    /// Fold a child's median triple into the parent.
    ///
    /// The candidate continuation routes through the child: its counter
    /// is the child's counter plus ±1 for the child's own value, and its
    /// central pair tightens the child's pair with the child's value (or
    /// a sentinel on the side the value does not occupy). A strictly
    /// larger counter always wins; on a tie the continuation whose
    /// two-value midpoint satisfies the bound wins, and among equally
    /// (in)feasible continuations the one with the tighter extremal.
    pub fn fold_median(
        &self,
        att: usize,
        limit: i64,
        upper: bool,
        min_attr: i64,
        max_attr: i64,
        parent: &mut [i64],
        child: &[i64],
    ) {
        let c_ix = self.med_counter(att, upper);
        let lo_ix = self.med_low(att, upper);
        let hi_ix = self.med_high(att, upper);
        let v = child[self.value(att)];

        let (step, cand_lo, cand_hi) = if upper {
            if v <= limit {
                (1, v, max_attr + 1)
            } else {
                (-1, min_attr - 1, v)
            }
        } else if v >= limit {
            (1, min_attr - 1, v)
        } else {
            (-1, v, max_attr + 1)
        };

        let cand_c = child[c_ix] + step;
        if cand_c > parent[c_ix] {
            parent[c_ix] = cand_c;
            parent[lo_ix] = cand_lo.max(child[lo_ix]);
            parent[hi_ix] = cand_hi.min(child[hi_ix]);
        } else if cand_c == parent[c_ix] {
            let lo = cand_lo.max(child[lo_ix]);
            let hi = cand_hi.min(child[hi_ix]);
            // Midpoint comparisons doubled to stay in integers.
            let cur = parent[lo_ix] + parent[hi_ix];
            let new = lo + hi;
            let lim2 = 2 * limit;
            let take = if upper {
                (new <= lim2 && cur > lim2)
                    || (new <= lim2 && cur <= lim2 && hi < parent[hi_ix])
                    || (new > lim2 && cur > lim2 && lo < parent[lo_ix])
            } else {
                (new >= lim2 && cur < lim2)
                    || (new >= lim2 && cur >= lim2 && lo > parent[lo_ix])
                    || (new < lim2 && cur < lim2 && hi > parent[hi_ix])
            };
            if take {
                parent[lo_ix] = lo;
                parent[hi_ix] = hi;
            }
        }
    }
}
