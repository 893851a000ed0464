//! Constraint-model API.
//!
//! [`PatternMiner`] owns a sequence database over an arbitrary item type,
//! a set of event attributes, and a store of constraints on those
//! attributes. Items are interned into dense ids in order of first
//! occurrence before mining and mapped back afterwards; support counts
//! and the emitted pattern set are invariant under relabeling, so the
//! interning is purely an encoding.
//!
//! ```
//! use seqmine_core::api::{Attribute, MinFrequency, PatternMiner};
//!
//! let miner = PatternMiner::new(vec![vec![1, 2, 3], vec![1, 2], vec![2, 3]]).unwrap();
//! let patterns = miner.mine(MinFrequency::Count(2)).unwrap();
//! assert_eq!(patterns.len(), 2);
//! ```

use std::hash::Hash;

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::error::MiningError;
use crate::miner;
use crate::params::MiningParams;

/// Per-event integer values for one attribute, with cached extrema used
/// as median sentinels.
#[derive(Debug, Clone)]
pub struct Attribute {
    values: Vec<Vec<i64>>,
    min: i64,
    max: i64,
}

impl Attribute {
    /// Build an attribute from per-event values, one row per sequence.
    pub fn new(values: Vec<Vec<i64>>) -> Result<Self, MiningError> {
        if values.is_empty() {
            return Err(MiningError::EmptyDatabase);
        }
        for (index, row) in values.iter().enumerate() {
            if row.is_empty() {
                return Err(MiningError::EmptySequence { index });
            }
        }
        let min = values.iter().flatten().copied().min().expect("non-empty");
        let max = values.iter().flatten().copied().max().expect("non-empty");
        Ok(Self { values, min, max })
    }

    /// The raw values.
    pub fn values(&self) -> &[Vec<i64>] {
        &self.values
    }
}

/// Handle to an attribute registered with a [`PatternMiner`]; the entry
/// point for building constraints on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeHandle(usize);

impl AttributeHandle {
    /// Constrain the difference between consecutive pattern events.
    pub fn gap(self) -> Constraint {
        Constraint::new(self, ConstraintKind::Gap)
    }

    /// Constrain the min-to-max range over a pattern's events.
    pub fn span(self) -> Constraint {
        Constraint::new(self, ConstraintKind::Span)
    }

    /// Constrain the average of a pattern's values.
    pub fn average(self) -> Constraint {
        Constraint::new(self, ConstraintKind::Average)
    }

    /// Constrain the median of a pattern's values.
    pub fn median(self) -> Constraint {
        Constraint::new(self, ConstraintKind::Median)
    }
}

/// The four constraint families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    Gap,
    Span,
    Average,
    Median,
}

impl ConstraintKind {
    fn name(self) -> &'static str {
        match self {
            ConstraintKind::Gap => "gap",
            ConstraintKind::Span => "span",
            ConstraintKind::Average => "average",
            ConstraintKind::Median => "median",
        }
    }
}

/// One constraint under construction: a kind, an attribute, and up to
/// two bounds attached with [`Constraint::ge`] and [`Constraint::le`].
#[derive(Debug, Clone)]
pub struct Constraint {
    attribute: AttributeHandle,
    kind: ConstraintKind,
    lower: Option<i64>,
    upper: Option<i64>,
}

impl Constraint {
    fn new(attribute: AttributeHandle, kind: ConstraintKind) -> Self {
        Self {
            attribute,
            kind,
            lower: None,
            upper: None,
        }
    }

    /// Require the constrained quantity to be at least `bound`.
    pub fn ge(mut self, bound: i64) -> Self {
        self.lower = Some(bound);
        self
    }

    /// Require the constrained quantity to be at most `bound`.
    pub fn le(mut self, bound: i64) -> Self {
        self.upper = Some(bound);
        self
    }
}

/// Minimum frequency threshold: an absolute sequence count, or a
/// fraction of the database size (truncated to a count).
#[derive(Debug, Clone, Copy)]
pub enum MinFrequency {
    Count(usize),
    Fraction(f64),
}

/// One mined maximal pattern with its feasible-witness support.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Pattern<T> {
    pub items: Vec<T>,
    pub frequency: usize,
}

/// A constraint model over a sequence database.
pub struct PatternMiner<T> {
    /// Interned sequences, items in `1..=symbols.len()`.
    sequences: Vec<Vec<u32>>,
    /// Interned item `i + 1` maps back to `symbols[i]`.
    symbols: Vec<T>,
    attributes: Vec<Attribute>,
    /// Constraint store: attribute -> kind -> (lower, upper). Insertion
    /// order of the outer map defines the dense attribute ids handed to
    /// the core, so the first-constrained attribute becomes the
    /// time-like attribute 0 that drives gap anti-monotonicity.
    constraints: IndexMap<usize, IndexMap<ConstraintKind, (Option<i64>, Option<i64>)>>,
}

impl<T: Clone + Eq + Hash + Ord> PatternMiner<T> {
    /// Intern the database. Rejects an empty database and empty
    /// sequences.
    pub fn new(sequences: Vec<Vec<T>>) -> Result<Self, MiningError> {
        if sequences.is_empty() {
            return Err(MiningError::EmptyDatabase);
        }
        let mut ids: FxHashMap<T, u32> = FxHashMap::default();
        let mut symbols = Vec::new();
        let mut interned = Vec::with_capacity(sequences.len());
        for (index, seq) in sequences.into_iter().enumerate() {
            if seq.is_empty() {
                return Err(MiningError::EmptySequence { index });
            }
            let row = seq
                .into_iter()
                .map(|item| {
                    *ids.entry(item.clone()).or_insert_with(|| {
                        symbols.push(item);
                        symbols.len() as u32
                    })
                })
                .collect();
            interned.push(row);
        }
        Ok(Self {
            sequences: interned,
            symbols,
            attributes: Vec::new(),
            constraints: IndexMap::new(),
        })
    }

    /// Register an attribute. Its shape must match the sequences.
    pub fn add_attribute(&mut self, attribute: Attribute) -> Result<AttributeHandle, MiningError> {
        let handle = self.attributes.len();
        if attribute.values.len() != self.sequences.len() {
            return Err(MiningError::AttributeShapeMismatch { attribute: handle, index: 0 });
        }
        for (index, row) in attribute.values.iter().enumerate() {
            if row.len() != self.sequences[index].len() {
                return Err(MiningError::AttributeShapeMismatch { attribute: handle, index });
            }
        }
        self.attributes.push(attribute);
        Ok(AttributeHandle(handle))
    }

    /// Add a constraint to the store. At most one constraint per
    /// (attribute, kind), and at least one bound per constraint.
    pub fn add_constraint(&mut self, constraint: Constraint) -> Result<(), MiningError> {
        let AttributeHandle(attr) = constraint.attribute;
        if attr >= self.attributes.len() {
            return Err(MiningError::AttributeIndexOutOfRange {
                attribute: attr,
                num_attributes: self.attributes.len(),
            });
        }
        if constraint.lower.is_none() && constraint.upper.is_none() {
            return Err(MiningError::UnboundedConstraint { kind: constraint.kind.name() });
        }
        let per_attr = self.constraints.entry(attr).or_insert_with(IndexMap::new);
        if per_attr.contains_key(&constraint.kind) {
            return Err(MiningError::DuplicateConstraint { kind: constraint.kind.name() });
        }
        per_attr.insert(constraint.kind, (constraint.lower, constraint.upper));
        Ok(())
    }

    /// Mine maximal patterns at the given threshold.
    ///
    /// Results are sorted most frequent first, ties broken by item
    /// order.
    pub fn mine(&self, min_frequency: MinFrequency) -> Result<Vec<Pattern<T>>, MiningError> {
        let theta = self.resolve_theta(min_frequency)?;
        let params = self.derive_params(theta);
        let rows = miner::mine(&params)?;

        let mut patterns: Vec<Pattern<T>> = rows
            .into_iter()
            .map(|row| {
                let (freq, items) = row.split_last().expect("rows end with the support");
                Pattern {
                    items: items
                        .iter()
                        .map(|&id| self.symbols[id as usize - 1].clone())
                        .collect(),
                    frequency: *freq as usize,
                }
            })
            .collect();
        patterns.sort_by(|a, b| a.items.cmp(&b.items));
        patterns.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        Ok(patterns)
    }

    fn resolve_theta(&self, min_frequency: MinFrequency) -> Result<usize, MiningError> {
        let rows = self.sequences.len();
        match min_frequency {
            MinFrequency::Count(count) => {
                if count == 0 {
                    return Err(MiningError::InvalidFrequency {
                        reason: "count must be positive".into(),
                    });
                }
                if count > rows {
                    return Err(MiningError::InvalidFrequency {
                        reason: format!("count {count} exceeds the {rows} sequences"),
                    });
                }
                Ok(count)
            }
            MinFrequency::Fraction(fraction) => {
                if !(fraction > 0.0 && fraction <= 1.0) {
                    return Err(MiningError::InvalidFrequency {
                        reason: format!("fraction {fraction} must be in (0, 1]"),
                    });
                }
                if fraction * (rows as f64) < 1.0 {
                    return Err(MiningError::InvalidFrequency {
                        reason: format!(
                            "fraction {fraction} selects less than one of the {rows} sequences"
                        ),
                    });
                }
                Ok((fraction * rows as f64) as usize)
            }
        }
    }

    /// Translate the model into the core parameter block. Only
    /// constrained attributes participate; they get dense ids in
    /// first-constraint order.
    fn derive_params(&self, theta: usize) -> MiningParams {
        let mut params = MiningParams {
            num_sequences: self.sequences.len(),
            max_seq_len: self.sequences.iter().map(Vec::len).max().unwrap_or(0),
            alphabet_size: self.symbols.len(),
            theta,
            items: self.sequences.clone(),
            ..Default::default()
        };

        for (&attr, kinds) in &self.constraints {
            let attribute = &self.attributes[attr];
            let att_id = params.num_attributes;
            params.num_attributes += 1;
            params.num_minmax.push(0);
            params.num_avr.push(0);
            params.num_med.push(0);
            params.max_attrs.push(attribute.max);
            params.min_attrs.push(attribute.min);
            params.attrs.push(attribute.values.clone());

            for (&kind, &(lower, upper)) in kinds {
                match kind {
                    ConstraintKind::Gap => {
                        params.tot_gap.push(att_id);
                        if let Some(bound) = lower {
                            params.lgap.push(bound);
                            params.lgapi.push(att_id);
                        }
                        if let Some(bound) = upper {
                            params.ugap.push(bound);
                            params.ugapi.push(att_id);
                        }
                    }
                    ConstraintKind::Span => {
                        params.tot_spn.push(att_id);
                        if let Some(bound) = lower {
                            params.lspn.push(bound);
                            params.lspni.push(att_id);
                            params.num_minmax[att_id] += 2;
                        }
                        if let Some(bound) = upper {
                            params.uspn.push(bound);
                            params.uspni.push(att_id);
                        }
                    }
                    ConstraintKind::Average => {
                        params.tot_avr.push(att_id);
                        if let Some(bound) = lower {
                            params.lavr.push(bound);
                            params.lavri.push(att_id);
                            params.num_avr[att_id] += 1;
                        }
                        if let Some(bound) = upper {
                            params.uavr.push(bound);
                            params.uavri.push(att_id);
                            params.num_avr[att_id] += 1;
                        }
                    }
                    ConstraintKind::Median => {
                        if let Some(bound) = lower {
                            params.lmed.push(bound);
                            params.lmedi.push(att_id);
                            params.num_med[att_id] += 1;
                        }
                        if let Some(bound) = upper {
                            params.umed.push(bound);
                            params.umedi.push(att_id);
                            params.num_med[att_id] += 1;
                        }
                    }
                }
            }
        }

        params
    }
}

/// Pattern-set aggregations over two mined cohorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DichotomicPatterns<T> {
    /// Patterns frequent in both cohorts.
    pub intersection: Vec<Vec<T>>,
    /// Patterns frequent in either cohort.
    pub union: Vec<Vec<T>>,
    /// Patterns frequent only in the positive cohort.
    pub unique_positive: Vec<Vec<T>>,
    /// Patterns frequent only in the negative cohort.
    pub unique_negative: Vec<Vec<T>>,
}

/// Dichotomic pattern mining: mine a positive and a negative cohort
/// separately, then aggregate the two pattern sets. Frequencies are
/// dropped before comparison since the cohorts are mined at independent
/// thresholds; each aggregation comes back sorted.
pub fn dichotomic_patterns<T: Clone + Eq + Hash + Ord>(
    positive: &PatternMiner<T>,
    negative: &PatternMiner<T>,
    min_frequency_positive: MinFrequency,
    min_frequency_negative: MinFrequency,
) -> Result<DichotomicPatterns<T>, MiningError> {
    use std::collections::BTreeSet;

    let pos: BTreeSet<Vec<T>> = positive
        .mine(min_frequency_positive)?
        .into_iter()
        .map(|p| p.items)
        .collect();
    let neg: BTreeSet<Vec<T>> = negative
        .mine(min_frequency_negative)?
        .into_iter()
        .map(|p| p.items)
        .collect();

    Ok(DichotomicPatterns {
        intersection: pos.intersection(&neg).cloned().collect(),
        union: pos.union(&neg).cloned().collect(),
        unique_positive: pos.difference(&neg).cloned().collect(),
        unique_negative: neg.difference(&pos).cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> PatternMiner<u32> {
        PatternMiner::new(vec![vec![1, 2, 3], vec![1, 2], vec![2, 3]]).expect("non-empty")
    }

    #[test]
    fn rejects_empty_inputs() {
        assert!(matches!(
            PatternMiner::<u32>::new(vec![]),
            Err(MiningError::EmptyDatabase)
        ));
        assert!(matches!(
            PatternMiner::new(vec![vec![1], vec![]]),
            Err(MiningError::EmptySequence { index: 1 })
        ));
    }

    #[test]
    fn rejects_duplicate_and_unbounded_constraints() {
        let mut miner = db();
        let att = miner
            .add_attribute(Attribute::new(vec![vec![1, 2, 3], vec![1, 2], vec![1, 2]]).unwrap())
            .unwrap();
        assert!(matches!(
            miner.add_constraint(att.gap()),
            Err(MiningError::UnboundedConstraint { kind: "gap" })
        ));
        miner.add_constraint(att.gap().le(5)).unwrap();
        assert!(matches!(
            miner.add_constraint(att.gap().ge(1)),
            Err(MiningError::DuplicateConstraint { kind: "gap" })
        ));
        // A different kind on the same attribute is fine.
        miner.add_constraint(att.span().le(5)).unwrap();
    }

    #[test]
    fn fraction_threshold_validates_and_truncates() {
        let miner = db();
        assert!(miner.mine(MinFrequency::Fraction(0.0)).is_err());
        assert!(miner.mine(MinFrequency::Fraction(1.5)).is_err());
        // 0.2 * 3 = 0.6 selects less than one sequence.
        assert!(miner.mine(MinFrequency::Fraction(0.2)).is_err());
        // 0.9 * 3 = 2.7 truncates to theta = 2.
        let patterns = miner.mine(MinFrequency::Fraction(0.9)).unwrap();
        assert!(patterns.iter().all(|p| p.frequency >= 2));
        assert!(!patterns.is_empty());
    }

    #[test]
    fn count_threshold_bounds() {
        let miner = db();
        assert!(miner.mine(MinFrequency::Count(0)).is_err());
        assert!(miner.mine(MinFrequency::Count(4)).is_err());
        assert!(miner.mine(MinFrequency::Count(3)).is_ok());
    }

    #[test]
    fn symbolic_items_round_trip_sorted() {
        let miner = PatternMiner::new(vec![
            vec!["buy", "view", "pay"],
            vec!["buy", "view"],
            vec!["view", "pay"],
        ])
        .expect("non-empty");
        let patterns = miner.mine(MinFrequency::Count(2)).expect("mines");
        assert_eq!(patterns.len(), 2);
        // Both patterns have frequency 2; ties sort by item order, and
        // "buy" interned before "view".
        assert_eq!(patterns[0].items, vec!["buy", "view"]);
        assert_eq!(patterns[1].items, vec!["view", "pay"]);
        assert_eq!(patterns[0].frequency, 2);
    }

    #[test]
    fn unconstrained_attributes_stay_out_of_the_block() {
        let mut miner = db();
        let _unused = miner
            .add_attribute(Attribute::new(vec![vec![9, 9, 9], vec![9, 9], vec![9, 9]]).unwrap())
            .unwrap();
        let constrained = miner
            .add_attribute(Attribute::new(vec![vec![1, 2, 3], vec![1, 2], vec![1, 2]]).unwrap())
            .unwrap();
        miner.add_constraint(constrained.gap().le(10)).unwrap();
        let params = miner.derive_params(2);
        assert_eq!(params.num_attributes, 1);
        // The constrained attribute became attribute 0.
        assert_eq!(params.ugapi, vec![0]);
        assert_eq!(params.attrs[0][0], vec![1, 2, 3]);
    }

    #[test]
    fn dichotomic_aggregations_partition_the_sets() {
        let pos = PatternMiner::new(vec![vec![1u32, 2, 3], vec![1, 2]]).expect("non-empty");
        let neg = PatternMiner::new(vec![vec![2u32, 3], vec![2, 3, 4]]).expect("non-empty");
        let dpm = dichotomic_patterns(
            &pos,
            &neg,
            MinFrequency::Count(2),
            MinFrequency::Count(2),
        )
        .expect("mines");

        assert_eq!(dpm.unique_positive, vec![vec![1, 2]]);
        assert_eq!(dpm.unique_negative, vec![vec![2, 3]]);
        assert!(dpm.intersection.is_empty());
        assert_eq!(dpm.union, vec![vec![1, 2], vec![2, 3]]);
    }

    #[test]
    fn infeasible_average_yields_empty_result() {
        let mut miner = PatternMiner::new(vec![vec![1u32, 2], vec![1, 2]]).expect("non-empty");
        let att = miner
            .add_attribute(Attribute::new(vec![vec![3, 3], vec![3, 3]]).unwrap())
            .unwrap();
        miner.add_constraint(att.average().ge(5)).unwrap();
        let patterns = miner.mine(MinFrequency::Count(1)).expect("mines");
        assert!(patterns.is_empty());
    }
}
