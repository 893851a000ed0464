//! The mining parameter block.
//!
//! `MiningParams` is the single input to [`crate::mine`]: the sequence
//! database, the per-event attribute matrices, and the constraint limit
//! vectors with their parallel attribute-index vectors. The model API
//! ([`crate::api`]) derives a parameter block from a constraint model;
//! the block can also be filled in directly for full control.

use serde::{Deserialize, Serialize};

use crate::error::MiningError;

/// Input parameter block for one mining run. Immutable during mining.
///
/// Items are integers in `1..=alphabet_size`. For every attribute `a`,
/// `attrs[a]` has exactly the shape of `items`. Limit vectors come in
/// pairs: `lgap[k]` is the k-th lower gap limit and `lgapi[k]` the
/// attribute it applies to, and so on for the other seven bound kinds.
///
/// `num_minmax`, `num_avr` and `num_med` drive the per-attribute summary
/// block layout and must be consistent with the index vectors: two
/// min/max slots per lower span bound, one sum/count slot pair per
/// average bound, one counter/extremal triple per median bound.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MiningParams {
    /// Number of sequences in the database.
    pub num_sequences: usize,
    /// Length of the longest sequence.
    pub max_seq_len: usize,
    /// Alphabet size; items range over `1..=alphabet_size`.
    pub alphabet_size: usize,
    /// Number of attribute matrices.
    pub num_attributes: usize,
    /// Frequency threshold: minimum number of witnessing sequences.
    pub theta: usize,

    /// Event items, one row per sequence.
    pub items: Vec<Vec<u32>>,
    /// Attribute values, indexed `[attribute][sequence][event]`.
    pub attrs: Vec<Vec<Vec<i64>>>,
    /// Per-attribute global maxima (median sentinel values).
    pub max_attrs: Vec<i64>,
    /// Per-attribute global minima (median sentinel values).
    pub min_attrs: Vec<i64>,

    /// Lower gap limits and the attributes they apply to.
    pub lgap: Vec<i64>,
    pub lgapi: Vec<usize>,
    /// Upper gap limits and the attributes they apply to.
    pub ugap: Vec<i64>,
    pub ugapi: Vec<usize>,
    /// Lower span limits and the attributes they apply to.
    pub lspn: Vec<i64>,
    pub lspni: Vec<usize>,
    /// Upper span limits and the attributes they apply to.
    pub uspn: Vec<i64>,
    pub uspni: Vec<usize>,
    /// Lower average limits and the attributes they apply to.
    pub lavr: Vec<i64>,
    pub lavri: Vec<usize>,
    /// Upper average limits and the attributes they apply to.
    pub uavr: Vec<i64>,
    pub uavri: Vec<usize>,
    /// Lower median limits and the attributes they apply to.
    pub lmed: Vec<i64>,
    pub lmedi: Vec<usize>,
    /// Upper median limits and the attributes they apply to.
    pub umed: Vec<i64>,
    pub umedi: Vec<usize>,

    /// Per-attribute count of min/max summary slots (2 per lower span bound).
    pub num_minmax: Vec<usize>,
    /// Per-attribute count of average bounds.
    pub num_avr: Vec<usize>,
    /// Per-attribute count of median bounds.
    pub num_med: Vec<usize>,

    /// Attributes carrying any gap bound.
    pub tot_gap: Vec<usize>,
    /// Attributes carrying any span bound.
    pub tot_spn: Vec<usize>,
    /// Attributes carrying any average bound.
    pub tot_avr: Vec<usize>,
}

impl MiningParams {
    /// True when any span, average or median bound is active, i.e. when
    /// attribute summary blocks and running aggregates are maintained at
    /// all and the arbiter participates in extension.
    pub fn needs_summaries(&self) -> bool {
        !self.tot_spn.is_empty()
            || !self.tot_avr.is_empty()
            || !self.lmedi.is_empty()
            || !self.umedi.is_empty()
    }

    /// True when the first upper gap bound sits on attribute 0, enabling
    /// the anti-monotone retreat in the builder.
    pub(crate) fn upper_gap_on_attr0(&self) -> bool {
        !self.ugap.is_empty() && self.ugapi[0] == 0
    }

    /// True when the first lower gap bound sits on attribute 0, enabling
    /// the sweep break in the builder.
    pub(crate) fn lower_gap_on_attr0(&self) -> bool {
        !self.lgap.is_empty() && self.lgapi[0] == 0
    }

    /// True when the general per-attribute gap oracle can be skipped:
    /// either no gap bounds exist, or they all sit on attribute 0 and are
    /// already covered by the builder's specialized checks.
    pub(crate) fn gap_oracle_redundant(&self) -> bool {
        self.tot_gap.is_empty() || (self.tot_gap.len() == 1 && self.tot_gap[0] == 0)
    }

    /// Validate the shape and ranges of the block.
    ///
    /// This covers the input-inconsistency class: mismatched matrix
    /// shapes, out-of-range items, dangling attribute indices, and limit
    /// vectors out of step with their index vectors. An empty database is
    /// valid and mines to an empty result.
    pub fn validate(&self) -> Result<(), MiningError> {
        if self.items.len() != self.num_sequences {
            return Err(MiningError::MetadataLengthMismatch { name: "items" });
        }
        for (index, seq) in self.items.iter().enumerate() {
            if seq.len() > self.max_seq_len {
                return Err(MiningError::MetadataLengthMismatch { name: "max_seq_len" });
            }
            for &item in seq {
                if item == 0 || item as usize > self.alphabet_size {
                    return Err(MiningError::ItemOutOfRange {
                        index,
                        item,
                        alphabet: self.alphabet_size as u32,
                    });
                }
            }
        }

        if self.attrs.len() != self.num_attributes {
            return Err(MiningError::MetadataLengthMismatch { name: "attrs" });
        }
        for (attribute, matrix) in self.attrs.iter().enumerate() {
            if matrix.len() != self.items.len() {
                return Err(MiningError::AttributeShapeMismatch { attribute, index: 0 });
            }
            for (index, row) in matrix.iter().enumerate() {
                if row.len() != self.items[index].len() {
                    return Err(MiningError::AttributeShapeMismatch { attribute, index });
                }
            }
        }

        for (name, len) in [
            ("max_attrs", self.max_attrs.len()),
            ("min_attrs", self.min_attrs.len()),
            ("num_minmax", self.num_minmax.len()),
            ("num_avr", self.num_avr.len()),
            ("num_med", self.num_med.len()),
        ] {
            if len != self.num_attributes {
                return Err(MiningError::MetadataLengthMismatch { name });
            }
        }

        for (name, limits, indices) in [
            ("lgap", &self.lgap, &self.lgapi),
            ("ugap", &self.ugap, &self.ugapi),
            ("lspn", &self.lspn, &self.lspni),
            ("uspn", &self.uspn, &self.uspni),
            ("lavr", &self.lavr, &self.lavri),
            ("uavr", &self.uavr, &self.uavri),
            ("lmed", &self.lmed, &self.lmedi),
            ("umed", &self.umed, &self.umedi),
        ] {
            if limits.len() != indices.len() {
                return Err(MiningError::ConstraintVectorMismatch { name });
            }
            for &attribute in indices.iter() {
                if attribute >= self.num_attributes {
                    return Err(MiningError::AttributeIndexOutOfRange {
                        attribute,
                        num_attributes: self.num_attributes,
                    });
                }
            }
        }
        for &attribute in self.tot_gap.iter().chain(&self.tot_spn).chain(&self.tot_avr) {
            if attribute >= self.num_attributes {
                return Err(MiningError::AttributeIndexOutOfRange {
                    attribute,
                    num_attributes: self.num_attributes,
                });
            }
        }

        for (name, family, indices, members) in [
            ("uspni", "tot_spn", &self.uspni, &self.tot_spn),
            ("lspni", "tot_spn", &self.lspni, &self.tot_spn),
            ("uavri", "tot_avr", &self.uavri, &self.tot_avr),
            ("lavri", "tot_avr", &self.lavri, &self.tot_avr),
        ] {
            for &attribute in indices.iter() {
                if !members.contains(&attribute) {
                    return Err(MiningError::BoundOutsideFamily { name, family, attribute });
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> MiningParams {
        MiningParams {
            num_sequences: 1,
            max_seq_len: 3,
            alphabet_size: 3,
            num_attributes: 0,
            theta: 1,
            items: vec![vec![1, 2, 3]],
            ..Default::default()
        }
    }

    #[test]
    fn accepts_minimal_block() {
        assert!(minimal().validate().is_ok());
    }

    #[test]
    fn rejects_item_out_of_range() {
        let mut p = minimal();
        p.items[0][1] = 4;
        assert!(matches!(
            p.validate(),
            Err(MiningError::ItemOutOfRange { item: 4, .. })
        ));
    }

    #[test]
    fn rejects_attribute_shape_mismatch() {
        let mut p = minimal();
        p.num_attributes = 1;
        p.attrs = vec![vec![vec![1, 2]]];
        p.max_attrs = vec![2];
        p.min_attrs = vec![1];
        p.num_minmax = vec![0];
        p.num_avr = vec![0];
        p.num_med = vec![0];
        assert!(matches!(
            p.validate(),
            Err(MiningError::AttributeShapeMismatch { attribute: 0, index: 0 })
        ));
    }

    #[test]
    fn rejects_dangling_constraint_index() {
        let mut p = minimal();
        p.ugap = vec![3];
        p.ugapi = vec![2];
        assert!(matches!(
            p.validate(),
            Err(MiningError::AttributeIndexOutOfRange { attribute: 2, .. })
        ));
    }

    #[test]
    fn rejects_limit_index_length_mismatch() {
        let mut p = minimal();
        p.lgap = vec![1, 2];
        p.lgapi = vec![0];
        assert!(matches!(
            p.validate(),
            Err(MiningError::ConstraintVectorMismatch { name: "lgap" })
        ));
    }

    #[test]
    fn empty_database_is_valid() {
        let p = MiningParams {
            alphabet_size: 2,
            theta: 1,
            ..Default::default()
        };
        assert!(p.validate().is_ok());
    }
}
