//! MDD node storage.
//!
//! Nodes are identified by (sequence position, item) and live in a slot
//! arena addressed `(item - 1) + (position - 1) * alphabet_size`, so the
//! address doubles as the identity and no hash lookup is needed. Arcs go
//! strictly from earlier to later positions, so the graph is acyclic and
//! children are plain arena ids held by the parent.
//!
//! A node records one entry per *visiting sequence*: the sequence id, the
//! child list built for that sequence, and the packed attribute summary
//! row ([`crate::summary`]). Sequence ids are appended in increasing
//! order, so lookups are binary searches.

use crate::summary::SummaryRow;

/// Arena index of a node. `u32` keeps child lists compact.
pub type NodeId = u32;

/// One MDD node. Built once by the builder, never mutated afterwards.
#[derive(Debug)]
pub struct MddNode {
    /// Arena slot + 1; stable identity for debugging output.
    pub id: NodeId,
    /// Event item at this node.
    pub item: u32,
    /// Last sequence for which this node was seeded as a length-1
    /// pattern end. Guards against duplicate seeding.
    pub last_seeded: Option<u32>,
    /// Visiting sequences, strictly increasing.
    pub seq_ids: Vec<u32>,
    /// Child lists, one per visiting sequence, in decreasing end-position
    /// order (construction proceeds end-first).
    pub children: Vec<Vec<NodeId>>,
    /// Attribute summary rows, one per visiting sequence. Empty when no
    /// span/average/median bound is active.
    pub summaries: Vec<SummaryRow>,
}

impl MddNode {
    fn new(id: NodeId) -> Self {
        Self {
            id,
            item: 0,
            last_seeded: None,
            seq_ids: Vec::new(),
            children: Vec::new(),
            summaries: Vec::new(),
        }
    }

    /// Position of `seq` among the visiting sequences, if present.
    #[inline]
    pub fn visit_index(&self, seq: u32) -> Option<usize> {
        self.seq_ids.binary_search(&seq).ok()
    }

    /// True when the most recent visit belongs to `seq`.
    #[inline]
    pub fn last_visit_is(&self, seq: u32) -> bool {
        self.seq_ids.last() == Some(&seq)
    }
}

/// Slot arena for MDD nodes.
///
/// A slot is `None` until the first feasible arc touches it; the arena
/// never shrinks while mining runs and is dropped wholesale afterwards.
pub struct NodeArena {
    slots: Vec<Option<MddNode>>,
    alphabet_size: usize,
}

impl NodeArena {
    pub fn new(max_seq_len: usize, alphabet_size: usize) -> Self {
        let mut slots = Vec::new();
        slots.resize_with(max_seq_len * alphabet_size, || None);
        Self { slots, alphabet_size }
    }

    /// Arena slot for `item` at 1-based sequence position `pos`.
    #[inline]
    pub fn slot_of(&self, item: u32, pos: usize) -> usize {
        (item as usize - 1) + (pos - 1) * self.alphabet_size
    }

    /// Materialize the node in `slot` if it does not exist yet.
    pub fn ensure(&mut self, slot: usize) {
        if self.slots[slot].is_none() {
            self.slots[slot] = Some(MddNode::new(slot as NodeId + 1));
        }
    }

    /// Get an existing node.
    ///
    /// # Panics
    /// Panics if no arc ever touched `slot`.
    #[inline]
    pub fn get(&self, slot: usize) -> &MddNode {
        self.slots[slot].as_ref().expect("node slot not materialized")
    }

    /// Mutable access to an existing node.
    #[inline]
    pub fn get_mut(&mut self, slot: usize) -> &mut MddNode {
        self.slots[slot].as_mut().expect("node slot not materialized")
    }

    /// Mutable source plus shared target of one arc. The two slots are
    /// distinct because arcs never connect a position to itself.
    pub fn arc_pair_mut(&mut self, from: usize, to: usize) -> (&mut MddNode, &MddNode) {
        debug_assert_ne!(from, to);
        if from < to {
            let (head, tail) = self.slots.split_at_mut(to);
            (
                head[from].as_mut().expect("node slot not materialized"),
                tail[0].as_ref().expect("node slot not materialized"),
            )
        } else {
            let (head, tail) = self.slots.split_at_mut(from);
            (
                tail[0].as_mut().expect("node slot not materialized"),
                head[to].as_ref().expect("node slot not materialized"),
            )
        }
    }

    /// Number of materialized nodes.
    pub fn node_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
