// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! The proofreading graph: which base-volume segments currently belong to the
//! target neuron, and why they were merged.
//!
//! Every mutating operation is atomic (validated fully before any state is
//! touched) and returns the [`Reversal`] needed to invert it. The graph never
//! records reversals itself; the dispatcher owns the undo log.

use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::fmt;

use smallvec::SmallVec;

use super::ids::SegmentId;
use super::reversal::Reversal;

/// An undirected edge between two graph nodes, stored with normalized
/// endpoint order so `(a, b)` and `(b, a)` are the same edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Edge {
    lo: SegmentId,
    hi: SegmentId,
}

impl Edge {
    pub fn new(a: SegmentId, b: SegmentId) -> Result<Self, GraphError> {
        if a == b {
            return Err(GraphError::SelfLoop { segment: a });
        }
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        Ok(Self { lo, hi })
    }

    pub fn lo(self) -> SegmentId {
        self.lo
    }

    pub fn hi(self) -> SegmentId {
        self.hi
    }

    /// Given one endpoint, returns the other; `None` if `segment` is not an
    /// endpoint of this edge.
    pub fn other(self, segment: SegmentId) -> Option<SegmentId> {
        if segment == self.lo {
            Some(self.hi)
        } else if segment == self.hi {
            Some(self.lo)
        } else {
            None
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.lo, self.hi)
    }
}

/// Why an edge is in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeProvenance {
    /// Operator merged a false agglomeration split.
    FalseSplitMerge,
    /// Operator confirmed the agglomerated connection while reviewing a
    /// connected component.
    ComponentConfirmation,
    /// Implicit membership via a bulk group add.
    BulkGroup,
}

/// Per-node bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRecord {
    order: u64,
    without_edge: bool,
}

impl NodeRecord {
    pub(crate) fn new(order: u64, without_edge: bool) -> Self {
        Self { order, without_edge }
    }

    /// Membership order within the session, for display and rollback
    /// ordering. Starts at 1.
    pub fn order(&self) -> u64 {
        self.order
    }

    /// True when the node entered through a bulk add with no edge.
    pub fn without_edge(&self) -> bool {
        self.without_edge
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    NotMember { segment: SegmentId },
    AlreadyMember { segment: SegmentId },
    DuplicateEdge { edge: Edge },
    EdgeNotFound { a: SegmentId, b: SegmentId },
    SelfLoop { segment: SegmentId },
    EmptyGroup,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotMember { segment } => {
                write!(f, "segment {segment} is not part of the neuron graph")
            }
            Self::AlreadyMember { segment } => {
                write!(f, "segment {segment} is already part of the neuron graph")
            }
            Self::DuplicateEdge { edge } => write!(f, "edge {edge} already exists"),
            Self::EdgeNotFound { a, b } => write!(f, "no edge between {a} and {b}"),
            Self::SelfLoop { segment } => {
                write!(f, "cannot connect segment {segment} to itself")
            }
            Self::EmptyGroup => f.write_str("group operation on an empty segment set"),
        }
    }
}

impl std::error::Error for GraphError {}

/// The neuron under reconstruction.
#[derive(Debug, Clone, Default)]
pub struct ProofreadGraph {
    nodes: BTreeMap<SegmentId, NodeRecord>,
    edges: BTreeMap<Edge, EdgeProvenance>,
    adjacency: BTreeMap<SegmentId, BTreeSet<SegmentId>>,
    next_order: u64,
}

// The order counter is an allocation detail, not observable graph state;
// undo restores nodes and edges, not the counter.
impl PartialEq for ProofreadGraph {
    fn eq(&self, other: &Self) -> bool {
        self.nodes == other.nodes && self.edges == other.edges
    }
}

impl Eq for ProofreadGraph {}

impl ProofreadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_member(&self, segment: SegmentId) -> bool {
        self.nodes.contains_key(&segment)
    }

    pub fn node(&self, segment: SegmentId) -> Option<&NodeRecord> {
        self.nodes.get(&segment)
    }

    pub fn segments(&self) -> impl Iterator<Item = SegmentId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn edges(&self) -> impl Iterator<Item = (Edge, EdgeProvenance)> + '_ {
        self.edges.iter().map(|(edge, provenance)| (*edge, *provenance))
    }

    pub fn has_edge(&self, a: SegmentId, b: SegmentId) -> bool {
        match Edge::new(a, b) {
            Ok(edge) => self.edges.contains_key(&edge),
            Err(_) => false,
        }
    }

    /// Sorted partners of a member segment.
    pub fn neighbors(&self, segment: SegmentId) -> Option<&BTreeSet<SegmentId>> {
        self.adjacency.get(&segment)
    }

    /// Inserts a node, optionally with an edge to an existing member.
    ///
    /// The edge carries [`EdgeProvenance::FalseSplitMerge`]; merging a false
    /// split is the only workflow that adds a node and an edge in one step.
    pub fn add_node(
        &mut self,
        segment: SegmentId,
        with_edge_to: Option<SegmentId>,
    ) -> Result<Reversal, GraphError> {
        if self.is_member(segment) {
            return Err(GraphError::AlreadyMember { segment });
        }
        let edge = match with_edge_to {
            Some(target) => {
                let edge = Edge::new(segment, target)?;
                if !self.is_member(target) {
                    return Err(GraphError::NotMember { segment: target });
                }
                Some(edge)
            }
            None => None,
        };

        self.insert_node(segment, false);
        if let Some(edge) = edge {
            self.insert_edge(edge, EdgeProvenance::FalseSplitMerge);
        }
        Ok(Reversal::NodeAdded { segment, edge })
    }

    /// Bulk add with no new edges.
    ///
    /// Ids that are already members are skipped, so overlapping agglomerated
    /// components can be re-added safely; it is an error only when the set is
    /// empty or contains nothing new.
    pub fn add_group(&mut self, segments: &BTreeSet<SegmentId>) -> Result<Reversal, GraphError> {
        let Some(first) = segments.iter().next() else {
            return Err(GraphError::EmptyGroup);
        };
        let novel: SmallVec<[SegmentId; 8]> =
            segments.iter().copied().filter(|id| !self.is_member(*id)).collect();
        if novel.is_empty() {
            return Err(GraphError::AlreadyMember { segment: *first });
        }

        for segment in &novel {
            self.insert_node(*segment, true);
        }
        Ok(Reversal::GroupAdded { segments: novel })
    }

    pub fn remove_node(&mut self, segment: SegmentId) -> Result<Reversal, GraphError> {
        let mut group = BTreeSet::new();
        group.insert(segment);
        self.remove_group(&group)
    }

    /// Removes nodes and every incident edge. Fails with `NotMember` if any
    /// id is absent; nothing is changed in that case.
    pub fn remove_group(&mut self, segments: &BTreeSet<SegmentId>) -> Result<Reversal, GraphError> {
        if segments.is_empty() {
            return Err(GraphError::EmptyGroup);
        }
        for segment in segments {
            if !self.is_member(*segment) {
                return Err(GraphError::NotMember { segment: *segment });
            }
        }

        let mut removed_edges: Vec<(Edge, EdgeProvenance)> = Vec::new();
        for (edge, provenance) in &self.edges {
            if segments.contains(&edge.lo) || segments.contains(&edge.hi) {
                removed_edges.push((*edge, *provenance));
            }
        }
        for (edge, _) in &removed_edges {
            self.delete_edge(*edge);
        }

        let mut removed_nodes: Vec<(SegmentId, NodeRecord)> = Vec::with_capacity(segments.len());
        for segment in segments {
            // membership was checked above, so every remove yields a record
            if let Some(record) = self.nodes.remove(segment) {
                self.adjacency.remove(segment);
                removed_nodes.push((*segment, record));
            }
        }
        Ok(Reversal::NodesRemoved { nodes: removed_nodes, edges: removed_edges })
    }

    pub fn add_edge(
        &mut self,
        a: SegmentId,
        b: SegmentId,
        provenance: EdgeProvenance,
    ) -> Result<Reversal, GraphError> {
        let edge = Edge::new(a, b)?;
        for segment in [a, b] {
            if !self.is_member(segment) {
                return Err(GraphError::NotMember { segment });
            }
        }
        if self.edges.contains_key(&edge) {
            return Err(GraphError::DuplicateEdge { edge });
        }

        self.insert_edge(edge, provenance);
        Ok(Reversal::EdgeAdded { edge })
    }

    /// Splits the connection between two members. Never removes nodes.
    pub fn remove_edge(&mut self, a: SegmentId, b: SegmentId) -> Result<Reversal, GraphError> {
        let edge = Edge::new(a, b)?;
        let Some(provenance) = self.edges.get(&edge).copied() else {
            return Err(GraphError::EdgeNotFound { a, b });
        };

        self.delete_edge(edge);
        Ok(Reversal::EdgeRemoved { edge, provenance })
    }

    /// Breadth-first traversal over current edges, starting at `seed`.
    ///
    /// Visitation order is stable: neighbors are expanded lowest-id-first, so
    /// repeated calls on the same graph state return the same sequence.
    pub fn connected_component(&self, seed: SegmentId) -> Result<Vec<SegmentId>, GraphError> {
        if !self.is_member(seed) {
            return Err(GraphError::NotMember { segment: seed });
        }

        let mut visited = BTreeSet::new();
        visited.insert(seed);
        let mut queue = VecDeque::new();
        queue.push_back(seed);
        let mut order = Vec::new();
        while let Some(current) = queue.pop_front() {
            order.push(current);
            if let Some(partners) = self.adjacency.get(&current) {
                for partner in partners {
                    if visited.insert(*partner) {
                        queue.push_back(*partner);
                    }
                }
            }
        }
        Ok(order)
    }

    // Reversal application; crate-private so only the session's revert path
    // can bypass the precondition checks of the public operations.

    pub(crate) fn restore_node(&mut self, segment: SegmentId, record: NodeRecord) {
        self.nodes.insert(segment, record);
        self.adjacency.entry(segment).or_default();
        self.next_order = self.next_order.max(record.order);
    }

    pub(crate) fn restore_edge(&mut self, edge: Edge, provenance: EdgeProvenance) {
        self.insert_edge(edge, provenance);
    }

    pub(crate) fn discard_node(&mut self, segment: SegmentId) {
        if let Some(partners) = self.adjacency.remove(&segment) {
            for partner in partners {
                if let Ok(edge) = Edge::new(segment, partner) {
                    self.edges.remove(&edge);
                }
                if let Some(back) = self.adjacency.get_mut(&partner) {
                    back.remove(&segment);
                }
            }
        }
        self.nodes.remove(&segment);
    }

    pub(crate) fn discard_edge(&mut self, edge: Edge) {
        self.delete_edge(edge);
    }

    fn insert_node(&mut self, segment: SegmentId, without_edge: bool) {
        self.next_order += 1;
        self.nodes.insert(segment, NodeRecord { order: self.next_order, without_edge });
        self.adjacency.entry(segment).or_default();
    }

    fn insert_edge(&mut self, edge: Edge, provenance: EdgeProvenance) {
        self.edges.insert(edge, provenance);
        self.adjacency.entry(edge.lo).or_default().insert(edge.hi);
        self.adjacency.entry(edge.hi).or_default().insert(edge.lo);
    }

    fn delete_edge(&mut self, edge: Edge) {
        self.edges.remove(&edge);
        if let Some(partners) = self.adjacency.get_mut(&edge.lo) {
            partners.remove(&edge.hi);
        }
        if let Some(partners) = self.adjacency.get_mut(&edge.hi) {
            partners.remove(&edge.lo);
        }
    }
}
