// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::annotation::AnnotationSet;
use super::graph::{Edge, ProofreadGraph};
use super::ids::VoxelPoint;
use super::reversal::Reversal;

/// An accepted merge of a false split, with the two cursor locations that
/// were used as evidence. Exported so the agglomeration backend can apply the
/// equivalence later.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeDecision {
    pub edge: Edge,
    pub locations: [VoxelPoint; 2],
}

/// The top-level container one reconstruction session runs against.
///
/// Owns the graph, the annotation set, and the two decision ledgers that
/// mirror what must eventually be replayed against the remote agglomeration:
/// edges to set (accepted merges) and edges to delete (accepted splits).
/// Discarded on exit; never shared across sessions.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Session {
    graph: ProofreadGraph,
    annotations: AnnotationSet,
    merges_to_apply: Vec<MergeDecision>,
    splits_to_apply: Vec<Edge>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_parts(
        graph: ProofreadGraph,
        annotations: AnnotationSet,
        merges_to_apply: Vec<MergeDecision>,
        splits_to_apply: Vec<Edge>,
    ) -> Self {
        Self { graph, annotations, merges_to_apply, splits_to_apply }
    }

    pub fn graph(&self) -> &ProofreadGraph {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut ProofreadGraph {
        &mut self.graph
    }

    pub fn annotations(&self) -> &AnnotationSet {
        &self.annotations
    }

    pub fn annotations_mut(&mut self) -> &mut AnnotationSet {
        &mut self.annotations
    }

    pub fn merges_to_apply(&self) -> &[MergeDecision] {
        &self.merges_to_apply
    }

    pub fn splits_to_apply(&self) -> &[Edge] {
        &self.splits_to_apply
    }

    /// Records an accepted merge. Only one decision can exist per unordered
    /// segment pair; a repeat replaces the stored evidence locations.
    pub fn record_merge(&mut self, edge: Edge, locations: [VoxelPoint; 2]) {
        self.merges_to_apply.retain(|decision| decision.edge != edge);
        self.merges_to_apply.push(MergeDecision { edge, locations });
    }

    /// Records an accepted split for later replay against the backend.
    pub fn record_split(&mut self, edge: Edge) {
        if !self.splits_to_apply.contains(&edge) {
            self.splits_to_apply.push(edge);
        }
    }

    /// Applies one inverse description, reverting every sub-effect of the
    /// recorded operation: graph state and, where the operation touched them,
    /// the decision ledgers. Composite reversals are all-or-nothing by
    /// construction since nothing here can fail.
    pub fn revert(&mut self, reversal: Reversal) {
        match reversal {
            Reversal::NodeAdded { segment, edge } => {
                self.graph.discard_node(segment);
                if let Some(edge) = edge {
                    self.merges_to_apply.retain(|decision| decision.edge != edge);
                }
            }
            Reversal::GroupAdded { segments } => {
                for segment in segments {
                    self.graph.discard_node(segment);
                }
            }
            Reversal::NodesRemoved { nodes, edges } => {
                for (segment, record) in nodes {
                    self.graph.restore_node(segment, record);
                }
                for (edge, provenance) in edges {
                    self.graph.restore_edge(edge, provenance);
                }
            }
            Reversal::EdgeAdded { edge } => {
                self.graph.discard_edge(edge);
                self.merges_to_apply.retain(|decision| decision.edge != edge);
            }
            Reversal::EdgeRemoved { edge, provenance } => {
                self.graph.restore_edge(edge, provenance);
                self.splits_to_apply.retain(|split| *split != edge);
            }
            Reversal::AnnotationAdded { id } => {
                // the annotation may already be gone via explicit deletion
                let _ = self.annotations.remove(id);
            }
        }
    }
}
