// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Galatea-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Galatea and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use smallvec::SmallVec;

use super::graph::{Edge, EdgeProvenance, NodeRecord};
use super::ids::{AnnotationId, SegmentId};

/// The inverse description of one mutating operation.
///
/// One variant per operation kind, each carrying exactly the state needed to
/// invert it. Mutating operations return these; the dispatcher pushes them
/// onto the undo log and [`crate::model::Session::revert`] consumes them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reversal {
    NodeAdded {
        segment: SegmentId,
        edge: Option<Edge>,
    },
    GroupAdded {
        segments: SmallVec<[SegmentId; 8]>,
    },
    NodesRemoved {
        nodes: Vec<(SegmentId, NodeRecord)>,
        edges: Vec<(Edge, EdgeProvenance)>,
    },
    EdgeAdded {
        edge: Edge,
    },
    EdgeRemoved {
        edge: Edge,
        provenance: EdgeProvenance,
    },
    AnnotationAdded {
        id: AnnotationId,
    },
}

impl Reversal {
    /// Short operation name for status messages ("undid <kind>").
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NodeAdded { .. } => "add node",
            Self::GroupAdded { .. } => "add group",
            Self::NodesRemoved { .. } => "remove nodes",
            Self::EdgeAdded { .. } => "merge edge",
            Self::EdgeRemoved { .. } => "split edge",
            Self::AnnotationAdded { .. } => "add annotation",
        }
    }
}
